use clap::Subcommand;
use crm_core::types::{LifecycleStage, RecordId};

use super::records::{self, print_records, RecordAction};
use super::Context;

#[derive(Subcommand, Debug)]
pub enum ContactsCommand {
    #[command(flatten)]
    Record(RecordAction),

    /// Delete several contacts in one request.
    BulkDelete {
        #[arg(required = true)]
        ids: Vec<RecordId>,
    },

    /// Move contacts to a lifecycle stage.
    SetStage {
        stage: LifecycleStage,
        #[arg(required = true)]
        ids: Vec<RecordId>,
    },
}

pub async fn run(ctx: &Context, cmd: ContactsCommand) -> anyhow::Result<()> {
    let contacts = &ctx.adapters.contacts;
    match cmd {
        ContactsCommand::Record(action) => records::run(ctx, contacts, action).await,
        ContactsCommand::BulkDelete { ids } => {
            if !contacts.bulk_delete(&ids).await {
                anyhow::bail!("not every contact was deleted");
            }
            Ok(())
        }
        ContactsCommand::SetStage { stage, ids } => {
            let saved = contacts.bulk_update_lifecycle_stage(&ids, stage).await;
            print_records(ctx, &saved)?;
            if saved.len() != ids.len() {
                anyhow::bail!("{} of {} contacts were moved to {stage}", saved.len(), ids.len());
            }
            Ok(())
        }
    }
}
