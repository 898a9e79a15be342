use clap::Subcommand;
use crm_core::types::RecordId;

use super::records::{self, print_records, RecordAction};
use super::Context;

#[derive(Subcommand, Debug)]
pub enum ActivitiesCommand {
    #[command(flatten)]
    Record(RecordAction),

    /// Activities logged against a contact.
    ForContact { id: RecordId },

    /// Activities logged against a deal.
    ForDeal { id: RecordId },
}

pub async fn run(ctx: &Context, cmd: ActivitiesCommand) -> anyhow::Result<()> {
    let activities = &ctx.adapters.activities;
    match cmd {
        ActivitiesCommand::Record(action) => records::run(ctx, activities, action).await,
        ActivitiesCommand::ForContact { id } => {
            let found = activities.for_contact(id).await;
            ctx.ensure_loaded(found.is_empty(), "activities")?;
            print_records(ctx, &found)
        }
        ActivitiesCommand::ForDeal { id } => {
            let found = activities.for_deal(id).await;
            ctx.ensure_loaded(found.is_empty(), "activities")?;
            print_records(ctx, &found)
        }
    }
}
