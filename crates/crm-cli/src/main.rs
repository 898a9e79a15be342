mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crm_telemetry::logging::{self, LogFormat};

use commands::activities::ActivitiesCommand;
use commands::contacts::ContactsCommand;
use commands::deals::DealsCommand;
use commands::records::RecordAction;
use commands::Context;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// crm -- manage contacts, companies, deals and activities on the hosted
/// record platform.
#[derive(Parser, Debug)]
#[command(name = "crm", version, about)]
struct Cli {
    /// Config file (default: ~/.crm/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print records as JSON instead of one line per record.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Contacts and their lifecycle stage.
    #[command(subcommand)]
    Contacts(ContactsCommand),

    /// Companies.
    #[command(subcommand)]
    Companies(RecordAction),

    /// Deals and the pipeline board.
    #[command(subcommand)]
    Deals(DealsCommand),

    /// Activities logged against contacts and deals.
    #[command(subcommand)]
    Activities(ActivitiesCommand),

    /// Check the stored session and print where the app would navigate.
    Session {
        /// Location the app was opened at.
        #[arg(long, default_value = "/")]
        at: String,
    },

    /// End the session on the platform and forget it locally.
    Logout,

    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let format = LogFormat::from_flag(cli.json_logs || config.general.json_logs);
    logging::init(config.general.service_name(), &config.general.log_level, format);

    match cli.command {
        Commands::Config => commands::config::run(&config),
        Commands::Session { at } => commands::session::run(&config, &at).await,
        Commands::Logout => commands::session::logout(&config).await,
        Commands::Contacts(cmd) => {
            let ctx = Context::connect(config, cli.json)?;
            let result = commands::contacts::run(&ctx, cmd).await;
            ctx.flush_toasts();
            result
        }
        Commands::Companies(action) => {
            let ctx = Context::connect(config, cli.json)?;
            let result = commands::records::run(&ctx, &ctx.adapters.companies, action).await;
            ctx.flush_toasts();
            result
        }
        Commands::Deals(cmd) => {
            let ctx = Context::connect(config, cli.json)?;
            let result = commands::deals::run(&ctx, cmd).await;
            ctx.flush_toasts();
            result
        }
        Commands::Activities(cmd) => {
            let ctx = Context::connect(config, cli.json)?;
            let result = commands::activities::run(&ctx, cmd).await;
            ctx.flush_toasts();
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use crm_core::types::{DealStage, LifecycleStage, RecordId};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bulk_stage_change() {
        let cli = Cli::try_parse_from([
            "crm", "contacts", "set-stage", "customer", "4", "7", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Contacts(ContactsCommand::SetStage { stage, ids }) => {
                assert_eq!(stage, LifecycleStage::Customer);
                assert_eq!(ids, vec![RecordId::new(4), RecordId::new(7)]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_shared_record_actions() {
        let cli = Cli::try_parse_from(["crm", "companies", "get", "12"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Companies(RecordAction::Get { id }) if id == RecordId::new(12)
        ));

        let cli =
            Cli::try_parse_from(["crm", "contacts", "list", "--where", "lifecycleStage=Lead"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Contacts(ContactsCommand::Record(RecordAction::List { filter: Some(_) }))
        ));
    }

    #[test]
    fn parses_deal_stage_spellings() {
        let cli = Cli::try_parse_from(["crm", "deals", "stage", "3", "closed-won"]).unwrap();
        match cli.command {
            Commands::Deals(DealsCommand::Stage { id, stage }) => {
                assert_eq!(id, RecordId::new(3));
                assert_eq!(stage, DealStage::ClosedWon);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_ids_and_empty_bulk_delete() {
        assert!(Cli::try_parse_from(["crm", "deals", "get", "abc"]).is_err());
        assert!(Cli::try_parse_from(["crm", "deals", "get", "0"]).is_err());
        assert!(Cli::try_parse_from(["crm", "contacts", "bulk-delete"]).is_err());
    }

    #[test]
    fn session_defaults_to_root() {
        let cli = Cli::try_parse_from(["crm", "--config", "/tmp/crm.toml", "session"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/crm.toml")));
        assert!(matches!(cli.command, Commands::Session { ref at } if at == "/"));
    }
}
