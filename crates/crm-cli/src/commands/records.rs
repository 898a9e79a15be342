//! Create, read, update and delete, shared by every entity subcommand.

use std::io::Read;

use clap::Subcommand;
use crm_api_types::WhereClause;
use crm_core::adapter::RecordAdapter;
use crm_core::entities::{Activity, Company, Contact, Deal};
use crm_core::entity::Entity;
use crm_core::types::RecordId;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Context;

#[derive(Subcommand, Debug)]
pub enum RecordAction {
    /// List records, newest first.
    List {
        /// Only records whose field equals the value.
        #[arg(long = "where", value_name = "FIELD=VALUE")]
        filter: Option<String>,
    },
    /// Show one record.
    Get { id: RecordId },
    /// Create a record from JSON fields.
    Create {
        /// Inline JSON, `@path` to a file, or `-` for stdin.
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Change the given fields of a record.
    Update {
        id: RecordId,
        /// Inline JSON, `@path` to a file, or `-` for stdin.
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Delete a record.
    Delete { id: RecordId },
}

/// One-line rendering for the plain output mode.
pub trait Summary {
    fn summary(&self) -> String;
}

impl Summary for Contact {
    fn summary(&self) -> String {
        let company = self
            .company_id
            .as_ref()
            .and_then(|c| c.name())
            .unwrap_or("-");
        format!(
            "{:>6}  {:<28} {:<32} {:<10} {company}",
            self.id,
            self.full_name(),
            self.email,
            self.lifecycle_stage
        )
    }
}

impl Summary for Company {
    fn summary(&self) -> String {
        format!(
            "{:>6}  {:<28} {:<20} {:>6}  {}",
            self.id, self.name, self.industry, self.employee_count, self.website
        )
    }
}

impl Summary for Deal {
    fn summary(&self) -> String {
        format!(
            "{:>6}  {:<28} {:<12} {:>12.2} {:>4}%",
            self.id, self.name, self.stage, self.value, self.probability
        )
    }
}

impl Summary for Activity {
    fn summary(&self) -> String {
        let when = self
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        format!(
            "{:>6}  {:<16} {:<10} {}",
            self.id, when, self.kind, self.description
        )
    }
}

pub async fn run<E>(
    ctx: &Context,
    adapter: &RecordAdapter<E>,
    action: RecordAction,
) -> anyhow::Result<()>
where
    E: Entity + Summary,
    E::Draft: DeserializeOwned,
{
    match action {
        RecordAction::List { filter } => {
            let filter = filter.as_deref().map(parse_filter).transpose()?;
            let records = adapter.list(filter).await;
            ctx.ensure_loaded(records.is_empty(), E::PLURAL)?;
            print_records(ctx, &records)
        }
        RecordAction::Get { id } => {
            let record = adapter
                .get_by_id(id)
                .await
                .ok_or_else(|| anyhow::anyhow!("{} {id} could not be loaded", E::LABEL))?;
            print_records(ctx, &[record])
        }
        RecordAction::Create { data } => {
            let draft: E::Draft = parse_data(&data)?;
            let record = adapter
                .create(&draft)
                .await
                .ok_or_else(|| anyhow::anyhow!("{} was not created", E::LABEL))?;
            print_records(ctx, &[record])
        }
        RecordAction::Update { id, data } => {
            let draft: E::Draft = parse_data(&data)?;
            let record = adapter
                .update(id, &draft)
                .await
                .ok_or_else(|| anyhow::anyhow!("{} {id} was not updated", E::LABEL))?;
            print_records(ctx, &[record])
        }
        RecordAction::Delete { id } => {
            if !adapter.delete(id).await {
                anyhow::bail!("{} {id} was not deleted", E::LABEL);
            }
            Ok(())
        }
    }
}

pub fn print_records<E: Entity + Summary>(ctx: &Context, records: &[E]) -> anyhow::Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        for record in records {
            println!("{}", record.summary());
        }
    }
    Ok(())
}

/// `field=value`; the value is read as JSON when it parses, else as text.
pub fn parse_filter(raw: &str) -> anyhow::Result<WhereClause> {
    let (field, value) = raw
        .split_once('=')
        .filter(|(field, _)| !field.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("expected FIELD=VALUE, got {raw:?}"))?;
    let value = serde_json::from_str::<Value>(value.trim())
        .unwrap_or_else(|_| Value::String(value.trim().to_string()));
    Ok(WhereClause::equal_to(field.trim(), value))
}

/// Read a draft from inline JSON, `@file`, or `-` (stdin).
pub fn parse_data<T: DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    let text = if raw == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else if let Some(path) = raw.strip_prefix('@') {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("could not read {path}: {e}"))?
    } else {
        raw.to_string()
    };
    serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("invalid record JSON: {e}"))
}
