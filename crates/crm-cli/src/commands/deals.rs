use clap::Subcommand;
use crm_core::entities::Deal;
use crm_core::types::{DealStage, RecordId};
use serde::Serialize;

use super::records::{self, print_records, RecordAction};
use super::Context;

#[derive(Subcommand, Debug)]
pub enum DealsCommand {
    #[command(flatten)]
    Record(RecordAction),

    /// Move a deal to another pipeline stage.
    Stage { id: RecordId, stage: DealStage },

    /// Deals in one pipeline stage.
    ByStage { stage: DealStage },

    /// Count and value of deals per pipeline stage.
    Board,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageColumn {
    pub stage: String,
    pub count: usize,
    pub value: f64,
    pub weighted: f64,
}

/// Group deals into pipeline columns. Deals whose stage is not on the board
/// are collected under "Other" at the end.
pub fn board(deals: &[Deal]) -> Vec<StageColumn> {
    let mut columns: Vec<StageColumn> = DealStage::ORDER
        .iter()
        .map(|stage| StageColumn {
            stage: stage.as_str().to_string(),
            count: 0,
            value: 0.0,
            weighted: 0.0,
        })
        .collect();
    let mut other = StageColumn {
        stage: "Other".into(),
        count: 0,
        value: 0.0,
        weighted: 0.0,
    };
    for deal in deals {
        let column = match deal.pipeline_stage() {
            Some(stage) => &mut columns[stage.position()],
            None => &mut other,
        };
        column.count += 1;
        column.value += deal.value;
        column.weighted += deal.weighted_value();
    }
    if other.count > 0 {
        columns.push(other);
    }
    columns
}

pub async fn run(ctx: &Context, cmd: DealsCommand) -> anyhow::Result<()> {
    let deals = &ctx.adapters.deals;
    match cmd {
        DealsCommand::Record(action) => records::run(ctx, deals, action).await,
        DealsCommand::Stage { id, stage } => {
            let deal = deals
                .update_stage(id, stage)
                .await
                .ok_or_else(|| anyhow::anyhow!("Deal {id} was not moved to {stage}"))?;
            print_records(ctx, &[deal])
        }
        DealsCommand::ByStage { stage } => {
            let found = deals.by_stage(stage).await;
            ctx.ensure_loaded(found.is_empty(), "deals")?;
            print_records(ctx, &found)
        }
        DealsCommand::Board => {
            let all = deals.list(None).await;
            ctx.ensure_loaded(all.is_empty(), "deals")?;
            let columns = board(&all);
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&columns)?);
            } else {
                for column in &columns {
                    println!(
                        "{:<12} {:>4}  {:>12.2}  {:>12.2}",
                        column.stage, column.count, column.value, column.weighted
                    );
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deal(id: i64, stage: &str, value: f64, probability: i64) -> Deal {
        serde_json::from_value(json!({
            "Id": id,
            "Name": format!("Deal {id}"),
            "stage": stage,
            "value": value,
            "probability": probability,
        }))
        .unwrap()
    }

    #[test]
    fn board_follows_pipeline_order() {
        let columns = board(&[
            deal(1, "Proposal", 1000.0, 50),
            deal(2, "Prospect", 200.0, 10),
            deal(3, "Proposal", 500.0, 20),
        ]);
        let stages: Vec<_> = columns.iter().map(|c| c.stage.as_str()).collect();
        assert_eq!(
            stages,
            vec!["Prospect", "Qualified", "Proposal", "Negotiation", "Closed Won", "Closed Lost"]
        );
        assert_eq!(columns[2].count, 2);
        assert_eq!(columns[2].value, 1500.0);
        assert_eq!(columns[2].weighted, 600.0);
        assert_eq!(columns[0].weighted, 20.0);
    }

    #[test]
    fn unknown_stages_are_grouped_last() {
        let columns = board(&[deal(1, "Parked", 10.0, 100)]);
        let last = columns.last().unwrap();
        assert_eq!(last.stage, "Other");
        assert_eq!(last.count, 1);
    }
}
