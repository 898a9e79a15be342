use chrono::Utc;
use crm_api_types::WhereClause;

use super::DealAdapter;
use crate::entities::Deal;
use crate::entity::PayloadBuilder;
use crate::types::{DealStage, RecordId};

impl DealAdapter {
    /// Moves a deal along the pipeline. The board redraws itself, so no
    /// success toast is raised.
    pub async fn update_stage(&self, id: RecordId, stage: DealStage) -> Option<Deal> {
        let fields = PayloadBuilder::new()
            .set("stage", stage.as_str())
            .set_timestamp("updatedAt", Utc::now())
            .build();
        self.write_updates(&[(id, fields)]).await.into_iter().next()
    }

    pub async fn by_stage(&self, stage: DealStage) -> Vec<Deal> {
        self.find_where(WhereClause::equal_to("stage", stage.as_str())).await
    }
}
