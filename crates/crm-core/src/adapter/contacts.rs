use chrono::Utc;

use super::{ContactAdapter, WriteKind};
use crate::entities::Contact;
use crate::entity::PayloadBuilder;
use crate::types::{LifecycleStage, RecordId};

impl ContactAdapter {
    /// Deletes every id in one batch. `true` only when all of them went.
    pub async fn bulk_delete(&self, ids: &[RecordId]) -> bool {
        if ids.is_empty() {
            return false;
        }
        let deleted = self.delete_many(ids).await;
        self.announce_many(WriteKind::Delete, deleted);
        deleted == ids.len()
    }

    /// Moves every contact to `stage`. Returns the contacts that were saved.
    pub async fn bulk_update_lifecycle_stage(
        &self,
        ids: &[RecordId],
        stage: LifecycleStage,
    ) -> Vec<Contact> {
        if ids.is_empty() {
            return Vec::new();
        }
        let now = Utc::now();
        let updates: Vec<_> = ids
            .iter()
            .map(|id| {
                let fields = PayloadBuilder::new()
                    .set("lifecycleStage", stage.as_str())
                    .set_timestamp("updatedAt", now)
                    .build();
                (*id, fields)
            })
            .collect();
        let saved = self.write_updates(&updates).await;
        tracing::info!(
            stage = %stage,
            requested = ids.len(),
            count = saved.len(),
            "lifecycle stage updated"
        );
        self.announce_many(WriteKind::Update, saved.len());
        saved
    }
}
