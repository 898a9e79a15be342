use crm_api_types::WhereClause;

use super::ActivityAdapter;
use crate::entities::Activity;
use crate::types::RecordId;

impl ActivityAdapter {
    /// Timeline of one contact, newest first.
    pub async fn for_contact(&self, contact: RecordId) -> Vec<Activity> {
        self.find_where(WhereClause::equal_to("contactId", contact)).await
    }

    pub async fn for_deal(&self, deal: RecordId) -> Vec<Activity> {
        self.find_where(WhereClause::equal_to("dealId", deal)).await
    }
}
