use std::sync::Arc;

use crm_api_types::WhereClause;
use crm_core::adapter::Adapters;
use crm_core::config::RecordsConfig;
use crm_core::entities::{ActivityDraft, CompanyDraft, ContactDraft, DealDraft};
use crm_core::memory_store::{MemoryStore, StoreCall};
use crm_core::notify::{ToastLevel, ToastQueue};
use crm_core::types::{DealStage, LifecycleStage, RecordId};
use serde_json::json;

struct Harness {
    store: Arc<MemoryStore>,
    toasts: Arc<ToastQueue>,
    crm: Adapters,
}

impl Harness {
    fn new() -> Self {
        Self::with_page_size(100)
    }

    fn with_page_size(page_size: u32) -> Self {
        let store = Arc::new(MemoryStore::new());
        let toasts = Arc::new(ToastQueue::default());
        let crm = Adapters::new(store.clone(), toasts.clone(), &RecordsConfig { page_size });
        Self { store, toasts, crm }
    }

    fn messages(&self) -> Vec<(ToastLevel, String)> {
        self.toasts
            .drain()
            .into_iter()
            .map(|t| (t.level, t.message))
            .collect()
    }

    async fn contact(&self, first: &str, last: &str) -> RecordId {
        let draft = ContactDraft {
            first_name: Some(first.into()),
            last_name: Some(last.into()),
            email: Some(format!("{}@example.com", first.to_lowercase())),
            ..ContactDraft::default()
        };
        let contact = self.crm.contacts.create(&draft).await.expect("contact created");
        contact.id
    }
}

fn payload(value: serde_json::Value) -> crm_api_types::Payload {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("payload must be an object"),
    }
}

#[tokio::test]
async fn create_then_get_returns_written_fields() {
    let h = Harness::new();
    let company = h
        .crm
        .companies
        .create(&CompanyDraft {
            name: Some("Analytical Engines".into()),
            employee_count: Some(12),
            ..CompanyDraft::default()
        })
        .await
        .expect("company created");

    let created = h
        .crm
        .contacts
        .create(&ContactDraft {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            company_id: Some(company.id),
            ..ContactDraft::default()
        })
        .await
        .expect("contact created");

    let fetched = h.crm.contacts.get_by_id(created.id).await.expect("found");
    assert_eq!(fetched.name, "Ada Lovelace");
    assert_eq!(fetched.email, "ada@example.com");
    assert_eq!(fetched.lifecycle_stage, "Lead");
    assert_eq!(fetched.phone, "");
    assert_eq!(fetched.company_id.map(|r| r.id()), Some(company.id));
    assert!(fetched.created_at.is_some());

    assert_eq!(
        h.messages(),
        vec![
            (ToastLevel::Success, "Company created successfully".to_string()),
            (ToastLevel::Success, "Contact created successfully".to_string()),
        ]
    );
}

#[tokio::test]
async fn list_is_newest_first_and_paged() {
    let h = Harness::with_page_size(2);
    let first = h.contact("Ada", "Lovelace").await;
    let second = h.contact("Grace", "Hopper").await;
    let third = h.contact("Alan", "Turing").await;

    let ids: Vec<_> = h.crm.contacts.list(None).await.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![third, second]);
    assert!(!ids.contains(&first));

    match h.store.calls().last() {
        Some(StoreCall::Fetch { collection, params }) => {
            assert_eq!(collection, "app_contact");
            let paging = params.paging_info.expect("paged");
            assert_eq!((paging.limit, paging.offset), (2, 0));
            assert_eq!(params.order_by[0].field_name, "CreatedOn");
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn list_with_filter() {
    let h = Harness::new();
    h.contact("Ada", "Lovelace").await;
    h.contact("Grace", "Hopper").await;

    let found = h
        .crm
        .contacts
        .list(Some(WhereClause::equal_to("firstName", "Grace")))
        .await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].full_name(), "Grace Hopper");
}

#[tokio::test]
async fn rejected_envelope_yields_empty_sentinels() {
    let h = Harness::new();
    let id = h.contact("Ada", "Lovelace").await;
    h.messages();
    h.store.set_outage(Some("Table app_contact is unavailable"));

    assert!(h.crm.contacts.list(None).await.is_empty());
    assert!(h.crm.contacts.get_by_id(id).await.is_none());
    assert!(h.crm.contacts.create(&ContactDraft::default()).await.is_none());
    assert!(h.crm.contacts.update(id, &ContactDraft::default()).await.is_none());
    assert!(!h.crm.contacts.delete(id).await);

    let messages = h.messages();
    assert_eq!(messages.len(), 5);
    assert!(messages
        .iter()
        .all(|(level, msg)| *level == ToastLevel::Error && msg == "Table app_contact is unavailable"));
}

#[tokio::test]
async fn filtered_queries_fail_quietly() {
    let h = Harness::new();
    h.store.set_outage(Some("Service unavailable"));
    assert!(h.crm.activities.for_contact(RecordId::new(1)).await.is_empty());
    assert!(h.crm.deals.by_stage(DealStage::Proposal).await.is_empty());
    assert!(h.messages().is_empty());
}

#[tokio::test]
async fn transport_failures_are_logged_not_toasted() {
    let h = Harness::new();
    h.store.set_transport_failure(true);

    assert!(h.crm.deals.list(None).await.is_empty());
    assert!(h.crm.deals.create(&DealDraft::default()).await.is_none());
    assert!(!h.crm.deals.delete(RecordId::new(3)).await);
    assert!(h.messages().is_empty());
}

#[tokio::test]
async fn loosely_typed_fields_keep_the_record() {
    let h = Harness::new();
    let deal = h.store.seed(
        "deal",
        payload(json!({ "Name": "Renewal", "probability": 25.5, "value": "1200", "stage": "Proposal" })),
    );
    let contact = h.store.seed(
        "app_contact",
        payload(json!({ "Name": "Ada", "createdAt": "2024-01-15T10:30:00", "updatedAt": "soon" })),
    );

    let deals = h.crm.deals.list(None).await;
    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].probability, 26);
    assert_eq!(deals[0].value, 1200.0);

    let contacts = h.crm.contacts.find_where(WhereClause::equal_to("Name", "Ada")).await;
    assert_eq!(contacts.len(), 1);
    let created = contacts[0].created_at.expect("offset-less timestamp read as UTC");
    assert_eq!(created.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    assert!(contacts[0].updated_at.is_none());

    assert!(h.crm.deals.get_by_id(deal).await.is_some());
    assert!(h.crm.contacts.get_by_id(contact).await.is_some());
    assert!(h.messages().is_empty());
}

#[tokio::test]
async fn update_sends_only_provided_fields() {
    let h = Harness::new();
    let deal = h
        .crm
        .deals
        .create(&DealDraft {
            name: Some("Pilot".into()),
            value: Some(5000.0),
            probability: Some(40),
            ..DealDraft::default()
        })
        .await
        .expect("deal created");

    let updated = h
        .crm
        .deals
        .update(
            deal.id,
            &DealDraft {
                value: Some(0.0),
                notes: Some(String::new()),
                ..DealDraft::default()
            },
        )
        .await
        .expect("deal updated");

    let sent = h.store.written_records().pop().expect("update sent");
    let mut keys: Vec<_> = sent.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["Id", "notes", "updatedAt", "value"]);
    assert_eq!(sent["Id"], serde_json::json!(deal.id.get()));

    assert_eq!(updated.value, 0.0);
    assert_eq!(updated.notes, "");
    assert_eq!(updated.name, "Pilot");
    assert_eq!(updated.probability, 40);
}

#[tokio::test]
async fn create_reports_field_errors() {
    let h = Harness::new();
    h.store.require_field("app_contact", "email", "Email");

    let created = h
        .crm
        .contacts
        .create(&ContactDraft {
            name: Some("No Email".into()),
            ..ContactDraft::default()
        })
        .await;
    assert!(created.is_none());
    assert_eq!(
        h.messages(),
        vec![
            (ToastLevel::Error, "Email: is required".to_string()),
            (ToastLevel::Error, "Validation failed".to_string()),
        ]
    );
}

#[tokio::test]
async fn bulk_delete_succeeds_only_when_every_record_goes() {
    let h = Harness::new();
    let a = h.contact("Ada", "Lovelace").await;
    let b = h.contact("Grace", "Hopper").await;
    h.messages();

    assert!(h.crm.contacts.bulk_delete(&[a, b]).await);
    assert_eq!(h.store.count("app_contact"), 0);
    assert_eq!(
        h.messages(),
        vec![(ToastLevel::Success, "2 contacts deleted successfully".to_string())]
    );
}

#[tokio::test]
async fn bulk_delete_with_one_failure() {
    let h = Harness::new();
    let a = h.contact("Ada", "Lovelace").await;
    let b = h.contact("Grace", "Hopper").await;
    h.store.lock_record(b);
    h.messages();

    assert!(!h.crm.contacts.bulk_delete(&[a, b]).await);
    let messages = h.messages();
    assert!(messages.contains(&(ToastLevel::Error, format!("Record {b} is locked"))));
    assert!(messages.contains(&(ToastLevel::Success, "1 contacts deleted successfully".to_string())));
}

#[tokio::test]
async fn bulk_delete_of_nothing_makes_no_call() {
    let h = Harness::new();
    assert!(!h.crm.contacts.bulk_delete(&[]).await);
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn bulk_lifecycle_update_returns_saved_subset() {
    let h = Harness::new();
    let a = h.contact("Ada", "Lovelace").await;
    let b = h.contact("Grace", "Hopper").await;
    h.store.lock_record(a);
    h.messages();

    let saved = h
        .crm
        .contacts
        .bulk_update_lifecycle_stage(&[a, b], LifecycleStage::Customer)
        .await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, b);
    assert_eq!(saved[0].stage(), Some(LifecycleStage::Customer));

    let messages = h.messages();
    assert!(messages.contains(&(ToastLevel::Error, format!("Record {a} is locked"))));
    assert!(messages.contains(&(ToastLevel::Success, "1 contacts updated successfully".to_string())));
}

#[tokio::test]
async fn delete_missing_record() {
    let h = Harness::new();
    assert!(!h.crm.companies.delete(RecordId::new(404)).await);
    assert_eq!(
        h.messages(),
        vec![(ToastLevel::Error, "Record 404 not found".to_string())]
    );
}

#[tokio::test]
async fn deal_stage_moves_without_success_toast() {
    let h = Harness::new();
    let deal = h
        .crm
        .deals
        .create(&DealDraft {
            name: Some("Renewal".into()),
            ..DealDraft::default()
        })
        .await
        .expect("deal created");
    assert_eq!(deal.pipeline_stage(), Some(DealStage::Prospect));
    h.messages();

    let moved = h
        .crm
        .deals
        .update_stage(deal.id, DealStage::ClosedWon)
        .await
        .expect("stage updated");
    assert_eq!(moved.stage, "Closed Won");
    assert!(h.messages().is_empty());

    let won = h.crm.deals.by_stage(DealStage::ClosedWon).await;
    assert_eq!(won.len(), 1);
    assert!(h.crm.deals.by_stage(DealStage::Prospect).await.is_empty());
}

#[tokio::test]
async fn activities_by_contact_and_deal() {
    let h = Harness::new();
    let ada = h.contact("Ada", "Lovelace").await;
    let grace = h.contact("Grace", "Hopper").await;

    for (contact, kind) in [(ada, "Call"), (ada, "Email"), (grace, "Meeting")] {
        h.crm
            .activities
            .create(&ActivityDraft {
                contact_id: Some(contact),
                deal_id: (kind == "Meeting").then(|| RecordId::new(77)),
                kind: Some(kind.into()),
                ..ActivityDraft::default()
            })
            .await
            .expect("activity created");
    }

    let for_ada = h.crm.activities.for_contact(ada).await;
    assert_eq!(for_ada.len(), 2);
    assert!(for_ada.iter().all(|a| a.contact_id.as_ref().map(|r| r.id()) == Some(ada)));

    let for_deal = h.crm.activities.for_deal(RecordId::new(77)).await;
    assert_eq!(for_deal.len(), 1);
    assert_eq!(for_deal[0].name, "Meeting");

    match h.store.calls().last() {
        Some(StoreCall::Fetch { params, .. }) => {
            assert!(params.paging_info.is_none());
            assert_eq!(params.order_by[0].field_name, "timestamp");
        }
        other => panic!("unexpected call {other:?}"),
    }
}
