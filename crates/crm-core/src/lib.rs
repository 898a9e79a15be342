//! Records, configuration and notifications for the CRM client.
//!
//! The entity adapters in [`adapter`] are the only way pages touch the
//! remote collections; they run against any [`store::RecordStore`].

pub mod adapter;
pub mod config;
pub mod entities;
pub mod entity;
pub mod lenient;
pub mod memory_store;
pub mod notify;
pub mod store;
pub mod types;

pub use adapter::{
    ActivityAdapter, Adapters, CompanyAdapter, ContactAdapter, DealAdapter, RecordAdapter,
};
pub use config::Config;
pub use entity::Entity;
pub use memory_store::MemoryStore;
pub use notify::{Notifier, ToastLevel, ToastQueue};
pub use store::{RecordStore, StoreError};
pub use types::{DealStage, LifecycleStage, RecordId, RecordRef};
