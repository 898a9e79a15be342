mod activity;
mod company;
mod contact;
mod deal;

pub use activity::{Activity, ActivityDraft};
pub use company::{Company, CompanyDraft};
pub use contact::{Contact, ContactDraft};
pub use deal::{Deal, DealDraft};
