//! Bucket reconciliation: list what is stored, collect what the vault still
//! references, and remove the difference after confirmation.

mod collector;
mod inventory;
mod service;

pub use collector::{collect_referenced_keys, referenced_keys_in_text};
pub use inventory::list_remote_objects;
pub use service::{
    find_unused, normalize_references, CleanupPlan, CleanupReport, CleanupService, Confirm,
};
