//! Vault module: encrypted token storage.
//!
//! This module provides:
//! - `TokenRecord`, `NewRecord` and `OtpKind` (`record`)
//! - The in-memory `RecordStore` with its invariants (`store`)
//! - The encrypted envelope and atomic file replacement (`format`)
//! - The cross-process vault lock (`lock`)
//! - `VaultManager` lifecycle and the unlocked `Session` (`manager`)

pub mod format;
pub mod lock;
pub mod manager;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use manager::{
    ImportReport, RestoreReport, Session, ValidationResult, VaultManager, VaultState,
    VersionMismatch,
};
pub use record::{NewRecord, OtpKind, TokenRecord};
pub use store::{ListFilter, RecordStore};
