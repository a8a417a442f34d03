//! # cb-core
//!
//! The central domain logic and interface definitions for Clawboard:
//! models, storage ports, ledger rules, and the error type.

pub mod error;
pub mod events;
pub mod models;
pub mod rules;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use events::*;
pub use models::*;
pub use traits::*;
