//! # warden-audit
//!
//! The audit lifecycle.
//!
//! [`AuditManager`] drives an audit from submission through analysis to
//! external validation over three capabilities: an
//! [`AuditStore`](warden_core::store::AuditStore), a
//! [`ModelTransport`](warden_llm::ModelTransport) wrapped in an
//! [`AnalysisClient`](warden_llm::AnalysisClient), and a
//! [`ValidationCapability`].
//!
//! [`MemoryAuditStore`] is an in-process store with the same compare-and-set
//! semantics as the database store.

mod error;
mod manager;
pub mod memory;
pub mod validation;

pub use error::AuditError;
pub use manager::AuditManager;
pub use memory::MemoryAuditStore;
pub use validation::{
    HttpValidator, LocalValidator, StaticValidator, ValidationCapability, ValidationError,
    Validator,
};
