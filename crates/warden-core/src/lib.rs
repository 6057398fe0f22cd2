//! # warden-core
//!
//! Core types and error types for Warden.
//!
//! This crate provides the foundational types shared across all Warden crates:
//! - The `Audit` entity and its status state machine
//! - Report value types (vulnerabilities, gas optimizations, security score)
//! - The versioned analysis request handed from the prompt builder to the model client
//! - ID prefix constants
//! - Cross-cutting error types
//! - The persistence contract implemented by store adapters

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod report;
pub mod request;
pub mod store;
