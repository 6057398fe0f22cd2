//! # warden-llm
//!
//! Model access for Warden.
//!
//! - [`ModelTransport`] is the single-method model capability.
//! - [`ChatCompletionsTransport`] speaks the OpenAI-compatible chat API
//!   (NVIDIA's hosted endpoint by default).
//! - [`CannedTransport`] plays back scripted outcomes for tests and `--offline`.
//! - [`AnalysisClient`] wraps a transport with a per-attempt deadline and one
//!   retry of transient failures, classifying the rest as [`AnalysisError`].

pub mod canned;
pub mod chat;
mod client;
mod error;
mod transport;

pub use canned::{Canned, CannedTransport, OFFLINE_REPLY};
pub use chat::ChatCompletionsTransport;
pub use client::{AnalysisClient, RawReply};
pub use error::{AnalysisError, TransportError};
pub use transport::ModelTransport;
