//! The model capability: one system+user prompt in, one text reply out.

use std::future::Future;
use std::sync::Arc;

use crate::error::TransportError;

/// A single-shot call to a language model.
///
/// Implementations make exactly one attempt per call; retries and deadlines
/// belong to [`AnalysisClient`](crate::AnalysisClient).
pub trait ModelTransport: Send + Sync {
    /// Send the prompts and return the reply text, which may be empty.
    fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

impl<T: ModelTransport> ModelTransport for Arc<T> {
    fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> impl Future<Output = Result<String, TransportError>> + Send {
        (**self).invoke(system_prompt, user_prompt)
    }
}
