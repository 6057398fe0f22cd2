//! Scripted transport for offline runs and tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::ModelTransport;

/// Reply used by `--offline`: the reference reentrancy/overflow analysis.
pub const OFFLINE_REPLY: &str = "\
[VULNERABILITY_SCAN]
- [HIGH] reentrancy | withdraw() | Potential reentrancy vulnerability in withdraw function
- [MEDIUM] overflow | transfer() | Integer overflow possible in transfer function

[OPTIMIZATION_ANALYSIS]
- [storage] Consider using memory instead of storage for temporary variables
- [loop] Cache array length outside of loops

[SECURITY_SCORE]
85/100
";

/// One scripted transport outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canned {
    /// Successful call returning this text.
    Reply(String),
    /// Non-success HTTP status; 429 maps to a rate limit.
    Status(u16, String),
    /// The endpoint could not be reached.
    Unreachable,
    /// The endpoint answered with an undecodable body.
    Garbled,
}

impl Canned {
    fn into_result(self) -> Result<String, TransportError> {
        match self {
            Self::Reply(text) => Ok(text),
            Self::Status(429, _) => Err(TransportError::RateLimited {
                retry_after_secs: 60,
            }),
            Self::Status(status, message) => Err(TransportError::Api { status, message }),
            Self::Unreachable => Err(TransportError::Unavailable(
                "connection refused".to_string(),
            )),
            Self::Garbled => Err(TransportError::Decode(
                "expected value at line 1 column 1".to_string(),
            )),
        }
    }
}

/// A [`ModelTransport`] that plays back a script of outcomes, then repeats a
/// fallback outcome forever.
#[derive(Debug)]
pub struct CannedTransport {
    script: Mutex<VecDeque<Canned>>,
    fallback: Canned,
    delay: Duration,
    calls: AtomicUsize,
}

impl CannedTransport {
    /// Always reply with `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self::repeating(Canned::Reply(text.into()))
    }

    /// Always produce `outcome`.
    #[must_use]
    pub fn repeating(outcome: Canned) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Transport replying with [`OFFLINE_REPLY`].
    #[must_use]
    pub fn offline() -> Self {
        Self::new(OFFLINE_REPLY)
    }

    /// Transport whose every call fails as unreachable.
    #[must_use]
    pub fn failing() -> Self {
        Self::repeating(Canned::Unreachable)
    }

    /// Queue `outcome` ahead of the fallback.
    #[must_use]
    pub fn then(self, outcome: Canned) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
        self
    }

    /// Sleep this long inside every call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Canned {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl ModelTransport for CannedTransport {
    async fn invoke(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.next_outcome().into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plays_script_then_fallback() {
        let transport = CannedTransport::new("done")
            .then(Canned::Status(503, "busy".into()))
            .then(Canned::Reply("first".into()));

        assert!(matches!(
            transport.invoke("s", "u").await,
            Err(TransportError::Api { status: 503, .. })
        ));
        assert_eq!(transport.invoke("s", "u").await.unwrap(), "first");
        assert_eq!(transport.invoke("s", "u").await.unwrap(), "done");
        assert_eq!(transport.invoke("s", "u").await.unwrap(), "done");
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn status_429_is_rate_limit() {
        let transport = CannedTransport::repeating(Canned::Status(429, String::new()));
        let err = transport.invoke("s", "u").await.unwrap_err();
        assert!(matches!(err, TransportError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn failing_is_transient() {
        let err = CannedTransport::failing().invoke("s", "u").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn offline_reply_has_all_sections() {
        assert!(OFFLINE_REPLY.contains("[VULNERABILITY_SCAN]"));
        assert!(OFFLINE_REPLY.contains("[OPTIMIZATION_ANALYSIS]"));
        assert!(OFFLINE_REPLY.contains("[SECURITY_SCORE]"));
    }
}
