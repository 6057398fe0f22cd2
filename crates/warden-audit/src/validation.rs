//! The external validation capability.
//!
//! Validation is an opaque yes/no acknowledgement from a third party. When no
//! endpoint is configured the [`LocalValidator`] acknowledges every request,
//! which is how audits were marked validated before a network existed.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use warden_config::ValidationConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),
}

/// Ask a third party to validate an analyzed audit.
pub trait ValidationCapability: Send + Sync {
    /// `Ok(true)` on a positive acknowledgement, `Ok(false)` when declined.
    fn request_validation(
        &self,
        audit_id: &str,
    ) -> impl Future<Output = Result<bool, ValidationError>> + Send;
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

/// Acknowledges every request without leaving the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalValidator;

impl ValidationCapability for LocalValidator {
    async fn request_validation(&self, audit_id: &str) -> Result<bool, ValidationError> {
        debug!(audit_id, "validated locally");
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// Fixed-answer validator for tests; counts the requests it receives.
#[derive(Debug, Default)]
pub struct StaticValidator {
    ack: bool,
    calls: AtomicUsize,
}

impl StaticValidator {
    #[must_use]
    pub const fn accepting() -> Self {
        Self {
            ack: true,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub const fn declining() -> Self {
        Self {
            ack: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ValidationCapability for StaticValidator {
    async fn request_validation(&self, _audit_id: &str) -> Result<bool, ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ack)
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ValidationAck {
    validated: bool,
}

/// Validator calling `POST {endpoint}/audits/{id}/validate`, which answers
/// `{"validated": true|false}`.
pub struct HttpValidator {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpValidator {
    /// # Errors
    ///
    /// Returns [`ValidationError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &ValidationConfig) -> Result<Self, ValidationError> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    fn with_timeout(config: &ValidationConfig, timeout: Duration) -> Result<Self, ValidationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("warden/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: (!config.token.is_empty()).then(|| config.token.clone()),
        })
    }

    fn url(&self, audit_id: &str) -> String {
        format!(
            "{}/audits/{}/validate",
            self.endpoint,
            urlencoding::encode(audit_id)
        )
    }
}

fn decode_ack(body: &str) -> Result<bool, ValidationError> {
    serde_json::from_str::<ValidationAck>(body)
        .map(|ack| ack.validated)
        .map_err(|e| ValidationError::Decode(e.to_string()))
}

impl ValidationCapability for HttpValidator {
    async fn request_validation(&self, audit_id: &str) -> Result<bool, ValidationError> {
        let url = self.url(audit_id);
        let mut request = self.http.post(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ValidationError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        let ack = decode_ack(&body)?;
        debug!(audit_id, ack, "validation answered");
        Ok(ack)
    }
}

// ---------------------------------------------------------------------------
// Configured
// ---------------------------------------------------------------------------

/// The validator selected by the `[validation]` config section.
pub enum Validator {
    Local(LocalValidator),
    Http(HttpValidator),
}

impl Validator {
    /// HTTP when an endpoint is configured, local otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &ValidationConfig) -> Result<Self, ValidationError> {
        if config.is_configured() {
            Ok(Self::Http(HttpValidator::from_config(config)?))
        } else {
            Ok(Self::Local(LocalValidator))
        }
    }
}

impl ValidationCapability for Validator {
    async fn request_validation(&self, audit_id: &str) -> Result<bool, ValidationError> {
        match self {
            Self::Local(v) => v.request_validation(audit_id).await,
            Self::Http(v) => v.request_validation(audit_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn local_always_acknowledges() {
        assert!(LocalValidator.request_validation("aud-00000001").await.unwrap());
    }

    #[tokio::test]
    async fn static_counts_calls() {
        let validator = StaticValidator::declining();
        assert!(!validator.request_validation("aud-00000001").await.unwrap());
        assert!(!validator.request_validation("aud-00000001").await.unwrap());
        assert_eq!(validator.call_count(), 2);
    }

    #[test]
    fn http_url_encodes_audit_id() {
        let validator = HttpValidator::from_config(&ValidationConfig {
            endpoint: "https://validators.example.test/api/".into(),
            token: String::new(),
        })
        .unwrap();
        assert_eq!(
            validator.url("aud-1234abcd"),
            "https://validators.example.test/api/audits/aud-1234abcd/validate"
        );
        assert_eq!(
            validator.url("../admin"),
            "https://validators.example.test/api/audits/..%2Fadmin/validate"
        );
        assert!(validator.token.is_none());
    }

    #[tokio::test]
    async fn silent_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering.
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let config = ValidationConfig {
            endpoint: format!("http://{addr}"),
            token: String::new(),
        };
        let validator = HttpValidator::with_timeout(&config, Duration::from_millis(100)).unwrap();
        let err = validator.request_validation("aud-00000001").await.unwrap_err();
        assert!(matches!(err, ValidationError::Http(ref e) if e.is_timeout()), "{err:?}");
        server.abort();
    }

    #[test]
    fn ack_decoding() {
        assert!(decode_ack(r#"{"validated": true}"#).unwrap());
        assert!(!decode_ack(r#"{"validated": false, "reason": "stale"}"#).unwrap());
        assert!(matches!(decode_ack("{}"), Err(ValidationError::Decode(_))));
    }

    #[test]
    fn config_selects_validator() {
        let local = Validator::from_config(&ValidationConfig::default()).unwrap();
        assert!(matches!(local, Validator::Local(_)));

        let http = Validator::from_config(&ValidationConfig {
            endpoint: "https://validators.example.test".into(),
            token: "secret".into(),
        })
        .unwrap();
        match http {
            Validator::Http(v) => assert_eq!(v.token.as_deref(), Some("secret")),
            Validator::Local(_) => panic!("expected HTTP validator"),
        }
    }
}
