use std::path::Path;

use anyhow::Context;
use warden_audit::{AuditManager, Validator};
use warden_config::WardenConfig;
use warden_db::WardenDb;
use warden_llm::{
    AnalysisClient, CannedTransport, ChatCompletionsTransport, ModelTransport, TransportError,
};
use warden_report::PromptBuilder;

use crate::cli::ModelMode;

/// The model transport picked for this invocation.
pub enum Transport {
    Offline(CannedTransport),
    Chat(ChatCompletionsTransport),
}

impl Transport {
    fn select(config: &WardenConfig, mode: ModelMode) -> anyhow::Result<Self> {
        match mode {
            // Commands that never call the model get the canned transport.
            ModelMode::Offline | ModelMode::Unused => Ok(Self::Offline(CannedTransport::offline())),
            ModelMode::Live => {
                if !config.model.is_configured() {
                    anyhow::bail!(
                        "model API key is not configured: set NVIDIA_API_KEY or \
                         WARDEN_MODEL__API_KEY, or pass --offline"
                    );
                }
                let transport = ChatCompletionsTransport::from_config(&config.model)
                    .context("failed to build model transport")?;
                tracing::debug!(
                    endpoint = transport.endpoint(),
                    model = transport.model(),
                    "using live model"
                );
                Ok(Self::Chat(transport))
            }
        }
    }
}

impl ModelTransport for Transport {
    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, TransportError> {
        match self {
            Self::Offline(t) => t.invoke(system_prompt, user_prompt).await,
            Self::Chat(t) => t.invoke(system_prompt, user_prompt).await,
        }
    }
}

pub type Manager = AuditManager<WardenDb, Transport, Validator>;

/// Everything a command handler needs.
pub struct AppContext {
    pub manager: Manager,
}

impl AppContext {
    pub async fn init(config: WardenConfig, mode: ModelMode) -> anyhow::Result<Self> {
        let transport = Transport::select(&config, mode)?;
        let validator =
            Validator::from_config(&config.validation).context("failed to build validator")?;
        let db = open_db(&config).await?;

        let manager = AuditManager::new(
            db,
            PromptBuilder::new(config.analysis.max_source_bytes),
            AnalysisClient::from_config(transport, &config.model),
            validator,
        );
        Ok(Self { manager })
    }
}

async fn open_db(config: &WardenConfig) -> anyhow::Result<WardenDb> {
    let path = &config.database.path;
    if !config.database.is_in_memory() {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
    }
    WardenDb::open_local(path)
        .await
        .with_context(|| format!("failed to open database at {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_memory() -> WardenConfig {
        let mut config = WardenConfig::default();
        config.database.path = ":memory:".into();
        config.model.api_key = String::new();
        config
    }

    #[tokio::test]
    async fn live_mode_requires_api_key() {
        let Err(error) = AppContext::init(in_memory(), ModelMode::Live).await else {
            panic!("expected missing key error");
        };
        assert!(error.to_string().contains("--offline"));
    }

    #[tokio::test]
    async fn offline_mode_needs_no_key() {
        let ctx = AppContext::init(in_memory(), ModelMode::Offline).await.unwrap();
        assert!(matches!(ctx.manager.client().transport(), Transport::Offline(_)));
    }

    #[tokio::test]
    async fn live_mode_uses_chat_transport() {
        let mut config = in_memory();
        config.model.api_key = "nvapi-test".into();
        let ctx = AppContext::init(config, ModelMode::Live).await.unwrap();
        assert!(matches!(ctx.manager.client().transport(), Transport::Chat(_)));
    }

    #[tokio::test]
    async fn creates_database_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = in_memory();
        config.database.path = dir.path().join("nested/warden.db").to_string_lossy().into_owned();
        AppContext::init(config, ModelMode::Unused).await.unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
