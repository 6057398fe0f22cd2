//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use warden_config::WardenConfig;

#[test]
fn loads_model_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[model]
base_url = "http://localhost:8000/v1"
api_key = "sk-local"
model = "local/llama"
temperature = 0.0
top_p = 1.0
max_tokens = 2048
timeout_secs = 5
retry_backoff_ms = 50
"#,
        )?;

        let config: WardenConfig = Figment::from(Serialized::defaults(WardenConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.model.base_url, "http://localhost:8000/v1");
        assert_eq!(config.model.api_key, "sk-local");
        assert_eq!(config.model.model, "local/llama");
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.model.timeout_secs, 5);
        assert_eq!(config.model.retry_backoff_ms, 50);
        assert!(config.model.is_configured());
        assert!(config.model.validate().is_ok());
        Ok(())
    });
}

#[test]
fn loads_database_and_analysis_sections() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = ":memory:"

[analysis]
max_source_bytes = 1000
"#,
        )?;

        let config: WardenConfig = Figment::from(Serialized::defaults(WardenConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert!(config.database.is_in_memory());
        assert_eq!(config.analysis.max_source_bytes, 1000);
        // Untouched sections keep their defaults
        assert_eq!(config.model.model, "meta/llama-3.3-70b-instruct");
        Ok(())
    });
}

#[test]
fn partial_section_keeps_field_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[model]
api_key = "only-the-key"
"#,
        )?;

        let config: WardenConfig = Figment::from(Serialized::defaults(WardenConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.model.api_key, "only-the-key");
        assert_eq!(config.model.base_url, "https://integrate.api.nvidia.com/v1");
        assert_eq!(config.model.timeout_secs, 60);
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[validation]
endpoint = "https://validator.toml.example"
"#,
        )?;
        jail.set_env("WARDEN_VALIDATION__ENDPOINT", "https://validator.env.example");

        let config: WardenConfig = Figment::from(Serialized::defaults(WardenConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("WARDEN_").split("__"))
            .extract()?;

        assert_eq!(config.validation.endpoint, "https://validator.env.example");
        assert!(config.validation.is_configured());
        Ok(())
    });
}

#[test]
fn project_config_file_is_picked_up() {
    Jail::expect_with(|jail| {
        std::fs::create_dir(jail.directory().join(".warden")).map_err(|e| e.to_string())?;
        jail.create_file(
            ".warden/config.toml",
            r#"
[analysis]
max_source_bytes = 4096
"#,
        )?;

        let config: WardenConfig = WardenConfig::figment().extract()?;
        assert_eq!(config.analysis.max_source_bytes, 4096);
        Ok(())
    });
}

#[test]
fn invalid_model_value_fails_load() {
    Jail::expect_with(|jail| {
        jail.set_env("WARDEN_MODEL__TEMPERATURE", "9.0");
        let result = WardenConfig::load();
        assert!(result.is_err());
        Ok(())
    });
}
