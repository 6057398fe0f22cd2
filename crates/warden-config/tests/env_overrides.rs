use figment::Jail;
use warden_config::WardenConfig;

#[test]
fn nvidia_api_key_fills_model_key() {
    Jail::expect_with(|jail| {
        jail.set_env("NVIDIA_API_KEY", "nvapi-from-provider");

        let config = WardenConfig::load().expect("config loads");
        assert_eq!(config.model.api_key, "nvapi-from-provider");
        assert!(config.model.is_configured());
        Ok(())
    });
}

#[test]
fn prefixed_env_beats_provider_key() {
    Jail::expect_with(|jail| {
        jail.set_env("NVIDIA_API_KEY", "nvapi-from-provider");
        jail.set_env("WARDEN_MODEL__API_KEY", "sk-from-warden");

        let config = WardenConfig::load().expect("config loads");
        assert_eq!(config.model.api_key, "sk-from-warden");
        Ok(())
    });
}

#[test]
fn nested_env_sets_database_path() {
    Jail::expect_with(|jail| {
        jail.set_env("WARDEN_DATABASE__PATH", ":memory:");

        let config = WardenConfig::load().expect("config loads");
        assert!(config.database.is_in_memory());
        Ok(())
    });
}
