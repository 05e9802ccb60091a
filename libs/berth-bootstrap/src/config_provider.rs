use std::collections::HashMap;
use std::sync::Arc;

use berth::{ConfigProvider, Validator};
use serde::de::DeserializeOwned;

use crate::config::AppConfig;

type SchemaCheck = Box<dyn Fn(&serde_json::Value) -> anyhow::Result<()> + Send + Sync>;

/// Configuration provider backed by [`AppConfig`].
///
/// Exposes the per-module config bag for seeding the registry, and
/// validates values against per-key schema checks registered by the host.
/// Keys without a registered schema pass through unchecked; the registry
/// treats values as opaque, and so does the provider unless told
/// otherwise.
pub struct AppConfigProvider {
    config: Arc<AppConfig>,
    checks: HashMap<String, SchemaCheck>,
}

impl AppConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            checks: HashMap::new(),
        }
    }

    pub fn inner(&self) -> &AppConfig {
        &self.config
    }

    /// Require values under `key` to deserialize as `T`.
    pub fn with_schema<T: DeserializeOwned + 'static>(mut self, key: impl Into<String>) -> Self {
        self.checks.insert(
            key.into(),
            Box::new(|value| {
                serde_json::from_value::<T>(value.clone())
                    .map(drop)
                    .map_err(|e| anyhow::anyhow!("config does not match expected shape: {e}"))
            }),
        );
        self
    }

    /// Like [`with_schema`](Self::with_schema), plus the deserialized
    /// value's own [`Validator::validate`] check.
    pub fn with_validated_schema<T>(mut self, key: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Validator + 'static,
    {
        self.checks.insert(
            key.into(),
            Box::new(|value| {
                let typed: T = serde_json::from_value(value.clone())
                    .map_err(|e| anyhow::anyhow!("config does not match expected shape: {e}"))?;
                typed.validate()
            }),
        );
        self
    }

    /// The per-module config bag, in a shape ready for
    /// `Registry::set_configs`.
    pub fn module_configs(&self) -> Vec<(String, serde_json::Value)> {
        self.config
            .modules
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl ConfigProvider for AppConfigProvider {
    fn validate(&self, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
        match self.checks.get(key) {
            Some(check) => check(value),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct PortCfg {
        port: u16,
    }

    impl Validator for PortCfg {
        fn validate(&self) -> anyhow::Result<()> {
            if self.port == 0 {
                anyhow::bail!("port must not be 0");
            }
            Ok(())
        }
    }

    #[test]
    fn schema_check_rejects_wrong_shape() {
        let provider = AppConfigProvider::new(AppConfig::default()).with_schema::<PortCfg>("svc");

        assert!(provider.validate("svc", &json!({"port": 8087})).is_ok());
        assert!(provider.validate("svc", &json!({"port": "eight"})).is_err());
    }

    #[test]
    fn validated_schema_runs_the_value_check() {
        let provider =
            AppConfigProvider::new(AppConfig::default()).with_validated_schema::<PortCfg>("svc");

        assert!(provider.validate("svc", &json!({"port": 8087})).is_ok());
        let err = provider.validate("svc", &json!({"port": 0})).unwrap_err();
        assert!(err.to_string().contains("port must not be 0"));
    }

    #[test]
    fn unknown_keys_pass_through() {
        let provider = AppConfigProvider::new(AppConfig::default());
        assert!(provider.validate("anything", &json!("whatever")).is_ok());
    }

    #[test]
    fn module_configs_mirror_the_bag() {
        let mut config = AppConfig::default();
        config
            .modules
            .insert("echo".into(), json!({"listen": "127.0.0.1:0"}));

        let provider = AppConfigProvider::new(config);
        let bag = provider.module_configs();
        assert_eq!(bag.len(), 1);
        assert_eq!(bag[0].0, "echo");
    }
}
