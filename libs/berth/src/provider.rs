/// Configuration provider collaborator.
///
/// The registry treats config values as opaque; deciding whether a value
/// is acceptable for a given key is the provider's job. `set_configs`
/// runs every entry of a batch through [`validate`](ConfigProvider::validate)
/// before committing any of them.
pub trait ConfigProvider: Send + Sync {
    fn validate(&self, key: &str, value: &serde_json::Value) -> anyhow::Result<()>;
}

/// Provider that accepts every value. Useful in tests and for hosts that
/// validate configuration elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ConfigProvider for AcceptAll {
    fn validate(&self, _key: &str, _value: &serde_json::Value) -> anyhow::Result<()> {
        Ok(())
    }
}
