use thiserror::Error;

/// Structured errors for the registry and the lifecycle phases.
///
/// Everything here is fatal to the enclosing call: a missing binding or
/// capability is a wiring mistake, not a runtime condition to recover
/// from. The one recoverable case, a module's `stop` failing during
/// shutdown, is deliberately absent: it surfaces through the logging
/// sink and the teardown sequence continues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no module bound under name '{0}'")]
    NotFound(String),

    #[error("no config entry under key '{0}'")]
    ConfigNotFound(String),

    #[error("binding '{name}' is not a {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
    },

    #[error("module '{module}' does not expose the '{capability}' capability")]
    MissingCapability {
        module: String,
        capability: &'static str,
    },

    #[error("initialization failed for module '{module}'")]
    Init {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("config validation failed for key '{key}'")]
    ConfigValidation {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}
