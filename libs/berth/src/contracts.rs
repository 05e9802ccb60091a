use async_trait::async_trait;

use crate::registry::Registry;

/// Construction hook: wire dependencies out of the registry.
///
/// Invoked once per module during the init phase, in caller order. A
/// binding without this role is skipped by `init`; unlike `run` and
/// `stop`, initialization is optional.
#[async_trait]
pub trait Initable: Send + Sync {
    async fn init(&self, registry: &Registry) -> anyhow::Result<()>;
}

/// Long-running capability.
///
/// `run` is expected to block for the module's operational lifetime
/// (e.g. serving a listener) and return only on normal termination or an
/// unrecoverable error. The host launches it as an independent task and
/// never cancels it; a module arranges its own exit in response to
/// [`Stoppable::stop`].
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}

/// Teardown capability: must return promptly after releasing the module's
/// resources.
#[async_trait]
pub trait Stoppable: Send + Sync {
    async fn stop(&self) -> anyhow::Result<()>;
}

/// Self-check hook for modules and typed config objects.
///
/// Not driven by the host's phases; config providers run it when a typed
/// schema is registered for a key.
pub trait Validator: Send + Sync {
    fn validate(&self) -> anyhow::Result<()>;
}
