use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::contracts::{Initable, Runnable, Stoppable, Validator};
use crate::errors::Error;
use crate::provider::ConfigProvider;

/// A bound module: the opaque object plus the lifecycle capabilities it
/// was constructed with.
///
/// Capability membership is decided here, when the binding is built, not
/// re-probed at every phase. A role that is `None` simply isn't offered:
/// `init` will skip the module, `start`/`shutdown` will refuse it.
pub struct Binding {
    object: Arc<dyn Any + Send + Sync>,
    init: Option<Arc<dyn Initable>>,
    run: Option<Arc<dyn Runnable>>,
    stop: Option<Arc<dyn Stoppable>>,
    validate: Option<Arc<dyn Validator>>,
}

impl Binding {
    /// A plain value binding with no lifecycle roles: shared state other
    /// modules resolve by name.
    pub fn new<T: Any + Send + Sync>(object: Arc<T>) -> Self {
        Self {
            object,
            init: None,
            run: None,
            stop: None,
            validate: None,
        }
    }

    /// Wire all three lifecycle roles from one object.
    pub fn service<M>(module: Arc<M>) -> Self
    where
        M: Initable + Runnable + Stoppable + Any + Send + Sync,
    {
        Self::new(module.clone())
            .with_init(module.clone())
            .with_run(module.clone())
            .with_stop(module)
    }

    /// Wire `run` and `stop` only, for modules with nothing to
    /// initialize.
    pub fn runner<M>(module: Arc<M>) -> Self
    where
        M: Runnable + Stoppable + Any + Send + Sync,
    {
        Self::new(module.clone())
            .with_run(module.clone())
            .with_stop(module)
    }

    pub fn with_init(mut self, m: Arc<dyn Initable>) -> Self {
        self.init = Some(m);
        self
    }

    pub fn with_run(mut self, m: Arc<dyn Runnable>) -> Self {
        self.run = Some(m);
        self
    }

    pub fn with_stop(mut self, m: Arc<dyn Stoppable>) -> Self {
        self.stop = Some(m);
        self
    }

    pub fn with_validate(mut self, m: Arc<dyn Validator>) -> Self {
        self.validate = Some(m);
        self
    }

    pub fn object(&self) -> Arc<dyn Any + Send + Sync> {
        self.object.clone()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.object.clone().downcast::<T>().ok()
    }

    pub fn as_init(&self) -> Option<Arc<dyn Initable>> {
        self.init.clone()
    }

    pub fn as_run(&self) -> Option<Arc<dyn Runnable>> {
        self.run.clone()
    }

    pub fn as_stop(&self) -> Option<Arc<dyn Stoppable>> {
        self.stop.clone()
    }

    pub fn as_validate(&self) -> Option<Arc<dyn Validator>> {
        self.validate.clone()
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("has_init", &self.init.is_some())
            .field("has_run", &self.run.is_some())
            .field("has_stop", &self.stop.is_some())
            .field("has_validate", &self.validate.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Maps {
    bindings: HashMap<String, Arc<Binding>>,
    configs: HashMap<String, serde_json::Value>,
}

/// Name → binding and key → config-value maps.
///
/// One instance per process run, owned by the host and passed by
/// reference to modules during init. Both maps sit behind a single mutex;
/// the lock is held for the duration of one map operation only and never
/// across module code, so a module may resolve a dependency while another
/// task is binding.
pub struct Registry {
    provider: Arc<dyn ConfigProvider>,
    maps: Mutex<Maps>,
}

impl Registry {
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self {
            provider,
            maps: Mutex::new(Maps::default()),
        }
    }

    /// Store or overwrite a binding. Always succeeds; a previous binding
    /// for `name` becomes unreachable, with no cleanup hook invoked.
    pub fn bind(&self, name: impl Into<String>, binding: Binding) {
        let name = name.into();
        let prev = self.maps.lock().bindings.insert(name.clone(), Arc::new(binding));
        if prev.is_some() {
            tracing::debug!(module = %name, "binding replaced");
        } else {
            tracing::debug!(module = %name, "binding registered");
        }
    }

    /// Full binding record, capabilities included.
    pub fn binding(&self, name: &str) -> Result<Arc<Binding>, Error> {
        self.maps
            .lock()
            .bindings
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// The bound object. A missing binding is a wiring mistake and fails
    /// hard rather than returning an option.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Any + Send + Sync>, Error> {
        Ok(self.binding(name)?.object())
    }

    /// `resolve` plus a checked downcast to the expected concrete type.
    pub fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, Error> {
        self.binding(name)?
            .downcast::<T>()
            .ok_or_else(|| Error::WrongType {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Raw config value for `key`. Same fail-fast contract as `resolve`.
    pub fn config(&self, key: &str) -> Result<serde_json::Value, Error> {
        self.maps
            .lock()
            .configs
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ConfigNotFound(key.to_string()))
    }

    /// Typed view of a config value.
    pub fn config_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, Error> {
        let value = self.config(key)?;
        serde_json::from_value(value).map_err(|e| Error::ConfigValidation {
            key: key.to_string(),
            source: e.into(),
        })
    }

    /// Commit a batch of config entries, all-or-nothing.
    ///
    /// Every value is run through the configuration provider first; the
    /// first rejection fails the call and none of the batch is committed.
    /// Validation happens outside the map lock; providers run
    /// user-supplied checks.
    pub fn set_configs(
        &self,
        entries: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> Result<(), Error> {
        let entries: Vec<(String, serde_json::Value)> = entries.into_iter().collect();

        for (key, value) in &entries {
            self.provider
                .validate(key, value)
                .map_err(|source| Error::ConfigValidation {
                    key: key.clone(),
                    source,
                })?;
        }

        let mut maps = self.maps.lock();
        for (key, value) in entries {
            maps.configs.insert(key, value);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let maps = self.maps.lock();
        let mut bindings: Vec<&String> = maps.bindings.keys().collect();
        bindings.sort();
        let mut configs: Vec<&String> = maps.configs.keys().collect();
        configs.sort();
        f.debug_struct("Registry")
            .field("bindings", &bindings)
            .field("configs", &configs)
            .finish()
    }
}
