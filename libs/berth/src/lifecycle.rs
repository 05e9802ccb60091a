use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::Error;
use crate::registry::Registry;
use crate::shutdown::ShutdownGate;

/// Lifecycle states of a host. One host instance drives one lifecycle;
/// there is no restart path back from `Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Created,
    Initialized,
    Running,
    ShuttingDown,
    Stopped,
}

/// The lifecycle controller.
///
/// Drives `init → start/wait → shutdown` over caller-given module-name
/// sequences, using the registry for lookups and the binding's capability
/// record for dispatch. The order of every phase is the caller's;
/// shutdown is conventionally the reverse of start, but nothing enforces
/// that.
pub struct Host {
    registry: Arc<Registry>,
    gate: ShutdownGate,
    phase: Mutex<Phase>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Host {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            gate: ShutdownGate::new(),
            phase: Mutex::new(Phase::Created),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Hand an externally owned one-shot stop signal to the gate. Must be
    /// called before [`start`](Host::start).
    pub fn register_stop_signal(&self, signal: impl Future<Output = ()> + Send + 'static) {
        self.gate.register(signal);
    }

    /// Token cancelled when shutdown intent has been delivered, for
    /// callers that want to observe it from their own tasks.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.gate.token()
    }

    /// INIT phase: initialize modules synchronously, in sequence order.
    ///
    /// A binding without the init capability is skipped; init is
    /// optional per module. The first init error halts the phase; modules
    /// already initialized are not rolled back.
    pub async fn init(&self, names: &[&str]) -> Result<(), Error> {
        tracing::info!("Phase: init");

        for &name in names {
            let binding = self.registry.binding(name)?;
            match binding.as_init() {
                Some(initable) => {
                    tracing::debug!(module = name, "initializing module");
                    initable
                        .init(&self.registry)
                        .await
                        .map_err(|source| Error::Init {
                            module: name.to_string(),
                            source,
                        })?;
                }
                None => {
                    tracing::debug!(module = name, "no init capability, skipping");
                }
            }
        }

        *self.phase.lock() = Phase::Initialized;
        Ok(())
    }

    /// START phase: launch every module concurrently, then block until
    /// shutdown intent arrives.
    ///
    /// The whole list is resolved and capability-checked before the first
    /// launch, so a list containing a non-runnable module starts nothing.
    /// Launch order follows the list; completion order is up to the
    /// modules. This is the host's main blocking call; it returns only
    /// once an external stop signal fires or a `shutdown` call completes.
    pub async fn start(&self, names: &[&str]) -> Result<(), Error> {
        tracing::info!("Phase: start");
        self.gate.arm();

        let mut runnables = Vec::with_capacity(names.len());
        for &name in names {
            let binding = self.registry.binding(name)?;
            let runnable = binding.as_run().ok_or_else(|| Error::MissingCapability {
                module: name.to_string(),
                capability: "run",
            })?;
            runnables.push((name.to_string(), runnable));
        }

        *self.phase.lock() = Phase::Running;

        for (name, runnable) in runnables {
            tracing::info!(module = %name, "module starting");
            let handle = tokio::spawn(async move {
                match runnable.run().await {
                    Ok(()) => tracing::debug!(module = %name, "module run returned"),
                    Err(e) => tracing::error!(module = %name, error = %e, "module run failed"),
                }
            });
            self.tasks.lock().push(handle);
        }

        self.gate.wait().await;
        tracing::info!("shutdown intent received, start phase unblocked");
        Ok(())
    }

    /// SHUTDOWN phase: stop modules synchronously, in the caller-supplied
    /// order.
    ///
    /// A missing stop capability is fatal; a `stop` that returns an error
    /// is logged and the remaining teardown continues. Once the full list
    /// has been processed, shutdown intent is delivered (at most once),
    /// unblocking a pending `start`.
    pub async fn shutdown(&self, names: &[&str]) -> Result<(), Error> {
        tracing::info!("Phase: shutdown");
        *self.phase.lock() = Phase::ShuttingDown;

        for &name in names {
            let binding = self.registry.binding(name)?;
            let stoppable = binding.as_stop().ok_or_else(|| Error::MissingCapability {
                module: name.to_string(),
                capability: "stop",
            })?;

            tracing::info!(module = name, "module stopping");
            if let Err(e) = stoppable.stop().await {
                tracing::warn!(module = name, error = %e, "module stop failed");
            } else {
                tracing::debug!(module = name, "module stopped");
            }
        }

        *self.phase.lock() = Phase::Stopped;
        self.gate.fire();
        Ok(())
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("phase", &self.phase())
            .field("launched_tasks", &self.tasks.lock().len())
            .finish()
    }
}
