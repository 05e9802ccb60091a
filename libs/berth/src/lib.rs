//! # Berth - Module Lifecycle Orchestrator
//!
//! A process-wide registry of named components plus a small state machine
//! that initializes, runs, and gracefully stops them in caller-specified
//! order.
//!
//! ## Model
//!
//! - **Registry**: name → binding and key → config-value maps. A binding
//!   wraps an opaque object together with the lifecycle capabilities it
//!   was constructed with.
//! - **Capabilities**: [`Initable`], [`Runnable`], [`Stoppable`] and
//!   [`Validator`]: independent roles a bound object may satisfy. Role
//!   membership is fixed when the [`Binding`] is built, not probed per
//!   call.
//! - **Host**: drives the phases `init → start/wait → shutdown` over
//!   caller-given name sequences. `start` launches every runnable as its
//!   own task and blocks until the shutdown gate fires.
//! - **ShutdownGate**: fan-in of externally owned one-shot stop signals
//!   into a single latched "begin shutdown" event.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use berth::{Binding, Host, Registry};
//!
//! let registry = Arc::new(Registry::new(Arc::new(berth::AcceptAll)));
//! let svc = Arc::new(MyService::new());
//! registry.bind("svc", Binding::service(svc));
//!
//! let host = Host::new(registry);
//! host.register_stop_signal(async { let _ = tokio::signal::ctrl_c().await; });
//! host.init(&["svc"]).await?;
//! host.start(&["svc"]).await?;       // blocks until a stop signal fires
//! host.shutdown(&["svc"]).await?;
//! ```
//!
//! Module order is always the caller's: the host never infers dependency
//! graphs, never rolls back a partial init, and never cancels a running
//! module on its own; `stop` is the one termination request a module
//! receives, during the shutdown phase.

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod contracts;
pub mod errors;
pub mod lifecycle;
pub mod provider;
pub mod registry;
pub mod shutdown;

pub use contracts::{Initable, Runnable, Stoppable, Validator};
pub use errors::Error;
pub use lifecycle::{Host, Phase};
pub use provider::{AcceptAll, ConfigProvider};
pub use registry::{Binding, Registry};
pub use shutdown::ShutdownGate;
