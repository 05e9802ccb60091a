//! Line-echo TCP server module.
//!
//! A full-lifecycle module: `init` loads its typed config out of the
//! registry, `run` serves the listener until stopped, `stop` requests the
//! accept loop to exit.

pub mod config;
pub mod module;

pub use config::EchoConfig;
pub use module::EchoServer;

/// Name this module is bound and configured under.
pub const MODULE_NAME: &str = "echo";
