use std::sync::Arc;

use berth::{Binding, Registry};
use berth_bootstrap::{AppConfig, AppConfigProvider};
use echo_server::{EchoConfig, EchoServer};
use heartbeat::{Heartbeat, HeartbeatConfig};

/// Launch order. Shutdown runs the reverse.
pub const START_ORDER: &[&str] = &[echo_server::MODULE_NAME, heartbeat::MODULE_NAME];
pub const STOP_ORDER: &[&str] = &[heartbeat::MODULE_NAME, echo_server::MODULE_NAME];

/// Config provider with the schema checks for every known module.
pub fn config_provider(config: AppConfig) -> AppConfigProvider {
    AppConfigProvider::new(config)
        .with_validated_schema::<EchoConfig>(echo_server::MODULE_NAME)
        .with_schema::<HeartbeatConfig>(heartbeat::MODULE_NAME)
}

/// Bind every module the server ships.
pub fn bind_modules(registry: &Arc<Registry>, config: &AppConfig) -> anyhow::Result<()> {
    registry.bind(
        echo_server::MODULE_NAME,
        Binding::service(Arc::new(EchoServer::new())),
    );

    // Heartbeat takes its config at construction and has no init hook.
    let hb_cfg: HeartbeatConfig = match config.modules.get(heartbeat::MODULE_NAME) {
        Some(raw) => serde_json::from_value(raw.clone())?,
        None => HeartbeatConfig::default(),
    };
    registry.bind(
        heartbeat::MODULE_NAME,
        Binding::runner(Arc::new(Heartbeat::new(hb_cfg))),
    );

    Ok(())
}
