//! Periodic liveness tick module.
//!
//! Deliberately carries no init hook: configuration is fixed at
//! construction, so the host's init phase skips it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use berth::{Runnable, Stoppable};

/// Name this module is bound and configured under.
pub const MODULE_NAME: &str = "heartbeat";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatConfig {
    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,
    #[serde(default = "default_message")]
    pub message: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            message: default_message(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_message() -> String {
    "alive".to_string()
}

pub struct Heartbeat {
    cfg: HeartbeatConfig,
    cancel: CancellationToken,
    ticks: AtomicU64,
}

impl Heartbeat {
    pub fn new(cfg: HeartbeatConfig) -> Self {
        Self {
            cfg,
            cancel: CancellationToken::new(),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Runnable for Heartbeat {
    async fn run(&self) -> anyhow::Result<()> {
        let mut timer = tokio::time::interval(self.cfg.interval);
        // interval fires immediately; swallow the zeroth tick
        timer.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = timer.tick() => {
                    let n = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(tick = n, "{}", self.cfg.message);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Stoppable for Heartbeat {
    async fn stop(&self) -> anyhow::Result<()> {
        self.cancel.cancel();
        Ok(())
    }
}
