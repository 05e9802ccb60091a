use std::net::SocketAddr;

use berth::Validator;
use serde::{Deserialize, Serialize};

/// Configuration for the echo module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EchoConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Sent to each client right after connecting, if set.
    #[serde(default)]
    pub greeting: Option<String>,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_line_bytes: default_max_line_bytes(),
            greeting: None,
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:7007".to_string()
}

fn default_max_line_bytes() -> usize {
    8192
}

impl Validator for EchoConfig {
    fn validate(&self) -> anyhow::Result<()> {
        self.listen
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("invalid listen address '{}': {e}", self.listen))?;
        if self.max_line_bytes == 0 {
            anyhow::bail!("max_line_bytes must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(EchoConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_listen_address_is_rejected() {
        let cfg = EchoConfig {
            listen: "not-an-address".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_line_limit_is_rejected() {
        let cfg = EchoConfig {
            max_line_bytes: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
