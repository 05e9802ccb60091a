use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use berth::{Error, Initable, Registry, Runnable, Stoppable, Validator};

use crate::config::EchoConfig;
use crate::MODULE_NAME;

/// Line-echo TCP server.
///
/// Config lands during init; `run` owns the accept loop and exits when
/// `stop` cancels the internal token. The bound address is published once
/// the listener is up, so callers binding to port 0 can find it.
pub struct EchoServer {
    cfg: ArcSwapOption<EchoConfig>,
    bound: ArcSwapOption<SocketAddr>,
    cancel: CancellationToken,
}

impl EchoServer {
    pub fn new() -> Self {
        Self {
            cfg: ArcSwapOption::from(None),
            bound: ArcSwapOption::from(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Address the listener actually bound, once `run` has it up.
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.bound.load_full().map(|a| *a)
    }
}

impl Default for EchoServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Initable for EchoServer {
    async fn init(&self, registry: &Registry) -> anyhow::Result<()> {
        let cfg = match registry.config_as::<EchoConfig>(MODULE_NAME) {
            Ok(cfg) => cfg,
            Err(Error::ConfigNotFound(_)) => {
                debug!("no echo config bound, using defaults");
                EchoConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        cfg.validate()?;

        info!(listen = %cfg.listen, "echo module initialized");
        self.cfg.store(Some(Arc::new(cfg)));
        Ok(())
    }
}

#[async_trait]
impl Runnable for EchoServer {
    async fn run(&self) -> anyhow::Result<()> {
        let cfg = self
            .cfg
            .load_full()
            .context("echo server started before init")?;

        let listener = TcpListener::bind(&cfg.listen)
            .await
            .with_context(|| format!("failed to bind {}", cfg.listen))?;
        let local = listener.local_addr()?;
        self.bound.store(Some(Arc::new(local)));
        info!(addr = %local, "echo server listening");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(%peer, "connection accepted");
                            let greeting = cfg.greeting.clone();
                            let max = cfg.max_line_bytes;
                            let cancel = self.cancel.clone();
                            tokio::spawn(async move {
                                if let Err(e) = serve_conn(stream, greeting, max, cancel).await {
                                    debug!(%peer, error = %e, "connection closed with error");
                                }
                            });
                        }
                        Err(e) => warn!(error = %e, "accept failed"),
                    }
                }
            }
        }

        info!("echo server accept loop exited");
        Ok(())
    }
}

#[async_trait]
impl Stoppable for EchoServer {
    async fn stop(&self) -> anyhow::Result<()> {
        self.cancel.cancel();
        Ok(())
    }
}

async fn serve_conn(
    stream: TcpStream,
    greeting: Option<String>,
    max_line_bytes: usize,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();

    if let Some(g) = &greeting {
        writer.write_all(g.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    let mut lines = BufReader::new(reader).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if line.len() > max_line_bytes {
                            anyhow::bail!("line exceeds {max_line_bytes} bytes");
                        }
                        writer.write_all(line.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                    }
                    None => break, // client closed
                }
            }
        }
    }
    Ok(())
}
