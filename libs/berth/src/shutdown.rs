use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

type StopSignal = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct Sources {
    pending: Vec<StopSignal>,
    armed: bool,
}

/// Fan-in of externally owned one-shot stop signals.
///
/// Any number of sources can be registered before the host starts; once
/// armed, the first source to complete cancels the internal latch. The
/// latch transitions exactly once and is never reset; sources completing
/// later are observed but have no further effect, and an explicit
/// [`fire`](ShutdownGate::fire) after the fact is a no-op.
pub struct ShutdownGate {
    latch: CancellationToken,
    sources: Mutex<Sources>,
}

impl ShutdownGate {
    pub fn new() -> Self {
        Self {
            latch: CancellationToken::new(),
            sources: Mutex::new(Sources {
                pending: Vec::new(),
                armed: false,
            }),
        }
    }

    /// Add a stop-signal source. Must happen before the host starts;
    /// sources handed in after arming are dropped with a warning rather
    /// than silently never firing.
    pub fn register(&self, signal: impl Future<Output = ()> + Send + 'static) {
        let mut sources = self.sources.lock();
        if sources.armed {
            tracing::warn!("stop signal registered after start; dropped");
            return;
        }
        sources.pending.push(Box::pin(signal));
    }

    /// Begin watching every registered source. Each gets its own task;
    /// whichever completes first cancels the latch.
    pub(crate) fn arm(&self) {
        let pending = {
            let mut sources = self.sources.lock();
            sources.armed = true;
            std::mem::take(&mut sources.pending)
        };

        for signal in pending {
            let latch = self.latch.clone();
            tokio::spawn(async move {
                signal.await;
                tracing::info!("external stop signal fired");
                latch.cancel();
            });
        }
    }

    /// Deliver the shutdown-intent event directly. Idempotent.
    pub fn fire(&self) {
        self.latch.cancel();
    }

    /// Suspend until the shutdown-intent event has been delivered.
    pub async fn wait(&self) {
        self.latch.cancelled().await;
    }

    pub fn fired(&self) -> bool {
        self.latch.is_cancelled()
    }

    /// Clone of the latch token, for callers that want to observe
    /// shutdown intent from their own tasks.
    pub fn token(&self) -> CancellationToken {
        self.latch.clone()
    }
}

impl Default for ShutdownGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShutdownGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sources = self.sources.lock();
        f.debug_struct("ShutdownGate")
            .field("pending_sources", &sources.pending.len())
            .field("armed", &sources.armed)
            .field("fired", &self.fired())
            .finish()
    }
}
