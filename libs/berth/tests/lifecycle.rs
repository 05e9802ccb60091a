//! End-to-end lifecycle tests: phase ordering, capability checks, and the
//! signal-unblocks-start contract.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use berth::{async_trait, AcceptAll, Binding, Error, Host, Initable, Phase, Registry, Runnable, Stoppable};

type Log = Arc<Mutex<Vec<String>>>;

/// Test module that records every lifecycle call it receives.
struct Probe {
    name: &'static str,
    log: Log,
    fail_init: bool,
    fail_stop: bool,
    done: CancellationToken,
}

impl Probe {
    fn build(name: &'static str, log: &Log, fail_init: bool, fail_stop: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
            fail_init,
            fail_stop,
            done: CancellationToken::new(),
        })
    }

    fn new(name: &'static str, log: &Log) -> Arc<Self> {
        Self::build(name, log, false, false)
    }

    fn failing_init(name: &'static str, log: &Log) -> Arc<Self> {
        Self::build(name, log, true, false)
    }

    fn failing_stop(name: &'static str, log: &Log) -> Arc<Self> {
        Self::build(name, log, false, true)
    }

    fn record(&self, phase: &str) {
        self.log.lock().push(format!("{phase}:{}", self.name));
    }
}

#[async_trait]
impl Initable for Probe {
    async fn init(&self, _registry: &Registry) -> anyhow::Result<()> {
        self.record("init");
        if self.fail_init {
            anyhow::bail!("init of '{}' blew up", self.name);
        }
        Ok(())
    }
}

#[async_trait]
impl Runnable for Probe {
    async fn run(&self) -> anyhow::Result<()> {
        self.record("run");
        self.done.cancelled().await;
        Ok(())
    }
}

#[async_trait]
impl Stoppable for Probe {
    async fn stop(&self) -> anyhow::Result<()> {
        self.record("stop");
        self.done.cancel();
        if self.fail_stop {
            anyhow::bail!("stop of '{}' blew up", self.name);
        }
        Ok(())
    }
}

fn registry() -> Arc<Registry> {
    Arc::new(Registry::new(Arc::new(AcceptAll)))
}

#[tokio::test]
async fn init_skips_modules_without_init_capability() {
    let log: Log = Default::default();
    let reg = registry();
    reg.bind("ticker", Binding::runner(Probe::new("ticker", &log)));
    reg.bind("svc", Binding::service(Probe::new("svc", &log)));

    let host = Host::new(reg);
    host.init(&["ticker", "svc"]).await.unwrap();

    assert_eq!(*log.lock(), vec!["init:svc"]);
    assert_eq!(host.phase(), Phase::Initialized);
}

#[tokio::test]
async fn init_over_unknown_name_fails_not_found() {
    let host = Host::new(registry());
    match host.init(&["ghost"]).await {
        Err(Error::NotFound(name)) => assert_eq!(name, "ghost"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn init_halts_at_first_error() {
    let log: Log = Default::default();
    let reg = registry();
    reg.bind("a", Binding::service(Probe::new("a", &log)));
    reg.bind("b", Binding::service(Probe::failing_init("b", &log)));
    reg.bind("c", Binding::service(Probe::new("c", &log)));

    let host = Host::new(reg);
    let err = host.init(&["a", "b", "c"]).await.unwrap_err();

    match err {
        Error::Init { module, .. } => assert_eq!(module, "b"),
        other => panic!("expected Init, got {other:?}"),
    }
    // "c" was never touched; no rollback of "a" either.
    assert_eq!(*log.lock(), vec!["init:a", "init:b"]);
}

#[tokio::test]
async fn start_rejects_non_runnable_before_launching_anything() {
    let log: Log = Default::default();
    let reg = registry();
    reg.bind("good", Binding::service(Probe::new("good", &log)));
    reg.bind("inert", Binding::new(Arc::new(42u32)));

    let host = Host::new(reg);
    let err = host.start(&["good", "inert"]).await.unwrap_err();

    match err {
        Error::MissingCapability { module, capability } => {
            assert_eq!(module, "inert");
            assert_eq!(capability, "run");
        }
        other => panic!("expected MissingCapability, got {other:?}"),
    }
    // The well-formed module ahead of it in the list was not launched.
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn shutdown_requires_stop_capability() {
    let reg = registry();
    reg.bind("inert", Binding::new(Arc::new(42u32)));

    let host = Host::new(reg);
    match host.shutdown(&["inert"]).await {
        Err(Error::MissingCapability { module, capability }) => {
            assert_eq!(module, "inert");
            assert_eq!(capability, "stop");
        }
        other => panic!("expected MissingCapability, got {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_continues_past_a_failing_stop() {
    let log: Log = Default::default();
    let reg = registry();
    reg.bind("a", Binding::service(Probe::failing_stop("a", &log)));
    reg.bind("b", Binding::service(Probe::new("b", &log)));

    let host = Host::new(reg);
    host.shutdown(&["a", "b"]).await.unwrap();

    // b's stop still ran, in order, despite a's error.
    assert_eq!(*log.lock(), vec!["stop:a", "stop:b"]);
    assert_eq!(host.phase(), Phase::Stopped);
}

#[tokio::test]
async fn external_signal_unblocks_start_then_shutdown_stops_once() {
    let log: Log = Default::default();
    let reg = registry();
    reg.bind("svc", Binding::service(Probe::new("svc", &log)));

    let host = Arc::new(Host::new(reg));
    let (tx, rx) = oneshot::channel::<()>();
    host.register_stop_signal(async move {
        let _ = rx.await;
    });

    host.init(&["svc"]).await.unwrap();

    let started = host.clone();
    let start_task = tokio::spawn(async move { started.start(&["svc"]).await });

    // Let the module launch; start must still be blocked.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!start_task.is_finished());
    assert_eq!(host.phase(), Phase::Running);
    assert!(log.lock().contains(&"run:svc".to_string()));

    tx.send(()).unwrap();
    start_task.await.unwrap().unwrap();

    host.shutdown(&["svc"]).await.unwrap();

    let entries = log.lock().clone();
    assert_eq!(
        entries.iter().filter(|e| *e == "stop:svc").count(),
        1,
        "stop must run exactly once, got {entries:?}"
    );
    assert_eq!(host.phase(), Phase::Stopped);
}

#[tokio::test]
async fn explicit_shutdown_unblocks_a_pending_start() {
    let log: Log = Default::default();
    let reg = registry();
    reg.bind("svc", Binding::service(Probe::new("svc", &log)));

    let host = Arc::new(Host::new(reg));
    host.init(&["svc"]).await.unwrap();

    let started = host.clone();
    let start_task = tokio::spawn(async move { started.start(&["svc"]).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!start_task.is_finished());

    host.shutdown(&["svc"]).await.unwrap();
    start_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn launch_follows_list_order() {
    let log: Log = Default::default();
    let reg = registry();
    reg.bind("first", Binding::service(Probe::new("first", &log)));
    reg.bind("second", Binding::service(Probe::new("second", &log)));

    let host = Arc::new(Host::new(reg));
    let started = host.clone();
    let start_task = tokio::spawn(async move { started.start(&["first", "second"]).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    {
        let entries = log.lock();
        let first = entries.iter().position(|e| e == "run:first").unwrap();
        let second = entries.iter().position(|e| e == "run:second").unwrap();
        assert!(first < second, "launch order not preserved: {entries:?}");
    }

    host.shutdown(&["second", "first"]).await.unwrap();
    start_task.await.unwrap().unwrap();
}
