use crate::config::{LoggingConfig, Section};
use std::io::IsTerminal;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, Layer};

// Keep a guard for non-blocking console to avoid being dropped.
static CONSOLE_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

// ================= level helpers =================

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" | "" => None,
        _ => Some(Level::INFO),
    }
}

// ================= rotating writer for the file sink =================

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl<'a> fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriterHandle;
    fn make_writer(&'a self) -> Self::Writer {
        RotWriterHandle(self.0.clone())
    }
}

#[derive(Clone)]
struct RotWriterHandle(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

// ================= config extraction =================

struct ConfigData<'a> {
    default_section: Option<&'a Section>,
    subsystems: Vec<(String, &'a Section)>,
}

fn extract_config_data(cfg: &LoggingConfig) -> ConfigData<'_> {
    let subsystems = cfg
        .iter()
        .filter(|(k, _)| k.as_str() != "default")
        .map(|(k, v)| (k.clone(), v))
        .collect::<Vec<_>>();

    ConfigData {
        default_section: cfg.get("default"),
        subsystems,
    }
}

// ================= path helpers =================

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    max_age_days: Option<u32>,
    max_backups: Option<usize>,
) -> Result<RotWriter, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Respect retention policy: prefer MaxFiles if provided, else Age
    let age = chrono::Duration::days(max_age_days.unwrap_or(1) as i64);
    let limit = if let Some(n) = max_backups {
        FileLimit::MaxFiles(n)
    } else {
        FileLimit::Age(age)
    };

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn create_default_file_writer(section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }

    let max_bytes = section.max_size_mb.unwrap_or(100) as usize * 1024 * 1024;
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(
        &log_path,
        max_bytes,
        section.max_age_days,
        section.max_backups,
    ) {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!(
                "Failed to initialize log file '{}' ({e})",
                log_path.to_string_lossy()
            );
            None
        }
    }
}

// ================= generic targets builder =================

/// Different sinks for which we build Targets. Only differences: which
/// level field we read and the default fallback.
enum SinkKind {
    Console,
    File { has_default_file: bool },
}

fn build_targets(config: &ConfigData, kind: SinkKind) -> Targets {
    match kind {
        SinkKind::Console => {
            let default_level = config
                .default_section
                .and_then(|s| parse_tracing_level(s.console_level.as_str()))
                .map(LevelFilter::from_level)
                .unwrap_or(LevelFilter::INFO);

            let mut targets = Targets::new().with_default(default_level);

            for (subsystem, section) in &config.subsystems {
                if let Some(level) =
                    parse_tracing_level(section.console_level.as_str()).map(LevelFilter::from_level)
                {
                    targets = targets.with_target(subsystem.clone(), level);
                }
            }

            targets
        }

        SinkKind::File { has_default_file } => {
            let default_level = config
                .default_section
                .and_then(|s| parse_tracing_level(s.file_level.as_str()))
                .map(LevelFilter::from_level)
                .unwrap_or(if has_default_file {
                    LevelFilter::INFO
                } else {
                    LevelFilter::OFF
                });

            let mut targets = Targets::new().with_default(default_level);

            // Per-subsystem rules apply only when the subsystem opted into
            // file logging with an explicit level.
            for (subsystem, section) in &config.subsystems {
                if section.file_level.trim().is_empty() {
                    continue;
                }
                if let Some(level) =
                    parse_tracing_level(section.file_level.as_str()).map(LevelFilter::from_level)
                {
                    targets = targets.with_target(subsystem.clone(), level);
                }
            }

            targets
        }
    }
}

// ================= public init =================

/// Initialize logging from the `logging:` config sections.
///
/// Console output goes to non-blocking stderr, filtered by per-subsystem
/// `console_level` rules; the `default` section may additionally route
/// records into a rotating JSON file under `base_dir`. `RUST_LOG`, when
/// set, acts as a global upper bound.
pub fn init_logging(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("LogTracer init skipped: {e}");
    }

    let data = extract_config_data(cfg);

    if data.subsystems.is_empty() && data.default_section.is_none() {
        // Minimal fallback (INFO to console; honors RUST_LOG)
        init_minimal();
        return;
    }

    let file_writer = data
        .default_section
        .and_then(|s| create_default_file_writer(s, base_dir));

    let console_targets = build_targets(&data, SinkKind::Console);
    let file_targets = build_targets(
        &data,
        SinkKind::File {
            has_default_file: file_writer.is_some(),
        },
    );

    install_subscriber(console_targets, file_targets, file_writer);
}

fn install_subscriber(console_targets: Targets, file_targets: Targets, file_writer: Option<RotWriter>) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

    // RUST_LOG acts as a global upper-bound if present. If not set, we
    // don't clamp here — YAML targets drive levels.
    let env: Option<EnvFilter> = EnvFilter::try_from_default_env().ok();

    // Console writer (non-blocking stderr)
    let (nb_stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    let _ = CONSOLE_GUARD.set(guard);

    // Console fmt layer (human-friendly)
    let console_layer = fmt::layer()
        .with_writer(nb_stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets);

    // File fmt layer (JSON), when the default section names a file
    let file_layer_opt = file_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(writer)
            .with_filter(file_targets)
    });

    let subscriber = Registry::default()
        .with(env)
        .with(console_layer)
        .with(file_layer_opt);

    let _ = subscriber.try_init();
}

fn init_minimal() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

    // If RUST_LOG is set, it will cap fmt output; otherwise don't clamp here.
    let env = EnvFilter::try_from_default_env().ok();

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let _ = Registry::default().with(env).with(fmt_layer).try_init();
}
