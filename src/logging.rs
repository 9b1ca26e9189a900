use anyhow::Context;
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogConfig, LogFormat, DEFAULT_LOG_FILTER};

pub const LOG_FILE_PREFIX: &str = "sneakersecure.log";

static INITIALIZED: OnceCell<()> = OnceCell::new();
// Dropping the guard stops the background writer, so it lives for the process.
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber: stderr in the configured format plus an
/// optional daily-rolling JSON file sink. Later calls are no-ops.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    // Concurrent callers block here until the first install finishes.
    INITIALIZED.get_or_try_init(|| install(config))?;
    Ok(())
}

fn install(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(match config.format {
        LogFormat::Plain => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stderr)
            .boxed(),
    });

    if let Some(dir) = &config.dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("install tracing subscriber")?;

    tracing::debug!(
        target: "sneakersecure",
        event = "logging_initialized",
        filter = %config.filter,
        file_sink = config.dir.is_some()
    );
    Ok(())
}
