//! Log routing for a program that gives the terminal to cursive.
//!
//! Records go to stderr until the UI starts, then to a log file only. The
//! filter level can be changed after start-up from the configuration file.

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, reload};

const DEFAULT_FILTER: &str = "info,tds_ui=debug";

type Leveled = Layered<reload::Layer<EnvFilter, Registry>, Registry>;

/// Handles kept after start-up so routing can change while running.
struct Routing {
    level: reload::Handle<EnvFilter, Registry>,
    console: reload::Handle<EnvFilter, Leveled>,
    file: LogFile,
}

static ROUTING: OnceLock<Routing> = OnceLock::new();
static APP_NAME: OnceLock<String> = OnceLock::new();

/// Local wall-clock timestamps with offset.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(
        &self,
        w: &mut Writer<'_>,
    ) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Log file that can be opened after the subscriber is installed. Records
/// written before then are dropped.
#[derive(Clone, Default)]
struct LogFile(Arc<Mutex<Option<File>>>);

impl LogFile {
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self.0.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), File::flush)
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.lock())
    }
}

fn routing() -> Result<&'static Routing> {
    ROUTING
        .get()
        .ok_or_else(|| anyhow!("logging is not initialised"))
}

fn console_filter(enabled: bool) -> EnvFilter {
    EnvFilter::new(if enabled { "trace" } else { "off" })
}

/// Executable name without extension, or `tds-ui` when it cannot be read.
pub fn app_name() -> &'static str {
    APP_NAME.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "tds-ui".to_string())
    })
}

/// Installs the global subscriber: stderr on, file pending. `RUST_LOG`
/// overrides the default filter. A second call does nothing.
pub fn init_default_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (level_layer, level) = reload::Layer::new(filter);
    let (console_gate, console) = reload::Layer::new(console_filter(true));
    let file = LogFile::default();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_timer(LocalTime)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(console_gate);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_timer(LocalTime)
        .with_writer(file.clone())
        .with_ansi(false);

    let installed = tracing_subscriber::registry()
        .with(level_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        let _ = ROUTING.set(Routing {
            level,
            console,
            file,
        });
    }
}

/// Replaces the filter, e.g. `debug` or `warn,tds_ui=trace`.
pub fn set_log_level(directives: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log level '{directives}'"))?;
    routing()?
        .level
        .reload(filter)
        .context("failed to apply log level")
}

/// Turns stderr output on or off. The log file is unaffected.
pub fn set_console_enabled(enabled: bool) -> Result<()> {
    routing()?
        .console
        .reload(console_filter(enabled))
        .context("failed to switch console logging")
}

/// Appends records to `path` from now on, replacing any earlier file.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;
    *routing()?.file.lock() = Some(file);
    Ok(())
}

/// `<app name>.log` in the working directory.
pub fn default_log_file() -> PathBuf {
    PathBuf::from(format!("{}.log", app_name()))
}

/// Hands the terminal to the UI: stderr logging stops and records go to
/// `path` instead. `level` overrides the starting filter when given.
pub fn route_to_file(
    path: &Path,
    level: Option<&str>,
) -> Result<()> {
    enable_file_logging(path)?;
    if let Some(level) = level {
        set_log_level(level)?;
    }
    set_console_enabled(false)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_log_file_uses_app_name() {
        let file = default_log_file();

        assert_eq!(file.extension().and_then(|e| e.to_str()), Some("log"));
        assert_eq!(file.file_stem().and_then(|s| s.to_str()), Some(app_name()));
    }

    #[test]
    fn log_file_drops_records_until_opened() {
        let file = LogFile::default();
        let mut writer = file.make_writer();

        assert_eq!(writer.write(b"dropped").unwrap(), 7);
        assert!(writer.flush().is_ok());
    }

    #[test]
    fn log_file_appends_once_opened() {
        let path = std::env::temp_dir().join(format!("tds-ui-log-{}.log", std::process::id()));
        let file = LogFile::default();
        *file.lock() = Some(File::create(&path).unwrap());

        file.make_writer().write_all(b"calculated TDS\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "calculated TDS\n");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_malformed_level() {
        init_default_logging();

        assert!(set_log_level("tds_ui=loud").is_err());
    }
}
