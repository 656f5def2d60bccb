//! Stderr logging with a runtime level and an optional append-only log file.

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Filter used when neither `--log-level` nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "info";

/// Timestamps in local time with millisecond precision.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(
        &self,
        w: &mut Writer<'_>,
    ) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Shared target of the file layer. Output is dropped while no file is open.
#[derive(Clone, Default)]
struct LogFile(Arc<Mutex<Option<File>>>);

impl LogFile {
    fn replace(
        &self,
        file: Option<File>,
    ) -> Option<File> {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, file)
    }
}

impl Write for LogFile {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Controls for the installed subscriber. Keep it alive for the whole run.
pub struct Logging {
    filter: reload::Handle<EnvFilter, Registry>,
    file: LogFile,
}

impl Logging {
    /// Replaces the active filter with a bare level or any `EnvFilter`
    /// directive list.
    pub fn set_level(
        &self,
        directives: &str,
    ) -> Result<()> {
        let filter = parse_filter(directives)?;
        self.filter
            .reload(filter)
            .with_context(|| format!("cannot apply log level '{directives}'"))
    }

    /// Appends log output to `path` from now on, replacing any open file.
    pub fn log_to_file(
        &self,
        path: &Path,
    ) -> Result<()> {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file '{}'", path.display()))?;
        self.file.replace(Some(file));
        Ok(())
    }

    /// Flushes and closes the log file, if one is open.
    pub fn close_file(&self) {
        if let Some(mut file) = self.file.replace(None) {
            let _ = file.flush();
        }
    }
}

fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).with_context(|| format!("invalid log level '{directives}'"))
}

/// Installs the global subscriber. Call once at startup.
///
/// Events go to stderr, colored only on a terminal, so reports on stdout
/// stay clean when redirected. The level comes from `RUST_LOG`, else `info`.
pub fn init() -> Logging {
    let initial =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (filter_layer, filter) = reload::Layer::new(initial);
    let file = LogFile::default();

    let stderr = tracing_subscriber::fmt::layer()
        .with_timer(LocalTime)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let sink = file.clone();
    let to_file = tracing_subscriber::fmt::layer()
        .with_timer(LocalTime)
        .with_ansi(false)
        .with_writer(move || sink.clone());

    // Fails only when a subscriber is already installed; the handle then
    // still accepts calls.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(stderr)
        .with(to_file)
        .try_init();

    Logging { filter, file }
}
