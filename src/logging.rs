//! Level-filtered, rotating file logger with an on-screen mirror (C7).
//!
//! spec.md names the logging subsystem an external collaborator and only
//! asks for its interface: a level filter the rest of the core can read
//! and the admin surface can change at runtime (§4.5's `g_log_level`), and
//! a rotating sink. This is that collaborator's concrete, idiomatic
//! implementation: a [`log::Log`] impl installed once at startup, in the
//! same spirit as the teacher's `KernelLogger` (a single global holding an
//! ordered level enum that gates a `println!`-alike macro) but backed by a
//! real file instead of a VGA/serial console, and mutable at runtime
//! instead of compiled in.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Default rotation threshold, mirroring `LOG_MAX_SIZE` in
/// `examples/original_source/src/log/log.h`.
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

fn level_filter_to_u8(level: LevelFilter) -> u8 {
    match level {
        LevelFilter::Off => 0,
        LevelFilter::Error => 1,
        LevelFilter::Warn => 2,
        LevelFilter::Info => 3,
        LevelFilter::Debug => 4,
        LevelFilter::Trace => 5,
    }
}

fn u8_to_level_filter(value: u8) -> LevelFilter {
    match value {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Parses the config/CLI spelling of a log level (`"debug"`, `"info"`, ...)
/// the way `examples/original_source/src/cli/cli_mgr.c`'s `log_level`
/// command does, case-insensitively.
pub fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    file: File,
    written: u64,
}

impl RotatingFile {
    fn open(path: PathBuf, max_bytes: u64) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            file,
            written,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        let rotated = self.path.with_extension("log.1");
        let _ = std::fs::remove_file(&rotated);
        std::fs::rename(&self.path, &rotated)?;
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.written + line.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.written += line.len() as u64 + 1;
        Ok(())
    }
}

/// The installed [`log::Log`] implementation.
pub struct GatewayLogger {
    level: AtomicU8,
    file: Mutex<RotatingFile>,
    mirror_to_screen: bool,
}

impl GatewayLogger {
    fn new(path: PathBuf, max_bytes: u64, level: LevelFilter, mirror_to_screen: bool) -> io::Result<Self> {
        Ok(Self {
            level: AtomicU8::new(level_filter_to_u8(level)),
            file: Mutex::new(RotatingFile::open(path, max_bytes)?),
            mirror_to_screen,
        })
    }

    fn current_level(&self) -> LevelFilter {
        u8_to_level_filter(self.level.load(Ordering::Relaxed))
    }

    fn set_level(&self, level: LevelFilter) {
        self.level.store(level_filter_to_u8(level), Ordering::Relaxed);
    }
}

impl Log for GatewayLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.current_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = time::OffsetDateTime::now_utc();
        let line = format!(
            "{timestamp} [{level}] {target}: {args}",
            level = level_label(record.level()),
            target = record.target(),
            args = record.args(),
        );

        if self.mirror_to_screen {
            eprintln!("{line}");
        }

        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_line(&line);
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.file.flush();
        }
    }
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

static LOGGER: OnceLock<&'static GatewayLogger> = OnceLock::new();

/// Installs the global logger. Must be called at most once, at process
/// startup, before any other thread is spawned.
pub fn init(path: impl AsRef<Path>, level: LevelFilter, mirror_to_screen: bool) -> Result<(), String> {
    let logger = GatewayLogger::new(path.as_ref().to_path_buf(), DEFAULT_MAX_BYTES, level, mirror_to_screen)
        .map_err(|e| format!("failed to open log file {}: {e}", path.as_ref().display()))?;
    let leaked: &'static GatewayLogger = Box::leak(Box::new(logger));

    log::set_logger(leaked)
        .map(|()| log::set_max_level(level))
        .map_err(|e| e.to_string())?;

    LOGGER
        .set(leaked)
        .map_err(|_| "logger already initialized".to_string())?;
    Ok(())
}

/// Changes the running filter level, as the admin surface's `log_level`
/// command does (§4.5).
pub fn set_level(level: LevelFilter) {
    if let Some(logger) = LOGGER.get() {
        logger.set_level(level);
        log::set_max_level(level);
    }
}

/// Reads the currently active filter level.
pub fn current_level() -> LevelFilter {
    LOGGER
        .get()
        .map(|logger| logger.current_level())
        .unwrap_or(LevelFilter::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_level_names_case_insensitively() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::Debug));
        assert_eq!(parse_level("Warn"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("fatal"), None);
    }

    #[test]
    fn rotating_file_rotates_past_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gw.log");
        let mut file = RotatingFile::open(path.clone(), 16).unwrap();
        file.write_line("0123456789").unwrap();
        file.write_line("0123456789").unwrap();
        assert!(path.with_extension("log.1").exists());
    }
}
