//! `log` backend: every record goes to stdout and is appended to a log file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

use crate::error::Result;

struct TrainLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

/// `[timestamp] LEVEL: message`
fn format_line(timestamp: &str, level: log::Level, msg: &std::fmt::Arguments<'_>) -> String {
    format!("[{timestamp}] {level}: {msg}\n")
}

impl Log for TrainLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let line = format_line(&ts, record.level(), record.args());
        print!("{line}");
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

/// Installs the logger. `path` is opened in append mode. Calling this a
/// second time keeps the first logger.
pub fn init(path: Option<&Path>, level: LevelFilter) -> Result<()> {
    let file = match path {
        Some(p) => Some(Mutex::new(OpenOptions::new().create(true).append(true).open(p)?)),
        None => None,
    };
    if log::set_boxed_logger(Box::new(TrainLogger { level, file })).is_ok() {
        log::set_max_level(level);
    }
    Ok(())
}

/// Numeric metric in a fixed, grep-friendly format.
pub fn scalar(step: u64, name: &str, value: f32) {
    log::info!("SCALAR step={step} name={name} value={value:.6}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        let line = format_line("2026-01-02 03:04:05.678", log::Level::Warn, &format_args!("loss {}", 1.5));
        assert_eq!(line, "[2026-01-02 03:04:05.678] WARN: loss 1.5\n");
    }

    #[test]
    fn level_filter() {
        let logger = TrainLogger { level: LevelFilter::Info, file: None };
        let debug = Metadata::builder().level(log::Level::Debug).build();
        let error = Metadata::builder().level(log::Level::Error).build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&error));
    }
}
