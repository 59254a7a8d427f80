//! Per-run logger with file and callback output.
//!
//! Each run gets a dedicated log file. Lines are also handed to an optional
//! callback, and recent model stderr is kept in a tail buffer so a failed
//! call can be diagnosed from the log alone.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

pub struct RunLogger {
    run_name: String,
    log_path: PathBuf,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Mutex<Option<LogCallback>>,
    config: LogConfig,
    tail_buffer: Mutex<VecDeque<String>>,
}

impl RunLogger {
    /// Create `<log_dir>/<run_name>.log`, truncating an existing file.
    pub fn new(
        run_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let run_name = run_name.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&run_name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            run_name,
            log_path,
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            callback: Mutex::new(callback),
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
        })
    }

    /// Run name based on the local time, e.g. `run_20260101_120000`.
    pub fn timestamped_name() -> String {
        Local::now().format("run_%Y%m%d_%H%M%S").to_string()
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        self.output(&self.format_message(message));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn section(&self, section_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(section_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Remember model stderr lines without writing them out.
    pub fn model_stderr(&self, stderr: &str) {
        let limit = self.config.error_tail;
        if limit == 0 {
            return;
        }

        let mut buffer = self.tail_buffer.lock();
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            if buffer.len() >= limit {
                buffer.pop_front();
            }
            buffer.push_back(line.to_string());
        }
    }

    /// Write the tail buffer out (after a failure) and clear it.
    pub fn show_tail(&self, header: &str) {
        let lines: Vec<String> = self.tail_buffer.lock().drain(..).collect();
        if lines.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in &lines {
            self.output(&self.format_message(line));
        }
    }

    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn quiet_config() -> LogConfig {
        LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        }
    }

    #[test]
    fn writes_file_and_callback() {
        let dir = tempdir().unwrap();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let logger = RunLogger::new(
            "run",
            dir.path(),
            quiet_config(),
            Some(Box::new(move |line: &str| sink.lock().push(line.to_string()))),
        )
        .unwrap();

        logger.phase("Describe");
        logger.debug("hidden at info level");
        logger.warn("careful");
        logger.close();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert_eq!(content, "=== Describe ===\n[WARNING] careful\n");
        assert_eq!(*seen.lock(), vec!["=== Describe ===", "[WARNING] careful"]);
    }

    #[test]
    fn tail_keeps_latest_stderr_lines() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            error_tail: 3,
            ..quiet_config()
        };
        let logger = RunLogger::new("run", dir.path(), config, None).unwrap();

        logger.model_stderr("a\n\nb\nc\nd\n");
        assert_eq!(logger.get_tail(), vec!["b", "c", "d"]);

        logger.show_tail("model");
        assert!(logger.get_tail().is_empty());
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert_eq!(content, "[model/tail]\nb\nc\nd\n");
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }

    #[test]
    fn timestamped_names_are_prefixed() {
        assert!(RunLogger::timestamped_name().starts_with("run_"));
    }
}
