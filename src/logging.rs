//! Logging: stderr tracing subscriber plus the in-app console buffer

use std::collections::VecDeque;
use std::fmt;

use tracing_subscriber::EnvFilter;

const CONSOLE_CAPACITY: usize = 500;

/// Install the global fmt subscriber. Falls back to `info` on a bad filter.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleLine {
    pub level: LogLevel,
    pub text: String,
}

/// Bounded, timestamped log shown in the Console tab
#[derive(Debug, Default)]
pub struct ConsoleLog {
    lines: VecDeque<ConsoleLine>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self { lines: VecDeque::with_capacity(CONSOLE_CAPACITY) }
    }

    /// Append a line and mirror it to tracing
    pub fn push(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }

        let timestamp = chrono::Local::now().format("%H:%M:%S");
        self.lines.push_back(ConsoleLine {
            level,
            text: format!("[{}] [{}] {}", timestamp, level, message),
        });
        while self.lines.len() > CONSOLE_CAPACITY {
            self.lines.pop_front();
        }
    }

    pub fn info(&mut self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_is_bounded() {
        let mut log = ConsoleLog::new();
        for i in 0..(CONSOLE_CAPACITY + 25) {
            log.info(&format!("line {}", i));
        }
        assert_eq!(log.len(), CONSOLE_CAPACITY);
        let first = log.lines().next().unwrap();
        assert!(first.text.ends_with("line 25"));
    }

    #[test]
    fn test_console_line_format() {
        let mut log = ConsoleLog::new();
        log.error("Failed to load featured anime.");
        let line = log.lines().next().unwrap();
        assert_eq!(line.level, LogLevel::Error);
        assert!(line.text.contains("[ERROR] Failed to load featured anime."));
        // [HH:MM:SS] prefix
        assert_eq!(line.text.as_bytes()[0], b'[');
        assert_eq!(line.text.as_bytes()[9], b']');
    }

    #[test]
    fn test_clear() {
        let mut log = ConsoleLog::new();
        log.warn("something");
        log.clear();
        assert!(log.is_empty());
    }
}
