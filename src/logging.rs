//! Structured logging for the modem pipeline.
//!
//! Subsystem tags follow the component letters of the system overview:
//! acquisition, timing/carrier tracking, equalization, framing, FEC, preamble,
//! and the transmitter. No external logging crate is pulled in; the pipeline
//! has no allocator-free requirement that would make a hand-rolled collector
//! wrong, and keeping entries in-process lets tests assert on them directly.

use std::fmt;

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub enable_acquisition: bool,
    pub enable_tracking: bool,
    pub enable_framing: bool,
    pub enable_fec: bool,
    /// Maximum number of log entries retained; oldest evicted first.
    pub max_entries: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_acquisition: true,
            enable_tracking: true,
            enable_framing: true,
            enable_fec: true,
            max_entries: 1000,
        }
    }
}

impl LogConfig {
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            max_entries: 5000,
            ..Default::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Warn,
            enable_acquisition: false,
            enable_tracking: false,
            enable_framing: false,
            enable_fec: false,
            max_entries: 100,
        }
    }

    pub fn disabled() -> Self {
        Self {
            level: LogLevel::Error,
            enable_acquisition: false,
            enable_tracking: false,
            enable_framing: false,
            enable_fec: false,
            max_entries: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub subsystem: &'static str,
    pub message: String,
}

/// Collects structured log entries from the pipeline.
#[derive(Debug, Clone)]
pub struct ModemLogger {
    config: LogConfig,
    entries: Vec<LogEntry>,
}

impl ModemLogger {
    pub fn new(config: LogConfig) -> Self {
        let capacity = config.max_entries.min(1000);
        Self {
            config,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn log(&mut self, level: LogLevel, subsystem: &'static str, message: impl fmt::Display) {
        if level < self.config.level {
            return;
        }

        let enabled = match subsystem {
            "ACQ" | "PREAMBLE" => self.config.enable_acquisition,
            "TIMING" | "CARRIER" | "EQ" => self.config.enable_tracking,
            "FRAME" | "TX" => self.config.enable_framing,
            "FEC" => self.config.enable_fec,
            _ => true,
        };
        if !enabled {
            return;
        }

        let entry = LogEntry {
            level,
            subsystem,
            message: message.to_string(),
        };

        if self.config.max_entries > 0 {
            if self.entries.len() >= self.config.max_entries {
                self.entries.remove(0);
            }
            self.entries.push(entry);
        }

        #[cfg(any(test, debug_assertions))]
        {
            eprintln!("[{}] {}: {}", level, subsystem, message);
        }
    }

    pub fn trace(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Trace, subsystem, message);
    }
    pub fn debug(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Debug, subsystem, message);
    }
    pub fn info(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Info, subsystem, message);
    }
    pub fn warn(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Warn, subsystem, message);
    }
    pub fn error(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Error, subsystem, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn entries_for_subsystem(&self, subsystem: &str) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.subsystem == subsystem).collect()
    }

    pub fn entries_at_level(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level >= level).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn level_counts(&self) -> (usize, usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0, 0);
        for entry in &self.entries {
            match entry.level {
                LogLevel::Trace => counts.0 += 1,
                LogLevel::Debug => counts.1 += 1,
                LogLevel::Info => counts.2 += 1,
                LogLevel::Warn => counts.3 += 1,
                LogLevel::Error => counts.4 += 1,
            }
        }
        counts
    }
}

impl Default for ModemLogger {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl fmt::Display for ModemLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {}: {}", e.level, e.subsystem, e.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_level() {
        let mut logger = ModemLogger::new(LogConfig {
            level: LogLevel::Info,
            ..Default::default()
        });
        logger.trace("TEST", "a");
        logger.debug("TEST", "b");
        logger.info("TEST", "c");
        logger.warn("TEST", "d");
        assert_eq!(logger.entries().len(), 2);
    }

    #[test]
    fn filters_by_subsystem_group() {
        let mut logger = ModemLogger::new(LogConfig {
            level: LogLevel::Debug,
            enable_tracking: false,
            ..Default::default()
        });
        logger.info("TIMING", "timing message");
        logger.info("FEC", "fec message");
        assert_eq!(logger.entries().len(), 1);
        assert_eq!(logger.entries()[0].subsystem, "FEC");
    }

    #[test]
    fn evicts_oldest_beyond_max_entries() {
        let mut logger = ModemLogger::new(LogConfig {
            level: LogLevel::Debug,
            max_entries: 3,
            ..Default::default()
        });
        for i in 1..=4 {
            logger.info("TEST", format!("message {i}"));
        }
        assert_eq!(logger.entries().len(), 3);
        assert!(logger.entries()[0].message.contains("message 2"));
    }
}
