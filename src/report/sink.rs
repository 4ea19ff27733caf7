// Host log sinks - where rendered report lines end up

use std::sync::Mutex;

use console::Term;

use crate::error::{ReportError, Result};

/// Host logger channels, lowest to highest priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Lifecycle,
    Warn,
    Quiet,
    Error,
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "lifecycle" => Ok(Self::Lifecycle),
            "warn" => Ok(Self::Warn),
            "quiet" => Ok(Self::Quiet),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Single-line, severity-leveled writes to the host logger
pub trait LogSink: Send + Sync {
    fn write(&self, severity: Severity, line: &str) -> Result<()>;
}

/// Terminal sink. Lines below the threshold are dropped; errors go to stderr.
#[derive(Debug)]
pub struct ConsoleSink {
    threshold: Severity,
    stdout: Term,
    stderr: Term,
}

impl ConsoleSink {
    pub fn new(threshold: Severity) -> Self {
        Self {
            threshold,
            stdout: Term::stdout(),
            stderr: Term::stderr(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(Severity::Lifecycle)
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, severity: Severity, line: &str) -> Result<()> {
        if severity < self.threshold {
            return Ok(());
        }
        let term = if severity == Severity::Error {
            &self.stderr
        } else {
            &self.stdout
        };
        term.write_line(line).map_err(ReportError::Sink)
    }
}

/// Records every line; used by tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|(_, line)| line.clone()).collect()
    }

    pub fn take(&self) -> Vec<(Severity, String)> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Severity, String)>> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemorySink {
    fn write(&self, severity: Severity, line: &str) -> Result<()> {
        self.lock().push((severity, line.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Lifecycle < Severity::Warn);
        assert!(Severity::Quiet < Severity::Error);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("QUIET".parse(), Ok(Severity::Quiet));
        assert_eq!("lifecycle".parse(), Ok(Severity::Lifecycle));
        assert!("verbose".parse::<Severity>().is_err());
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.write(Severity::Quiet, "one").unwrap();
        sink.write(Severity::Error, "two").unwrap();
        assert_eq!(
            sink.entries(),
            vec![
                (Severity::Quiet, "one".to_string()),
                (Severity::Error, "two".to_string())
            ]
        );
        assert_eq!(sink.take().len(), 2);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_console_sink_drops_below_threshold() {
        let sink = ConsoleSink::new(Severity::Error);
        assert!(sink.write(Severity::Debug, "hidden").is_ok());
    }
}
