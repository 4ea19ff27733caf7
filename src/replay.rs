// Replay of recorded lifecycle events (newline-delimited JSON)
//
// Plays the part of the test executor: resolves parent references, tallies
// suite counters and prints failure exceptions the way the host would.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ExceptionFormat;
use crate::error::{ReportError, Result};
use crate::report::{HostLogging, LogSink, Reporter, Severity};
use crate::state::{ResultKind, TestDescriptor, TestFailure, TestResult};

const EXCEPTION_INDENT: &str = "        ";

/// One line of an event recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    SuiteStarted {
        descriptor: DescriptorRecord,
    },
    TestStarted {
        descriptor: DescriptorRecord,
    },
    Output {
        descriptor: DescriptorRecord,
        message: String,
    },
    TestFinished {
        descriptor: DescriptorRecord,
        result: ResultRecord,
    },
    SuiteFinished {
        descriptor: DescriptorRecord,
        result: ResultRecord,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorRecord {
    pub id: String,
    #[serde(alias = "display_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_display_name: Option<String>,
    /// Id of the enclosing suite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultRecord {
    /// `success`, `failure` or `skipped`; anything else is an unknown kind
    #[serde(default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<TestFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped_count: Option<u64>,
}

impl ResultRecord {
    pub fn kind(&self) -> Option<ResultKind> {
        match self.result_type.as_deref()?.to_ascii_lowercase().as_str() {
            "success" => Some(ResultKind::Success),
            "failure" => Some(ResultKind::Failure),
            "skipped" => Some(ResultKind::Skipped),
            _ => None,
        }
    }

    fn has_counts(&self) -> bool {
        self.success_count.is_some() || self.failure_count.is_some() || self.skipped_count.is_some()
    }
}

/// Decode one recorded event
pub fn parse_event(line: &str, line_number: usize) -> Result<LifecycleEvent> {
    serde_json::from_str(line).map_err(|source| ReportError::Event {
        line: line_number,
        source,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    success: u64,
    failure: u64,
    skipped: u64,
}

impl Tally {
    fn record(&mut self, kind: ResultKind) {
        match kind {
            ResultKind::Success => self.success += 1,
            ResultKind::Failure => self.failure += 1,
            ResultKind::Skipped => self.skipped += 1,
        }
    }
}

/// What a replay saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: usize,
    pub tests: usize,
    pub failures: usize,
}

/// Prints failure exceptions after the reporter's line, as the host does
pub struct ExceptionPrinter {
    sink: Arc<dyn LogSink>,
    format: ExceptionFormat,
}

impl ExceptionPrinter {
    /// `None` when the reporter already prints the cause itself
    pub fn for_host(
        host: HostLogging,
        engine_prints_cause: bool,
        sink: Arc<dyn LogSink>,
    ) -> Option<Self> {
        if engine_prints_cause || host.exception_format == ExceptionFormat::None {
            return None;
        }
        Some(Self {
            sink,
            format: host.exception_format,
        })
    }

    fn print(&self, failure: &TestFailure) -> Result<()> {
        for line in failure.format_lines(self.format) {
            self.sink
                .write(Severity::Lifecycle, &format!("{}{}", EXCEPTION_INDENT, line))?;
        }
        Ok(())
    }
}

/// Feeds recorded events to a reporter
pub struct EventReplayer<'a> {
    reporter: &'a dyn Reporter,
    descriptors: HashMap<String, Arc<TestDescriptor>>,
    tallies: HashMap<String, Tally>,
    exceptions: Option<ExceptionPrinter>,
    stats: ReplayStats,
}

impl<'a> EventReplayer<'a> {
    pub fn new(reporter: &'a dyn Reporter) -> Self {
        Self {
            reporter,
            descriptors: HashMap::new(),
            tallies: HashMap::new(),
            exceptions: None,
            stats: ReplayStats::default(),
        }
    }

    pub fn with_exception_printer(mut self, printer: Option<ExceptionPrinter>) -> Self {
        self.exceptions = printer;
        self
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Replay every event in `reader`; blank lines are skipped
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<ReplayStats> {
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = parse_event(&line, index + 1)?;
            self.dispatch(event)?;
        }
        debug!(
            events = self.stats.events,
            tests = self.stats.tests,
            "replay finished"
        );
        Ok(self.stats)
    }

    pub fn dispatch(&mut self, event: LifecycleEvent) -> Result<()> {
        self.stats.events += 1;
        match event {
            LifecycleEvent::SuiteStarted { descriptor } => {
                let suite = self.resolve(descriptor);
                self.reporter.on_suite_start(&suite)
            }
            LifecycleEvent::TestStarted { descriptor } => {
                let test = self.resolve(descriptor);
                self.reporter.on_test_start(&test)
            }
            LifecycleEvent::Output {
                descriptor,
                message,
            } => {
                let test = self.lookup(descriptor);
                self.reporter.on_output(&test, &message)
            }
            LifecycleEvent::TestFinished { descriptor, result } => {
                let test = self.lookup(descriptor);
                let result = self.test_result(&test, result);
                self.stats.tests += 1;
                if result.is_failure() {
                    self.stats.failures += 1;
                }
                self.reporter.on_test_end(&test, &result)?;
                if result.is_failure()
                    && let (Some(printer), Some(exception)) = (&self.exceptions, &result.exception)
                {
                    printer.print(exception)?;
                }
                Ok(())
            }
            LifecycleEvent::SuiteFinished { descriptor, result } => {
                let suite = self.lookup(descriptor);
                let result = self.suite_result(&suite, result);
                self.reporter.on_suite_end(&suite, &result)
            }
        }
    }

    /// Register a node, replacing any earlier node with the same id
    fn resolve(&mut self, record: DescriptorRecord) -> Arc<TestDescriptor> {
        let parent = record.parent.as_ref().and_then(|parent_id| {
            let parent = self.descriptors.get(parent_id).cloned();
            if parent.is_none() {
                warn!(
                    "unknown parent '{}' for '{}', treating as top-level",
                    parent_id, record.id
                );
            }
            parent
        });

        let descriptor = Arc::new(TestDescriptor {
            id: record.id,
            display_name: record.name,
            class_name: record.class_name,
            class_display_name: record.class_display_name,
            parent,
        });
        self.descriptors
            .insert(descriptor.id.clone(), descriptor.clone());
        descriptor
    }

    /// Nodes seen before keep their identity; new ones are registered
    fn lookup(&mut self, record: DescriptorRecord) -> Arc<TestDescriptor> {
        if let Some(descriptor) = self.descriptors.get(&record.id).cloned() {
            return descriptor;
        }
        self.resolve(record)
    }

    fn test_result(&mut self, test: &TestDescriptor, record: ResultRecord) -> TestResult {
        let kind = record.kind();
        if let Some(kind) = kind {
            let mut ancestor = test.parent.as_deref();
            while let Some(suite) = ancestor {
                self.tallies.entry(suite.id.clone()).or_default().record(kind);
                ancestor = suite.parent.as_deref();
            }
        }

        let mut result = match kind {
            Some(kind) => TestResult::test(kind, record.start_time, record.end_time),
            None => TestResult {
                start_time: record.start_time,
                end_time: record.end_time,
                ..TestResult::default()
            },
        };
        result.exception = record.exception;
        result
    }

    fn suite_result(&mut self, suite: &TestDescriptor, record: ResultRecord) -> TestResult {
        let tally = self.tallies.remove(&suite.id).unwrap_or_default();
        let (success, failure, skipped) = if record.has_counts() {
            (
                record.success_count.unwrap_or(0),
                record.failure_count.unwrap_or(0),
                record.skipped_count.unwrap_or(0),
            )
        } else {
            (tally.success, tally.failure, tally.skipped)
        };

        let mut result =
            TestResult::suite(record.start_time, record.end_time, success, failure, skipped);
        if let Some(kind) = record.kind() {
            result.result_type = Some(kind);
        }
        result.exception = record.exception;
        result
    }
}
