// Test report engine - turns lifecycle events into the progress report

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::config::{ExceptionFormat, ReportConfig};
use crate::error::Result;
use crate::report::framework::{self, PropertySink};
use crate::report::output::{Color, FormattedOutput};
use crate::report::sink::{LogSink, Severity};
use crate::report::Reporter;
use crate::state::{GlobalCounter, LogBuffer, ResultKind, TestDescriptor, TestResult};
use crate::time::format_millis;

const SUITE_INDENT: usize = 4;
const TEST_INDENT: usize = 5;
const OUTPUT_INDENT: usize = 7;
const PARALLEL_OUTPUT_INDENT: usize = 2;
const SUMMARY_INDENT: usize = 3;

/// Settings the host applies to its own test logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostLogging {
    /// Severity at which the host captures test stdout/stderr
    pub capture_output: Severity,
    pub exception_format: ExceptionFormat,
}

/// One reporter per test task. Instances in the same build share a counter.
pub struct TestReport {
    config: Arc<ReportConfig>,
    out: FormattedOutput,
    buffer: LogBuffer,
    counter: Arc<GlobalCounter>,
    owns_finalizer: AtomicBool,
}

impl TestReport {
    pub fn new(
        config: Arc<ReportConfig>,
        sink: Arc<dyn LogSink>,
        counter: Arc<GlobalCounter>,
    ) -> Self {
        let out = FormattedOutput::new(&config.logging, sink);
        Self {
            config,
            out,
            buffer: LogBuffer::new(),
            counter,
            owns_finalizer: AtomicBool::new(false),
        }
    }

    /// Bind to a test task before it runs.
    ///
    /// Injects framework properties and competes for the build finalizer.
    /// The winner opens the build's output with a blank line.
    /// Returns `None` when the reporter is disabled.
    pub fn attach(&self, env: &mut dyn PropertySink) -> Result<Option<HostLogging>> {
        if !self.config.enabled {
            debug!("test report disabled for {}", self.config.display_name);
            return Ok(None);
        }

        framework::apply_settings(&self.config, env);

        let out = self.out.clone();
        let won = self.counter.register_once(Box::new(move |counter: &GlobalCounter| {
            let snapshot = counter.snapshot_and_reset();
            let line = summary_line(
                snapshot.total(),
                snapshot.success,
                snapshot.failure,
                snapshot.skipped,
                snapshot.elapsed_millis,
            );
            out.blank()?;
            out.display(&out.italic(&line, Color::Blue), SUMMARY_INDENT, Severity::Quiet)?;
            out.blank()
        }));
        self.owns_finalizer.store(won, Ordering::Release);
        if won {
            self.out.blank()?;
        }

        Ok(Some(HostLogging {
            capture_output: Severity::Lifecycle,
            exception_format: self.config.logging.exception_format,
        }))
    }

    pub fn owns_finalizer(&self) -> bool {
        self.owns_finalizer.load(Ordering::Acquire)
    }

    /// Lines currently held for `id`
    pub fn buffered(&self, id: &str) -> Vec<String> {
        self.buffer.lines(id)
    }

    fn sequential(&self) -> bool {
        self.config.enabled && !self.config.parallel
    }

    fn result_icon(&self, kind: Option<ResultKind>) -> Option<String> {
        kind.map(|kind| match kind {
            ResultKind::Success => self.out.green(":success:"),
            ResultKind::Failure => self.out.red(":failed:"),
            ResultKind::Skipped => self.out.gray(":sleep:"),
        })
    }

    fn elapsed_text(&self, result: &TestResult) -> String {
        let millis = result.elapsed_millis();
        let text = format!("[{}]", format_millis(millis));
        let slow = u64::try_from(millis)
            .map(|millis| millis > self.config.logging.slow_threshold_millis)
            .unwrap_or(false);
        if slow {
            self.out.italic(&text, Color::Red)
        } else {
            self.out.italic(&text, Color::Gray)
        }
    }

    fn replay_indent(&self) -> usize {
        if self.config.parallel {
            PARALLEL_OUTPUT_INDENT
        } else {
            OUTPUT_INDENT
        }
    }

    fn replay_severity(&self) -> Severity {
        if self.config.logging.show_errors_in_quiet_mode {
            Severity::Error
        } else {
            Severity::Lifecycle
        }
    }

    fn flush_buffer(&self, key: &str) -> Result<()> {
        let indent = self.replay_indent();
        let severity = self.replay_severity();
        for line in self.buffer.lines(key) {
            self.out.display(&line, indent, severity)?;
        }
        Ok(())
    }

    /// Captured output (or the exception) shown after a failed test.
    ///
    /// The parent's buffer and the test's own buffer are both flushed when
    /// cause-only mode is off, even if their contents overlap.
    fn replay_failure_output(&self, test: &TestDescriptor, result: &TestResult) -> Result<()> {
        let logging = &self.config.logging;
        if !result.is_failure() || !logging.show_logs_failed_only {
            return Ok(());
        }

        if let Some(parent) = &test.parent
            && !logging.show_only_cause_exception
        {
            self.flush_buffer(&parent.id)?;
        }

        if logging.show_only_cause_exception
            && let Some(exception) = &result.exception
        {
            let indent = self.replay_indent();
            let severity = self.replay_severity();
            for line in exception.stack_trace_lines() {
                self.out.display(&self.out.red(&line), indent, severity)?;
            }
        }

        if !logging.show_only_cause_exception {
            self.flush_buffer(&test.id)?;
        }
        Ok(())
    }

    fn finished_line(&self, test: &TestDescriptor, result: &TestResult) -> String {
        let mut parts = Vec::with_capacity(6);
        if let Some(icon) = self.result_icon(result.result_type) {
            parts.push(icon);
        }
        if self.config.parallel {
            parts.push(self.out.blue(&format!("{} >", self.config.display_name)));
            parts.push(self.out.yellow(&format!("{} >", test.suite_display_name())));
        }
        parts.push(test.short_name().to_string());
        parts.push(self.elapsed_text(result));
        if self.config.parallel
            && let Some(class_name) = &test.class_name
        {
            parts.push(self.out.italic(&format!("({})", class_name), Color::Gray));
        }
        parts.join(" ")
    }
}

impl Reporter for TestReport {
    fn on_suite_start(&self, suite: &TestDescriptor) -> Result<()> {
        if !self.sequential() {
            return Ok(());
        }

        if suite.is_root() {
            let header = format!(":rocket:  {}", self.out.blue(&self.config.display_name));
            self.out.display(&header, 0, Severity::Quiet)?;
        }

        if let Some(class_name) = &suite.class_name {
            let class = self.out.italic(&format!("({})", class_name), Color::Gray);
            let line = format!("{} {}", self.out.yellow(suite.suite_display_name()), class);
            self.out.display(&line, SUITE_INDENT, Severity::Quiet)?;
        }
        Ok(())
    }

    fn on_test_start(&self, test: &TestDescriptor) -> Result<()> {
        if !self.sequential() {
            return Ok(());
        }
        let line = format!(":sand_watch: {}", test.short_name());
        self.out.display(&line, TEST_INDENT, Severity::Lifecycle)
    }

    fn on_output(&self, test: &TestDescriptor, message: &str) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        if self.config.framework.filters_noise() && framework::is_noise(message) {
            trace!(test = %test.id, "dropped worker log noise");
            return Ok(());
        }

        let text = message.strip_suffix('\n').unwrap_or(message);
        let text = text.strip_suffix('\r').unwrap_or(text);
        let line = self.out.gray(text);
        self.buffer.append(&test.id, line.clone());

        if !self.config.logging.show_logs_failed_only {
            self.out.display(&line, OUTPUT_INDENT, Severity::Lifecycle)?;
        }
        Ok(())
    }

    fn on_test_end(&self, test: &TestDescriptor, result: &TestResult) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        if let Some(kind) = result.result_type {
            self.counter.record_result(kind);
        }

        let indent = if self.config.parallel { 0 } else { TEST_INDENT };
        let written = self
            .out
            .display(&self.finished_line(test, result), indent, Severity::Quiet)
            .and_then(|()| self.replay_failure_output(test, result));
        self.buffer.clear(&test.id);
        written
    }

    fn on_suite_end(&self, suite: &TestDescriptor, result: &TestResult) -> Result<()> {
        if !self.sequential() || !suite.is_root() {
            return Ok(());
        }
        let line = summary_line(
            result.test_count,
            result.success_count,
            result.failure_count,
            result.skipped_count,
            result.elapsed_millis(),
        );
        self.out
            .display(&self.out.italic(&line, Color::Gray), SUMMARY_INDENT, Severity::Quiet)?;
        self.out.blank()
    }
}

fn summary_line(total: u64, success: u64, failed: u64, skipped: u64, elapsed_millis: i64) -> String {
    format!(
        "[{} total, {} succeeded, {} failed, {} skipped, {}]",
        total,
        success,
        failed,
        skipped,
        format_millis(elapsed_millis)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::report::sink::MemorySink;
    use std::collections::BTreeMap;
    use std::io;

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn write(&self, _severity: Severity, _line: &str) -> Result<()> {
            Err(ReportError::Sink(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
        }
    }

    fn plain_report(configure: impl FnOnce(&mut ReportConfig)) -> (TestReport, Arc<MemorySink>) {
        let mut config = ReportConfig::default();
        config.logging.plain();
        configure(&mut config);
        let sink = Arc::new(MemorySink::new());
        let report = TestReport::new(Arc::new(config), sink.clone(), Arc::new(GlobalCounter::new()));
        (report, sink)
    }

    #[test]
    fn test_summary_line_format() {
        assert_eq!(
            summary_line(2, 1, 1, 0, 2050),
            "[2 total, 1 succeeded, 1 failed, 0 skipped, 2s]"
        );
    }

    #[test]
    fn test_test_start_strips_parens() {
        let (report, sink) = plain_report(|_| {});
        report
            .on_test_start(&TestDescriptor::new("t", "charges()"))
            .unwrap();
        assert_eq!(
            sink.entries(),
            vec![(Severity::Lifecycle, "     [RUN] charges".to_string())]
        );
    }

    #[test]
    fn test_unknown_result_kind_counts_nothing() {
        let (report, sink) = plain_report(|_| {});
        let result = TestResult {
            start_time: 0,
            end_time: 10,
            ..TestResult::default()
        };
        report
            .on_test_end(&TestDescriptor::new("t", "odd"), &result)
            .unwrap();
        assert_eq!(sink.lines(), vec!["     odd [10ms]"]);
        assert_eq!(report.counter.success_count(), 0);
        assert_eq!(report.counter.failure_count(), 0);
        assert_eq!(report.counter.skipped_count(), 0);
    }

    #[test]
    fn test_attach_disabled_is_inert() {
        let (report, sink) = plain_report(|c| c.enabled = false);
        let mut env: BTreeMap<String, String> = BTreeMap::new();
        assert!(report.attach(&mut env).unwrap().is_none());
        assert!(env.is_empty());
        report
            .on_suite_start(&TestDescriptor::new("root", "Run"))
            .unwrap();
        report
            .on_test_end(
                &TestDescriptor::new("t", "x"),
                &TestResult::test(ResultKind::Success, 0, 1),
            )
            .unwrap();
        assert!(sink.lines().is_empty());
        assert!(!report.counter.is_registered());
    }

    #[test]
    fn test_attach_reports_host_logging() {
        let (report, _) = plain_report(|c| {
            c.logging.exception_format = ExceptionFormat::Full;
        });
        let mut env: BTreeMap<String, String> = BTreeMap::new();
        let host = report.attach(&mut env).unwrap().expect("enabled");
        assert_eq!(host.capture_output, Severity::Lifecycle);
        assert_eq!(host.exception_format, ExceptionFormat::Full);
        assert!(report.owns_finalizer());
        assert_eq!(env["spring.main.banner-mode"], "off");
    }

    #[test]
    fn test_failed_write_still_clears_buffer() {
        let mut config = ReportConfig::default();
        config.logging.plain();
        config.logging.show_logs_failed_only = true;
        let report = TestReport::new(
            Arc::new(config),
            Arc::new(BrokenSink),
            Arc::new(GlobalCounter::new()),
        );
        let test = TestDescriptor::new("t", "charges()");
        report.on_output(&test, "captured\n").unwrap();

        let result = report.on_test_end(&test, &TestResult::test(ResultKind::Failure, 0, 1));

        assert!(matches!(result, Err(ReportError::Sink(_))));
        assert!(report.buffered("t").is_empty());
        assert_eq!(report.counter.failure_count(), 1);
    }

    #[test]
    fn test_attach_winner_opens_build_with_blank_line() {
        let sink = Arc::new(MemorySink::new());
        let counter = Arc::new(GlobalCounter::new());
        let mut config = ReportConfig::default();
        config.logging.plain();
        config.parallel = true;
        let config = Arc::new(config);
        let first = TestReport::new(config.clone(), sink.clone(), counter.clone());
        let second = TestReport::new(config, sink.clone(), counter);
        let mut env: BTreeMap<String, String> = BTreeMap::new();

        first.attach(&mut env).unwrap();
        second.attach(&mut env).unwrap();
        first
            .on_suite_start(&TestDescriptor::new("root", "Run"))
            .unwrap();

        assert_eq!(sink.entries(), vec![(Severity::Quiet, String::new())]);
    }
}
