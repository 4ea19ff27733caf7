// Test result structures

use serde::{Deserialize, Serialize};

use crate::config::ExceptionFormat;

/// Outcome of a finished test or suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Success,
    Failure,
    Skipped,
}

/// Exception attached to a failed test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    pub class_name: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Stack frames, innermost first
    #[serde(default)]
    pub stack_trace: Vec<String>,
    #[serde(default)]
    pub cause: Option<Box<TestFailure>>,
}

impl TestFailure {
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: Some(message.into()),
            stack_trace: Vec::new(),
            cause: None,
        }
    }

    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stack_trace = frames.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cause(mut self, cause: TestFailure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    fn header(&self) -> String {
        match &self.message {
            Some(message) => format!("{}: {}", self.class_name, message),
            None => self.class_name.clone(),
        }
    }

    /// Full trace, one entry per printed line, causes included
    pub fn stack_trace_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = Some(self);
        let mut first = true;
        while let Some(failure) = current {
            if first {
                lines.push(failure.header());
                first = false;
            } else {
                lines.push(format!("Caused by: {}", failure.header()));
            }
            lines.extend(failure.stack_trace.iter().map(|frame| format!("\tat {}", frame)));
            current = failure.cause.as_deref();
        }
        lines
    }

    /// Lines the host prints for this failure under the given format
    pub fn format_lines(&self, format: ExceptionFormat) -> Vec<String> {
        match format {
            ExceptionFormat::Full => self.stack_trace_lines(),
            ExceptionFormat::Short => {
                let mut lines = vec![self.header()];
                let mut cause = self.cause.as_deref();
                while let Some(failure) = cause {
                    lines.push(format!("Caused by: {}", failure.header()));
                    cause = failure.cause.as_deref();
                }
                lines
            }
            ExceptionFormat::None => Vec::new(),
        }
    }
}

/// Result of a finished test or suite
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestResult {
    /// `None` when the executor reports a kind this reporter does not know
    pub result_type: Option<ResultKind>,
    pub start_time: i64,
    pub end_time: i64,
    pub exception: Option<TestFailure>,
    pub test_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub skipped_count: u64,
}

impl TestResult {
    /// Result of a single test
    pub fn test(kind: ResultKind, start_time: i64, end_time: i64) -> Self {
        let mut result = Self {
            result_type: Some(kind),
            start_time,
            end_time,
            test_count: 1,
            ..Self::default()
        };
        match kind {
            ResultKind::Success => result.success_count = 1,
            ResultKind::Failure => result.failure_count = 1,
            ResultKind::Skipped => result.skipped_count = 1,
        }
        result
    }

    /// Result of a suite with its aggregated counters
    pub fn suite(start_time: i64, end_time: i64, success: u64, failure: u64, skipped: u64) -> Self {
        let kind = if failure > 0 {
            ResultKind::Failure
        } else {
            ResultKind::Success
        };
        Self {
            result_type: Some(kind),
            start_time,
            end_time,
            exception: None,
            test_count: success + failure + skipped,
            success_count: success,
            failure_count: failure,
            skipped_count: skipped,
        }
    }

    pub fn with_exception(mut self, exception: TestFailure) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn elapsed_millis(&self) -> i64 {
        self.end_time - self.start_time
    }

    pub fn is_failure(&self) -> bool {
        self.result_type == Some(ResultKind::Failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_failure() -> TestFailure {
        TestFailure::new("java.lang.AssertionError", "expected 2 but was 3")
            .with_frames(["com.acme.BillingTest.charges(BillingTest.java:42)"])
            .with_cause(
                TestFailure::new("java.io.IOException", "socket closed")
                    .with_frames(["com.acme.Gateway.call(Gateway.java:7)"]),
            )
    }

    #[test]
    fn test_single_test_counts() {
        let result = TestResult::test(ResultKind::Skipped, 10, 15);
        assert_eq!(result.test_count, 1);
        assert_eq!(result.skipped_count, 1);
        assert_eq!(result.elapsed_millis(), 5);
        assert!(!result.is_failure());
    }

    #[test]
    fn test_suite_kind_follows_failures() {
        let result = TestResult::suite(0, 2050, 1, 1, 0);
        assert_eq!(result.test_count, 2);
        assert!(result.is_failure());
    }

    #[test]
    fn test_stack_trace_lines_include_causes() {
        let lines = nested_failure().stack_trace_lines();
        assert_eq!(
            lines,
            vec![
                "java.lang.AssertionError: expected 2 but was 3",
                "\tat com.acme.BillingTest.charges(BillingTest.java:42)",
                "Caused by: java.io.IOException: socket closed",
                "\tat com.acme.Gateway.call(Gateway.java:7)",
            ]
        );
    }

    #[test]
    fn test_short_format_keeps_headers_only() {
        let lines = nested_failure().format_lines(ExceptionFormat::Short);
        assert_eq!(
            lines,
            vec![
                "java.lang.AssertionError: expected 2 but was 3",
                "Caused by: java.io.IOException: socket closed",
            ]
        );
        assert!(nested_failure().format_lines(ExceptionFormat::None).is_empty());
    }
}
