// Report module - lifecycle listener, renderer and host sinks

pub mod engine;
pub mod framework;
pub mod output;
pub mod sink;

use crate::error::Result;
use crate::state::{TestDescriptor, TestResult};

pub use engine::{HostLogging, TestReport};
pub use framework::PropertySink;
pub use output::{Color, FormattedOutput, Icon};
pub use sink::{ConsoleSink, LogSink, MemorySink, Severity};

/// Receives test lifecycle events.
///
/// Events for different tests may arrive concurrently from several worker
/// threads, so every callback takes `&self`.
pub trait Reporter: Send + Sync {
    /// Called when a suite (test run, class, nested group) starts
    fn on_suite_start(&self, suite: &TestDescriptor) -> Result<()>;

    /// Called when a test starts
    fn on_test_start(&self, test: &TestDescriptor) -> Result<()>;

    /// Called for every line the test writes to stdout or stderr
    fn on_output(&self, test: &TestDescriptor, message: &str) -> Result<()>;

    /// Called when a test finishes
    fn on_test_end(&self, test: &TestDescriptor, result: &TestResult) -> Result<()>;

    /// Called when a suite finishes
    fn on_suite_end(&self, suite: &TestDescriptor, result: &TestResult) -> Result<()>;
}
