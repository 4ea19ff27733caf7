// State module - test identities, results and shared counters

pub mod buffer;
pub mod counter;
pub mod descriptor;
pub mod result;

pub use buffer::LogBuffer;
pub use counter::{CounterSnapshot, Finalizer, GlobalCounter};
pub use descriptor::TestDescriptor;
pub use result::{ResultKind, TestFailure, TestResult};
