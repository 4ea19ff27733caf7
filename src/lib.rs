pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod replay;
pub mod report;
pub mod state;
pub mod time;

pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use report::{Reporter, TestReport};
pub use state::GlobalCounter;
