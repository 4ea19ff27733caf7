// CLI argument definitions using Clap

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ExceptionFormat, FrameworkMode, ReportConfig};
use crate::report::Severity;

/// Render recorded test lifecycle events as a hierarchical progress report
#[derive(Parser, Debug, Clone)]
#[command(name = "test-report")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Render test lifecycle events as a progress report", long_about = None)]
pub struct Cli {
    /// Event recordings (NDJSON), one per test task. "-" or nothing reads stdin
    #[arg(value_name = "EVENT_FILES")]
    pub event_files: Vec<PathBuf>,

    /// Tests ran concurrently: flatten lines with project/suite prefixes
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Project name shown in headers and prefixes
    #[arg(long, value_name = "NAME")]
    pub display_name: Option<String>,

    /// Framework mode (default, spring-boot)
    #[arg(long, value_name = "MODE")]
    pub framework: Option<FrameworkMode>,

    /// Disable colored output
    #[arg(short = 'c', long, default_value_t = false)]
    pub no_color: bool,

    /// Replace icons with plain-text tags
    #[arg(long, default_value_t = false)]
    pub no_icon: bool,

    /// Disable bold and italic text
    #[arg(long, default_value_t = false)]
    pub no_font_styling: bool,

    /// No colors, icons or font styling
    #[arg(long, default_value_t = false)]
    pub plain: bool,

    /// Only show captured output of failed tests
    #[arg(long, default_value_t = false)]
    pub failed_only: bool,

    /// On failure show only the exception trace (implies nothing without --failed-only)
    #[arg(long, default_value_t = false)]
    pub cause_only: bool,

    /// Replay failure output at error level so it shows in quiet mode
    #[arg(long, default_value_t = false)]
    pub errors_quiet: bool,

    /// Highlight tests slower than this many milliseconds
    #[arg(long, value_name = "MILLIS")]
    pub slow_threshold: Option<u64>,

    /// Exception detail printed for failures (full, short, none)
    #[arg(long, value_name = "FORMAT")]
    pub exception_format: Option<ExceptionFormat>,

    /// Lowest report level written to the terminal (debug, info, lifecycle, warn, quiet, error)
    #[arg(long, default_value = "lifecycle")]
    pub log_level: Severity,

    /// Enable verbose diagnostics on stderr
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Show the resolved configuration and exit
    #[arg(long, default_value_t = false)]
    pub show_config: bool,

    /// Write the resolved configuration to a file and exit
    #[arg(long, value_name = "CONFIG_FILE")]
    pub init_config: Option<PathBuf>,

    /// Print properties injected into the test environment
    #[arg(long, default_value_t = false)]
    pub print_env: bool,

    /// Print shell completion (bash, zsh, fish, elvish, powershell)
    #[arg(long, value_name = "SHELL_TYPE", value_parser = ["bash", "zsh", "fish", "elvish", "powershell"])]
    pub completion: Option<String>,
}

impl Cli {
    /// Layer command-line flags over a loaded configuration
    pub fn apply_to(&self, config: &mut ReportConfig) {
        if self.parallel {
            config.parallel = true;
        }
        if let Some(name) = &self.display_name {
            config.display_name = name.clone();
        }
        if let Some(framework) = self.framework {
            config.framework = framework;
        }

        let logging = &mut config.logging;
        if self.plain {
            logging.plain();
        }
        logging.no_color |= self.no_color;
        logging.no_icon |= self.no_icon;
        logging.no_font_styling |= self.no_font_styling;
        logging.show_logs_failed_only |= self.failed_only;
        logging.show_only_cause_exception |= self.cause_only;
        logging.show_errors_in_quiet_mode |= self.errors_quiet;
        if let Some(threshold) = self.slow_threshold {
            logging.slow_threshold_millis = threshold;
        }
        if let Some(format) = self.exception_format {
            logging.exception_format = format;
        }
    }
}
