// Configuration file handling

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::error::Result;

pub const CONFIG_FILE_NAME: &str = ".testreportrc.toml";
pub const ENV_NO_COLOR: &str = "NO_COLOR";

/// Reporter configuration, resolved once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Attach the reporter at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Tests run concurrently; lines are flattened with ancestry prefixes
    #[serde(default)]
    pub parallel: bool,

    /// Project name shown in suite headers and parallel prefixes
    #[serde(default = "default_display_name")]
    pub display_name: String,

    #[serde(default)]
    pub framework: FrameworkMode,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            parallel: false,
            display_name: default_display_name(),
            framework: FrameworkMode::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameworkMode {
    Default,
    #[default]
    SpringBoot,
}

impl FrameworkMode {
    /// Whether worker DEBUG/INFO chatter is dropped from captured output
    pub fn filters_noise(self) -> bool {
        matches!(self, Self::SpringBoot)
    }
}

impl std::str::FromStr for FrameworkMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "spring-boot" | "spring_boot" | "springboot" => Ok(Self::SpringBoot),
            other => Err(format!("unknown framework mode '{}'", other)),
        }
    }
}

/// How much of a failure's exception the host prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionFormat {
    Full,
    #[default]
    Short,
    None,
}

impl std::str::FromStr for ExceptionFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "short" => Ok(Self::Short),
            "none" => Ok(Self::None),
            other => Err(format!("unknown exception format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub exception_format: ExceptionFormat,

    #[serde(default)]
    pub no_color: bool,

    #[serde(default)]
    pub no_icon: bool,

    #[serde(default)]
    pub no_font_styling: bool,

    /// Tests slower than this get their elapsed time highlighted
    #[serde(default = "default_slow_threshold")]
    pub slow_threshold_millis: u64,

    /// Buffer captured output and replay it only for failed tests
    #[serde(default)]
    pub show_logs_failed_only: bool,

    /// On failure print the exception trace instead of captured output
    #[serde(default)]
    pub show_only_cause_exception: bool,

    /// Replay failure output at error severity so it survives quiet mode
    #[serde(default)]
    pub show_errors_in_quiet_mode: bool,

    #[serde(default)]
    pub level: LevelConfig,

    #[serde(default)]
    pub spring_banner: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            exception_format: ExceptionFormat::default(),
            no_color: false,
            no_icon: false,
            no_font_styling: false,
            slow_threshold_millis: default_slow_threshold(),
            show_logs_failed_only: false,
            show_only_cause_exception: false,
            show_errors_in_quiet_mode: false,
            level: LevelConfig::default(),
            spring_banner: false,
        }
    }
}

impl LoggingConfig {
    /// Disable colors, icons and font styling in one go
    pub fn plain(&mut self) {
        self.no_color = true;
        self.no_icon = true;
        self.no_font_styling = true;
    }
}

/// Log levels forwarded to the test process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_root_level")]
    pub root: String,

    #[serde(default)]
    pub loggers: BTreeMap<String, String>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            root: default_root_level(),
            loggers: BTreeMap::new(),
        }
    }
}

impl LevelConfig {
    /// Register a per-logger level. The first level set for a name wins.
    pub fn logger(&mut self, name: impl Into<String>, level: impl Into<String>) -> bool {
        match self.loggers.entry(name.into()) {
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(level.into());
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }
}

fn default_enabled() -> bool {
    true
}

pub fn default_display_name() -> String {
    String::from("tests")
}

fn default_slow_threshold() -> u64 {
    2000
}

fn default_root_level() -> String {
    String::from("INFO")
}

impl ReportConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Option<Self>> {
        // Check locations in order:
        // 1. .testreportrc.toml (current directory)
        // 2. ~/.testreportrc.toml (home directory)
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(CONFIG_FILE_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_FILE_NAME));
        }

        for path in &paths {
            if path.exists() {
                return Self::load_from_file(path).map(Some);
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate();
        Ok(config)
    }

    /// Generate configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Warn about combinations the reporter tolerates but never acts on
    pub fn validate(&self) -> bool {
        if self.logging.show_only_cause_exception && !self.logging.show_logs_failed_only {
            warn!(
                "show_only_cause_exception has no effect unless show_logs_failed_only is enabled"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
enabled = true
parallel = true
display_name = "billing"
framework = "default"

[logging]
exception_format = "full"
no_color = true
slow_threshold_millis = 500
show_logs_failed_only = true
show_only_cause_exception = true
spring_banner = true

[logging.level]
root = "WARN"
loggers = { "org.hibernate" = "ERROR" }
"#;

        let config = ReportConfig::parse(toml).expect("Failed to parse config");
        assert!(config.parallel);
        assert_eq!(config.display_name, "billing");
        assert_eq!(config.framework, FrameworkMode::Default);
        assert_eq!(config.logging.exception_format, ExceptionFormat::Full);
        assert!(config.logging.no_color);
        assert!(!config.logging.no_icon);
        assert_eq!(config.logging.slow_threshold_millis, 500);
        assert!(config.logging.show_only_cause_exception);
        assert_eq!(config.logging.level.root, "WARN");
        assert_eq!(
            config.logging.level.loggers.get("org.hibernate").map(String::as_str),
            Some("ERROR")
        );
    }

    #[test]
    fn test_parse_rejects_unknown_framework() {
        let result = ReportConfig::parse(r#"framework = "quarkus""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_plain_disables_all_decorations() {
        let mut logging = LoggingConfig::default();
        logging.plain();
        assert!(logging.no_color && logging.no_icon && logging.no_font_styling);
    }

    #[test]
    fn test_logger_level_first_write_wins() {
        let mut level = LevelConfig::default();
        assert!(level.logger("com.acme", "DEBUG"));
        assert!(!level.logger("com.acme", "TRACE"));
        assert_eq!(level.loggers["com.acme"], "DEBUG");
    }

    #[test]
    fn test_validate_flags_cause_only_without_failed_only() {
        let mut config = ReportConfig::default();
        config.logging.show_only_cause_exception = true;
        assert!(!config.validate());
        config.logging.show_logs_failed_only = true;
        assert!(config.validate());
    }

    #[test]
    fn test_to_toml_round_trips_defaults() {
        let config = ReportConfig::default();
        let toml = config.to_toml().expect("serialize");
        assert_eq!(ReportConfig::parse(&toml).expect("parse"), config);
    }

    #[test]
    fn test_framework_from_str() {
        assert_eq!("spring-boot".parse(), Ok(FrameworkMode::SpringBoot));
        assert_eq!("default".parse(), Ok(FrameworkMode::Default));
        assert!("other".parse::<FrameworkMode>().is_err());
    }
}
