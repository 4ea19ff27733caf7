use test_report::config::{ExceptionFormat, FrameworkMode, ReportConfig};

#[test]
fn test_default_config_values() {
    let config = ReportConfig::default();

    assert!(config.enabled);
    assert!(!config.parallel);
    assert_eq!(config.display_name, "tests");
    assert_eq!(config.framework, FrameworkMode::SpringBoot);
    assert_eq!(config.logging.exception_format, ExceptionFormat::Short);
    assert_eq!(config.logging.slow_threshold_millis, 2000);
    assert!(!config.logging.show_logs_failed_only);
    assert!(!config.logging.show_only_cause_exception);
    assert_eq!(config.logging.level.root, "INFO");
    assert!(config.logging.level.loggers.is_empty());
    assert!(!config.logging.spring_banner);
}

#[test]
fn test_empty_file_yields_defaults() {
    let config = ReportConfig::parse("").expect("empty config is valid");
    assert_eq!(config, ReportConfig::default());
}

#[test]
fn test_load_from_file() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(".testreportrc.toml");
    std::fs::write(
        &path,
        "parallel = true\n\n[logging]\nno_icon = true\nshow_logs_failed_only = true\n",
    )
    .expect("Failed to write config");

    let config = ReportConfig::load_from_file(&path).expect("Failed to load config");

    assert!(config.parallel);
    assert!(config.logging.no_icon);
    assert!(config.logging.show_logs_failed_only);
    assert!(!config.logging.no_color);
}

#[test]
fn test_load_from_missing_file_fails() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let result = ReportConfig::load_from_file(&temp_dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn test_invalid_exception_format_is_rejected() {
    let result = ReportConfig::parse("[logging]\nexception_format = \"verbose\"\n");
    assert!(result.is_err());
}
