// Framework-specific settings - property injection and output noise filtering

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{FrameworkMode, ReportConfig};

/// Worker log chatter as printed by the default Spring Boot console pattern
static NOISE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[Test worker\]\s(?:DEBUG|INFO)$").expect("valid noise regex"));

const NOISE_START: usize = 13;
const NOISE_END: usize = 32;

/// Receives named settings for the test process before tests run
pub trait PropertySink {
    fn set_property(&mut self, key: &str, value: &str);
}

impl PropertySink for BTreeMap<String, String> {
    fn set_property(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

impl PropertySink for HashMap<String, String> {
    fn set_property(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// Push the framework's logging settings into the test environment
pub fn apply_settings(config: &ReportConfig, env: &mut dyn PropertySink) {
    match config.framework {
        FrameworkMode::SpringBoot => spring_boot_settings(config, env),
        FrameworkMode::Default => {}
    }
}

fn spring_boot_settings(config: &ReportConfig, env: &mut dyn PropertySink) {
    let logging = &config.logging;
    env.set_property("logging.level.root", &logging.level.root);
    env.set_property(
        "spring.main.banner-mode",
        if logging.spring_banner { "console" } else { "off" },
    );
    for (name, level) in &logging.level.loggers {
        env.set_property(&format!("logging.level.{}", name), level);
    }
}

/// Whether a captured line is worker DEBUG/INFO noise.
///
/// Relies on the fixed-width `HH:mm:ss.SSS ` prefix: characters 13..32 must
/// match the thread and level exactly. The window is one character wider
/// than `[Test worker] INFO`, so INFO lines are always kept. Lines of 32 characters or fewer are kept, and a
/// different prefix width simply stops the filter from matching.
pub fn is_noise(message: &str) -> bool {
    if message.chars().count() <= NOISE_END {
        return false;
    }
    let window: String = message
        .chars()
        .skip(NOISE_START)
        .take(NOISE_END - NOISE_START)
        .collect();
    NOISE_PATTERN.is_match(&window)
}
