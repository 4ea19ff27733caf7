// Elapsed-time formatting and the wall clock used for build timing

/// Format a duration in milliseconds the way report lines show it.
///
/// Below one second the raw millis are shown, below one minute whole seconds,
/// otherwise minutes and the remaining seconds. Fractions are truncated.
pub fn format_millis(millis: i64) -> String {
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}m {}s", millis / 60_000, (millis / 1000) % 60)
    }
}

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        #[cfg(miri)]
        {
            0
        }
        #[cfg(not(miri))]
        {
            chrono::Utc::now().timestamp_millis()
        }
    }
}

pub fn now_millis() -> i64 {
    SystemClock.now_millis()
}
