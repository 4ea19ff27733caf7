// Per-test captured output awaiting a display decision

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, creating the entry on first use
    pub fn append(&self, key: &str, line: String) {
        self.lock().entry(key.to_string()).or_default().push(line);
    }

    /// Copy of the lines held for `key`, empty when nothing was captured
    pub fn lines(&self, key: &str) -> Vec<String> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    /// Empty the entry for `key` but keep it in the map
    pub fn clear(&self, key: &str) {
        if let Some(lines) = self.lock().get_mut(key) {
            lines.clear();
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self, key: &str) -> usize {
        self.lock().get(key).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_append_keeps_order() {
        let buffer = LogBuffer::new();
        buffer.append("t1", "first".to_string());
        buffer.append("t1", "second".to_string());
        assert_eq!(buffer.lines("t1"), vec!["first", "second"]);
        assert!(buffer.lines("missing").is_empty());
    }

    #[test]
    fn test_clear_keeps_entry() {
        let buffer = LogBuffer::new();
        buffer.append("t1", "line".to_string());
        buffer.clear("t1");
        assert!(buffer.contains("t1"));
        assert!(buffer.is_empty("t1"));
        buffer.clear("never-seen");
        assert!(!buffer.contains("never-seen"));
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let buffer = Arc::new(LogBuffer::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let buffer = buffer.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        buffer.append("shared", format!("{}-{}", worker, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }
        assert_eq!(buffer.len("shared"), 2000);
    }
}
