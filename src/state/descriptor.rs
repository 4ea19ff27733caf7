// Test and suite identities delivered with lifecycle events

use std::sync::Arc;

/// A node in the test hierarchy: a suite or a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescriptor {
    pub id: String,
    pub display_name: String,
    pub class_name: Option<String>,
    pub class_display_name: Option<String>,
    /// `None` marks a top-level suite
    pub parent: Option<Arc<TestDescriptor>>,
}

impl TestDescriptor {
    /// Create a top-level node
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            class_name: None,
            class_display_name: None,
            parent: None,
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_class_display_name(mut self, name: impl Into<String>) -> Self {
        self.class_display_name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent: Arc<TestDescriptor>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Name without a trailing `()` left by method-style display names
    pub fn short_name(&self) -> &str {
        self.display_name
            .strip_suffix("()")
            .unwrap_or(&self.display_name)
    }

    /// Name of the suite this node belongs to, as shown to the user
    pub fn suite_display_name(&self) -> &str {
        self.class_display_name
            .as_deref()
            .or(self.class_name.as_deref())
            .unwrap_or(&self.display_name)
    }
}
