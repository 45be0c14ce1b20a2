use std::time::Duration;

pub const DEFAULT_FRAMEWORK_PREFIX: &str = "Bpk";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(250);
pub const DEFAULT_HIGHLIGHT_OUTLINE: &str = "2px dashed #e70866";

/// Settings shared by the scanner, the inspector and the change watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Class-name prefix identifying the style framework.
    pub framework_prefix: String,
    /// How long mutations are left to settle before a re-scan runs.
    pub settle_delay: Duration,
    /// `outline` value written on flagged elements while highlighting.
    pub highlight_outline: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            framework_prefix: DEFAULT_FRAMEWORK_PREFIX.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            highlight_outline: DEFAULT_HIGHLIGHT_OUTLINE.to_string(),
        }
    }
}

impl ScanConfig {
    pub fn with_framework_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.framework_prefix = prefix.into();
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_highlight_outline(mut self, outline: impl Into<String>) -> Self {
        self.highlight_outline = outline.into();
        self
    }
}
