use thiserror::Error;

/// Recoverable conditions met while scanning. None of them aborts a scan;
/// they are logged and the affected sheet, rule or listener is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("stylesheet `{href}` is not readable: {reason}")]
    InaccessibleStylesheet { href: String, reason: String },

    #[error("selector `{selector}` cannot be evaluated: {reason}")]
    MalformedSelector { selector: String, reason: String },

    #[error("listener `{listener}` failed: {message}")]
    PresenterFailure { listener: String, message: String },

    #[error("failed to parse stylesheet: {0}")]
    StyleParse(String),
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;
