use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueuerError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseFailed(#[from] serde_json::Error),

    #[error("Backend returned HTTP {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Backend { status: u16, message: Option<String> },

    #[error("Playback client not recognized by the backend")]
    ClientNotRecognized,

    #[error("You must select a playlist first.")]
    NoSelection,

    #[error("Invalid URL in clipboard.")]
    InvalidClipboard,

    #[error("No {0} settings provided. Form was empty.")]
    EmptyForm(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("name cannot be empty")]
    EmptyName,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task panicked or cancelled")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

impl QueuerError {
    /// Formats a failure as a single result-log line.
    ///
    /// Distinguishes a backend that answered with an error status from one
    /// that never answered, and falls back to the error's own message for
    /// everything else.
    pub fn describe(&self, context: &str) -> String {
        match self {
            QueuerError::Backend { status, message } => match message.as_deref() {
                Some(msg) if !msg.is_empty() => format!("{}: ({}) {}", context, status, msg),
                _ => format!("{}: ({})", context, status),
            },
            QueuerError::RequestFailed(_) => format!("{}: No response received", context),
            other => format!("{}: {}", context, other),
        }
    }

    /// True for failures detected before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            QueuerError::NoSelection
                | QueuerError::InvalidClipboard
                | QueuerError::EmptyForm(_)
                | QueuerError::InvalidField { .. }
                | QueuerError::EmptyName
        )
    }
}
