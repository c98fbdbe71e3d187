use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Database error")]
    Database(#[from] sqlx::error::Error),

    #[error("Request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid JSON from {url}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("Cannot read config file {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing setting {0}")]
    MissingSetting(&'static str),

    #[error("Notification failed: {0}")]
    Notify(String),
}

impl ScrapeError {
    /// Timeouts, refused connections and 5xx answers are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Http { source, .. } => source.is_timeout() || source.is_connect(),
            ScrapeError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}
