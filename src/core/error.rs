use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// True for failures a retry after reconnecting could fix.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Gateway(_) | SyncError::Enrichment(_) | SyncError::Io(_) | SyncError::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Enrichment(err.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for SyncError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::Timeout(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SyncError::Gateway("offline".into()).is_transient());
        assert!(SyncError::Timeout("load".into()).is_transient());
        assert!(!SyncError::Config("batch_size".into()).is_transient());
        assert!(!SyncError::SessionClosed.is_transient());
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(SyncError::from(err), SyncError::Serialization(_)));
    }
}
