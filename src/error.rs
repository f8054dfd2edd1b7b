use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// User-correctable input problem (e.g. a non-PDF upload).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The remote payload did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    DataShape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DashboardError {
    /// Message suitable for an inline banner or panel.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Validation(msg) => msg.clone(),
            DashboardError::Network(_) => "Failed to fetch results. Please try again.".to_string(),
            DashboardError::Timeout(secs) => {
                format!("The analysis took longer than {} seconds. Please retry.", secs)
            }
            DashboardError::DataShape(_) | DashboardError::SerializationError(_) => {
                "No data available".to_string()
            }
            DashboardError::Config(msg) => msg.clone(),
            DashboardError::IoError(e) => e.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DashboardError::Network(_) | DashboardError::Timeout(_))
    }
}

#[cfg(feature = "remote")]
impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::DataShape(err.to_string())
        } else {
            DashboardError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DashboardError::Network("down".into()).is_retryable());
        assert!(DashboardError::Timeout(60).is_retryable());
        assert!(!DashboardError::Validation("bad".into()).is_retryable());
        assert!(!DashboardError::DataShape("missing".into()).is_retryable());
    }

    #[test]
    fn test_data_shape_degrades_to_no_data() {
        let err = DashboardError::DataShape("missing field `data`".into());
        assert_eq!(err.user_message(), "No data available");
    }
}
