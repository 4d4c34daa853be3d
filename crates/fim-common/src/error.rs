//! Error types for the flood inundation overlay pipeline.

use thiserror::Error;

/// Result type alias using FimError.
pub type FimResult<T> = Result<T, FimError>;

/// Primary error type for catalog, raster and overlay operations.
#[derive(Debug, Error)]
pub enum FimError {
    // === Fetch Errors ===
    #[error("Network request failed: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    // === Data Errors ===
    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("No catalog entry for stage {stage} m")]
    NoMatch { stage: f64 },

    #[error("Invalid raster extent: {0}")]
    ReprojectionInput(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// An API body that is not the JSON the endpoint promises.
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FimError {
    /// Network failures may succeed when the user retries the selection.
    pub fn is_transient(&self) -> bool {
        match self {
            FimError::Network(_) => true,
            FimError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Short title used for user-facing notifications.
    pub fn notification_title(&self) -> &'static str {
        match self {
            FimError::Network(_) | FimError::HttpStatus { .. } => "Network Error",
            FimError::Decode(_) | FimError::ReprojectionInput(_) | FimError::Render(_) => {
                "Error Loading COG"
            }
            FimError::NoMatch { .. } => "Stage Selection",
            FimError::InvalidCatalog(_) | FimError::NotFound(_) => "Catalog",
            FimError::InvalidResponse(_) => "Invalid Response",
            FimError::Config(_) | FimError::Internal(_) => "Error",
        }
    }
}

impl From<std::io::Error> for FimError {
    fn from(err: std::io::Error) -> Self {
        FimError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for FimError {
    fn from(err: serde_json::Error) -> Self {
        FimError::InvalidResponse(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FimError::Network("reset".into()).is_transient());
        assert!(FimError::HttpStatus { status: 503, url: "x".into() }.is_transient());
        assert!(!FimError::HttpStatus { status: 404, url: "x".into() }.is_transient());
        assert!(!FimError::Decode("bad".into()).is_transient());
    }

    #[test]
    fn test_json_error_is_not_a_raster_error() {
        let err: FimError = serde_json::from_str::<Vec<f64>>("{not json").unwrap_err().into();
        assert!(matches!(err, FimError::InvalidResponse(_)));
        assert_eq!(err.notification_title(), "Invalid Response");
        assert!(!err.to_string().contains("raster"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_http_status_display() {
        let err = FimError::HttpStatus {
            status: 500,
            url: "http://api/fim".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500 from http://api/fim");
    }
}
