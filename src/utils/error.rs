use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Browser startup failed: {0}")]
    BrowserInit(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page load timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("Timed out waiting for element: {selector}")]
    WaitTimeout { selector: String },

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid catalog: {0}")]
    Catalog(String),

    #[error("Catalog parse error: {0}")]
    CatalogParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// True only for failures that abort the whole run before any
    /// product is processed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::BrowserInit(_))
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
