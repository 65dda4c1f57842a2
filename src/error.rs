use thiserror::Error;

use crate::repository::RepositoryError;

/// Errors that can occur while ingesting, storing or serving recipes
#[derive(Error, Debug)]
pub enum IngestError {
    /// Rejected request input (blank URL, missing username, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Page could not be fetched by any method
    #[error("Failed to fetch page: {0}")]
    Fetch(String),

    /// Headless browser rendering failed
    #[error("Render failed: {0}")]
    Render(String),

    /// No usable Chromium/Chrome binary; retrying will not help
    #[error("no Chromium/Chrome binary found; set CHROMIUM_BIN or install chromium")]
    BrowserUnavailable,

    /// The AI service returned nothing usable
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Image resolution, download or upload failed
    #[error("Image error: {0}")]
    Image(String),

    /// Object storage failure
    #[error("Object storage error: {0}")]
    Storage(String),

    /// Data store failure
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
