pub mod fallback;
pub mod url;

pub use fallback::{fallback_title_and_slug, slugify, title_from_url};
pub use self::url::ExtractionPipeline;

use async_trait::async_trait;

use crate::error::IngestError;
use crate::model::Recipe;

/// A recipe produced from a URL, with the slug it will be stored under
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub recipe: Recipe,
    pub slug: String,
}

/// Turns a URL into a recipe; the queue processor only sees this seam
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<Extraction, IngestError>;

    /// Title and slug for a placeholder when extraction is not possible
    async fn fallback_title_and_slug(&self, url: &str) -> (String, String);
}
