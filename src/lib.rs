//! Recipe ingestion: a background queue that turns submitted URLs into
//! structured, scalable recipes.

pub mod cache;
pub mod config;
pub mod error;
pub mod images;
pub mod ingredients;
pub mod model;
pub mod pipelines;
pub mod providers;
pub mod queue;
pub mod repository;
pub mod scaling;
pub mod service;
pub mod storage;
pub mod url_to_text;
pub mod validation;

pub use cache::RecipeCaches;
pub use config::AppConfig;
pub use error::IngestError;
pub use ingredients::{format_amount, parse_amount, split_unit, ParsedAmount};
pub use model::{Category, IngredientDetail, QueueItem, Recipe};
pub use pipelines::{Extraction, ExtractionPipeline, Extractor};
pub use providers::{OpenAIProvider, RecipeAi};
pub use queue::{JobOutcome, QueueProcessor, QueueScheduler};
pub use repository::{MemoryRepository, Repository, RepositoryError};
pub use scaling::{scale, ScaleRequest};
pub use service::{RecipeService, Submission};
pub use storage::{FsObjectStore, MemoryObjectStore, ObjectStore};
pub use validation::is_complete;

use std::sync::Arc;

/// Build the URL extraction pipeline from configuration.
///
/// Uses the OpenAI-compatible provider and the filesystem object store.
pub fn build_pipeline(config: &AppConfig) -> Result<ExtractionPipeline, IngestError> {
    let ai: Arc<dyn RecipeAi> = Arc::new(OpenAIProvider::new(&config.ai)?);
    let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::from_config(&config.storage));
    ExtractionPipeline::new(config, ai, store)
}
