use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::error::IngestError;
use crate::images::ImageResolver;
use crate::model::Recipe;
use crate::pipelines::{fallback, Extraction, Extractor};
use crate::providers::RecipeAi;
use crate::storage::ObjectStore;
use crate::url_to_text::{PageLoader, PageSummary};

/// URL to recipe extraction
///
/// This pipeline:
/// 1. Renders the page with headless Chromium (plain HTTP as fallback)
/// 2. Reduces the HTML to visible text and metadata
/// 3. Asks the AI service for a structured recipe
/// 4. Stores an image from page metadata or AI generation
/// 5. Attaches the original URL and link path
pub struct ExtractionPipeline {
    loader: PageLoader,
    ai: Arc<dyn RecipeAi>,
    images: ImageResolver,
    title_client: Client,
}

impl ExtractionPipeline {
    pub fn new(
        config: &AppConfig,
        ai: Arc<dyn RecipeAi>,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self, IngestError> {
        let loader = PageLoader::new(config.browser.clone(), &config.fetch)?;
        let images = ImageResolver::new(
            ai.clone(),
            store,
            Duration::from_secs(config.fetch.timeout),
            &config.fetch.user_agent,
        )?;
        let title_client = Client::builder()
            .timeout(Duration::from_secs(config.fetch.title_timeout))
            .user_agent(&config.fetch.user_agent)
            .build()?;

        Ok(Self {
            loader,
            ai,
            images,
            title_client,
        })
    }
}

#[async_trait]
impl Extractor for ExtractionPipeline {
    async fn extract(&self, url: &str) -> Result<Extraction, IngestError> {
        let html = self.loader.load(url).await?;
        let page = PageSummary::from_html(&html, url);
        debug!("Visible text for {}: {} chars", url, page.text.len());

        let started = Instant::now();
        let mut recipe: Recipe = self.ai.extract_recipe(&page.text).await?.into_recipe();
        info!(
            "Time to extract recipe with AI: {:?} ({})",
            started.elapsed(),
            recipe.category
        );

        let slug = fallback::slugify(&recipe.title);
        debug!("Slug for recipe: {}", slug);

        if let Some(stored) = self
            .images
            .resolve(page.image_url.as_deref(), &recipe.title, &slug)
            .await
        {
            recipe.image = stored;
        }

        recipe.original_url = url.to_string();
        recipe.link = Recipe::link_for(recipe.category, &slug);
        Ok(Extraction { recipe, slug })
    }

    async fn fallback_title_and_slug(&self, url: &str) -> (String, String) {
        fallback::fallback_title_and_slug(&self.title_client, url).await
    }
}
