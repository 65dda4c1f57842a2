//! Recipe image resolution: page metadata first, AI generation second.
//!
//! Nothing in here fails the extraction. Every error is logged and the
//! recipe simply keeps whatever image reference it already had.

use chrono::Utc;
use log::{info, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::error::IngestError;
use crate::providers::{image_prompt, RecipeAi};
use crate::storage::ObjectStore;

/// Downloads candidate images and uploads them to the object store
pub struct ImageResolver {
    client: Client,
    ai: Arc<dyn RecipeAi>,
    store: Arc<dyn ObjectStore>,
}

impl ImageResolver {
    pub fn new(
        ai: Arc<dyn RecipeAi>,
        store: Arc<dyn ObjectStore>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, ai, store })
    }

    /// Store an image for the recipe and return its public URL.
    pub async fn resolve(&self, metadata_url: Option<&str>, title: &str, slug: &str) -> Option<String> {
        if let Some(candidate) = metadata_url {
            match self.store_from_url(candidate, slug).await {
                Ok(stored) => return Some(stored),
                Err(e) => warn!("Failed to store metadata image {}: {}", candidate, e),
            }
        }

        let generated = match self.ai.generate_image(&image_prompt(title)).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Error generating image for '{}': {}", title, e);
                return None;
            }
        };
        info!("Generated image for '{}'", title);

        match self.store_from_url(&generated, slug).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!("Failed to store generated image: {}", e);
                None
            }
        }
    }

    /// Download `image_url` and upload it under `images/{slug}-{unix}{ext}`.
    pub async fn store_from_url(&self, image_url: &str, slug: &str) -> Result<String, IngestError> {
        if image_url.trim().is_empty() {
            return Err(IngestError::Image("image url is empty".into()));
        }

        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| IngestError::Image(format!("download image: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(IngestError::Image(format!("unexpected HTTP status: {}", status)));
        }

        let header_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| IngestError::Image(format!("read image: {}", e)))?
            .to_vec();

        let content_type = header_type.unwrap_or_else(|| sniff_content_type(&bytes).to_string());
        let ext = extension_for_content_type(&content_type)
            .map(str::to_string)
            .or_else(|| extension_from_url(image_url))
            .unwrap_or_else(|| ".jpg".to_string());

        let key = image_key(slug, Utc::now().timestamp(), &ext);
        self.store
            .put(&key, &content_type, bytes)
            .await
            .map_err(|e| IngestError::Image(format!("upload image: {}", e)))
    }
}

pub fn image_key(slug: &str, unix: i64, ext: &str) -> String {
    let slug = if slug.is_empty() { "recipe" } else { slug };
    format!("images/{}-{}{}", slug, unix, ext)
}

pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/webp" => Some(".webp"),
        "image/gif" => Some(".gif"),
        _ => None,
    }
}

/// Extension of the URL path, including the dot.
pub fn extension_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let ext = Path::new(url.path()).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// Content type from magic bytes, for servers that send none.
fn sniff_content_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}
