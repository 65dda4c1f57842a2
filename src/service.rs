//! Read and write paths used by the outer surfaces (CLI today).

use log::{debug, info};
use std::sync::Arc;
use url::Url;

use crate::cache::RecipeCaches;
use crate::error::IngestError;
use crate::model::{Category, CategoryCount, QueueItem, Recipe, RecipePatch};
use crate::queue::link_recipe_if_exists;
use crate::repository::Repository;
use crate::scaling::{ensure_displays, scale, ScaleRequest};

/// What happened to a submitted URL
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// A complete recipe for the URL already existed and is now linked
    Linked { slug: String },
    /// The URL is waiting in the queue
    Queued(QueueItem),
}

/// Recipe operations for one store, with the shared read caches
pub struct RecipeService {
    repo: Arc<dyn Repository>,
    caches: Arc<RecipeCaches>,
}

impl RecipeService {
    pub fn new(repo: Arc<dyn Repository>, caches: Arc<RecipeCaches>) -> Self {
        Self { repo, caches }
    }

    /// Accept a URL for `username`: link an existing recipe or enqueue it.
    pub async fn submit_url(&self, username: &str, url: &str) -> Result<Submission, IngestError> {
        let username = require("username", username)?;
        let url = require("url", url)?;
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(IngestError::InvalidInput(format!("not an http(s) url: {}", url))),
        }

        if let Some(slug) = link_recipe_if_exists(self.repo.as_ref(), username, url).await? {
            info!("Linked existing recipe {} for {}", slug, username);
            self.caches.invalidate_recipe(username, &slug);
            return Ok(Submission::Linked { slug });
        }

        let item = self.repo.enqueue_recipe(username, url).await?;
        debug!("Queued item {} for {}", item.id, username);
        Ok(Submission::Queued(item))
    }

    /// A recipe as seen by `username`, scaled on a copy of the cached value.
    pub async fn get_recipe(
        &self,
        username: &str,
        slug: &str,
        request: ScaleRequest,
    ) -> Result<Recipe, IngestError> {
        let username = require("username", username)?;
        let mut recipe = match self.caches.get_recipe(username, slug) {
            Some(recipe) => recipe,
            None => {
                let recipe = self.repo.get_recipe(username, slug).await?;
                self.caches.put_recipe(username, slug, recipe.clone());
                recipe
            }
        };

        ensure_displays(&mut recipe);
        scale(&mut recipe, request);
        Ok(recipe)
    }

    pub async fn list_recipes(
        &self,
        username: &str,
        category: Option<Category>,
    ) -> Result<Vec<Recipe>, IngestError> {
        let username = require("username", username)?;
        if let Some(recipes) = self.caches.get_list(username, category) {
            return Ok(recipes);
        }
        let recipes = self.repo.list_recipes(username, category).await?;
        self.caches.put_list(username, category, recipes.clone());
        Ok(recipes)
    }

    pub async fn search_recipes(&self, username: &str, term: &str) -> Result<Vec<Recipe>, IngestError> {
        let username = require("username", username)?;
        Ok(self.repo.search_recipes(username, term).await?)
    }

    pub async fn list_favorites(&self, username: &str) -> Result<Vec<Recipe>, IngestError> {
        let username = require("username", username)?;
        Ok(self.repo.list_favorite_recipes(username).await?)
    }

    pub async fn category_counts(&self, username: &str) -> Result<Vec<CategoryCount>, IngestError> {
        let username = require("username", username)?;
        Ok(self.repo.category_counts(username).await?)
    }

    pub async fn count_recipes(&self, username: &str) -> Result<u64, IngestError> {
        let username = require("username", username)?;
        Ok(self.repo.count_recipes(username).await?)
    }

    pub async fn patch_recipe(
        &self,
        username: &str,
        slug: &str,
        patch: &RecipePatch,
    ) -> Result<Recipe, IngestError> {
        let username = require("username", username)?;
        if patch.is_empty() {
            return Err(IngestError::InvalidInput("nothing to update".into()));
        }
        let recipe = self.repo.patch_recipe(username, slug, patch).await?;
        self.caches
            .invalidate_linked(self.repo.as_ref(), username, slug)
            .await;
        Ok(recipe)
    }

    pub async fn delete_recipe(&self, username: &str, slug: &str) -> Result<(), IngestError> {
        let username = require("username", username)?;
        self.repo.delete_recipe(username, slug).await?;
        self.caches.invalidate_recipe(username, slug);
        Ok(())
    }

    pub async fn set_favorite(
        &self,
        username: &str,
        slug: &str,
        favorite: bool,
    ) -> Result<(), IngestError> {
        let username = require("username", username)?;
        self.repo.set_favorite(username, slug, favorite).await?;
        self.caches.invalidate_recipe(username, slug);
        Ok(())
    }

    pub async fn upsert_note(&self, username: &str, slug: &str, content: &str) -> Result<(), IngestError> {
        let username = require("username", username)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(IngestError::InvalidInput("note content is required".into()));
        }
        self.repo.upsert_note(username, slug, content).await?;
        self.caches.invalidate_recipe(username, slug);
        Ok(())
    }

    pub async fn delete_note(&self, username: &str, slug: &str) -> Result<(), IngestError> {
        let username = require("username", username)?;
        self.repo.delete_note(username, slug).await?;
        self.caches.invalidate_recipe(username, slug);
        Ok(())
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, IngestError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(IngestError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::repository::MemoryRepository;

    async fn service() -> (RecipeService, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        repo.create_user("alice").await.unwrap();
        let caches = Arc::new(RecipeCaches::new(&CacheConfig::default()));
        (RecipeService::new(repo.clone(), caches), repo)
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_input() {
        let (service, repo) = service().await;
        assert!(matches!(
            service.submit_url("alice", "  ").await,
            Err(IngestError::InvalidInput(_))
        ));
        assert!(matches!(
            service.submit_url("", "https://a.test").await,
            Err(IngestError::InvalidInput(_))
        ));
        assert!(matches!(
            service.submit_url("alice", "ftp://a.test/file").await,
            Err(IngestError::InvalidInput(_))
        ));
        assert!(repo.fetch_pending_queue(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_note_requires_content() {
        let (service, _repo) = service().await;
        assert!(matches!(
            service.upsert_note("alice", "soup", " ").await,
            Err(IngestError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_patch_rejected() {
        let (service, _repo) = service().await;
        assert!(matches!(
            service
                .patch_recipe("alice", "soup", &RecipePatch::default())
                .await,
            Err(IngestError::InvalidInput(_))
        ));
    }
}
