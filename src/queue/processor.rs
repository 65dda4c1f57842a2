use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::cache::RecipeCaches;
use crate::config::QueueConfig;
use crate::error::IngestError;
use crate::model::{Category, QueueItem, Recipe};
use crate::pipelines::{Extraction, Extractor};
use crate::repository::{Repository, RepositoryError};
use crate::validation::is_complete;

/// Result of one queue job, recorded with a single marking call
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded { slug: String },
    Failed { error: String },
}

impl JobOutcome {
    pub fn failed(error: impl ToString) -> Self {
        JobOutcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }

    fn error(&self) -> Option<&str> {
        match self {
            JobOutcome::Succeeded { .. } => None,
            JobOutcome::Failed { error } => Some(error),
        }
    }
}

/// Counts for one processed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub fetched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Link `username` to an already stored, complete recipe for `url`.
///
/// Returns the slug when a link was made. Incomplete stored recipes are not
/// reused so a placeholder never blocks a better extraction.
pub async fn link_recipe_if_exists(
    repo: &dyn Repository,
    username: &str,
    url: &str,
) -> Result<Option<String>, RepositoryError> {
    let Some(stored) = repo.find_recipe_by_original_url(url).await? else {
        return Ok(None);
    };
    if !is_complete(&stored.recipe) {
        return Ok(None);
    }
    repo.link_user_to_recipe(username, stored.id).await?;
    Ok(Some(stored.slug))
}

/// Runs queue jobs against the repository and extraction pipeline
pub struct QueueProcessor {
    repo: Arc<dyn Repository>,
    extractor: Arc<dyn Extractor>,
    caches: Arc<RecipeCaches>,
    config: QueueConfig,
}

impl QueueProcessor {
    pub fn new(
        repo: Arc<dyn Repository>,
        extractor: Arc<dyn Extractor>,
        caches: Arc<RecipeCaches>,
        config: QueueConfig,
    ) -> Self {
        Self {
            repo,
            extractor,
            caches,
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn caches(&self) -> &RecipeCaches {
        &self.caches
    }

    /// Process one item and record the outcome.
    pub async fn process_item(&self, item: &QueueItem) -> JobOutcome {
        let outcome = self.run_job(item).await;
        self.record(item.id, &outcome).await;
        outcome
    }

    /// Fetch one batch of pending items and process them concurrently.
    ///
    /// At most `concurrency` jobs run at a time and the call returns once the
    /// whole batch has been recorded. A panicking job is recorded as failed.
    pub async fn process_batch(self: &Arc<Self>) -> Result<BatchReport, IngestError> {
        let items = self.repo.fetch_pending_queue(self.config.batch_size).await?;
        let mut report = BatchReport {
            fetched: items.len(),
            ..BatchReport::default()
        };
        if items.is_empty() {
            return Ok(report);
        }

        info!(
            "Queue: processing {} item(s) with concurrency={}",
            items.len(),
            self.config.concurrency
        );

        let slots = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut handles = Vec::with_capacity(items.len());
        for item in items {
            let permit = match slots.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let processor = Arc::clone(self);
            let id = item.id;
            let handle = tokio::spawn(async move {
                let _permit = permit;
                processor.run_job(&item).await
            });
            handles.push((id, handle));
        }

        for (id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => {
                    let outcome = JobOutcome::failed(format!("queue item {} panic: {}", id, e));
                    error!("Queue: {:?}", outcome);
                    outcome
                }
                Err(e) => JobOutcome::failed(format!("queue item {} aborted: {}", id, e)),
            };
            if outcome.is_success() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            self.record(id, &outcome).await;
        }

        Ok(report)
    }

    async fn record(&self, id: u64, outcome: &JobOutcome) {
        if let Err(e) = self
            .repo
            .mark_queue_item_result(id, outcome.error(), self.config.max_attempts)
            .await
        {
            error!("Queue: failed to mark item {}: {}", id, e);
        }
    }

    async fn run_job(&self, item: &QueueItem) -> JobOutcome {
        let Some(username) = item.username.as_deref().filter(|name| !name.is_empty()) else {
            let outcome = JobOutcome::failed(format!("queue item {} missing username", item.id));
            warn!("Queue: {:?}", outcome);
            return outcome;
        };

        info!("Queue: processing item {} for user {}", item.id, username);
        match link_recipe_if_exists(self.repo.as_ref(), username, &item.url).await {
            Ok(Some(slug)) => {
                info!("Queue: item {} linked existing recipe {}", item.id, slug);
                self.caches.invalidate_recipe(username, &slug);
                return JobOutcome::Succeeded { slug };
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Queue: item {} failed linking existing recipe: {}", item.id, e);
                return JobOutcome::failed(e);
            }
        }

        match self.extractor.extract(&item.url).await {
            Ok(extraction) => self.store_extraction(item, username, extraction).await,
            Err(e) => {
                warn!("Queue: item {} failed to fetch recipe: {}", item.id, e);
                let (title, slug) = self.extractor.fallback_title_and_slug(&item.url).await;
                let mut placeholder = Recipe::placeholder(title, item.url.as_str());
                placeholder.link = Recipe::link_for(Category::Other, &slug);

                match self.save(username, &slug, &placeholder).await {
                    Ok(()) => JobOutcome::Succeeded { slug },
                    Err(save_error) => {
                        warn!(
                            "Queue: item {} failed to save placeholder recipe: {}",
                            item.id, save_error
                        );
                        JobOutcome::failed(format!(
                            "{}; placeholder save failed: {}",
                            e, save_error
                        ))
                    }
                }
            }
        }
    }

    async fn store_extraction(
        &self,
        item: &QueueItem,
        username: &str,
        extraction: Extraction,
    ) -> JobOutcome {
        let Extraction { recipe, slug } = extraction;

        if is_complete(&recipe) {
            return match self.save(username, &slug, &recipe).await {
                Ok(()) => JobOutcome::Succeeded { slug },
                Err(e) => {
                    warn!("Queue: item {} failed to save recipe: {}", item.id, e);
                    JobOutcome::failed(e)
                }
            };
        }

        info!(
            "Queue: item {} recipe incomplete; saving minimal placeholder",
            item.id
        );
        let mut title = recipe.title.trim().to_string();
        let mut slug = slug;
        if title.is_empty() || slug.is_empty() {
            let (fallback_title, fallback_slug) =
                self.extractor.fallback_title_and_slug(&item.url).await;
            if title.is_empty() {
                title = fallback_title;
            }
            if slug.is_empty() {
                slug = fallback_slug;
            }
        }

        let mut placeholder = Recipe::placeholder(title, item.url.as_str());
        placeholder.image = recipe.image;
        placeholder.category = recipe.category;
        placeholder.link = Recipe::link_for(recipe.category, &slug);

        match self.save(username, &slug, &placeholder).await {
            Ok(()) => JobOutcome::Succeeded { slug },
            Err(e) => {
                warn!(
                    "Queue: item {} failed to save minimal placeholder: {}",
                    item.id, e
                );
                JobOutcome::failed(e)
            }
        }
    }

    async fn save(&self, username: &str, slug: &str, recipe: &Recipe) -> Result<(), RepositoryError> {
        self.repo.save_recipe_for_user(username, slug, recipe).await?;
        // The slug may be shared, so every linked user's copy is stale now
        self.caches
            .invalidate_linked(self.repo.as_ref(), username, slug)
            .await;
        Ok(())
    }
}
