mod error;
mod memory;

pub use error::RepositoryError;
pub use memory::MemoryRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{
    Category, CategoryCount, PasswordReset, QueueItem, Recipe, RecipePatch, User,
};

/// A recipe row as stored, independent of any viewing user
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecipe {
    pub id: u64,
    pub slug: String,
    pub recipe: Recipe,
}

/// Data store facade used by the queue processor and the service layer.
///
/// Every method is atomic: multi-row writes (a recipe upsert together with
/// its ingredient rows and the user link, or a delete together with the
/// user's favorite and note) either fully apply or not at all. No
/// implementation may hold a lock across calls.
///
/// Recipes are unique by slug and shared between users through links;
/// "saving for a user" upserts the slug and links it to that user.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    // ── Users ────────────────────────────────────────────────────────────────

    async fn create_user(&self, username: &str) -> Result<User, RepositoryError>;

    async fn get_user(&self, username: &str) -> Result<User, RepositoryError>;

    /// Remove a user with their links, favorites and notes. Queue items are
    /// kept and lose their owner.
    async fn delete_user(&self, username: &str) -> Result<(), RepositoryError>;

    // ── Queue ────────────────────────────────────────────────────────────────

    /// Enqueue `url` for `username`. When a pending item for the same user
    /// and URL exists it is returned instead of creating a second one.
    async fn enqueue_recipe(&self, username: &str, url: &str)
        -> Result<QueueItem, RepositoryError>;

    /// Pending items, oldest first, at most `limit` (0 means no limit).
    async fn fetch_pending_queue(&self, limit: usize) -> Result<Vec<QueueItem>, RepositoryError>;

    async fn get_queue_item(&self, id: u64) -> Result<QueueItem, RepositoryError>;

    /// Record one processing attempt.
    ///
    /// Always increments `attempts`. `None` marks success: the item is
    /// processed and its error cleared. `Some(error)` stores the truncated
    /// error and finalizes the item only once attempts reach `max_attempts`.
    async fn mark_queue_item_result(
        &self,
        id: u64,
        error: Option<&str>,
        max_attempts: u32,
    ) -> Result<QueueItem, RepositoryError>;

    // ── Recipes ──────────────────────────────────────────────────────────────

    /// The recipe stored for `original_url`, preferring a complete one when
    /// several rows share the URL.
    async fn find_recipe_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<StoredRecipe>, RepositoryError>;

    /// Usernames linked to the recipe stored under `slug`; empty when the
    /// slug does not exist.
    async fn linked_usernames(&self, slug: &str) -> Result<Vec<String>, RepositoryError>;

    async fn link_user_to_recipe(&self, username: &str, recipe_id: u64)
        -> Result<(), RepositoryError>;

    /// Insert or update the recipe stored under `slug`, replace its
    /// ingredient rows from `recipe.ingredients`, and link it to `username`.
    async fn save_recipe_for_user(
        &self,
        username: &str,
        slug: &str,
        recipe: &Recipe,
    ) -> Result<u64, RepositoryError>;

    /// A recipe as seen by `username` (note and favorite flag filled in).
    async fn get_recipe(&self, username: &str, slug: &str) -> Result<Recipe, RepositoryError>;

    /// Recipes linked to `username`, most recently linked first.
    async fn list_recipes(
        &self,
        username: &str,
        category: Option<Category>,
    ) -> Result<Vec<Recipe>, RepositoryError>;

    /// Case-insensitive title search over the user's recipes.
    async fn search_recipes(&self, username: &str, term: &str)
        -> Result<Vec<Recipe>, RepositoryError>;

    async fn list_favorite_recipes(&self, username: &str) -> Result<Vec<Recipe>, RepositoryError>;

    async fn count_recipes(&self, username: &str) -> Result<u64, RepositoryError>;

    async fn category_counts(&self, username: &str) -> Result<Vec<CategoryCount>, RepositoryError>;

    /// Apply a partial update (title, instructions, category).
    async fn patch_recipe(
        &self,
        username: &str,
        slug: &str,
        patch: &RecipePatch,
    ) -> Result<Recipe, RepositoryError>;

    /// Unlink the recipe from `username` and drop that user's favorite and note.
    async fn delete_recipe(&self, username: &str, slug: &str) -> Result<(), RepositoryError>;

    // ── Favorites and notes ──────────────────────────────────────────────────

    async fn set_favorite(
        &self,
        username: &str,
        slug: &str,
        favorite: bool,
    ) -> Result<(), RepositoryError>;

    async fn upsert_note(&self, username: &str, slug: &str, content: &str)
        -> Result<(), RepositoryError>;

    async fn delete_note(&self, username: &str, slug: &str) -> Result<(), RepositoryError>;

    // ── Password resets ──────────────────────────────────────────────────────

    async fn create_password_reset(
        &self,
        username: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, RepositoryError>;

    /// Mark an unused, unexpired reset as used and return its user.
    async fn consume_password_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<User, RepositoryError>;
}
