use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{Repository, RepositoryError, StoredRecipe};
use crate::ingredients::parse_ingredient_lines;
use crate::model::{
    truncate_error, Category, CategoryCount, IngredientDetail, PasswordReset, QueueItem, Recipe,
    RecipePatch, User,
};
use crate::validation::is_complete;

struct RecipeRow {
    id: u64,
    slug: String,
    recipe: Recipe,
    ingredients: Vec<IngredientDetail>,
}

struct QueueRow {
    id: u64,
    user_id: u64,
    url: String,
    attempts: u32,
    last_error: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    next_seq: u64,
    users: BTreeMap<u64, User>,
    recipes: BTreeMap<u64, RecipeRow>,
    /// (user, recipe) -> link order
    links: HashMap<(u64, u64), u64>,
    favorites: HashMap<(u64, u64), u64>,
    notes: HashMap<(u64, u64), String>,
    queue: BTreeMap<u64, QueueRow>,
    resets: Vec<PasswordReset>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn user_id(&self, username: &str) -> Result<u64, RepositoryError> {
        if username.trim().is_empty() {
            return Err(RepositoryError::InvalidInput("username is required".into()));
        }
        self.users
            .values()
            .find(|user| user.username == username)
            .map(|user| user.id)
            .ok_or_else(|| RepositoryError::not_found("user", username))
    }

    fn recipe_id_by_slug(&self, slug: &str) -> Result<u64, RepositoryError> {
        if slug.trim().is_empty() {
            return Err(RepositoryError::InvalidInput("slug is required".into()));
        }
        self.recipes
            .values()
            .find(|row| row.slug == slug)
            .map(|row| row.id)
            .ok_or_else(|| RepositoryError::not_found("recipe", slug))
    }

    /// Recipe id for `slug`, only if it is linked to `user_id`.
    fn linked_recipe_id(&self, user_id: u64, slug: &str) -> Result<u64, RepositoryError> {
        let recipe_id = self.recipe_id_by_slug(slug)?;
        if self.links.contains_key(&(user_id, recipe_id)) {
            Ok(recipe_id)
        } else {
            Err(RepositoryError::not_found("recipe", slug))
        }
    }

    fn link(&mut self, user_id: u64, recipe_id: u64) {
        if !self.links.contains_key(&(user_id, recipe_id)) {
            let seq = self.next_seq();
            self.links.insert((user_id, recipe_id), seq);
        }
    }

    /// Materialize a stored row, with per-user fields when a viewer is given.
    fn view(&self, row: &RecipeRow, viewer: Option<u64>) -> Recipe {
        let mut recipe = row.recipe.clone();
        recipe.parsed_ingredients = row.ingredients.clone();
        recipe.ingredients = row
            .ingredients
            .iter()
            .map(|detail| detail.display.clone())
            .collect();
        if recipe.original_servings == 0 {
            recipe.original_servings = recipe.servings;
        }
        if let Some(user_id) = viewer {
            recipe.note = self.notes.get(&(user_id, row.id)).cloned();
            recipe.is_favorite = self.favorites.contains_key(&(user_id, row.id));
        }
        recipe
    }

    /// Rows linked to `user_id`, most recently linked first.
    fn user_rows(&self, user_id: u64) -> Vec<&RecipeRow> {
        let mut linked: Vec<(u64, &RecipeRow)> = self
            .links
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .filter_map(|((_, rid), seq)| self.recipes.get(rid).map(|row| (*seq, row)))
            .collect();
        linked.sort_by(|a, b| b.0.cmp(&a.0));
        linked.into_iter().map(|(_, row)| row).collect()
    }

    fn queue_item(&self, row: &QueueRow) -> QueueItem {
        QueueItem {
            id: row.id,
            user_id: row.user_id,
            username: self.users.get(&row.user_id).map(|u| u.username.clone()),
            url: row.url.clone(),
            attempts: row.attempts,
            last_error: row.last_error.clone(),
            processed_at: row.processed_at,
            created_at: row.created_at,
        }
    }
}

/// In-memory [`Repository`].
///
/// One mutex guards all tables and is held for exactly one call, which makes
/// every call a transaction. Nothing is held across an `.await`.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Backend("repository lock poisoned".into()))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, username: &str) -> Result<User, RepositoryError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(RepositoryError::InvalidInput("username is required".into()));
        }
        let mut state = self.lock()?;
        if state.users.values().any(|user| user.username == username) {
            return Err(RepositoryError::Conflict {
                entity: "user",
                key: username.to_string(),
            });
        }
        let user = User {
            id: state.next_id(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, username: &str) -> Result<User, RepositoryError> {
        let state = self.lock()?;
        let id = state.user_id(username)?;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("user", username))
    }

    async fn delete_user(&self, username: &str) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;
        state.users.remove(&user_id);
        state.links.retain(|(uid, _), _| *uid != user_id);
        state.favorites.retain(|(uid, _), _| *uid != user_id);
        state.notes.retain(|(uid, _), _| *uid != user_id);
        state.resets.retain(|reset| reset.user_id != user_id);
        Ok(())
    }

    async fn enqueue_recipe(
        &self,
        username: &str,
        url: &str,
    ) -> Result<QueueItem, RepositoryError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RepositoryError::InvalidInput("url is required".into()));
        }
        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;

        if let Some(existing) = state
            .queue
            .values()
            .find(|row| row.user_id == user_id && row.url == url && row.processed_at.is_none())
        {
            debug!("Queue item {} already pending for {}", existing.id, url);
            return Ok(state.queue_item(existing));
        }

        let row = QueueRow {
            id: state.next_id(),
            user_id,
            url: url.to_string(),
            attempts: 0,
            last_error: None,
            processed_at: None,
            created_at: Utc::now(),
        };
        let item = state.queue_item(&row);
        state.queue.insert(row.id, row);
        Ok(item)
    }

    async fn fetch_pending_queue(&self, limit: usize) -> Result<Vec<QueueItem>, RepositoryError> {
        let state = self.lock()?;
        let mut pending: Vec<&QueueRow> = state
            .queue
            .values()
            .filter(|row| row.processed_at.is_none())
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if limit > 0 {
            pending.truncate(limit);
        }
        Ok(pending.into_iter().map(|row| state.queue_item(row)).collect())
    }

    async fn get_queue_item(&self, id: u64) -> Result<QueueItem, RepositoryError> {
        let state = self.lock()?;
        state
            .queue
            .get(&id)
            .map(|row| state.queue_item(row))
            .ok_or_else(|| RepositoryError::not_found("queue item", id.to_string()))
    }

    async fn mark_queue_item_result(
        &self,
        id: u64,
        error: Option<&str>,
        max_attempts: u32,
    ) -> Result<QueueItem, RepositoryError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let row = state
            .queue
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("queue item", id.to_string()))?;

        row.attempts += 1;
        match error {
            None => {
                row.processed_at = Some(now);
                row.last_error = None;
            }
            Some(message) => {
                row.last_error = Some(truncate_error(message));
                if row.attempts >= max_attempts && row.processed_at.is_none() {
                    row.processed_at = Some(now);
                }
            }
        }

        let state = &*state;
        state
            .queue
            .get(&id)
            .map(|row| state.queue_item(row))
            .ok_or_else(|| RepositoryError::not_found("queue item", id.to_string()))
    }

    async fn find_recipe_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<StoredRecipe>, RepositoryError> {
        if original_url.trim().is_empty() {
            return Err(RepositoryError::InvalidInput("original url is required".into()));
        }
        let state = self.lock()?;
        let matches: Vec<StoredRecipe> = state
            .recipes
            .values()
            .filter(|row| row.recipe.original_url == original_url)
            .map(|row| StoredRecipe {
                id: row.id,
                slug: row.slug.clone(),
                recipe: state.view(row, None),
            })
            .collect();
        // A complete row wins over an older placeholder for the same URL
        let preferred = matches
            .iter()
            .position(|stored| is_complete(&stored.recipe))
            .unwrap_or(0);
        Ok(matches.into_iter().nth(preferred))
    }

    async fn linked_usernames(&self, slug: &str) -> Result<Vec<String>, RepositoryError> {
        let state = self.lock()?;
        let recipe_id = match state.recipe_id_by_slug(slug) {
            Ok(id) => id,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut usernames: Vec<String> = state
            .links
            .keys()
            .filter(|(_, rid)| *rid == recipe_id)
            .filter_map(|(uid, _)| state.users.get(uid))
            .map(|user| user.username.clone())
            .collect();
        usernames.sort();
        Ok(usernames)
    }

    async fn link_user_to_recipe(
        &self,
        username: &str,
        recipe_id: u64,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;
        if !state.recipes.contains_key(&recipe_id) {
            return Err(RepositoryError::not_found("recipe", recipe_id.to_string()));
        }
        state.link(user_id, recipe_id);
        Ok(())
    }

    async fn save_recipe_for_user(
        &self,
        username: &str,
        slug: &str,
        recipe: &Recipe,
    ) -> Result<u64, RepositoryError> {
        if slug.trim().is_empty() {
            return Err(RepositoryError::InvalidInput("slug is required".into()));
        }

        // Parse before taking the lock; nothing below can fail halfway.
        let ingredients = if recipe.ingredients.is_empty() {
            recipe.parsed_ingredients.clone()
        } else {
            parse_ingredient_lines(&recipe.ingredients)
        };

        let mut stored = recipe.clone();
        stored.ingredients = Vec::new();
        stored.parsed_ingredients = Vec::new();
        stored.note = None;
        stored.is_favorite = false;
        if stored.original_servings == 0 {
            stored.original_servings = stored.servings;
        }

        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;

        let existing = state
            .recipes
            .values()
            .find(|row| row.slug == slug)
            .map(|row| row.id);
        let recipe_id = match existing.and_then(|id| state.recipes.get_mut(&id)) {
            Some(row) => {
                row.recipe = stored;
                row.ingredients = ingredients;
                row.id
            }
            None => {
                let id = state.next_id();
                state.recipes.insert(
                    id,
                    RecipeRow {
                        id,
                        slug: slug.to_string(),
                        recipe: stored,
                        ingredients,
                    },
                );
                id
            }
        };

        state.link(user_id, recipe_id);
        Ok(recipe_id)
    }

    async fn get_recipe(&self, username: &str, slug: &str) -> Result<Recipe, RepositoryError> {
        let state = self.lock()?;
        let user_id = state.user_id(username)?;
        let recipe_id = state.linked_recipe_id(user_id, slug)?;
        let row = state
            .recipes
            .get(&recipe_id)
            .ok_or_else(|| RepositoryError::not_found("recipe", slug))?;
        Ok(state.view(row, Some(user_id)))
    }

    async fn list_recipes(
        &self,
        username: &str,
        category: Option<Category>,
    ) -> Result<Vec<Recipe>, RepositoryError> {
        let state = self.lock()?;
        let user_id = state.user_id(username)?;
        Ok(state
            .user_rows(user_id)
            .into_iter()
            .filter(|row| category.map_or(true, |c| row.recipe.category == c))
            .map(|row| state.view(row, Some(user_id)))
            .collect())
    }

    async fn search_recipes(
        &self,
        username: &str,
        term: &str,
    ) -> Result<Vec<Recipe>, RepositoryError> {
        let needle = term.trim().to_lowercase();
        let state = self.lock()?;
        let user_id = state.user_id(username)?;
        Ok(state
            .user_rows(user_id)
            .into_iter()
            .filter(|row| row.recipe.title.to_lowercase().contains(&needle))
            .map(|row| state.view(row, Some(user_id)))
            .collect())
    }

    async fn list_favorite_recipes(&self, username: &str) -> Result<Vec<Recipe>, RepositoryError> {
        let state = self.lock()?;
        let user_id = state.user_id(username)?;
        let mut favorites: Vec<(u64, u64)> = state
            .favorites
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|((_, rid), seq)| (*seq, *rid))
            .collect();
        favorites.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(favorites
            .into_iter()
            .filter_map(|(_, rid)| state.recipes.get(&rid))
            .map(|row| state.view(row, Some(user_id)))
            .collect())
    }

    async fn count_recipes(&self, username: &str) -> Result<u64, RepositoryError> {
        let state = self.lock()?;
        let user_id = state.user_id(username)?;
        Ok(state.user_rows(user_id).len() as u64)
    }

    async fn category_counts(&self, username: &str) -> Result<Vec<CategoryCount>, RepositoryError> {
        let state = self.lock()?;
        let user_id = state.user_id(username)?;
        let mut counts: BTreeMap<&'static str, CategoryCount> = BTreeMap::new();
        for row in state.user_rows(user_id) {
            let category = row.recipe.category;
            counts
                .entry(category.as_str())
                .or_insert(CategoryCount { category, count: 0 })
                .count += 1;
        }
        Ok(counts.into_values().collect())
    }

    async fn patch_recipe(
        &self,
        username: &str,
        slug: &str,
        patch: &RecipePatch,
    ) -> Result<Recipe, RepositoryError> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(RepositoryError::InvalidInput("title cannot be blank".into()));
            }
        }

        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;
        let recipe_id = state.linked_recipe_id(user_id, slug)?;
        let row = state
            .recipes
            .get_mut(&recipe_id)
            .ok_or_else(|| RepositoryError::not_found("recipe", slug))?;

        if let Some(title) = &patch.title {
            row.recipe.title = title.trim().to_string();
        }
        if let Some(instructions) = &patch.instructions {
            row.recipe.instructions = instructions.clone();
        }
        if let Some(category) = patch.category {
            row.recipe.category = category;
            row.recipe.link = Recipe::link_for(category, &row.slug);
        }

        let state = &*state;
        let row = state
            .recipes
            .get(&recipe_id)
            .ok_or_else(|| RepositoryError::not_found("recipe", slug))?;
        Ok(state.view(row, Some(user_id)))
    }

    async fn delete_recipe(&self, username: &str, slug: &str) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;
        let recipe_id = match state.recipe_id_by_slug(slug) {
            Ok(id) => id,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        state.links.remove(&(user_id, recipe_id));
        state.favorites.remove(&(user_id, recipe_id));
        state.notes.remove(&(user_id, recipe_id));
        Ok(())
    }

    async fn set_favorite(
        &self,
        username: &str,
        slug: &str,
        favorite: bool,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;
        let recipe_id = state.linked_recipe_id(user_id, slug)?;
        if favorite {
            if !state.favorites.contains_key(&(user_id, recipe_id)) {
                let seq = state.next_seq();
                state.favorites.insert((user_id, recipe_id), seq);
            }
        } else {
            state.favorites.remove(&(user_id, recipe_id));
        }
        Ok(())
    }

    async fn upsert_note(
        &self,
        username: &str,
        slug: &str,
        content: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;
        let recipe_id = state.linked_recipe_id(user_id, slug)?;
        state
            .notes
            .insert((user_id, recipe_id), content.to_string());
        Ok(())
    }

    async fn delete_note(&self, username: &str, slug: &str) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;
        let recipe_id = state.linked_recipe_id(user_id, slug)?;
        state.notes.remove(&(user_id, recipe_id));
        Ok(())
    }

    async fn create_password_reset(
        &self,
        username: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, RepositoryError> {
        if token_hash.is_empty() {
            return Err(RepositoryError::InvalidInput("token hash is required".into()));
        }
        let mut state = self.lock()?;
        let user_id = state.user_id(username)?;
        if state.resets.iter().any(|r| r.token_hash == token_hash) {
            return Err(RepositoryError::Conflict {
                entity: "password reset",
                key: token_hash.to_string(),
            });
        }
        let reset = PasswordReset {
            id: state.next_id(),
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            used_at: None,
        };
        state.resets.push(reset.clone());
        Ok(reset)
    }

    async fn consume_password_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        let reset = state
            .resets
            .iter_mut()
            .find(|r| r.token_hash == token_hash && r.used_at.is_none() && r.expires_at > now)
            .ok_or_else(|| RepositoryError::not_found("password reset", "token"))?;
        reset.used_at = Some(now);
        let user_id = reset.user_id;
        state
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("user", user_id.to_string()))
    }
}
