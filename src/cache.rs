//! In-process TTL caches for recipe reads.
//!
//! Writes never update cached values in place; they delete the affected keys
//! so the next read goes back to the repository.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::model::{Category, Recipe};
use crate::repository::Repository;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A string-keyed cache whose entries expire after a per-entry TTL
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        TtlCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        // A poisoned cache only ever holds stale reads; keep serving it.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get a live entry, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.lock().insert(key.into(), entry);
    }

    pub fn delete(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Delete every key starting with `prefix`; returns how many were removed.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Drop all expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn single_recipe_key(username: &str, slug: &str) -> String {
    format!("recipe:{}:{}", username, slug)
}

pub fn recipe_list_key(username: &str, category: Option<Category>) -> String {
    match category {
        Some(category) => format!("recipes:{}:{}", username, category),
        None => format!("recipes:{}:all", username),
    }
}

/// The two recipe caches shared by the read path and the queue workers
pub struct RecipeCaches {
    recipes: TtlCache<Recipe>,
    lists: TtlCache<Vec<Recipe>>,
    recipe_ttl: Duration,
    list_ttl: Duration,
}

impl RecipeCaches {
    pub fn new(config: &CacheConfig) -> Self {
        RecipeCaches {
            recipes: TtlCache::new(),
            lists: TtlCache::new(),
            recipe_ttl: Duration::from_secs(config.recipe_ttl_secs),
            list_ttl: Duration::from_secs(config.list_ttl_secs),
        }
    }

    pub fn get_recipe(&self, username: &str, slug: &str) -> Option<Recipe> {
        let key = single_recipe_key(username, slug);
        let hit = self.recipes.get(&key);
        if hit.is_some() {
            debug!("Cache hit for {}", key);
        }
        hit
    }

    pub fn put_recipe(&self, username: &str, slug: &str, recipe: Recipe) {
        self.recipes
            .set(single_recipe_key(username, slug), recipe, self.recipe_ttl);
    }

    pub fn get_list(&self, username: &str, category: Option<Category>) -> Option<Vec<Recipe>> {
        let key = recipe_list_key(username, category);
        let hit = self.lists.get(&key);
        if hit.is_some() {
            debug!("Cache hit for {}", key);
        }
        hit
    }

    pub fn put_list(&self, username: &str, category: Option<Category>, recipes: Vec<Recipe>) {
        self.lists
            .set(recipe_list_key(username, category), recipes, self.list_ttl);
    }

    /// Invalidate one recipe and every listing of its user.
    pub fn invalidate_recipe(&self, username: &str, slug: &str) {
        self.recipes.delete(&single_recipe_key(username, slug));
        self.invalidate_user_lists(username);
    }

    pub fn invalidate_user_lists(&self, username: &str) {
        let removed = self.lists.delete_prefix(&format!("recipes:{}:", username));
        debug!("Invalidated {} cached listing(s) for {}", removed, username);
    }

    /// Invalidate a shared recipe for every user linked to it.
    ///
    /// `username` is always invalidated, even when the link lookup fails.
    pub async fn invalidate_linked(&self, repo: &dyn Repository, username: &str, slug: &str) {
        self.invalidate_recipe(username, slug);
        match repo.linked_usernames(slug).await {
            Ok(usernames) => {
                for other in usernames.iter().filter(|other| other.as_str() != username) {
                    self.invalidate_recipe(other, slug);
                }
            }
            Err(e) => warn!("Failed to list users linked to {}: {}", slug, e),
        }
    }

    /// Drop expired entries from both caches.
    pub fn purge_expired(&self) -> usize {
        let removed = self.recipes.purge_expired() + self.lists.purge_expired();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.recipes.len() + self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
