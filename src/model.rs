use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest error message kept on a queue item.
pub const MAX_ERROR_LEN: usize = 1024;

/// Recipe category as constrained by the extraction schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Breakfast,
    Dinner,
    Baking,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Breakfast => "breakfast",
            Category::Dinner => "dinner",
            Category::Baking => "baking",
            Category::Other => "other",
        }
    }

    /// Lenient parse used for AI output: anything unknown is `Other`.
    pub fn from_loose(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Category::Breakfast),
            "dinner" => Ok(Category::Dinner),
            "baking" => Ok(Category::Baking),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// A named dish record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Ingredient lines as extracted, or display strings once parsed
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parsed_ingredients: Vec<IngredientDetail>,
    #[serde(default)]
    pub prep_time: u32,
    #[serde(default)]
    pub cook_time: u32,
    #[serde(default)]
    pub total_time: u32,
    #[serde(default)]
    pub servings: u32,
    /// Baseline for scaling; 0 means "not yet resolved"
    #[serde(default)]
    pub original_servings: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub original_url: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Recipe {
    /// Minimal stub shown to the user when full extraction is not possible
    pub fn placeholder(title: impl Into<String>, original_url: impl Into<String>) -> Self {
        Recipe {
            title: title.into(),
            original_url: original_url.into(),
            ..Recipe::default()
        }
    }

    /// Internal link path for a recipe stored under `slug`
    pub fn link_for(category: Category, slug: &str) -> String {
        format!("/recipes/{}/{}", category, slug)
    }
}

/// One structured ingredient line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientDetail {
    /// Value as originally extracted; never changed by scaling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_amount_value: Option<f64>,
    /// Original amount text, used when no numeric value exists
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_amount_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_value: Option<f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub amount_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
    pub description: String,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// One pending or completed extraction job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: u64,
    pub user_id: u64,
    /// Owning username; `None` when the user record no longer exists
    pub username: Option<String>,
    pub url: String,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none()
    }
}

/// Cut `message` to at most [`MAX_ERROR_LEN`] bytes on a char boundary.
pub fn truncate_error(message: &str) -> String {
    if message.len() <= MAX_ERROR_LEN {
        return message.to_string();
    }
    let mut end = MAX_ERROR_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: u64,
}

/// Fields a user may change on an existing recipe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub instructions: Option<Vec<String>>,
    pub category: Option<Category>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.instructions.is_none() && self.category.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub id: u64,
    pub user_id: u64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("Dinner".parse::<Category>(), Ok(Category::Dinner));
        assert_eq!(Category::from_loose(" baking "), Category::Baking);
        assert_eq!(Category::from_loose("dessert"), Category::Other);
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&Category::Breakfast).unwrap();
        assert_eq!(json, "\"breakfast\"");
    }

    #[test]
    fn test_link_for() {
        assert_eq!(
            Recipe::link_for(Category::Baking, "banana-bread"),
            "/recipes/baking/banana-bread"
        );
    }

    #[test]
    fn test_truncate_error_respects_char_boundary() {
        let long = "é".repeat(MAX_ERROR_LEN);
        let truncated = truncate_error(&long);
        assert!(truncated.len() <= MAX_ERROR_LEN);
        assert!(truncated.chars().all(|c| c == 'é'));

        assert_eq!(truncate_error("short"), "short");
    }

    #[test]
    fn test_placeholder() {
        let recipe = Recipe::placeholder("Pasta", "https://example.com/pasta");
        assert_eq!(recipe.title, "Pasta");
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.instructions.is_empty());
        assert_eq!(recipe.category, Category::Other);
    }
}
