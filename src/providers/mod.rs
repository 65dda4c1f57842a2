mod open_ai;
mod prompt;

pub use open_ai::OpenAIProvider;
pub use prompt::{
    build_extraction_prompt, image_prompt, recipe_schema, EXTRACTION_SYSTEM_PROMPT,
};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::IngestError;
use crate::model::{Category, Recipe};

/// Structured recipe as returned by the AI service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedRecipe {
    pub title: String,
    pub description: String,
    pub instructions: Vec<String>,
    pub ingredients: Vec<String>,
    pub url: String,
    pub image: String,
    pub category: String,
    pub prep_time: i64,
    pub cook_time: i64,
    pub total_time: i64,
    pub servings: i64,
}

impl ExtractedRecipe {
    /// Convert into a [`Recipe`]; negative numbers from the model become 0.
    pub fn into_recipe(self) -> Recipe {
        let minutes = |value: i64| u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        let servings = minutes(self.servings);
        Recipe {
            title: self.title.trim().to_string(),
            description: self.description,
            category: Category::from_loose(&self.category),
            instructions: self.instructions,
            ingredients: self.ingredients,
            prep_time: minutes(self.prep_time),
            cook_time: minutes(self.cook_time),
            total_time: minutes(self.total_time),
            servings,
            original_servings: servings,
            image: self.image,
            ..Recipe::default()
        }
    }
}

/// AI service used for structured extraction and stand-in images
#[async_trait]
pub trait RecipeAi: Send + Sync {
    /// Get the provider name (e.g., "openai")
    fn provider_name(&self) -> &str;

    /// Extract a structured recipe from visible page text
    async fn extract_recipe(&self, page_text: &str) -> Result<ExtractedRecipe, IngestError>;

    /// Generate an image for `prompt` and return a URL it can be downloaded from
    async fn generate_image(&self, prompt: &str) -> Result<String, IngestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_recipe() {
        let extracted: ExtractedRecipe = serde_json::from_str(
            r#"{"title":" Pancakes ","category":"Breakfast","servings":4,"prepTime":-5,
                "ingredients":["2 eggs"],"instructions":["Mix"]}"#,
        )
        .unwrap();
        let recipe = extracted.into_recipe();
        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.category, Category::Breakfast);
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.original_servings, 4);
        assert_eq!(recipe.prep_time, 0);
        assert_eq!(recipe.ingredients, vec!["2 eggs"]);
    }

    #[test]
    fn test_unknown_category_is_other() {
        let extracted = ExtractedRecipe {
            category: "dessert".into(),
            ..ExtractedRecipe::default()
        };
        assert_eq!(extracted.into_recipe().category, Category::Other);
    }
}
