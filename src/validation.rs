use crate::model::Recipe;

/// Whether an extracted recipe carries enough data to be stored as-is.
///
/// Requires a non-blank title, at least one ingredient entry with text or an
/// amount, and at least one non-blank instruction step. Anything less is
/// stored as a placeholder instead.
pub fn is_complete(recipe: &Recipe) -> bool {
    if recipe.title.trim().is_empty() {
        return false;
    }
    if recipe.ingredients.is_empty() && recipe.parsed_ingredients.is_empty() {
        return false;
    }
    if recipe.instructions.is_empty() {
        return false;
    }

    let ingredient_valid = recipe.ingredients.iter().any(|line| !line.trim().is_empty())
        || recipe.parsed_ingredients.iter().any(|detail| {
            !detail.description.trim().is_empty()
                || !detail.amount_text.trim().is_empty()
                || detail.amount_value.is_some()
        });

    let instructions_valid = recipe.instructions.iter().any(|step| !step.trim().is_empty());

    ingredient_valid && instructions_valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IngredientDetail;

    fn recipe(title: &str, ingredients: &[&str], instructions: &[&str]) -> Recipe {
        Recipe {
            title: title.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            instructions: instructions.iter().map(|s| s.to_string()).collect(),
            ..Recipe::default()
        }
    }

    #[test]
    fn test_missing_ingredients_is_incomplete() {
        assert!(!is_complete(&recipe("Soup", &[], &["boil"])));
        assert!(is_complete(&recipe("Soup", &["1 cup water"], &["boil"])));
    }

    #[test]
    fn test_blank_title_is_incomplete() {
        assert!(!is_complete(&recipe("   ", &["1 cup water"], &["boil"])));
    }

    #[test]
    fn test_blank_entries_are_incomplete() {
        assert!(!is_complete(&recipe("Soup", &["  ", ""], &["boil"])));
        assert!(!is_complete(&recipe("Soup", &["1 cup water"], &[" "])));
        assert!(!is_complete(&recipe("Soup", &["1 cup water"], &[])));
    }

    #[test]
    fn test_parsed_ingredients_count() {
        let mut soup = recipe("Soup", &[], &["boil"]);
        soup.parsed_ingredients = vec![IngredientDetail {
            amount_value: Some(2.0),
            ..IngredientDetail::default()
        }];
        assert!(is_complete(&soup));
    }
}
