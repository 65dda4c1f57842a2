//! Serving-size scaling of stored recipes.

use crate::ingredients::format_amount;
use crate::model::Recipe;

/// Requested scaling; a target serving count wins over a raw factor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScaleRequest {
    pub servings: Option<f64>,
    pub factor: Option<f64>,
}

impl ScaleRequest {
    pub fn servings(servings: f64) -> Self {
        ScaleRequest {
            servings: Some(servings),
            factor: None,
        }
    }

    pub fn factor(factor: f64) -> Self {
        ScaleRequest {
            servings: None,
            factor: Some(factor),
        }
    }

    /// Resolve the multiplier against a baseline, plus the new serving count.
    fn resolve(&self, baseline: u32) -> (f64, Option<u32>) {
        if let Some(target) = self.servings.filter(|v| v.is_finite() && *v > 0.0) {
            if baseline > 0 {
                return (target / baseline as f64, Some(target.round() as u32));
            }
        }
        if let Some(factor) = self.factor.filter(|v| v.is_finite() && *v > 0.0) {
            let servings = (baseline > 0).then(|| (baseline as f64 * factor).round() as u32);
            return (factor, servings);
        }
        (1.0, None)
    }
}

/// Recompute every ingredient amount of `recipe` for the requested size.
///
/// The baseline is `original_servings`, seeded from `servings` the first time
/// so repeated calls stay relative to the real original. Ingredients without
/// a base value keep their base text. Base fields are never touched, and the
/// returned factor is the multiplier that was applied.
pub fn scale(recipe: &mut Recipe, request: ScaleRequest) -> f64 {
    if recipe.original_servings == 0 {
        recipe.original_servings = recipe.servings;
    }
    let baseline = recipe.original_servings;

    let (factor, servings) = request.resolve(baseline);
    if let Some(servings) = servings {
        recipe.servings = servings;
    }

    if recipe.parsed_ingredients.is_empty() {
        return factor;
    }

    for detail in &mut recipe.parsed_ingredients {
        match detail.base_amount_value {
            Some(base) => {
                let scaled = base * factor;
                detail.amount_value = Some(scaled);
                detail.amount_text = format_amount(scaled);
            }
            None => {
                detail.amount_value = None;
                detail.amount_text = detail.base_amount_text.clone();
            }
        }
        detail.display = compose_display(&detail.amount_text, &detail.unit, &detail.description);
    }

    recipe.ingredients = recipe
        .parsed_ingredients
        .iter()
        .map(|detail| detail.display.clone())
        .collect();

    factor
}

/// Fill in missing display strings and mirror them into `ingredients`.
pub fn ensure_displays(recipe: &mut Recipe) {
    if recipe.parsed_ingredients.is_empty() {
        return;
    }

    for detail in &mut recipe.parsed_ingredients {
        if detail.display.trim().is_empty() {
            let amount = if detail.amount_text.is_empty() {
                &detail.base_amount_text
            } else {
                &detail.amount_text
            };
            detail.display = compose_display(amount, &detail.unit, &detail.description);
        }
    }

    recipe.ingredients = recipe
        .parsed_ingredients
        .iter()
        .map(|detail| detail.display.trim().to_string())
        .collect();
}

/// Join the non-empty parts with single spaces.
pub fn compose_display(amount: &str, unit: &str, description: &str) -> String {
    [amount, unit, description]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::parse_ingredient_lines;

    fn soup() -> Recipe {
        let lines = ["1 1/2 cups stock", "2 carrots", "salt to taste"];
        let parsed = parse_ingredient_lines(&lines);
        Recipe {
            title: "Soup".into(),
            servings: 4,
            ingredients: parsed.iter().map(|d| d.display.clone()).collect(),
            parsed_ingredients: parsed,
            ..Recipe::default()
        }
    }

    #[test]
    fn test_scale_by_servings() {
        let mut recipe = soup();
        let factor = scale(&mut recipe, ScaleRequest::servings(8.0));
        assert_eq!(factor, 2.0);
        assert_eq!(recipe.servings, 8);
        assert_eq!(recipe.original_servings, 4);
        assert_eq!(recipe.ingredients, vec!["3 cups stock", "4 carrots", "salt to taste"]);
    }

    #[test]
    fn test_repeated_scaling_uses_original_baseline() {
        let mut recipe = soup();
        scale(&mut recipe, ScaleRequest::servings(8.0));
        scale(&mut recipe, ScaleRequest::servings(2.0));
        assert_eq!(recipe.servings, 2);
        assert_eq!(recipe.parsed_ingredients[0].amount_text, "3/4");
        assert_eq!(recipe.parsed_ingredients[0].base_amount_value, Some(1.5));
    }

    #[test]
    fn test_scale_by_factor_updates_servings() {
        let mut recipe = soup();
        scale(&mut recipe, ScaleRequest::factor(0.5));
        assert_eq!(recipe.servings, 2);
        assert_eq!(recipe.ingredients[1], "1 carrots");
    }

    #[test]
    fn test_servings_without_baseline_is_noop() {
        let mut recipe = soup();
        recipe.servings = 0;
        let factor = scale(&mut recipe, ScaleRequest::servings(6.0));
        assert_eq!(factor, 1.0);
        assert_eq!(recipe.servings, 0);
        assert_eq!(recipe.ingredients[0], "1 1/2 cups stock");
    }

    #[test]
    fn test_invalid_requests_ignored() {
        let mut recipe = soup();
        let factor = scale(
            &mut recipe,
            ScaleRequest {
                servings: Some(-2.0),
                factor: Some(f64::NAN),
            },
        );
        assert_eq!(factor, 1.0);
        assert_eq!(recipe.servings, 4);
    }

    #[test]
    fn test_ensure_displays_fills_gaps() {
        let mut recipe = soup();
        recipe.parsed_ingredients[1].display.clear();
        recipe.ingredients.clear();
        ensure_displays(&mut recipe);
        assert_eq!(recipe.ingredients.len(), 3);
        assert_eq!(recipe.ingredients[1], "2 carrots");
    }

    #[test]
    fn test_compose_display() {
        assert_eq!(compose_display(" 2 ", "", "eggs "), "2 eggs");
        assert_eq!(compose_display("", "", ""), "");
        assert_eq!(compose_display("1/2", "cup", "milk"), "1/2 cup milk");
    }
}
