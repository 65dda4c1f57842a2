pub mod amount;
pub mod unit;

pub use amount::{format_amount, parse_amount, ParsedAmount};
pub use unit::split_unit;

use crate::model::IngredientDetail;
use crate::scaling::compose_display;

impl IngredientDetail {
    /// Normalize one free-text ingredient line.
    ///
    /// A unit is only split off when an amount was parsed, so lines such as
    /// "pinch of salt" keep their wording.
    pub fn from_line(line: &str) -> Self {
        let parsed = parse_amount(line);

        let (unit, description) = match parsed.value {
            Some(_) => split_unit(&parsed.remainder),
            None => (String::new(), parsed.remainder.clone()),
        };

        let amount_text = match parsed.value {
            Some(value) => format_amount(value),
            None => parsed.amount_text.trim().to_string(),
        };

        let description = description.trim().to_string();
        let display = compose_display(&amount_text, &unit, &description);

        IngredientDetail {
            base_amount_value: parsed.value,
            base_amount_text: amount_text.clone(),
            amount_value: parsed.value,
            amount_text,
            unit,
            description,
            display,
        }
    }

    /// Whether the line carries anything worth storing.
    pub fn is_meaningful(&self) -> bool {
        !self.description.trim().is_empty()
            || self.base_amount_value.is_some_and(|value| value != 0.0)
    }
}

/// Parse raw ingredient lines, dropping blank ones and bare zero amounts.
pub fn parse_ingredient_lines<S: AsRef<str>>(lines: &[S]) -> Vec<IngredientDetail> {
    lines
        .iter()
        .map(|line| IngredientDetail::from_line(line.as_ref()))
        .filter(IngredientDetail::is_meaningful)
        .collect()
}
