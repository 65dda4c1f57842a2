//! Leading unit detection for ingredient descriptions.

const TWO_WORD_UNITS: &[&str] = &[
    "fl oz",
    "fluid ounce",
    "fluid ounces",
];

const ONE_WORD_UNITS: &[&str] = &[
    "tsp",
    "tsps",
    "teaspoon",
    "teaspoons",
    "tbsp",
    "tbsps",
    "tbs",
    "tablespoon",
    "tablespoons",
    "cup",
    "cups",
    "oz",
    "ounce",
    "ounces",
    "lb",
    "lbs",
    "pound",
    "pounds",
    "g",
    "gram",
    "grams",
    "kg",
    "kilogram",
    "kilograms",
    "mg",
    "ml",
    "milliliter",
    "milliliters",
    "millilitre",
    "millilitres",
    "l",
    "liter",
    "liters",
    "litre",
    "litres",
    "pint",
    "pints",
    "pt",
    "quart",
    "quarts",
    "qt",
    "gallon",
    "gallons",
    "gal",
    "clove",
    "cloves",
    "pinch",
    "pinches",
    "dash",
    "dashes",
    "can",
    "cans",
    "package",
    "packages",
    "stick",
    "sticks",
    "slice",
    "slices",
    "sprig",
    "sprigs",
    "bunch",
    "bunches",
    "head",
    "heads",
    "handful",
    "handfuls",
    "drop",
    "drops",
];

/// Split a leading unit off `description`.
///
/// Returns `(unit, rest)` with the unit in its vocabulary spelling
/// (lowercase, abbreviation dots dropped, so `"Tbsp."` gives `"tbsp"`) and a
/// following `of` dropped (`"cups of flour"` gives `("cups", "flour")`).
/// Without a recognized unit the description comes back unchanged with an
/// empty unit.
pub fn split_unit(description: &str) -> (String, String) {
    let tokens: Vec<&str> = description.split_whitespace().collect();

    if let [first, second, ..] = tokens.as_slice() {
        let pair = format!("{} {}", normalize(first), normalize(second));
        if let Some(unit) = TWO_WORD_UNITS.iter().find(|unit| **unit == pair) {
            return (unit.to_string(), strip_of(&tokens[2..]));
        }
    }

    if let Some(first) = tokens.first() {
        let word = normalize(first);
        if let Some(unit) = ONE_WORD_UNITS.iter().find(|unit| **unit == word) {
            return (unit.to_string(), strip_of(&tokens[1..]));
        }
    }

    (String::new(), description.to_string())
}

fn normalize(token: &str) -> String {
    token.trim_end_matches('.').to_lowercase()
}

fn strip_of(rest: &[&str]) -> String {
    match rest {
        [first, tail @ ..] if first.eq_ignore_ascii_case("of") && !tail.is_empty() => {
            tail.join(" ")
        }
        _ => rest.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> (String, String) {
        split_unit(text)
    }

    #[test]
    fn test_one_word_units() {
        assert_eq!(split("cups sugar"), ("cups".into(), "sugar".into()));
        assert_eq!(split("tsp salt"), ("tsp".into(), "salt".into()));
        assert_eq!(split("Tbsp. olive oil"), ("tbsp".into(), "olive oil".into()));
        assert_eq!(split("LB. ground beef"), ("lb".into(), "ground beef".into()));
        assert_eq!(split("cloves garlic, minced"), ("cloves".into(), "garlic, minced".into()));
        assert_eq!(split("g butter"), ("g".into(), "butter".into()));
    }

    #[test]
    fn test_two_word_units() {
        assert_eq!(split("fl oz cream"), ("fl oz".into(), "cream".into()));
        assert_eq!(split("fluid ounces milk"), ("fluid ounces".into(), "milk".into()));
        assert_eq!(split("fl. oz. rum"), ("fl oz".into(), "rum".into()));
    }

    #[test]
    fn test_strips_of() {
        assert_eq!(split("cups of flour"), ("cups".into(), "flour".into()));
        assert_eq!(split("pinch of salt"), ("pinch".into(), "salt".into()));
    }

    #[test]
    fn test_no_unit() {
        assert_eq!(split("large eggs"), (String::new(), "large eggs".into()));
        assert_eq!(split(""), (String::new(), String::new()));
        // "of" alone is kept as the description
        assert_eq!(split("cup of"), ("cup".into(), "of".into()));
    }

    #[test]
    fn test_unit_alone() {
        assert_eq!(split("cup"), ("cup".into(), String::new()));
    }
}
