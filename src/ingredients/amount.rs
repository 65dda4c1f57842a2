//! Free-text ingredient amounts: parsing into numbers and formatting back
//! into recipe notation.

use regex::Regex;
use std::sync::LazyLock;

/// Denominators tried when rendering a fractional remainder.
const DENOMINATORS: [u32; 5] = [2, 3, 4, 8, 16];

static HYPHEN_MIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)\s*-\s*([0-9]+)\s*/\s*([0-9]+)\s*$")
        .expect("hyphenated fraction pattern is valid")
});

/// Result of splitting a leading amount off an ingredient line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAmount {
    /// Numeric value, absent when no amount could be parsed
    pub value: Option<f64>,
    /// The amount tokens as written in the source
    pub amount_text: String,
    /// Everything after the amount
    pub remainder: String,
}

impl ParsedAmount {
    fn unparsed(text: &str) -> Self {
        ParsedAmount {
            value: None,
            amount_text: String::new(),
            remainder: text.to_string(),
        }
    }
}

/// Parse a leading amount from `input`.
///
/// Accepts integers, decimals, `N/D` fractions, unicode vulgar fractions
/// (alone or attached to digits, as in `1½`), mixed numbers (`1 1/2`) and
/// hyphenated mixed numbers (`1-1/2`). If no amount parses, the whole
/// trimmed input is returned as the remainder.
pub fn parse_amount(input: &str) -> ParsedAmount {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ParsedAmount::unparsed("");
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    // (field index, token) for each numeric-looking token in the leading run
    let mut run: Vec<(usize, &str)> = Vec::new();
    let mut idx = 0;

    while idx < fields.len() {
        let token = trim_delimiters(fields[idx]);
        if token.is_empty() {
            idx += 1;
            continue;
        }
        if token == "-" && !run.is_empty() {
            break;
        }
        if looks_numeric(token) {
            run.push((idx, token));
            idx += 1;
            continue;
        }
        break;
    }

    if run.is_empty() {
        return ParsedAmount::unparsed(trimmed);
    }

    let tokens: Vec<&str> = run.iter().map(|(_, token)| *token).collect();
    match parse_amount_tokens(&tokens) {
        Some((value, used)) => {
            // Tokens of the run that did not make it into the amount stay in
            // the remainder, e.g. the "Tbsp." of "1 Tbsp. oil".
            let rest = run.get(used).map_or(idx, |(field, _)| *field);
            ParsedAmount {
                value: Some(value),
                amount_text: tokens[..used].join(" "),
                remainder: fields[rest..].join(" "),
            }
        }
        None => ParsedAmount::unparsed(trimmed),
    }
}

/// Render `value` the way recipes write amounts: `"1 1/2"`, `"3/4"`, `"2"`.
///
/// Non-positive values render as an empty string. The fractional part is
/// snapped to the closest of halves, thirds, quarters, eighths and sixteenths.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return String::new();
    }

    let mut whole = value.floor();
    let frac = value - whole;

    if frac < 1e-6 {
        return format!("{}", whole as u64);
    }

    let mut best_num = 0u32;
    let mut best_den = 1u32;
    let mut min_diff = f64::MAX;

    for den in DENOMINATORS {
        let num = (frac * den as f64).round() as u32;
        let diff = (frac - num as f64 / den as f64).abs();
        if diff < min_diff {
            min_diff = diff;
            best_num = num;
            best_den = den;
        }
    }

    if best_num == 0 {
        return format!("{:.2}", value);
    }

    let g = gcd(best_num, best_den);
    best_num /= g;
    best_den /= g;

    if best_num == best_den {
        whole += 1.0;
        return format!("{}", whole as u64);
    }

    if whole < 1e-6 {
        return format!("{}/{}", best_num, best_den);
    }

    format!("{} {}/{}", whole as u64, best_num, best_den)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn trim_delimiters(token: &str) -> &str {
    token.trim_matches(|c| matches!(c, ',' | '(' | ')'))
}

/// Whether a token could be (part of) an amount.
fn looks_numeric(token: &str) -> bool {
    token
        .chars()
        .any(|c| c.is_ascii_digit() || c == '/' || c == '.' || is_unicode_fraction(c))
}

pub(crate) fn is_unicode_fraction(c: char) -> bool {
    unicode_fraction_value(c).is_some()
}

/// Exact value of a unicode vulgar fraction glyph.
pub(crate) fn unicode_fraction_value(c: char) -> Option<f64> {
    let value = match c {
        '¼' => 0.25,
        '½' => 0.5,
        '¾' => 0.75,
        '⅐' => 1.0 / 7.0,
        '⅑' => 1.0 / 9.0,
        '⅒' => 0.1,
        '⅓' => 1.0 / 3.0,
        '⅔' => 2.0 / 3.0,
        '⅕' => 0.2,
        '⅖' => 0.4,
        '⅗' => 0.6,
        '⅘' => 0.8,
        '⅙' => 1.0 / 6.0,
        '⅚' => 5.0 / 6.0,
        '⅛' => 0.125,
        '⅜' => 0.375,
        '⅝' => 0.625,
        '⅞' => 0.875,
        _ => return None,
    };
    Some(value)
}

/// Value of the leading run and how many of its tokens it consumed.
fn parse_amount_tokens(tokens: &[&str]) -> Option<(f64, usize)> {
    match tokens {
        [] => None,
        [first, second] => {
            let whole = parse_single_token(first)?;
            let combinable = second.contains('/')
                || second.contains('.')
                || second.chars().next().is_some_and(is_unicode_fraction);
            match parse_single_token(second) {
                Some(fraction) if combinable => Some((whole + fraction, 2)),
                _ => Some((whole, 1)),
            }
        }
        // One token, or more than two: only the first one is the amount
        [first, ..] => parse_single_token(first).map(|value| (value, 1)),
    }
}

fn parse_single_token(token: &str) -> Option<f64> {
    let normalized = trim_delimiters(token);
    if normalized.is_empty() {
        return None;
    }

    if let Some(caps) = HYPHEN_MIXED.captures(normalized) {
        let whole: f64 = caps[1].parse().ok()?;
        let num: f64 = caps[2].parse().ok()?;
        let den: f64 = caps[3].parse().ok()?;
        if den != 0.0 {
            return Some(whole + num / den);
        }
    }

    // Digits with an attached glyph, e.g. "1½", "2¾"
    if let Some(frac) = normalized.chars().find_map(unicode_fraction_value) {
        let digits: String = normalized
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let whole = if digits.is_empty() {
            0.0
        } else {
            digits.parse::<f64>().unwrap_or(0.0)
        };
        return Some(whole + frac);
    }

    if normalized.contains('/') {
        let (num, den) = normalized.split_once('/')?;
        if den.contains('/') {
            return None;
        }
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return finite(num / den);
    }

    normalized.parse::<f64>().ok().and_then(finite)
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(text: &str) -> Option<f64> {
        parse_amount(text).value
    }

    #[test]
    fn test_parse_integer_and_decimal() {
        let parsed = parse_amount("2 eggs");
        assert_eq!(parsed.value, Some(2.0));
        assert_eq!(parsed.amount_text, "2");
        assert_eq!(parsed.remainder, "eggs");

        assert_eq!(value_of("0.5 cup milk"), Some(0.5));
    }

    #[test]
    fn test_parse_fraction_and_mixed_number() {
        assert_eq!(value_of("3/4 cup sugar"), Some(0.75));

        let parsed = parse_amount("2 1/2 cups flour");
        assert_eq!(parsed.value, Some(2.5));
        assert_eq!(parsed.amount_text, "2 1/2");
        assert_eq!(parsed.remainder, "cups flour");
    }

    #[test]
    fn test_parse_unicode_fractions() {
        let parsed = parse_amount("1½ cups sugar");
        assert_eq!(parsed.value, Some(1.5));
        assert_eq!(parsed.remainder, "cups sugar");

        assert_eq!(value_of("¾ tsp salt"), Some(0.75));
        assert_eq!(value_of("2 ¼ cups water"), Some(2.25));
        let third = value_of("⅓ cup oil").unwrap();
        assert!((third - 1.0 / 3.0).abs() < 1e-9);
        let five_sixths = value_of("⅚ cup").unwrap();
        assert!((five_sixths - 5.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_hyphenated_mixed_fraction() {
        let parsed = parse_amount("1-1/2 tsp salt");
        assert_eq!(parsed.value, Some(1.5));
        assert_eq!(parsed.remainder, "tsp salt");
    }

    #[test]
    fn test_lone_dash_stops_amount() {
        let parsed = parse_amount("2 - 3 eggs");
        assert_eq!(parsed.value, Some(2.0));
        assert_eq!(parsed.amount_text, "2");
        assert_eq!(parsed.remainder, "- 3 eggs");
    }

    #[test]
    fn test_second_integer_not_combined() {
        let parsed = parse_amount("2 3 eggs");
        assert_eq!(parsed.value, Some(2.0));
        assert_eq!(parsed.amount_text, "2");
        assert_eq!(parsed.remainder, "3 eggs");

        let parsed = parse_amount("1 2 3 eggs");
        assert_eq!(parsed.amount_text, "1");
        assert_eq!(parsed.remainder, "2 3 eggs");
    }

    #[test]
    fn test_abbreviated_unit_stays_in_remainder() {
        let parsed = parse_amount("1 Tbsp. olive oil");
        assert_eq!(parsed.value, Some(1.0));
        assert_eq!(parsed.amount_text, "1");
        assert_eq!(parsed.remainder, "Tbsp. olive oil");

        let parsed = parse_amount("2 lb. ground beef");
        assert_eq!(parsed.value, Some(2.0));
        assert_eq!(parsed.remainder, "lb. ground beef");
    }

    #[test]
    fn test_unparseable_amount_becomes_description() {
        let parsed = parse_amount("salt to taste");
        assert_eq!(parsed.value, None);
        assert_eq!(parsed.amount_text, "");
        assert_eq!(parsed.remainder, "salt to taste");

        let parsed = parse_amount("350g flour");
        assert_eq!(parsed.value, None);
        assert_eq!(parsed.remainder, "350g flour");

        let parsed = parse_amount("1/0 cup");
        assert_eq!(parsed.value, None);

        assert_eq!(parse_amount("   ").remainder, "");
    }

    #[test]
    fn test_parenthesized_amount() {
        let parsed = parse_amount("(2) lemons, juiced");
        assert_eq!(parsed.value, Some(2.0));
        assert_eq!(parsed.remainder, "lemons, juiced");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "");
        assert_eq!(format_amount(-1.0), "");
        assert_eq!(format_amount(2.0), "2");
        assert_eq!(format_amount(0.5), "1/2");
        assert_eq!(format_amount(1.25), "1 1/4");
        assert_eq!(format_amount(2.75), "2 3/4");
        assert_eq!(format_amount(1.0 / 3.0), "1/3");
        assert_eq!(format_amount(0.0625), "1/16");
        assert_eq!(format_amount(3.375), "3 3/8");
    }

    #[test]
    fn test_format_amount_edges() {
        // Snaps up into the next whole number
        assert_eq!(format_amount(0.99), "1");
        assert_eq!(format_amount(2.999), "3");
        // Too small for any supported fraction
        assert_eq!(format_amount(1.01), "1.01");
        assert_eq!(format_amount(f64::NAN), "");
    }

    #[test]
    fn test_round_trip_sixteenths() {
        for sixteenths in 1..=64 {
            let value = sixteenths as f64 / 16.0;
            let text = format_amount(value);
            let parsed = parse_amount(&text).value.unwrap();
            assert!(
                (parsed - value).abs() < 1e-6,
                "{value} formatted as {text:?} parsed back as {parsed}"
            );
        }
    }
}
