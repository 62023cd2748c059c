// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quantity strings: parsing into a value and a canonical unit, and
//! rendering back for display.

use std::sync::LazyLock;

use regex::Regex;

/// A parsed quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    pub value: f64,
    /// Canonical unit, an opaque label, or empty for a bare count.
    pub unit: String,
}

/// Unit synonyms (English and Spanish), the canonical unit they fold to,
/// and the factor that converts into it.
const UNITS: &[(&[&str], &str, f64)] = &[
    (&["g", "gr", "grs", "gram", "grams", "gramme", "grammes", "gramo", "gramos"], "g", 1.0),
    (&["kg", "kgs", "kilo", "kilos", "kilogram", "kilograms", "kilogramo", "kilogramos"], "g", 1000.0),
    (&["lb", "lbs", "pound", "pounds", "libra", "libras"], "g", 453.59),
    (&["oz", "ounce", "ounces", "onza", "onzas"], "g", 28.35),
    (&["ml", "milliliter", "milliliters", "millilitre", "millilitres", "mililitro", "mililitros"], "ml", 1.0),
    (&["l", "lt", "lts", "liter", "liters", "litre", "litres", "litro", "litros"], "ml", 1000.0),
    (&["cup", "cups", "taza", "tazas"], "cup", 1.0),
    (&["tbsp", "tablespoon", "tablespoons", "cucharada", "cucharadas"], "tbsp", 1.0),
    (&["tsp", "teaspoon", "teaspoons", "cucharadita", "cucharaditas"], "tsp", 1.0),
    (&["piece", "pieces", "pc", "pcs", "pieza", "piezas", "unit", "units", "unidad", "unidades"], "piece", 1.0),
    (&["clove", "cloves", "diente", "dientes"], "clove", 1.0),
    (&["can", "cans", "lata", "latas"], "can", 1.0),
    (&["slice", "slices", "rebanada", "rebanadas"], "slice", 1.0),
    (&["pinch", "pinches", "pizca", "pizcas"], "pinch", 1.0),
];

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^\s*(?:
            (?P<mixed_whole>\d+)\s+(?P<mixed_num>\d+)\s*/\s*(?P<mixed_den>\d+)
          | (?P<num>\d+)\s*/\s*(?P<den>\d+)
          | (?P<vulgar_whole>\d+)?\s*(?P<vulgar>[½¼¾⅓⅔⅛])
          | (?P<decimal>\d+(?:[.,]\d+)?)
        )\s*(?P<rest>.*?)\s*$",
    )
    .unwrap()
});

/// Looks up a unit word. Returns the canonical unit and conversion factor.
pub fn lookup_unit(word: &str) -> Option<(&'static str, f64)> {
    let word = word.trim().trim_end_matches('.').to_lowercase();
    UNITS
        .iter()
        .find(|(synonyms, _, _)| synonyms.contains(&word.as_str()))
        .map(|(_, canonical, factor)| (*canonical, *factor))
}

fn vulgar_value(c: char) -> f64 {
    match c {
        '½' => 0.5,
        '¼' => 0.25,
        '¾' => 0.75,
        '⅓' => 1.0 / 3.0,
        '⅔' => 2.0 / 3.0,
        '⅛' => 0.125,
        _ => 0.0,
    }
}

fn fraction(num: &str, den: &str) -> Option<f64> {
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    (den != 0.0).then(|| num / den)
}

/// Parses the leading quantity of `text`.
fn leading_quantity(text: &str) -> Option<(f64, String)> {
    let caps = QUANTITY.captures(text)?;
    let group = |name: &str| caps.name(name).map(|m| m.as_str());

    let value = if let (Some(whole), Some(num), Some(den)) =
        (group("mixed_whole"), group("mixed_num"), group("mixed_den"))
    {
        whole.parse::<f64>().ok()? + fraction(num, den)?
    } else if let (Some(num), Some(den)) = (group("num"), group("den")) {
        fraction(num, den)?
    } else if let Some(vulgar) = group("vulgar") {
        let whole = group("vulgar_whole")
            .and_then(|w| w.parse::<f64>().ok())
            .unwrap_or(0.0);
        whole + vulgar.chars().next().map(vulgar_value).unwrap_or(0.0)
    } else {
        group("decimal")?.replace(',', ".").parse().ok()?
    };

    Some((value, group("rest").unwrap_or_default().to_string()))
}

/// Decomposes a free-text quantity into a value and a canonical unit.
///
/// Known units are folded to `g`, `ml`, or a count word, scaling mass and
/// volume into grams and milliliters. A number followed by unknown text keeps
/// the number and the lowercased text as an opaque unit. Text without a
/// leading number is kept verbatim as the unit with a value of zero.
pub fn parse_amount(text: &str) -> Amount {
    let trimmed = text.trim();
    let Some((value, rest)) = leading_quantity(trimmed) else {
        return Amount {
            value: 0.0,
            unit: trimmed.to_string(),
        };
    };

    if rest.is_empty() {
        return Amount {
            value,
            unit: String::new(),
        };
    }

    let first_word = rest.split_whitespace().next().unwrap_or_default();
    match lookup_unit(first_word) {
        Some((canonical, factor)) => Amount {
            value: value * factor,
            unit: canonical.to_string(),
        },
        None => Amount {
            value,
            unit: rest.to_lowercase(),
        },
    }
}

/// Renders a number with at most `decimals` places and no trailing zeros.
fn format_number(value: f64, decimals: usize) -> String {
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Renders a value and unit for display.
///
/// Grams at or above 1000 render as kilograms, milliliters at or above 1000
/// as liters, both with one decimal place and no trailing ".0".
pub fn format_amount(value: f64, unit: &str) -> String {
    match unit {
        "g" if value >= 1000.0 => format!("{} kg", format_number(value / 1000.0, 1)),
        "ml" if value >= 1000.0 => format!("{} l", format_number(value / 1000.0, 1)),
        "" => format_number(value, 2),
        _ if value == 0.0 => unit.to_string(),
        _ => format!("{} {unit}", format_number(value, 2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(value: f64, unit: &str) -> Amount {
        Amount {
            value,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn kilograms_fold_to_grams() {
        assert_eq!(parse_amount("1.5 kg"), amount(1500.0, "g"));
        assert_eq!(parse_amount("2 kilos"), amount(2000.0, "g"));
    }

    #[test]
    fn fractions_and_mixed_numbers() {
        assert_eq!(parse_amount("1/2 kg"), amount(500.0, "g"));
        assert_eq!(parse_amount("1 1/2 cups"), amount(1.5, "cup"));
        assert_eq!(parse_amount("½ taza"), amount(0.5, "cup"));
        assert_eq!(parse_amount("2¼ tsp"), amount(2.25, "tsp"));
    }

    #[test]
    fn no_space_between_number_and_unit() {
        assert_eq!(parse_amount("500g"), amount(500.0, "g"));
        assert_eq!(parse_amount("250ml"), amount(250.0, "ml"));
    }

    #[test]
    fn spanish_units_and_decimal_comma() {
        assert_eq!(parse_amount("1,5 litros"), amount(1500.0, "ml"));
        assert_eq!(parse_amount("3 dientes"), amount(3.0, "clove"));
        assert_eq!(parse_amount("2 cucharadas"), amount(2.0, "tbsp"));
    }

    #[test]
    fn imperial_mass_converts() {
        let lb = parse_amount("1 lb");
        assert_eq!(lb.unit, "g");
        assert!((lb.value - 453.59).abs() < 1e-9);
        let oz = parse_amount("2 oz");
        assert!((oz.value - 56.7).abs() < 1e-9);
    }

    #[test]
    fn bare_count_has_empty_unit() {
        assert_eq!(parse_amount("3"), amount(3.0, ""));
    }

    #[test]
    fn unknown_word_is_opaque_unit() {
        assert_eq!(parse_amount("2 Handfuls"), amount(2.0, "handfuls"));
        assert_eq!(parse_amount("1 tbsp."), amount(1.0, "tbsp"));
    }

    #[test]
    fn unparsable_text_passes_through() {
        assert_eq!(parse_amount("to taste"), amount(0.0, "to taste"));
        assert_eq!(parse_amount("  "), amount(0.0, ""));
        assert_eq!(parse_amount("1/0 cup"), amount(0.0, "1/0 cup"));
    }

    #[test]
    fn rendering_rescales_at_one_thousand() {
        assert_eq!(format_amount(1500.0, "g"), "1.5 kg");
        assert_eq!(format_amount(1000.0, "g"), "1 kg");
        assert_eq!(format_amount(999.0, "g"), "999 g");
        assert_eq!(format_amount(1000.0, "ml"), "1 l");
        assert_eq!(format_amount(2300.0, "ml"), "2.3 l");
    }

    #[test]
    fn rendering_other_units() {
        assert_eq!(format_amount(1.5, "cup"), "1.5 cup");
        assert_eq!(format_amount(3.0, ""), "3");
        assert_eq!(format_amount(0.0, "to taste"), "to taste");
        assert_eq!(format_amount(1.0 / 3.0, "cup"), "0.33 cup");
    }
}
