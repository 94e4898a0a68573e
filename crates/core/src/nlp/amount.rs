use regex::Regex;
use std::sync::OnceLock;

const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;

const NUMBER: &str = r"([0-9][0-9,]*\.?[0-9]*)";
// Units end at a word boundary and keywords start at one, so "later" is not a lakh
// and "before" is not "for".
const UNIT: &str = r"(?:(lakhs|lakh|lacs|lac|crores|crore|cr|l)\b)?";

static CONTEXT_PATTERN: OnceLock<Regex> = OnceLock::new();
static RUPEE_PATTERN: OnceLock<Regex> = OnceLock::new();
static RS_PATTERN: OnceLock<Regex> = OnceLock::new();
static UNIT_PATTERN: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static amount pattern is valid")
}

fn context_pattern() -> &'static Regex {
    CONTEXT_PATTERN.get_or_init(|| {
        compile(&format!(
            r"(?i)\b(?:for|budget|cost|amount)\s*(?:of|is|=|:)?\s*(₹|\brs|\binr)?\s*{NUMBER}\s*{UNIT}"
        ))
    })
}

fn rupee_pattern() -> &'static Regex {
    RUPEE_PATTERN.get_or_init(|| compile(&format!(r"(?i)₹\s*{NUMBER}\s*{UNIT}")))
}

fn rs_pattern() -> &'static Regex {
    RS_PATTERN.get_or_init(|| compile(&format!(r"(?i)\b(?:rs|inr)\s*{NUMBER}\s*{UNIT}")))
}

fn unit_pattern() -> &'static Regex {
    UNIT_PATTERN.get_or_init(|| {
        compile(&format!(
            r"(?i){NUMBER}\s*(lakhs|lakh|lacs|lac|crores|crore|cr|l)\b"
        ))
    })
}

/// Finds the goal amount in rupees. Each pattern is tried in priority order and only
/// its first match is considered. Bare numbers are never taken, since they are as
/// likely to be a year as an amount.
pub fn extract_amount(text: &str) -> Option<f64> {
    let text = text.trim().replace("Rs.", "Rs").replace("rs.", "rs");

    if let Some(caps) = context_pattern().captures(&text) {
        let unit = caps.get(3).map(|m| m.as_str());
        if let Some(amount) = to_amount(&caps[2], unit) {
            return Some(amount);
        }
    }

    for pattern in [rupee_pattern(), rs_pattern()] {
        if let Some(caps) = pattern.captures(&text) {
            let unit = caps.get(2).map(|m| m.as_str());
            if let Some(amount) = to_amount(&caps[1], unit) {
                return Some(amount);
            }
        }
    }

    let caps = unit_pattern().captures(&text)?;
    to_amount(&caps[1], caps.get(2).map(|m| m.as_str()))
}

fn to_amount(number: &str, unit: Option<&str>) -> Option<f64> {
    let value = number.replace(',', "").parse::<f64>().ok()?;
    let scale = match unit.map(str::to_ascii_lowercase).as_deref() {
        Some("lakh" | "lakhs" | "lac" | "lacs" | "l") => LAKH,
        Some("crore" | "crores" | "cr") => CRORE,
        _ => 1.0,
    };
    Some(value * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contextual_amount_with_rupee_symbol() {
        assert_eq!(extract_amount("Plan Goa trip Dec 2025 for ₹50000"), Some(50_000.0));
    }

    #[test]
    fn contextual_amount_with_units() {
        assert_eq!(extract_amount("Wedding in December 2026 for 8 lakhs"), Some(800_000.0));
        assert_eq!(extract_amount("house budget of 1.5 crore by 2035"), Some(15_000_000.0));
        assert_eq!(extract_amount("Plan wedding in Dec 2026 for 8L"), Some(800_000.0));
    }

    #[test]
    fn contextual_amount_with_separators_and_keyword_variants() {
        assert_eq!(extract_amount("Laptop cost: Rs. 1,20,000 in 2027"), Some(120_000.0));
        assert_eq!(extract_amount("amount is INR 75,000"), Some(75_000.0));
        assert_eq!(extract_amount("Budget = 2.5 lacs"), Some(250_000.0));
    }

    #[test]
    fn currency_marker_anywhere() {
        assert_eq!(extract_amount("Bike ₹ 90,000 next year"), Some(90_000.0));
        assert_eq!(extract_amount("new phone rs 45000 in 2027"), Some(45_000.0));
        assert_eq!(extract_amount("car inr 12 lakh 2029"), Some(1_200_000.0));
    }

    #[test]
    fn bare_number_with_unit() {
        assert_eq!(extract_amount("Europe trip 3 lakhs 2028"), Some(300_000.0));
        assert_eq!(extract_amount("villa 2 crores in 2040"), Some(20_000_000.0));
    }

    #[test]
    fn contextual_phrase_wins_over_currency_marker() {
        assert_eq!(
            extract_amount("₹100 deposit now, budget of 5000 for the rest"),
            Some(5_000.0)
        );
    }

    #[test]
    fn currency_marker_wins_over_unit_suffix() {
        assert_eq!(extract_amount("₹5000 now, 3 lakh later"), Some(5_000.0));
        assert_eq!(extract_amount("rs 8000 now, 2 crore by 2040"), Some(8_000.0));
    }

    #[test]
    fn rupee_symbol_wins_over_rs_and_inr() {
        assert_eq!(extract_amount("inr 7000 or ₹6000"), Some(6_000.0));
        assert_eq!(extract_amount("Rs. 7000 or ₹6000"), Some(6_000.0));
    }

    #[test]
    fn keyword_inside_a_word_is_not_contextual() {
        // "before" must not anchor a contextual amount on the year.
        assert_eq!(extract_amount("Car before 2027 ₹6 lakh"), Some(600_000.0));
    }

    #[test]
    fn unit_letter_needs_a_word_boundary() {
        assert_eq!(extract_amount("Trip for 50000 later in 2027"), Some(50_000.0));
    }

    #[test]
    fn bare_numbers_are_not_amounts() {
        assert_eq!(extract_amount("Vacation in 2027 maybe 50000"), None);
        assert_eq!(extract_amount("Save up for the holidays"), None);
    }
}
