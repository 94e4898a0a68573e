use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

pub(crate) const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";
const COUNT: &str = r"(\d{1,2}|an?|one|two|three|four|five|six|seven|eight|nine|ten)";

struct DatePatterns {
    month_year: Regex,
    iso: Regex,
    day_first: Regex,
    this_or_next_year: Regex,
    in_years: Regex,
    years_from_now: Regex,
    in_months: Regex,
    bare_month: Regex,
    digits: Regex,
}

static PATTERNS: OnceLock<DatePatterns> = OnceLock::new();

#[allow(clippy::expect_used)]
fn patterns() -> &'static DatePatterns {
    PATTERNS.get_or_init(|| {
        let re = |p: String| Regex::new(&p).expect("static date pattern is valid");
        DatePatterns {
            month_year: re(format!(
                r"(?i)\b({MONTHS})\.?\s*(?:(\d{{1,2}})(?:st|nd|rd|th)?,?\s+)?(\d{{4}})\b"
            )),
            iso: re(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b".to_string()),
            day_first: re(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b".to_string()),
            this_or_next_year: re(r"(?i)\b(this|next)\s+year\b".to_string()),
            in_years: re(format!(r"(?i)\b(?:in|after|within)\s+{COUNT}\s+years?\b")),
            years_from_now: re(format!(
                r"(?i)\b{COUNT}\s+years?\s+(?:from\s+now|later|hence)\b"
            )),
            in_months: re(format!(r"(?i)\b(?:in|after|within)\s+{COUNT}\s+months?\b")),
            bare_month: re(format!(r"(?i)\b(?:in|by|before|until|till)\s+({MONTHS})\b")),
            digits: re(r"[0-9]+".to_string()),
        }
    })
}

/// A date expression recognised in free text, reduced to the year it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMention {
    pub span: Range<usize>,
    pub year: i32,
}

/// Scans `text` for date expressions, in text order. Expressions without an explicit
/// year resolve to their next occurrence on or after `today`.
pub fn search_dates(text: &str, today: NaiveDate) -> Vec<DateMention> {
    let p = patterns();
    let mut found: Vec<DateMention> = Vec::new();

    for caps in p.month_year.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let (Some(month), Ok(year)) = (month_number(&caps[1]), caps[3].parse::<i32>()) else {
            continue;
        };
        let day_ok = match caps.get(2) {
            Some(d) => d
                .as_str()
                .parse::<u32>()
                .ok()
                .and_then(|d| NaiveDate::from_ymd_opt(year, month, d))
                .is_some(),
            None => true,
        };
        if day_ok {
            found.push(DateMention {
                span: whole.range(),
                year,
            });
        }
    }

    for caps in p.iso.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(date) = ymd(&caps[1], &caps[2], &caps[3]) {
            found.push(DateMention {
                span: whole.range(),
                year: date.year(),
            });
        }
    }

    for caps in p.day_first.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let date = ymd(&caps[3], &caps[2], &caps[1]).or_else(|| ymd(&caps[3], &caps[1], &caps[2]));
        if let Some(date) = date {
            found.push(DateMention {
                span: whole.range(),
                year: date.year(),
            });
        }
    }

    for caps in p.this_or_next_year.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let offset = if caps[1].eq_ignore_ascii_case("next") { 1 } else { 0 };
        found.push(DateMention {
            span: whole.range(),
            year: today.year() + offset,
        });
    }

    for re in [&p.in_years, &p.years_from_now] {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if let Some(n) = count(&caps[1]) {
                found.push(DateMention {
                    span: whole.range(),
                    year: today.year() + n as i32,
                });
            }
        }
    }

    for caps in p.in_months.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let target = count(&caps[1]).and_then(|n| today.checked_add_months(Months::new(n)));
        if let Some(target) = target {
            found.push(DateMention {
                span: whole.range(),
                year: target.year(),
            });
        }
    }

    for caps in p.bare_month.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // "in December 2026" is already covered by the month-year form.
        if found.iter().any(|m| m.span.contains(&name.start())) {
            continue;
        }
        let Some(month) = month_number(name.as_str()) else {
            continue;
        };
        let year = if month >= today.month() {
            today.year()
        } else {
            today.year() + 1
        };
        found.push(DateMention {
            span: whole.range(),
            year,
        });
    }

    found.sort_by_key(|m| m.span.start);
    found.dedup_by_key(|m| m.span.start);
    found
}

/// Resolves the goal's target year: the first mentioned date that is not in the past,
/// else the last mentioned date, else the first standalone `20[2-9]x` token that is not
/// in the past.
pub fn extract_year(text: &str, today: NaiveDate) -> Option<i32> {
    let current = today.year();
    let mentions = search_dates(text, today);
    if let Some(last) = mentions.last() {
        let chosen = mentions.iter().find(|m| m.year >= current).unwrap_or(last);
        return Some(chosen.year);
    }

    patterns()
        .digits
        .find_iter(text)
        .filter_map(|m| plausible_year(m.as_str()))
        .find(|year| *year >= current)
}

fn plausible_year(token: &str) -> Option<i32> {
    let b = token.as_bytes();
    if b.len() == 4 && b[0] == b'2' && b[1] == b'0' && (b'2'..=b'9').contains(&b[2]) {
        token.parse().ok()
    } else {
        None
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn count(word: &str) -> Option<u32> {
    let n = match word.to_ascii_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => digits.parse().ok()?,
    };
    Some(n)
}

pub(crate) fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn years(text: &str) -> Vec<i32> {
        search_dates(text, today()).into_iter().map(|m| m.year).collect()
    }

    #[test]
    fn month_year_forms() {
        assert_eq!(years("Goa trip Dec 2025"), vec![2025]);
        assert_eq!(years("wedding on December 15, 2027"), vec![2027]);
        assert_eq!(years("sept 2030 and Jan. 2031"), vec![2030, 2031]);
    }

    #[test]
    fn invalid_day_is_ignored() {
        assert!(years("Feb 30, 2027").is_empty());
    }

    #[test]
    fn numeric_dates() {
        assert_eq!(years("due 2028-03-01"), vec![2028]);
        assert_eq!(years("due 25/12/2029"), vec![2029]);
        assert_eq!(years("due 12/25/2029"), vec![2029]);
        assert!(years("due 2028-13-40").is_empty());
    }

    #[test]
    fn relative_expressions() {
        assert_eq!(years("next year"), vec![2027]);
        assert_eq!(years("this year"), vec![2026]);
        assert_eq!(years("in 5 years"), vec![2031]);
        assert_eq!(years("in a year"), vec![2027]);
        assert_eq!(years("three years from now"), vec![2029]);
        assert_eq!(years("in 3 months"), vec![2027]);
        assert_eq!(years("within 2 months"), vec![2026]);
    }

    #[test]
    fn bare_month_prefers_future() {
        assert_eq!(years("by December"), vec![2026]);
        assert_eq!(years("in March"), vec![2027]);
        assert_eq!(years("before October"), vec![2026]);
    }

    #[test]
    fn bare_month_does_not_double_count_month_year() {
        assert_eq!(years("Wedding in December 2026 for 8 lakhs"), vec![2026]);
    }

    #[test]
    fn month_words_inside_other_words_are_ignored() {
        assert!(years("summary 2026 marketing 2027").is_empty());
        assert!(years("I may buy it").is_empty());
    }

    #[test]
    fn extract_year_prefers_first_future_date() {
        assert_eq!(extract_year("from Jan 2024 to Dec 2028", today()), Some(2028));
    }

    #[test]
    fn extract_year_falls_back_to_last_past_date() {
        assert_eq!(extract_year("Goa trip Dec 2025 for ₹50000", today()), Some(2025));
        assert_eq!(extract_year("Jan 2023 or Mar 2024", today()), Some(2024));
    }

    #[test]
    fn extract_year_scans_standalone_years() {
        assert_eq!(extract_year("Car 2030 for ₹5 lakh", today()), Some(2030));
        assert_eq!(extract_year("2024 or 2027", today()), Some(2027));
    }

    #[test]
    fn extract_year_ignores_digits_inside_longer_numbers() {
        assert_eq!(extract_year("budget of ₹20300 only", today()), None);
        assert_eq!(extract_year("Car for ₹5 lakh", today()), None);
    }

    #[test]
    fn extract_year_skips_past_standalone_years() {
        assert_eq!(extract_year("bought in 2024 for ₹5000", today()), None);
    }
}
