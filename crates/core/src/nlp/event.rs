use crate::domain::goal::DEFAULT_EVENT_NAME;
use crate::nlp::dates::MONTHS;
use regex::Regex;
use std::sync::OnceLock;

struct EventPatterns {
    whitespace: Regex,
    for_clause: Regex,
    filler_prefix: Regex,
    month_year: Regex,
    currency_token: Regex,
}

static PATTERNS: OnceLock<EventPatterns> = OnceLock::new();

#[allow(clippy::expect_used)]
fn patterns() -> &'static EventPatterns {
    PATTERNS.get_or_init(|| {
        let re = |p: String| Regex::new(&p).expect("static event pattern is valid");
        EventPatterns {
            whitespace: re(r"\s+".to_string()),
            for_clause: re(r"(?i)\sfor\s".to_string()),
            filler_prefix: re(r"(?i)^(?:plan(?:ning)?\s+|please\s+|my\s+|a\s+)".to_string()),
            month_year: re(format!(r"(?i)\b(?:{MONTHS})\b\s*20[0-9]{{2}}")),
            currency_token: re(r"(?i)(?:₹|\binr|\brs\.?)[^ ]+".to_string()),
        }
    })
}

/// Derives a short event label from a goal sentence. Falls back to "Goal".
pub fn extract_event_name(text: &str) -> String {
    let p = patterns();
    let text = p.whitespace.replace_all(text.trim(), " ");

    let candidate = match p.for_clause.find(&text) {
        Some(m) => &text[..m.start()],
        None => &text[..],
    };

    let candidate = p.filler_prefix.replace(candidate, "");
    let candidate = p.month_year.replace_all(&candidate, "");
    let candidate = p.currency_token.replace_all(&candidate, "");
    let candidate = p.whitespace.replace_all(&candidate, " ");
    let candidate = candidate.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | ','));

    if candidate.is_empty() {
        DEFAULT_EVENT_NAME.to_string()
    } else {
        candidate.to_string()
    }
}
