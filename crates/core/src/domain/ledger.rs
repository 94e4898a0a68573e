use crate::error::{GoalError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: Uuid,
    pub date: NaiveDate,
    pub amount: f64,
    pub source: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated ledger line ready to be stored. `label` is the expense category or
/// the income source.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub amount: f64,
    pub label: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date: Option<NaiveDate>,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncome {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date: Option<NaiveDate>,
    pub amount: f64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewExpense {
    pub fn validate(self, today: NaiveDate) -> Result<LedgerEntry> {
        validate_entry(self.date, self.amount, &self.category, self.note, today)
    }
}

impl NewIncome {
    pub fn validate(self, today: NaiveDate) -> Result<LedgerEntry> {
        validate_entry(self.date, self.amount, &self.source, self.note, today)
    }
}

fn validate_entry(
    date: Option<NaiveDate>,
    amount: f64,
    label: &str,
    note: Option<String>,
    today: NaiveDate,
) -> Result<LedgerEntry> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(GoalError::InvalidInput(format!(
            "amount must be > 0 (got {amount})"
        )));
    }

    let label = label.trim();
    let label = if label.is_empty() { "Other" } else { label };

    let note = note
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(LedgerEntry {
        date: date.unwrap_or(today),
        amount,
        label: label.to_string(),
        note,
    })
}

// Browser forms post "" for an untouched date field.
fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn blank_date_defaults_to_today() {
        let new: NewExpense = serde_json::from_value(json!({
            "date": "",
            "amount": 250.0,
            "category": "Food",
            "note": "  ",
        }))
        .unwrap();
        let entry = new.validate(today()).unwrap();
        assert_eq!(entry.date, today());
        assert_eq!(entry.label, "Food");
        assert_eq!(entry.note, None);
    }

    #[test]
    fn parses_iso_date() {
        let new: NewIncome = serde_json::from_value(json!({
            "date": "2026-10-01",
            "amount": 90000,
            "source": "Salary",
        }))
        .unwrap();
        let entry = new.validate(today()).unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(entry.label, "Salary");
    }

    #[test]
    fn rejects_malformed_date() {
        let res = serde_json::from_value::<NewExpense>(json!({
            "date": "01/10/2026",
            "amount": 1.0,
        }));
        assert!(res.is_err());
    }

    #[test]
    fn rejects_non_positive_amount() {
        let new = NewExpense {
            date: None,
            amount: 0.0,
            category: "Bills".to_string(),
            note: None,
        };
        assert!(matches!(
            new.validate(today()),
            Err(GoalError::InvalidInput(_))
        ));
    }

    #[test]
    fn blank_label_becomes_other() {
        let new = NewIncome {
            date: None,
            amount: 10.0,
            source: " ".to_string(),
            note: None,
        };
        assert_eq!(new.validate(today()).unwrap().label, "Other");
    }
}
