//! Expense and income tallies, the monthly savings advice built on them, and CSV
//! statement import.

use crate::domain::ledger::{Expense, Income, LedgerEntry, NewExpense};
use crate::finance::round2;
use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub const OTHER_CATEGORY: &str = "Other";

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Food",
        &["restaurant", "dominos", "zomato", "swiggy", "groceries", "food"],
    ),
    ("Travel", &["uber", "ola", "flight", "train", "bus", "travel"]),
    (
        "Shopping",
        &["amazon", "flipkart", "shopping", "clothes", "shoes"],
    ),
    ("Bills", &["electricity", "internet", "mobile", "rent", "bill"]),
    (
        "Health",
        &["hospital", "pharmacy", "doctor", "medicine", "health"],
    ),
];

const REQUIRED_COLUMNS: [&str; 3] = ["date", "amount", "description"];

/// First category whose keyword occurs anywhere in the description, case-insensitively.
pub fn categorize(description: &str) -> &'static str {
    let desc = description.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| desc.contains(k)))
        .map_or(OTHER_CATEGORY, |(category, _)| *category)
}

/// Sum of amounts per label, rounded to paise.
pub fn totals_by_label<'a, I>(entries: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (label, amount) in entries {
        *totals.entry(label.to_string()).or_default() += amount;
    }
    for total in totals.values_mut() {
        *total = round2(*total);
    }
    totals
}

pub fn expense_totals(expenses: &[Expense]) -> BTreeMap<String, f64> {
    totals_by_label(expenses.iter().map(|e| (e.category.as_str(), e.amount)))
}

pub fn income_totals(income: &[Income]) -> BTreeMap<String, f64> {
    totals_by_label(income.iter().map(|i| (i.source.as_str(), i.amount)))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub equity: f64,
    pub debt: f64,
    pub cash: f64,
}

impl Allocation {
    const BALANCED: Allocation = Allocation {
        equity: 0.4,
        debt: 0.4,
        cash: 0.2,
    };

    /// Share of monthly savings to put in each bucket. A higher savings rate can carry
    /// more equity; a thin margin keeps more in cash.
    pub fn for_savings_rate(rate: Option<f64>) -> Self {
        match rate {
            None => Self::BALANCED,
            Some(r) if r >= 0.3 => Self {
                equity: 0.6,
                debt: 0.3,
                cash: 0.1,
            },
            Some(r) if r >= 0.1 => Self {
                equity: 0.5,
                debt: 0.35,
                cash: 0.15,
            },
            Some(_) => Self {
                equity: 0.3,
                debt: 0.4,
                cash: 0.3,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub monthly_income_total: f64,
    pub monthly_expense_total: f64,
    pub monthly_savings: f64,
    pub suggested_allocation: Allocation,
}

fn same_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

/// Totals for the calendar month containing `today`.
pub fn advice(expenses: &[Expense], income: &[Income], today: NaiveDate) -> Advice {
    let spent: f64 = expenses
        .iter()
        .filter(|e| same_month(e.date, today))
        .map(|e| e.amount)
        .sum();
    let earned: f64 = income
        .iter()
        .filter(|i| same_month(i.date, today))
        .map(|i| i.amount)
        .sum();
    let savings = earned - spent;

    let rate = (earned > 0.0).then(|| savings / earned);

    Advice {
        monthly_income_total: round2(earned),
        monthly_expense_total: round2(spent),
        monthly_savings: round2(savings),
        suggested_allocation: Allocation::for_savings_rate(rate),
    }
}

/// One normalised statement line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementRow {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    pub category: &'static str,
}

impl StatementRow {
    /// Runs the row through the same checks as a manually entered expense.
    pub fn to_entry(&self) -> crate::error::Result<LedgerEntry> {
        NewExpense {
            date: Some(self.date),
            amount: self.amount,
            category: self.category.to_string(),
            note: Some(self.description.clone()),
        }
        .validate(self.date)
    }
}

/// Reads a `date,amount,description` statement. Extra columns are ignored; any bad
/// row fails the whole file with its line number.
pub fn read_statement<R: Read>(reader: R) -> anyhow::Result<Vec<StatementRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("failed to read CSV header")?.clone();
    let mut columns = [0usize; 3];
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .with_context(|| {
                format!(
                    "CSV must contain columns: {}",
                    REQUIRED_COLUMNS.join(", ")
                )
            })?;
    }

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.context("failed to read CSV record")?;
        // Header is line 1.
        let line = idx + 2;
        let row = parse_row(&record, columns).with_context(|| format!("line {line}"))?;
        rows.push(row);
    }

    tracing::debug!(rows = rows.len(), "read expense statement");
    Ok(rows)
}

pub fn read_statement_file(path: &Path) -> anyhow::Result<Vec<StatementRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_statement(file).with_context(|| format!("invalid statement {}", path.display()))
}

fn parse_row(
    record: &StringRecord,
    [date_col, amount_col, desc_col]: [usize; 3],
) -> anyhow::Result<StatementRow> {
    let raw_date = record.get(date_col).unwrap_or_default();
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").with_context(|| {
        format!("invalid date format: {raw_date:?} (expected YYYY-MM-DD)")
    })?;

    let raw_amount = record.get(amount_col).unwrap_or_default();
    let amount = raw_amount
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .with_context(|| format!("invalid amount: {raw_amount:?} (must be a number)"))?;
    anyhow::ensure!(amount > 0.0, "amount must be > 0 (got {amount})");

    let description = record.get(desc_col).unwrap_or_default().to_string();

    Ok(StatementRow {
        date,
        amount,
        category: categorize(&description),
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GoalError;
    use chrono::Utc;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(date: NaiveDate, amount: f64, category: &str) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            date,
            amount,
            category: category.to_string(),
            note: None,
            created_at: Utc::now(),
        }
    }

    fn income(date: NaiveDate, amount: f64) -> Income {
        Income {
            id: Uuid::new_v4(),
            date,
            amount,
            source: "Salary".to_string(),
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn categorize_by_keyword() {
        assert_eq!(categorize("Swiggy dinner"), "Food");
        assert_eq!(categorize("UBER to airport"), "Travel");
        assert_eq!(categorize("Amazon order"), "Shopping");
        assert_eq!(categorize("Electricity bill"), "Bills");
        assert_eq!(categorize("Apollo pharmacy"), "Health");
        assert_eq!(categorize("Gift for friend"), "Other");
    }

    #[test]
    fn categorize_prefers_earlier_category() {
        // "food" (Food) wins over "amazon" (Shopping).
        assert_eq!(categorize("amazon fresh food"), "Food");
    }

    #[test]
    fn totals_group_and_round() {
        let expenses = vec![
            expense(day(2026, 10, 1), 100.1, "Food"),
            expense(day(2026, 10, 2), 50.2, "Food"),
            expense(day(2026, 10, 3), 999.0, "Bills"),
        ];
        let totals = expense_totals(&expenses);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["Food"], 150.3);
        assert_eq!(totals["Bills"], 999.0);
    }

    #[test]
    fn advice_counts_only_current_month() {
        let today = day(2026, 10, 19);
        let expenses = vec![
            expense(day(2026, 10, 2), 30_000.0, "Bills"),
            expense(day(2026, 9, 28), 80_000.0, "Travel"),
        ];
        let income = vec![income(day(2026, 10, 1), 100_000.0)];

        let advice = advice(&expenses, &income, today);
        assert_eq!(advice.monthly_income_total, 100_000.0);
        assert_eq!(advice.monthly_expense_total, 30_000.0);
        assert_eq!(advice.monthly_savings, 70_000.0);
        assert_eq!(advice.suggested_allocation.equity, 0.6);
    }

    #[test]
    fn advice_without_income_is_balanced() {
        let advice = advice(&[], &[], day(2026, 10, 19));
        assert_eq!(advice.monthly_savings, 0.0);
        assert_eq!(
            advice.suggested_allocation,
            Allocation {
                equity: 0.4,
                debt: 0.4,
                cash: 0.2
            }
        );
    }

    #[test]
    fn allocation_tiers() {
        assert_eq!(Allocation::for_savings_rate(Some(0.15)).equity, 0.5);
        assert_eq!(Allocation::for_savings_rate(Some(-0.2)).cash, 0.3);
    }

    #[test]
    fn reads_statement() {
        let csv = "date,amount,description\n\
                   2026-10-01, 450.50 ,Zomato order\n\
                   2026-10-03,1200,Internet bill\n";
        let rows = read_statement(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, day(2026, 10, 1));
        assert_eq!(rows[0].amount, 450.5);
        assert_eq!(rows[0].category, "Food");
        assert_eq!(rows[1].category, "Bills");

        let entry = rows[1].to_entry().unwrap();
        assert_eq!(entry.label, "Bills");
        assert_eq!(entry.note.as_deref(), Some("Internet bill"));
    }

    #[test]
    fn hand_built_row_is_validated_as_an_expense() {
        let row = StatementRow {
            date: day(2026, 10, 2),
            amount: -200.0,
            description: "Refund".to_string(),
            category: "Other",
        };
        let err = row.to_entry().unwrap_err();
        assert!(matches!(err, GoalError::InvalidInput(_)));
    }

    #[test]
    fn statement_columns_may_be_reordered() {
        let csv = "description,date,amount,ref\nTrain ticket,2026-01-05,300,x1\n";
        let rows = read_statement(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].category, "Travel");
        assert_eq!(rows[0].amount, 300.0);
    }

    #[test]
    fn statement_requires_columns() {
        let err = read_statement("date,amount\n2026-01-01,5\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("date, amount, description"));
    }

    #[test]
    fn statement_rejects_bad_rows() {
        let err = read_statement("date,amount,description\n01/10/2026,5,x\n".as_bytes())
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 2"));
        assert!(msg.contains("YYYY-MM-DD"));

        let err =
            read_statement("date,amount,description\n2026-10-01,abc,x\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid amount"));
    }

    #[test]
    fn statement_rejects_refunds_and_zero_amounts() {
        let csv = "date,amount,description\n2026-10-01,120,Swiggy\n2026-10-02,-200,Refund\n";
        let msg = format!("{:#}", read_statement(csv.as_bytes()).unwrap_err());
        assert!(msg.contains("line 3"), "{msg}");
        assert!(msg.contains("amount must be > 0 (got -200)"), "{msg}");

        let csv = "date,amount,description\n2026-10-01,0,Nothing\n";
        let msg = format!("{:#}", read_statement(csv.as_bytes()).unwrap_err());
        assert!(msg.contains("line 2"), "{msg}");
    }

    #[test]
    fn reads_statement_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        std::fs::write(&path, "date,amount,description\n2026-10-01,99,Doctor visit\n").unwrap();
        let rows = read_statement_file(&path).unwrap();
        assert_eq!(rows[0].category, "Health");
        assert!(read_statement_file(&dir.path().join("missing.csv")).is_err());
    }
}
