use anyhow::Context;
use goalplan_core::ledger::{totals_by_label, StatementRow};
use goalplan_core::storage::LedgerStore;
use serde::Serialize;
use std::collections::BTreeMap;

const SAMPLE_ROWS: usize = 5;

#[derive(Debug, Serialize)]
pub struct StatementSummary<'a> {
    pub rows: usize,
    pub totals: BTreeMap<String, f64>,
    pub sample: &'a [StatementRow],
}

pub fn summarize(rows: &[StatementRow]) -> StatementSummary<'_> {
    StatementSummary {
        rows: rows.len(),
        totals: totals_by_label(rows.iter().map(|r| (r.category, r.amount))),
        sample: &rows[..rows.len().min(SAMPLE_ROWS)],
    }
}

/// Validates every row before storing any; a Postgres store writes the batch in one
/// transaction.
pub async fn import_rows(store: &dyn LedgerStore, rows: &[StatementRow]) -> anyhow::Result<u64> {
    let entries = rows
        .iter()
        .enumerate()
        // Header is line 1.
        .map(|(idx, row)| row.to_entry().with_context(|| format!("line {}", idx + 2)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    store.add_expenses(&entries).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use goalplan_core::ledger::read_statement;
    use goalplan_core::storage::{MemoryStore, SequentialIds};
    use std::sync::Arc;

    #[test]
    fn summary_totals_and_sample() {
        let csv = "date,amount,description\n\
                   2026-10-01,100,Swiggy\n\
                   2026-10-02,50,Zomato\n\
                   2026-10-03,400,Ola ride\n\
                   2026-10-04,10,Misc\n\
                   2026-10-05,20,Misc\n\
                   2026-10-06,30,Misc\n";
        let rows = read_statement(csv.as_bytes()).unwrap();
        let summary = summarize(&rows);
        assert_eq!(summary.rows, 6);
        assert_eq!(summary.sample.len(), 5);
        assert_eq!(summary.totals["Food"], 150.0);
        assert_eq!(summary.totals["Travel"], 400.0);
        assert_eq!(summary.totals["Other"], 60.0);
    }

    #[tokio::test]
    async fn import_stores_categorised_rows_with_allocated_ids() {
        let csv = "date,amount,description\n\
                   2026-10-01,100,Swiggy\n\
                   2026-10-03,400,Ola ride\n";
        let rows = read_statement(csv.as_bytes()).unwrap();
        let store = MemoryStore::new(Arc::new(SequentialIds::default()));

        let inserted = import_rows(&store, &rows).await.unwrap();
        assert_eq!(inserted, 2);

        let stored = store.list_expenses().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].category, "Travel");
        assert_eq!(stored[1].note.as_deref(), Some("Swiggy"));
        assert_eq!(stored[0].id, uuid::Uuid::from_u128(2));
    }

    #[tokio::test]
    async fn import_rejects_batch_with_negative_row() {
        let rows = vec![
            StatementRow {
                date: "2026-10-01".parse().unwrap(),
                amount: 120.0,
                description: "Swiggy".to_string(),
                category: "Food",
            },
            StatementRow {
                date: "2026-10-02".parse().unwrap(),
                amount: -200.0,
                description: "Refund".to_string(),
                category: "Other",
            },
        ];
        let store = MemoryStore::new(Arc::new(SequentialIds::default()));

        let err = import_rows(&store, &rows).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 3"), "{msg}");
        assert!(msg.contains("amount must be > 0"), "{msg}");
        assert!(store.list_expenses().await.unwrap().is_empty());
    }
}
