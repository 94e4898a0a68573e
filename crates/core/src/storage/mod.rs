pub mod memory;
pub mod postgres;

use crate::domain::goal::{Goal, GoalRequest, Plan};
use crate::domain::ledger::{Expense, Income, LedgerEntry};
use anyhow::Context;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Hands out identifiers for new records.
pub trait IdAllocator: Send + Sync + std::fmt::Debug {
    fn next_id(&self) -> Uuid;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdAllocator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic ids `00000000-0000-0000-0000-000000000001`, `...02`, and so on.
#[derive(Debug, Default)]
pub struct SequentialIds(AtomicU64);

impl IdAllocator for SequentialIds {
    fn next_id(&self) -> Uuid {
        let n = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(n))
    }
}

/// Goals and the calculation derived from each one. A goal's calculation is written
/// and removed together with the goal.
#[async_trait::async_trait]
pub trait GoalStore: Send + Sync {
    async fn create_goal(&self, goal: &GoalRequest, plan: &Plan) -> anyhow::Result<Goal>;

    async fn list_goals(&self) -> anyhow::Result<Vec<Goal>>;

    async fn get_goal(&self, id: Uuid) -> anyhow::Result<Option<Goal>>;

    async fn update_goal(
        &self,
        id: Uuid,
        goal: &GoalRequest,
        plan: &Plan,
    ) -> anyhow::Result<Option<Goal>>;

    async fn delete_goal(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Expense and income lines. Listings are newest date first.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn add_expense(&self, entry: LedgerEntry) -> anyhow::Result<Expense>;

    /// Stores a batch of expenses, returning how many were written. Stores with
    /// transactions write all of them or none.
    async fn add_expenses(&self, entries: &[LedgerEntry]) -> anyhow::Result<u64> {
        for entry in entries {
            self.add_expense(entry.clone()).await?;
        }
        Ok(entries.len() as u64)
    }

    async fn list_expenses(&self) -> anyhow::Result<Vec<Expense>>;

    async fn delete_expense(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn add_income(&self, entry: LedgerEntry) -> anyhow::Result<Income>;

    async fn list_income(&self) -> anyhow::Result<Vec<Income>>;

    async fn delete_income(&self, id: Uuid) -> anyhow::Result<bool>;
}
