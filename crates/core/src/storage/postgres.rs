use crate::domain::goal::{Calculation, Goal, GoalRequest, Plan};
use crate::domain::ledger::{Expense, Income, LedgerEntry};
use crate::storage::{GoalStore, IdAllocator, LedgerStore, RandomIds};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

type GoalRow = (
    Uuid,
    String,
    f64,
    i32,
    DateTime<Utc>,
    Option<Uuid>,
    Option<f64>,
    Option<f64>,
);

type LedgerRow = (Uuid, NaiveDate, f64, String, Option<String>, DateTime<Utc>);

const SELECT_GOALS: &str = "SELECT g.id, g.event_name, g.today_cost, g.target_year, g.created_at, \
     c.id, c.future_cost, c.monthly_saving \
     FROM goals g LEFT JOIN calculations c ON c.goal_id = g.id";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
    ids: Arc<dyn IdAllocator>,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            pool,
            ids: Arc::new(RandomIds),
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdAllocator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }

    async fn upsert_calculation(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        goal_id: Uuid,
        plan: &Plan,
    ) -> anyhow::Result<Calculation> {
        let (id, future_cost, monthly_saving): (Uuid, f64, f64) = sqlx::query_as(
            "INSERT INTO calculations (id, goal_id, future_cost, monthly_saving) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (goal_id) DO UPDATE SET \
               future_cost = EXCLUDED.future_cost, \
               monthly_saving = EXCLUDED.monthly_saving \
             RETURNING id, future_cost, monthly_saving",
        )
        .bind(self.ids.next_id())
        .bind(goal_id)
        .bind(plan.future_cost)
        .bind(plan.monthly_saving_needed)
        .fetch_one(&mut **tx)
        .await
        .context("upsert calculations failed")?;

        Ok(Calculation {
            id,
            future_cost,
            monthly_saving,
        })
    }
}

fn goal_from_row(row: GoalRow) -> Goal {
    let (id, event_name, today_cost, target_year, created_at, calc_id, future_cost, monthly) = row;
    let calculation = match (calc_id, future_cost, monthly) {
        (Some(id), Some(future_cost), Some(monthly_saving)) => Some(Calculation {
            id,
            future_cost,
            monthly_saving,
        }),
        _ => None,
    };
    Goal {
        id,
        event_name,
        today_cost,
        target_year,
        created_at,
        calculation,
    }
}

#[async_trait::async_trait]
impl GoalStore for PgStore {
    async fn create_goal(&self, goal: &GoalRequest, plan: &Plan) -> anyhow::Result<Goal> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO goals (id, event_name, today_cost, target_year) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, created_at",
        )
        .bind(self.ids.next_id())
        .bind(&goal.event_name)
        .bind(goal.today_cost)
        .bind(goal.target_year)
        .fetch_one(&mut *tx)
        .await
        .context("insert goals failed")?;

        let calculation = self.upsert_calculation(&mut tx, id, plan).await?;

        tx.commit().await.context("commit transaction failed")?;

        Ok(Goal {
            id,
            event_name: goal.event_name.clone(),
            today_cost: goal.today_cost,
            target_year: goal.target_year,
            created_at,
            calculation: Some(calculation),
        })
    }

    async fn list_goals(&self) -> anyhow::Result<Vec<Goal>> {
        let rows: Vec<GoalRow> =
            sqlx::query_as(&format!("{SELECT_GOALS} ORDER BY g.created_at, g.id"))
                .fetch_all(&self.pool)
                .await
                .context("select goals failed")?;
        Ok(rows.into_iter().map(goal_from_row).collect())
    }

    async fn get_goal(&self, id: Uuid) -> anyhow::Result<Option<Goal>> {
        let row: Option<GoalRow> = sqlx::query_as(&format!("{SELECT_GOALS} WHERE g.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("select goal failed")?;
        Ok(row.map(goal_from_row))
    }

    async fn update_goal(
        &self,
        id: Uuid,
        goal: &GoalRequest,
        plan: &Plan,
    ) -> anyhow::Result<Option<Goal>> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        let updated: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "UPDATE goals SET event_name = $2, today_cost = $3, target_year = $4 \
             WHERE id = $1 \
             RETURNING created_at",
        )
        .bind(id)
        .bind(&goal.event_name)
        .bind(goal.today_cost)
        .bind(goal.target_year)
        .fetch_optional(&mut *tx)
        .await
        .context("update goals failed")?;

        let Some((created_at,)) = updated else {
            tx.rollback().await.context("rollback transaction failed")?;
            return Ok(None);
        };

        let calculation = self.upsert_calculation(&mut tx, id, plan).await?;

        tx.commit().await.context("commit transaction failed")?;

        Ok(Some(Goal {
            id,
            event_name: goal.event_name.clone(),
            today_cost: goal.today_cost,
            target_year: goal.target_year,
            created_at,
            calculation: Some(calculation),
        }))
    }

    async fn delete_goal(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM goals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete goals failed")?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl LedgerStore for PgStore {
    async fn add_expense(&self, entry: LedgerEntry) -> anyhow::Result<Expense> {
        let (id, date, amount, category, note, created_at): LedgerRow = sqlx::query_as(
            "INSERT INTO expenses (id, date, amount, category, note) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, date, amount, category, note, created_at",
        )
        .bind(self.ids.next_id())
        .bind(entry.date)
        .bind(entry.amount)
        .bind(&entry.label)
        .bind(&entry.note)
        .fetch_one(&self.pool)
        .await
        .context("insert expenses failed")?;

        Ok(Expense {
            id,
            date,
            amount,
            category,
            note,
            created_at,
        })
    }

    async fn add_expenses(&self, entries: &[LedgerEntry]) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;
        let mut inserted: u64 = 0;

        for entry in entries {
            let res = sqlx::query(
                "INSERT INTO expenses (id, date, amount, category, note) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(self.ids.next_id())
            .bind(entry.date)
            .bind(entry.amount)
            .bind(&entry.label)
            .bind(&entry.note)
            .execute(&mut *tx)
            .await
            .context("insert expenses failed")?;

            inserted += res.rows_affected();
        }

        tx.commit().await.context("commit transaction failed")?;
        Ok(inserted)
    }

    async fn list_expenses(&self) -> anyhow::Result<Vec<Expense>> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            "SELECT id, date, amount, category, note, created_at FROM expenses \
             ORDER BY date DESC, created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("select expenses failed")?;

        Ok(rows
            .into_iter()
            .map(|(id, date, amount, category, note, created_at)| Expense {
                id,
                date,
                amount,
                category,
                note,
                created_at,
            })
            .collect())
    }

    async fn delete_expense(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete expenses failed")?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_income(&self, entry: LedgerEntry) -> anyhow::Result<Income> {
        let (id, date, amount, source, note, created_at): LedgerRow = sqlx::query_as(
            "INSERT INTO income (id, date, amount, source, note) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, date, amount, source, note, created_at",
        )
        .bind(self.ids.next_id())
        .bind(entry.date)
        .bind(entry.amount)
        .bind(&entry.label)
        .bind(&entry.note)
        .fetch_one(&self.pool)
        .await
        .context("insert income failed")?;

        Ok(Income {
            id,
            date,
            amount,
            source,
            note,
            created_at,
        })
    }

    async fn list_income(&self) -> anyhow::Result<Vec<Income>> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            "SELECT id, date, amount, source, note, created_at FROM income \
             ORDER BY date DESC, created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("select income failed")?;

        Ok(rows
            .into_iter()
            .map(|(id, date, amount, source, note, created_at)| Income {
                id,
                date,
                amount,
                source,
                note,
                created_at,
            })
            .collect())
    }

    async fn delete_income(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM income WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete income failed")?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_row_without_calculation() {
        let id = Uuid::from_u128(7);
        let goal = goal_from_row((id, "Car".into(), 10.0, 2030, Utc::now(), None, None, None));
        assert_eq!(goal.id, id);
        assert!(goal.calculation.is_none());
    }

    #[test]
    fn goal_row_with_calculation() {
        let calc_id = Uuid::from_u128(8);
        let goal = goal_from_row((
            Uuid::from_u128(7),
            "Car".into(),
            10.0,
            2030,
            Utc::now(),
            Some(calc_id),
            Some(12.0),
            Some(0.25),
        ));
        assert_eq!(
            goal.calculation,
            Some(Calculation {
                id: calc_id,
                future_cost: 12.0,
                monthly_saving: 0.25
            })
        );
    }
}
