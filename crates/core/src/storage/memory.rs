use crate::domain::goal::{Calculation, Goal, GoalRequest, Plan};
use crate::domain::ledger::{Expense, Income, LedgerEntry};
use crate::storage::{GoalStore, IdAllocator, LedgerStore, RandomIds};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store. Used when no database is configured, and in tests.
#[derive(Debug)]
pub struct MemoryStore {
    ids: Arc<dyn IdAllocator>,
    goals: RwLock<HashMap<Uuid, Goal>>,
    expenses: RwLock<HashMap<Uuid, Expense>>,
    income: RwLock<HashMap<Uuid, Income>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(RandomIds))
    }
}

impl MemoryStore {
    pub fn new(ids: Arc<dyn IdAllocator>) -> Self {
        Self {
            ids,
            goals: RwLock::new(HashMap::new()),
            expenses: RwLock::new(HashMap::new()),
            income: RwLock::new(HashMap::new()),
        }
    }

    fn calculation(&self, plan: &Plan, existing: Option<&Calculation>) -> Calculation {
        Calculation {
            id: existing.map_or_else(|| self.ids.next_id(), |c| c.id),
            future_cost: plan.future_cost,
            monthly_saving: plan.monthly_saving_needed,
        }
    }
}

#[async_trait::async_trait]
impl GoalStore for MemoryStore {
    async fn create_goal(&self, goal: &GoalRequest, plan: &Plan) -> anyhow::Result<Goal> {
        let record = Goal {
            id: self.ids.next_id(),
            event_name: goal.event_name.clone(),
            today_cost: goal.today_cost,
            target_year: goal.target_year,
            created_at: Utc::now(),
            calculation: Some(self.calculation(plan, None)),
        };
        self.goals.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_goals(&self) -> anyhow::Result<Vec<Goal>> {
        let mut out: Vec<Goal> = self.goals.read().await.values().cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get_goal(&self, id: Uuid) -> anyhow::Result<Option<Goal>> {
        Ok(self.goals.read().await.get(&id).cloned())
    }

    async fn update_goal(
        &self,
        id: Uuid,
        goal: &GoalRequest,
        plan: &Plan,
    ) -> anyhow::Result<Option<Goal>> {
        let mut goals = self.goals.write().await;
        let Some(record) = goals.get_mut(&id) else {
            return Ok(None);
        };
        record.event_name = goal.event_name.clone();
        record.today_cost = goal.today_cost;
        record.target_year = goal.target_year;
        record.calculation = Some(self.calculation(plan, record.calculation.as_ref()));
        Ok(Some(record.clone()))
    }

    async fn delete_goal(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.goals.write().await.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryStore {
    async fn add_expense(&self, entry: LedgerEntry) -> anyhow::Result<Expense> {
        let record = Expense {
            id: self.ids.next_id(),
            date: entry.date,
            amount: entry.amount,
            category: entry.label,
            note: entry.note,
            created_at: Utc::now(),
        };
        self.expenses.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_expenses(&self) -> anyhow::Result<Vec<Expense>> {
        let mut out: Vec<Expense> = self.expenses.read().await.values().cloned().collect();
        out.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(out)
    }

    async fn delete_expense(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.expenses.write().await.remove(&id).is_some())
    }

    async fn add_income(&self, entry: LedgerEntry) -> anyhow::Result<Income> {
        let record = Income {
            id: self.ids.next_id(),
            date: entry.date,
            amount: entry.amount,
            source: entry.label,
            note: entry.note,
            created_at: Utc::now(),
        };
        self.income.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_income(&self) -> anyhow::Result<Vec<Income>> {
        let mut out: Vec<Income> = self.income.read().await.values().cloned().collect();
        out.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(out)
    }

    async fn delete_income(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.income.write().await.remove(&id).is_some())
    }
}
