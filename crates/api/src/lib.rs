pub mod error;
mod goals;
mod ledger;
mod planning;

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use goalplan_core::ingest::MarketDataClient;
use goalplan_core::planner::PlanCalculator;
use goalplan_core::storage::{GoalStore, LedgerStore, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub planner: PlanCalculator,
    pub market: Arc<dyn MarketDataClient>,
    pub goals: Arc<dyn GoalStore>,
    pub ledger: Arc<dyn LedgerStore>,
}

impl AppState {
    /// State backed by a process-local store; nothing survives a restart.
    pub fn in_memory(planner: PlanCalculator, market: Arc<dyn MarketDataClient>) -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            planner,
            market,
            goals: store.clone(),
            ledger: store,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/nlp/parse", post(planning::parse_text))
        .route("/planner", post(planning::create_plan))
        .route("/planner/", post(planning::create_plan))
        .route("/planner/parse-and-plan", post(planning::parse_and_plan))
        .route("/market/summary", get(planning::market_summary))
        .route("/agent/chat", post(planning::chat))
        .route("/goals", get(goals::list_goals).post(goals::create_goal))
        .route("/goals/", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/goals/:id",
            get(goals::get_goal)
                .patch(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route(
            "/expenses",
            get(ledger::list_expenses).post(ledger::add_expense),
        )
        .route("/expenses/summary", get(ledger::expense_summary))
        .route("/expenses/:id", delete(ledger::delete_expense))
        .route("/income", get(ledger::list_income).post(ledger::add_income))
        .route("/income/:id", delete(ledger::delete_income))
        .route("/advice", get(ledger::advice))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Goal planning backend is running" }))
}

async fn healthz() -> &'static str {
    "ok"
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
