use crate::error::ApiResult;
use crate::{today, AppState};
use axum::{extract::State, Json};
use goalplan_core::agent::{self, ChatReply};
use goalplan_core::domain::goal::{latest_target_year, GoalRequest, Plan};
use goalplan_core::domain::market::MarketSummary;
use goalplan_core::{finance, nlp, GoalError};
use serde::Deserialize;

const MAX_OVERRIDE_PCT: f64 = 50.0;

#[derive(Debug, Deserialize)]
pub struct ParseTextRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    event_name: String,
    today_cost: f64,
    target_year: i32,
    #[serde(default)]
    inflation_override_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TextPlanRequest {
    text: String,
    #[serde(default)]
    inflation_override_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    message: String,
}

fn check_override(pct: Option<f64>) -> Result<Option<f64>, GoalError> {
    match pct {
        Some(p) if !(0.0..=MAX_OVERRIDE_PCT).contains(&p) => Err(GoalError::InvalidInput(
            format!("inflation_override_pct must be between 0 and {MAX_OVERRIDE_PCT} (got {p})"),
        )),
        other => Ok(other),
    }
}

pub async fn parse_text(Json(req): Json<ParseTextRequest>) -> ApiResult<Json<GoalRequest>> {
    Ok(Json(nlp::parse_goal_at(&req.text, today())?))
}

pub async fn create_plan(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> ApiResult<Json<Plan>> {
    let override_pct = check_override(req.inflation_override_pct)?;
    let goal = GoalRequest {
        event_name: req.event_name,
        today_cost: req.today_cost,
        target_year: req.target_year,
    }
    .validate(finance::current_year())?;

    let plan = state
        .planner
        .plan_with_override(
            &goal.event_name,
            goal.today_cost,
            goal.target_year,
            override_pct,
        )
        .await;
    Ok(Json(plan))
}

pub async fn parse_and_plan(
    State(state): State<AppState>,
    Json(req): Json<TextPlanRequest>,
) -> ApiResult<Json<Plan>> {
    let override_pct = check_override(req.inflation_override_pct)?;
    let goal = nlp::parse_goal_at(&req.text, today())?;
    let latest = latest_target_year(finance::current_year());
    if goal.target_year > latest {
        return Err(GoalError::InvalidInput(format!(
            "target_year must be at most {latest} (got {})",
            goal.target_year
        ))
        .into());
    }

    let plan = state
        .planner
        .plan_with_override(
            &goal.event_name,
            goal.today_cost,
            goal.target_year,
            override_pct,
        )
        .await;
    Ok(Json(plan))
}

pub async fn market_summary(State(state): State<AppState>) -> Json<MarketSummary> {
    Json(state.market.index_summary().await)
}

pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatReply>> {
    let reply = agent::chat(&req.message, today(), &state.planner, state.market.as_ref()).await?;
    Ok(Json(reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_bounds() {
        assert_eq!(check_override(None), Ok(None));
        assert_eq!(check_override(Some(0.0)), Ok(Some(0.0)));
        assert_eq!(check_override(Some(50.0)), Ok(Some(50.0)));
        assert!(check_override(Some(-0.1)).is_err());
        assert!(check_override(Some(f64::NAN)).is_err());
    }
}
