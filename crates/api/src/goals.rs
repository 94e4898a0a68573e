use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use goalplan_core::domain::goal::{Goal, GoalRequest, GoalUpdate, Plan};
use goalplan_core::finance;
use uuid::Uuid;

async fn plan_for(state: &AppState, goal: &GoalRequest) -> Plan {
    state
        .planner
        .plan_event(&goal.event_name, goal.today_cost, goal.target_year)
        .await
}

pub async fn list_goals(State(state): State<AppState>) -> ApiResult<Json<Vec<Goal>>> {
    Ok(Json(state.goals.list_goals().await?))
}

pub async fn create_goal(
    State(state): State<AppState>,
    Json(req): Json<GoalRequest>,
) -> ApiResult<Json<Goal>> {
    let goal = req.validate(finance::current_year())?;
    let plan = plan_for(&state, &goal).await;
    let created = state.goals.create_goal(&goal, &plan).await?;
    tracing::info!(goal_id = %created.id, event_name = %created.event_name, "goal created");
    Ok(Json(created))
}

pub async fn get_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Goal>> {
    state
        .goals
        .get_goal(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("goal"))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<GoalUpdate>,
) -> ApiResult<Json<Goal>> {
    let current = state
        .goals
        .get_goal(id)
        .await?
        .ok_or(ApiError::NotFound("goal"))?;

    let goal = update.apply(&current).validate(finance::current_year())?;
    let plan = plan_for(&state, &goal).await;

    state
        .goals
        .update_goal(id, &goal, &plan)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("goal"))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.goals.delete_goal(id).await? {
        tracing::info!(goal_id = %id, "goal deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("goal"))
    }
}
