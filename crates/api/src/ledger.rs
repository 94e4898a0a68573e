use crate::error::{ApiError, ApiResult};
use crate::{today, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use goalplan_core::domain::ledger::{Expense, Income, NewExpense, NewIncome};
use goalplan_core::ledger::{self, Advice};
use std::collections::BTreeMap;
use uuid::Uuid;

pub async fn list_expenses(State(state): State<AppState>) -> ApiResult<Json<Vec<Expense>>> {
    Ok(Json(state.ledger.list_expenses().await?))
}

pub async fn add_expense(
    State(state): State<AppState>,
    Json(req): Json<NewExpense>,
) -> ApiResult<Json<Expense>> {
    let entry = req.validate(today())?;
    Ok(Json(state.ledger.add_expense(entry).await?))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.ledger.delete_expense(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("expense"))
    }
}

pub async fn expense_summary(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, f64>>> {
    let expenses = state.ledger.list_expenses().await?;
    Ok(Json(ledger::expense_totals(&expenses)))
}

pub async fn list_income(State(state): State<AppState>) -> ApiResult<Json<Vec<Income>>> {
    Ok(Json(state.ledger.list_income().await?))
}

pub async fn add_income(
    State(state): State<AppState>,
    Json(req): Json<NewIncome>,
) -> ApiResult<Json<Income>> {
    let entry = req.validate(today())?;
    Ok(Json(state.ledger.add_income(entry).await?))
}

pub async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.ledger.delete_income(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("income"))
    }
}

pub async fn advice(State(state): State<AppState>) -> ApiResult<Json<Advice>> {
    let (expenses, income) =
        tokio::try_join!(state.ledger.list_expenses(), state.ledger.list_income())?;
    Ok(Json(ledger::advice(&expenses, &income, today())))
}
