use crate::error::{GoalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_EVENT_NAME: &str = "Goal";

/// Furthest a target year may lie beyond the current year.
pub const MAX_YEARS_AHEAD: i32 = 100;

pub fn latest_target_year(current_year: i32) -> i32 {
    current_year.saturating_add(MAX_YEARS_AHEAD)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRequest {
    pub event_name: String,
    pub today_cost: f64,
    pub target_year: i32,
}

impl GoalRequest {
    /// Checks the request against `current_year` and normalises the event name.
    pub fn validate(self, current_year: i32) -> Result<Self> {
        if !self.today_cost.is_finite() || self.today_cost <= 0.0 {
            return Err(GoalError::InvalidInput(format!(
                "today_cost must be > 0 (got {})",
                self.today_cost
            )));
        }
        if self.target_year < current_year {
            return Err(GoalError::InvalidInput(format!(
                "target_year cannot be in the past (got {}, current year {current_year})",
                self.target_year
            )));
        }

        let latest = latest_target_year(current_year);
        if self.target_year > latest {
            return Err(GoalError::InvalidInput(format!(
                "target_year must be at most {latest} (got {})",
                self.target_year
            )));
        }

        let event_name = self.event_name.trim();
        let event_name = if event_name.is_empty() {
            DEFAULT_EVENT_NAME.to_string()
        } else {
            event_name.to_string()
        };

        Ok(Self {
            event_name,
            today_cost: self.today_cost,
            target_year: self.target_year,
        })
    }
}

/// Partial edit of a stored goal; unset fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub event_name: Option<String>,
    pub today_cost: Option<f64>,
    pub target_year: Option<i32>,
}

impl GoalUpdate {
    pub fn apply(self, current: &Goal) -> GoalRequest {
        GoalRequest {
            event_name: self.event_name.unwrap_or_else(|| current.event_name.clone()),
            today_cost: self.today_cost.unwrap_or(current.today_cost),
            target_year: self.target_year.unwrap_or(current.target_year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub event_name: String,
    pub target_year: i32,
    pub today_cost: f64,
    pub inflation_percent_used: f64,
    pub years_to_goal: u32,
    pub future_cost: f64,
    pub monthly_saving_needed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationRate {
    pub percent: f64,
    pub source: String,
    pub year: i32,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub event_name: String,
    pub today_cost: f64,
    pub target_year: i32,
    pub created_at: DateTime<Utc>,
    pub calculation: Option<Calculation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub id: Uuid,
    pub future_cost: f64,
    pub monthly_saving: f64,
}
