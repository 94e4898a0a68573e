//! Free-text goal interpretation.
//!
//! A sentence such as "Plan Goa trip Dec 2025 for ₹50000" is reduced to an event
//! name, an amount in rupees and a target year. Amount and year are extracted
//! independently; the event name always resolves.

pub mod amount;
pub mod dates;
pub mod event;

use crate::domain::goal::GoalRequest;
use crate::error::{GoalError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use amount::extract_amount;
pub use dates::{extract_year, search_dates};
pub use event::extract_event_name;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedGoal {
    pub event_name: String,
    pub today_cost: Option<f64>,
    pub target_year: Option<i32>,
}

impl ParsedGoal {
    /// Requires both amount and year; amount is reported first when both are missing.
    pub fn complete(self) -> Result<GoalRequest> {
        let today_cost = self.today_cost.ok_or(GoalError::AmountNotFound)?;
        let target_year = self.target_year.ok_or(GoalError::YearNotFound)?;
        Ok(GoalRequest {
            event_name: self.event_name,
            today_cost,
            target_year,
        })
    }
}

/// Best-effort parse that never fails.
pub fn interpret(text: &str, today: NaiveDate) -> ParsedGoal {
    ParsedGoal {
        event_name: extract_event_name(text),
        today_cost: extract_amount(text),
        target_year: extract_year(text, today),
    }
}

pub fn parse_goal(text: &str) -> Result<GoalRequest> {
    parse_goal_at(text, chrono::Local::now().date_naive())
}

pub fn parse_goal_at(text: &str, today: NaiveDate) -> Result<GoalRequest> {
    let parsed = interpret(text, today).complete();
    match &parsed {
        Ok(goal) => tracing::debug!(
            event_name = %goal.event_name,
            today_cost = goal.today_cost,
            target_year = goal.target_year,
            "parsed goal text"
        ),
        Err(err) => tracing::debug!(error = %err, "goal text not understood"),
    }
    parsed
}
