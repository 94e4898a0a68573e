use crate::domain::goal::{latest_target_year, Plan};
use crate::domain::market::MarketSummary;
use crate::error::{GoalError, Result};
use crate::ingest::market::MarketDataClient;
use crate::nlp;
use crate::planner::PlanCalculator;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const MARKET_KEYWORDS: [&str; 9] = [
    "market", "nifty", "sensex", "index", "stock", "stocks", "indices", "nse", "bse",
];

const HELP_REPLY: &str = "I can help set goals from natural language (e.g., 'Plan wedding Dec 2026 for 8L') and share market summaries. Ask me!";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub plan: Option<Plan>,
    pub market_summary: Option<MarketSummary>,
}

pub fn mentions_market(text: &str) -> bool {
    let lowered = text.to_lowercase();
    MARKET_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Answers one chat message: plans a goal when the text carries both an amount and a
/// year, and appends index levels when it asks about the market.
pub async fn chat(
    message: &str,
    today: NaiveDate,
    planner: &PlanCalculator,
    market: &dyn MarketDataClient,
) -> Result<ChatReply> {
    let text = message.trim();
    if text.is_empty() {
        return Err(GoalError::EmptyMessage);
    }

    let mut lines = Vec::new();

    let plan = match nlp::interpret(text, today).complete() {
        Ok(goal) if goal.target_year > latest_target_year(today.year()) => {
            tracing::info!(
                target_year = goal.target_year,
                "chat goal is past the planning horizon"
            );
            None
        }
        Ok(goal) => {
            let plan = planner
                .plan_event(&goal.event_name, goal.today_cost, goal.target_year)
                .await;
            lines.push(format!(
                "Planned '{}' for {}. Future cost ≈ ₹{}. You'd need ≈ ₹{}/month.",
                plan.event_name,
                plan.target_year,
                group_thousands(plan.future_cost),
                group_thousands(plan.monthly_saving_needed),
            ));
            Some(plan)
        }
        Err(err) => {
            tracing::info!(error = %err, "chat message carries no complete goal");
            None
        }
    };

    let market_summary = if mentions_market(text) {
        let summary = market.index_summary().await;
        lines.push(format!(
            "Market: NIFTY 50 {} {}, SENSEX {} {}.",
            summary.nifty_50.last_price,
            summary.nifty_50.currency,
            summary.sensex.last_price,
            summary.sensex.currency,
        ));
        Some(summary)
    } else {
        None
    };

    if lines.is_empty() {
        lines.push(HELP_REPLY.to_string());
    }

    Ok(ChatReply {
        reply: lines.join(" "),
        plan,
        market_summary,
    })
}

/// Whole rupees with comma thousands separators, truncating paise.
pub fn group_thousands(value: f64) -> String {
    let whole = value.trunc() as i64;
    let digits = whole.unsigned_abs().to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::market::mock_summary;
    use crate::planner::tests::{FixedRate, Unreachable};
    use std::sync::Arc;

    struct StaticMarket;

    #[async_trait::async_trait]
    impl MarketDataClient for StaticMarket {
        async fn index_summary(&self) -> MarketSummary {
            mock_summary()
        }
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.99), "999");
        assert_eq!(group_thousands(1_000.0), "1,000");
        assert_eq!(group_thousands(1_234_567.8), "1,234,567");
        assert_eq!(group_thousands(-45_000.0), "-45,000");
    }

    #[test]
    fn detects_market_keywords() {
        assert!(mentions_market("How is the NIFTY today?"));
        assert!(mentions_market("stocks update"));
        assert!(!mentions_market("Plan a trip"));
    }

    #[tokio::test]
    async fn plans_goal_from_message() {
        let planner = PlanCalculator::new(Arc::new(FixedRate(10.0)), 6.0);
        let year = crate::finance::current_year() + 2;
        let msg = format!("Plan car purchase in {year} for ₹100000");

        let reply = chat(&msg, today(), &planner, &StaticMarket).await.unwrap();
        let plan = reply.plan.unwrap();
        assert_eq!(plan.future_cost, 121_000.0);
        assert_eq!(plan.target_year, year);
        assert!(reply.reply.contains("Future cost ≈ ₹121,000."));
        assert!(reply.reply.contains("₹5,041/month."));
        assert!(reply.market_summary.is_none());
    }

    #[tokio::test]
    async fn market_question_adds_summary() {
        let planner = PlanCalculator::new(Arc::new(Unreachable), 6.0);
        let reply = chat("how is the market?", today(), &planner, &StaticMarket)
            .await
            .unwrap();
        assert!(reply.plan.is_none());
        assert_eq!(reply.market_summary, Some(mock_summary()));
        assert_eq!(
            reply.reply,
            "Market: NIFTY 50 22400.5 INR, SENSEX 74000.3 INR."
        );
    }

    #[tokio::test]
    async fn unrecognised_message_gets_help() {
        let planner = PlanCalculator::new(Arc::new(Unreachable), 6.0);
        let reply = chat("hello there", today(), &planner, &StaticMarket)
            .await
            .unwrap();
        assert_eq!(reply.reply, HELP_REPLY);
        assert!(reply.plan.is_none());
        assert!(reply.market_summary.is_none());
    }

    #[tokio::test]
    async fn far_future_goal_is_not_planned() {
        let planner = PlanCalculator::new(Arc::new(Unreachable), 6.0);
        let reply = chat("Plan trip 9999-01-01 for 5L", today(), &planner, &StaticMarket)
            .await
            .unwrap();
        assert!(reply.plan.is_none());
        assert_eq!(reply.reply, HELP_REPLY);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let planner = PlanCalculator::new(Arc::new(Unreachable), 6.0);
        let err = chat("   ", today(), &planner, &StaticMarket)
            .await
            .unwrap_err();
        assert_eq!(err, GoalError::EmptyMessage);
        assert_eq!(err.to_string(), "message cannot be empty");
    }
}
