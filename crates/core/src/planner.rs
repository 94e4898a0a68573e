use crate::domain::goal::{GoalRequest, Plan};
use crate::finance::{self, future_value, monthly_saving_needed, years_between};
use crate::ingest::inflation::InflationRateProvider;
use std::sync::Arc;

/// Turns goals into savings plans using the current inflation rate.
#[derive(Clone)]
pub struct PlanCalculator {
    provider: Arc<dyn InflationRateProvider>,
    fallback_percent: f64,
}

impl std::fmt::Debug for PlanCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCalculator")
            .field("provider", &self.provider.provider_name())
            .field("fallback_percent", &self.fallback_percent)
            .finish()
    }
}

impl PlanCalculator {
    /// `fallback_percent` must be positive; `Settings::validate` guarantees it for
    /// configured values.
    pub fn new(provider: Arc<dyn InflationRateProvider>, fallback_percent: f64) -> Self {
        Self {
            provider,
            fallback_percent,
        }
    }

    pub fn fallback_percent(&self) -> f64 {
        self.fallback_percent
    }

    /// The provider's rate, or the fallback when the provider fails or reports a
    /// non-positive rate.
    pub async fn resolve_inflation_percent(&self) -> f64 {
        match self.provider.fetch_inflation().await {
            Ok(rate) if rate.percent.is_finite() && rate.percent > 0.0 => rate.percent,
            Ok(rate) => {
                tracing::warn!(
                    provider = self.provider.provider_name(),
                    percent = rate.percent,
                    fallback = self.fallback_percent,
                    "provider returned unusable inflation rate; using fallback"
                );
                self.fallback_percent
            }
            Err(err) => {
                tracing::warn!(
                    provider = self.provider.provider_name(),
                    fallback = self.fallback_percent,
                    error = %err,
                    "inflation rate unavailable; using fallback"
                );
                self.fallback_percent
            }
        }
    }

    pub async fn plan_event(&self, event_name: &str, today_cost: f64, target_year: i32) -> Plan {
        self.plan_with_override(event_name, today_cost, target_year, None)
            .await
    }

    /// Like [`Self::plan_event`], but a caller-supplied rate skips the provider.
    pub async fn plan_with_override(
        &self,
        event_name: &str,
        today_cost: f64,
        target_year: i32,
        inflation_override_pct: Option<f64>,
    ) -> Plan {
        let inflation_pct = match inflation_override_pct {
            Some(pct) => pct,
            None => self.resolve_inflation_percent().await,
        };
        let request = GoalRequest {
            event_name: event_name.to_string(),
            today_cost,
            target_year,
        };
        build_plan(&request, inflation_pct, finance::current_year())
    }
}

pub fn build_plan(request: &GoalRequest, inflation_pct: f64, current_year: i32) -> Plan {
    let years = years_between(request.target_year, current_year);
    let future_cost = future_value(request.today_cost, inflation_pct, years);
    let monthly = monthly_saving_needed(future_cost, i64::from(years) * 12);

    Plan {
        event_name: request.event_name.clone(),
        target_year: request.target_year,
        today_cost: request.today_cost,
        inflation_percent_used: inflation_pct,
        years_to_goal: years,
        future_cost,
        monthly_saving_needed: monthly,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::goal::InflationRate;
    use chrono::Utc;

    pub(crate) struct FixedRate(pub f64);

    #[async_trait::async_trait]
    impl InflationRateProvider for FixedRate {
        fn provider_name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_inflation(&self) -> anyhow::Result<InflationRate> {
            Ok(InflationRate {
                percent: self.0,
                source: "fixed".to_string(),
                year: 2025,
                fetched_at: Utc::now(),
            })
        }
    }

    pub(crate) struct Unreachable;

    #[async_trait::async_trait]
    impl InflationRateProvider for Unreachable {
        fn provider_name(&self) -> &'static str {
            "unreachable"
        }

        async fn fetch_inflation(&self) -> anyhow::Result<InflationRate> {
            anyhow::bail!("connection refused")
        }
    }

    fn request(cost: f64, year: i32) -> GoalRequest {
        GoalRequest {
            event_name: "Car".to_string(),
            today_cost: cost,
            target_year: year,
        }
    }

    #[test]
    fn build_plan_compounds_and_spreads() {
        let plan = build_plan(&request(100_000.0, 2028), 10.0, 2026);
        assert_eq!(plan.years_to_goal, 2);
        assert_eq!(plan.future_cost, 121_000.0);
        assert_eq!(plan.monthly_saving_needed, 5_041.67);
        assert_eq!(plan.inflation_percent_used, 10.0);
        assert_eq!(plan.event_name, "Car");
    }

    #[test]
    fn build_plan_for_due_goal_needs_everything_now() {
        let plan = build_plan(&request(50_000.0, 2024), 6.0, 2026);
        assert_eq!(plan.years_to_goal, 0);
        assert_eq!(plan.future_cost, 50_000.0);
        assert_eq!(plan.monthly_saving_needed, 50_000.0);
    }

    #[tokio::test]
    async fn uses_provider_rate() {
        let calc = PlanCalculator::new(Arc::new(FixedRate(4.5)), 6.0);
        assert_eq!(calc.resolve_inflation_percent().await, 4.5);
    }

    #[tokio::test]
    async fn provider_failure_falls_back() {
        let calc = PlanCalculator::new(Arc::new(Unreachable), 6.0);
        let year = finance::current_year() + 1;
        let plan = calc.plan_event("Laptop", 100_000.0, year).await;
        assert_eq!(plan.inflation_percent_used, 6.0);
        assert_eq!(plan.years_to_goal, 1);
        assert_eq!(plan.future_cost, 106_000.0);
        assert_eq!(plan.monthly_saving_needed, 8_833.33);
    }

    #[tokio::test]
    async fn non_positive_rate_falls_back() {
        for pct in [0.0, -1.2, f64::NAN] {
            let calc = PlanCalculator::new(Arc::new(FixedRate(pct)), 7.0);
            assert_eq!(calc.resolve_inflation_percent().await, 7.0);
        }
    }

    #[tokio::test]
    async fn override_skips_provider() {
        let calc = PlanCalculator::new(Arc::new(Unreachable), 6.0);
        let year = finance::current_year();
        let plan = calc
            .plan_with_override("Phone", 30_000.0, year, Some(0.0))
            .await;
        assert_eq!(plan.inflation_percent_used, 0.0);
        assert_eq!(plan.future_cost, 30_000.0);
        assert_eq!(plan.monthly_saving_needed, 30_000.0);
    }
}
