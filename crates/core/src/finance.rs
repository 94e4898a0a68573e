use chrono::Datelike;

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Whole years from now until `target_year`, never negative.
pub fn years_until(target_year: i32) -> u32 {
    years_between(target_year, current_year())
}

pub fn years_between(target_year: i32, current_year: i32) -> u32 {
    u32::try_from(i64::from(target_year) - i64::from(current_year)).unwrap_or(0)
}

/// Compounds `today_cost` annually at `annual_inflation_pct` for `years`.
pub fn future_value(today_cost: f64, annual_inflation_pct: f64, years: u32) -> f64 {
    let rate = annual_inflation_pct / 100.0;
    let exponent = i32::try_from(years).unwrap_or(i32::MAX);
    round2(today_cost * (1.0 + rate).powi(exponent))
}

/// Spreads `future_cost` evenly over `months`. A goal that is already due needs the
/// whole amount now.
pub fn monthly_saving_needed(future_cost: f64, months: i64) -> f64 {
    if months <= 0 {
        return round2(future_cost);
    }
    round2(future_cost / months as f64)
}

/// Rounds to cents, ties to even on the exact binary value (`0.125` gives `0.12`).
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
