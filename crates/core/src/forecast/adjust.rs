use crate::domain::forecast::{Direction, Forecast, ForecastWeek};
use crate::domain::scenario::{Recurring, Scenario, ScenarioOverride, Staffing};
use crate::forecast::buffer::{self, DangerZone};
use crate::policy::{
    CLIENT_CONCENTRATION_SHARE, DAYS_PER_WEEK, DELAYED_INFLOW_SHARE, MONTHS_PER_YEAR,
    RETAINED_OUTFLOW_SHARE, VARIABLE_EXPENSE_SHARE, WEEKS_PER_MONTH,
};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Adjusted ending balance for one week, or `None` when no override is active
/// (callers keep the baseline).
pub fn apply(
    baseline_week: &ForecastWeek,
    week_index: u32,
    override_: Option<&ScenarioOverride>,
) -> Option<Decimal> {
    let scenario = Scenario::from_override(override_?);
    let delta = week_delta(
        baseline_week,
        week_index,
        baseline_week.week_start,
        &scenario,
    );
    Some(adjusted_balance(baseline_week, delta).1)
}

/// Change to the week's ending balance under `scenario`.
///
/// `week_start` gates dated scenarios (hiring and friends); when it is unknown
/// the scenario is treated as already in effect. A change too large to
/// represent has no effect.
pub fn week_delta(
    week: &ForecastWeek,
    week_index: u32,
    week_start: Option<NaiveDate>,
    scenario: &Scenario,
) -> Decimal {
    checked_delta(week, week_index, week_start, scenario).unwrap_or_else(|| {
        tracing::warn!(
            week_number = week.week_number,
            scenario_type = scenario.scenario_type().map(|t| t.as_str()).unwrap_or("unknown"),
            "scenario adjustment overflowed; no effect"
        );
        Decimal::ZERO
    })
}

fn checked_delta(
    week: &ForecastWeek,
    week_index: u32,
    week_start: Option<NaiveDate>,
    scenario: &Scenario,
) -> Option<Decimal> {
    match scenario {
        Scenario::PaymentDelayIn { delay_days } => {
            if week_index < delay_window_weeks(*delay_days) {
                week.cash_in.checked_mul(DELAYED_INFLOW_SHARE).map(|v| -v)
            } else {
                Some(Decimal::ZERO)
            }
        }
        Scenario::PaymentDelayOut { delay_days } => {
            if week_index < delay_window_weeks(*delay_days) {
                week.cash_out.checked_mul(RETAINED_OUTFLOW_SHARE)
            } else {
                Some(Decimal::ZERO)
            }
        }
        Scenario::Hiring(staff) => staffing_weekly(staff, week_start).map(|v| -v),
        Scenario::Firing(staff) => staffing_weekly(staff, week_start),
        Scenario::IncreasedExpense { percentage } => {
            variable_expense_change(week, *percentage).map(|v| -v)
        }
        Scenario::DecreasedExpense { percentage } => variable_expense_change(week, *percentage),
        Scenario::ClientLoss => week.cash_in.checked_mul(CLIENT_CONCENTRATION_SHARE).map(|v| -v),
        Scenario::ClientGain(r) => recurring_weekly(r, week_start),
        Scenario::ContractorGain(r) => recurring_weekly(r, week_start).map(|v| -v),
        Scenario::ContractorLoss(r) => recurring_weekly(r, week_start),
        Scenario::ManualExclusion { excluded_event_ids } => week
            .events
            .iter()
            .filter(|e| excluded_event_ids.contains(&e.id))
            .try_fold(Decimal::ZERO, |acc, e| match e.direction {
                Direction::In => acc.checked_sub(e.amount),
                Direction::Out => acc.checked_add(e.amount),
            }),
        Scenario::Unrecognized(_) => Some(Decimal::ZERO),
    }
}

/// `(delta, adjusted ending balance)`; a delta that would overflow the
/// balance is dropped.
fn adjusted_balance(week: &ForecastWeek, delta: Decimal) -> (Decimal, Decimal) {
    match week.ending_balance.checked_add(delta) {
        Some(balance) => (delta, balance),
        None => {
            tracing::warn!(
                week_number = week.week_number,
                %delta,
                "adjusted balance overflowed; keeping baseline"
            );
            (Decimal::ZERO, week.ending_balance)
        }
    }
}

/// Number of leading weeks a payment delay affects: `ceil(days / 7)`.
fn delay_window_weeks(delay_days: Decimal) -> u32 {
    if delay_days <= Decimal::ZERO {
        return 0;
    }
    (delay_days / DAYS_PER_WEEK)
        .ceil()
        .to_u32()
        .unwrap_or(u32::MAX)
}

fn variable_expense_change(week: &ForecastWeek, percentage: Decimal) -> Option<Decimal> {
    VARIABLE_EXPENSE_SHARE
        .checked_mul(week.cash_out)?
        .checked_mul(percentage.checked_div(dec!(100))?)
}

fn in_effect(start_date: Option<NaiveDate>, week_start: Option<NaiveDate>) -> bool {
    match (start_date, week_start) {
        (Some(start), Some(week)) => week >= start,
        _ => true,
    }
}

fn staffing_weekly(staff: &Staffing, week_start: Option<NaiveDate>) -> Option<Decimal> {
    if !in_effect(staff.start_date, week_start) {
        return Some(Decimal::ZERO);
    }
    staff
        .monthly_salary
        .checked_div(MONTHS_PER_YEAR)?
        .checked_div(WEEKS_PER_MONTH)
}

fn recurring_weekly(r: &Recurring, week_start: Option<NaiveDate>) -> Option<Decimal> {
    if !in_effect(r.start_date, week_start) {
        return Some(Decimal::ZERO);
    }
    r.monthly_amount.checked_div(WEEKS_PER_MONTH)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedWeek {
    pub week_number: u32,
    pub baseline_balance: Decimal,
    pub adjusted_balance: Decimal,
    pub delta: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedForecast {
    /// Override tag as received, `None` for the plain baseline.
    pub scenario_type: Option<String>,
    pub weeks: Vec<AdjustedWeek>,
    pub total_delta: Decimal,
}

impl AdjustedForecast {
    pub fn danger_zone(&self, buffer_amount: Decimal) -> Option<DangerZone> {
        buffer::analyze_balances(
            self.weeks.iter().map(|w| (w.week_number, w.adjusted_balance)),
            buffer_amount,
        )
    }
}

/// Applies `override_` to every week. Without an override the adjusted
/// balances equal the baseline.
pub fn adjust_forecast(
    forecast: &Forecast,
    override_: Option<&ScenarioOverride>,
) -> AdjustedForecast {
    let scenario = override_.map(Scenario::from_override);

    let weeks: Vec<AdjustedWeek> = forecast
        .weeks
        .iter()
        .enumerate()
        .map(|(i, week)| {
            let index = u32::try_from(i).unwrap_or(u32::MAX);
            let delta = scenario
                .as_ref()
                .map(|s| week_delta(week, index, forecast.week_start(i), s))
                .unwrap_or(Decimal::ZERO);
            let (delta, adjusted_balance) = adjusted_balance(week, delta);
            AdjustedWeek {
                week_number: week.week_number,
                baseline_balance: week.ending_balance,
                adjusted_balance,
                delta,
            }
        })
        .collect();

    let total_delta = weeks
        .iter()
        .fold(Decimal::ZERO, |acc, w| acc.saturating_add(w.delta));
    tracing::debug!(
        scenario_type = override_.map(|o| o.scenario_type.as_str()).unwrap_or("none"),
        weeks = weeks.len(),
        %total_delta,
        "adjusted forecast"
    );

    AdjustedForecast {
        scenario_type: override_.map(|o| o.scenario_type.clone()),
        weeks,
        total_delta,
    }
}
