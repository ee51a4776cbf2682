//! Buffer breaches ("danger zone") over a forecast horizon.
//!
//! `start_week`/`end_week` bound every breached week, so healthy weeks between
//! two breach episodes fall inside the reported span. Callers that need the
//! episodes themselves use [`DangerZone::breach_runs`].

use crate::domain::forecast::ForecastWeek;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowestPoint {
    pub week: u32,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerZone {
    pub start_week: u32,
    pub end_week: u32,
    pub lowest_point: LowestPoint,
    pub breached_weeks: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachRun {
    pub start_week: u32,
    pub end_week: u32,
}

impl DangerZone {
    /// Contiguous runs of breached week numbers.
    pub fn breach_runs(&self) -> Vec<BreachRun> {
        let mut runs: Vec<BreachRun> = Vec::new();
        for &week in &self.breached_weeks {
            match runs.last_mut() {
                Some(run) if run.end_week.checked_add(1) == Some(week) => run.end_week = week,
                _ => runs.push(BreachRun {
                    start_week: week,
                    end_week: week,
                }),
            }
        }
        runs
    }
}

/// Danger zone of the baseline forecast, `None` when no week is below buffer.
pub fn analyze(forecast_weeks: &[ForecastWeek], buffer_amount: Decimal) -> Option<DangerZone> {
    analyze_balances(
        forecast_weeks
            .iter()
            .map(|w| (w.week_number, w.ending_balance)),
        buffer_amount,
    )
}

/// Same analysis over arbitrary `(week_number, ending_balance)` pairs in
/// forecast order.
pub fn analyze_balances<I>(balances: I, buffer_amount: Decimal) -> Option<DangerZone>
where
    I: IntoIterator<Item = (u32, Decimal)>,
{
    let mut breached_weeks = Vec::new();
    let mut lowest: Option<LowestPoint> = None;

    for (week, balance) in balances {
        if balance < buffer_amount {
            breached_weeks.push(week);
        }
        // Strict comparison keeps the first week on ties.
        if lowest.map_or(true, |l| balance < l.amount) {
            lowest = Some(LowestPoint {
                week,
                amount: balance,
            });
        }
    }

    breached_weeks.sort_unstable();
    breached_weeks.dedup();

    let start_week = *breached_weeks.first()?;
    let end_week = *breached_weeks.last()?;
    let lowest_point = lowest?;

    tracing::debug!(
        start_week,
        end_week,
        breached = breached_weeks.len(),
        lowest_week = lowest_point.week,
        %buffer_amount,
        "buffer breached"
    );

    Some(DangerZone {
        start_week,
        end_week,
        lowest_point,
        breached_weeks,
    })
}

/// Rule-configured buffer when present, else `ratio` of starting cash.
pub fn resolve_buffer(
    starting_cash: Decimal,
    configured: Option<Decimal>,
    ratio: Decimal,
) -> Decimal {
    configured.unwrap_or_else(|| starting_cash.saturating_mul(ratio))
}
