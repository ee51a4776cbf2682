//! One forecast view: everything the dashboard renders for the current
//! forecast, override, rules and open alerts.

use crate::domain::forecast::Forecast;
use crate::domain::risk::{Control, FixRecommendation, RiskAlert};
use crate::domain::rule::{FinancialRule, LiveMetrics, RuleKind, RuleProgress};
use crate::domain::scenario::ScenarioOverride;
use crate::forecast::adjust::{self, AdjustedForecast};
use crate::forecast::bands::{self, WeekBands};
use crate::forecast::buffer::{self, DangerZone};
use crate::money;
use crate::policy::{
    DEFAULT_BUFFER_RATIO, DEFAULT_MAX_RECOMMENDATIONS, DEFAULT_MONTHLY_EXPENSES,
};
use crate::triage::{alerts, fixes, rules};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the backend hands over for one view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardInput {
    pub forecast: Forecast,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioOverride>,
    /// Explicit buffer; otherwise taken from a cash-buffer rule or derived
    /// from starting cash.
    #[serde(
        default,
        deserialize_with = "money::lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub buffer_amount: Option<Decimal>,
    #[serde(default)]
    pub alerts: Vec<RiskAlert>,
    #[serde(default)]
    pub controls: Vec<Control>,
    #[serde(default)]
    pub rules: Vec<FinancialRule>,
    #[serde(default)]
    pub metrics: LiveMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub max_recommendations: usize,
    pub buffer_ratio: Decimal,
    pub fallback_monthly_expenses: Decimal,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            buffer_ratio: DEFAULT_BUFFER_RATIO,
            fallback_monthly_expenses: DEFAULT_MONTHLY_EXPENSES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertFixes {
    pub alert: RiskAlert,
    pub recommendations: Vec<FixRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub starting_cash: Decimal,
    pub buffer_amount: Decimal,
    pub bands: Vec<WeekBands>,
    pub adjusted: AdjustedForecast,
    pub danger_zone: Option<DangerZone>,
    pub adjusted_danger_zone: Option<DangerZone>,
    pub rules: Vec<RuleProgress>,
    pub alerts: Vec<AlertFixes>,
    /// Weeks whose balances do not satisfy `ending = starting + in - out`.
    pub unbalanced_weeks: Vec<u32>,
}

/// Buffer from the first active cash-buffer rule with an explicit amount.
pub fn configured_buffer(rules: &[FinancialRule]) -> Option<Decimal> {
    rules
        .iter()
        .filter(|r| !r.is_paused())
        .find_map(|r| match r.kind() {
            RuleKind::CashBuffer(config) => config.amount,
            RuleKind::Unmodelled(_) => None,
        })
}

pub fn build(input: &DashboardInput, opts: &DashboardOptions) -> DashboardReport {
    let forecast = &input.forecast;

    let unbalanced_weeks = forecast.unbalanced_weeks();
    if !unbalanced_weeks.is_empty() {
        tracing::warn!(weeks = ?unbalanced_weeks, "forecast weeks do not balance");
    }

    let buffer_amount = buffer::resolve_buffer(
        forecast.starting_cash,
        input.buffer_amount.or_else(|| configured_buffer(&input.rules)),
        opts.buffer_ratio,
    );

    let adjusted = adjust::adjust_forecast(forecast, input.scenario.as_ref());
    let danger_zone = buffer::analyze(&forecast.weeks, buffer_amount);
    let adjusted_danger_zone = input
        .scenario
        .as_ref()
        .and_then(|_| adjusted.danger_zone(buffer_amount));

    let rule_progress: Vec<RuleProgress> =
        rules::evaluate_all(&input.rules, &input.metrics, opts.fallback_monthly_expenses);

    let alert_fixes: Vec<AlertFixes> = alerts::triage_order(&input.alerts)
        .into_iter()
        .map(|alert| {
            let linked: Vec<Control> = fixes::controls_for(alert, &input.controls)
                .into_iter()
                .cloned()
                .collect();
            AlertFixes {
                alert: alert.clone(),
                recommendations: fixes::rank(alert, &linked, opts.max_recommendations),
            }
        })
        .collect();

    DashboardReport {
        starting_cash: forecast.starting_cash,
        buffer_amount,
        bands: bands::forecast_bands(forecast),
        adjusted,
        danger_zone,
        adjusted_danger_zone,
        rules: rule_progress,
        alerts: alert_fixes,
        unbalanced_weeks,
    }
}
