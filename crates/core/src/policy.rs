//! Heuristic constants used by the forecast and triage calculators.
//!
//! None of these are derived from data; they are product policy and can be
//! tuned here without touching calculator control flow.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Uncertainty bands.

/// Base spread of a band as a share of the expected value.
pub const BAND_BASE_VARIANCE: Decimal = dec!(0.15);
/// Extra uncertainty added per week of horizon.
pub const BAND_GROWTH_PER_WEEK: Decimal = dec!(0.02);

// Scenario adjustments.

/// Share of a week's cash-in assumed delayed by a late client payment.
pub const DELAYED_INFLOW_SHARE: Decimal = dec!(0.30);
/// Share of a week's cash-out retained when we pay vendors later.
pub const RETAINED_OUTFLOW_SHARE: Decimal = dec!(0.20);
/// Share of total outflow assumed variable (sensitive to expense changes).
pub const VARIABLE_EXPENSE_SHARE: Decimal = dec!(0.6);
/// Share of cash-in assumed to come from a single client.
pub const CLIENT_CONCENTRATION_SHARE: Decimal = dec!(0.25);
/// Salary is amortized as `monthly_salary / MONTHS_PER_YEAR / WEEKS_PER_MONTH`.
pub const MONTHS_PER_YEAR: Decimal = dec!(12);
pub const WEEKS_PER_MONTH: Decimal = dec!(4);
pub const DAYS_PER_WEEK: Decimal = dec!(7);

// Buffer.

/// Default minimum buffer as a share of starting cash.
pub const DEFAULT_BUFFER_RATIO: Decimal = dec!(0.2);

// Rule evaluation.

/// Used when a cash-buffer rule has no configured amount and no live expenses.
pub const DEFAULT_MONTHLY_EXPENSES: Decimal = dec!(50000);
pub const DEFAULT_BUFFER_DAYS: Decimal = dec!(30);
pub const DAYS_PER_MONTH: Decimal = dec!(30);
/// Optimistic current cash (as a multiple of threshold) when no live figure exists.
pub const OPTIMISTIC_CASH_MULTIPLIER: Decimal = dec!(1.2);
/// Below this percentage of threshold a rule is triggered.
pub const RULE_TRIGGERED_BELOW_PCT: Decimal = dec!(75);
/// At or above this percentage a rule is healthy.
pub const RULE_HEALTHY_AT_PCT: Decimal = dec!(100);

// Recommendations.

pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 3;
