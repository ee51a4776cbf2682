use crate::money;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Tolerance for `ending = starting + in - out`.
const BALANCE_TOLERANCE: Decimal = dec!(0.01);

/// Baseline forecast as supplied by the forecast source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default, deserialize_with = "money::lenient")]
    pub starting_cash: Decimal,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub weeks: Vec<ForecastWeek>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastWeek {
    pub week_number: u32,
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "money::lenient")]
    pub starting_balance: Decimal,
    #[serde(default, deserialize_with = "money::lenient")]
    pub cash_in: Decimal,
    #[serde(default, deserialize_with = "money::lenient")]
    pub cash_out: Decimal,
    #[serde(default, deserialize_with = "money::lenient")]
    pub ending_balance: Decimal,
    #[serde(default)]
    pub events: Vec<ForecastEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEvent {
    pub id: String,
    pub direction: Direction,
    #[serde(default, deserialize_with = "money::lenient")]
    pub amount: Decimal,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

/// A single weekly value with its uncertainty band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAmount {
    pub week_number: u32,
    pub expected: Decimal,
    pub best_case: Decimal,
    pub worst_case: Decimal,
}

impl ForecastWeek {
    /// Balances too large to add up are reported as unbalanced.
    pub fn is_balanced(&self) -> bool {
        self.starting_balance
            .checked_add(self.cash_in)
            .and_then(|v| v.checked_sub(self.cash_out))
            .and_then(|computed| computed.checked_sub(self.ending_balance))
            .is_some_and(|diff| diff.abs() <= BALANCE_TOLERANCE)
    }
}

impl Forecast {
    /// Start date of the week at `index`: the week's own date when the backend
    /// sent one, else derived from the forecast start date.
    pub fn week_start(&self, index: usize) -> Option<NaiveDate> {
        let week = self.weeks.get(index)?;
        week.week_start.or_else(|| {
            let start = self.start_date?;
            let offset = i64::try_from(index).ok()?.checked_mul(7)?;
            start.checked_add_signed(Duration::days(offset))
        })
    }

    /// Week numbers whose balances do not add up. Logged by callers; never fatal.
    pub fn unbalanced_weeks(&self) -> Vec<u32> {
        self.weeks
            .iter()
            .filter(|w| !w.is_balanced())
            .map(|w| w.week_number)
            .collect()
    }
}
