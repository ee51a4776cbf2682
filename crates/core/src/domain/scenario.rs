use crate::money;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Scenario kinds a user can pick in the what-if builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    PaymentDelayIn,
    PaymentDelayOut,
    ClientLoss,
    ClientGain,
    Hiring,
    Firing,
    ContractorGain,
    ContractorLoss,
    IncreasedExpense,
    DecreasedExpense,
    ManualExclusion,
}

impl ScenarioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::PaymentDelayIn => "payment_delay_in",
            ScenarioType::PaymentDelayOut => "payment_delay_out",
            ScenarioType::ClientLoss => "client_loss",
            ScenarioType::ClientGain => "client_gain",
            ScenarioType::Hiring => "hiring",
            ScenarioType::Firing => "firing",
            ScenarioType::ContractorGain => "contractor_gain",
            ScenarioType::ContractorLoss => "contractor_loss",
            ScenarioType::IncreasedExpense => "increased_expense",
            ScenarioType::DecreasedExpense => "decreased_expense",
            ScenarioType::ManualExclusion => "manual_exclusion",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let t = match s.trim() {
            "payment_delay_in" => ScenarioType::PaymentDelayIn,
            "payment_delay_out" => ScenarioType::PaymentDelayOut,
            "client_loss" => ScenarioType::ClientLoss,
            "client_gain" => ScenarioType::ClientGain,
            "hiring" => ScenarioType::Hiring,
            "firing" => ScenarioType::Firing,
            "contractor_gain" => ScenarioType::ContractorGain,
            "contractor_loss" => ScenarioType::ContractorLoss,
            "increased_expense" => ScenarioType::IncreasedExpense,
            "decreased_expense" => ScenarioType::DecreasedExpense,
            "manual_exclusion" => ScenarioType::ManualExclusion,
            _ => return None,
        };
        Some(t)
    }
}

/// Override as sent by the what-if builder: a type tag plus loosely typed
/// parameters. Convert with [`Scenario::from_override`] before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOverride {
    #[serde(rename = "type")]
    pub scenario_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_event_ids: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staffing {
    pub monthly_salary: Decimal,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurring {
    pub monthly_amount: Decimal,
    pub start_date: Option<NaiveDate>,
}

/// Strongly typed scenario. Every parameter has already been parsed; malformed
/// numbers arrive here as zero so the scenario has no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    PaymentDelayIn { delay_days: Decimal },
    PaymentDelayOut { delay_days: Decimal },
    ClientLoss,
    ClientGain(Recurring),
    Hiring(Staffing),
    Firing(Staffing),
    ContractorGain(Recurring),
    ContractorLoss(Recurring),
    IncreasedExpense { percentage: Decimal },
    DecreasedExpense { percentage: Decimal },
    ManualExclusion { excluded_event_ids: BTreeSet<String> },
    /// Tag we do not know; applies no adjustment.
    Unrecognized(String),
}

impl Scenario {
    pub fn from_override(o: &ScenarioOverride) -> Self {
        let Some(kind) = ScenarioType::parse(&o.scenario_type) else {
            tracing::debug!(scenario_type = %o.scenario_type, "unrecognized scenario type; no adjustment");
            return Scenario::Unrecognized(o.scenario_type.clone());
        };

        let p = &o.parameters;
        match kind {
            ScenarioType::PaymentDelayIn => Scenario::PaymentDelayIn {
                delay_days: number(p, &["days", "delay_days"]),
            },
            ScenarioType::PaymentDelayOut => Scenario::PaymentDelayOut {
                delay_days: number(p, &["days", "delay_days"]),
            },
            ScenarioType::ClientLoss => Scenario::ClientLoss,
            ScenarioType::ClientGain => Scenario::ClientGain(Recurring {
                monthly_amount: number(p, &["monthly_amount", "amount"]),
                start_date: date(p, "start_date"),
            }),
            ScenarioType::Hiring => Scenario::Hiring(staffing(p)),
            ScenarioType::Firing => Scenario::Firing(staffing(p)),
            ScenarioType::ContractorGain => Scenario::ContractorGain(contractor(p)),
            ScenarioType::ContractorLoss => Scenario::ContractorLoss(contractor(p)),
            ScenarioType::IncreasedExpense => Scenario::IncreasedExpense {
                percentage: number(p, &["percentage"]),
            },
            ScenarioType::DecreasedExpense => Scenario::DecreasedExpense {
                percentage: number(p, &["percentage"]),
            },
            ScenarioType::ManualExclusion => {
                let mut ids = o.excluded_event_ids.clone();
                // Older clients send the ids inside `parameters`.
                if let Some(Value::Array(extra)) = p.get("excluded_event_ids") {
                    ids.extend(extra.iter().filter_map(|v| v.as_str()).map(str::to_string));
                }
                Scenario::ManualExclusion {
                    excluded_event_ids: ids,
                }
            }
        }
    }

    pub fn scenario_type(&self) -> Option<ScenarioType> {
        let t = match self {
            Scenario::PaymentDelayIn { .. } => ScenarioType::PaymentDelayIn,
            Scenario::PaymentDelayOut { .. } => ScenarioType::PaymentDelayOut,
            Scenario::ClientLoss => ScenarioType::ClientLoss,
            Scenario::ClientGain(_) => ScenarioType::ClientGain,
            Scenario::Hiring(_) => ScenarioType::Hiring,
            Scenario::Firing(_) => ScenarioType::Firing,
            Scenario::ContractorGain(_) => ScenarioType::ContractorGain,
            Scenario::ContractorLoss(_) => ScenarioType::ContractorLoss,
            Scenario::IncreasedExpense { .. } => ScenarioType::IncreasedExpense,
            Scenario::DecreasedExpense { .. } => ScenarioType::DecreasedExpense,
            Scenario::ManualExclusion { .. } => ScenarioType::ManualExclusion,
            Scenario::Unrecognized(_) => return None,
        };
        Some(t)
    }
}

fn staffing(p: &BTreeMap<String, Value>) -> Staffing {
    Staffing {
        monthly_salary: number(p, &["monthly_salary", "salary"]),
        start_date: date(p, "start_date"),
    }
}

fn contractor(p: &BTreeMap<String, Value>) -> Recurring {
    Recurring {
        monthly_amount: number(p, &["monthly_rate", "monthly_cost"]),
        start_date: date(p, "start_date"),
    }
}

/// First present key wins. Missing or malformed values are zero.
fn number(p: &BTreeMap<String, Value>, keys: &[&str]) -> Decimal {
    keys.iter()
        .find_map(|k| p.get(*k).map(|v| money::amount_or_zero(k, v)))
        .unwrap_or(Decimal::ZERO)
}

fn date(p: &BTreeMap<String, Value>, key: &str) -> Option<NaiveDate> {
    let raw = p.get(key)?.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    // Accept full timestamps too; only the date part matters.
    let day = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(err) => {
            tracing::warn!(key, raw, error = %err, "malformed scenario date; ignoring");
            None
        }
    }
}
