use crate::domain::scenario::ScenarioType;
use crate::money;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    pub id: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub detection_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "money::lenient")]
    pub cash_impact: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub context_data: Value,
}

/// Declared most urgent first; `Ord` follows declaration order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Urgent,
    High,
    #[default]
    Normal,
}

/// Known detector outputs. Anything else maps to `Other` and gets the default
/// scenario pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionType {
    PaymentOverdue,
    CashShortfall,
    PayrollRisk,
    ExpenseSpike,
    ClientConcentration,
    Other(String),
}

impl DetectionType {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "payment_overdue" => DetectionType::PaymentOverdue,
            "cash_shortfall" => DetectionType::CashShortfall,
            "payroll_risk" => DetectionType::PayrollRisk,
            "expense_spike" => DetectionType::ExpenseSpike,
            "client_concentration" => DetectionType::ClientConcentration,
            other => DetectionType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub why_it_exists: String,
    #[serde(default, deserialize_with = "money::lenient_opt")]
    pub impact_amount: Option<Decimal>,
    #[serde(default)]
    pub linked_risk_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Control,
    Scenario,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FixAction {
    ApproveControl {
        control_id: String,
    },
    RunScenario {
        scenario_type: ScenarioType,
        alert_id: String,
    },
    OpenBuilder {
        alert_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRecommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_amount: Option<Decimal>,
    pub buffer_improvement: String,
    pub action: FixAction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn alert_defaults_when_fields_missing() {
        let alert: RiskAlert = serde_json::from_value(json!({"id": "r1"})).unwrap();
        assert_eq!(alert.severity, Severity::Normal);
        assert_eq!(alert.cash_impact, Decimal::ZERO);
        assert_eq!(alert.deadline, None);
    }

    #[test]
    fn severity_orders_urgent_first() {
        assert!(Severity::Urgent < Severity::High);
        assert!(Severity::High < Severity::Normal);
    }

    #[test]
    fn control_impact_parses_strings() {
        let c: Control = serde_json::from_value(json!({
            "id": "c1",
            "name": "Pause ad spend",
            "impact_amount": "4500.00",
            "linked_risk_ids": ["r1"]
        }))
        .unwrap();
        assert_eq!(c.impact_amount, Some(dec!(4500)));
    }

    #[test]
    fn action_serializes_with_type_and_payload() {
        let a = FixAction::RunScenario {
            scenario_type: ScenarioType::PaymentDelayOut,
            alert_id: "r1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            json!({
                "type": "run_scenario",
                "payload": {"scenario_type": "payment_delay_out", "alert_id": "r1"}
            })
        );
    }

    #[test]
    fn unknown_detection_type_is_other() {
        assert_eq!(
            DetectionType::parse("cash_shortfall"),
            DetectionType::CashShortfall
        );
        assert_eq!(
            DetectionType::parse("solar_flare"),
            DetectionType::Other("solar_flare".to_string())
        );
    }
}
