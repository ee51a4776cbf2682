use crate::money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rule_type: String,
    #[serde(default)]
    pub config: Value,
    /// Lifecycle status from the rule store (`active`, `paused`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_evaluation: Option<RuleEvaluation>,
}

impl FinancialRule {
    pub fn is_paused(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("paused"))
    }

    pub fn kind(&self) -> RuleKind {
        RuleKind::from_parts(&self.rule_type, &self.config)
    }
}

/// Evaluation computed by the backend. Preferred over local computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub status: String,
    #[serde(default, deserialize_with = "money::lenient")]
    pub current_value: Decimal,
    #[serde(default, deserialize_with = "money::lenient")]
    pub threshold_value: Decimal,
    #[serde(default, deserialize_with = "money::lenient")]
    pub percentage: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Healthy,
    Warning,
    Triggered,
    Paused,
}

impl RuleStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "healthy" => Some(RuleStatus::Healthy),
            "warning" => Some(RuleStatus::Warning),
            "triggered" => Some(RuleStatus::Triggered),
            "paused" => Some(RuleStatus::Paused),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CashBufferConfig {
    /// Explicit minimum cash amount.
    pub amount: Option<Decimal>,
    /// Buffer expressed as days of expenses; used when `amount` is absent.
    pub days_of_expenses: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    CashBuffer(CashBufferConfig),
    /// A rule type with no local formula.
    Unmodelled(String),
}

impl RuleKind {
    pub fn from_parts(rule_type: &str, config: &Value) -> Self {
        match rule_type.trim() {
            "cash_buffer" | "minimum_cash_buffer" => RuleKind::CashBuffer(CashBufferConfig {
                amount: positive(config, &["amount", "min_amount", "threshold"]),
                days_of_expenses: positive(config, &["days_of_expenses", "days"]),
            }),
            other => RuleKind::Unmodelled(other.to_string()),
        }
    }
}

/// Non-positive and malformed values are treated as absent.
fn positive(config: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter()
        .filter_map(|k| config.get(*k))
        .find_map(money::amount_from_value)
        .filter(|d| *d > Decimal::ZERO)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMetrics {
    #[serde(default, deserialize_with = "money::lenient_opt")]
    pub current_cash: Option<Decimal>,
    #[serde(default, deserialize_with = "money::lenient_opt")]
    pub monthly_expenses: Option<Decimal>,
}

/// Which branch of the evaluator produced a [`RuleProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    Paused,
    Authoritative,
    Computed,
    Placeholder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleProgress {
    pub rule: FinancialRule,
    pub current_value: Decimal,
    pub threshold_value: Decimal,
    pub progress_percentage: Decimal,
    pub status: RuleStatus,
    pub status_message: String,
    pub source: EvaluationSource,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn cash_buffer_config_is_typed() {
        let kind = RuleKind::from_parts("cash_buffer", &json!({"amount": "20000", "days": 45}));
        assert_eq!(
            kind,
            RuleKind::CashBuffer(CashBufferConfig {
                amount: Some(dec!(20000)),
                days_of_expenses: Some(dec!(45)),
            })
        );
    }

    #[test]
    fn bad_config_values_are_absent() {
        let kind = RuleKind::from_parts("cash_buffer", &json!({"amount": "soon", "days": -3}));
        assert_eq!(kind, RuleKind::CashBuffer(CashBufferConfig::default()));

        let kind = RuleKind::from_parts("cash_buffer", &Value::Null);
        assert_eq!(kind, RuleKind::CashBuffer(CashBufferConfig::default()));
    }

    #[test]
    fn other_rule_types_are_unmodelled() {
        assert_eq!(
            RuleKind::from_parts("tax_vault", &json!({})),
            RuleKind::Unmodelled("tax_vault".to_string())
        );
    }

    #[test]
    fn paused_status_is_case_insensitive() {
        let rule: FinancialRule = serde_json::from_value(json!({
            "id": "r1",
            "rule_type": "cash_buffer",
            "status": "Paused"
        }))
        .unwrap();
        assert!(rule.is_paused());
    }

    #[test]
    fn parses_evaluation_status() {
        assert_eq!(RuleStatus::parse("TRIGGERED"), Some(RuleStatus::Triggered));
        assert_eq!(RuleStatus::parse("on fire"), None);
    }
}
