use crate::domain::risk::RiskAlert;
use std::cmp::Ordering;

/// Display order for the alert list: severity, then earliest deadline (alerts
/// without one last), then larger absolute cash impact, then id.
pub fn triage_order(alerts: &[RiskAlert]) -> Vec<&RiskAlert> {
    let mut sorted: Vec<&RiskAlert> = alerts.iter().collect();
    sorted.sort_by(|a, b| compare_alerts(a, b));
    sorted
}

fn compare_alerts(a: &RiskAlert, b: &RiskAlert) -> Ordering {
    a.severity
        .cmp(&b.severity)
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.cash_impact.abs().cmp(&a.cash_impact.abs()))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alert(v: serde_json::Value) -> RiskAlert {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn orders_by_severity_deadline_and_impact() {
        let alerts = vec![
            alert(json!({"id": "n1", "severity": "normal", "cash_impact": "90000"})),
            alert(json!({"id": "h-late", "severity": "high", "deadline": "2026-04-01"})),
            alert(json!({"id": "h-none-big", "severity": "high", "cash_impact": "-5000"})),
            alert(json!({"id": "h-none-small", "severity": "high", "cash_impact": "100"})),
            alert(json!({"id": "h-soon", "severity": "high", "deadline": "2026-03-01"})),
            alert(json!({"id": "u1", "severity": "urgent"})),
        ];

        let ids: Vec<_> = triage_order(&alerts).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["u1", "h-soon", "h-late", "h-none-big", "h-none-small", "n1"]
        );
    }

    #[test]
    fn ties_break_on_id() {
        let alerts = vec![
            alert(json!({"id": "b", "severity": "normal"})),
            alert(json!({"id": "a", "severity": "normal"})),
        ];
        let ids: Vec<_> = triage_order(&alerts).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
