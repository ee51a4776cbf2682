use crate::domain::rule::{
    CashBufferConfig, EvaluationSource, FinancialRule, LiveMetrics, RuleEvaluation, RuleKind,
    RuleProgress, RuleStatus,
};
use crate::money::format_currency;
use crate::policy::{
    DAYS_PER_MONTH, DEFAULT_BUFFER_DAYS, DEFAULT_MONTHLY_EXPENSES, OPTIMISTIC_CASH_MULTIPLIER,
    RULE_HEALTHY_AT_PCT, RULE_TRIGGERED_BELOW_PCT,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// What an evaluation is based on. Decided once, before any arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis<'a> {
    Paused,
    Authoritative(&'a RuleEvaluation, RuleStatus),
    Computed,
}

pub fn basis(rule: &FinancialRule) -> Basis<'_> {
    if rule.is_paused() {
        return Basis::Paused;
    }

    match &rule.current_evaluation {
        Some(eval) => match RuleStatus::parse(&eval.status) {
            Some(status) => Basis::Authoritative(eval, status),
            None => {
                tracing::warn!(
                    rule_id = %rule.id,
                    status = %eval.status,
                    "unknown evaluation status from backend; computing locally"
                );
                Basis::Computed
            }
        },
        None => Basis::Computed,
    }
}

pub fn evaluate(rule: &FinancialRule, live_metrics: &LiveMetrics) -> RuleProgress {
    evaluate_with(rule, live_metrics, DEFAULT_MONTHLY_EXPENSES)
}

/// Like [`evaluate`] with an explicit monthly-expense fallback for cash-buffer
/// thresholds. Never fails; missing metrics fall back to optimistic defaults.
pub fn evaluate_with(
    rule: &FinancialRule,
    live_metrics: &LiveMetrics,
    fallback_monthly_expenses: Decimal,
) -> RuleProgress {
    match basis(rule) {
        Basis::Paused => RuleProgress {
            rule: rule.clone(),
            current_value: Decimal::ZERO,
            threshold_value: Decimal::ZERO,
            progress_percentage: Decimal::ZERO,
            status: RuleStatus::Paused,
            status_message: "Rule paused".to_string(),
            source: EvaluationSource::Paused,
        },
        Basis::Authoritative(eval, status) => RuleProgress {
            rule: rule.clone(),
            current_value: eval.current_value,
            threshold_value: eval.threshold_value,
            progress_percentage: eval.percentage,
            status,
            status_message: eval
                .message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| default_message(status).to_string()),
            source: EvaluationSource::Authoritative,
        },
        Basis::Computed => match rule.kind() {
            RuleKind::CashBuffer(config) => {
                cash_buffer(rule, &config, live_metrics, fallback_monthly_expenses)
            }
            RuleKind::Unmodelled(rule_type) => {
                tracing::debug!(rule_id = %rule.id, %rule_type, "no local formula; monitoring placeholder");
                RuleProgress {
                    rule: rule.clone(),
                    current_value: Decimal::ZERO,
                    threshold_value: Decimal::ZERO,
                    progress_percentage: dec!(100),
                    status: RuleStatus::Healthy,
                    status_message: "Monitoring active".to_string(),
                    source: EvaluationSource::Placeholder,
                }
            }
        },
    }
}

/// Evaluates every rule in input order.
pub fn evaluate_all(
    rules: &[FinancialRule],
    live_metrics: &LiveMetrics,
    fallback_monthly_expenses: Decimal,
) -> Vec<RuleProgress> {
    rules
        .iter()
        .map(|r| evaluate_with(r, live_metrics, fallback_monthly_expenses))
        .collect()
}

fn cash_buffer(
    rule: &FinancialRule,
    config: &CashBufferConfig,
    live_metrics: &LiveMetrics,
    fallback_monthly_expenses: Decimal,
) -> RuleProgress {
    let threshold = config.amount.unwrap_or_else(|| {
        let monthly = live_metrics
            .monthly_expenses
            .filter(|m| *m > Decimal::ZERO)
            .unwrap_or(fallback_monthly_expenses);
        let days = config.days_of_expenses.unwrap_or(DEFAULT_BUFFER_DAYS);
        match monthly.checked_mul(days) {
            Some(total) => total / DAYS_PER_MONTH,
            None => {
                tracing::warn!(rule_id = %rule.id, %monthly, %days, "buffer threshold overflowed; saturating");
                Decimal::MAX
            }
        }
    });
    let current = live_metrics
        .current_cash
        .unwrap_or_else(|| threshold.saturating_mul(OPTIMISTIC_CASH_MULTIPLIER));

    if threshold <= Decimal::ZERO {
        return RuleProgress {
            rule: rule.clone(),
            current_value: current,
            threshold_value: threshold,
            progress_percentage: dec!(100),
            status: RuleStatus::Healthy,
            status_message: "No buffer required".to_string(),
            source: EvaluationSource::Computed,
        };
    }

    let percentage = current
        .checked_div(threshold)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .unwrap_or_else(|| {
            tracing::warn!(rule_id = %rule.id, %current, %threshold, "buffer percentage overflowed; saturating");
            if current.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        });
    let status = classify(percentage);
    let shown = percentage.round_dp(0);
    let status_message = match status {
        RuleStatus::Healthy => format!(
            "Cash of {} covers the {} buffer",
            format_currency(current),
            format_currency(threshold)
        ),
        RuleStatus::Warning => format!(
            "Cash is at {shown}% of the {} buffer",
            format_currency(threshold)
        ),
        _ => format!(
            "Cash is at {shown}% of the {} buffer, below the {}% trigger",
            format_currency(threshold),
            RULE_TRIGGERED_BELOW_PCT
        ),
    };

    RuleProgress {
        rule: rule.clone(),
        current_value: current,
        threshold_value: threshold,
        progress_percentage: percentage.round_dp(2),
        status,
        status_message,
        source: EvaluationSource::Computed,
    }
}

pub fn classify(percentage: Decimal) -> RuleStatus {
    if percentage < RULE_TRIGGERED_BELOW_PCT {
        RuleStatus::Triggered
    } else if percentage < RULE_HEALTHY_AT_PCT {
        RuleStatus::Warning
    } else {
        RuleStatus::Healthy
    }
}

fn default_message(status: RuleStatus) -> &'static str {
    match status {
        RuleStatus::Healthy => "On track",
        RuleStatus::Warning => "Approaching threshold",
        RuleStatus::Triggered => "Threshold breached",
        RuleStatus::Paused => "Rule paused",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(v: serde_json::Value) -> FinancialRule {
        serde_json::from_value(v).unwrap()
    }

    fn metrics(cash: Option<Decimal>, expenses: Option<Decimal>) -> LiveMetrics {
        LiveMetrics {
            current_cash: cash,
            monthly_expenses: expenses,
        }
    }

    #[test]
    fn paused_wins_over_everything() {
        let r = rule(json!({
            "id": "r1",
            "rule_type": "cash_buffer",
            "config": {"amount": 10000},
            "status": "paused",
            "current_evaluation": {"status": "triggered", "current_value": 1, "threshold_value": 10, "percentage": 10}
        }));
        for m in [
            metrics(None, None),
            metrics(Some(dec!(0)), Some(dec!(1))),
            metrics(Some(dec!(1000000)), None),
        ] {
            let p = evaluate(&r, &m);
            assert_eq!(p.status, RuleStatus::Paused);
            assert_eq!(p.progress_percentage, Decimal::ZERO);
            assert_eq!(p.source, EvaluationSource::Paused);
        }
    }

    #[test]
    fn authoritative_evaluation_passes_through() {
        let r = rule(json!({
            "id": "r1",
            "rule_type": "cash_buffer",
            "config": {"amount": 10000},
            "status": "active",
            "current_evaluation": {
                "status": "warning",
                "current_value": "8800",
                "threshold_value": "10000",
                "percentage": "88",
                "message": "Buffer slipping"
            }
        }));

        assert!(matches!(basis(&r), Basis::Authoritative(_, RuleStatus::Warning)));
        // Live metrics would say healthy; the backend figure wins.
        let p = evaluate(&r, &metrics(Some(dec!(50000)), None));
        assert_eq!(p.status, RuleStatus::Warning);
        assert_eq!(p.current_value, dec!(8800));
        assert_eq!(p.threshold_value, dec!(10000));
        assert_eq!(p.progress_percentage, dec!(88));
        assert_eq!(p.status_message, "Buffer slipping");
        assert_eq!(p.source, EvaluationSource::Authoritative);
    }

    #[test]
    fn unknown_authoritative_status_falls_back_to_computation() {
        let r = rule(json!({
            "id": "r1",
            "rule_type": "cash_buffer",
            "config": {"amount": 10000},
            "current_evaluation": {"status": "mystery", "percentage": 5}
        }));
        assert_eq!(basis(&r), Basis::Computed);
        let p = evaluate(&r, &metrics(Some(dec!(12000)), None));
        assert_eq!(p.status, RuleStatus::Healthy);
        assert_eq!(p.source, EvaluationSource::Computed);
    }

    #[test]
    fn cash_buffer_classifies_by_percentage() {
        let r = rule(json!({"id": "r1", "rule_type": "cash_buffer", "config": {"amount": "10000"}}));

        let p = evaluate(&r, &metrics(Some(dec!(7000)), None));
        assert_eq!(p.status, RuleStatus::Triggered);
        assert_eq!(p.progress_percentage, dec!(70));

        let p = evaluate(&r, &metrics(Some(dec!(7500)), None));
        assert_eq!(p.status, RuleStatus::Warning);

        let p = evaluate(&r, &metrics(Some(dec!(9999)), None));
        assert_eq!(p.status, RuleStatus::Warning);

        let p = evaluate(&r, &metrics(Some(dec!(10000)), None));
        assert_eq!(p.status, RuleStatus::Healthy);
        assert_eq!(p.status_message, "Cash of $10,000 covers the $10,000 buffer");
    }

    #[test]
    fn threshold_from_days_of_expenses() {
        let r = rule(json!({"id": "r1", "rule_type": "cash_buffer", "config": {"days_of_expenses": 45}}));
        // 30000 * 45 / 30 = 45000
        let p = evaluate(&r, &metrics(Some(dec!(22500)), Some(dec!(30000))));
        assert_eq!(p.threshold_value, dec!(45000));
        assert_eq!(p.progress_percentage, dec!(50));
        assert_eq!(p.status, RuleStatus::Triggered);
    }

    #[test]
    fn missing_metrics_are_optimistic() {
        let r = rule(json!({"id": "r1", "rule_type": "cash_buffer"}));
        let p = evaluate(&r, &LiveMetrics::default());
        assert_eq!(p.threshold_value, DEFAULT_MONTHLY_EXPENSES);
        assert_eq!(p.current_value, DEFAULT_MONTHLY_EXPENSES * dec!(1.2));
        assert_eq!(p.progress_percentage, dec!(120));
        assert_eq!(p.status, RuleStatus::Healthy);
    }

    #[test]
    fn fallback_expenses_are_configurable() {
        let r = rule(json!({"id": "r1", "rule_type": "cash_buffer"}));
        let p = evaluate_with(&r, &metrics(Some(dec!(10000)), None), dec!(20000));
        assert_eq!(p.threshold_value, dec!(20000));
        assert_eq!(p.status, RuleStatus::Triggered);
    }

    #[test]
    fn zero_threshold_is_healthy() {
        let r = rule(json!({"id": "r1", "rule_type": "cash_buffer"}));
        let p = evaluate_with(&r, &metrics(Some(dec!(10)), None), Decimal::ZERO);
        assert_eq!(p.status, RuleStatus::Healthy);
        assert_eq!(p.progress_percentage, dec!(100));
    }

    #[test]
    fn huge_cash_against_tiny_buffer_saturates() {
        let r = rule(json!({"id": "r1", "rule_type": "cash_buffer", "config": {"amount": "0.0000000001"}}));
        let p = evaluate(&r, &metrics(Some(dec!(1000000000000000000000)), None));
        assert_eq!(p.status, RuleStatus::Healthy);
        assert_eq!(p.progress_percentage, Decimal::MAX);
        assert_eq!(p.source, EvaluationSource::Computed);

        let p = evaluate(&r, &metrics(Some(dec!(-1000000000000000000000)), None));
        assert_eq!(p.status, RuleStatus::Triggered);
        assert_eq!(p.progress_percentage, Decimal::MIN);
    }

    #[test]
    fn huge_expenses_saturate_threshold() {
        let r = rule(json!({"id": "r1", "rule_type": "cash_buffer", "config": {"days_of_expenses": 90}}));
        let p = evaluate(&r, &metrics(None, Some(Decimal::MAX)));
        assert_eq!(p.threshold_value, Decimal::MAX);
        assert_eq!(p.current_value, Decimal::MAX);
        assert_eq!(p.status, RuleStatus::Healthy);
    }

    #[test]
    fn other_rule_types_get_placeholder() {
        let r = rule(json!({"id": "r2", "rule_type": "tax_vault", "config": {"percent": 30}}));
        let p = evaluate(&r, &metrics(Some(dec!(1)), None));
        assert_eq!(p.status, RuleStatus::Healthy);
        assert_eq!(p.progress_percentage, dec!(100));
        assert_eq!(p.status_message, "Monitoring active");
        assert_eq!(p.source, EvaluationSource::Placeholder);
    }

    #[test]
    fn evaluate_all_keeps_order() {
        let rules = vec![
            rule(json!({"id": "a", "rule_type": "tax_vault"})),
            rule(json!({"id": "b", "rule_type": "cash_buffer", "status": "paused"})),
        ];
        let out = evaluate_all(&rules, &LiveMetrics::default(), DEFAULT_MONTHLY_EXPENSES);
        let ids: Vec<_> = out.iter().map(|p| p.rule.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
