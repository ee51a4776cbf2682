//! Remediation suggestions for a detected risk.
//!
//! Order is fixed: backend-curated controls, then scenario templates keyed by
//! detection type, then a single "Custom Solution" entry that opens the
//! scenario builder. The list is truncated to `max_results`.

use crate::domain::risk::{
    Control, DetectionType, FixAction, FixRecommendation, RecommendationType, RiskAlert,
};
use crate::domain::scenario::ScenarioType;
use crate::money::format_currency;
use rust_decimal::Decimal;

const DEFAULT_ARCHETYPES: &[ScenarioType] =
    &[ScenarioType::PaymentDelayOut, ScenarioType::DecreasedExpense];

/// Scenario templates tried for a detection type, in priority order.
pub fn scenario_archetypes(detection: &DetectionType) -> &'static [ScenarioType] {
    match detection {
        DetectionType::PaymentOverdue => {
            &[ScenarioType::PaymentDelayOut, ScenarioType::DecreasedExpense]
        }
        DetectionType::CashShortfall | DetectionType::PayrollRisk => &[
            ScenarioType::PaymentDelayOut,
            ScenarioType::PaymentDelayIn,
            ScenarioType::DecreasedExpense,
        ],
        DetectionType::ExpenseSpike => {
            &[ScenarioType::DecreasedExpense, ScenarioType::PaymentDelayOut]
        }
        DetectionType::ClientConcentration => {
            &[ScenarioType::ClientGain, ScenarioType::DecreasedExpense]
        }
        DetectionType::Other(_) => DEFAULT_ARCHETYPES,
    }
}

/// Controls whose `linked_risk_ids` mention the alert, in input order.
pub fn controls_for<'a>(alert: &RiskAlert, controls: &'a [Control]) -> Vec<&'a Control> {
    controls
        .iter()
        .filter(|c| c.linked_risk_ids.iter().any(|id| id == &alert.id))
        .collect()
}

pub fn rank(
    alert: &RiskAlert,
    linked_controls: &[Control],
    max_results: usize,
) -> Vec<FixRecommendation> {
    let mut out = Vec::with_capacity(max_results);

    for control in linked_controls {
        if out.len() >= max_results {
            break;
        }
        out.push(control_recommendation(control));
    }

    let detection = DetectionType::parse(&alert.detection_type);
    for &archetype in scenario_archetypes(&detection) {
        if out.len() >= max_results {
            break;
        }
        out.push(scenario_recommendation(alert, archetype));
    }

    if out.len() < max_results {
        out.push(custom_recommendation(alert));
    }

    out.truncate(max_results);
    tracing::debug!(
        alert_id = %alert.id,
        detection_type = %alert.detection_type,
        controls = linked_controls.len(),
        recommendations = out.len(),
        "ranked fixes"
    );
    out
}

fn control_recommendation(control: &Control) -> FixRecommendation {
    let buffer_improvement = match control.impact_amount {
        Some(amount) if amount > Decimal::ZERO => format!("+{} buffer", format_currency(amount)),
        Some(amount) if amount < Decimal::ZERO => format!("{} buffer", format_currency(amount)),
        _ => "Buffer impact not estimated".to_string(),
    };

    FixRecommendation {
        id: format!("control-{}", control.id),
        recommendation_type: RecommendationType::Control,
        title: control.name.clone(),
        description: control.why_it_exists.clone(),
        impact_amount: control.impact_amount,
        buffer_improvement,
        action: FixAction::ApproveControl {
            control_id: control.id.clone(),
        },
    }
}

fn scenario_recommendation(alert: &RiskAlert, archetype: ScenarioType) -> FixRecommendation {
    let (title, blurb) = archetype_copy(archetype);

    let mut description = blurb.to_string();
    if !alert.cash_impact.is_zero() {
        description.push_str(&format!(
            " Exposure on this risk: {}.",
            format_currency(alert.cash_impact.abs())
        ));
    }
    if let Some(deadline) = alert.deadline {
        description.push_str(&format!(" Act before {deadline}."));
    }

    FixRecommendation {
        id: format!("scenario-{}-{}", alert.id, archetype.as_str()),
        recommendation_type: RecommendationType::Scenario,
        title: title.to_string(),
        description,
        impact_amount: None,
        buffer_improvement: "Run the scenario to estimate".to_string(),
        action: FixAction::RunScenario {
            scenario_type: archetype,
            alert_id: alert.id.clone(),
        },
    }
}

fn custom_recommendation(alert: &RiskAlert) -> FixRecommendation {
    let subject = alert.title.as_deref().unwrap_or("this risk");
    FixRecommendation {
        id: format!("custom-{}", alert.id),
        recommendation_type: RecommendationType::Scenario,
        title: "Custom Solution".to_string(),
        description: format!("Build your own scenario to address {subject}."),
        impact_amount: None,
        buffer_improvement: "Depends on your scenario".to_string(),
        action: FixAction::OpenBuilder {
            alert_id: alert.id.clone(),
        },
    }
}

fn archetype_copy(archetype: ScenarioType) -> (&'static str, &'static str) {
    match archetype {
        ScenarioType::PaymentDelayOut => (
            "Delay vendor payments",
            "Push outgoing payments back to keep more cash on hand.",
        ),
        ScenarioType::PaymentDelayIn => (
            "Stress-test a late client payment",
            "See how far a delayed receivable would push the balance down.",
        ),
        ScenarioType::DecreasedExpense => (
            "Reduce variable expenses",
            "Model a cut to variable spend and its effect on the buffer.",
        ),
        ScenarioType::IncreasedExpense => (
            "Model an expense increase",
            "Check the buffer against higher variable spend.",
        ),
        ScenarioType::ClientGain => (
            "Add recurring revenue",
            "Model a new client to reduce dependence on existing ones.",
        ),
        ScenarioType::ClientLoss => (
            "Model losing a client",
            "Check the buffer if your largest client leaves.",
        ),
        ScenarioType::Hiring => ("Model a new hire", "See the cost of adding headcount."),
        ScenarioType::Firing => (
            "Model reducing headcount",
            "See the savings from a smaller payroll.",
        ),
        ScenarioType::ContractorGain => (
            "Model adding a contractor",
            "See the cost of extra contract work.",
        ),
        ScenarioType::ContractorLoss => (
            "Model ending a contract",
            "See the savings from dropping contract work.",
        ),
        ScenarioType::ManualExclusion => (
            "Exclude uncertain transactions",
            "Remove low-confidence items and recheck the forecast.",
        ),
    }
}
