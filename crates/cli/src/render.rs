use cashlens_core::dashboard::DashboardReport;
use cashlens_core::domain::risk::{FixAction, Severity};
use cashlens_core::domain::rule::RuleStatus;
use cashlens_core::forecast::buffer::DangerZone;
use cashlens_core::money::format_currency;
use std::fmt::Write;

pub fn text(report: &DashboardReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Starting cash: {}", format_currency(report.starting_cash));
    let _ = writeln!(out, "Buffer: {}", format_currency(report.buffer_amount));
    if !report.unbalanced_weeks.is_empty() {
        let _ = writeln!(out, "Unbalanced weeks: {:?}", report.unbalanced_weeks);
    }

    let _ = writeln!(out, "{}", zone_line("Danger zone", report.danger_zone.as_ref()));

    if let Some(scenario_type) = &report.adjusted.scenario_type {
        let _ = writeln!(
            out,
            "Scenario: {scenario_type} (total change {})",
            signed(report.adjusted.total_delta)
        );
        let _ = writeln!(
            out,
            "{}",
            zone_line("Adjusted danger zone", report.adjusted_danger_zone.as_ref())
        );
    }

    if !report.rules.is_empty() {
        let _ = writeln!(out, "Rules:");
        for p in &report.rules {
            let name = p.rule.name.as_deref().unwrap_or(&p.rule.id);
            let _ = writeln!(
                out,
                "  [{}] {name}: {}",
                status_label(p.status),
                p.status_message
            );
        }
    }

    if !report.alerts.is_empty() {
        let _ = writeln!(out, "Alerts:");
        for a in &report.alerts {
            let _ = writeln!(
                out,
                "  [{}] {} {}",
                severity_label(a.alert.severity),
                a.alert.id,
                a.alert.detection_type
            );
            for (i, rec) in a.recommendations.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "    {}. {} ({}): {}",
                    i + 1,
                    rec.title,
                    action_label(&rec.action),
                    rec.buffer_improvement
                );
            }
        }
    }

    out.trim_end().to_string()
}

fn zone_line(label: &str, zone: Option<&DangerZone>) -> String {
    match zone {
        None => format!("{label}: none"),
        Some(z) => format!(
            "{label}: weeks {}-{} ({} breached, lowest {} in week {})",
            z.start_week,
            z.end_week,
            z.breached_weeks.len(),
            format_currency(z.lowest_point.amount),
            z.lowest_point.week
        ),
    }
}

fn signed(amount: rust_decimal::Decimal) -> String {
    if amount.is_sign_positive() && !amount.is_zero() {
        format!("+{}", format_currency(amount))
    } else {
        format_currency(amount)
    }
}

fn status_label(status: RuleStatus) -> &'static str {
    match status {
        RuleStatus::Healthy => "healthy",
        RuleStatus::Warning => "warning",
        RuleStatus::Triggered => "triggered",
        RuleStatus::Paused => "paused",
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Urgent => "urgent",
        Severity::High => "high",
        Severity::Normal => "normal",
    }
}

fn action_label(action: &FixAction) -> &'static str {
    match action {
        FixAction::ApproveControl { .. } => "approve control",
        FixAction::RunScenario { .. } => "run scenario",
        FixAction::OpenBuilder { .. } => "open builder",
    }
}
