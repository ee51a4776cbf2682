use anyhow::Context;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cashlens_core::dashboard::{DashboardInput, DashboardOptions};
use cashlens_core::domain::scenario::ScenarioOverride;

mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "cashlens", about = "Evaluate a cash-flow dashboard bundle")]
struct Args {
    /// Dashboard bundle JSON (forecast, alerts, controls, rules, metrics).
    #[arg(long)]
    input: PathBuf,

    /// Scenario override JSON; replaces any override in the bundle.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Minimum cash buffer. Defaults to the bundle's, a cash-buffer rule, or a
    /// share of starting cash.
    #[arg(long)]
    buffer: Option<String>,

    /// Recommendations per alert.
    #[arg(long)]
    max_recommendations: Option<usize>,

    /// First forecast week (YYYY-MM-DD) when the bundle has none. Defaults to
    /// this week's Monday.
    #[arg(long)]
    start_date: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = cashlens_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match run(&args, settings.dashboard_options()) {
        Ok(out) => {
            println!("{out}");
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, input = %args.input.display(), "dashboard run failed");
            Err(err)
        }
    }
}

fn run(args: &Args, mut opts: DashboardOptions) -> anyhow::Result<String> {
    let mut input: DashboardInput = read_json(&args.input)?;

    if let Some(path) = &args.scenario {
        let scenario: ScenarioOverride = read_json(path)?;
        input.scenario = Some(scenario);
    }

    if let Some(raw) = &args.buffer {
        let amount = cashlens_core::money::parse_amount(raw)
            .with_context(|| format!("--buffer is not a number: {raw}"))?;
        anyhow::ensure!(amount >= Decimal::ZERO, "--buffer must not be negative");
        input.buffer_amount = Some(amount);
    }

    if let Some(n) = args.max_recommendations {
        anyhow::ensure!(n >= 1, "--max-recommendations must be >= 1");
        opts.max_recommendations = n;
    }

    if input.forecast.start_date.is_none() {
        let start = cashlens_core::time::weeks::resolve_start_date(
            args.start_date.as_deref(),
            chrono::Utc::now(),
        )?;
        input.forecast.start_date = Some(start);
    }

    tracing::info!(
        weeks = input.forecast.weeks.len(),
        alerts = input.alerts.len(),
        rules = input.rules.len(),
        scenario = input.scenario.as_ref().map(|s| s.scenario_type.as_str()).unwrap_or("none"),
        "building dashboard report"
    );

    let report = cashlens_core::dashboard::build(&input, &opts);

    match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&report).context("failed to serialize report")
        }
        OutputFormat::Text => Ok(render::text(&report)),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a valid bundle", path.display()))
}

fn init_sentry(settings: &cashlens_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_temp(name: &str, value: &serde_json::Value) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cashlens-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn bundle() -> serde_json::Value {
        json!({
            "forecast": {
                "starting_cash": "10000",
                "weeks": [
                    {"week_number": 0, "starting_balance": "10000", "cash_in": "1000", "cash_out": "8500", "ending_balance": "2500"},
                    {"week_number": 1, "starting_balance": "2500", "cash_in": "1000", "cash_out": "1700", "ending_balance": "1800"}
                ]
            },
            "alerts": [{"id": "r1", "severity": "high", "detection_type": "cash_shortfall"}]
        })
    }

    fn args(input: PathBuf, format: OutputFormat) -> Args {
        Args {
            input,
            scenario: None,
            buffer: None,
            max_recommendations: None,
            start_date: Some("2026-01-05".to_string()),
            format,
        }
    }

    #[test]
    fn json_output_contains_danger_zone() {
        let path = write_temp("json_bundle.json", &bundle());
        let out = run(&args(path, OutputFormat::Json), DashboardOptions::default()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["danger_zone"]["breached_weeks"], json!([1]));
        assert_eq!(v["alerts"][0]["recommendations"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn text_output_summarizes() {
        let path = write_temp("text_bundle.json", &bundle());
        let mut a = args(path, OutputFormat::Text);
        a.max_recommendations = Some(1);
        let out = run(&a, DashboardOptions::default()).unwrap();
        assert!(out.contains("Buffer: $2,000"));
        assert!(out.contains("Danger zone: weeks 1-1"));
        assert!(out.contains("Delay vendor payments"));
        assert!(!out.contains("Stress-test"));
    }

    #[test]
    fn buffer_flag_overrides_bundle() {
        let path = write_temp("buffer_bundle.json", &bundle());
        let mut a = args(path, OutputFormat::Json);
        a.buffer = Some("1000".to_string());
        let out = run(&a, DashboardOptions::default()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(v["danger_zone"].is_null());
    }

    #[test]
    fn rejects_bad_flags_and_files() {
        let path = write_temp("bad_flags_bundle.json", &bundle());
        let mut a = args(path.clone(), OutputFormat::Text);
        a.buffer = Some("plenty".to_string());
        assert!(run(&a, DashboardOptions::default()).is_err());

        let mut a = args(path, OutputFormat::Text);
        a.max_recommendations = Some(0);
        assert!(run(&a, DashboardOptions::default()).is_err());

        let missing = std::env::temp_dir().join("cashlens-definitely-missing.json");
        assert!(run(&args(missing, OutputFormat::Text), DashboardOptions::default()).is_err());
    }

    #[test]
    fn scenario_file_replaces_override() {
        let path = write_temp("scenario_bundle.json", &bundle());
        let scenario = write_temp(
            "scenario.json",
            &json!({"type": "payment_delay_out", "parameters": {"days": 7}}),
        );
        let mut a = args(path, OutputFormat::Json);
        a.scenario = Some(scenario);
        let out = run(&a, DashboardOptions::default()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["adjusted"]["scenario_type"], json!("payment_delay_out"));
    }
}
