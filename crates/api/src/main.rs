use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cashlens_core::dashboard::{self, DashboardInput, DashboardOptions, DashboardReport};
use cashlens_core::domain::forecast::Forecast;
use cashlens_core::domain::risk::{Control, FixRecommendation, RiskAlert};
use cashlens_core::domain::rule::{FinancialRule, LiveMetrics, RuleProgress};
use cashlens_core::domain::scenario::ScenarioOverride;
use cashlens_core::forecast::adjust::{self, AdjustedForecast};
use cashlens_core::forecast::bands::{self, WeekBands};
use cashlens_core::forecast::buffer::{self, BreachRun, DangerZone};
use cashlens_core::money;
use cashlens_core::triage::{fixes, rules};

// Upper bound on recommendations per request; the UI shows at most a handful.
const MAX_RESULTS_LIMIT: usize = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = cashlens_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let state = AppState {
        options: settings.dashboard_options(),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, max_recommendations = state.options.max_recommendations, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(err) = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        let err = anyhow::Error::new(err);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "api server failed");
        return Err(err);
    }

    Ok(())
}

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/forecast/bands", post(forecast_bands))
        .route("/forecast/adjust", post(adjust_forecast))
        .route("/forecast/danger-zone", post(danger_zone))
        .route("/rules/evaluate", post(evaluate_rules))
        .route("/risks/recommendations", post(recommend_fixes))
        .route("/dashboard", post(build_dashboard))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    options: DashboardOptions,
}

async fn forecast_bands(Json(forecast): Json<Forecast>) -> Json<Vec<WeekBands>> {
    Json(bands::forecast_bands(&forecast))
}

#[derive(Debug, Deserialize)]
struct AdjustRequest {
    forecast: Forecast,
    #[serde(default)]
    scenario: Option<ScenarioOverride>,
}

async fn adjust_forecast(Json(req): Json<AdjustRequest>) -> Json<AdjustedForecast> {
    Json(adjust::adjust_forecast(&req.forecast, req.scenario.as_ref()))
}

#[derive(Debug, Deserialize)]
struct DangerZoneRequest {
    forecast: Forecast,
    #[serde(default, deserialize_with = "money::lenient_opt")]
    buffer_amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct DangerZoneResponse {
    buffer_amount: Decimal,
    danger_zone: Option<DangerZone>,
    breach_runs: Vec<BreachRun>,
}

async fn danger_zone(
    State(state): State<AppState>,
    Json(req): Json<DangerZoneRequest>,
) -> Json<DangerZoneResponse> {
    let buffer_amount = buffer::resolve_buffer(
        req.forecast.starting_cash,
        req.buffer_amount,
        state.options.buffer_ratio,
    );
    let danger_zone = buffer::analyze(&req.forecast.weeks, buffer_amount);
    let breach_runs = danger_zone
        .as_ref()
        .map(DangerZone::breach_runs)
        .unwrap_or_default();

    Json(DangerZoneResponse {
        buffer_amount,
        danger_zone,
        breach_runs,
    })
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    rules: Vec<FinancialRule>,
    #[serde(default)]
    metrics: LiveMetrics,
}

async fn evaluate_rules(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Json<Vec<RuleProgress>> {
    Json(rules::evaluate_all(
        &req.rules,
        &req.metrics,
        state.options.fallback_monthly_expenses,
    ))
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    alert: RiskAlert,
    #[serde(default)]
    controls: Vec<Control>,
    #[serde(default)]
    max_results: Option<usize>,
}

async fn recommend_fixes(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<Vec<FixRecommendation>>, StatusCode> {
    let max_results = req.max_results.unwrap_or(state.options.max_recommendations);
    if max_results > MAX_RESULTS_LIMIT {
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(Json(fixes::rank(&req.alert, &req.controls, max_results)))
}

async fn build_dashboard(
    State(state): State<AppState>,
    Json(input): Json<DashboardInput>,
) -> Json<DashboardReport> {
    Json(dashboard::build(&input, &state.options))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
