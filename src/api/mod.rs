use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    CurveSpec, Issue, LinearChartFrame, MacroScenario, ModeEvent, PlannerSession,
    PortfolioConfig, ProjectionResult, SCENARIOS, SavedConfig, ScenarioPreset, SeriesKind,
    SessionEvent, Transition, generate,
};
use crate::error::{PlannerError, Result};

/// Largest time horizon the service and CLI will project.
pub const MAX_TIME_HORIZON: u32 = 200;

#[derive(Args, Debug, Clone)]
pub struct PortfolioArgs {
    #[arg(long, default_value_t = PortfolioConfig::default().btc_stack)]
    btc_stack: f64,
    #[arg(
        long,
        default_value_t = PortfolioConfig::default().exchange_rate,
        help = "BTC/USD price at year 0"
    )]
    exchange_rate: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().savings_pct)]
    savings_pct: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().investments_pct)]
    investments_pct: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().speculation_pct)]
    speculation_pct: f64,
    #[arg(
        long,
        default_value_t = PortfolioConfig::default().investments_start_yield,
        help = "Investments bucket yield in percent at year 0"
    )]
    investments_start_yield: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().investments_end_yield)]
    investments_end_yield: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().speculation_start_yield)]
    speculation_start_yield: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().speculation_end_yield)]
    speculation_end_yield: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().time_horizon)]
    time_horizon: u32,
    #[arg(
        long,
        default_value_t = PortfolioConfig::default().activation_year,
        help = "Year in which part of the stack moves into the income pool"
    )]
    activation_year: u32,
    #[arg(
        long,
        default_value_t = PortfolioConfig::default().collateral_pct,
        help = "Share of the savings bucket pledged as loan collateral, in percent"
    )]
    collateral_pct: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().ltv_ratio)]
    ltv_ratio: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().loan_rate)]
    loan_rate: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().loan_term_years)]
    loan_term_years: u32,
    #[arg(
        long,
        help = "Amortize the loan over --loan-term-years instead of paying interest only"
    )]
    amortize: bool,
    #[arg(long, default_value_t = PortfolioConfig::default().income_allocation_pct)]
    income_allocation_pct: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().income_reinvestment_pct)]
    income_reinvestment_pct: f64,
    #[arg(long, default_value_t = PortfolioConfig::default().starting_expenses)]
    starting_expenses: f64,
    #[arg(
        long,
        default_value_t = PortfolioConfig::default().price_crash,
        help = "One-off drawdown in percent applied to every year's BTC totals"
    )]
    price_crash: f64,
}

impl From<PortfolioArgs> for PortfolioConfig {
    fn from(args: PortfolioArgs) -> Self {
        Self {
            btc_stack: args.btc_stack,
            exchange_rate: args.exchange_rate,
            savings_pct: args.savings_pct,
            investments_pct: args.investments_pct,
            speculation_pct: args.speculation_pct,
            investments_start_yield: args.investments_start_yield,
            investments_end_yield: args.investments_end_yield,
            speculation_start_yield: args.speculation_start_yield,
            speculation_end_yield: args.speculation_end_yield,
            investments_yields: Vec::new(),
            speculation_yields: Vec::new(),
            time_horizon: args.time_horizon,
            activation_year: args.activation_year,
            collateral_pct: args.collateral_pct,
            ltv_ratio: args.ltv_ratio,
            loan_rate: args.loan_rate,
            loan_term_years: args.loan_term_years,
            interest_only: !args.amortize,
            income_allocation_pct: args.income_allocation_pct,
            income_reinvestment_pct: args.income_reinvestment_pct,
            starting_expenses: args.starting_expenses,
            price_crash: args.price_crash,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[command(flatten)]
    portfolio: PortfolioArgs,
    #[arg(
        long,
        help = "Saved configuration JSON to load instead of the portfolio flags"
    )]
    config: Option<PathBuf>,
    #[arg(long, help = "Macro scenario key, or custom")]
    scenario: Option<String>,
    #[arg(long, help = "Drive all three rate series from --scenario")]
    follow: bool,
    #[arg(long, help = "Flat inflation rate in percent")]
    inflation: Option<f64>,
    #[arg(long, help = "Flat BTC appreciation rate in percent")]
    btc_appreciation: Option<f64>,
    #[arg(long, help = "Flat income yield in percent")]
    income_yield: Option<f64>,
    #[arg(long, help = "Print the full JSON response instead of a table")]
    json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CurvePayload {
    series: Option<SeriesKind>,
    spec: Option<CurveSpec>,
    time_horizon: Option<u32>,
    macro_scenario: Option<MacroScenario>,
}

#[derive(Debug)]
struct CurveRequest {
    kind: SeriesKind,
    spec: CurveSpec,
    time_horizon: u32,
    macro_scenario: MacroScenario,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurveResponse {
    series: SeriesKind,
    values: Vec<f64>,
    axis_min: f64,
    axis_max: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse<'a> {
    macro_scenario: &'a MacroScenario,
    inflation: &'a [f64],
    btc_appreciation: &'a [f64],
    income_yield: &'a [f64],
    issues: Vec<Issue>,
    projection: &'a ProjectionResult,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/scenarios", get(scenarios_handler))
        .route("/api/curve", post(curve_handler))
        .route("/api/project", post(project_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "btcplan HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn scenarios_handler() -> Response {
    json_response(StatusCode::OK, scenario_catalog())
}

async fn curve_handler(body: String) -> Response {
    match curve_response_from_json(&body) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => rejected(err),
    }
}

async fn project_handler(body: String) -> Response {
    let session = match session_from_json(&body) {
        Ok(session) => session,
        Err(err) => return rejected(err),
    };
    json_response(StatusCode::OK, build_project_response(&session))
}

fn rejected(err: PlannerError) -> Response {
    warn!(error = %err, "rejected request");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn check_horizon(time_horizon: u32) -> Result<()> {
    if time_horizon > MAX_TIME_HORIZON {
        return Err(PlannerError::OutOfBounds {
            field: "timeHorizon",
            value: u64::from(time_horizon),
            max: u64::from(MAX_TIME_HORIZON),
        });
    }
    Ok(())
}

fn curve_request_from_json(json: &str) -> Result<CurveRequest> {
    let payload = serde_json::from_str::<CurvePayload>(json)?;
    let kind = payload.series.unwrap_or(SeriesKind::Inflation);
    let request = CurveRequest {
        kind,
        spec: payload.spec.unwrap_or(CurveSpec::Flat {
            rate: kind.default_flat_rate(),
        }),
        time_horizon: payload
            .time_horizon
            .unwrap_or(PortfolioConfig::default().time_horizon),
        macro_scenario: payload.macro_scenario.unwrap_or_default(),
    };
    check_horizon(request.time_horizon)?;
    Ok(request)
}

fn curve_response_from_json(json: &str) -> Result<CurveResponse> {
    let request = curve_request_from_json(json)?;
    let slots = request.time_horizon as usize + 1;
    let frame =
        LinearChartFrame::for_series(request.kind, &request.macro_scenario, slots, 1.0, 1.0);
    Ok(CurveResponse {
        series: request.kind,
        values: generate(&request.spec, slots, request.kind, &[]),
        axis_min: frame.min_value,
        axis_max: frame.max_value,
    })
}

fn session_from_json(json: &str) -> Result<PlannerSession> {
    let saved = SavedConfig::from_json(json)?;
    check_horizon(saved.portfolio.time_horizon)?;
    Ok(saved.into_session())
}

fn active_prefix(session: &PlannerSession, kind: SeriesKind) -> &[f64] {
    let series = &session.descriptor(kind).series;
    &series[..session.active_slots().min(series.len())]
}

fn build_project_response(session: &PlannerSession) -> ProjectResponse<'_> {
    ProjectResponse {
        macro_scenario: session.macro_scenario(),
        inflation: active_prefix(session, SeriesKind::Inflation),
        btc_appreciation: active_prefix(session, SeriesKind::BtcPrice),
        income_yield: active_prefix(session, SeriesKind::IncomeYield),
        issues: session.issues(),
        projection: session.projection(),
    }
}

fn scenario_from_arg(key: &str) -> Result<MacroScenario> {
    let scenario = MacroScenario::named(key);
    if !scenario.is_custom() && scenario.preset().is_none() {
        return Err(PlannerError::UnknownKey {
            what: "scenario",
            key: key.to_string(),
        });
    }
    Ok(scenario)
}

fn session_from_args(args: &ProjectArgs) -> Result<PlannerSession> {
    let scenario = args.scenario.as_deref().map(scenario_from_arg).transpose()?;

    let mut session = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| PlannerError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let saved = SavedConfig::from_json(&json)?;
            check_horizon(saved.portfolio.time_horizon)?;
            let mut session = saved.into_session();
            if let Some(scenario) = scenario {
                session.dispatch(SessionEvent::SelectMacroScenario(scenario));
            }
            session
        }
        None => {
            let portfolio = PortfolioConfig::from(args.portfolio.clone());
            check_horizon(portfolio.time_horizon)?;
            PlannerSession::new(portfolio, scenario.unwrap_or_default())
        }
    };

    let flat_rates = [
        (SeriesKind::Inflation, args.inflation),
        (SeriesKind::BtcPrice, args.btc_appreciation),
        (SeriesKind::IncomeYield, args.income_yield),
    ];
    for (kind, rate) in flat_rates {
        if let Some(rate) = rate {
            session.dispatch(SessionEvent::Series(kind, ModeEvent::SetFlatRate(rate)));
        }
    }
    if args.follow {
        for kind in SeriesKind::ALL {
            let event = SessionEvent::Series(kind, ModeEvent::SetFollowScenario(true));
            if session.dispatch(event) == Transition::Rejected {
                warn!(?kind, "--follow needs a named --scenario, keeping formula rates");
            }
        }
    }
    session.flush();
    Ok(session)
}

/// Runs the `project` subcommand and returns what should be printed.
pub fn run_project(args: &ProjectArgs) -> Result<String> {
    let session = session_from_args(args)?;
    let response = build_project_response(&session);
    if args.json {
        return Ok(serde_json::to_string_pretty(&response)?);
    }
    Ok(render_table(&response))
}

fn render_table(response: &ProjectResponse<'_>) -> String {
    let projection = response.projection;
    let mut out = format!(
        "{:>4} {:>14} {:>14} {:>14} {:>12} {:>12} {:>12}\n",
        "year", "btc_income", "btc_hold", "btc_price", "usd_income", "usd_levered", "expenses"
    );
    for (idx, row) in projection.results.iter().enumerate() {
        out.push_str(&format!(
            "{:>4} {:>14.6} {:>14.6} {:>14.0} {:>12.0} {:>12.0} {:>12.0}\n",
            row.year,
            row.btc_with_income,
            row.btc_without_income,
            projection.btc_price.get(idx).copied().unwrap_or(0.0),
            projection.usd_income.get(idx).copied().unwrap_or(0.0),
            projection.usd_income_with_leverage.get(idx).copied().unwrap_or(0.0),
            projection.annual_expenses.get(idx).copied().unwrap_or(0.0),
        ));
    }
    if projection.loan_principal > 0.0 {
        out.push_str(&format!(
            "loan: principal {:.0}, annual service {:.0}\n",
            projection.loan_principal, projection.loan_interest
        ));
    }
    for issue in &response.issues {
        out.push_str(&format!(
            "{:?}: {} ({})\n",
            issue.severity, issue.message, issue.field
        ));
    }
    out
}

/// Shape of the scenario catalog served by `/api/scenarios`.
pub fn scenario_catalog() -> &'static [ScenarioPreset] {
    SCENARIOS
}
