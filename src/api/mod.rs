use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::net::TcpListener;

use crate::core::{Capital, Params, Projection, RetirementMode, YearRecord, run_projection};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRetirementMode {
    Manual,
    Auto,
}

impl From<CliRetirementMode> for RetirementMode {
    fn from(value: CliRetirementMode) -> Self {
        match value {
            CliRetirementMode::Manual => RetirementMode::Manual,
            CliRetirementMode::Auto => RetirementMode::Auto,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiRetirementMode {
    Manual,
    Auto,
}

impl From<ApiRetirementMode> for CliRetirementMode {
    fn from(value: ApiRetirementMode) -> Self {
        match value {
            ApiRetirementMode::Manual => CliRetirementMode::Manual,
            ApiRetirementMode::Auto => CliRetirementMode::Auto,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Compound-growth capital projection with manual or 4%-rule retirement timing"
)]
struct Cli {
    #[arg(long)]
    initial_capital: f64,
    #[arg(long)]
    monthly_income: f64,
    #[arg(long)]
    monthly_living_expenses: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual income growth in percent, e.g. 3"
    )]
    income_growth_rate: f64,
    #[arg(long, help = "Expected annual return in percent, e.g. 8")]
    interest_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(long)]
    current_age: u32,
    #[arg(long, default_value_t = 60)]
    retirement_age: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliRetirementMode::Manual,
        help = "manual: retire at --retirement-age; auto: search for the first age passing the 4% rule"
    )]
    retirement_mode: CliRetirementMode,
    #[arg(long, default_value_t = 90, help = "Age to project through")]
    max_age: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalculatePayload {
    initial_capital: Option<f64>,
    monthly_income: Option<f64>,
    monthly_living_expenses: Option<f64>,
    income_growth_rate: Option<f64>,
    interest_rate: Option<f64>,
    inflation_rate: Option<f64>,
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    retirement_mode: Option<ApiRetirementMode>,
    max_age: Option<u32>,
}

#[derive(Debug, Serialize)]
struct YearRow {
    year: u32,
    age: u32,
    investment_capital: f64,
    expenses_inflation: f64,
    net_capital: f64,
    annual_expenses: f64,
    total_capital_start: Capital,
    interest_income: f64,
    half_year_interest: f64,
    total_capital_end: Capital,
    expense_percentage: f64,
}

impl YearRow {
    fn from_record(record: &YearRecord) -> Self {
        Self {
            year: record.year,
            age: record.age,
            investment_capital: round2(record.investment_capital),
            expenses_inflation: round2(record.expenses_inflation),
            net_capital: round2(record.net_capital),
            annual_expenses: round2(record.annual_expenses),
            total_capital_start: record.total_capital_start,
            interest_income: round2(record.interest_income),
            half_year_interest: round2(record.half_year_interest),
            total_capital_end: record.total_capital_end,
            expense_percentage: round2(record.expense_percentage),
        }
    }
}

#[derive(Debug, Serialize)]
struct CalculateResponse {
    success: bool,
    data: Vec<YearRow>,
    actual_retirement_age: u32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn build_params(cli: Cli) -> Result<Params, String> {
    if !cli.initial_capital.is_finite() || cli.initial_capital < 0.0 {
        return Err("--initial-capital must be >= 0".to_string());
    }

    if !cli.monthly_income.is_finite() || cli.monthly_income < 0.0 {
        return Err("--monthly-income must be >= 0".to_string());
    }

    if !cli.monthly_living_expenses.is_finite() || cli.monthly_living_expenses < 0.0 {
        return Err("--monthly-living-expenses must be >= 0".to_string());
    }

    for (name, rate) in [
        ("--income-growth-rate", cli.income_growth_rate),
        ("--interest-rate", cli.interest_rate),
        ("--inflation-rate", cli.inflation_rate),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(format!("{name} must be a percent > -100"));
        }
    }

    if cli.retirement_mode == CliRetirementMode::Manual && cli.retirement_age <= cli.current_age {
        return Err("--retirement-age must be > --current-age".to_string());
    }

    if cli.max_age <= cli.current_age {
        return Err("--max-age must be > --current-age".to_string());
    }

    Ok(Params {
        initial_capital: cli.initial_capital,
        monthly_income: cli.monthly_income,
        monthly_living_expenses: cli.monthly_living_expenses,
        income_growth_rate: cli.income_growth_rate / 100.0,
        interest_rate: cli.interest_rate / 100.0,
        inflation_rate: cli.inflation_rate / 100.0,
        current_age: cli.current_age,
        retirement_age: cli.retirement_age,
        retirement_mode: cli.retirement_mode.into(),
        max_age: cli.max_age,
    })
}

fn params_from_payload(payload: CalculatePayload) -> Result<Params, String> {
    fn require<T>(value: Option<T>, name: &str) -> Result<T, String> {
        value.ok_or_else(|| format!("missing field: {name}"))
    }

    let cli = Cli {
        initial_capital: require(payload.initial_capital, "initial_capital")?,
        monthly_income: require(payload.monthly_income, "monthly_income")?,
        monthly_living_expenses: require(
            payload.monthly_living_expenses,
            "monthly_living_expenses",
        )?,
        income_growth_rate: require(payload.income_growth_rate, "income_growth_rate")?,
        interest_rate: require(payload.interest_rate, "interest_rate")?,
        inflation_rate: require(payload.inflation_rate, "inflation_rate")?,
        current_age: require(payload.current_age, "current_age")?,
        retirement_age: require(payload.retirement_age, "retirement_age")?,
        retirement_mode: payload
            .retirement_mode
            .map(Into::into)
            .unwrap_or(CliRetirementMode::Manual),
        max_age: payload.max_age.unwrap_or(90),
    };

    build_params(cli)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/calculate", post(calculate_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("nestegg HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_handler(Json(payload): Json<CalculatePayload>) -> Response {
    let params = match params_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    // The projection is a total function of validated params; a panic here is
    // a bug and maps to an opaque 500, never a validation error.
    let projection = match catch_unwind(AssertUnwindSafe(|| run_projection(&params))) {
        Ok(projection) => projection,
        Err(_) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal projection error");
        }
    };

    json_response(StatusCode::OK, build_calculate_response(&projection))
}

fn build_calculate_response(projection: &Projection) -> CalculateResponse {
    CalculateResponse {
        success: true,
        data: projection.years.iter().map(YearRow::from_record).collect(),
        actual_retirement_age: projection.retirement_age,
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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

#[cfg(test)]
fn params_from_json(json: &str) -> Result<Params, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    params_from_payload(payload)
}
