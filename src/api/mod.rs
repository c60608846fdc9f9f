use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    ClientProfile, EconomicAssumptions, GapBasis, Inputs, PlanResult, PolicyConfig,
    RetirementGoal, RetirementMode, run_plan,
};
use crate::error::{CliError, InputError};
use crate::report::{ClientContact, Report, ReportAudience, build_report};

const MAX_AGE: u32 = 120;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliRetirementMode {
    Ordinary,
    EarlyVoluntary,
    EarlyInvoluntary,
    Deferred,
}

impl From<CliRetirementMode> for RetirementMode {
    fn from(value: CliRetirementMode) -> Self {
        match value {
            CliRetirementMode::Ordinary => RetirementMode::Ordinary,
            CliRetirementMode::EarlyVoluntary => RetirementMode::EarlyVoluntary,
            CliRetirementMode::EarlyInvoluntary => RetirementMode::EarlyInvoluntary,
            CliRetirementMode::Deferred => RetirementMode::Deferred,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliGapBasis {
    Target,
    Expenses,
}

impl From<CliGapBasis> for GapBasis {
    fn from(value: CliGapBasis) -> Self {
        match value {
            CliGapBasis::Target => GapBasis::Target,
            CliGapBasis::Expenses => GapBasis::Expenses,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliAudience {
    Client,
    Agent,
}

impl From<CliAudience> for ReportAudience {
    fn from(value: CliAudience) -> Self {
        match value {
            CliAudience::Client => ReportAudience::Client,
            CliAudience::Agent => ReportAudience::Agent,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRetirementMode {
    #[serde(alias = "ordinaria")]
    Ordinary,
    #[serde(alias = "earlyVoluntary", alias = "early_voluntary")]
    EarlyVoluntary,
    #[serde(alias = "earlyInvoluntary", alias = "early_involuntary")]
    EarlyInvoluntary,
    #[serde(alias = "demorada")]
    Deferred,
}

impl From<ApiRetirementMode> for CliRetirementMode {
    fn from(value: ApiRetirementMode) -> Self {
        match value {
            ApiRetirementMode::Ordinary => CliRetirementMode::Ordinary,
            ApiRetirementMode::EarlyVoluntary => CliRetirementMode::EarlyVoluntary,
            ApiRetirementMode::EarlyInvoluntary => CliRetirementMode::EarlyInvoluntary,
            ApiRetirementMode::Deferred => CliRetirementMode::Deferred,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiGapBasis {
    #[serde(alias = "income")]
    Target,
    Expenses,
}

impl From<ApiGapBasis> for CliGapBasis {
    fn from(value: ApiGapBasis) -> Self {
        match value {
            ApiGapBasis::Target => CliGapBasis::Target,
            ApiGapBasis::Expenses => CliGapBasis::Expenses,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiAudience {
    #[serde(alias = "cliente")]
    Client,
    #[serde(alias = "agente")]
    Agent,
}

impl From<ApiAudience> for CliAudience {
    fn from(value: ApiAudience) -> Self {
        match value {
            ApiAudience::Client => CliAudience::Client,
            ApiAudience::Agent => CliAudience::Agent,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    life_expectancy: Option<u32>,
    years_contributed: Option<f64>,
    future_contribution_years: Option<f64>,
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,

    desired_income: Option<f64>,
    expense_retention: Option<f64>,
    gap_basis: Option<ApiGapBasis>,
    retirement_mode: Option<ApiRetirementMode>,
    advance_months: Option<i32>,
    regulatory_base: Option<f64>,

    annual_return: Option<f64>,
    inflation: Option<f64>,
    pension_revaluation: Option<f64>,

    audience: Option<ApiAudience>,
    client_name: Option<String>,
    client_email: Option<String>,
    client_phone: Option<String>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "retirement_gap",
    about = "Public pension estimate, retirement income gap and savings plan"
)]
pub struct Cli {
    #[arg(long)]
    current_age: u32,
    #[arg(long, default_value_t = 67)]
    retirement_age: u32,
    #[arg(long, default_value_t = 85, help = "Age to fund retirement income through")]
    life_expectancy: u32,
    #[arg(long, default_value_t = 0.0, help = "Years of contributions already made")]
    years_contributed: f64,
    #[arg(
        long,
        help = "Further contribution years before retirement; defaults to the years until retirement"
    )]
    future_contribution_years: Option<f64>,
    #[arg(long)]
    monthly_income: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_expenses: f64,
    #[arg(long, help = "Desired monthly retirement income in today's money")]
    desired_income: f64,
    #[arg(
        long,
        default_value_t = 80.0,
        help = "Share of today's expenses kept in retirement, in percent"
    )]
    expense_retention: f64,
    #[arg(long, value_enum, default_value_t = CliGapBasis::Target)]
    gap_basis: CliGapBasis,
    #[arg(long, value_enum, default_value_t = CliRetirementMode::Ordinary)]
    retirement_mode: CliRetirementMode,
    #[arg(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        help = "Months of early retirement (positive) or deferral (negative)"
    )]
    advance_months: i32,
    #[arg(long, help = "Monthly regulatory base; defaults to monthly income")]
    regulatory_base: Option<f64>,
    #[arg(long, default_value_t = 4.0, help = "Expected annual return in percent")]
    annual_return: f64,
    #[arg(long, default_value_t = 2.0, help = "Expected annual inflation in percent")]
    inflation_rate: f64,
    #[arg(long, default_value_t = 2.0, help = "Annual pension revaluation in percent")]
    pension_revaluation: f64,
    #[arg(long, value_enum, default_value_t = CliAudience::Client)]
    audience: CliAudience,
    #[arg(long)]
    client_name: Option<String>,
    #[arg(long)]
    client_email: Option<String>,
    #[arg(long)]
    client_phone: Option<String>,
    #[arg(long, help = "JSON file overriding pension schedule and modality rules")]
    policy: Option<PathBuf>,
}

#[derive(Debug)]
struct PlanRequest {
    inputs: Inputs,
    audience: ReportAudience,
    contact: ClientContact,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    plan: PlanResult,
    report: Report,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: &Cli) -> Result<Inputs, InputError> {
    for (field, age) in [
        ("--current-age", cli.current_age),
        ("--retirement-age", cli.retirement_age),
        ("--life-expectancy", cli.life_expectancy),
    ] {
        if age > MAX_AGE {
            return Err(InputError::OutOfRange {
                field,
                min: 0.0,
                max: MAX_AGE as f64,
            });
        }
    }

    non_negative("--years-contributed", cli.years_contributed)?;
    if let Some(years) = cli.future_contribution_years {
        non_negative("--future-contribution-years", years)?;
    }
    non_negative("--monthly-income", cli.monthly_income)?;
    non_negative("--monthly-expenses", cli.monthly_expenses)?;
    non_negative("--desired-income", cli.desired_income)?;
    if let Some(base) = cli.regulatory_base {
        non_negative("--regulatory-base", base)?;
    }
    non_negative("--annual-return", cli.annual_return)?;
    non_negative("--inflation-rate", cli.inflation_rate)?;
    non_negative("--pension-revaluation", cli.pension_revaluation)?;

    finite("--expense-retention", cli.expense_retention)?;
    if !(0.0..=100.0).contains(&cli.expense_retention) {
        return Err(InputError::OutOfRange {
            field: "--expense-retention",
            min: 0.0,
            max: 100.0,
        });
    }

    let future_contribution_years = cli
        .future_contribution_years
        .unwrap_or_else(|| cli.retirement_age.saturating_sub(cli.current_age) as f64);

    Ok(Inputs {
        profile: ClientProfile {
            current_age: cli.current_age,
            retirement_age: cli.retirement_age,
            life_expectancy: cli.life_expectancy,
            years_contributed: cli.years_contributed,
            future_contribution_years,
            monthly_income: cli.monthly_income,
            monthly_expenses: cli.monthly_expenses,
        },
        mode: cli.retirement_mode.into(),
        economics: EconomicAssumptions {
            annual_return: cli.annual_return / 100.0,
            annual_inflation: cli.inflation_rate / 100.0,
            pension_revaluation: cli.pension_revaluation / 100.0,
        },
        goal: RetirementGoal {
            desired_monthly_income: cli.desired_income,
            expense_retention: cli.expense_retention / 100.0,
            gap_basis: cli.gap_basis.into(),
            advance_or_delay_months: cli.advance_months,
            regulatory_base: cli.regulatory_base,
        },
    })
}

fn finite(field: &'static str, value: f64) -> Result<(), InputError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InputError::NotFinite { field })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), InputError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(InputError::Negative { field });
    }
    Ok(())
}

fn plan_request_from_cli(cli: &Cli) -> Result<PlanRequest, InputError> {
    Ok(PlanRequest {
        inputs: build_inputs(cli)?,
        audience: cli.audience.into(),
        contact: ClientContact {
            name: cli.client_name.clone(),
            email: cli.client_email.clone(),
            phone: cli.client_phone.clone(),
        },
    })
}

fn compute_plan(request: PlanRequest, policy: &PolicyConfig) -> PlanResponse {
    let plan = run_plan(&request.inputs, policy);
    let report = build_report(&request.inputs, &plan, request.audience, request.contact);
    PlanResponse { plan, report }
}

/// One-shot command line evaluation; returns the response as pretty JSON.
pub fn run_cli(cli: Cli) -> Result<String, CliError> {
    let policy = match &cli.policy {
        Some(path) => PolicyConfig::from_path(path)?,
        None => PolicyConfig::default(),
    };
    let request = plan_request_from_cli(&cli)?;
    let response = compute_plan(request, &policy);
    Ok(serde_json::to_string_pretty(&response)?)
}

pub async fn run_http_server(port: u16, policy: PolicyConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(Arc::new(policy));

    let listener = TcpListener::bind(addr).await?;
    log::info!("retirement gap HTTP API listening on http://{addr}");
    log::info!("local access: http://127.0.0.1:{port}/api/plan");

    axum::serve(listener, app).await
}

fn router(policy: Arc<PolicyConfig>) -> Router {
    Router::new()
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .route("/api/policy", get(policy_handler))
        .fallback(not_found_handler)
        .with_state(policy)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn policy_handler(State(policy): State<Arc<PolicyConfig>>) -> Response {
    json_response(StatusCode::OK, policy.as_ref())
}

async fn plan_get_handler(
    State(policy): State<Arc<PolicyConfig>>,
    Query(payload): Query<PlanPayload>,
) -> Response {
    plan_handler_impl(&policy, payload)
}

async fn plan_post_handler(
    State(policy): State<Arc<PolicyConfig>>,
    Json(payload): Json<PlanPayload>,
) -> Response {
    plan_handler_impl(&policy, payload)
}

fn plan_handler_impl(policy: &PolicyConfig, payload: PlanPayload) -> Response {
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            log::debug!("rejected plan request: {err}");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };
    json_response(StatusCode::OK, compute_plan(request, policy))
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

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload).map_err(|e| e.to_string())
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        cli.life_expectancy = v;
    }
    if let Some(v) = payload.years_contributed {
        cli.years_contributed = v;
    }
    if let Some(v) = payload.future_contribution_years {
        cli.future_contribution_years = Some(v);
    }
    if let Some(v) = payload.monthly_income {
        cli.monthly_income = v;
    }
    if let Some(v) = payload.monthly_expenses {
        cli.monthly_expenses = v;
    }

    if let Some(v) = payload.desired_income {
        cli.desired_income = v;
    }
    if let Some(v) = payload.expense_retention {
        cli.expense_retention = v;
    }
    if let Some(v) = payload.gap_basis {
        cli.gap_basis = v.into();
    }
    if let Some(v) = payload.retirement_mode {
        cli.retirement_mode = v.into();
    }
    if let Some(v) = payload.advance_months {
        cli.advance_months = v;
    }
    if let Some(v) = payload.regulatory_base {
        cli.regulatory_base = Some(v);
    }

    if let Some(v) = payload.annual_return {
        cli.annual_return = v;
    }
    if let Some(v) = payload.inflation {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.pension_revaluation {
        cli.pension_revaluation = v;
    }

    if let Some(v) = payload.audience {
        cli.audience = v.into();
    }
    cli.client_name = payload.client_name;
    cli.client_email = payload.client_email;
    cli.client_phone = payload.client_phone;

    plan_request_from_cli(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: 40,
        retirement_age: 67,
        life_expectancy: 85,
        years_contributed: 15.0,
        future_contribution_years: None,
        monthly_income: 2_500.0,
        monthly_expenses: 1_800.0,
        desired_income: 2_000.0,
        expense_retention: 80.0,
        gap_basis: CliGapBasis::Target,
        retirement_mode: CliRetirementMode::Ordinary,
        advance_months: 0,
        regulatory_base: None,
        annual_return: 4.0,
        inflation_rate: 2.0,
        pension_revaluation: 2.0,
        audience: CliAudience::Client,
        client_name: None,
        client_email: None,
        client_phone: None,
        policy: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_inputs_converts_percentages_to_fractions() {
        let mut cli = sample_cli();
        cli.annual_return = 5.0;
        cli.inflation_rate = 2.5;
        cli.pension_revaluation = 1.0;
        cli.expense_retention = 70.0;

        let inputs = build_inputs(&cli).expect("valid inputs");
        assert_relative_eq!(inputs.economics.annual_return, 0.05);
        assert_relative_eq!(inputs.economics.annual_inflation, 0.025);
        assert_relative_eq!(inputs.economics.pension_revaluation, 0.01);
        assert_relative_eq!(inputs.goal.expense_retention, 0.7);
    }

    #[test]
    fn future_years_default_to_years_until_retirement() {
        let inputs = build_inputs(&sample_cli()).expect("valid inputs");
        assert_eq!(inputs.profile.future_contribution_years, 27.0);

        let mut cli = sample_cli();
        cli.retirement_age = 30;
        let inputs = build_inputs(&cli).expect("ordering is clamped later, not rejected");
        assert_eq!(inputs.profile.future_contribution_years, 0.0);
    }

    #[test]
    fn build_inputs_rejects_negative_rates() {
        let mut cli = sample_cli();
        cli.inflation_rate = -1.0;
        assert_eq!(
            build_inputs(&cli).expect_err("must reject"),
            InputError::Negative {
                field: "--inflation-rate"
            }
        );
    }

    #[test]
    fn build_inputs_rejects_non_finite_amounts() {
        let mut cli = sample_cli();
        cli.monthly_income = f64::NAN;
        assert_eq!(
            build_inputs(&cli).expect_err("must reject"),
            InputError::NotFinite {
                field: "--monthly-income"
            }
        );
    }

    #[test]
    fn build_inputs_rejects_implausible_age_and_retention() {
        let mut cli = sample_cli();
        cli.life_expectancy = 150;
        assert!(matches!(
            build_inputs(&cli),
            Err(InputError::OutOfRange {
                field: "--life-expectancy",
                ..
            })
        ));

        let mut cli = sample_cli();
        cli.expense_retention = 120.0;
        let err = build_inputs(&cli).expect_err("must reject");
        assert_eq!(err.to_string(), "--expense-retention must be between 0 and 100");
    }

    #[test]
    fn api_payload_overrides_defaults_and_accepts_aliases() {
        let request = plan_request_from_json(
            r#"{
                "currentAge": 50,
                "retirementAge": 65,
                "retirementMode": "early_voluntary",
                "advanceMonths": 12,
                "gapBasis": "expenses",
                "annualReturn": 3,
                "audience": "agente",
                "clientName": "Ana"
            }"#,
        )
        .expect("valid payload");

        assert_eq!(request.inputs.profile.current_age, 50);
        assert_eq!(request.inputs.profile.retirement_age, 65);
        assert_eq!(request.inputs.profile.future_contribution_years, 15.0);
        assert_eq!(request.inputs.mode, RetirementMode::EarlyVoluntary);
        assert_eq!(request.inputs.goal.advance_or_delay_months, 12);
        assert_eq!(request.inputs.goal.gap_basis, GapBasis::Expenses);
        assert_relative_eq!(request.inputs.economics.annual_return, 0.03);
        assert_eq!(request.audience, ReportAudience::Agent);
        assert_eq!(request.contact.name.as_deref(), Some("Ana"));
    }

    #[test]
    fn empty_payload_uses_api_defaults() {
        let request = plan_request_from_json("{}").expect("valid payload");
        let expected = build_inputs(&default_cli_for_api()).expect("valid defaults");
        assert_eq!(request.inputs, expected);
        assert_eq!(request.audience, ReportAudience::Client);
    }

    #[test]
    fn api_payload_rejects_unknown_mode() {
        let err = plan_request_from_json(r#"{"retirementMode": "whenever"}"#)
            .expect_err("must reject");
        assert!(err.starts_with("Invalid API JSON payload"));
    }

    #[test]
    fn api_payload_rejects_negative_return() {
        let err = plan_request_from_json(r#"{"annualReturn": -2}"#).expect_err("must reject");
        assert_eq!(err, "--annual-return must be >= 0");
    }

    #[test]
    fn plan_response_serialization_contains_expected_fields() {
        let request = plan_request_from_json(r#"{"audience": "agent"}"#).expect("valid payload");
        let response = compute_plan(request, &PolicyConfig::default());
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"plan\""));
        assert!(json.contains("\"report\""));
        assert!(json.contains("\"pensionFuture\""));
        assert!(json.contains("\"monthlyContribution\""));
        assert!(json.contains("\"modalityValid\""));
        assert!(json.contains("\"projection\""));
        assert!(json.contains("\"technical\""));
    }

    #[test]
    fn error_responses_are_json_and_not_cached() {
        let response = error_response(StatusCode::BAD_REQUEST, "bad");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
    }

    #[test]
    fn invalid_payload_maps_to_bad_request() {
        let payload = PlanPayload {
            pension_revaluation: Some(-0.5),
            ..Default::default()
        };
        let response = plan_handler_impl(&PolicyConfig::default(), payload);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = plan_handler_impl(&PolicyConfig::default(), PlanPayload::default());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn cli_parses_flags_with_negative_months() {
        let cli = Cli::try_parse_from([
            "retirement_gap",
            "--current-age",
            "60",
            "--retirement-age",
            "68",
            "--years-contributed",
            "38",
            "--monthly-income",
            "3000",
            "--desired-income",
            "2500",
            "--retirement-mode",
            "deferred",
            "--advance-months=-12",
            "--audience",
            "agent",
        ])
        .expect("valid flags");

        let request = plan_request_from_cli(&cli).expect("valid inputs");
        assert_eq!(request.inputs.mode, RetirementMode::Deferred);
        assert_eq!(request.inputs.goal.advance_or_delay_months, -12);
        assert_eq!(request.audience, ReportAudience::Agent);

        let response = compute_plan(request, &PolicyConfig::default());
        assert!(response.plan.modality_valid);
        assert_relative_eq!(response.plan.coefficient, 1.048, epsilon = 1e-12);
    }

    #[test]
    fn run_cli_reports_missing_policy_file() {
        let mut cli = sample_cli();
        cli.policy = Some(PathBuf::from("/no/such/policy.json"));
        let err = run_cli(cli).expect_err("must fail");
        assert!(matches!(err, CliError::Policy(_)));
    }

    #[test]
    fn run_cli_prints_pretty_json() {
        let json = run_cli(sample_cli()).expect("default inputs are valid");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
        assert!(value["plan"]["gap"].is_number());
        assert_eq!(value["report"]["audience"], "client");
    }
}
