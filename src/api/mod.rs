use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AllocationProfile, CrashShock, ReturnAssumptions, RiskTier, SimulationConfig,
    SimulationResult, Strategy, crash_years, run_scenarios,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRiskTier {
    Low,
    Moderate,
    High,
}

impl From<CliRiskTier> for RiskTier {
    fn from(value: CliRiskTier) -> Self {
        match value {
            CliRiskTier::Low => RiskTier::Low,
            CliRiskTier::Moderate => RiskTier::Moderate,
            CliRiskTier::High => RiskTier::High,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Balanced,
    AllEquity,
    AllCrypto,
}

impl From<CliStrategy> for Strategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Balanced => Strategy::Balanced,
            CliStrategy::AllEquity => Strategy::AllEquity,
            CliStrategy::AllCrypto => Strategy::AllCrypto,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRiskTier {
    Low,
    Moderate,
    High,
}

impl From<ApiRiskTier> for CliRiskTier {
    fn from(value: ApiRiskTier) -> Self {
        match value {
            ApiRiskTier::Low => CliRiskTier::Low,
            ApiRiskTier::Moderate => CliRiskTier::Moderate,
            ApiRiskTier::High => CliRiskTier::High,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    Balanced,
    #[serde(alias = "allEquity", alias = "all_equity")]
    AllEquity,
    #[serde(alias = "allCrypto", alias = "all_crypto")]
    AllCrypto,
}

impl From<ApiStrategy> for CliStrategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::Balanced => CliStrategy::Balanced,
            ApiStrategy::AllEquity => CliStrategy::AllEquity,
            ApiStrategy::AllCrypto => CliStrategy::AllCrypto,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    corpus: Option<f64>,
    monthly_sip: Option<f64>,
    years: Option<u32>,

    risk_tier: Option<ApiRiskTier>,
    strategy: Option<ApiStrategy>,
    equity_weight: Option<u32>,
    debt_weight: Option<u32>,
    gold_weight: Option<u32>,
    crypto_weight: Option<u32>,

    equity_return: Option<f64>,
    debt_return: Option<f64>,
    gold_return: Option<f64>,
    crypto_return: Option<f64>,

    rebalance: Option<bool>,
    sip_during_crash: Option<bool>,

    crash_count: Option<u32>,
    equity_shock: Option<f64>,
    crypto_shock: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "panicsim",
    about = "Crash-and-panic portfolio simulator (stayed invested vs panic sold)"
)]
struct Cli {
    #[arg(long, default_value_t = 500_000.0, help = "Initial portfolio corpus")]
    corpus: f64,
    #[arg(long, default_value_t = 10_000.0, help = "Monthly SIP contribution")]
    monthly_sip: f64,
    #[arg(long, default_value_t = 10, help = "Investment horizon in years (1-25)")]
    years: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliRiskTier::Moderate,
        help = "Risk tier selecting the target allocation"
    )]
    risk_tier: CliRiskTier,
    #[arg(
        long,
        value_enum,
        help = "Strategy preset overriding the risk tier: balanced, all-equity, or all-crypto"
    )]
    strategy: Option<CliStrategy>,
    #[arg(long, help = "Custom equity weight in percent; all four weights required together")]
    equity_weight: Option<u32>,
    #[arg(long, help = "Custom debt weight in percent")]
    debt_weight: Option<u32>,
    #[arg(long, help = "Custom gold weight in percent")]
    gold_weight: Option<u32>,
    #[arg(long, help = "Custom crypto weight in percent")]
    crypto_weight: Option<u32>,
    #[arg(long, default_value_t = 12.0, help = "Annual equity return in percent")]
    equity_return: f64,
    #[arg(long, default_value_t = 6.0, help = "Annual debt return in percent")]
    debt_return: f64,
    #[arg(long, default_value_t = 7.0, help = "Annual gold return in percent")]
    gold_return: f64,
    #[arg(long, default_value_t = 15.0, help = "Annual crypto return in percent")]
    crypto_return: f64,
    #[arg(long, help = "Skip the annual rebalancing step")]
    no_rebalance: bool,
    #[arg(long, help = "Pause the SIP in crash years")]
    stop_sip_during_crash: bool,
    #[arg(long, default_value_t = 1, help = "Number of crash shocks over the horizon")]
    crash_count: u32,
    #[arg(
        long,
        default_value_t = -30.0,
        help = "Equity return override for crash years, in percent"
    )]
    equity_shock: f64,
    #[arg(
        long,
        default_value_t = -50.0,
        help = "Crypto return override for crash years, in percent"
    )]
    crypto_shock: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioReport {
    final_value: f64,
    recovery_year: Option<u32>,
    yearly_totals: Vec<f64>,
}

impl From<SimulationResult> for ScenarioReport {
    fn from(result: SimulationResult) -> Self {
        Self {
            final_value: result.final_total(),
            recovery_year: result.recovery_year,
            yearly_totals: result.yearly_totals,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    horizon_years: u32,
    initial_corpus: f64,
    crash_years: Vec<u32>,
    stayed_invested: ScenarioReport,
    panic_sold: ScenarioReport,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn resolve_allocation(cli: &Cli) -> Result<AllocationProfile, String> {
    let custom = [
        cli.equity_weight,
        cli.debt_weight,
        cli.gold_weight,
        cli.crypto_weight,
    ];

    if custom.iter().any(Option::is_some) {
        let [Some(equity), Some(debt), Some(gold), Some(crypto)] = custom else {
            return Err(
                "--equity-weight, --debt-weight, --gold-weight and --crypto-weight must be \
                 provided together"
                    .to_string(),
            );
        };
        return AllocationProfile::custom([equity, debt, gold, crypto])
            .map_err(|e| e.to_string());
    }

    Ok(match cli.strategy {
        Some(strategy) => AllocationProfile::strategy(strategy.into()),
        None => AllocationProfile::risk_tier(cli.risk_tier.into()),
    })
}

fn build_config(cli: Cli) -> Result<SimulationConfig, String> {
    for (name, rate) in [
        ("--equity-return", cli.equity_return),
        ("--debt-return", cli.debt_return),
        ("--gold-return", cli.gold_return),
        ("--crypto-return", cli.crypto_return),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(format!("{name} must be a finite percentage > -100"));
        }
    }

    let allocation = resolve_allocation(&cli)?;

    let config = SimulationConfig {
        initial_corpus: cli.corpus,
        monthly_sip: cli.monthly_sip,
        horizon_years: cli.years,
        allocation,
        returns: ReturnAssumptions {
            equity: cli.equity_return / 100.0,
            debt: cli.debt_return / 100.0,
            gold: cli.gold_return / 100.0,
            crypto: cli.crypto_return / 100.0,
        },
        rebalance: !cli.no_rebalance,
        sip_during_crash: !cli.stop_sip_during_crash,
        crash_count: cli.crash_count,
        shock: CrashShock {
            equity: cli.equity_shock / 100.0,
            crypto: cli.crypto_shock / 100.0,
        },
    };

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn default_cli_for_api() -> Cli {
    Cli::parse_from(["panicsim"])
}

fn config_from_payload(payload: SimulatePayload) -> Result<SimulationConfig, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.corpus {
        cli.corpus = v;
    }
    if let Some(v) = payload.monthly_sip {
        cli.monthly_sip = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }

    if let Some(v) = payload.risk_tier {
        cli.risk_tier = v.into();
    }
    if let Some(v) = payload.strategy {
        cli.strategy = Some(v.into());
    }
    cli.equity_weight = payload.equity_weight;
    cli.debt_weight = payload.debt_weight;
    cli.gold_weight = payload.gold_weight;
    cli.crypto_weight = payload.crypto_weight;

    if let Some(v) = payload.equity_return {
        cli.equity_return = v;
    }
    if let Some(v) = payload.debt_return {
        cli.debt_return = v;
    }
    if let Some(v) = payload.gold_return {
        cli.gold_return = v;
    }
    if let Some(v) = payload.crypto_return {
        cli.crypto_return = v;
    }

    if let Some(v) = payload.rebalance {
        cli.no_rebalance = !v;
    }
    if let Some(v) = payload.sip_during_crash {
        cli.stop_sip_during_crash = !v;
    }

    if let Some(v) = payload.crash_count {
        cli.crash_count = v;
    }
    if let Some(v) = payload.equity_shock {
        cli.equity_shock = v;
    }
    if let Some(v) = payload.crypto_shock {
        cli.crypto_shock = v;
    }

    build_config(cli)
}

fn build_simulate_response(config: &SimulationConfig) -> SimulateResponse {
    let (calm, panicked) = run_scenarios(config);
    SimulateResponse {
        horizon_years: config.horizon_years,
        initial_corpus: config.initial_corpus,
        crash_years: crash_years(config.horizon_years, config.crash_count),
        stayed_invested: calm.into(),
        panic_sold: panicked.into(),
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("panicsim HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let config = match config_from_payload(payload) {
        Ok(config) => config,
        Err(msg) => {
            log::warn!("rejected simulate request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    json_response(StatusCode::OK, build_simulate_response(&config))
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
fn config_from_json(json: &str) -> Result<SimulationConfig, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    config_from_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssetClass;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_config_applies_documented_defaults() {
        let config = build_config(sample_cli()).expect("valid defaults");

        assert_approx(config.initial_corpus, 500_000.0);
        assert_approx(config.monthly_sip, 10_000.0);
        assert_eq!(config.horizon_years, 10);
        assert_eq!(config.crash_count, 1);
        assert!(config.rebalance);
        assert!(config.sip_during_crash);
        assert_eq!(config.allocation.weight(AssetClass::Equity), 60);
        assert_approx(config.returns.equity, 0.12);
        assert_approx(config.shock.equity, -0.30);
        assert_approx(config.shock.crypto, -0.50);
    }

    #[test]
    fn strategy_preset_overrides_risk_tier() {
        let mut cli = sample_cli();
        cli.risk_tier = CliRiskTier::Low;
        cli.strategy = Some(CliStrategy::AllEquity);

        let config = build_config(cli).expect("valid config");
        assert_eq!(config.allocation.weight(AssetClass::Equity), 100);
        assert_eq!(config.allocation.weight(AssetClass::Debt), 0);
    }

    #[test]
    fn custom_weights_require_all_four() {
        let mut cli = sample_cli();
        cli.equity_weight = Some(50);
        cli.debt_weight = Some(50);

        let err = build_config(cli).expect_err("must reject partial weights");
        assert!(err.contains("provided together"));
    }

    #[test]
    fn custom_weights_must_sum_to_hundred() {
        let mut cli = sample_cli();
        cli.equity_weight = Some(50);
        cli.debt_weight = Some(30);
        cli.gold_weight = Some(10);
        cli.crypto_weight = Some(5);

        let err = build_config(cli).expect_err("must reject bad weight sum");
        assert!(err.contains("sum to 100"));
    }

    #[test]
    fn build_config_rejects_out_of_range_horizon() {
        let mut cli = sample_cli();
        cli.years = 0;
        assert!(build_config(cli).is_err());

        let mut cli = sample_cli();
        cli.years = 26;
        let err = build_config(cli).expect_err("must reject long horizon");
        assert!(err.contains("horizon"));
    }

    #[test]
    fn build_config_rejects_negative_corpus_and_sip() {
        let mut cli = sample_cli();
        cli.corpus = -1.0;
        assert!(build_config(cli).is_err());

        let mut cli = sample_cli();
        cli.monthly_sip = -5.0;
        assert!(build_config(cli).is_err());
    }

    #[test]
    fn build_config_rejects_total_loss_returns() {
        let mut cli = sample_cli();
        cli.crypto_return = -100.0;
        let err = build_config(cli).expect_err("must reject -100% return");
        assert!(err.contains("--crypto-return"));
    }

    #[test]
    fn config_from_json_parses_web_keys() {
        let json = r#"{
          "corpus": 750000,
          "monthlySip": 5000,
          "years": 15,
          "riskTier": "high",
          "crashCount": 2,
          "equityShock": -40,
          "cryptoShock": -60,
          "rebalance": false,
          "sipDuringCrash": false
        }"#;
        let config = config_from_json(json).expect("json should parse");

        assert_approx(config.initial_corpus, 750_000.0);
        assert_approx(config.monthly_sip, 5_000.0);
        assert_eq!(config.horizon_years, 15);
        assert_eq!(config.allocation.weight(AssetClass::Equity), 70);
        assert_eq!(config.crash_count, 2);
        assert_approx(config.shock.equity, -0.40);
        assert_approx(config.shock.crypto, -0.60);
        assert!(!config.rebalance);
        assert!(!config.sip_during_crash);
    }

    #[test]
    fn config_from_json_accepts_strategy_and_custom_weights() {
        let config = config_from_json(r#"{ "strategy": "all-crypto" }"#).expect("strategy parses");
        assert_eq!(config.allocation.weight(AssetClass::Crypto), 100);

        let config = config_from_json(
            r#"{
              "equityWeight": 40,
              "debtWeight": 40,
              "goldWeight": 15,
              "cryptoWeight": 5
            }"#,
        )
        .expect("custom weights parse");
        assert_eq!(config.allocation.weight(AssetClass::Gold), 15);
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let config = build_config(sample_cli()).expect("valid defaults");
        let response = build_simulate_response(&config);

        assert_eq!(response.crash_years, vec![3]);
        assert_eq!(
            response.stayed_invested.yearly_totals.len(),
            config.horizon_years as usize
        );

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"horizonYears\""));
        assert!(json.contains("\"initialCorpus\""));
        assert!(json.contains("\"crashYears\""));
        assert!(json.contains("\"stayedInvested\""));
        assert!(json.contains("\"panicSold\""));
        assert!(json.contains("\"finalValue\""));
        assert!(json.contains("\"recoveryYear\""));
        assert!(json.contains("\"yearlyTotals\""));
    }

    #[test]
    fn panic_scenario_in_response_never_beats_staying_invested() {
        let config = build_config(sample_cli()).expect("valid defaults");
        let response = build_simulate_response(&config);
        assert!(response.panic_sold.final_value <= response.stayed_invested.final_value);
    }
}
