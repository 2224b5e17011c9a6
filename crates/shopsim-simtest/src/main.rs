//! ShopSim Headless Simulation Harness
//!
//! Validates the pure shop logic in-process, and plays runs at the console
//! either on autopilot or with an operator answering prompts.
//!
//! Usage:
//!   cargo run -p shopsim-simtest
//!   cargo run -p shopsim-simtest -- --verbose
//!   cargo run -p shopsim-simtest -- --autopilot --seed 7 --json days.json
//!   cargo run -p shopsim-simtest -- --interactive --save shop.sav
//!   cargo run -p shopsim-simtest -- --interactive --load shop.sav

mod console;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use serde::Serialize;
use shopsim_logic::config::{ConfigIssue, PriceRange};
use shopsim_logic::driver::{run, NullObserver, Observer, RecordingObserver, RunReport};
use shopsim_logic::invariants::{check_state, check_transition};
use shopsim_logic::persistence;
use shopsim_logic::policy::{RestockPolicy, ScriptedDecisions};
use shopsim_logic::prelude::*;
use tracing_subscriber::EnvFilter;

use console::{ConsoleObserver, StdinDecisions};

// ── Bundled config (same JSON as the defaults) ──────────────────────────
const DEFAULT_CONFIG_JSON: &str = include_str!("../../../data/shop_config.json");

const SWEEP_SEEDS: u64 = 40;

// ── Command line ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Validate,
    Autopilot,
    Interactive,
}

/// ShopSim harness: validation sweep by default, or a played run.
#[derive(Parser, Debug)]
#[command(name = "shopsim-simtest")]
#[command(about = "Validate the shop simulation or play a run at the console")]
struct Options {
    /// Print every check and raise the log level to debug
    #[arg(short, long)]
    verbose: bool,

    /// Play a run with the restocking autopilot
    #[arg(long, conflicts_with = "interactive")]
    autopilot: bool,

    /// Play a run answering the daily prompts
    #[arg(long)]
    interactive: bool,

    /// Noise seed (default: taken from the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON config file (default: the bundled data/shop_config.json)
    #[arg(long, conflicts_with = "load")]
    config: Option<PathBuf>,

    /// Resume from a save file, using the config stored in it
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the final state to a save file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Write every day summary as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the seed, config and end-of-run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Options {
    fn mode(&self) -> Mode {
        if self.interactive {
            Mode::Interactive
        } else if self.autopilot {
            Mode::Autopilot
        } else {
            Mode::Validate
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let opts = Options::parse();
    init_logging(opts.verbose);

    match opts.mode() {
        Mode::Validate => validate_all(opts.verbose),
        Mode::Autopilot | Mode::Interactive => {
            if let Err(err) = play(&opts) {
                tracing::error!("{err}");
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }
}

// ── Played runs ─────────────────────────────────────────────────────────

/// Everything a `--report` file holds.
#[derive(Debug, Serialize)]
struct RunDigest<'a> {
    seed: u64,
    started_on_day: u32,
    config: &'a SimConfig,
    report: &'a RunReport,
    final_state: &'a SimulationState,
}

/// Fans every callback out to two observers.
struct Both<A, B>(A, B);

impl<A: Observer, B: Observer> Observer for Both<A, B> {
    fn on_day_start(&mut self, state: &SimulationState) {
        self.0.on_day_start(state);
        self.1.on_day_start(state);
    }

    fn on_day_end(&mut self, summary: &DaySummary) {
        self.0.on_day_end(summary);
        self.1.on_day_end(summary);
    }

    fn on_finish(&mut self, report: &RunReport) {
        self.0.on_finish(report);
        self.1.on_finish(report);
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
        .unwrap_or(0)
}

fn play(opts: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let (config, mut state) = match &opts.load {
        Some(path) => {
            let saved = persistence::load_state(BufReader::new(File::open(path)?))?;
            tracing::info!(path = %path.display(), day = saved.state.day, "resuming saved run");
            (saved.config, saved.state)
        }
        None => {
            let config = match &opts.config {
                Some(path) => SimConfig::load(path)?,
                None => SimConfig::from_json_str(DEFAULT_CONFIG_JSON)?,
            };
            let state = SimulationState::new(&config);
            (config, state)
        }
    };
    let seed = opts.seed.unwrap_or_else(clock_seed);
    let started_on_day = state.day;
    tracing::info!(seed, day = started_on_day, horizon = config.horizon_days, "starting run");

    let mut engine = DayEngine::seeded(config.clone(), seed)?;
    let mut observer = Both(
        ConsoleObserver::new(io::stdout(), config.horizon_days),
        RecordingObserver::default(),
    );
    let report = match opts.mode() {
        Mode::Interactive => {
            let mut source = StdinDecisions::new(io::stdin().lock(), io::stdout(), config.pricing);
            let report = run(&mut engine, &mut state, &mut source, &mut observer)?;
            if source.is_closed() {
                tracing::info!("operator input ended before the last day");
            }
            report
        }
        _ => run(
            &mut engine,
            &mut state,
            &mut RestockPolicy::default(),
            &mut observer,
        )?,
    };

    if let Some(path) = &opts.save {
        persistence::save_state(BufWriter::new(File::create(path)?), &config, &state)?;
        println!("State saved to {}", path.display());
    }
    if let Some(path) = &opts.json {
        persistence::export_summaries(BufWriter::new(File::create(path)?), &observer.1.summaries)?;
        println!("Day summaries written to {}", path.display());
    }
    if let Some(path) = &opts.report {
        let digest = RunDigest {
            seed,
            started_on_day,
            config: &config,
            report: &report,
            final_state: &state,
        };
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &digest)?;
        println!("Run report written to {}", path.display());
    }
    Ok(())
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn validate_all(verbose: bool) {
    println!("=== ShopSim Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Bundled config
    results.extend(validate_config(verbose));

    // 2. Worked scenarios
    results.extend(validate_scenarios(verbose));

    // 3. Invariant sweep over seeds and strategies
    results.extend(validate_invariants(verbose));

    // 4. Determinism
    results.extend(validate_determinism(verbose));

    // 5. Save / load / export
    results.extend(validate_persistence(verbose));

    // 6. Autopilot over the full horizon
    results.extend(validate_autopilot(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn quiet_engine(config: SimConfig) -> Option<DayEngine<ScriptedNoise>> {
    DayEngine::new(config, ScriptedNoise::silent(), ScriptedNoise::silent()).ok()
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_config(verbose: bool) -> Vec<TestResult> {
    println!("--- Config ---");
    let mut results = Vec::new();

    let bundled = match SimConfig::from_json_str(DEFAULT_CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: false,
                detail: format!("bundled config: {}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "config_matches_defaults".into(),
        passed: bundled == SimConfig::default(),
        detail: "data/shop_config.json equals SimConfig::default()".into(),
    });

    let issues = bundled.validate();
    results.push(TestResult {
        name: "config_valid".into(),
        passed: issues.is_empty(),
        detail: if issues.is_empty() {
            format!(
                "horizon {} days, prices {}-{}, expenses {}/day",
                bundled.horizon_days,
                bundled.pricing.min,
                bundled.pricing.max,
                bundled.expenses.total()
            )
        } else {
            format!("{} issues: {:?}", issues.len(), issues)
        },
    });

    let mut broken = SimConfig::default();
    broken.pricing = PriceRange {
        min: 60.0,
        max: 50.0,
    };
    broken.offers.regeneration_period = 0;
    let issues = broken.validate();
    results.push(TestResult {
        name: "config_rejects_broken".into(),
        passed: issues.contains(&ConfigIssue::ZeroRegenerationPeriod)
            && issues
                .iter()
                .any(|i| matches!(i, ConfigIssue::PriceRangeInverted { .. }))
            && quiet_engine(broken).is_none(),
        detail: format!("{} issues found, engine refused", issues.len()),
    });

    let partial = SimConfig::from_json_str(r#"{ "horizon_days": 30 }"#);
    results.push(TestResult {
        name: "config_partial_json".into(),
        passed: matches!(&partial, Ok(c) if c.horizon_days == 30 && c.start == SimConfig::default().start),
        detail: "missing sections fall back to defaults".into(),
    });

    if verbose {
        let refresh: Vec<u32> = (1..=bundled.horizon_days)
            .filter(|d| bundled.offers.refreshes_on(*d))
            .collect();
        println!("  lots drawn on days {:?}", refresh);
    }

    results
}

// ── 2. Scenarios ────────────────────────────────────────────────────────

fn validate_scenarios(_verbose: bool) -> Vec<TestResult> {
    println!("--- Scenarios ---");
    let mut results = Vec::new();
    let config = SimConfig::default();

    // Transfer 50 at price 20, no noise: demand 500, everything sells
    if let Some(mut engine) = quiet_engine(config.clone()) {
        let mut state = SimulationState::new(&config);
        let decision = OperatorDecision::hold(&state).transfer(50.0).price(20.0);
        match engine.advance(&mut state, &decision) {
            Ok(s) => results.push(TestResult {
                name: "scenario_transfer_50_price_20".into(),
                passed: state.basic_store == 310.0
                    && s.sold == 130.0
                    && state.shop_store == 0.0
                    && state.account == 10_000.0 + 2600.0 - 1400.0,
                detail: format!(
                    "basic {}, sold {}, lost {}, account {:.2}",
                    state.basic_store, s.sold, s.lost, state.account
                ),
            }),
            Err(e) => results.push(failure("scenario_transfer_50_price_20", e)),
        }
    }

    // Accept 45 @ 35 over three installments
    if let Ok(mut engine) = DayEngine::new(
        config.clone(),
        ScriptedNoise::new([5, 0]),
        ScriptedNoise::silent(),
    ) {
        let mut state = SimulationState::new(&config);
        let decision = OperatorDecision::hold(&state).accept(Financing::Installments3);
        match engine.advance(&mut state, &decision) {
            Ok(s) => results.push(TestResult {
                name: "scenario_three_installments".into(),
                passed: matches!(
                    s.offer_outcome,
                    OfferOutcome::Financed { total, first_payment, outstanding, installments_remaining: 2 }
                        if total == 1575.0 && first_payment == 525.0 && outstanding == 1050.0
                ) && s.received == 45.0
                    && state.basic_store == 405.0,
                detail: format!("{:?}, then {:?}", s.offer_outcome, s.installment),
            }),
            Err(e) => results.push(failure("scenario_three_installments", e)),
        }
    }

    // Overdrawn at -150 with an empty shop: expenses push it to -1550
    if let Some(mut engine) = quiet_engine(config.clone()) {
        let mut state = SimulationState::new(&config);
        state.account = -150.0;
        state.shop_store = 0.0;
        let hold = OperatorDecision::hold(&state);
        match engine.advance(&mut state, &hold) {
            Ok(s) => results.push(TestResult {
                name: "scenario_insolvency_flag".into(),
                passed: s.insolvent && state.account == -1550.0,
                detail: format!("account {:.2}, flagged {}", state.account, s.insolvent),
            }),
            Err(e) => results.push(failure("scenario_insolvency_flag", e)),
        }
    }

    // Final 525 installment with only 300 left after expenses
    if let Some(mut engine) = quiet_engine(config.clone()) {
        let mut state = SimulationState::new(&config);
        state.shop_store = 0.0;
        state.account = 1700.0;
        state.debt = Debt {
            outstanding: 525.0,
            installments_remaining: 1,
            installment_amount: 525.0,
        };
        let hold = OperatorDecision::hold(&state);
        match engine.advance(&mut state, &hold) {
            Ok(s) => results.push(TestResult {
                name: "scenario_deferred_installment".into(),
                passed: matches!(s.installment, InstallmentOutcome::Deferred { .. })
                    && state.account == 300.0
                    && state.debt.outstanding == 525.0,
                detail: format!("{:?}", s.installment),
            }),
            Err(e) => results.push(failure("scenario_deferred_installment", e)),
        }
    }

    results
}

fn failure(name: &str, err: EngineError) -> TestResult {
    TestResult {
        name: name.into(),
        passed: false,
        detail: format!("engine error: {}", err),
    }
}

// ── 3. Invariants ───────────────────────────────────────────────────────

/// A blunt operator: moves everything, always asks for the lot, cycles
/// financing and price by seed.
fn greedy_decision(seed: u64, state: &SimulationState) -> OperatorDecision {
    let financing = Financing::from_code([1, 3, 6][(seed % 3) as usize]);
    let price = 5.0 + ((seed * 7 + state.day as u64 * 3) % 60) as f64;
    OperatorDecision::hold(state)
        .transfer(state.basic_store * 2.0)
        .accept(financing)
        .price(price)
}

fn validate_invariants(verbose: bool) -> Vec<TestResult> {
    println!("--- Invariants ---");
    let mut results = Vec::new();
    let config = SimConfig::default();

    let mut days = 0u32;
    let mut violations = Vec::new();
    let mut errors = 0u32;
    for seed in 0..SWEEP_SEEDS {
        for greedy in [false, true] {
            let mut engine = match DayEngine::seeded(config.clone(), seed) {
                Ok(e) => e,
                Err(_) => {
                    errors += 1;
                    continue;
                }
            };
            let mut state = SimulationState::new(&config);
            let mut policy = RestockPolicy::default();
            while !state.is_finished(&config) {
                engine.open_day(&mut state);
                let before = state.clone();
                let decision = if greedy {
                    greedy_decision(seed, &state)
                } else {
                    policy.next_decision(&state)
                };
                let summary = match engine.advance(&mut state, &decision) {
                    Ok(s) => s,
                    Err(_) => {
                        errors += 1;
                        break;
                    }
                };
                days += 1;
                for v in check_transition(&before, &summary)
                    .into_iter()
                    .chain(check_state(&state, &config))
                {
                    violations.push(format!("seed {} day {}: {}", seed, summary.day, v));
                }
            }
        }
    }

    results.push(TestResult {
        name: "invariants_sweep".into(),
        passed: violations.is_empty() && errors == 0,
        detail: format!(
            "{} simulated days over {} seeds, {} violations, {} engine errors",
            days,
            SWEEP_SEEDS,
            violations.len(),
            errors
        ),
    });
    if verbose {
        for v in violations.iter().take(10) {
            println!("  {}", v);
        }
    }

    // Past the horizon the engine refuses and leaves the state alone
    let short = SimConfig {
        horizon_days: 1,
        ..SimConfig::default()
    };
    if let Some(mut engine) = quiet_engine(short.clone()) {
        let mut state = SimulationState::new(&short);
        let hold = OperatorDecision::hold(&state);
        let first = engine.advance(&mut state, &hold).is_ok();
        let frozen = state.clone();
        let second = engine.advance(&mut state, &hold);
        results.push(TestResult {
            name: "invariants_horizon_guard".into(),
            passed: first
                && matches!(second, Err(EngineError::HorizonReached { .. }))
                && state == frozen,
            detail: "advance past the last day is refused".into(),
        });
    }

    results
}

// ── 4. Determinism ──────────────────────────────────────────────────────

fn autopilot_summaries(config: &SimConfig, seed: u64) -> Option<Vec<DaySummary>> {
    let mut engine = DayEngine::seeded(config.clone(), seed).ok()?;
    let mut state = SimulationState::new(config);
    let mut observer = RecordingObserver::default();
    run(
        &mut engine,
        &mut state,
        &mut RestockPolicy::default(),
        &mut observer,
    )
    .ok()?;
    Some(observer.summaries)
}

fn validate_determinism(_verbose: bool) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();
    let config = SimConfig::default();

    let a = autopilot_summaries(&config, 1234);
    let b = autopilot_summaries(&config, 1234);
    let c = autopilot_summaries(&config, 4321);
    results.push(TestResult {
        name: "determinism_same_seed".into(),
        passed: a.is_some() && a == b,
        detail: "two runs with seed 1234 match day for day".into(),
    });
    results.push(TestResult {
        name: "determinism_seed_matters".into(),
        passed: a.is_some() && a != c,
        detail: "seeds 1234 and 4321 diverge".into(),
    });

    // Scripted decisions replay exactly against scripted noise
    let replay = || {
        let mut engine = quiet_engine(config.clone())?;
        let mut state = SimulationState::new(&config);
        let mut source = ScriptedDecisions::new([
            OperatorDecision::hold(&state).transfer(40.0).price(18.0),
            OperatorDecision::hold(&state)
                .transfer(60.0)
                .accept(Financing::Installments6)
                .price(22.0),
        ]);
        run(&mut engine, &mut state, &mut source, &mut NullObserver).ok()?;
        Some(state)
    };
    let first = replay();
    results.push(TestResult {
        name: "determinism_scripted_replay".into(),
        passed: first.is_some() && first == replay(),
        detail: "scripted noise and decisions reproduce the final state".into(),
    });

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let config = SimConfig {
        horizon_days: 15,
        ..SimConfig::default()
    };
    let Ok(mut engine) = DayEngine::seeded(config.clone(), 99) else {
        results.push(TestResult {
            name: "persistence_setup".into(),
            passed: false,
            detail: "engine refused a valid config".into(),
        });
        return results;
    };
    let mut state = SimulationState::new(&config);
    let mut policy = RestockPolicy::default();
    let mut summaries = Vec::new();
    for _ in 0..7 {
        engine.open_day(&mut state);
        let decision = policy.next_decision(&state);
        if let Ok(s) = engine.advance(&mut state, &decision) {
            summaries.push(s);
        }
    }

    let mut buffer = Vec::new();
    let saved = persistence::save_state(&mut buffer, &config, &state);
    let loaded = persistence::load_state(buffer.as_slice());
    results.push(TestResult {
        name: "persistence_roundtrip".into(),
        passed: saved.is_ok()
            && matches!(&loaded, Ok(data) if data.state == state && data.config == config),
        detail: format!("{} bytes at day {}", buffer.len(), state.day),
    });

    // A resumed run finishes the horizon from the saved day
    if let Ok(data) = loaded {
        let mut resumed = data.state;
        let finished = DayEngine::seeded(data.config.clone(), 100)
            .ok()
            .and_then(|mut e| {
                run(
                    &mut e,
                    &mut resumed,
                    &mut RestockPolicy::default(),
                    &mut NullObserver,
                )
                .ok()
            });
        results.push(TestResult {
            name: "persistence_resume".into(),
            passed: matches!(&finished, Some(r) if r.days == config.horizon_days),
            detail: format!("resumed at day {} and ran to {}", state.day, resumed.day),
        });
    }

    let mut json = Vec::new();
    let exported = persistence::export_summaries(&mut json, &summaries);
    let parsed: Result<Vec<serde_json::Value>, _> = serde_json::from_slice(&json);
    results.push(TestResult {
        name: "persistence_json_export".into(),
        passed: exported.is_ok() && matches!(&parsed, Ok(v) if v.len() == summaries.len()),
        detail: format!("{} day summaries, {} bytes", summaries.len(), json.len()),
    });
    if verbose {
        if let Some(first) = summaries.first() {
            if let Ok(text) = serde_json::to_string(first) {
                println!("  day 1: {}", text);
            }
        }
    }

    results
}

// ── 6. Autopilot ────────────────────────────────────────────────────────

fn validate_autopilot(verbose: bool) -> Vec<TestResult> {
    println!("--- Autopilot ---");
    let mut results = Vec::new();
    let config = SimConfig::default();

    let mut reports = Vec::new();
    for seed in 0..SWEEP_SEEDS {
        let Ok(mut engine) = DayEngine::seeded(config.clone(), seed) else {
            continue;
        };
        let mut state = SimulationState::new(&config);
        if let Ok(report) = run(
            &mut engine,
            &mut state,
            &mut RestockPolicy::default(),
            &mut NullObserver,
        ) {
            reports.push(report);
        }
    }

    results.push(TestResult {
        name: "autopilot_completes".into(),
        passed: reports.len() as u64 == SWEEP_SEEDS
            && reports.iter().all(|r| r.days == config.horizon_days),
        detail: format!("{}/{} runs reached day {}", reports.len(), SWEEP_SEEDS, config.horizon_days),
    });

    let restocked = reports.iter().filter(|r| r.lots_received > 0).count();
    results.push(TestResult {
        name: "autopilot_buys_lots".into(),
        passed: restocked == reports.len(),
        detail: format!("{} runs received at least one lot", restocked),
    });

    let n = reports.len().max(1) as f64;
    let mean_account = reports.iter().map(|r| r.final_account).sum::<f64>() / n;
    let mean_fill = reports.iter().map(|r| r.fill_rate()).sum::<f64>() / n;
    let in_red = reports.iter().filter(|r| r.days_insolvent > 0).count();
    results.push(TestResult {
        name: "autopilot_outcome".into(),
        passed: mean_account.is_finite() && (0.0..=1.0).contains(&mean_fill),
        detail: format!(
            "mean final account {:.2}, mean fill rate {:.1}%, {} runs went negative",
            mean_account,
            mean_fill * 100.0,
            in_red
        ),
    });

    if verbose {
        if let Some(r) = reports.first() {
            println!(
                "  seed 0: account {:.2}, sold {:.0}, lost {:.0}, {} lots",
                r.final_account, r.total_sold, r.total_lost, r.lots_received
            );
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(list: &[&str]) -> Result<Options, clap::Error> {
        Options::try_parse_from(std::iter::once("shopsim-simtest").chain(list.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Options::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults_to_validate() {
        let opts = parse(&[]).unwrap();
        assert_eq!(opts.mode(), Mode::Validate);
        assert!(!opts.verbose);
        assert!(opts.seed.is_none());
    }

    #[test]
    fn test_parse_play_flags() {
        let opts = parse(&[
            "--interactive",
            "--seed",
            "7",
            "--save",
            "shop.sav",
            "--json",
            "days.json",
        ])
        .unwrap();
        assert_eq!(opts.mode(), Mode::Interactive);
        assert_eq!(opts.seed, Some(7));
        assert_eq!(opts.save, Some(PathBuf::from("shop.sav")));
        assert_eq!(opts.json, Some(PathBuf::from("days.json")));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&["--seed"]).is_err());
        assert!(parse(&["--seed", "soon"]).is_err());
        assert!(parse(&["--fast"]).is_err());
        assert!(parse(&["--autopilot", "--interactive"]).is_err());
    }

    #[test]
    fn test_load_and_config_conflict() {
        let err = parse(&["--autopilot", "--load", "shop.sav", "--config", "shop.json"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        assert!(parse(&["--autopilot", "--load", "shop.sav"]).is_ok());
    }

    #[test]
    fn test_clock_seed_varies() {
        let seeds: std::collections::HashSet<u64> = (0..5)
            .map(|_| {
                std::thread::sleep(std::time::Duration::from_millis(2));
                clock_seed()
            })
            .collect();
        assert!(seeds.len() > 1);
    }

    #[test]
    fn test_bundled_config_is_default() {
        assert_eq!(
            SimConfig::from_json_str(DEFAULT_CONFIG_JSON).unwrap(),
            SimConfig::default()
        );
    }

    #[test]
    fn test_all_sections_pass() {
        let results: Vec<TestResult> = [
            validate_config(false),
            validate_scenarios(false),
            validate_invariants(false),
            validate_determinism(false),
            validate_persistence(false),
            validate_autopilot(false),
        ]
        .into_iter()
        .flatten()
        .collect();
        let failed: Vec<String> = results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| format!("{}: {}", r.name, r.detail))
            .collect();
        assert!(failed.is_empty(), "{failed:?}");
    }
}
