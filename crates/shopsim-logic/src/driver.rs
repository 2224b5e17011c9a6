//! Run loop and its two collaborators.
//!
//! The engine knows nothing about where decisions come from or where
//! reports go. A [`DecisionSource`] is asked once per day (except the last
//! day, which runs on [`OperatorDecision::hold`]) and an [`Observer`] sees
//! the state before each day and the summary after it. The day's lot is
//! drawn before either of them is called, so both see what is on offer.

use serde::{Deserialize, Serialize};

use crate::decision::OperatorDecision;
use crate::engine::{DayEngine, DaySummary};
use crate::error::EngineError;
use crate::noise::NoiseSource;
use crate::state::SimulationState;

/// Supplies the operator's decision for the upcoming day.
pub trait DecisionSource {
    fn next_decision(&mut self, state: &SimulationState) -> OperatorDecision;
}

/// Reporting sink. Must not influence the simulation.
pub trait Observer {
    fn on_day_start(&mut self, _state: &SimulationState) {}
    fn on_day_end(&mut self, _summary: &DaySummary) {}
    fn on_finish(&mut self, _report: &RunReport) {}
}

/// Ignores everything.
#[derive(Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Keeps every day's summary.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub summaries: Vec<DaySummary>,
    pub report: Option<RunReport>,
}

impl Observer for RecordingObserver {
    fn on_day_end(&mut self, summary: &DaySummary) {
        self.summaries.push(summary.clone());
    }

    fn on_finish(&mut self, report: &RunReport) {
        self.report = Some(report.clone());
    }
}

impl<F> DecisionSource for F
where
    F: FnMut(&SimulationState) -> OperatorDecision,
{
    fn next_decision(&mut self, state: &SimulationState) -> OperatorDecision {
        self(state)
    }
}

/// End-of-run figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub days: u32,
    pub final_account: f64,
    pub basic_store: f64,
    pub shop_store: f64,
    pub outstanding_debt: f64,
    pub total_income: f64,
    pub total_sold: f64,
    pub total_lost: f64,
    pub lots_received: u32,
    pub lots_declined: u32,
    pub installments_deferred: u32,
    pub days_insolvent: u32,
}

impl RunReport {
    /// Fold one day into the running totals.
    pub fn record(&mut self, summary: &DaySummary) {
        self.days = summary.day;
        self.final_account = summary.state.account;
        self.basic_store = summary.state.basic_store;
        self.shop_store = summary.state.shop_store;
        self.outstanding_debt = summary.state.debt.outstanding;
        self.total_income += summary.income;
        self.total_sold += summary.sold;
        self.total_lost += summary.lost;
        if summary.offer_outcome.accepted() {
            self.lots_received += 1;
        }
        if summary.offer_outcome.declined() {
            self.lots_declined += 1;
        }
        if matches!(
            summary.installment,
            crate::engine::InstallmentOutcome::Deferred { .. }
        ) {
            self.installments_deferred += 1;
        }
        if summary.insolvent {
            self.days_insolvent += 1;
        }
    }

    /// Share of demand that was served, 1.0 when there was none.
    pub fn fill_rate(&self) -> f64 {
        let demand = self.total_sold + self.total_lost;
        if demand <= 0.0 {
            1.0
        } else {
            self.total_sold / demand
        }
    }
}

/// Run from the state's current day to the horizon.
pub fn run<N, D, O>(
    engine: &mut DayEngine<N>,
    state: &mut SimulationState,
    source: &mut D,
    observer: &mut O,
) -> Result<RunReport, EngineError>
where
    N: NoiseSource,
    D: DecisionSource + ?Sized,
    O: Observer + ?Sized,
{
    let horizon = engine.config().horizon_days;
    let mut report = RunReport {
        days: state.day,
        final_account: state.account,
        basic_store: state.basic_store,
        shop_store: state.shop_store,
        outstanding_debt: state.debt.outstanding,
        ..RunReport::default()
    };
    log::info!("run starting at day {} of {}", state.day, horizon);

    while !state.is_finished(engine.config()) {
        engine.open_day(state);
        observer.on_day_start(state);
        let decision = if state.day + 1 < horizon {
            source.next_decision(state)
        } else {
            OperatorDecision::hold(state)
        };
        let summary = engine.advance(state, &decision)?;
        report.record(&summary);
        observer.on_day_end(&summary);
    }

    log::info!(
        "run finished: account {:.2}, {} days insolvent",
        report.final_account,
        report.days_insolvent
    );
    observer.on_finish(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::noise::ScriptedNoise;

    fn engine(horizon: u32) -> DayEngine<ScriptedNoise> {
        let config = SimConfig {
            horizon_days: horizon,
            ..SimConfig::default()
        };
        DayEngine::new(config, ScriptedNoise::silent(), ScriptedNoise::silent()).unwrap()
    }

    #[test]
    fn test_run_reaches_horizon() {
        let mut engine = engine(5);
        let mut state = SimulationState::new(engine.config());
        let mut source = |s: &SimulationState| OperatorDecision::hold(s).transfer(10.0);
        let mut observer = RecordingObserver::default();
        let report = run(&mut engine, &mut state, &mut source, &mut observer).unwrap();
        assert_eq!(state.day, 5);
        assert_eq!(report.days, 5);
        assert_eq!(observer.summaries.len(), 5);
        assert_eq!(observer.report.as_ref(), Some(&report));
    }

    #[test]
    fn test_last_day_not_asked() {
        let mut engine = engine(4);
        let mut state = SimulationState::new(engine.config());
        let mut asked = Vec::new();
        let mut source = |s: &SimulationState| {
            asked.push(s.day);
            OperatorDecision::hold(s).transfer(10.0)
        };
        let report = run(&mut engine, &mut state, &mut source, &mut NullObserver).unwrap();
        assert_eq!(asked, vec![0, 1, 2]);
        assert_eq!(report.days, 4);
    }

    #[test]
    fn test_last_day_holds() {
        let mut engine = engine(2);
        let mut state = SimulationState::new(engine.config());
        let mut source = |s: &SimulationState| OperatorDecision::hold(s).transfer(30.0);
        let mut observer = RecordingObserver::default();
        run(&mut engine, &mut state, &mut source, &mut observer).unwrap();
        assert_eq!(observer.summaries[0].transferred, 30.0);
        assert_eq!(observer.summaries[1].transferred, 0.0);
    }

    #[test]
    fn test_run_on_finished_state_is_noop() {
        let mut engine = engine(3);
        let mut state = SimulationState::new(engine.config());
        state.day = 3;
        let mut source = |s: &SimulationState| OperatorDecision::hold(s);
        let mut observer = RecordingObserver::default();
        let report = run(&mut engine, &mut state, &mut source, &mut observer).unwrap();
        assert!(observer.summaries.is_empty());
        assert_eq!(report.days, 3);
    }

    #[test]
    fn test_fill_rate() {
        let report = RunReport {
            total_sold: 75.0,
            total_lost: 25.0,
            ..RunReport::default()
        };
        assert_eq!(report.fill_rate(), 0.75);
        assert_eq!(RunReport::default().fill_rate(), 1.0);
    }
}
