//! Invariant checks over states and day transitions.
//!
//! Pure functions returning every violation found, empty when the ledger is
//! consistent. Used by the harness after each simulated day and by the
//! property tests.

use std::fmt;

use crate::config::SimConfig;
use crate::engine::{DaySummary, OfferOutcome};
use crate::state::SimulationState;

/// Tolerance for float bookkeeping comparisons.
pub const EPSILON: f64 = 1e-6;

/// A broken invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct InvariantViolation {
    pub category: &'static str,
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

fn violation(category: &'static str, message: String) -> InvariantViolation {
    InvariantViolation { category, message }
}

// ── State invariants ────────────────────────────────────────────────────

/// Stocks never negative.
pub fn check_stock(state: &SimulationState) -> Vec<InvariantViolation> {
    let mut errors = Vec::new();
    if state.basic_store < 0.0 {
        errors.push(violation(
            "stock",
            format!("basic store negative: {}", state.basic_store),
        ));
    }
    if state.shop_store < 0.0 {
        errors.push(violation(
            "stock",
            format!("shop store negative: {}", state.shop_store),
        ));
    }
    errors
}

/// Retail price inside the configured range.
pub fn check_price(state: &SimulationState, config: &SimConfig) -> Vec<InvariantViolation> {
    if config.pricing.contains(state.retail_price) {
        Vec::new()
    } else {
        vec![violation(
            "price",
            format!(
                "retail price {} outside [{}, {}]",
                state.retail_price, config.pricing.min, config.pricing.max
            ),
        )]
    }
}

/// Debt fields agree: no balance without installments, no negative balance.
pub fn check_debt(state: &SimulationState) -> Vec<InvariantViolation> {
    let mut errors = Vec::new();
    let debt = &state.debt;
    if debt.outstanding < -EPSILON {
        errors.push(violation(
            "debt",
            format!("outstanding balance negative: {}", debt.outstanding),
        ));
    }
    if debt.installments_remaining == 0 && debt.outstanding.abs() > EPSILON {
        errors.push(violation(
            "debt",
            format!(
                "{} outstanding with no installments remaining",
                debt.outstanding
            ),
        ));
    }
    errors
}

pub fn check_horizon(state: &SimulationState, config: &SimConfig) -> Vec<InvariantViolation> {
    if state.day > config.horizon_days {
        vec![violation(
            "day",
            format!("day {} beyond horizon {}", state.day, config.horizon_days),
        )]
    } else {
        Vec::new()
    }
}

pub fn check_finite(state: &SimulationState) -> Vec<InvariantViolation> {
    let fields = [
        ("account", state.account),
        ("basic_store", state.basic_store),
        ("shop_store", state.shop_store),
        ("retail_price", state.retail_price),
        ("debt.outstanding", state.debt.outstanding),
    ];
    fields
        .iter()
        .filter(|(_, v)| !v.is_finite())
        .map(|(name, v)| violation("finite", format!("{name} is {v}")))
        .collect()
}

/// All state invariants.
pub fn check_state(state: &SimulationState, config: &SimConfig) -> Vec<InvariantViolation> {
    let mut all = Vec::new();
    all.extend(check_finite(state));
    all.extend(check_stock(state));
    all.extend(check_price(state, config));
    all.extend(check_debt(state));
    all.extend(check_horizon(state, config));
    all
}

// ── Transition invariants ───────────────────────────────────────────────

/// Check one day's transition from `before` to `summary.state`.
pub fn check_transition(before: &SimulationState, summary: &DaySummary) -> Vec<InvariantViolation> {
    let mut errors = Vec::new();
    let after = &summary.state;

    if after.day != before.day + 1 {
        errors.push(violation(
            "day",
            format!("day went from {} to {}", before.day, after.day),
        ));
    }

    // units in = lot received, units out = sold
    let expected = before.total_stock() + summary.received - summary.sold;
    if (after.total_stock() - expected).abs() > EPSILON {
        errors.push(violation(
            "conservation",
            format!(
                "total stock {} but expected {}",
                after.total_stock(),
                expected
            ),
        ));
    }

    if summary.transferred < 0.0 || summary.transferred > before.basic_store + EPSILON {
        errors.push(violation(
            "transport",
            format!(
                "transferred {} with {} in basic store",
                summary.transferred, before.basic_store
            ),
        ));
    }

    if summary.sold > before.shop_store + summary.transferred + EPSILON {
        errors.push(violation(
            "sales",
            format!(
                "sold {} from a shop holding {}",
                summary.sold,
                before.shop_store + summary.transferred
            ),
        ));
    }
    if summary.sold > summary.demand + EPSILON {
        errors.push(violation(
            "sales",
            format!("sold {} above demand {}", summary.sold, summary.demand),
        ));
    }
    if summary.lost < -EPSILON || (summary.demand - summary.sold - summary.lost).abs() > EPSILON {
        errors.push(violation(
            "sales",
            format!(
                "lost {} != demand {} - sold {}",
                summary.lost, summary.demand, summary.sold
            ),
        ));
    }

    let new_plan = matches!(summary.offer_outcome, OfferOutcome::Financed { .. });
    if !new_plan && after.debt.outstanding > before.debt.outstanding + EPSILON {
        errors.push(violation(
            "debt",
            format!(
                "outstanding grew from {} to {} without a new plan",
                before.debt.outstanding, after.debt.outstanding
            ),
        ));
    }
    if !new_plan && after.debt.installments_remaining > before.debt.installments_remaining {
        errors.push(violation(
            "debt",
            format!(
                "installments grew from {} to {} without a new plan",
                before.debt.installments_remaining, after.debt.installments_remaining
            ),
        ));
    }

    if summary.insolvent != (after.account < 0.0) {
        errors.push(violation(
            "solvency",
            format!(
                "flag {} with account {}",
                summary.insolvent, after.account
            ),
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::OperatorDecision;
    use crate::engine::DayEngine;
    use crate::noise::ScriptedNoise;
    use crate::state::Debt;

    fn state() -> SimulationState {
        SimulationState::new(&SimConfig::default())
    }

    #[test]
    fn test_fresh_state_clean() {
        assert!(check_state(&state(), &SimConfig::default()).is_empty());
    }

    #[test]
    fn test_negative_stock_flagged() {
        let mut s = state();
        s.shop_store = -1.0;
        let errors = check_stock(&s);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, "stock");
    }

    #[test]
    fn test_price_out_of_range_flagged() {
        let mut s = state();
        s.retail_price = 60.0;
        assert_eq!(check_price(&s, &SimConfig::default()).len(), 1);
    }

    #[test]
    fn test_dangling_debt_flagged() {
        let mut s = state();
        s.debt = Debt {
            outstanding: 100.0,
            installments_remaining: 0,
            installment_amount: 50.0,
        };
        assert_eq!(check_debt(&s).len(), 1);
    }

    #[test]
    fn test_nan_flagged() {
        let mut s = state();
        s.account = f64::NAN;
        assert_eq!(check_finite(&s).len(), 1);
    }

    #[test]
    fn test_beyond_horizon_flagged() {
        let mut s = state();
        s.day = 101;
        assert_eq!(check_horizon(&s, &SimConfig::default()).len(), 1);
    }

    #[test]
    fn test_real_transition_clean() {
        let mut engine = DayEngine::new(
            SimConfig::default(),
            ScriptedNoise::new([5, 0]),
            ScriptedNoise::new([7]),
        )
        .unwrap();
        let mut s = state();
        let before = s.clone();
        let d = OperatorDecision::hold(&s)
            .transfer(50.0)
            .price(22.0)
            .accept(crate::decision::Financing::Installments3);
        let summary = engine.advance(&mut s, &d).unwrap();
        assert!(check_transition(&before, &summary).is_empty());
        assert!(check_state(&s, engine.config()).is_empty());
    }

    #[test]
    fn test_tampered_transition_flagged() {
        let mut engine =
            DayEngine::new(SimConfig::default(), ScriptedNoise::silent(), ScriptedNoise::silent())
                .unwrap();
        let mut s = state();
        let before = s.clone();
        let hold = OperatorDecision::hold(&s);
        let mut summary = engine.advance(&mut s, &hold).unwrap();
        summary.state.shop_store += 5.0;
        summary.lost += 1.0;
        let categories: Vec<_> = check_transition(&before, &summary)
            .into_iter()
            .map(|v| v.category)
            .collect();
        assert!(categories.contains(&"conservation"));
        assert!(categories.contains(&"sales"));
    }
}
