//! Non-interactive decision sources.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::decision::{Financing, OperatorDecision};
use crate::driver::DecisionSource;
use crate::state::SimulationState;

/// Replays a fixed list of decisions, then holds.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisions {
    queue: VecDeque<OperatorDecision>,
}

impl ScriptedDecisions {
    pub fn new(decisions: impl IntoIterator<Item = OperatorDecision>) -> Self {
        Self {
            queue: decisions.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DecisionSource for ScriptedDecisions {
    fn next_decision(&mut self, state: &SimulationState) -> OperatorDecision {
        self.queue
            .pop_front()
            .unwrap_or_else(|| OperatorDecision::hold(state))
    }
}

/// Autopilot: keep the shop topped up, buy lots when sensible, fixed price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestockPolicy {
    /// Shop stock to hold at the start of each day.
    pub shop_target: f64,
    /// Price charged every day.
    pub price: f64,
    /// Buy a lot when basic store drops below this.
    pub reorder_point: f64,
    /// Cash kept back when paying in full.
    pub cash_reserve: f64,
    /// Used when the account can't cover the lot plus reserve.
    pub fallback_financing: Financing,
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self {
            shop_target: 120.0,
            price: 20.0,
            reorder_point: 200.0,
            cash_reserve: 3000.0,
            fallback_financing: Financing::Installments3,
        }
    }
}

impl DecisionSource for RestockPolicy {
    fn next_decision(&mut self, state: &SimulationState) -> OperatorDecision {
        let mut decision = OperatorDecision::hold(state)
            .price(self.price)
            .transfer((self.shop_target - state.shop_store).max(0.0));

        let wants_lot = state.basic_store < self.reorder_point && !state.debt.is_open();
        if wants_lot {
            let total = state.offer.total();
            let financing = if state.account >= total + self.cash_reserve {
                Financing::Immediate
            } else {
                self.fallback_financing
            };
            decision = decision.accept(financing);
        }
        decision
    }
}
