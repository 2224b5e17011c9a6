//! Per-day operator input.

use serde::{Deserialize, Serialize};

use crate::state::SimulationState;

/// How an accepted lot is paid for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Financing {
    #[default]
    Immediate,
    Installments3,
    Installments6,
}

impl Financing {
    /// Number of payments, the first due on acceptance.
    pub fn installments(self) -> u32 {
        match self {
            Financing::Immediate => 1,
            Financing::Installments3 => 3,
            Financing::Installments6 => 6,
        }
    }

    /// Map the operator's numeric answer. Anything other than 3 or 6 means
    /// pay in full.
    pub fn from_code(code: u32) -> Self {
        match code {
            3 => Financing::Installments3,
            6 => Financing::Installments6,
            _ => Financing::Immediate,
        }
    }
}

/// One day's decision. Values may be out of range; the engine clamps them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatorDecision {
    pub transfer_volume: f64,
    pub accept_offer: bool,
    /// Only consulted when accepting a new lot with no open debt.
    pub financing: Financing,
    pub retail_price: f64,
}

impl OperatorDecision {
    /// Do nothing: no transfer, no lot, keep the current price.
    pub fn hold(state: &SimulationState) -> Self {
        Self {
            transfer_volume: 0.0,
            accept_offer: false,
            financing: Financing::Immediate,
            retail_price: state.retail_price,
        }
    }

    pub fn transfer(mut self, volume: f64) -> Self {
        self.transfer_volume = volume;
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.retail_price = price;
        self
    }

    pub fn accept(mut self, financing: Financing) -> Self {
        self.accept_offer = true;
        self.financing = financing;
        self
    }
}
