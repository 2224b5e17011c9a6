//! The business ledger carried from one day to the next.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;

/// The wholesale lot currently on the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub volume: f64,
    pub unit_price: f64,
}

impl Offer {
    pub fn total(&self) -> f64 {
        self.volume * self.unit_price
    }
}

/// An open installment plan. All zero means no debt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub outstanding: f64,
    pub installments_remaining: u32,
    pub installment_amount: f64,
}

impl Debt {
    /// True while a plan is being paid off.
    pub fn is_open(&self) -> bool {
        self.installments_remaining > 0 || self.outstanding > 0.0
    }

    /// Open a plan for `total` split into `installments` equal parts, the
    /// first of which is paid on acceptance.
    pub fn after_first_payment(total: f64, installments: u32) -> Self {
        let amount = total / installments as f64;
        Self {
            outstanding: total - amount,
            installments_remaining: installments - 1,
            installment_amount: amount,
        }
    }
}

/// Mutable state of one run. Owned by the driver, mutated only by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub account: f64,
    pub basic_store: f64,
    pub shop_store: f64,
    pub retail_price: f64,
    pub offer: Offer,
    /// Day the current lot was drawn for, 0 if none yet.
    pub offer_drawn_on: u32,
    pub offer_accepted_today: bool,
    pub debt: Debt,
    /// 0 before the first day, then 1-based.
    pub day: u32,
}

impl SimulationState {
    /// Opening state from the configured starting position.
    pub fn new(config: &SimConfig) -> Self {
        let start = &config.start;
        Self {
            account: start.account,
            basic_store: start.basic_store.max(0.0),
            shop_store: start.shop_store.max(0.0),
            retail_price: config.pricing.clamp(start.retail_price),
            offer: Offer::default(),
            offer_drawn_on: 0,
            offer_accepted_today: false,
            debt: Debt::default(),
            day: 0,
        }
    }

    pub fn total_stock(&self) -> f64 {
        self.basic_store + self.shop_store
    }

    pub fn is_insolvent(&self) -> bool {
        self.account < 0.0
    }

    /// True once the last configured day has been simulated.
    pub fn is_finished(&self, config: &SimConfig) -> bool {
        self.day >= config.horizon_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SimulationState::new(&SimConfig::default());
        assert_eq!(state.account, 10_000.0);
        assert_eq!(state.basic_store, 360.0);
        assert_eq!(state.shop_store, 80.0);
        assert_eq!(state.retail_price, 15.0);
        assert_eq!(state.day, 0);
        assert!(!state.debt.is_open());
        assert!(!state.is_finished(&SimConfig::default()));
    }

    #[test]
    fn test_initial_price_is_clamped() {
        let mut config = SimConfig::default();
        config.start.retail_price = 3.0;
        assert_eq!(SimulationState::new(&config).retail_price, 10.0);
    }

    #[test]
    fn test_debt_after_first_payment() {
        let debt = Debt::after_first_payment(1575.0, 3);
        assert_eq!(debt.installment_amount, 525.0);
        assert_eq!(debt.outstanding, 1050.0);
        assert_eq!(debt.installments_remaining, 2);
        assert!(debt.is_open());
    }

    #[test]
    fn test_offer_total() {
        let offer = Offer {
            volume: 45.0,
            unit_price: 35.0,
        };
        assert_eq!(offer.total(), 1575.0);
    }
}
