//! Day engine: advances the shop by exactly one day.
//!
//! A day is the fixed sequence in [`Step::ORDER`]. Every step sees the
//! effects of the ones before it, so the order is part of the model: income
//! is booked before fixed expenses, and installments are attempted only
//! after expenses, which means a good sales day can still miss a payment.
//!
//! Nothing here fails on business grounds. A lot that can't be paid for is
//! declined, an installment that can't be covered is deferred, a negative
//! balance is flagged; all of it is reported in the [`DaySummary`].

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::decision::{Financing, OperatorDecision};
use crate::error::EngineError;
use crate::noise::{split_seed, NoiseSource, SeededNoise};
use crate::state::{Debt, Offer, SimulationState};

/// The ten steps of a simulated day, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    OfferRefresh,
    Decision,
    Transport,
    ProcurementReceipt,
    Demand,
    Sales,
    Income,
    FixedExpenses,
    DebtAmortization,
    SolvencyCheck,
}

impl Step {
    pub const ORDER: [Step; 10] = [
        Step::OfferRefresh,
        Step::Decision,
        Step::Transport,
        Step::ProcurementReceipt,
        Step::Demand,
        Step::Sales,
        Step::Income,
        Step::FixedExpenses,
        Step::DebtAmortization,
        Step::SolvencyCheck,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Step::OfferRefresh => "offer_refresh",
            Step::Decision => "decision",
            Step::Transport => "transport",
            Step::ProcurementReceipt => "procurement_receipt",
            Step::Demand => "demand",
            Step::Sales => "sales",
            Step::Income => "income",
            Step::FixedExpenses => "fixed_expenses",
            Step::DebtAmortization => "debt_amortization",
            Step::SolvencyCheck => "solvency_check",
        }
    }
}

/// What happened to the operator's request for the current lot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OfferOutcome {
    NotRequested,
    PaidInFull {
        total: f64,
    },
    Financed {
        total: f64,
        first_payment: f64,
        outstanding: f64,
        installments_remaining: u32,
    },
    DeclinedInsufficientFunds {
        total: f64,
        available: f64,
    },
    /// An installment plan is already open; only one is allowed at a time.
    DeclinedDebtOutstanding {
        outstanding: f64,
    },
}

impl OfferOutcome {
    pub fn accepted(&self) -> bool {
        matches!(
            self,
            OfferOutcome::PaidInFull { .. } | OfferOutcome::Financed { .. }
        )
    }

    pub fn declined(&self) -> bool {
        matches!(
            self,
            OfferOutcome::DeclinedInsufficientFunds { .. }
                | OfferOutcome::DeclinedDebtOutstanding { .. }
        )
    }
}

/// Result of the day's installment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InstallmentOutcome {
    NoDebt,
    Paid {
        amount: f64,
        outstanding: f64,
        installments_remaining: u32,
    },
    /// Final payment of the whole remaining balance.
    Settled {
        amount: f64,
    },
    /// Not enough money; retried tomorrow with the debt unchanged.
    Deferred {
        due: f64,
        available: f64,
    },
}

impl InstallmentOutcome {
    /// Amount actually debited by the amortization step.
    pub fn paid(&self) -> f64 {
        match self {
            InstallmentOutcome::Paid { amount, .. } | InstallmentOutcome::Settled { amount } => {
                *amount
            }
            InstallmentOutcome::NoDebt | InstallmentOutcome::Deferred { .. } => 0.0,
        }
    }
}

/// Everything that happened on one day plus the resulting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub day: u32,
    pub offer: Offer,
    pub offer_refreshed: bool,
    pub offer_outcome: OfferOutcome,
    /// Units actually moved to the shop (after clamping).
    pub transferred: f64,
    /// Units of the lot delivered to the basic store.
    pub received: f64,
    pub demand: f64,
    pub sold: f64,
    pub lost: f64,
    pub income: f64,
    pub expenses: f64,
    pub installment: InstallmentOutcome,
    /// Account ended the day below zero.
    pub insolvent: bool,
    pub state: SimulationState,
}

/// Working values of the day being simulated.
#[derive(Debug, Clone)]
struct DayLedger {
    offer_refreshed: bool,
    transferred: f64,
    offer_outcome: OfferOutcome,
    received: f64,
    demand: f64,
    sold: f64,
    lost: f64,
    income: f64,
    expenses: f64,
    installment: InstallmentOutcome,
    insolvent: bool,
}

impl Default for DayLedger {
    fn default() -> Self {
        Self {
            offer_refreshed: false,
            transferred: 0.0,
            offer_outcome: OfferOutcome::NotRequested,
            received: 0.0,
            demand: 0.0,
            sold: 0.0,
            lost: 0.0,
            income: 0.0,
            expenses: 0.0,
            installment: InstallmentOutcome::NoDebt,
            insolvent: false,
        }
    }
}

/// Clamp a requested transfer into `[0, available]`. Garbage reads as 0.
pub fn clamp_transfer(requested: f64, available: f64) -> f64 {
    if !requested.is_finite() {
        return 0.0;
    }
    requested.clamp(0.0, available.max(0.0))
}

/// Stateless with respect to the business: holds only the config and the
/// two noise streams. The ledger lives in [`SimulationState`].
pub struct DayEngine<N: NoiseSource = SeededNoise> {
    config: SimConfig,
    offer_noise: N,
    demand_noise: N,
}

impl DayEngine<SeededNoise> {
    /// Engine whose offer and demand streams both derive from `seed`.
    pub fn seeded(config: SimConfig, seed: u64) -> Result<Self, EngineError> {
        let (offer_seed, demand_seed) = split_seed(seed);
        Self::new(
            config,
            SeededNoise::new(offer_seed),
            SeededNoise::new(demand_seed),
        )
    }

    pub fn reseed(&mut self, seed: u64) {
        let (offer_seed, demand_seed) = split_seed(seed);
        self.offer_noise.reseed(offer_seed);
        self.demand_noise.reseed(demand_seed);
    }
}

impl<N: NoiseSource> DayEngine<N> {
    /// Build an engine, rejecting configurations it can't run.
    pub fn new(config: SimConfig, offer_noise: N, demand_noise: N) -> Result<Self, EngineError> {
        let issues = config.validate();
        if !issues.is_empty() {
            return Err(EngineError::InvalidConfig(issues));
        }
        Ok(Self {
            config,
            offer_noise,
            demand_noise,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Simulate the next day.
    ///
    /// Refuses to run once `state.day` has reached the horizon, leaving the
    /// state untouched.
    pub fn advance(
        &mut self,
        state: &mut SimulationState,
        decision: &OperatorDecision,
    ) -> Result<DaySummary, EngineError> {
        if state.day >= self.config.horizon_days {
            return Err(EngineError::HorizonReached {
                day: state.day,
                horizon: self.config.horizon_days,
            });
        }
        state.day += 1;

        let mut ledger = DayLedger::default();
        for step in Step::ORDER {
            log::trace!("day {}: {}", state.day, step.label());
            self.apply(step, state, decision, &mut ledger);
        }

        log::info!(
            "day {}: sold {:.1}/{:.1}, income {:.2}, account {:.2}",
            state.day,
            ledger.sold,
            ledger.demand,
            ledger.income,
            state.account
        );

        Ok(DaySummary {
            day: state.day,
            offer: state.offer,
            offer_refreshed: ledger.offer_refreshed,
            offer_outcome: ledger.offer_outcome,
            transferred: ledger.transferred,
            received: ledger.received,
            demand: ledger.demand,
            sold: ledger.sold,
            lost: ledger.lost,
            income: ledger.income,
            expenses: ledger.expenses,
            installment: ledger.installment,
            insolvent: ledger.insolvent,
            state: state.clone(),
        })
    }

    fn apply(
        &mut self,
        step: Step,
        state: &mut SimulationState,
        decision: &OperatorDecision,
        ledger: &mut DayLedger,
    ) {
        let config = &self.config;
        match step {
            Step::OfferRefresh => {
                let day = state.day;
                ledger.offer_refreshed = self.config.offers.refreshes_on(day);
                self.refresh_offer(state, day);
            }
            Step::Decision => {
                state.offer_accepted_today = false;
                ledger.transferred = clamp_transfer(decision.transfer_volume, state.basic_store);
                ledger.offer_outcome = if !decision.accept_offer {
                    OfferOutcome::NotRequested
                } else if state.debt.is_open() {
                    log::warn!(
                        "day {}: lot declined, {:.2} still owed on the previous one",
                        state.day,
                        state.debt.outstanding
                    );
                    OfferOutcome::DeclinedDebtOutstanding {
                        outstanding: state.debt.outstanding,
                    }
                } else {
                    finance_offer(state, decision.financing)
                };
                if decision.retail_price.is_finite() {
                    state.retail_price = config.pricing.clamp(decision.retail_price);
                } else {
                    state.retail_price = config.pricing.clamp(state.retail_price);
                }
            }
            Step::Transport => {
                state.basic_store -= ledger.transferred;
                state.shop_store += ledger.transferred;
            }
            Step::ProcurementReceipt => {
                if state.offer_accepted_today {
                    state.basic_store += state.offer.volume;
                    ledger.received = state.offer.volume;
                }
            }
            Step::Demand => {
                let spread = config.demand.noise_spread;
                let noise = self.demand_noise.uniform(-spread, spread) as f64;
                ledger.demand = (config.demand.baseline(state.retail_price) + noise).max(0.0);
            }
            Step::Sales => {
                ledger.sold = state.shop_store.min(ledger.demand);
                state.shop_store -= ledger.sold;
                ledger.lost = ledger.demand - ledger.sold;
            }
            Step::Income => {
                ledger.income = ledger.sold * state.retail_price;
                state.account += ledger.income;
            }
            Step::FixedExpenses => {
                ledger.expenses = config.expenses.total();
                state.account -= ledger.expenses;
            }
            Step::DebtAmortization => {
                ledger.installment = amortize(state);
            }
            Step::SolvencyCheck => {
                ledger.insolvent = state.is_insolvent();
                if ledger.insolvent {
                    log::warn!("day {}: account negative at {:.2}", state.day, state.account);
                }
            }
        }
    }

    /// Draw the upcoming day's lot ahead of the decision so the operator can
    /// see it. `advance` won't draw it again. Returns whether a lot was drawn.
    pub fn open_day(&mut self, state: &mut SimulationState) -> bool {
        if state.day >= self.config.horizon_days {
            return false;
        }
        self.refresh_offer(state, state.day + 1)
    }

    fn refresh_offer(&mut self, state: &mut SimulationState, day: u32) -> bool {
        if !self.config.offers.refreshes_on(day) || state.offer_drawn_on == day {
            return false;
        }
        state.offer = self.draw_offer();
        state.offer_drawn_on = day;
        log::debug!(
            "day {}: new lot {} units @ {}",
            day,
            state.offer.volume,
            state.offer.unit_price
        );
        true
    }

    fn draw_offer(&mut self) -> Offer {
        let terms = &self.config.offers;
        let volume = terms
            .volume
            .resolve(self.offer_noise.uniform(-terms.volume.spread, terms.volume.spread));
        let unit_price = terms.unit_price.resolve(
            self.offer_noise
                .uniform(-terms.unit_price.spread, terms.unit_price.spread),
        );
        Offer {
            volume: volume as f64,
            unit_price: unit_price as f64,
        }
    }
}

/// Pay for the current lot. Only called with no debt open.
fn finance_offer(state: &mut SimulationState, financing: Financing) -> OfferOutcome {
    let total = state.offer.total();
    if total <= 0.0 {
        // nothing to finance
        state.offer_accepted_today = true;
        return OfferOutcome::PaidInFull { total: 0.0 };
    }
    match financing {
        Financing::Immediate => {
            if state.account >= total {
                state.account -= total;
                state.offer_accepted_today = true;
                OfferOutcome::PaidInFull { total }
            } else {
                log::warn!(
                    "day {}: lot declined, {:.2} needed but {:.2} available",
                    state.day,
                    total,
                    state.account
                );
                OfferOutcome::DeclinedInsufficientFunds {
                    total,
                    available: state.account,
                }
            }
        }
        Financing::Installments3 | Financing::Installments6 => {
            // the first installment is taken even if it overdraws the account
            let debt = Debt::after_first_payment(total, financing.installments());
            state.account -= debt.installment_amount;
            state.debt = debt;
            state.offer_accepted_today = true;
            OfferOutcome::Financed {
                total,
                first_payment: debt.installment_amount,
                outstanding: debt.outstanding,
                installments_remaining: debt.installments_remaining,
            }
        }
    }
}

/// Attempt today's installment. Shortfalls are deferred, never forced.
fn amortize(state: &mut SimulationState) -> InstallmentOutcome {
    let debt = state.debt;
    if debt.outstanding <= 0.0 {
        // nothing owed: close any plan left open
        state.debt = Debt::default();
        return InstallmentOutcome::NoDebt;
    }

    let due = if debt.installments_remaining > 1 {
        debt.installment_amount
    } else {
        debt.outstanding
    };
    if state.account < due {
        log::warn!(
            "day {}: installment of {:.2} deferred, account at {:.2}",
            state.day,
            due,
            state.account
        );
        return InstallmentOutcome::Deferred {
            due,
            available: state.account,
        };
    }

    state.account -= due;
    if debt.installments_remaining > 1 {
        state.debt.outstanding -= due;
        state.debt.installments_remaining -= 1;
        InstallmentOutcome::Paid {
            amount: due,
            outstanding: state.debt.outstanding,
            installments_remaining: state.debt.installments_remaining,
        }
    } else {
        state.debt = Debt::default();
        log::info!("day {}: lot paid off with {:.2}", state.day, due);
        InstallmentOutcome::Settled { amount: due }
    }
}
