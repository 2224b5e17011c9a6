//! Terminal collaborators for a played run: the day report and the operator prompts.

use std::io::{BufRead, Write};
use std::str::FromStr;

use shopsim_logic::config::PriceRange;
use shopsim_logic::driver::{DecisionSource, Observer, RunReport};
use shopsim_logic::prelude::*;

// ── Report ──────────────────────────────────────────────────────────────

/// Prints the shop's position before each day and what happened after it.
pub struct ConsoleObserver<W: Write> {
    out: W,
    horizon: u32,
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W, horizon: u32) -> Self {
        Self { out, horizon }
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(%err, "console write failed");
        }
    }
}

impl<W: Write> Observer for ConsoleObserver<W> {
    fn on_day_start(&mut self, state: &SimulationState) {
        let text = position_report(state, self.horizon);
        self.emit(&text);
    }

    fn on_day_end(&mut self, summary: &DaySummary) {
        let text = day_report(summary);
        self.emit(&text);
    }

    fn on_finish(&mut self, report: &RunReport) {
        let text = final_report(report);
        self.emit(&text);
    }
}

fn position_report(state: &SimulationState, horizon: u32) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "\n==================== Day {} of {} ====================\n",
        state.day + 1,
        horizon
    ));
    s.push_str(&format!("Account:        {:>12.2}\n", state.account));
    s.push_str(&format!("Basic store:    {:>12.0} units\n", state.basic_store));
    s.push_str(&format!("Shop:           {:>12.0} units\n", state.shop_store));
    s.push_str(&format!("Retail price:   {:>12.2}\n", state.retail_price));
    if state.offer_drawn_on > 0 {
        let fresh = if state.offer_drawn_on == state.day + 1 {
            " (new today)"
        } else {
            ""
        };
        s.push_str(&format!(
            "Wholesale lot:  {:>12.0} units @ {:.2} = {:.2}{}\n",
            state.offer.volume,
            state.offer.unit_price,
            state.offer.total(),
            fresh
        ));
    }
    if state.debt.is_open() {
        s.push_str(&format!(
            "Debt:           {:>12.2} outstanding, {} installment(s) of {:.2} left\n",
            state.debt.outstanding, state.debt.installments_remaining, state.debt.installment_amount
        ));
    }
    s
}

fn day_report(summary: &DaySummary) -> String {
    let mut s = String::new();
    s.push_str(&format!("-- day {} --\n", summary.day));
    if summary.transferred > 0.0 {
        s.push_str(&format!("Moved {:.0} units to the shop\n", summary.transferred));
    }
    match summary.offer_outcome {
        OfferOutcome::NotRequested => {}
        OfferOutcome::PaidInFull { total } => {
            s.push_str(&format!(
                "Lot received: {:.0} units, paid {:.2} in full\n",
                summary.received, total
            ));
        }
        OfferOutcome::Financed {
            first_payment,
            outstanding,
            installments_remaining,
            ..
        } => {
            s.push_str(&format!(
                "Lot received: {:.0} units, first payment {:.2}, {:.2} over {} more installment(s)\n",
                summary.received, first_payment, outstanding, installments_remaining
            ));
        }
        OfferOutcome::DeclinedInsufficientFunds { total, available } => {
            s.push_str(&format!(
                "Lot declined: costs {:.2}, only {:.2} on account\n",
                total, available
            ));
        }
        OfferOutcome::DeclinedDebtOutstanding { outstanding } => {
            s.push_str(&format!(
                "Lot declined: {:.2} still owed on the previous lot\n",
                outstanding
            ));
        }
    }
    s.push_str(&format!(
        "Demand {:.0} at {:.2}: sold {:.0}, lost {:.0}, income {:.2}\n",
        summary.demand, summary.state.retail_price, summary.sold, summary.lost, summary.income
    ));
    s.push_str(&format!("Fixed expenses: {:.2}\n", summary.expenses));
    match summary.installment {
        InstallmentOutcome::NoDebt => {}
        InstallmentOutcome::Paid {
            amount,
            outstanding,
            installments_remaining,
        } => {
            s.push_str(&format!(
                "Installment paid: {:.2} ({:.2} left over {} installment(s))\n",
                amount, outstanding, installments_remaining
            ));
        }
        InstallmentOutcome::Settled { amount } => {
            s.push_str(&format!("Final installment paid: {:.2}, debt settled\n", amount));
        }
        InstallmentOutcome::Deferred { due, available } => {
            s.push_str(&format!(
                "Installment of {:.2} deferred, only {:.2} on account\n",
                due, available
            ));
        }
    }
    if summary.insolvent {
        s.push_str(&format!(
            "!! Account is negative: {:.2}\n",
            summary.state.account
        ));
    }
    s
}

fn final_report(report: &RunReport) -> String {
    let mut s = String::new();
    s.push_str("\n==================== Final report ====================\n");
    s.push_str(&format!("Days simulated:   {}\n", report.days));
    s.push_str(&format!("Account:          {:.2}\n", report.final_account));
    s.push_str(&format!("Basic store:      {:.0} units\n", report.basic_store));
    s.push_str(&format!("Shop:             {:.0} units\n", report.shop_store));
    s.push_str(&format!("Outstanding debt: {:.2}\n", report.outstanding_debt));
    s.push_str(&format!("Total income:     {:.2}\n", report.total_income));
    s.push_str(&format!(
        "Units sold:       {:.0} ({:.0} lost, fill rate {:.1}%)\n",
        report.total_sold,
        report.total_lost,
        report.fill_rate() * 100.0
    ));
    s.push_str(&format!(
        "Lots received:    {} ({} declined)\n",
        report.lots_received, report.lots_declined
    ));
    s.push_str(&format!(
        "Deferred installments: {}, days in the red: {}\n",
        report.installments_deferred, report.days_insolvent
    ));
    s
}

// ── Prompts ─────────────────────────────────────────────────────────────

/// Asks the operator for each day's decision, re-prompting on bad input.
///
/// Once input runs out every remaining day holds.
pub struct StdinDecisions<R: BufRead, W: Write> {
    input: R,
    output: W,
    pricing: PriceRange,
    closed: bool,
}

impl<R: BufRead, W: Write> StdinDecisions<R, W> {
    pub fn new(input: R, output: W, pricing: PriceRange) -> Self {
        Self {
            input,
            output,
            pricing,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn say(&mut self, text: &str) {
        if let Err(err) = self.output.write_all(text.as_bytes()).and_then(|_| self.output.flush()) {
            tracing::warn!(%err, "prompt write failed");
        }
    }

    /// Read until a line parses and passes `valid`. `None` at end of input.
    fn ask<T: FromStr>(&mut self, prompt: &str, valid: impl Fn(&T) -> bool) -> Option<T> {
        loop {
            self.say(prompt);
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    self.closed = true;
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%err, "could not read operator input");
                    self.closed = true;
                    return None;
                }
            }
            match line.trim().parse::<T>() {
                Ok(value) if valid(&value) => return Some(value),
                _ => self.say("  not a valid answer, try again\n"),
            }
        }
    }

    fn prompt(&mut self, state: &SimulationState) -> Option<OperatorDecision> {
        let mut decision = OperatorDecision::hold(state);

        let transfer = self.ask::<f64>(
            &format!(
                "Units to move to the shop (0-{:.0}): ",
                state.basic_store
            ),
            |v| v.is_finite() && *v >= 0.0,
        )?;
        decision = decision.transfer(transfer);

        let accept = self.ask::<u32>("Accept the wholesale lot? (1 = yes, 0 = no): ", |v| {
            *v <= 1
        })?;
        if accept == 1 {
            if state.debt.is_open() {
                self.say("  a previous lot is still being paid off, it will be declined\n");
                decision = decision.accept(Financing::Immediate);
            } else {
                let code = self.ask::<u32>(
                    "Pay in 1, 3 or 6 installments? ",
                    |v| matches!(*v, 1 | 3 | 6),
                )?;
                decision = decision.accept(Financing::from_code(code));
            }
        }

        let (min, max) = (self.pricing.min, self.pricing.max);
        let price = self.ask::<f64>(
            &format!("Retail price ({min:.2}-{max:.2}): "),
            |v| v.is_finite(),
        )?;
        Some(decision.price(price))
    }
}

impl<R: BufRead, W: Write> DecisionSource for StdinDecisions<R, W> {
    fn next_decision(&mut self, state: &SimulationState) -> OperatorDecision {
        if self.closed {
            return OperatorDecision::hold(state);
        }
        match self.prompt(state) {
            Some(decision) => decision,
            None => {
                tracing::warn!(day = state.day + 1, "input closed, holding for the rest of the run");
                OperatorDecision::hold(state)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn state() -> SimulationState {
        let mut s = SimulationState::new(&SimConfig::default());
        s.offer = Offer {
            volume: 45.0,
            unit_price: 35.0,
        };
        s.offer_drawn_on = 1;
        s
    }

    fn prompter(input: &str) -> StdinDecisions<Cursor<Vec<u8>>, Vec<u8>> {
        StdinDecisions::new(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            PriceRange::default(),
        )
    }

    #[test]
    fn test_full_answer() {
        let mut source = prompter("50\n1\n3\n20\n");
        let d = source.next_decision(&state());
        assert_eq!(d.transfer_volume, 50.0);
        assert!(d.accept_offer);
        assert_eq!(d.financing, Financing::Installments3);
        assert_eq!(d.retail_price, 20.0);
        assert!(!source.is_closed());
    }

    #[test]
    fn test_bad_input_reprompts() {
        let mut source = prompter("lots\n-5\n10\n2\n0\nabc\n25\n");
        let d = source.next_decision(&state());
        assert_eq!(d.transfer_volume, 10.0);
        assert!(!d.accept_offer);
        assert_eq!(d.retail_price, 25.0);
        let shown = String::from_utf8(source.output.clone()).unwrap();
        assert_eq!(shown.matches("try again").count(), 4);
    }

    #[test]
    fn test_financing_code_must_be_listed() {
        let mut source = prompter("0\n1\n4\n6\n15\n");
        let d = source.next_decision(&state());
        assert_eq!(d.financing, Financing::Installments6);
    }

    #[test]
    fn test_no_financing_prompt_with_open_debt() {
        let mut s = state();
        s.debt = Debt::after_first_payment(1575.0, 3);
        let mut source = prompter("0\n1\n15\n");
        let d = source.next_decision(&s);
        assert!(d.accept_offer);
        assert_eq!(d.retail_price, 15.0);
    }

    #[test]
    fn test_end_of_input_holds() {
        let s = state();
        let mut source = prompter("30\n");
        assert_eq!(source.next_decision(&s), OperatorDecision::hold(&s));
        assert!(source.is_closed());
        assert_eq!(source.next_decision(&s), OperatorDecision::hold(&s));
    }

    #[test]
    fn test_position_report_shows_lot_and_debt() {
        let mut s = state();
        s.debt = Debt::after_first_payment(1575.0, 3);
        let text = position_report(&s, 100);
        assert!(text.contains("Day 1 of 100"));
        assert!(text.contains("45 units @ 35.00 = 1575.00 (new today)"));
        assert!(text.contains("1050.00 outstanding, 2 installment(s) of 525.00 left"));
    }

    #[test]
    fn test_observer_writes_day_and_final_report() {
        let config = SimConfig {
            horizon_days: 2,
            ..SimConfig::default()
        };
        let mut engine =
            DayEngine::new(config.clone(), ScriptedNoise::silent(), ScriptedNoise::silent())
                .unwrap();
        let mut state = SimulationState::new(&config);
        let mut observer = ConsoleObserver::new(Vec::new(), config.horizon_days);
        let mut source = |s: &SimulationState| OperatorDecision::hold(s).transfer(50.0);
        run(&mut engine, &mut state, &mut source, &mut observer).unwrap();

        let text = String::from_utf8(observer.out).unwrap();
        assert!(text.contains("Day 2 of 2"));
        assert!(text.contains("Moved 50 units to the shop"));
        assert!(text.contains("Fixed expenses: 1400.00"));
        assert!(text.contains("Final report"));
        assert!(text.contains("Days simulated:   2"));
    }

    #[test]
    fn test_day_report_flags_insolvency() {
        let mut engine = DayEngine::new(
            SimConfig::default(),
            ScriptedNoise::silent(),
            ScriptedNoise::silent(),
        )
        .unwrap();
        let mut s = SimulationState::new(engine.config());
        s.account = -150.0;
        s.shop_store = 0.0;
        let hold = OperatorDecision::hold(&s);
        let summary = engine.advance(&mut s, &hold).unwrap();
        assert!(day_report(&summary).contains("!! Account is negative: -1550.00"));
    }
}
