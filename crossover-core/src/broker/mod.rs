//! Broker — executes actions against the ledger and marks equity each bar.
//!
//! Fill model: market orders only, whole-unit quantities, a flat commission
//! rate on the notional of every fill (entry and exit), charged on top of
//! price. Buys spend all available cash net of commission.

pub mod ledger;

pub use ledger::Ledger;

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{validate_cash, validate_commission, FillTiming};
use crate::domain::{Bar, EquityPoint, Fill, Position, Side, TradeRecord};
use crate::error::{BrokerError, ConfigError};
use crate::strategy::Action;

/// Outcome of `Broker::execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    Filled(Fill),
    NoTrade,
}

#[derive(Debug, Clone)]
pub struct Broker {
    ledger: Ledger,
    fill_timing: FillTiming,
    equity_curve: Vec<EquityPoint>,
    fills: Vec<Fill>,
    trades: Vec<TradeRecord>,
}

impl Broker {
    pub fn new(
        initial_cash: Decimal,
        commission_rate: Decimal,
        fill_timing: FillTiming,
    ) -> Result<Self, ConfigError> {
        validate_cash(initial_cash)?;
        validate_commission(commission_rate)?;
        Ok(Self {
            ledger: Ledger::new(initial_cash, commission_rate),
            fill_timing,
            equity_curve: Vec::new(),
            fills: Vec::new(),
            trades: Vec::new(),
        })
    }

    /// Price a fill on `bar` executes at under the configured timing.
    pub fn fill_price(&self, bar: &Bar) -> Decimal {
        match self.fill_timing {
            FillTiming::NextBarOpen => bar.open,
            FillTiming::SameBarClose => bar.close,
        }
    }

    /// Execute `action` using `bar` for pricing. `bar_index` is recorded on
    /// the fill and on any completed round trip.
    pub fn execute(
        &mut self,
        action: Action,
        bar_index: usize,
        bar: &Bar,
    ) -> Result<Execution, BrokerError> {
        match action {
            Action::Hold => Ok(Execution::NoTrade),
            Action::Buy => self.buy(bar_index, bar).map(Execution::Filled),
            Action::Sell => self.sell(bar_index, bar).map(Execution::Filled),
        }
    }

    fn buy(&mut self, bar_index: usize, bar: &Bar) -> Result<Fill, BrokerError> {
        if self.ledger.has_position() {
            return Err(BrokerError::PositionAlreadyOpen);
        }

        let price = self.fill_price(bar);
        let cash = self.ledger.cash();
        let budget = cash * (Decimal::ONE - self.ledger.commission_rate());
        let quantity = (budget / price).floor();
        if quantity <= Decimal::ZERO {
            return Err(BrokerError::InsufficientFunds { cash, price });
        }

        let commission = self.ledger.commission_for(quantity * price);
        self.ledger.open(Position {
            quantity,
            avg_entry_price: price,
            entry_bar: bar_index,
            entry_time: bar.timestamp,
            entry_commission: commission,
        });

        let fill = Fill {
            bar_index,
            timestamp: bar.timestamp,
            side: Side::Buy,
            price,
            quantity,
            commission,
        };
        debug!(bar_index, %price, %quantity, %commission, cash = %self.ledger.cash(), "buy filled");
        self.fills.push(fill.clone());
        Ok(fill)
    }

    fn sell(&mut self, bar_index: usize, bar: &Bar) -> Result<Fill, BrokerError> {
        let price = self.fill_price(bar);
        let quantity = self.ledger.quantity();
        let commission = self.ledger.commission_for(quantity * price);
        let position = self
            .ledger
            .close(price, commission)
            .ok_or(BrokerError::NoPosition)?;

        let gross_pnl = position.unrealized_pnl(price);
        let round_trip_commission = position.entry_commission + commission;
        self.trades.push(TradeRecord {
            entry_bar: position.entry_bar,
            entry_time: position.entry_time,
            entry_price: position.avg_entry_price,
            exit_bar: bar_index,
            exit_time: bar.timestamp,
            exit_price: price,
            quantity: position.quantity,
            gross_pnl,
            commission: round_trip_commission,
            net_pnl: gross_pnl - round_trip_commission,
            bars_held: bar_index - position.entry_bar,
        });

        let fill = Fill {
            bar_index,
            timestamp: bar.timestamp,
            side: Side::Sell,
            price,
            quantity,
            commission,
        };
        debug!(bar_index, %price, %quantity, %commission, cash = %self.ledger.cash(), "sell filled");
        self.fills.push(fill.clone());
        Ok(fill)
    }

    /// Append one equity point valued at `bar.close`, trade or no trade.
    pub fn mark_to_market(&mut self, bar: &Bar) -> EquityPoint {
        let equity = self.ledger.equity(bar.close);
        debug_assert_eq!(
            equity,
            self.ledger.cash() + self.ledger.quantity() * bar.close,
            "equity identity violated at {}",
            bar.timestamp
        );
        let point = EquityPoint {
            timestamp: bar.timestamp,
            equity,
        };
        self.equity_curve.push(point.clone());
        point
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn has_position(&self) -> bool {
        self.ledger.has_position()
    }

    pub fn fill_timing(&self) -> FillTiming {
        self.fill_timing
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Consume the broker, handing back its recorded history.
    pub fn into_history(self) -> (Ledger, Vec<EquityPoint>, Vec<Fill>, Vec<TradeRecord>) {
        (self.ledger, self.equity_curve, self.fills, self.trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(day: u32, open: Decimal, close: Decimal) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open,
            high: open.max(close) + dec!(1),
            low: open.min(close) - dec!(1),
            close,
            volume: 1_000,
        }
    }

    fn broker(cash: Decimal, rate: Decimal) -> Broker {
        Broker::new(cash, rate, FillTiming::NextBarOpen).unwrap()
    }

    #[test]
    fn buy_quantity_and_leftover_cash_are_exact() {
        let mut broker = broker(dec!(10000), dec!(0.01));
        let fill = match broker.execute(Action::Buy, 1, &bar(3, dec!(100), dec!(101))).unwrap() {
            Execution::Filled(fill) => fill,
            Execution::NoTrade => panic!("expected a fill"),
        };

        // floor(10000 × 0.99 / 100) = 99
        assert_eq!(fill.quantity, dec!(99));
        assert_eq!(fill.price, dec!(100));
        assert_eq!(fill.commission, dec!(99));
        // 10000 − 99 × 100 × 1.01 = 1
        assert_eq!(broker.ledger().cash(), dec!(10000) - dec!(99) * dec!(100) * dec!(1.01));
        assert_eq!(broker.ledger().cash(), dec!(1));
    }

    #[test]
    fn same_bar_close_prices_at_close() {
        let mut broker = Broker::new(dec!(1000), dec!(0), FillTiming::SameBarClose).unwrap();
        broker.execute(Action::Buy, 0, &bar(2, dec!(90), dec!(100))).unwrap();
        assert_eq!(broker.fills()[0].price, dec!(100));
        assert_eq!(broker.ledger().quantity(), dec!(10));
    }

    #[test]
    fn insufficient_funds_leaves_ledger_untouched() {
        let mut broker = broker(dec!(50), dec!(0));
        let err = broker.execute(Action::Buy, 0, &bar(2, dec!(100), dec!(100))).unwrap_err();
        assert_eq!(
            err,
            BrokerError::InsufficientFunds {
                cash: dec!(50),
                price: dec!(100)
            }
        );
        assert_eq!(broker.ledger().cash(), dec!(50));
        assert!(!broker.has_position());
        assert!(broker.fills().is_empty());
    }

    #[test]
    fn commission_can_make_a_single_unit_unaffordable() {
        // 100 × 0.99 / 100 = 0.99 → floor 0
        let mut broker = broker(dec!(100), dec!(0.01));
        let err = broker.execute(Action::Buy, 0, &bar(2, dec!(100), dec!(100))).unwrap_err();
        assert!(matches!(err, BrokerError::InsufficientFunds { .. }));
    }

    #[test]
    fn sell_closes_whole_position_and_records_trade() {
        let mut broker = broker(dec!(10000), dec!(0.01));
        broker.execute(Action::Buy, 1, &bar(3, dec!(100), dec!(100))).unwrap();
        broker.execute(Action::Sell, 5, &bar(9, dec!(110), dec!(112))).unwrap();

        assert!(!broker.has_position());
        // 1 + 99 × 110 × 0.99
        assert_eq!(broker.ledger().cash(), dec!(10782.1));
        assert_eq!(broker.ledger().total_commission(), dec!(207.9));

        let trade = &broker.trades()[0];
        assert_eq!(trade.quantity, dec!(99));
        assert_eq!(trade.gross_pnl, dec!(990));
        assert_eq!(trade.commission, dec!(207.9));
        assert_eq!(trade.net_pnl, dec!(782.1));
        assert_eq!(trade.bars_held, 4);
        assert_eq!(broker.fills().len(), 2);
    }

    #[test]
    fn buy_while_holding_rejected() {
        let mut broker = broker(dec!(10000), dec!(0));
        broker.execute(Action::Buy, 0, &bar(2, dec!(100), dec!(100))).unwrap();
        assert_eq!(
            broker.execute(Action::Buy, 1, &bar(3, dec!(100), dec!(100))),
            Err(BrokerError::PositionAlreadyOpen)
        );
    }

    #[test]
    fn sell_while_flat_rejected() {
        let mut broker = broker(dec!(10000), dec!(0));
        assert_eq!(
            broker.execute(Action::Sell, 0, &bar(2, dec!(100), dec!(100))),
            Err(BrokerError::NoPosition)
        );
    }

    #[test]
    fn hold_is_no_trade() {
        let mut broker = broker(dec!(10000), dec!(0));
        assert_eq!(
            broker.execute(Action::Hold, 0, &bar(2, dec!(100), dec!(100))),
            Ok(Execution::NoTrade)
        );
    }

    #[test]
    fn mark_to_market_appends_every_call() {
        let mut broker = broker(dec!(1000), dec!(0));
        broker.mark_to_market(&bar(2, dec!(10), dec!(10)));
        broker.execute(Action::Buy, 1, &bar(3, dec!(10), dec!(12))).unwrap();
        let point = broker.mark_to_market(&bar(3, dec!(10), dec!(12)));

        assert_eq!(broker.equity_curve().len(), 2);
        assert_eq!(broker.equity_curve()[0].equity, dec!(1000));
        // 100 units bought at 10, marked at 12
        assert_eq!(point.equity, dec!(1200));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(Broker::new(dec!(0), dec!(0), FillTiming::NextBarOpen).is_err());
        assert!(Broker::new(dec!(100), dec!(-0.1), FillTiming::NextBarOpen).is_err());
    }
}
