//! Cash and position book for a single long-only instrument.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Position;

/// Cash, the open position (if any) and the commission rate applied to fills.
///
/// Invariant: `cash >= 0`. Equity is `cash + quantity × mark price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    initial_cash: Decimal,
    cash: Decimal,
    position: Option<Position>,
    commission_rate: Decimal,
    total_commission: Decimal,
}

impl Ledger {
    pub(crate) fn new(initial_cash: Decimal, commission_rate: Decimal) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            position: None,
            commission_rate,
            total_commission: Decimal::ZERO,
        }
    }

    /// Commission on a fill of the given notional.
    pub fn commission_for(&self, notional: Decimal) -> Decimal {
        notional * self.commission_rate
    }

    /// Debit cost and commission, open the position.
    pub(crate) fn open(&mut self, position: Position) {
        let notional = position.quantity * position.avg_entry_price;
        self.cash -= notional + position.entry_commission;
        self.total_commission += position.entry_commission;
        self.position = Some(position);
        debug_assert!(self.cash >= Decimal::ZERO, "cash went negative: {}", self.cash);
    }

    /// Credit proceeds net of commission and clear the position.
    pub(crate) fn close(&mut self, price: Decimal, commission: Decimal) -> Option<Position> {
        let position = self.position.take()?;
        self.cash += position.quantity * price - commission;
        self.total_commission += commission;
        Some(position)
    }

    /// Mark-to-market equity at `price`.
    pub fn equity(&self, price: Decimal) -> Decimal {
        let position_value = self
            .position
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.market_value(price));
        self.cash + position_value
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn quantity(&self) -> Decimal {
        self.position.as_ref().map_or(Decimal::ZERO, |p| p.quantity)
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn initial_cash(&self) -> Decimal {
        self.initial_cash
    }

    pub fn commission_rate(&self) -> Decimal {
        self.commission_rate
    }

    pub fn total_commission(&self) -> Decimal {
        self.total_commission
    }
}
