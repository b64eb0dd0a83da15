use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Open long position. Flat is represented by the absence of a `Position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    /// Commission paid on the entry fill, carried into the round-trip record.
    pub entry_commission: Decimal,
}

impl Position {
    pub fn market_value(&self, price: Decimal) -> Decimal {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.quantity * (price - self.avg_entry_price)
    }
}
