//! TradeRecord — a completed round trip, entry to exit.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: Decimal,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: Decimal,

    pub quantity: Decimal,

    // ── PnL ──
    pub gross_pnl: Decimal,
    /// Entry plus exit commission.
    pub commission: Decimal,
    pub net_pnl: Decimal,

    pub bars_held: usize,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > Decimal::ZERO
    }
}
