//! Domain types for the crossover engine.

pub mod bar;
pub mod equity;
pub mod fill;
pub mod position;
pub mod trade;

pub use bar::{Bar, BarSeries};
pub use equity::EquityPoint;
pub use fill::{Fill, Side};
pub use position::Position;
pub use trade::TradeRecord;
