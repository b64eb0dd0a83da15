//! Strategy trait — the decision step of the event loop.
//!
//! A strategy sees indicator readings and a single position flag, nothing
//! else. It cannot reach the broker, the ledger or future bars, and it keeps
//! no state between calls, so identical inputs always give identical actions.

pub mod ma_crossover;

pub use ma_crossover::{crossover_decision, MaCrossover};

use serde::{Deserialize, Serialize};

use crate::indicators::ReadyState;

/// What the strategy wants the broker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    /// Close the entire position.
    Sell,
    Hold,
}

pub trait Strategy: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Moving-average periods this strategy reads. The simulator checks the
    /// indicator engine covers all of them before a run starts.
    fn required_periods(&self) -> Vec<usize>;

    fn decide(&self, ready: &ReadyState<'_>, has_position: bool) -> Action;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn required_periods(&self) -> Vec<usize> {
        (**self).required_periods()
    }

    fn decide(&self, ready: &ReadyState<'_>, has_position: bool) -> Action {
        (**self).decide(ready, has_position)
    }
}
