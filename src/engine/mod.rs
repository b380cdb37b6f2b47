//! Clock reconciliation.
//!
//! The displayed countdown is never stored. It is derived every time from
//! the committed baseline `(elapsed_seconds, last_action_at)` and the current
//! wall time, so missed ticks, backgrounded terminals and remote updates all
//! heal on the next derivation.

pub mod baseline;
pub mod error;
pub mod reconciler;

pub use baseline::{derive_remaining, BaselineKey, ClockPhase};
pub use error::{ClockError, Transition};
pub use reconciler::{ClockEngine, TickOutcome};
