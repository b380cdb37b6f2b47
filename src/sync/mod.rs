pub mod clock;
pub mod ticker;

pub use clock::{Clock, SystemClock};
pub use ticker::{Ticker, TickerStats};

#[cfg(test)]
pub use clock::ManualClock;
