use crate::{
    indicators::SimpleMovingAverage,
    patterns::{Cross, crossover},
};
use rust_decimal::Decimal;

/// Tracks a fast/slow SMA pair and reports a [`Cross`] on the update where the two cross,
/// ready for a momentum-style plug-in's `OnMarketData` hook to turn into a [`Signal`].
///
/// [`Signal`]: meridian_strategy::signal::Signal
#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    fast: SimpleMovingAverage,
    slow: SimpleMovingAverage,
    prev_fast: Option<Decimal>,
    prev_slow: Option<Decimal>,
}

impl MovingAverageCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast: SimpleMovingAverage::new(fast_period),
            slow: SimpleMovingAverage::new(slow_period),
            prev_fast: None,
            prev_slow: None,
        }
    }

    /// Feed one price, returning a [`Cross`] if this update crossed the two averages.
    pub fn update(&mut self, price: Decimal) -> Option<Cross> {
        let fast = self.fast.update(price);
        let slow = self.slow.update(price);

        let result = match (self.prev_fast, self.prev_slow) {
            (Some(prev_fast), Some(prev_slow)) => crossover(prev_fast, prev_slow, fast, slow),
            _ => None,
        };

        self.prev_fast = Some(fast);
        self.prev_slow = Some(slow);
        result
    }
}
