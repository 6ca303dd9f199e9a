use crate::signal::Signal;
use meridian_execution::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configurable signal-aggregation policy (§4.4). Ties ("equal strength") always prefer the
/// earlier timestamp; a strict strength comparison always prefers the higher value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum AggregationPolicy {
    /// The strongest signal at or above `threshold`, or none if no signal clears it.
    FirstAboveThreshold { threshold: Decimal },
    /// The strongest signal on whichever side has the most votes; ties on vote count fall back
    /// to comparing the strongest signal on each side.
    MajorityVote,
    /// Net of `strength` signed by `side` across every signal, clamped to `[-1, 1]`.
    WeightedSum,
}

fn side_sign(side: Side) -> Decimal {
    match side {
        Side::Buy => Decimal::ONE,
        Side::Sell => -Decimal::ONE,
    }
}

/// `true` if `a` should be preferred over `b`: strictly higher strength, or equal strength with
/// an earlier timestamp.
fn beats(a: &Signal, b: &Signal) -> bool {
    match a.strength.cmp(&b.strength) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => a.ts < b.ts,
    }
}

fn strongest(signals: &[Signal]) -> Option<&Signal> {
    signals.iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) if beats(candidate, current) => Some(candidate),
        Some(current) => Some(current),
    })
}

impl AggregationPolicy {
    /// Reduce every plug-in's [`Signal`] for a single symbol down to at most one. Assumes every
    /// element of `signals` is for the same symbol; callers group by symbol before calling this.
    pub fn aggregate(&self, signals: &[Signal]) -> Option<Signal> {
        if signals.is_empty() {
            return None;
        }

        match self {
            Self::FirstAboveThreshold { threshold } => signals
                .iter()
                .filter(|s| s.strength >= *threshold)
                .fold(None, |best: Option<&Signal>, candidate| match best {
                    None => Some(candidate),
                    Some(current) if beats(candidate, current) => Some(candidate),
                    Some(current) => Some(current),
                })
                .cloned(),

            Self::MajorityVote => {
                let buys: Vec<&Signal> = signals.iter().filter(|s| s.side == Side::Buy).collect();
                let sells: Vec<&Signal> = signals.iter().filter(|s| s.side == Side::Sell).collect();

                match buys.len().cmp(&sells.len()) {
                    std::cmp::Ordering::Greater => strongest(&buys.into_iter().cloned().collect::<Vec<_>>()).cloned(),
                    std::cmp::Ordering::Less => strongest(&sells.into_iter().cloned().collect::<Vec<_>>()).cloned(),
                    std::cmp::Ordering::Equal => strongest(signals).cloned(),
                }
            }

            Self::WeightedSum => {
                let net: Decimal = signals.iter().map(|s| s.strength * side_sign(s.side)).sum();
                if net.is_zero() {
                    return None;
                }
                let side = if net.is_sign_positive() { Side::Buy } else { Side::Sell };
                let strength = net.abs().min(Decimal::ONE);
                let representative = signals.iter().max_by_key(|s| s.ts).expect("non-empty");

                Some(Signal::new(
                    "aggregate:weighted_sum".to_string(),
                    representative.symbol.clone(),
                    side,
                    strength,
                    None,
                    representative.urgency,
                    format!("weighted sum of {} signals", signals.len()),
                    representative.ts,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Urgency;
    use chrono::{Duration as ChronoDuration, Utc};
    use meridian_instrument::Symbol;
    use rust_decimal_macros::dec;

    fn signal(strategy: &str, side: Side, strength: Decimal, offset_secs: i64) -> Signal {
        Signal::new(
            strategy.to_string(),
            Symbol::from("BTCUSDT"),
            side,
            strength,
            None,
            Urgency::Normal,
            "test".to_string(),
            Utc::now() + ChronoDuration::seconds(offset_secs),
        )
    }

    #[test]
    fn first_above_threshold_picks_the_strongest_qualifying_signal() {
        let signals = vec![
            signal("a", Side::Buy, dec!(0.4), 0),
            signal("b", Side::Buy, dec!(0.9), 1),
            signal("c", Side::Buy, dec!(0.2), 2),
        ];
        let policy = AggregationPolicy::FirstAboveThreshold { threshold: dec!(0.5) };
        let result = policy.aggregate(&signals).unwrap();
        assert_eq!(result.strategy, "b");
    }

    #[test]
    fn equal_strength_prefers_the_earlier_timestamp() {
        let signals = vec![
            signal("later", Side::Buy, dec!(0.7), 5),
            signal("earlier", Side::Buy, dec!(0.7), 0),
        ];
        let policy = AggregationPolicy::FirstAboveThreshold { threshold: dec!(0) };
        let result = policy.aggregate(&signals).unwrap();
        assert_eq!(result.strategy, "earlier");
    }

    #[test]
    fn majority_vote_picks_the_side_with_more_signals() {
        let signals = vec![
            signal("a", Side::Buy, dec!(0.3), 0),
            signal("b", Side::Buy, dec!(0.6), 1),
            signal("c", Side::Sell, dec!(0.9), 2),
        ];
        let result = AggregationPolicy::MajorityVote.aggregate(&signals).unwrap();
        assert_eq!(result.side, Side::Buy);
        assert_eq!(result.strategy, "b");
    }

    #[test]
    fn weighted_sum_nets_opposing_signals() {
        let signals = vec![
            signal("a", Side::Buy, dec!(0.8), 0),
            signal("b", Side::Sell, dec!(0.3), 1),
        ];
        let result = AggregationPolicy::WeightedSum.aggregate(&signals).unwrap();
        assert_eq!(result.side, Side::Buy);
        assert_eq!(result.strength, dec!(0.5));
    }
}
