use meridian_ta::{
    indicators::{ExponentialMovingAverage, SimpleMovingAverage},
    patterns::{Cross, crossover},
    signals::MovingAverageCrossover,
};
use rust_decimal_macros::dec;

#[test]
fn sma_and_ema() {
    let mut sma = SimpleMovingAverage::new(3);
    assert_eq!(sma.update(dec!(1)), dec!(1));
    assert_eq!(sma.update(dec!(2)), dec!(1.5));
    assert_eq!(sma.update(dec!(3)), dec!(2));
    assert_eq!(sma.update(dec!(4)), dec!(3));

    let mut ema = ExponentialMovingAverage::new(3);
    assert_eq!(ema.update(dec!(1)), dec!(1));
    let v = ema.update(dec!(2));
    assert!(v > dec!(1));
}

#[test]
fn test_crossover_pattern() {
    let res = crossover(dec!(1), dec!(2), dec!(3), dec!(2));
    assert_eq!(res, Some(Cross::Above));
}

#[test]
fn moving_average_crossover_reports_both_directions() {
    let mut tracker = MovingAverageCrossover::new(1, 2);
    assert_eq!(tracker.update(dec!(1)), None);
    assert_eq!(tracker.update(dec!(1)), None);
    assert_eq!(tracker.update(dec!(5)), Some(Cross::Above));
    assert_eq!(tracker.update(dec!(5)), None);
    assert_eq!(tracker.update(dec!(0)), Some(Cross::Below));
}
