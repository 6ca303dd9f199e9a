use crate::signal::Signal;
use meridian_execution::order::{OrderKind, request::PlaceOrderRequest};
use meridian_risk::limits::LimitSet;
use rust_decimal::Decimal;

/// Turn an aggregated [`Signal`] into a [`PlaceOrderRequest`] (§4.4: "derived from signal
/// strength × per-strategy `max_position`, clamped by symbol-specific limits").
///
/// `last_price` prices the order when `signal.price_hint` is absent; required because market
/// orders are never used here — every strategy order rests at a price (§4.3 maker preference).
pub fn size_order(
    signal: &Signal,
    max_position: Decimal,
    limits: Option<&LimitSet>,
    last_price: Decimal,
) -> Option<PlaceOrderRequest> {
    let price = signal.price_hint.unwrap_or(last_price);
    if price <= Decimal::ZERO {
        return None;
    }

    let mut quantity = signal.strength * max_position;
    if let Some(limits) = limits {
        quantity = quantity.min(limits.max_position_quantity);
        quantity = quantity.min(limits.max_order_notional / price);
    }

    if quantity <= Decimal::ZERO {
        return None;
    }

    Some(PlaceOrderRequest::new(
        None,
        signal.symbol.clone(),
        signal.side,
        OrderKind::Limit,
        signal.urgency.to_time_in_force(),
        Some(price),
        quantity,
        signal.urgency.allow_post_only_retry(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Urgency;
    use chrono::Utc;
    use meridian_execution::order::Side;
    use meridian_instrument::Symbol;
    use rust_decimal_macros::dec;

    fn signal(strength: Decimal, price_hint: Option<Decimal>) -> Signal {
        Signal::new(
            "momentum".to_string(),
            Symbol::from("BTCUSDT"),
            Side::Buy,
            strength,
            price_hint,
            Urgency::Normal,
            "test".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn quantity_scales_with_strength_and_max_position() {
        let request = size_order(&signal(dec!(0.5), None), dec!(10), None, dec!(100)).unwrap();
        assert_eq!(request.quantity, dec!(5));
        assert_eq!(request.price, Some(dec!(100)));
    }

    #[test]
    fn price_hint_overrides_last_price() {
        let request = size_order(&signal(dec!(1), Some(dec!(42))), dec!(1), None, dec!(100)).unwrap();
        assert_eq!(request.price, Some(dec!(42)));
    }

    #[test]
    fn quantity_is_clamped_by_the_notional_limit() {
        let limits = LimitSet::new(dec!(100_000), dec!(100), dec!(200));
        let request = size_order(&signal(dec!(1), None), dec!(10), Some(&limits), dec!(100)).unwrap();
        assert_eq!(request.quantity, dec!(2));
    }

    #[test]
    fn zero_strength_produces_no_order() {
        assert!(size_order(&signal(dec!(0), None), dec!(10), None, dec!(100)).is_none());
    }
}
