use derive_more::{Display, From};
use rand::prelude::IndexedRandom;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Idempotency key for a [`super::Order`] (§3): unique per order, supplied by the caller or
/// generated with [`ClientOrderId::random`].
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct ClientOrderId(pub SmolStr);

impl ClientOrderId {
    pub fn new<S: Into<SmolStr>>(id: S) -> Self {
        Self(id.into())
    }

    /// Generate a random stack-allocated `ClientOrderId` for internally-originated orders
    /// (eg/ Simulation/Observation mode synthetic orders).
    pub fn random() -> Self {
        const URL_SAFE_SYMBOLS: [char; 64] = [
            '_', '-', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e',
            'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v',
            'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
            'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
        ];
        const LEN_NON_ALLOCATING_CID: usize = 23;

        let mut rng = rand::rng();
        let random_utf8: [u8; LEN_NON_ALLOCATING_CID] = std::array::from_fn(|_| {
            *URL_SAFE_SYMBOLS
                .choose(&mut rng)
                .expect("URL_SAFE_SYMBOLS is non-empty") as u8
        });
        let random_str =
            std::str::from_utf8(&random_utf8).expect("URL_SAFE_SYMBOLS are valid utf8");

        Self(SmolStr::new_inline(random_str))
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::random()
    }
}

/// Exchange-assigned order identifier, present once an order reaches `SUBMITTED`.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct ExchangeOrderId(pub SmolStr);

impl ExchangeOrderId {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self(SmolStr::new(id))
    }
}

/// Append-only fill identifier, unique per `(exchange_order_id, trade)` pair.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct FillId(pub SmolStr);

impl FillId {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self(SmolStr::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_client_order_ids_are_distinct() {
        assert_ne!(ClientOrderId::random(), ClientOrderId::random());
    }
}
