use crate::{error::AccountError, snapshot::AccountSnapshot};
use async_trait::async_trait;

/// Abstraction over the exchange's `GetAccount()` call (§4.1/§4.5), implemented once per venue.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn get_account(&self) -> Result<AccountSnapshot, AccountError>;
}
