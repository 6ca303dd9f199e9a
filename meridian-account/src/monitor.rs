use crate::{
    error::AccountError,
    position::Position,
    snapshot::AccountSnapshot,
    source::AccountSource,
};
use meridian_execution::{order::Side, trade::Fill};
use meridian_instrument::Symbol;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Default reconciliation cadence (§4.5: "every R seconds, default 5").
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(5);

/// Accelerated cadence while the user-data stream is down (§4.5).
pub const DEFAULT_ACCELERATED_INTERVAL: Duration = Duration::from_secs(1);

/// Stream outage duration past which the monitor enters degraded mode and hints at an
/// emergency stop (§4.5 "extended outage (> T) ⇒ degraded mode").
pub const DEFAULT_DEGRADED_THRESHOLD: Duration = Duration::from_secs(30);

/// Fraction of position size past which a reconciliation mismatch is `critical` rather than
/// routine (§4.5, §13: fixed default `0.05`).
pub const DEFAULT_CRITICAL_MISMATCH_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

#[derive(Debug, Clone)]
pub struct AccountMonitorConfig {
    pub reconcile_interval: Duration,
    pub accelerated_interval: Duration,
    pub degraded_threshold: Duration,
    pub critical_mismatch_threshold: Decimal,
}

impl Default for AccountMonitorConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            accelerated_interval: DEFAULT_ACCELERATED_INTERVAL,
            degraded_threshold: DEFAULT_DEGRADED_THRESHOLD,
            critical_mismatch_threshold: DEFAULT_CRITICAL_MISMATCH_THRESHOLD,
        }
    }
}

/// Events published by the Account Monitor (§4.5).
#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    BalanceUpdate(crate::balance::AssetBalance),
    PositionUpdate(Position),
    ReconciliationMismatch { symbol: Symbol, diff: Decimal },
    /// `|diff| / size > critical_mismatch_threshold`; the Risk Manager treats this as an
    /// emergency-stop trigger (§4.5/§4.6/§13).
    CriticalMismatch { symbol: Symbol, diff: Decimal },
    PnlUpdate { symbol: Symbol, realized: Decimal, unrealized: Decimal },
    /// Extended user-data stream outage; a hint, not itself an `EmergencyStop` call (§4.5).
    DegradedMode { outage: Duration },
}

/// Authoritative local balance/position view (§4.5). Seeds from `GetAccount()`, applies fills
/// incrementally, and periodically reconciles against the exchange, which is always the source
/// of truth on mismatch.
pub struct AccountMonitor<Source> {
    source: Source,
    config: AccountMonitorConfig,
    state: Arc<RwLock<AccountSnapshot>>,
    events_tx: broadcast::Sender<AccountEvent>,
}

impl<Source> AccountMonitor<Source>
where
    Source: AccountSource,
{
    const EVENT_CHANNEL_CAPACITY: usize = 1_024;

    pub async fn seed(source: Source, config: AccountMonitorConfig) -> Result<Self, AccountError> {
        let snapshot = source.get_account().await?;
        Ok(Self {
            source,
            config,
            state: Arc::new(RwLock::new(snapshot)),
            events_tx: broadcast::channel(Self::EVENT_CHANNEL_CAPACITY).0,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.events_tx.subscribe()
    }

    pub fn get_account_snapshot(&self) -> AccountSnapshot {
        self.state.read().clone()
    }

    pub fn get_balance(&self, asset: &str) -> Option<crate::balance::AssetBalance> {
        self.state.read().balance(asset).cloned()
    }

    pub fn get_position(&self, symbol: &Symbol) -> Option<Position> {
        self.state.read().position(symbol).cloned()
    }

    /// Apply an incoming fill (§4.5: "apply user-data stream updates incrementally"). `side` is
    /// the originating order's side, needed to resolve whether the fill grows or reduces the
    /// position (see [`Position::apply_fill`]).
    pub fn apply_fill(&self, fill: &Fill, side: Side) {
        let mut state = self.state.write();
        let position = match state.positions.iter_mut().find(|p| p.symbol == fill.symbol) {
            Some(position) => position,
            None => {
                state
                    .positions
                    .push(Position::flat(fill.symbol.clone(), Decimal::ONE));
                state.positions.last_mut().expect("just pushed")
            }
        };
        position.apply_fill(fill, side);
        let _ = self.events_tx.send(AccountEvent::PositionUpdate(position.clone()));
        let _ = self.events_tx.send(AccountEvent::PnlUpdate {
            symbol: position.symbol.clone(),
            realized: position.realized_pnl,
            unrealized: position.unrealized_pnl,
        });
    }

    /// Re-mark every open position against fresh mid prices.
    pub fn mark_to_market(&self, marks: &std::collections::HashMap<Symbol, Decimal>) {
        let mut state = self.state.write();
        for position in state.positions.iter_mut() {
            if let Some(mark) = marks.get(&position.symbol) {
                position.mark_to_market(*mark);
            }
        }
    }

    /// Query the exchange and reconcile (§4.5 algorithm). Exchange state always wins; mismatches
    /// beyond `critical_mismatch_threshold` of the prior local size are surfaced as
    /// [`AccountEvent::CriticalMismatch`].
    pub async fn reconcile(&self) -> Result<(), AccountError> {
        let exchange = self.source.get_account().await?;

        for balance in &exchange.balances {
            if !balance.is_consistent() {
                return Err(AccountError::Inconsistency(format!(
                    "{}: total {} != free {} + locked {}",
                    balance.asset, balance.total, balance.free, balance.locked
                )));
            }
        }

        let mut state = self.state.write();
        for exchange_position in &exchange.positions {
            let local_size = state
                .position(&exchange_position.symbol)
                .map(|p| p.signed_size())
                .unwrap_or(Decimal::ZERO);
            let exchange_size = exchange_position.signed_size();
            let diff = exchange_size - local_size;

            if !diff.is_zero() {
                let magnitude_base = exchange_position.size.max(local_size.abs());
                let is_critical = !magnitude_base.is_zero()
                    && (diff.abs() / magnitude_base) > self.config.critical_mismatch_threshold;

                if is_critical {
                    warn!(symbol = %exchange_position.symbol, %diff, "critical reconciliation mismatch");
                    let _ = self.events_tx.send(AccountEvent::CriticalMismatch {
                        symbol: exchange_position.symbol.clone(),
                        diff,
                    });
                } else {
                    info!(symbol = %exchange_position.symbol, %diff, "reconciliation mismatch");
                    let _ = self.events_tx.send(AccountEvent::ReconciliationMismatch {
                        symbol: exchange_position.symbol.clone(),
                        diff,
                    });
                }
            }
        }

        // Preserve locally-accumulated realized PnL; the exchange snapshot doesn't carry it.
        let mut reconciled_positions = exchange.positions;
        for position in reconciled_positions.iter_mut() {
            if let Some(local) = state.position(&position.symbol) {
                position.realized_pnl = local.realized_pnl;
            }
        }

        for balance in &exchange.balances {
            let _ = self.events_tx.send(AccountEvent::BalanceUpdate(balance.clone()));
        }

        state.balances = exchange.balances;
        state.positions = reconciled_positions;
        state.ts = exchange.ts;
        Ok(())
    }

    /// Run the periodic reconciliation loop until `outage` (a `watch` of whether the user-data
    /// stream is currently healthy) is dropped. Accelerates to `accelerated_interval` while
    /// unhealthy and emits [`AccountEvent::DegradedMode`] past `degraded_threshold` (§4.5
    /// failure semantics).
    pub async fn run(&self, mut stream_healthy: tokio::sync::watch::Receiver<bool>) {
        let mut since_unhealthy: Option<std::time::Instant> = None;

        loop {
            let healthy = *stream_healthy.borrow();
            let interval = if healthy {
                since_unhealthy = None;
                self.config.reconcile_interval
            } else {
                let since = *since_unhealthy.get_or_insert_with(std::time::Instant::now);
                let outage = since.elapsed();
                if outage > self.config.degraded_threshold {
                    let _ = self.events_tx.send(AccountEvent::DegradedMode { outage });
                }
                self.config.accelerated_interval
            };

            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(error) = self.reconcile().await {
                        error!(%error, "account reconciliation failed");
                    }
                }
                result = stream_healthy.changed() => {
                    if result.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
