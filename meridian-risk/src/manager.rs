use crate::{
    alert::{RiskAlertHook, RiskViolation},
    correlation::CorrelationMatrix,
    drawdown::DrawdownTracker,
    exposure::ExposureTracker,
    limits::RiskLimits,
    policy::{PolicyCache, PolicyLoader},
    position_tracker::PositionTracker,
};
use async_trait::async_trait;
use chrono::Utc;
use meridian_account::{monitor::AccountEvent, snapshot::AccountSnapshot};
use meridian_execution::{
    order::{Side, request::PlaceOrderRequest},
    risk_gate::{RiskDecision, RiskGate},
};
use meridian_integration::rate_limit::RateLimiter;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::sync::broadcast;
use tracing::{error, warn};

/// §4.6: "Max orders per second (per strategy and global)". The wire model carries no strategy
/// identifier (one [`meridian_execution::engine::ExecutionEngine`] per strategy process), so
/// per-strategy and global collapse to a single bucket per [`RiskManager`] instance.
pub const DEFAULT_ORDER_RATE_CAPACITY: usize = 50;
pub const DEFAULT_ORDER_RATE_INTERVAL: Duration = Duration::from_secs(1);

/// Quote asset the "Min account balance floor" limit (§4.6) is measured against.
pub const QUOTE_ASSET: &str = "USDT";

#[derive(Debug, Default)]
struct Portfolio {
    exposure: ExposureTracker,
    positions: PositionTracker,
    correlation: CorrelationMatrix,
    drawdown: DrawdownTracker,
    /// Quote-asset (USDT) balance, checked against §4.6's "Min account balance floor".
    balance: Decimal,
}

/// `ACTIVE → EMERGENCY_STOPPED` (§4.6). While stopped, [`RiskManager::check_order`] denies every
/// request regardless of policy; only an explicit [`RiskManager::resume`] clears it.
pub struct RiskManager<Loader> {
    policy: PolicyCache<Loader>,
    order_rate: RateLimiter,
    portfolio: RwLock<Portfolio>,
    stopped: AtomicBool,
}

impl<Loader> RiskManager<Loader>
where
    Loader: PolicyLoader,
{
    pub fn new(loader: Loader, policy_ttl: Duration) -> Self {
        Self {
            policy: PolicyCache::new(loader, policy_ttl),
            order_rate: RateLimiter::new(DEFAULT_ORDER_RATE_CAPACITY, DEFAULT_ORDER_RATE_INTERVAL),
            portfolio: RwLock::new(Portfolio::default()),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn with_order_rate(mut self, capacity: usize, interval: Duration) -> Self {
        self.order_rate = RateLimiter::new(capacity, interval);
        self
    }

    pub fn set_correlation_limit(&self, a: meridian_instrument::Symbol, b: meridian_instrument::Symbol, limit: Decimal) {
        self.portfolio.write().correlation.set_limit(a, b, limit);
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Current [`RiskLimits`] as served by the policy cache, for callers running their own
    /// periodic [`Self::evaluate_portfolio_limits`] sweep (§4.6 "portfolio-level limit checks run
    /// ... independently").
    pub async fn policy(&self) -> Result<RiskLimits, crate::error::RiskError> {
        self.policy.get().await
    }

    /// §4.6 `EmergencyStop(reason)`.
    pub fn emergency_stop(&self, reason: impl AsRef<str>) {
        warn!(reason = reason.as_ref(), "risk manager entering EMERGENCY_STOPPED");
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// §4.6 `Resume()` — "operator can Resume after manual clearance".
    pub fn resume(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }

    /// §4.6 `OnAccountUpdate(snapshot)` — "updates cached exposures".
    pub fn on_account_update(&self, snapshot: &AccountSnapshot) {
        let mut portfolio = self.portfolio.write();
        let mut equity = Decimal::ZERO;
        for balance in &snapshot.balances {
            equity += balance.total;
            if balance.asset == QUOTE_ASSET {
                portfolio.balance = balance.total;
            }
        }
        for position in &snapshot.positions {
            let signed = position.signed_size();
            portfolio.positions.set(position.symbol.clone(), signed);
            portfolio.exposure.update(position.symbol.clone(), signed.abs() * position.entry_price);
            equity += position.unrealized_pnl + position.realized_pnl;
        }
        portfolio.drawdown.update_equity(equity, Utc::now());
    }

    /// §4.6 portfolio-level limit sweep: exposure, correlation, drawdown, and daily-loss limits,
    /// run independently of the per-order `CheckOrder` gate (e.g. on a timer or after every
    /// [`Self::on_account_update`]).
    pub fn evaluate_portfolio_limits(&self, limits: &RiskLimits, hook: &impl RiskAlertHook) {
        let portfolio = self.portfolio.read();
        if let Some(portfolio_limits) = limits.portfolio {
            portfolio.drawdown.check_drawdown_limit(portfolio_limits.max_drawdown_from_peak, hook);
            portfolio.drawdown.check_daily_loss_limit(portfolio_limits.max_daily_realized_loss, hook);
            if portfolio.balance < portfolio_limits.min_account_balance {
                hook.alert(RiskViolation::BalanceFloor {
                    balance: portfolio.balance,
                    floor: portfolio_limits.min_account_balance,
                });
            }
        }
        for (symbol, limit_set) in &limits.per_symbol {
            portfolio.exposure.check_limit(symbol.clone(), limit_set.max_position_notional, hook);
        }
    }

    /// Consume [`AccountEvent`]s and translate a critical reconciliation mismatch into an
    /// unconditional emergency stop (§4.5/§4.6, §13: "Breaching it always calls
    /// `RiskManager::emergency_stop`").
    pub async fn run(&self, mut account_events: broadcast::Receiver<AccountEvent>) {
        loop {
            match account_events.recv().await {
                Ok(AccountEvent::CriticalMismatch { symbol, diff }) => {
                    self.emergency_stop(format!("critical reconciliation mismatch on {symbol}: {diff}"));
                }
                Ok(AccountEvent::PositionUpdate(position)) => {
                    self.portfolio.write().positions.set(position.symbol.clone(), position.signed_size());
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    error!(skipped, "account event stream lagged; risk manager missed updates");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }
}

#[async_trait]
impl<Loader> RiskGate for RiskManager<Loader>
where
    Loader: PolicyLoader,
{
    /// §4.6 `CheckOrder(req)`, synchronous and deadline-bounded by the caller (§4.3 validation
    /// rule 3 wraps this in a timeout and treats it as deny on expiry).
    async fn check_order(&self, request: &PlaceOrderRequest) -> RiskDecision {
        if self.is_emergency_stopped() {
            return RiskDecision::Deny {
                reason: "risk manager is emergency-stopped".to_string(),
                policy_id: "emergency_stop".to_string(),
            };
        }

        let limits = match self.policy.get().await {
            Ok(limits) => limits,
            Err(error) => {
                return RiskDecision::Deny {
                    reason: error.to_string(),
                    policy_id: "policy_unavailable".to_string(),
                };
            }
        };

        if !limits.is_allowed(&request.symbol) {
            return RiskDecision::Deny {
                reason: format!("{} is not in the allowed-symbols whitelist", request.symbol),
                policy_id: "allowed_symbols".to_string(),
            };
        }

        let Some(limit_set) = limits.limits_for(&request.symbol) else {
            return RiskDecision::Deny {
                reason: format!("no risk limits configured for {}", request.symbol),
                policy_id: "policy_unavailable".to_string(),
            };
        };

        if !self.order_rate.try_acquire().await {
            return RiskDecision::Deny {
                reason: "max orders per second exceeded".to_string(),
                policy_id: "max_orders_per_second".to_string(),
            };
        }

        if let Some(price) = request.price {
            let order_notional = price * request.quantity;
            if order_notional > limit_set.max_order_notional {
                return RiskDecision::Deny {
                    reason: format!("order notional {order_notional} exceeds limit {}", limit_set.max_order_notional),
                    policy_id: "max_order_notional".to_string(),
                };
            }
        }

        let current = self.portfolio.read().positions.position(&request.symbol);
        let delta = match request.side {
            Side::Buy => request.quantity,
            Side::Sell => -request.quantity,
        };
        let projected = current + delta;

        if projected.abs() > limit_set.max_position_quantity {
            return RiskDecision::Deny {
                reason: format!("projected position {} exceeds max quantity {}", projected.abs(), limit_set.max_position_quantity),
                policy_id: "max_position_quantity".to_string(),
            };
        }

        if let Some(price) = request.price {
            let projected_notional = projected.abs() * price;
            if projected_notional > limit_set.max_position_notional {
                return RiskDecision::Deny {
                    reason: format!("projected notional {projected_notional} exceeds limit {}", limit_set.max_position_notional),
                    policy_id: "max_position_notional".to_string(),
                };
            }
        }

        if let Some(portfolio_limits) = limits.portfolio {
            let portfolio = self.portfolio.read();
            if portfolio.drawdown.drawdown() > portfolio_limits.max_drawdown_from_peak {
                return RiskDecision::Deny {
                    reason: "portfolio drawdown exceeds configured limit".to_string(),
                    policy_id: "max_drawdown".to_string(),
                };
            }
            if portfolio.drawdown.daily_realized_loss() > portfolio_limits.max_daily_realized_loss {
                return RiskDecision::Deny {
                    reason: "daily realized loss exceeds configured limit".to_string(),
                    policy_id: "max_daily_realized_loss".to_string(),
                };
            }
            if portfolio.balance < portfolio_limits.min_account_balance {
                return RiskDecision::Deny {
                    reason: format!("account balance {} is below the floor {}", portfolio.balance, portfolio_limits.min_account_balance),
                    policy_id: "min_account_balance".to_string(),
                };
            }
        }

        RiskDecision::Allow { policy_id: "ok".to_string() }
    }
}
