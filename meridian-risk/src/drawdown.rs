use crate::alert::{RiskAlertHook, RiskViolation};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Tracks portfolio equity and realized loss to enforce the "max drawdown from peak equity" and
/// "max daily realized loss" limits (§4.6). Unlike the rest of this crate's trackers, drawdown is
/// a single portfolio-wide quantity rather than one kept per symbol.
#[derive(Debug, Clone)]
pub struct DrawdownTracker {
    peak_equity: Decimal,
    current_equity: Decimal,
    daily_realized_loss: Decimal,
    daily_reset_date: Option<NaiveDate>,
}

impl Default for DrawdownTracker {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

impl DrawdownTracker {
    pub fn new(starting_equity: Decimal) -> Self {
        Self {
            peak_equity: starting_equity,
            current_equity: starting_equity,
            daily_realized_loss: Decimal::ZERO,
            daily_reset_date: None,
        }
    }

    /// Update current equity (mark-to-market + realized), raising the peak if a new high is set.
    pub fn update_equity(&mut self, equity: Decimal, now: DateTime<Utc>) {
        self.roll_daily_window(now);
        self.current_equity = equity;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
    }

    /// Record a realized fill PnL against the running daily total; negative `pnl` accumulates
    /// toward the daily loss limit.
    pub fn record_realized_pnl(&mut self, pnl: Decimal, now: DateTime<Utc>) {
        self.roll_daily_window(now);
        if pnl.is_sign_negative() {
            self.daily_realized_loss += -pnl;
        }
    }

    fn roll_daily_window(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.daily_reset_date != Some(today) {
            self.daily_reset_date = Some(today);
            self.daily_realized_loss = Decimal::ZERO;
        }
    }

    /// Fraction below peak equity, `0` if at or above the peak.
    pub fn drawdown(&self) -> Decimal {
        if self.peak_equity.is_zero() || self.current_equity >= self.peak_equity {
            return Decimal::ZERO;
        }
        (self.peak_equity - self.current_equity) / self.peak_equity
    }

    pub fn daily_realized_loss(&self) -> Decimal {
        self.daily_realized_loss
    }

    pub fn check_drawdown_limit(&self, limit: Decimal, hook: &impl RiskAlertHook) {
        let drawdown = self.drawdown();
        if drawdown > limit {
            hook.alert(RiskViolation::DrawdownLimit { drawdown, limit });
        }
    }

    pub fn check_daily_loss_limit(&self, limit: Decimal, hook: &impl RiskAlertHook) {
        if self.daily_realized_loss > limit {
            hook.alert(RiskViolation::DailyLossLimit {
                realized_loss: self.daily_realized_loss,
                limit,
            });
        }
    }
}
