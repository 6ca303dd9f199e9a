use crate::{error::RiskError, limits::RiskLimits};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::{path::PathBuf, time::{Duration, Instant}};

/// The authoritative source a [`PolicyCache`] refreshes from on expiry (§4.6 "authoritative load
/// from configuration collaborator (§6)").
#[async_trait]
pub trait PolicyLoader: Send + Sync {
    async fn load(&self) -> Result<RiskLimits, RiskError>;
}

/// Reads [`RiskLimits`] from a JSON file on every refresh (§6 "Relational store: strategy/risk
/// policies loaded at startup and on invalidation events"), matching the same
/// read-whole-file-with-`serde_json` convention every other config-loading boundary in this
/// workspace uses.
#[derive(Debug, Clone)]
pub struct FilePolicyLoader {
    path: PathBuf,
}

impl FilePolicyLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PolicyLoader for FilePolicyLoader {
    async fn load(&self) -> Result<RiskLimits, RiskError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|error| RiskError::ConfigLoad(error.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|error| RiskError::ConfigLoad(error.to_string()))
    }
}

struct Cached {
    limits: RiskLimits,
    loaded_at: Instant,
}

/// In-memory limits cache with a fixed TTL (§4.6: "cached in memory with TTL (e.g. 1 s)";
/// §5 "Policy cache: read-heavy, writes on TTL expiry; readers never block writers").
///
/// `get` never blocks a concurrent reader on the refresh; a stale-but-present entry is served
/// while a refresh races in, and only an empty cache with a failing loader is fail-closed.
pub struct PolicyCache<Loader> {
    loader: Loader,
    ttl: Duration,
    cached: RwLock<Option<Cached>>,
}

/// §4.6: "cached in memory with TTL (e.g. 1 s)".
pub const DEFAULT_POLICY_TTL: Duration = Duration::from_secs(1);

impl<Loader> PolicyCache<Loader>
where
    Loader: PolicyLoader,
{
    pub fn new(loader: Loader, ttl: Duration) -> Self {
        Self {
            loader,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Return the current [`RiskLimits`], refreshing from [`PolicyLoader`] if the cache entry is
    /// absent or past `ttl`. A refresh failure with no prior entry is fail-closed
    /// ([`RiskError::PolicyUnavailable`]); a refresh failure with a stale entry present serves
    /// the stale entry rather than denying every order on a transient collaborator outage.
    pub async fn get(&self) -> Result<RiskLimits, RiskError> {
        let is_fresh = self
            .cached
            .read()
            .as_ref()
            .is_some_and(|entry| entry.loaded_at.elapsed() < self.ttl);

        if is_fresh {
            return Ok(self.cached.read().as_ref().expect("checked fresh").limits.clone());
        }

        match self.loader.load().await {
            Ok(limits) => {
                *self.cached.write() = Some(Cached {
                    limits: limits.clone(),
                    loaded_at: Instant::now(),
                });
                Ok(limits)
            }
            Err(error) => match self.cached.read().as_ref() {
                Some(stale) => Ok(stale.limits.clone()),
                None => Err(RiskError::PolicyUnavailable(error.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::{LimitSet, PortfolioLimits};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl PolicyLoader for CountingLoader {
        async fn load(&self) -> Result<RiskLimits, RiskError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after == Some(n) {
                return Err(RiskError::ConfigLoad("unreachable".to_string()));
            }
            Ok(RiskLimits::new(
                LimitSet::new(dec!(100_000), dec!(5), dec!(10_000)),
                PortfolioLimits::new(50, dec!(1_000), dec!(0.2), dec!(500)),
            ))
        }
    }

    #[tokio::test]
    async fn caches_within_ttl() {
        let cache = PolicyCache::new(
            CountingLoader { calls: AtomicUsize::new(0), fail_after: None },
            Duration::from_millis(50),
        );
        cache.get().await.unwrap();
        cache.get().await.unwrap();
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fails_closed_when_never_loaded() {
        let cache = PolicyCache::new(
            CountingLoader { calls: AtomicUsize::new(0), fail_after: Some(0) },
            Duration::from_millis(50),
        );
        assert!(matches!(cache.get().await, Err(RiskError::PolicyUnavailable(_))));
    }

    #[tokio::test]
    async fn serves_stale_entry_on_refresh_failure() {
        let cache = PolicyCache::new(
            CountingLoader { calls: AtomicUsize::new(0), fail_after: Some(1) },
            Duration::from_millis(1),
        );
        cache.get().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get().await.is_ok());
    }

    #[tokio::test]
    async fn file_policy_loader_reads_risk_limits_from_disk() {
        let limits = RiskLimits::new(
            LimitSet::new(dec!(100_000), dec!(5), dec!(10_000)),
            PortfolioLimits::new(50, dec!(1_000), dec!(0.2), dec!(500)),
        );
        let path = std::env::temp_dir().join("meridian-risk-policy-test.json");
        tokio::fs::write(&path, serde_json::to_vec(&limits).unwrap()).await.unwrap();

        let loaded = FilePolicyLoader::new(&path).load().await.unwrap();
        assert_eq!(loaded.default, limits.default);
        assert_eq!(loaded.portfolio, limits.portfolio);
    }

    #[tokio::test]
    async fn file_policy_loader_surfaces_a_missing_file_as_config_load_error() {
        let loader = FilePolicyLoader::new(std::env::temp_dir().join("does-not-exist-meridian.json"));
        assert!(matches!(loader.load().await, Err(RiskError::ConfigLoad(_))));
    }
}
