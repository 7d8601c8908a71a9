pub mod cache;
pub mod probe;

pub use cache::{NoopObjectCache, ObjectCacheControl};
pub use probe::{ConnectionProbe, StaticConnectionProbe, TcpConnectionProbe};

use crate::config::RouterConfig;
use crate::core::Result;
use log::info;
use tokio::sync::Mutex;

/// The once-per-process replica routing switch.
///
/// The decision is made on first call and never revisited: endpoints do not
/// move at runtime, and flipping the switch mid-flight would re-enable the
/// object cache semantics the enablement path just tore down. Whatever the
/// first call decides is what every later call sees.
pub struct ReplicaToggle {
    decision: Mutex<Option<bool>>,
}

impl ReplicaToggle {
    pub fn new() -> Self {
        Self {
            decision: Mutex::new(None),
        }
    }

    /// Decide whether replica routing is enabled, memoizing the outcome.
    ///
    /// Disabled when no replica endpoint is configured, and when the probed
    /// replica target equals the primary target (same database twice buys
    /// nothing and risks nothing). Enabled only when the targets genuinely
    /// differ, in which case the shared object cache is disabled exactly
    /// once before the decision is recorded.
    ///
    /// A probe failure is fatal: the error propagates, nothing is cached,
    /// and the caller is expected to abort startup.
    pub async fn decide(
        &self,
        probe: &dyn ConnectionProbe,
        config: &RouterConfig,
        cache: &dyn ObjectCacheControl,
    ) -> Result<bool> {
        let mut slot = self.decision.lock().await;
        if let Some(decided) = *slot {
            return Ok(decided);
        }

        let enabled = match &config.replica {
            None => {
                info!("No replica endpoint configured; replica routing disabled");
                false
            }
            Some(replica) => {
                let primary_target = probe.connection_target(&config.primary).await?;
                let replica_target = probe.connection_target(replica).await?;

                if primary_target.eq_ignore_ascii_case(&replica_target) {
                    info!(
                        "Replica endpoint resolves to the primary ({}); replica routing disabled",
                        primary_target
                    );
                    false
                } else {
                    info!(
                        "Replica routing enabled via '{}' probe: primary {}, replica {}",
                        probe.name(),
                        primary_target,
                        replica_target
                    );
                    true
                }
            }
        };

        if enabled {
            cache.disable();
        }

        *slot = Some(enabled);
        Ok(enabled)
    }

    /// The recorded decision, if one has been made yet
    pub fn decided(&self) -> Option<bool> {
        self.decision.try_lock().ok().and_then(|slot| *slot)
    }
}

impl Default for ReplicaToggle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::core::RouterError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProbe {
        calls: AtomicUsize,
    }

    impl CountingProbe {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ConnectionProbe for CountingProbe {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn connection_target(&self, endpoint: &EndpointConfig) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(endpoint.connection_target())
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl ConnectionProbe for FailingProbe {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn connection_target(&self, endpoint: &EndpointConfig) -> Result<String> {
            Err(RouterError::ProbeFailed {
                endpoint: endpoint.connection_target(),
                cause: "connection refused".into(),
            })
        }
    }

    struct CountingCache {
        disables: AtomicUsize,
    }

    impl CountingCache {
        fn new() -> Self {
            Self {
                disables: AtomicUsize::new(0),
            }
        }
    }

    impl ObjectCacheControl for CountingCache {
        fn disable(&self) {
            self.disables.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn split_config() -> RouterConfig {
        RouterConfig::with_replica(
            EndpointConfig::new("primary.db", "shop"),
            EndpointConfig::new("replica.db", "shop"),
        )
    }

    #[tokio::test]
    async fn test_no_replica_means_disabled() {
        let toggle = ReplicaToggle::new();
        let cache = CountingCache::new();
        let config = RouterConfig::primary_only(EndpointConfig::new("primary.db", "shop"));

        let enabled = toggle
            .decide(&CountingProbe::new(), &config, &cache)
            .await
            .unwrap();

        assert!(!enabled);
        assert_eq!(cache.disables.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_same_target_means_disabled() {
        let toggle = ReplicaToggle::new();
        let cache = CountingCache::new();
        let config = RouterConfig::with_replica(
            EndpointConfig::new("primary.db", "shop"),
            EndpointConfig::new("PRIMARY.DB", "Shop"),
        );

        let enabled = toggle
            .decide(&CountingProbe::new(), &config, &cache)
            .await
            .unwrap();

        assert!(!enabled);
        assert_eq!(cache.disables.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_distinct_targets_enable_and_disable_cache_once() {
        let toggle = ReplicaToggle::new();
        let cache = CountingCache::new();
        let config = split_config();

        let enabled = toggle
            .decide(&CountingProbe::new(), &config, &cache)
            .await
            .unwrap();

        assert!(enabled);
        assert_eq!(cache.disables.load(Ordering::SeqCst), 1);
        assert_eq!(toggle.decided(), Some(true));
    }

    #[tokio::test]
    async fn test_decision_is_memoized() {
        let toggle = ReplicaToggle::new();
        let cache = CountingCache::new();
        let probe = CountingProbe::new();
        let config = split_config();

        toggle.decide(&probe, &config, &cache).await.unwrap();
        toggle.decide(&probe, &config, &cache).await.unwrap();
        toggle.decide(&probe, &config, &cache).await.unwrap();

        // Two probes (primary + replica) on the first call, none after
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.disables.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_failure_is_fatal_and_uncached() {
        let toggle = ReplicaToggle::new();
        let cache = CountingCache::new();
        let config = split_config();

        let result = toggle.decide(&FailingProbe, &config, &cache).await;

        assert!(matches!(result, Err(RouterError::ProbeFailed { .. })));
        assert_eq!(toggle.decided(), None);
        assert_eq!(cache.disables.load(Ordering::SeqCst), 0);
    }
}
