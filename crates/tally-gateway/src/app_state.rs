//! Shared application state for the tally gateway.
//!
//! The store handle is injected, never global: `AppState::new` takes it as an
//! argument so tests can pass an in-memory or failing store, and
//! `AppState::from_config` opens the one named by the config.

use std::collections::HashMap;
use std::sync::Arc;

use tally_core::error::Result;

use crate::config::TallyConfig;
use crate::obs::metrics::GatewayMetrics;
use crate::service::CounterService;
use crate::store::{self, CounterStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<GatewayMetrics>,
}

struct AppStateInner {
    cfg: TallyConfig,
    counters: HashMap<String, Arc<CounterService>>,
}

impl AppState {
    /// Build application state around an already opened store.
    pub fn new(cfg: TallyConfig, store: Arc<dyn CounterStore>) -> Result<Self> {
        cfg.validate()?;

        let mut counters = HashMap::new();
        for c in &cfg.counters {
            let svc = CounterService::from_config(&cfg, c, Arc::clone(&store));
            tracing::info!(
                path = %svc.path(),
                key = %svc.key(),
                field = %svc.field(),
                policy = ?svc.policy(),
                backend = svc.backend(),
                "counter registered"
            );
            counters.insert(c.path.clone(), Arc::new(svc));
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, counters }),
            metrics: Arc::new(GatewayMetrics::default()),
        })
    }

    /// Open the configured store, then build state.
    pub fn from_config(cfg: TallyConfig) -> Result<Self> {
        let store = store::open(&cfg.store)?;
        Self::new(cfg, store)
    }

    pub fn cfg(&self) -> &TallyConfig {
        &self.inner.cfg
    }

    pub fn counter(&self, path: &str) -> Option<Arc<CounterService>> {
        self.inner.counters.get(path).cloned()
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Gauges derived from state rather than tracked in the registry.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("tally_counters_configured", self.inner.counters.len() as u64)]
    }
}
