//! Shared application state for the kubehook receiver.
//!
//! Builds the metrics handle, registers the built-in processors, and wires the
//! dispatcher. Startup errors are explicit (Result instead of panic).

use std::sync::Arc;

use kubehook_core::error::{KubehookError, Result};

use crate::config::GatewayConfig;
use crate::dispatch::{Dispatcher, Registry};
use crate::obs::GatewayMetrics;
use crate::processors::{AdmissionProcessor, AuditProcessor, AuthorizationProcessor};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<GatewayConfig>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(GatewayMetrics::new());

        let registry = Registry::new();
        registry.register(Arc::new(AdmissionProcessor::new(Arc::clone(&metrics))));
        registry.register(Arc::new(AuthorizationProcessor::new(Arc::clone(&metrics))));
        registry.register(Arc::new(AuditProcessor::new(Arc::clone(&metrics))));

        let dispatcher = Dispatcher::new(Arc::new(registry), Arc::clone(&metrics));

        // every review kind must have a processor
        let missing = dispatcher.registry().missing_kinds();
        if !missing.is_empty() {
            return Err(KubehookError::Internal(format!(
                "no processor registered for {missing:?}"
            )));
        }

        Ok(Self {
            cfg: Arc::new(cfg),
            dispatcher: Arc::new(dispatcher),
            metrics,
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }
}
