use credit_score::score::inference::ScoreGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Shared request context: the immutable gateway built from the fitted
/// artifacts at startup, plus readiness and metrics handles.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) gateway: Arc<dyn ScoreGateway>,
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}
