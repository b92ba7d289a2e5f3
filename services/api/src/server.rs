use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_score::config::AppConfig;
use credit_score::error::AppError;
use credit_score::score::inference::artifacts::ModelArtifacts;
use credit_score::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(model_dir) = args.model_dir.take() {
        config.artifacts.dir = model_dir;
    }

    telemetry::init(&config.telemetry)?;

    // Artifact loading precedes the bind: a missing or malformed artifact
    // set halts the process before the form is ever served.
    let artifacts = ModelArtifacts::load(&config.artifacts.dir)?;
    let gateway = artifacts.into_gateway();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        gateway,
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_prediction_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "credit score prediction service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
