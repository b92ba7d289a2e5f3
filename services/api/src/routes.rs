use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use credit_score::error::AppError;
use credit_score::score::history::parse_credit_history_age;
use credit_score::score::inference::ScoreGateway;
use credit_score::score::schema::{CustomerProfile, FeatureRecord};
use credit_score::score::Severity;
use serde::Serialize;
use serde_json::json;
use tracing::info;

/// The single-page form, embedded so the shell has no runtime asset
/// dependency besides the fitted artifacts.
const FORM_PAGE: &str = include_str!("../assets/index.html");

#[derive(Debug, Serialize)]
pub(crate) struct PredictResponse {
    pub(crate) label: String,
    pub(crate) severity: Severity,
    pub(crate) predicted_at: DateTime<Utc>,
}

pub(crate) fn with_prediction_routes() -> axum::Router {
    axum::Router::new()
        .route("/", axum::routing::get(form_page))
        .route("/api/v1/predict", axum::routing::post(predict_endpoint))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn form_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// One submission cycle: derive the month count, assemble the record, run
/// the gateway. An unparsable duration aborts before the gateway is touched.
pub(crate) async fn predict_endpoint(
    Extension(state): Extension<AppState>,
    Json(profile): Json<CustomerProfile>,
) -> Result<Json<PredictResponse>, AppError> {
    let months = parse_credit_history_age(&profile.credit_history_age)?;
    let record = FeatureRecord::assemble(profile, months);
    let prediction = state.gateway.predict(&record)?;

    info!(label = %prediction.label, severity = ?prediction.severity, "credit score predicted");

    Ok(Json(PredictResponse {
        label: prediction.label,
        severity: prediction.severity,
        predicted_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum_prometheus::PrometheusMetricLayer;
    use credit_score::score::inference::{
        FeatureTransformer, InferenceGateway, LabelDecoder, PredictError, ScoreClassifier,
    };
    use metrics_exporter_prometheus::PrometheusHandle;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, OnceLock};
    use tower::util::ServiceExt;

    struct CountingTransformer(Arc<AtomicUsize>);

    impl FeatureTransformer for CountingTransformer {
        fn transform(&self, _record: &FeatureRecord) -> Result<Vec<f32>, PredictError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.0; 4])
        }
    }

    struct FixedClassifier(Vec<f32>);

    impl ScoreClassifier for FixedClassifier {
        fn classify(&self, _features: &[f32]) -> Result<Vec<f32>, PredictError> {
            Ok(self.0.clone())
        }
    }

    struct FixedDecoder(Vec<&'static str>);

    impl LabelDecoder for FixedDecoder {
        fn decode(&self, index: usize) -> Result<String, PredictError> {
            self.0
                .get(index)
                .map(|label| label.to_string())
                .ok_or(PredictError::UnknownLabelIndex {
                    index,
                    classes: self.0.len(),
                })
        }
    }

    // The prometheus recorder is process-global, so the tests share one handle.
    fn metrics_handle() -> Arc<PrometheusHandle> {
        static HANDLE: OnceLock<Arc<PrometheusHandle>> = OnceLock::new();
        HANDLE
            .get_or_init(|| {
                let (_layer, handle) = PrometheusMetricLayer::pair();
                Arc::new(handle)
            })
            .clone()
    }

    fn stub_state(distribution: Vec<f32>, invocations: Arc<AtomicUsize>) -> AppState {
        let gateway = InferenceGateway::new(
            CountingTransformer(invocations),
            FixedClassifier(distribution),
            FixedDecoder(vec!["Good", "Poor", "Standard"]),
        );
        AppState {
            gateway: Arc::new(gateway),
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: metrics_handle(),
        }
    }

    fn submission(credit_history_age: &str) -> CustomerProfile {
        serde_json::from_value(serde_json::json!({
            "annual_income": 52000.0,
            "monthly_inhand_salary": 4100.0,
            "num_bank_accounts": 3,
            "num_credit_card": 4,
            "interest_rate": 11.5,
            "num_of_loan": 2,
            "delay_from_due_date": 9,
            "num_of_delayed_payment": 5,
            "changed_credit_limit": 6.2,
            "num_credit_inquiries": 4,
            "outstanding_debt": 1250.0,
            "credit_utilization_ratio": 31.4,
            "total_emi_per_month": 210.0,
            "amount_invested_monthly": 120.0,
            "monthly_balance": 380.0,
            "credit_history_age": credit_history_age,
            "occupation": "Engineer",
            "credit_mix": "Good",
            "payment_of_min_amount": "No",
            "payment_behaviour": "Low_spent_Small_value_payments"
        }))
        .expect("submission deserializes")
    }

    #[tokio::test]
    async fn predict_endpoint_returns_the_neutral_standard_outcome() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let state = stub_state(vec![0.1, 0.2, 0.7], invocations.clone());

        let Json(body) = predict_endpoint(
            Extension(state),
            Json(submission("15 Years and 3 Months")),
        )
        .await
        .expect("prediction succeeds");

        assert_eq!(body.label, "Standard");
        assert_eq!(body.severity, Severity::Neutral);
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_duration_never_reaches_the_gateway() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let state = stub_state(vec![0.1, 0.2, 0.7], invocations.clone());

        let err = predict_endpoint(Extension(state), Json(submission("a while ago")))
            .await
            .expect_err("duration must be rejected");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn form_page_is_served_at_the_root() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let state = stub_state(vec![0.1, 0.2, 0.7], invocations);
        let app = with_prediction_routes().layer(Extension(state));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .expect("content type set")
            .to_str()
            .expect("content type is ascii");
        assert!(content_type.starts_with("text/html"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let page = String::from_utf8(body.to_vec()).expect("page is utf-8");
        assert!(page.contains("Credit History Age"));
        assert!(page.contains("Predict Credit Score"));
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }
}
