use crate::infra::{ApiDealService, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use property_finder::deals::deal_router;
use property_finder::underwriting::{underwriting_router, UnderwritingCalculator};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes(
    deals: Arc<ApiDealService>,
    calculator: Arc<UnderwritingCalculator>,
) -> axum::Router {
    deal_router(deals)
        .merge(underwriting_router(calculator))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::build_deal_service;
    use chrono::NaiveDate;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use property_finder::config::ScoringConfig;
    use property_finder::deals::{MetricKind, MetricObservation, ZipCode};
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn router(state: AppState) -> axum::Router {
        let observations = vec![
            observation("07030", MetricKind::RentIndex, (2025, 1, 31), 3_100.0),
            observation("07030", MetricKind::RentIndex, (2025, 5, 31), 3_350.0),
            observation("08608", MetricKind::PermitCount, (2025, 3, 17), 1.0),
        ];
        let deals = build_deal_service(&ScoringConfig::default(), observations)
            .expect("service builds");
        with_service_routes(deals, Arc::new(UnderwritingCalculator::default()))
            .layer(Extension(state))
    }

    fn observation(
        zip_code: &str,
        kind: MetricKind,
        (year, month, day): (i32, u32, u32),
        value: f64,
    ) -> MetricObservation {
        MetricObservation::new(
            ZipCode::parse(zip_code).expect("valid zip"),
            kind,
            NaiveDate::from_ymd_opt(year, month, day).expect("valid date"),
            value,
        )
        .expect("finite value")
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> axum::http::Request<axum::body::Body> {
        let builder = axum::http::Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(body.to_string())),
            None => builder.body(axum::body::Body::empty()),
        };
        request.expect("request builds")
    }

    async fn read_json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reflects_startup_state() {
        let state = app_state(false);
        let flag = state.readiness.clone();

        let response = router(state.clone())
            .oneshot(request("GET", "/ready", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        flag.store(true, Ordering::Release);
        let response = router(state)
            .oneshot(request("GET", "/ready", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_and_metrics_respond() {
        let response = router(app_state(true))
            .oneshot(request("GET", "/health", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router(app_state(true))
            .oneshot(request("GET", "/metrics", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn deal_and_underwriting_routes_are_mounted() {
        let app = router(app_state(true));

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/deals/score",
                Some(json!({ "as_of": "2025-06-30" })),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let summary = read_json_body(response).await;
        assert_eq!(summary["total_deals_scored"], json!(6));

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/deals/07030", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/underwrite",
                Some(json!({ "purchase_price": 250000, "monthly_rent": -1 })),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
