use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::warn;

use super::domain::UnderwritingInput;
use super::UnderwritingCalculator;

/// Router exposing the underwriting calculator.
pub fn underwriting_router(calculator: Arc<UnderwritingCalculator>) -> Router {
    Router::new()
        .route("/api/v1/underwrite", post(underwrite_handler))
        .route("/api/v1/underwrite/health", get(underwrite_health))
        .with_state(calculator)
}

pub(crate) async fn underwrite_handler(
    State(calculator): State<Arc<UnderwritingCalculator>>,
    axum::Json(input): axum::Json<UnderwritingInput>,
) -> Response {
    match calculator.evaluate(&input) {
        Ok(output) => (StatusCode::OK, axum::Json(output)).into_response(),
        Err(error) => {
            warn!(%error, "underwriting request rejected");
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn underwrite_health() -> axum::Json<serde_json::Value> {
    axum::Json(json!({ "status": "healthy", "service": "underwriting" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn read_json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn post_json(body: Value) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::post("/api/v1/underwrite")
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn underwrite_route_returns_figures() {
        let router = underwriting_router(Arc::new(UnderwritingCalculator::default()));

        let response = router
            .oneshot(post_json(json!({
                "purchase_price": 200000,
                "monthly_rent": 2000,
                "monthly_taxes": 200,
                "monthly_insurance": 100,
                "monthly_maintenance": 100,
                "loan_amount": 160000,
                "interest_rate": 0.06
            })))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["risk_level"], json!("Medium"));
        assert_eq!(payload["down_payment"], json!(40000.0));
        assert!(payload["dscr"].is_number());
        assert!(payload["flip_profit"].is_null());
    }

    #[tokio::test]
    async fn all_cash_deal_reports_unbounded_dscr() {
        let router = underwriting_router(Arc::new(UnderwritingCalculator::default()));

        let response = router
            .oneshot(post_json(json!({
                "purchase_price": 150000,
                "monthly_rent": 1800
            })))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["dscr"], json!("unbounded"));
    }

    #[tokio::test]
    async fn invalid_input_is_unprocessable() {
        let response = underwrite_handler(
            State(Arc::new(UnderwritingCalculator::default())),
            axum::Json(UnderwritingInput::new(-1.0, 1_000.0)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json_body(response).await;
        assert!(payload["error"]
            .as_str()
            .expect("error message")
            .contains("purchase_price"));
    }

    #[tokio::test]
    async fn health_route_identifies_service() {
        let router = underwriting_router(Arc::new(UnderwritingCalculator::default()));

        let response = router
            .oneshot(
                axum::http::Request::get("/api/v1/underwrite/health")
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["service"], json!("underwriting"));
    }
}
