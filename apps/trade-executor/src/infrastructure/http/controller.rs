//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the trade orchestrator.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};

use crate::application::dto::TradeMutationRequest;
use crate::application::use_cases::TradeOrchestrator;
use crate::domain::shared::TradeId;
use crate::domain::trade_lifecycle::{Trade, TradeRepository};

use super::response::{ApiError, HealthResponse};

/// Application state shared across handlers.
pub struct AppState<R>
where
    R: TradeRepository,
{
    /// Trade operations.
    pub orchestrator: Arc<TradeOrchestrator<R>>,
    /// Application version.
    pub version: String,
}

impl<R> Clone for AppState<R>
where
    R: TradeRepository,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<R>(state: AppState<R>) -> Router
where
    R: TradeRepository + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/trades", get(get_all_trades))
        .route("/trades/add", post(add_trade))
        .route("/trades/update/{id}", post(update_trade))
        .route("/trades/{id}", get(get_trade))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check<R>(State(state): State<AppState<R>>) -> impl IntoResponse
where
    R: TradeRepository,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Create a trade; responds with its id.
async fn add_trade<R>(
    State(state): State<AppState<R>>,
    payload: Result<Json<TradeMutationRequest>, JsonRejection>,
) -> Result<Json<String>, ApiError>
where
    R: TradeRepository,
{
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let trade = state.orchestrator.add(request).await?;
    Ok(Json(trade.id().to_string()))
}

/// Amend a trade; the route id wins over any id in the body.
async fn update_trade<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    payload: Result<Json<TradeMutationRequest>, JsonRejection>,
) -> Result<Json<String>, ApiError>
where
    R: TradeRepository,
{
    let Json(mut request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.id = Some(id);
    let trade = state.orchestrator.update(request).await?;
    Ok(Json(trade.id().to_string()))
}

/// Fetch one trade.
async fn get_trade<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<Trade>, ApiError>
where
    R: TradeRepository,
{
    let trade = state.orchestrator.get(&TradeId::new(id)).await?;
    Ok(Json(trade))
}

/// Fetch every trade.
async fn get_all_trades<R>(State(state): State<AppState<R>>) -> Result<Json<Vec<Trade>>, ApiError>
where
    R: TradeRepository,
{
    Ok(Json(state.orchestrator.get_all().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NoOpEventPublisher;
    use crate::application::services::{DispatcherConfig, PublicationDispatcher};
    use crate::domain::trade_lifecycle::RepositoryError;
    use crate::domain::trade_lifecycle::repository::MockTradeRepository;
    use crate::infrastructure::http::ApiErrorResponse;
    use crate::infrastructure::persistence::InMemoryTradeRepository;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn create_test_state<R: TradeRepository>(repo: R) -> AppState<R> {
        let dispatcher = Arc::new(PublicationDispatcher::spawn(
            Arc::new(NoOpEventPublisher),
            DispatcherConfig::default(),
        ));
        AppState {
            orchestrator: Arc::new(TradeOrchestrator::new(Arc::new(repo), dispatcher)),
            version: "1.0.0-test".to_string(),
        }
    }

    fn trade_body() -> Value {
        json!({
            "customerId": "user01",
            "instrument": "ABC",
            "tradeType": "buy",
            "quantity": 15,
            "price": 100,
            "currency": "USD",
            "counterparty": "broker"
        })
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let app = create_router(create_test_state(InMemoryTradeRepository::new()));

        let response = app.oneshot(get_req("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = body_json(response).await;
        assert_eq!(health.version, "1.0.0-test");
    }

    #[tokio::test]
    async fn add_returns_id_and_trade_is_readable() {
        let app = create_router(create_test_state(InMemoryTradeRepository::new()));

        let response = app
            .clone()
            .oneshot(post_json("/trades/add", &trade_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id: String = body_json(response).await;

        let response = app
            .oneshot(get_req(&format!("/trades/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let trade: Value = body_json(response).await;
        assert_eq!(trade["id"], id.as_str());
        assert_eq!(trade["tradeType"], "Buy");
        assert_eq!(trade["status"], "Initiated");
    }

    #[tokio::test]
    async fn invalid_trade_type_is_bad_request() {
        let app = create_router(create_test_state(InMemoryTradeRepository::new()));
        let mut body = trade_body();
        body["tradeType"] = json!("hold");

        let response = app.oneshot(post_json("/trades/add", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ApiErrorResponse = body_json(response).await;
        assert_eq!(err.error, "INVALID_INPUT");
        assert!(err.message.contains("tradeType"));
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let app = create_router(create_test_state(InMemoryTradeRepository::new()));
        let mut body = trade_body();
        body.as_object_mut().unwrap().remove("instrument");

        let response = app.oneshot(post_json("/trades/add", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_uses_route_id() {
        let app = create_router(create_test_state(InMemoryTradeRepository::new()));

        let response = app
            .clone()
            .oneshot(post_json("/trades/add", &trade_body()))
            .await
            .unwrap();
        let id: String = body_json(response).await;

        let mut amended = trade_body();
        amended["id"] = json!("ignored");
        amended["instrument"] = json!("XYZ");
        let response = app
            .clone()
            .oneshot(post_json(&format!("/trades/update/{id}"), &amended))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated_id: String = body_json(response).await;
        assert_eq!(updated_id, id);

        let response = app
            .oneshot(get_req(&format!("/trades/{id}")))
            .await
            .unwrap();
        let trade: Value = body_json(response).await;
        assert_eq!(trade["instrument"], "XYZ");
    }

    #[tokio::test]
    async fn update_of_unknown_trade_is_bad_request() {
        let app = create_router(create_test_state(InMemoryTradeRepository::new()));

        let response = app
            .oneshot(post_json("/trades/update/unknown", &trade_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_of_unknown_trade_is_not_found() {
        let app = create_router(create_test_state(InMemoryTradeRepository::new()));

        let response = app.oneshot(get_req("/trades/unknown")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let err: ApiErrorResponse = body_json(response).await;
        assert_eq!(err.error, "NOT_FOUND");
    }

    #[tokio::test]
    async fn get_all_returns_array() {
        let app = create_router(create_test_state(InMemoryTradeRepository::new()));

        let response = app.oneshot(get_req("/trades")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let trades: Vec<Value> = body_json(response).await;
        assert!(trades.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error() {
        let mut repo = MockTradeRepository::new();
        repo.expect_insert()
            .returning(|_| Err(RepositoryError::Connection("refused".to_string())));
        let app = create_router(create_test_state(repo));

        let response = app
            .oneshot(post_json("/trades/add", &trade_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: ApiErrorResponse = body_json(response).await;
        assert_eq!(err.error, "STORAGE_ERROR");
    }
}
