//! Security Code HTTP Routes
//!
//! Endpoints for security code reference data, plus the routed-but-unbuilt
//! price and order resources.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::debug;

use crate::rest_api::{CodeListQuery, CodeListResponse, CodeRecord, CodeService, RestError};

/// Create code routes
pub fn code_routes(service: Arc<CodeService>) -> Router {
    Router::new()
        .route("/codes", get(list_codes_handler))
        .route("/codes/{code}", get(get_code_handler))
        .route("/codes/{code}/price", get(get_price_handler))
        .route("/orders", get(list_orders_handler))
        .with_state(service)
}

// ==================
// Code Handlers
// ==================

async fn list_codes_handler(
    State(service): State<Arc<CodeService>>,
    Query(query): Query<CodeListQuery>,
) -> Result<Json<CodeListResponse>, RestError> {
    let market = query.market()?;
    let response = service.list_codes(market).await?;
    debug!(market = market.as_str(), count = response.count, "listed codes");
    Ok(Json(response))
}

async fn get_code_handler(
    State(service): State<Arc<CodeService>>,
    Path(code): Path<String>,
) -> Result<Json<CodeRecord>, RestError> {
    service
        .get_code(&code)
        .await?
        .map(Json)
        .ok_or(RestError::NotFound)
}

// ==================
// Stub Handlers
// ==================

async fn get_price_handler(Path(_code): Path<String>) -> Result<Json<Value>, RestError> {
    Err(RestError::NotImplemented("price"))
}

async fn list_orders_handler() -> Result<Json<Value>, RestError> {
    Err(RestError::NotImplemented("orders"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreHandler;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let service = CodeService::new(Arc::new(StoreHandler::in_memory()));
        code_routes(Arc::new(service))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_stubs_answer_not_implemented() {
        assert_eq!(status_of("/codes/005930/price").await, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(status_of("/orders").await, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_empty_collection_lists_nothing() {
        assert_eq!(status_of("/codes").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_market_is_bad_request() {
        assert_eq!(status_of("/codes?market=7").await, StatusCode::BAD_REQUEST);
    }
}
