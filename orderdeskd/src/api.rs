//! HTTP API for the Order Desk daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Watchlist and account balance
//! - Order estimate, pre-trade analysis and scenario simulation
//! - Ticket lifecycle (place, proceed, confirm, cancel)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use orderdesk_domain::{DomainError, OrderForm, OrderTicket, PricingBreakdown, Quote};
use orderdesk_engine::{EngineError, OrderReview, PreTradeAnalysis, ScenarioRequest, TradeScenario};
use orderdesk_exec::ExecError;

use crate::error::DaemonError;
use crate::session::{confirm_order, TradingSession};

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState {
    pub session: Arc<RwLock<TradingSession>>,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Watchlist response.
#[derive(Debug, Serialize)]
pub struct InstrumentsResponse {
    pub count: usize,
    pub instruments: Vec<Quote>,
}

/// Account balance response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub available: Decimal,
}

/// Pricing plus mock analysis.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub pricing: PricingBreakdown,
    pub analysis: PreTradeAnalysis,
}

/// A ticket as returned by the API.
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    #[serde(flatten)]
    pub ticket: OrderTicket,
    pub can_cancel: bool,
}

impl From<&OrderTicket> for TicketResponse {
    fn from(ticket: &OrderTicket) -> Self {
        Self {
            ticket: ticket.clone(),
            can_cancel: ticket.can_cancel(),
        }
    }
}

/// Ticket list response.
#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub count: usize,
    pub tickets: Vec<TicketResponse>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/instruments", get(instruments_handler))
        .route("/account", get(account_handler))
        .route("/orders/estimate", post(estimate_handler))
        .route("/orders/analyze", post(analyze_handler))
        .route("/simulations", post(simulate_handler))
        .route("/orders", post(place_order_handler).get(list_orders_handler))
        .route("/orders/:id", get(get_order_handler))
        .route("/orders/:id/proceed", post(proceed_handler))
        .route("/orders/:id/confirm", post(confirm_handler))
        .route("/orders/:id/cancel", post(cancel_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn instruments_handler(State(state): State<Arc<ApiState>>) -> Json<InstrumentsResponse> {
    let session = state.session.read().await;
    let instruments = session.instruments().to_vec();

    Json(InstrumentsResponse {
        count: instruments.len(),
        instruments,
    })
}

async fn account_handler(State(state): State<Arc<ApiState>>) -> Json<AccountResponse> {
    let session = state.session.read().await;

    Json(AccountResponse {
        available: session.balance().available(),
    })
}

/// Validation, pricing and affordability without opening a ticket.
async fn estimate_handler(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<OrderForm>,
) -> Result<Json<OrderReview>, ApiError> {
    let session = state.session.read().await;
    let review = session.estimate(&form).map_err(to_error_response)?;

    Ok(Json(review))
}

async fn analyze_handler(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<OrderForm>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    // Write lock: the analysis generator advances its signal source
    let mut session = state.session.write().await;
    let (pricing, analysis) = session.analyze(&form).map_err(to_error_response)?;

    Ok(Json(AnalyzeResponse { pricing, analysis }))
}

async fn simulate_handler(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ScenarioRequest>,
) -> Result<Json<TradeScenario>, ApiError> {
    let session = state.session.read().await;
    let scenario = session.simulate(&req).map_err(to_error_response)?;

    Ok(Json(scenario))
}

/// Open a ticket in REVIEWING.
async fn place_order_handler(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<OrderForm>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    let mut session = state.session.write().await;
    let ticket = session.place_order(&form).map_err(to_error_response)?;

    Ok((StatusCode::CREATED, Json(TicketResponse::from(&ticket))))
}

async fn list_orders_handler(State(state): State<Arc<ApiState>>) -> Json<TicketListResponse> {
    let session = state.session.read().await;
    let tickets: Vec<TicketResponse> = session.tickets().map(TicketResponse::from).collect();

    Json(TicketListResponse {
        count: tickets.len(),
        tickets,
    })
}

async fn get_order_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketResponse>, ApiError> {
    let session = state.session.read().await;
    let ticket = session.ticket(id).map_err(to_error_response)?;

    Ok(Json(TicketResponse::from(ticket)))
}

async fn proceed_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketResponse>, ApiError> {
    let mut session = state.session.write().await;
    let ticket = session.proceed(id).map_err(to_error_response)?;

    Ok(Json(TicketResponse::from(&ticket)))
}

/// Submit through the gateway. Blocks for the gateway's processing delay.
async fn confirm_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = confirm_order(&state.session, id).await.map_err(to_error_response)?;

    Ok(Json(TicketResponse::from(&ticket)))
}

async fn cancel_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketResponse>, ApiError> {
    let mut session = state.session.write().await;
    let ticket = session.cancel(id).map_err(to_error_response)?;

    Ok(Json(TicketResponse::from(&ticket)))
}

// =============================================================================
// Helpers
// =============================================================================

fn to_error_response(error: DaemonError) -> ApiError {
    let status = match &error {
        DaemonError::Validation(_) | DaemonError::InsufficientFunds { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        },
        DaemonError::Engine(EngineError::InvalidScenario(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        DaemonError::TicketNotFound(_) => StatusCode::NOT_FOUND,
        DaemonError::Domain(DomainError::InvalidStateTransition(_)) => StatusCode::CONFLICT,
        DaemonError::Exec(ExecError::AlreadySubmitted(_)) => StatusCode::CONFLICT,
        DaemonError::Exec(_) => StatusCode::BAD_GATEWAY,
        DaemonError::Config(_) | DaemonError::Shutdown => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };

    let details = match &error {
        DaemonError::Validation(errors) => serde_json::to_value(errors).ok(),
        DaemonError::InsufficientFunds {
            estimated_cost,
            available,
            shortfall,
        } => Some(serde_json::json!({
            "reason": "INSUFFICIENT_FUNDS",
            "estimated_cost": estimated_cost,
            "available": available,
            "shortfall": shortfall,
        })),
        _ => None,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use orderdesk_exec::{Executor, SimulatedGateway};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::event_bus::EventBus;

    fn create_test_app() -> (Router, Arc<SimulatedGateway>) {
        let config = Config::test();
        let gateway = Arc::new(SimulatedGateway::instant());
        let executor = Arc::new(Executor::new(gateway.clone()));
        let event_bus = Arc::new(EventBus::new(100));
        let session = TradingSession::new(&config.session, executor, event_bus).unwrap();

        let state = Arc::new(ApiState {
            session: Arc::new(RwLock::new(session)),
        });

        (create_router(state), gateway)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    async fn place(app: &Router, symbol: &str, quantity: i64) -> String {
        let (status, body) =
            send(app, "POST", "/orders", Some(json!({"symbol": symbol, "quantity": quantity}))).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = create_test_app();

        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_instruments_and_account() {
        let (app, _) = create_test_app();

        let (status, body) = send(&app, "GET", "/instruments", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 8);
        assert_eq!(body["instruments"][0]["symbol"], "RELIANCE");

        let (status, body) = send(&app, "GET", "/account", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available"], "150000");
    }

    #[tokio::test]
    async fn test_estimate_reference_order() {
        let (app, _) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/orders/estimate",
            Some(json!({"symbol": "RELIANCE", "quantity": 50, "order_type": "MARKET"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pricing"]["total_value"], "122837.50");
        assert_eq!(decimal(&body["pricing"]["estimated_cost"]), dec!(123003.821975));
        assert_eq!(body["affordability"]["ok"], true);
    }

    #[tokio::test]
    async fn test_estimate_validation_errors() {
        let (app, _) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/orders/estimate",
            Some(json!({"quantity": 0, "order_type": "LIMIT"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let codes: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["INSTRUMENT_REQUIRED", "QUANTITY_INVALID", "LIMIT_PRICE_INVALID"]);
    }

    fn error_codes(body: &Value) -> Vec<&str> {
        body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["code"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_malformed_numbers_are_field_errors() {
        let (app, _) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/orders/estimate",
            Some(json!({"symbol": "TCS", "quantity": 0, "order_type": "LIMIT", "limit_price": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_codes(&body), vec!["QUANTITY_INVALID", "LIMIT_PRICE_INVALID"]);

        let (status, body) =
            send(&app, "POST", "/orders", Some(json!({"symbol": "TCS", "quantity": 1.5}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_codes(&body), vec!["QUANTITY_INVALID"]);
        assert_eq!(body["details"][0]["field"], "quantity");
    }

    #[tokio::test]
    async fn test_oversized_orders_are_rejected() {
        let (app, _) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/orders/estimate",
            Some(json!({
                "symbol": "TCS",
                "quantity": 2,
                "order_type": "LIMIT",
                "limit_price": "79228162514264337593543950335"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_codes(&body), vec!["LIMIT_PRICE_INVALID"]);

        for uri in ["/orders/analyze", "/orders"] {
            let (status, body) = send(
                &app,
                "POST",
                uri,
                Some(json!({"symbol": "TCS", "quantity": 9_000_000_000_000_000_000_i64})),
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
            assert_eq!(error_codes(&body), vec!["QUANTITY_INVALID"]);
        }

        let (status, _) = send(
            &app,
            "POST",
            "/simulations",
            Some(json!({
                "current_price": "100",
                "target_price": "79228162514264337593543950335",
                "stop_loss": "95",
                "quantity": 2
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_analyze_endpoint() {
        let (app, _) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/orders/analyze",
            Some(json!({"symbol": "TCS", "quantity": 5})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pricing"]["total_value"], "18394.50");
        assert_eq!(body["analysis"]["symbol"], "TCS");
        assert_eq!(body["analysis"]["metrics"].as_array().unwrap().len(), 4);
        assert_eq!(body["analysis"]["reasoning"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_simulation_endpoint() {
        let (app, _) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/simulations",
            Some(json!({"current_price": "100", "target_price": "120", "stop_loss": "100", "quantity": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["potential_profit"], "60");
        assert_eq!(body["risk_reward_ratio"], "NOT_APPLICABLE");

        let (status, _) = send(
            &app,
            "POST",
            "/simulations",
            Some(json!({"current_price": "0", "target_price": "120", "stop_loss": "90"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_place_order_insufficient_funds() {
        let (app, _) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/orders",
            Some(json!({"symbol": "TCS", "quantity": 100})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"]["reason"], "INSUFFICIENT_FUNDS");
    }

    #[tokio::test]
    async fn test_full_ticket_lifecycle() {
        let (app, _) = create_test_app();
        let id = place(&app, "RELIANCE", 50).await;

        let (status, body) = send(&app, "POST", &format!("/orders/{}/proceed", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["status"], "CONFIRMING");

        let (status, body) = send(&app, "POST", &format!("/orders/{}/confirm", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["status"], "SUBMITTED");
        assert_eq!(body["state"]["confirmation"]["exchange_order_id"], "SIM-1");
        assert_eq!(body["can_cancel"], false);

        let (status, body) = send(&app, "GET", &format!("/orders/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["confirmation"]["executed_price"], "2456.75");
        assert_eq!(decimal(&body["pricing"]["estimated_cost"]), dec!(123003.821975));

        let (_, body) = send(&app, "GET", "/orders", None).await;
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn test_invalid_transitions_conflict() {
        let (app, _) = create_test_app();
        let id = place(&app, "ITC", 1).await;

        // Confirm before proceeding
        let (status, _) = send(&app, "POST", &format!("/orders/{}/confirm", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, "POST", &format!("/orders/{}/cancel", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["status"], "CANCELLED");

        let (status, _) = send(&app, "POST", &format!("/orders/{}/proceed", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_gateway_failure_bad_gateway() {
        let (app, gateway) = create_test_app();
        let id = place(&app, "SBIN", 2).await;
        send(&app, "POST", &format!("/orders/{}/proceed", id), None).await;

        gateway.set_fail_next(true);
        let (status, _) = send(&app, "POST", &format!("/orders/{}/confirm", id), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (_, body) = send(&app, "GET", &format!("/orders/{}", id), None).await;
        assert_eq!(body["state"]["status"], "CONFIRMING");
        assert_eq!(body["can_cancel"], true);
    }

    #[tokio::test]
    async fn test_get_order_not_found() {
        let (app, _) = create_test_app();
        let fake_id = Uuid::now_v7();

        let (status, _) = send(&app, "GET", &format!("/orders/{}", fake_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", &format!("/orders/{}/cancel", fake_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
