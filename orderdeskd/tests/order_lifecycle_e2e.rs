//! E2E test: order tickets driven over HTTP against a running daemon.
//!
//! Flow:
//! 1. Start the daemon API on an OS-assigned port
//! 2. Place an order, proceed, confirm
//! 3. Verify: gateway saw the locked request, events were published
//! 4. Double confirm while the gateway is busy -> exactly one submission

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use orderdesk_domain::{OrderConfirmation, OrderRequest, PricingBreakdown, TicketId};
use orderdesk_exec::{ExecError, OrderGateway, SimulatedGateway};
use orderdeskd::{Config, Daemon, DaemonEvent};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// =============================================================================
// Helpers
// =============================================================================

/// Gateway that remembers every order it was handed.
#[derive(Default)]
struct RecordingGateway {
    seen: Mutex<Vec<(TicketId, String, u64)>>,
}

#[async_trait]
impl OrderGateway for RecordingGateway {
    async fn submit(
        &self,
        ticket_id: TicketId,
        request: &OrderRequest,
        pricing: &PricingBreakdown,
    ) -> Result<OrderConfirmation, ExecError> {
        let mut seen = self.seen.lock().unwrap();
        seen.push((
            ticket_id,
            request.instrument().symbol.to_string(),
            request.quantity().shares(),
        ));

        Ok(OrderConfirmation {
            order_id: ticket_id,
            exchange_order_id: format!("REC-{}", seen.len()),
            symbol: request.instrument().symbol.clone(),
            quantity: request.quantity(),
            order_type: request.order_type(),
            executed_price: request.effective_price(),
            estimated_cost: pricing.estimated_cost(),
            submitted_at: Utc::now(),
        })
    }

    async fn health_check(&self) -> Result<(), ExecError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

async fn start(daemon: &Daemon) -> String {
    let addr = daemon.start_api_server().await.unwrap();
    format!("http://{}", addr)
}

async fn post(client: &reqwest::Client, url: String, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = client.post(url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_order_lifecycle_over_http() {
    let gateway = Arc::new(RecordingGateway::default());
    let daemon = Daemon::with_gateway(Config::test(), gateway.clone()).unwrap();
    let mut events = daemon.event_bus().subscribe();
    let base = start(&daemon).await;
    let client = reqwest::Client::new();

    // Review a limit order before placing it
    let (status, estimate) = post(
        &client,
        format!("{}/orders/estimate", base),
        Some(json!({"symbol": "INFY", "quantity": 20, "order_type": "LIMIT", "limit_price": "1540.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&estimate["pricing"]["total_value"]), dec!(30800));
    assert_eq!(estimate["affordability"]["ok"], true);

    // Place
    let (status, ticket) = post(
        &client,
        format!("{}/orders", base),
        Some(json!({"symbol": "INFY", "quantity": 20, "order_type": "LIMIT", "limit_price": "1540.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["state"]["status"], "REVIEWING");
    let id = ticket["id"].as_str().unwrap().to_string();

    // Proceed, then confirm
    let (status, ticket) = post(&client, format!("{}/orders/{}/proceed", base, id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["state"]["status"], "CONFIRMING");
    assert_eq!(ticket["can_cancel"], true);

    let (status, ticket) = post(&client, format!("{}/orders/{}/confirm", base, id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["state"]["status"], "SUBMITTED");
    assert_eq!(ticket["state"]["confirmation"]["exchange_order_id"], "REC-1");
    assert_eq!(decimal(&ticket["state"]["confirmation"]["executed_price"]), dec!(1540));
    assert_eq!(ticket["can_cancel"], false);

    // Gateway saw the locked request exactly once
    let seen = gateway.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.to_string(), id);
    assert_eq!(seen[0].1, "INFY");
    assert_eq!(seen[0].2, 20);

    // Balance is display-only
    let account: Value = client
        .get(format!("{}/account", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(decimal(&account["available"]), dec!(150000));

    // Events: opened, three transitions, submitted
    let mut names = Vec::new();
    while let Some(Ok(event)) = events.try_recv() {
        names.push(match event {
            DaemonEvent::TicketOpened { .. } => "opened".to_string(),
            DaemonEvent::TicketStateChanged { new_state, .. } => new_state,
            DaemonEvent::OrderSubmitted(_) => "submitted".to_string(),
            DaemonEvent::Shutdown => "shutdown".to_string(),
        });
    }
    assert_eq!(names, vec!["opened", "CONFIRMING", "PROCESSING", "SUBMITTED", "submitted"]);
}

#[tokio::test]
async fn test_double_confirm_submits_once() {
    let gateway = Arc::new(SimulatedGateway::new(Duration::from_millis(200)));
    let daemon = Daemon::with_gateway(Config::test(), gateway.clone()).unwrap();
    let base = start(&daemon).await;
    let client = reqwest::Client::new();

    let (_, ticket) = post(
        &client,
        format!("{}/orders", base),
        Some(json!({"symbol": "SBIN", "quantity": 40})),
    )
    .await;
    let id = ticket["id"].as_str().unwrap().to_string();
    post(&client, format!("{}/orders/{}/proceed", base, id), None).await;

    let first = post(&client, format!("{}/orders/{}/confirm", base, id), None);
    let second = async {
        // Let the first confirm claim the ticket
        tokio::time::sleep(Duration::from_millis(50)).await;
        post(&client, format!("{}/orders/{}/confirm", base, id), None).await
    };
    let ((first_status, first_body), (second_status, _)) = tokio::join!(first, second);

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first_body["state"]["status"], "SUBMITTED");
    assert_eq!(second_status, StatusCode::CONFLICT);
    assert_eq!(gateway.filled_count(), 1);
}

#[tokio::test]
async fn test_cancel_while_processing_conflicts() {
    let gateway = Arc::new(SimulatedGateway::new(Duration::from_millis(200)));
    let daemon = Daemon::with_gateway(Config::test(), gateway).unwrap();
    let base = start(&daemon).await;
    let client = reqwest::Client::new();

    let (_, ticket) = post(
        &client,
        format!("{}/orders", base),
        Some(json!({"symbol": "ITC", "quantity": 1})),
    )
    .await;
    let id = ticket["id"].as_str().unwrap().to_string();
    post(&client, format!("{}/orders/{}/proceed", base, id), None).await;

    let confirm = post(&client, format!("{}/orders/{}/confirm", base, id), None);
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        post(&client, format!("{}/orders/{}/cancel", base, id), None).await
    };
    let ((confirm_status, _), (cancel_status, _)) = tokio::join!(confirm, cancel);

    assert_eq!(confirm_status, StatusCode::OK);
    assert_eq!(cancel_status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_failed_submission_can_be_retried() {
    let gateway = Arc::new(SimulatedGateway::instant());
    let daemon = Daemon::with_gateway(Config::test(), gateway.clone()).unwrap();
    let base = start(&daemon).await;
    let client = reqwest::Client::new();

    let (_, ticket) = post(
        &client,
        format!("{}/orders", base),
        Some(json!({"symbol": "HDFC", "quantity": 5})),
    )
    .await;
    let id = ticket["id"].as_str().unwrap().to_string();
    post(&client, format!("{}/orders/{}/proceed", base, id), None).await;

    gateway.set_fail_next(true);
    let (status, _) = post(&client, format!("{}/orders/{}/confirm", base, id), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let ticket: Value = client
        .get(format!("{}/orders/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ticket["state"]["status"], "CONFIRMING");

    let (status, ticket) = post(&client, format!("{}/orders/{}/confirm", base, id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        decimal(&ticket["state"]["confirmation"]["estimated_cost"]),
        decimal(&ticket["pricing"]["estimated_cost"])
    );
    assert_eq!(gateway.filled_count(), 1);
}

#[tokio::test]
async fn test_configured_balance_is_enforced() {
    let mut config = Config::test();
    config.session.account_balance = dec!(1000);
    let daemon = Daemon::new_stub(config).unwrap();
    let base = start(&daemon).await;
    let client = reqwest::Client::new();

    let (status, body) = post(
        &client,
        format!("{}/orders", base),
        Some(json!({"symbol": "ITC", "quantity": 3})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["reason"], "INSUFFICIENT_FUNDS");
    assert_eq!(decimal(&body["details"]["shortfall"]), dec!(372.1053185));
}
