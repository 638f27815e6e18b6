mod common;

use atelier_api::entities::{order, product_variant, Order, ProductVariant};
use axum::http::StatusCode;
use common::{shipping_address, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

async fn order_count(app: &TestApp) -> u64 {
    Order::find().count(app.db.as_ref()).await.unwrap()
}

#[tokio::test]
async fn checkout_freezes_prices_and_returns_client_secret() {
    let app = TestApp::spawn().await;
    let pendant = app.product_id_by_slug("golden-companion-pendant").await;
    let diamond = app.inlay_id_by_name("Diamond").await;

    let (status, body) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{
                    "productId": pendant,
                    "quantity": 1,
                    "customization": { "inlay": diamond, "engraving": "REX" }
                }],
                "customerEmail": "ada@example.com",
                "shippingAddress": shipping_address()
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    // 289 base + 150 diamond = 439, free shipping, 10% tax.
    assert_eq!(body["totalAmount"], "482.90");
    assert_eq!(body["currency"], "USD");
    assert!(body["clientSecret"].as_str().unwrap().contains("_secret_"));
    assert!(body["estimatedDelivery"].is_string());

    let order_id = Uuid::parse_str(body["orderId"].as_str().unwrap()).unwrap();
    let saved = Order::find_by_id(order_id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .expect("order persisted");
    // Compared as values: SQLite drops trailing zeros from the stored scale.
    assert_eq!(saved.subtotal, dec!(439));
    assert_eq!(saved.shipping_amount, dec!(0));
    assert_eq!(saved.tax_amount, dec!(43.90));
    assert_eq!(saved.total_amount, dec!(482.90));
    assert_eq!(saved.status, order::FulfillmentStatus::Pending);
    assert_eq!(saved.payment_status, order::PaymentStatus::Unpaid);
    assert!(saved.payment_intent_id.is_some());
    assert!(saved.estimated_delivery.is_none());

    // The gateway was asked for the total in minor units.
    let requests = app.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount_minor, 48290);
    assert_eq!(requests[0].currency, "usd");
    assert_eq!(requests[0].order_id, order_id);
}

#[tokio::test]
async fn variant_delta_applies_below_free_shipping() {
    let app = TestApp::spawn().await;
    let bracelet = app.product_id_by_slug("silver-paw-bracelet").await;
    let small = ProductVariant::find()
        .filter(product_variant::Column::ProductId.eq(bracelet))
        .filter(product_variant::Column::Name.eq("S"))
        .one(app.db.as_ref())
        .await
        .unwrap()
        .expect("seeded variant");

    let (status, body) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{ "productId": bracelet, "variantId": small.id, "quantity": 1 }],
                "customerEmail": "ada@example.com",
                "shippingAddress": shipping_address()
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    // 199 - 10 = 189 subtotal, flat 25 shipping, 18.90 tax.
    assert_eq!(body["totalAmount"], "232.90");

    let order_id = Uuid::parse_str(body["orderId"].as_str().unwrap()).unwrap();
    let saved = Order::find_by_id(order_id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.shipping_amount, dec!(25));
}

#[tokio::test]
async fn unknown_product_creates_no_order() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{ "productId": Uuid::new_v4(), "quantity": 1 }],
                "customerEmail": "ada@example.com",
                "shippingAddress": shipping_address()
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(order_count(&app).await, 0);
    assert!(app.gateway.requests().is_empty());
}

#[tokio::test]
async fn foreign_variant_is_rejected() {
    let app = TestApp::spawn().await;
    let pendant = app.product_id_by_slug("golden-companion-pendant").await;

    let (status, _) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{ "productId": pendant, "variantId": Uuid::new_v4() }],
                "customerEmail": "ada@example.com",
                "shippingAddress": shipping_address()
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(order_count(&app).await, 0);
}

#[tokio::test]
async fn missing_items_email_or_address_rejected() {
    let app = TestApp::spawn().await;
    let pendant = app.product_id_by_slug("golden-companion-pendant").await;

    let (status, body) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [],
                "customerEmail": "ada@example.com",
                "shippingAddress": shipping_address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid input: No items provided");

    let (status, _) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{ "productId": pendant }],
                "customerEmail": "",
                "shippingAddress": shipping_address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{ "productId": pendant }],
                "customerEmail": "ada@example.com"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(order_count(&app).await, 0);
}

#[tokio::test]
async fn absent_keys_rejected_like_empty_ones() {
    let app = TestApp::spawn().await;
    let pendant = app.product_id_by_slug("golden-companion-pendant").await;

    // No customerEmail key at all.
    let (status, body) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{ "productId": pendant }],
                "shippingAddress": shipping_address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    // No items key at all.
    let (status, body) = app
        .post_json(
            "/api/checkout",
            &json!({
                "customerEmail": "ada@example.com",
                "shippingAddress": shipping_address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid input: No items provided");

    assert_eq!(order_count(&app).await, 0);
}

#[tokio::test]
async fn gateway_failure_leaves_unpaid_order_behind() {
    let app = TestApp::spawn().await;
    let pendant = app.product_id_by_slug("golden-companion-pendant").await;
    app.gateway.set_fail(true);

    let (status, body) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{ "productId": pendant }],
                "customerEmail": "ada@example.com",
                "shippingAddress": shipping_address()
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    // Upstream detail never reaches the client.
    assert_eq!(body["message"], "Upstream service error");

    // No rollback: the pending order survives without an intent reference.
    let orphans = Order::find().all(app.db.as_ref()).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].status, order::FulfillmentStatus::Pending);
    assert_eq!(orphans[0].payment_status, order::PaymentStatus::Unpaid);
    assert!(orphans[0].payment_intent_id.is_none());
}

#[tokio::test]
async fn quantity_defaults_to_one_and_scales() {
    let app = TestApp::spawn().await;
    let ring = app.product_id_by_slug("loyal-friend-ring").await;

    let (status, body) = app
        .post_json(
            "/api/checkout",
            &json!({
                "items": [{ "productId": ring, "quantity": 2 }],
                "customerEmail": "ada@example.com",
                "shippingAddress": shipping_address(),
                "currency": "EUR"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    // 249 x 2 = 498 subtotal, free shipping, 49.80 tax.
    assert_eq!(body["totalAmount"], "547.80");
    assert_eq!(body["currency"], "EUR");
    assert_eq!(app.gateway.requests()[0].currency, "eur");
}
