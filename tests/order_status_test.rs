mod common;

use axum::http::StatusCode;
use common::{shipping_address, TestApp};
use serde_json::json;
use uuid::Uuid;

async fn create_order(app: &TestApp) -> String {
    let pendant = app.product_id_by_slug("golden-companion-pendant").await;
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
    assert_eq!(status, StatusCode::CREATED);
    body["orderId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn get_order_embeds_decoded_payloads() {
    let app = TestApp::spawn().await;
    let order_id = create_order(&app).await;

    let (status, body) = app.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let order = &body["order"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "unpaid");
    // Shipping address comes back as structured JSON, not a string blob.
    assert_eq!(order["shipping_address"]["city"], "London");

    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_name"], "Golden Companion Pendant");
    assert_eq!(items[0]["unit_price"], "289");
}

#[tokio::test]
async fn unknown_order_is_404() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get(&format!("/api/orders/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn operator_can_walk_the_pipeline() {
    let app = TestApp::spawn().await;
    let order_id = create_order(&app).await;
    let uri = format!("/api/orders/{order_id}");

    for status_value in ["processing", "production", "quality-check", "shipped", "delivered"] {
        let (status, body) = app.patch_json(&uri, &json!({ "status": status_value })).await;
        assert_eq!(status, StatusCode::OK, "setting {status_value}");
        assert_eq!(body["order"]["status"], status_value);
    }
}

#[tokio::test]
async fn tracking_number_update_keeps_status() {
    let app = TestApp::spawn().await;
    let order_id = create_order(&app).await;

    let (status, body) = app
        .patch_json(
            &format!("/api/orders/{order_id}"),
            &json!({ "trackingNumber": "1Z999AA10123456784" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["tracking_number"], "1Z999AA10123456784");
    assert_eq!(body["order"]["status"], "pending");
}

#[tokio::test]
async fn out_of_allow_list_status_is_rejected_and_order_unchanged() {
    let app = TestApp::spawn().await;
    let order_id = create_order(&app).await;
    let uri = format!("/api/orders/{order_id}");

    for bad in ["pending", "on-hold", "SHIPPED", "refunded"] {
        let (status, _) = app.patch_json(&uri, &json!({ "status": bad })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "status {bad}");
    }

    // Even alongside a valid tracking number, a bad status blocks the write.
    let (status, _) = app
        .patch_json(&uri, &json!({ "status": "bogus", "trackingNumber": "TN1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&uri).await;
    assert_eq!(body["order"]["status"], "pending");
    assert!(body["order"]["tracking_number"].is_null());
}

#[tokio::test]
async fn cancel_refused_once_shipped() {
    let app = TestApp::spawn().await;
    let order_id = create_order(&app).await;
    let uri = format!("/api/orders/{order_id}");

    let (status, _) = app.patch_json(&uri, &json!({ "status": "shipped" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.patch_json(&uri, &json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("cannot cancel"));

    let (_, body) = app.get(&uri).await;
    assert_eq!(body["order"]["status"], "shipped");
}

#[tokio::test]
async fn cancel_allowed_before_shipment() {
    let app = TestApp::spawn().await;
    let order_id = create_order(&app).await;
    let uri = format!("/api/orders/{order_id}");

    let (status, _) = app.patch_json(&uri, &json!({ "status": "production" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.patch_json(&uri, &json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "cancelled");
}
