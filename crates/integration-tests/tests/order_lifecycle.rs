//! End-to-end flow: order, stages, shipping note, payment, debt.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use binh_vuong_core::stage::Stage;
use binh_vuong_integration_tests::{TestApp, order_body};

async fn customer_id(app: &TestApp, admin: binh_vuong_core::types::UserId) -> String {
    let (status, customers) = app.get("/api/customers", admin).await;
    assert_eq!(status, StatusCode::OK);
    customers[0]["id"].as_str().unwrap().to_string()
}

async fn finish_all_stages(app: &TestApp, user: binh_vuong_core::types::UserId, order_id: &str) {
    for stage in Stage::ALL {
        let (status, _) = app
            .post(
                &format!("/api/orders/{order_id}/stages/{}", stage.slug()),
                user,
                &json!({ "status": "done" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "stage {stage}");
    }
}

#[tokio::test]
async fn test_order_to_debt_flow() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let xuong = app.user_id("xuong").await;
    let customer = customer_id(&app, admin).await;

    let (status, order) = app
        .post("/api/orders", admin, &order_body(&customer, "BV-001"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["totalQuantity"], 50);
    assert_eq!(order["customerName"], "LA CAMIE");
    assert_eq!(order["stages"].as_array().unwrap().len(), 7);
    let order_id = order["id"].as_str().unwrap().to_string();

    // Not shippable while production is unfinished
    let (status, _) = app
        .get(&format!("/api/orders/{order_id}/shipping-draft"), admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The production floor moves stages
    finish_all_stages(&app, xuong, &order_id).await;

    let (_, pending) = app.get("/api/orders/pending-shipment", admin).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, mut draft) = app
        .get(
            &format!("/api/orders/{order_id}/shipping-draft?date=2026-02-01"),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["details"][0]["unitPrice"], 0.0);
    draft["details"][0]["unitPrice"] = json!(200_000);
    draft["depositAmount"] = json!(2_000_000);

    let (status, note) = app.post("/api/shipping", admin, &draft).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["totalAmount"].as_f64(), Some(10_000_000.0));
    assert_eq!(note["balanceAmount"].as_f64(), Some(8_000_000.0));

    let (_, pending) = app.get("/api/orders/pending-shipment", admin).await;
    assert!(pending.as_array().unwrap().is_empty());

    let (status, _) = app
        .post(
            "/api/payments",
            admin,
            &json!({
                "customerId": customer,
                "amount": 3_000_000,
                "date": "2026-02-10",
                "method": "cash"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, debt) = app
        .get(&format!("/api/customers/{customer}/debt"), admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(debt["totalReceivables"].as_f64(), Some(8_000_000.0));
    assert_eq!(debt["totalPaid"].as_f64(), Some(3_000_000.0));
    assert_eq!(debt["currentDebt"].as_f64(), Some(5_000_000.0));
    assert_eq!(debt["isOverLimit"], false);
    assert_eq!(debt["aging"].as_array().unwrap().len(), 1);

    let (status, summary) = app.get("/api/dashboard", admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["completed"], 1);
    assert_eq!(summary["pendingShipping"], 0);
    assert_eq!(summary["remainingDebt"].as_f64(), Some(5_000_000.0));
}

#[tokio::test]
async fn test_shipping_edit_requires_reason_and_logs_it() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let customer = customer_id(&app, admin).await;

    let (_, order) = app
        .post("/api/orders", admin, &order_body(&customer, "BV-002"))
        .await;
    let order_id = order["id"].as_str().unwrap().to_string();
    finish_all_stages(&app, admin, &order_id).await;

    let (_, draft) = app
        .get(&format!("/api/orders/{order_id}/shipping-draft"), admin)
        .await;
    let (_, note) = app.post("/api/shipping", admin, &draft).await;
    let note_id = note["id"].as_str().unwrap().to_string();

    let mut form = draft.clone();
    form["details"][0]["unitPrice"] = json!(150_000);

    let (status, _) = app
        .put(
            &format!("/api/shipping/{note_id}"),
            admin,
            &json!({ "form": form, "reason": "  " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, edited) = app
        .put(
            &format!("/api/shipping/{note_id}"),
            admin,
            &json!({ "form": form, "reason": "Khách báo giá mới" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["totalAmount"].as_f64(), Some(7_500_000.0));
    let history = edited["editHistory"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["reason"], "Khách báo giá mới");

    // Deleting needs confirmation
    let (status, _) = app.delete(&format!("/api/shipping/{note_id}"), admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .delete(&format!("/api/shipping/{note_id}?confirm=true"), admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, notes) = app.get("/api/shipping", admin).await;
    assert_eq!(notes, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_status_change_locks_stages() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let customer = customer_id(&app, admin).await;

    let (_, order) = app
        .post("/api/orders", admin, &order_body(&customer, "BV-003"))
        .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            &format!("/api/orders/{order_id}/status"),
            admin,
            &json!({ "status": "suspended" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, suspended) = app
        .post(
            &format!("/api/orders/{order_id}/status"),
            admin,
            &json!({ "status": "suspended", "reason": "Chờ da" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(suspended["statusHistory"][0]["reason"], "Chờ da");

    let (status, _) = app
        .post(
            &format!("/api/orders/{order_id}/stages/chat"),
            admin,
            &json!({ "status": "in_progress" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_gender_switch_needs_confirmation() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let customer = customer_id(&app, admin).await;

    let (_, order) = app
        .post("/api/orders", admin, &order_body(&customer, "BV-004"))
        .await;
    let order_id = order["id"].as_str().unwrap().to_string();
    let uri = format!("/api/orders/{order_id}/gender");

    let (status, _) = app.post(&uri, admin, &json!({ "gender": "Nam" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, switched) = app
        .post(&uri, admin, &json!({ "gender": "Nam", "confirm": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(switched["gender"], "Nam");
    assert_eq!(switched["totalQuantity"], 0);

    let row_id = switched["details"][0]["id"].as_str().unwrap();
    let (status, sized) = app
        .post(
            &format!("/api/orders/{order_id}/sizes"),
            admin,
            &json!({ "rowId": row_id, "size": 41, "quantity": 12 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sized["totalQuantity"], 12);
}

#[tokio::test]
async fn test_production_report_counts_recent_orders() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let customer = customer_id(&app, admin).await;

    let mut body = order_body(&customer, "BV-005");
    let today = chrono::Utc::now().date_naive();
    body["orderDate"] = json!(today.to_string());
    app.post("/api/orders", admin, &body).await;

    let (status, report) = app
        .get("/api/reports/production?range=7days", admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["totalQuantity"], 50);
    assert_eq!(report["topCustomers"][0]["name"], "LA CAMIE");

    let (_, empty) = app
        .get(
            "/api/reports/production?range=custom&start=2020-01-01&end=2020-01-31",
            admin,
        )
        .await;
    assert_eq!(empty["totalQuantity"], 0);
}

#[tokio::test]
async fn test_cancelled_finished_order_counts_as_pending_everywhere() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let customer = customer_id(&app, admin).await;

    let (_, order) = app
        .post("/api/orders", admin, &order_body(&customer, "BV-006"))
        .await;
    let order_id = order["id"].as_str().unwrap().to_string();
    finish_all_stages(&app, admin, &order_id).await;

    let (status, _) = app
        .post(
            &format!("/api/orders/{order_id}/status"),
            admin,
            &json!({ "status": "cancelled", "reason": "Khách hủy" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, summary) = app.get("/api/dashboard", admin).await;
    let (status, pending) = app.get("/api/orders/pending-shipment", admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(summary["pendingShipping"], 1);
}

#[tokio::test]
async fn test_oversized_unit_price_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let customer = customer_id(&app, admin).await;

    let (_, order) = app
        .post("/api/orders", admin, &order_body(&customer, "BV-007"))
        .await;
    let order_id = order["id"].as_str().unwrap().to_string();
    finish_all_stages(&app, admin, &order_id).await;

    let (_, mut draft) = app
        .get(&format!("/api/orders/{order_id}/shipping-draft"), admin)
        .await;
    draft["details"][0]["unitPrice"] = json!(1e28);

    let (status, _) = app.post("/api/shipping", admin, &draft).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, notes) = app.get("/api/shipping", admin).await;
    assert_eq!(notes, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_customer_orders_reorder_in_place() {
    let app = TestApp::spawn().await;
    let admin = app.user_id("admin").await;
    let kythuat = app.user_id("kythuat").await;
    let customer = customer_id(&app, admin).await;

    let mut ids = Vec::new();
    for code in ["BV-010", "BV-011"] {
        let (_, order) = app
            .post("/api/orders", admin, &order_body(&customer, code))
            .await;
        ids.push(order["id"].as_str().unwrap().to_string());
    }
    let uri = format!("/api/customers/{customer}/orders");

    let (status, _) = app
        .post(
            &format!("{uri}/reorder"),
            kythuat,
            &json!({ "ids": [ids[1], ids[0]] }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Every order of the customer must be listed
    let (status, _) = app
        .post(&format!("{uri}/reorder"), admin, &json!({ "ids": [ids[1]] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, result) = app
        .post(
            &format!("{uri}/reorder"),
            admin,
            &json!({ "ids": [ids[1], ids[0]] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["updated"], 2);

    let (status, orders) = app.get(&uri, admin).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<&str> = orders
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap())
        .collect();
    assert_eq!(listed, [ids[1].as_str(), ids[0].as_str()]);
}
