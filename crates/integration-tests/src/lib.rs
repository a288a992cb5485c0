//! Integration tests for the Bình Vương ERP.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests against the memory store
//! cargo test -p binh-vuong-integration-tests
//!
//! # Including the PostgreSQL tests
//! ADMIN_DATABASE_URL=postgres://... cargo test -p binh-vuong-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `order_lifecycle` - order to shipping note to payment to debt
//! - `permissions` - role and flag gates on the REST surface
//! - `returns` - defect returns and remake orders
//! - `persistence` - rollback on failed commits, reload from the store

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use binh_vuong_admin::config::AdminConfig;
use binh_vuong_admin::db::{MemoryStore, Store};
use binh_vuong_admin::middleware::USER_ID_HEADER;
use binh_vuong_admin::routes;
use binh_vuong_admin::services::{SeedFile, seed};
use binh_vuong_admin::state::AppState;
use binh_vuong_core::types::UserId;

/// Password of the seeded default accounts.
pub const DEFAULT_PASSWORD: &str = "123";

/// The application router over a seeded in-memory store.
pub struct TestApp {
    pub state: AppState,
    pub memory: MemoryStore,
    router: Router,
}

impl TestApp {
    /// Seed the default accounts and customer and build the router.
    ///
    /// # Panics
    ///
    /// Panics if loading or seeding fails.
    pub async fn spawn() -> Self {
        let memory = MemoryStore::new();
        Self::with_store(memory).await
    }

    /// Build over an existing store, seeding whatever is missing.
    ///
    /// # Panics
    ///
    /// Panics if loading or seeding fails.
    pub async fn with_store(memory: MemoryStore) -> Self {
        let state = AppState::load(AdminConfig::default(), Store::Memory(memory.clone()))
            .await
            .expect("Failed to load state");
        seed(&state, SeedFile::defaults(DEFAULT_PASSWORD))
            .await
            .expect("Failed to seed defaults");
        let router = routes::app(state.clone());
        Self {
            state,
            memory,
            router,
        }
    }

    /// Id of a seeded account.
    ///
    /// # Panics
    ///
    /// Panics if the account does not exist.
    pub async fn user_id(&self, username: &str) -> UserId {
        self.state
            .read()
            .await
            .user_by_username(username)
            .map(|u| u.id)
            .expect("Unknown test user")
    }

    /// Send one request and decode the response.
    ///
    /// Non-JSON bodies come back as `Value::String`, empty ones as `Null`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<UserId>,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, user: UserId) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: UserId, body: &Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: UserId, body: &Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: UserId) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(user), None).await
    }
}

/// Order form for `customer_id` with one black row of 50 pairs in size 37.
#[must_use]
pub fn order_body(customer_id: &str, order_code: &str) -> Value {
    serde_json::json!({
        "orderCode": order_code,
        "itemCode": "B0200",
        "customerId": customer_id,
        "gender": "Nữ",
        "orderDate": "2026-01-05",
        "deliveryDate": "2026-02-05",
        "details": [
            { "color": "Đen", "lining": "Da bò", "sizes": { "size37": 50 } }
        ]
    })
}
