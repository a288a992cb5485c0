//! The application-state container.
//!
//! [`FactoryState`] holds every collection. It is never mutated in place by
//! callers: [`FactoryState::apply`](crate::action) computes a new snapshot
//! plus the list of record [`Change`]s a persistence layer must commit.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customer::Customer;
use crate::order::ProductionOrder;
use crate::product_model::ProductModel;
use crate::remake::ReturnLog;
use crate::shipping::{Payment, ShippingNote};
use crate::types::{CustomerId, ModelId, OrderId, PaymentId, ShippingNoteId, UserId};
use crate::user::{CredentialVerifier, User, UserCredential};

/// A persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Orders,
    Returns,
    ShippingNotes,
    Payments,
    Customers,
    Models,
    Users,
    Credentials,
}

impl Collection {
    pub const ALL: [Self; 8] = [
        Self::Orders,
        Self::Returns,
        Self::ShippingNotes,
        Self::Payments,
        Self::Customers,
        Self::Models,
        Self::Users,
        Self::Credentials,
    ];

    /// Storage name of the collection.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Returns => "returns",
            Self::ShippingNotes => "shipping_notes",
            Self::Payments => "payments",
            Self::Customers => "customers",
            Self::Models => "product_models",
            Self::Users => "users",
            Self::Credentials => "user_credentials",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One record of any collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Order(ProductionOrder),
    Return(ReturnLog),
    ShippingNote(ShippingNote),
    Payment(Payment),
    Customer(Customer),
    Model(ProductModel),
    User(User),
    Credential(UserCredential),
}

impl Record {
    #[must_use]
    pub const fn collection(&self) -> Collection {
        match self {
            Self::Order(_) => Collection::Orders,
            Self::Return(_) => Collection::Returns,
            Self::ShippingNote(_) => Collection::ShippingNotes,
            Self::Payment(_) => Collection::Payments,
            Self::Customer(_) => Collection::Customers,
            Self::Model(_) => Collection::Models,
            Self::User(_) => Collection::Users,
            Self::Credential(_) => Collection::Credentials,
        }
    }

    /// Primary key of the record.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Order(r) => r.id.as_uuid(),
            Self::Return(r) => r.id.as_uuid(),
            Self::ShippingNote(r) => r.id.as_uuid(),
            Self::Payment(r) => r.id.as_uuid(),
            Self::Customer(r) => r.id.as_uuid(),
            Self::Model(r) => r.id.as_uuid(),
            Self::User(r) => r.id.as_uuid(),
            Self::Credential(r) => r.user_id.as_uuid(),
        }
    }

    /// JSON document stored for the record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Order(r) => serde_json::to_value(r),
            Self::Return(r) => serde_json::to_value(r),
            Self::ShippingNote(r) => serde_json::to_value(r),
            Self::Payment(r) => serde_json::to_value(r),
            Self::Customer(r) => serde_json::to_value(r),
            Self::Model(r) => serde_json::to_value(r),
            Self::User(r) => serde_json::to_value(r),
            Self::Credential(r) => serde_json::to_value(r),
        }
    }

    /// Decode a stored document of `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not match the collection's type.
    pub fn from_json(
        collection: Collection,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match collection {
            Collection::Orders => Self::Order(serde_json::from_value(value)?),
            Collection::Returns => Self::Return(serde_json::from_value(value)?),
            Collection::ShippingNotes => Self::ShippingNote(serde_json::from_value(value)?),
            Collection::Payments => Self::Payment(serde_json::from_value(value)?),
            Collection::Customers => Self::Customer(serde_json::from_value(value)?),
            Collection::Models => Self::Model(serde_json::from_value(value)?),
            Collection::Users => Self::User(serde_json::from_value(value)?),
            Collection::Credentials => Self::Credential(serde_json::from_value(value)?),
        })
    }
}

/// A single record write produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Create(Record),
    Update(Record),
    Delete { collection: Collection, id: Uuid },
}

impl Change {
    #[must_use]
    pub const fn collection(&self) -> Collection {
        match self {
            Self::Create(r) | Self::Update(r) => r.collection(),
            Self::Delete { collection, .. } => *collection,
        }
    }
}

/// Result of applying an action: the new snapshot and what changed.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: FactoryState,
    pub changes: Vec<Change>,
}

/// Every collection of the application, newest record first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryState {
    pub orders: Vec<ProductionOrder>,
    pub returns: Vec<ReturnLog>,
    pub shipping_notes: Vec<ShippingNote>,
    pub payments: Vec<Payment>,
    pub customers: Vec<Customer>,
    pub models: Vec<ProductModel>,
    pub users: Vec<User>,
    pub credentials: Vec<UserCredential>,
}

impl FactoryState {
    /// Build a snapshot from loaded records, in load order.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut state = Self::default();
        for record in records {
            state.push(record);
        }
        state
    }

    fn push(&mut self, record: Record) {
        match record {
            Record::Order(r) => self.orders.push(r),
            Record::Return(r) => self.returns.push(r),
            Record::ShippingNote(r) => self.shipping_notes.push(r),
            Record::Payment(r) => self.payments.push(r),
            Record::Customer(r) => self.customers.push(r),
            Record::Model(r) => self.models.push(r),
            Record::User(r) => self.users.push(r),
            Record::Credential(r) => self.credentials.push(r),
        }
    }

    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<&ProductionOrder> {
        self.orders.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn model(&self, id: ModelId) -> Option<&ProductModel> {
        self.models.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn shipping_note(&self, id: ShippingNoteId) -> Option<&ShippingNote> {
        self.shipping_notes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    #[must_use]
    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Non-cancelled orders of one customer, by `sort_order`.
    #[must_use]
    pub fn customer_orders(&self, id: CustomerId) -> Vec<&ProductionOrder> {
        let mut orders: Vec<_> = self
            .orders
            .iter()
            .filter(|o| o.customer_id == id && !o.is_cancelled())
            .collect();
        orders.sort_by_key(|o| o.sort_order);
        orders
    }

    /// Check `password` for `username`.
    pub fn authenticate<V: CredentialVerifier + ?Sized>(
        &self,
        username: &str,
        password: &str,
        verifier: &V,
    ) -> Option<&User> {
        let user = self.user_by_username(username)?;
        let credential = self.credentials.iter().find(|c| c.user_id == user.id)?;
        verifier
            .verify(password, &credential.password_hash)
            .then_some(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::order::tests::sample_order;

    struct PlainVerifier;

    impl CredentialVerifier for PlainVerifier {
        fn hash(&self, password: &str) -> Result<String, String> {
            Ok(format!("plain:{password}"))
        }

        fn verify(&self, password: &str, stored_hash: &str) -> bool {
            stored_hash == format!("plain:{password}")
        }
    }

    #[test]
    fn test_record_json_round_trip_keeps_collection() {
        let order = sample_order();
        let record = Record::Order(order.clone());
        let json = record.to_json().unwrap();
        let decoded = Record::from_json(Collection::Orders, json).unwrap();
        assert_eq!(decoded, Record::Order(order.clone()));
        assert_eq!(decoded.id(), order.id.as_uuid());
        assert_eq!(decoded.collection().name(), "orders");
    }

    #[test]
    fn test_from_records_keeps_load_order() {
        let first = sample_order();
        let second = sample_order();
        let rebuilt = FactoryState::from_records([
            Record::Order(first.clone()),
            Record::Order(second.clone()),
        ]);
        assert_eq!(rebuilt.orders, vec![first, second]);
    }

    #[test]
    fn test_customer_orders_sorted_without_cancelled() {
        let mut orders: Vec<_> = (0..3).map(|_| sample_order()).collect();
        let customer_id = orders[0].customer_id;
        orders[1].customer_id = customer_id;
        orders[0].sort_order = 5;
        orders[1].sort_order = 2;
        orders[2].status = crate::types::OrderStatus::Cancelled;
        orders[2].customer_id = customer_id;
        let state = FactoryState {
            orders: orders.clone(),
            ..FactoryState::default()
        };

        let listed: Vec<_> = state.customer_orders(customer_id).iter().map(|o| o.id).collect();
        assert_eq!(listed, vec![orders[1].id, orders[0].id]);
    }

    #[test]
    fn test_authenticate() {
        let user = crate::permission::tests::user(crate::types::UserRole::Admin);
        let state = FactoryState {
            credentials: vec![UserCredential {
                user_id: user.id,
                password_hash: PlainVerifier.hash("123").unwrap(),
            }],
            users: vec![user.clone()],
            ..FactoryState::default()
        };
        assert_eq!(
            state.authenticate(&user.username, "123", &PlainVerifier),
            Some(&user)
        );
        assert!(state.authenticate(&user.username, "x", &PlainVerifier).is_none());
        assert!(state.authenticate("nobody", "123", &PlainVerifier).is_none());
    }
}
