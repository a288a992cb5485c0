//! Mutations of [`FactoryState`] as a pure `(state, action) -> state` function.
//!
//! [`FactoryState::apply`] never touches `self`. It validates the action
//! against the actor and the current snapshot, builds the next snapshot, and
//! lists the record writes needed to persist it. Callers install the new
//! snapshot only after those writes succeed.

use chrono::{DateTime, Utc};

use crate::customer::CustomerForm;
use crate::error::DomainError;
use crate::order::{Bom, OrderForm, ProductionOrder};
use crate::permission::{Capability, check_user_deletion, require};
use crate::product_model::{ModelForm, ProductModel};
use crate::remake::{ReturnForm, create_remake};
use crate::rules;
use crate::shipping::{PaymentForm, ShippingForm};
use crate::stage::{Stage, initial_stages};
use crate::state::{Change, Collection, FactoryState, Record, Transition};
use crate::types::{
    CustomerId, DetailRowId, Gender, ModelId, OrderId, OrderStatus, PaymentId, ShippingNoteId,
    StageStatus, UserId,
};
use crate::user::{User, UserCredential, UserForm, UserPermissions};

/// Every mutation the application supports.
#[derive(Debug, Clone)]
pub enum Action {
    CreateOrder {
        form: OrderForm,
    },
    UpdateOrder {
        id: OrderId,
        form: OrderForm,
    },
    DeleteOrder {
        id: OrderId,
        confirmed: bool,
    },
    ReorderOrders {
        visible: Vec<OrderId>,
    },
    /// Reorders one customer's orders without moving anyone else's.
    ReorderCustomerOrders {
        customer_id: CustomerId,
        visible: Vec<OrderId>,
    },
    TransitionStage {
        order_id: OrderId,
        stage: Stage,
        status: StageStatus,
    },
    ChangeGender {
        order_id: OrderId,
        gender: Gender,
        confirmed: bool,
    },
    SetSizeQuantity {
        order_id: OrderId,
        row_id: DetailRowId,
        size: u8,
        quantity: u32,
    },
    ChangeOrderStatus {
        order_id: OrderId,
        status: OrderStatus,
        reason: String,
    },
    /// Records the return and spawns its remake order.
    RecordReturn {
        form: ReturnForm,
    },
    CreateShippingNote {
        form: ShippingForm,
    },
    UpdateShippingNote {
        id: ShippingNoteId,
        form: ShippingForm,
        reason: String,
    },
    DeleteShippingNote {
        id: ShippingNoteId,
        confirmed: bool,
    },
    RecordPayment {
        form: PaymentForm,
    },
    DeletePayment {
        id: PaymentId,
        confirmed: bool,
    },
    CreateCustomer {
        form: CustomerForm,
    },
    /// Renames propagate to every order and shipping note of the customer.
    UpdateCustomer {
        id: CustomerId,
        form: CustomerForm,
    },
    CreateModel {
        form: ModelForm,
    },
    UpdateModel {
        id: ModelId,
        form: ModelForm,
    },
    ArchiveModel {
        id: ModelId,
    },
    RestoreModel {
        id: ModelId,
    },
    DeleteModel {
        id: ModelId,
        confirmed: bool,
    },
    /// `password_hash` is produced by a [`CredentialVerifier`](crate::user::CredentialVerifier).
    CreateUser {
        form: UserForm,
        password_hash: String,
    },
    UpdateUser {
        id: UserId,
        form: UserForm,
        password_hash: Option<String>,
    },
    DeleteUser {
        id: UserId,
    },
}

impl Action {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateOrder { .. } => "create_order",
            Self::UpdateOrder { .. } => "update_order",
            Self::DeleteOrder { .. } => "delete_order",
            Self::ReorderOrders { .. } => "reorder_orders",
            Self::ReorderCustomerOrders { .. } => "reorder_customer_orders",
            Self::TransitionStage { .. } => "transition_stage",
            Self::ChangeGender { .. } => "change_gender",
            Self::SetSizeQuantity { .. } => "set_size_quantity",
            Self::ChangeOrderStatus { .. } => "change_order_status",
            Self::RecordReturn { .. } => "record_return",
            Self::CreateShippingNote { .. } => "create_shipping_note",
            Self::UpdateShippingNote { .. } => "update_shipping_note",
            Self::DeleteShippingNote { .. } => "delete_shipping_note",
            Self::RecordPayment { .. } => "record_payment",
            Self::DeletePayment { .. } => "delete_payment",
            Self::CreateCustomer { .. } => "create_customer",
            Self::UpdateCustomer { .. } => "update_customer",
            Self::CreateModel { .. } => "create_model",
            Self::UpdateModel { .. } => "update_model",
            Self::ArchiveModel { .. } => "archive_model",
            Self::RestoreModel { .. } => "restore_model",
            Self::DeleteModel { .. } => "delete_model",
            Self::CreateUser { .. } => "create_user",
            Self::UpdateUser { .. } => "update_user",
            Self::DeleteUser { .. } => "delete_user",
        }
    }
}

impl FactoryState {
    /// Compute the result of `action` performed by `actor` at `now`.
    ///
    /// # Errors
    ///
    /// Returns the first validation or permission failure. Nothing is
    /// changed in that case.
    pub fn apply(
        &self,
        actor: &User,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        let mut next = self.clone();
        let changes = next.apply_in_place(actor, action, now)?;
        Ok(Transition {
            state: next,
            changes,
        })
    }

    #[allow(clippy::too_many_lines)]
    fn apply_in_place(
        &mut self,
        actor: &User,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<Vec<Change>, DomainError> {
        match action {
            Action::CreateOrder { form } => {
                require(actor, Capability::CreateOrder)?;
                let order = self.new_order(form, now)?;
                self.orders.insert(0, order.clone());
                Ok(vec![Change::Create(Record::Order(order))])
            }
            Action::UpdateOrder { id, form } => {
                require(actor, Capability::EditOrder)?;
                let form = self.resolve_model(form)?;
                let customer_id = form.validate()?;
                let customer_name = self.customer_name(customer_id)?;
                let order = self.order_mut(id)?;
                form.apply_to(order)?;
                order.customer_id = customer_id;
                order.customer_name = customer_name;
                Ok(vec![Change::Update(Record::Order(order.clone()))])
            }
            Action::DeleteOrder { id, confirmed } => {
                rules::check_delete(actor, Capability::DeleteOrder, confirmed)?;
                self.order_mut(id)?;
                self.orders.retain(|o| o.id != id);
                Ok(vec![delete(Collection::Orders, id.as_uuid())])
            }
            Action::ReorderOrders { visible } => {
                self.orders = rules::reorder(&self.orders, actor, &visible)?;
                Ok(self
                    .orders
                    .iter()
                    .filter(|o| !o.is_cancelled())
                    .map(|o| Change::Update(Record::Order(o.clone())))
                    .collect())
            }
            Action::ReorderCustomerOrders {
                customer_id,
                visible,
            } => {
                let changed =
                    rules::reorder_customer(&mut self.orders, actor, customer_id, &visible)?;
                if self.customer(customer_id).is_none() {
                    return Err(DomainError::not_found("customer", customer_id));
                }
                Ok(changed
                    .into_iter()
                    .filter_map(|id| self.order(id))
                    .map(|o| Change::Update(Record::Order(o.clone())))
                    .collect())
            }
            Action::TransitionStage {
                order_id,
                stage,
                status,
            } => {
                let order = self.order_mut(order_id)?;
                rules::transition_stage(order, actor, stage, status, now)?;
                Ok(vec![Change::Update(Record::Order(order.clone()))])
            }
            Action::ChangeGender {
                order_id,
                gender,
                confirmed,
            } => {
                let order = self.order_mut(order_id)?;
                rules::change_gender(order, actor, gender, confirmed)?;
                Ok(vec![Change::Update(Record::Order(order.clone()))])
            }
            Action::SetSizeQuantity {
                order_id,
                row_id,
                size,
                quantity,
            } => {
                let order = self.order_mut(order_id)?;
                rules::set_size_quantity(order, actor, row_id, size, quantity)?;
                Ok(vec![Change::Update(Record::Order(order.clone()))])
            }
            Action::ChangeOrderStatus {
                order_id,
                status,
                reason,
            } => {
                let order = self.order_mut(order_id)?;
                rules::change_status(order, actor, status, &reason, now)?;
                Ok(vec![Change::Update(Record::Order(order.clone()))])
            }
            Action::RecordReturn { form } => {
                require(actor, Capability::RecordReturn)?;
                let ret = form.into_log(now)?;
                let original = self
                    .order(ret.original_order_id)
                    .ok_or_else(|| DomainError::not_found("order", ret.original_order_id))?;
                let remake = create_remake(original, &ret, self.next_sort_order(), now)?;
                self.returns.insert(0, ret.clone());
                self.orders.insert(0, remake.clone());
                Ok(vec![
                    Change::Create(Record::Return(ret)),
                    Change::Create(Record::Order(remake)),
                ])
            }
            Action::CreateShippingNote { form } => {
                require(actor, Capability::ManageShipping)?;
                let order = self
                    .order(form.order_id)
                    .ok_or_else(|| DomainError::not_found("order", form.order_id))?;
                let note = form.into_note(order, now)?;
                self.shipping_notes.insert(0, note.clone());
                Ok(vec![Change::Create(Record::ShippingNote(note))])
            }
            Action::UpdateShippingNote { id, form, reason } => {
                require(actor, Capability::ManageShipping)?;
                let note = self
                    .shipping_notes
                    .iter_mut()
                    .find(|n| n.id == id)
                    .ok_or_else(|| DomainError::not_found("shipping note", id))?;
                form.apply_edit(note, &reason, &actor.full_name, now)?;
                Ok(vec![Change::Update(Record::ShippingNote(note.clone()))])
            }
            Action::DeleteShippingNote { id, confirmed } => {
                rules::check_delete(actor, Capability::DeleteShippingNote, confirmed)?;
                if self.shipping_note(id).is_none() {
                    return Err(DomainError::not_found("shipping note", id));
                }
                self.shipping_notes.retain(|n| n.id != id);
                Ok(vec![delete(Collection::ShippingNotes, id.as_uuid())])
            }
            Action::RecordPayment { form } => {
                require(actor, Capability::RecordPayment)?;
                if self.customer(form.customer_id).is_none() {
                    return Err(DomainError::not_found("customer", form.customer_id));
                }
                let payment = form.into_payment(&actor.full_name)?;
                self.payments.insert(0, payment.clone());
                Ok(vec![Change::Create(Record::Payment(payment))])
            }
            Action::DeletePayment { id, confirmed } => {
                rules::check_delete(actor, Capability::DeletePayment, confirmed)?;
                if self.payment(id).is_none() {
                    return Err(DomainError::not_found("payment", id));
                }
                self.payments.retain(|p| p.id != id);
                Ok(vec![delete(Collection::Payments, id.as_uuid())])
            }
            Action::CreateCustomer { form } => {
                require(actor, Capability::ManageCustomers)?;
                let customer = form.into_customer(now)?;
                self.customers.insert(0, customer.clone());
                Ok(vec![Change::Create(Record::Customer(customer))])
            }
            Action::UpdateCustomer { id, form } => {
                require(actor, Capability::ManageCustomers)?;
                let customer = self
                    .customers
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| DomainError::not_found("customer", id))?;
                form.apply_to(customer)?;
                let customer = customer.clone();
                let mut changes = vec![Change::Update(Record::Customer(customer.clone()))];
                changes.extend(self.propagate_customer_name(id, &customer.name));
                Ok(changes)
            }
            Action::CreateModel { form } => {
                require(actor, Capability::CreateModel)?;
                let model = form.into_model(now)?;
                self.models.insert(0, model.clone());
                Ok(vec![Change::Create(Record::Model(model))])
            }
            Action::UpdateModel { id, form } => {
                require(actor, Capability::EditModel)?;
                let model = self.model_mut(id)?;
                form.apply_to(model, now)?;
                Ok(vec![Change::Update(Record::Model(model.clone()))])
            }
            Action::ArchiveModel { id } => self.set_archived(actor, id, true),
            Action::RestoreModel { id } => self.set_archived(actor, id, false),
            Action::DeleteModel { id, confirmed } => {
                rules::check_delete(actor, Capability::DeleteModel, confirmed)?;
                self.model_mut(id)?;
                self.models.retain(|m| m.id != id);
                Ok(vec![delete(Collection::Models, id.as_uuid())])
            }
            Action::CreateUser {
                form,
                password_hash,
            } => {
                require(actor, Capability::ManageUsers)?;
                let username = validate_user_form(&form)?;
                if self.user_by_username(&username).is_some() {
                    return Err(DomainError::Duplicate(format!("username {username}")));
                }
                let user = User {
                    id: UserId::generate(),
                    username,
                    full_name: form.full_name.trim().to_owned(),
                    role: form.role,
                    created_at: now,
                    permissions: form
                        .permissions
                        .unwrap_or_else(|| UserPermissions::defaults_for(form.role)),
                };
                let credential = UserCredential {
                    user_id: user.id,
                    password_hash,
                };
                self.users.insert(0, user.clone());
                self.credentials.push(credential.clone());
                Ok(vec![
                    Change::Create(Record::User(user)),
                    Change::Create(Record::Credential(credential)),
                ])
            }
            Action::UpdateUser {
                id,
                form,
                password_hash,
            } => {
                require(actor, Capability::ManageUsers)?;
                let username = validate_user_form(&form)?;
                if self
                    .users
                    .iter()
                    .any(|u| u.username == username && u.id != id)
                {
                    return Err(DomainError::Duplicate(format!("username {username}")));
                }
                let user = self
                    .users
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or_else(|| DomainError::not_found("user", id))?;
                user.username = username;
                form.full_name.trim().clone_into(&mut user.full_name);
                user.role = form.role;
                user.permissions = form
                    .permissions
                    .unwrap_or_else(|| UserPermissions::defaults_for(form.role));
                let mut changes = vec![Change::Update(Record::User(user.clone()))];

                if let Some(password_hash) = password_hash {
                    let credential = UserCredential {
                        user_id: id,
                        password_hash,
                    };
                    if let Some(existing) = self.credentials.iter_mut().find(|c| c.user_id == id) {
                        *existing = credential.clone();
                        changes.push(Change::Update(Record::Credential(credential)));
                    } else {
                        self.credentials.push(credential.clone());
                        changes.push(Change::Create(Record::Credential(credential)));
                    }
                }
                Ok(changes)
            }
            Action::DeleteUser { id } => {
                let target = self
                    .user(id)
                    .ok_or_else(|| DomainError::not_found("user", id))?;
                check_user_deletion(actor, target)?;
                self.users.retain(|u| u.id != id);
                let mut changes = vec![delete(Collection::Users, id.as_uuid())];
                if self.credentials.iter().any(|c| c.user_id == id) {
                    self.credentials.retain(|c| c.user_id != id);
                    changes.push(delete(Collection::Credentials, id.as_uuid()));
                }
                Ok(changes)
            }
        }
    }

    fn new_order(&self, form: OrderForm, now: DateTime<Utc>) -> Result<ProductionOrder, DomainError> {
        let form = self.resolve_model(form)?;
        let customer_id = form.validate()?;
        let customer_name = self.customer_name(customer_id)?;
        let mut order = ProductionOrder {
            id: OrderId::generate(),
            order_code: String::new(),
            item_code: String::new(),
            model_id: None,
            customer_id,
            customer_name,
            gender: form.gender,
            total_quantity: 0,
            order_date: form.order_date,
            delivery_date: form.delivery_date,
            product_image: String::new(),
            general_note: String::new(),
            bom: Bom::default(),
            details: Vec::new(),
            stages: initial_stages(),
            priority: form.priority,
            priority_reason: String::new(),
            status: OrderStatus::Active,
            status_note: String::new(),
            status_history: Vec::new(),
            sort_order: self.next_sort_order(),
            created_at: now,
            parent_order_id: None,
        };
        form.apply_to(&mut order)?;
        Ok(order)
    }

    /// Position given to a newly created order.
    fn next_sort_order(&self) -> i64 {
        i64::try_from(self.orders.len()).unwrap_or(i64::MAX)
    }

    /// Copy item code, image, BOM and gender from the referenced model.
    fn resolve_model(&self, mut form: OrderForm) -> Result<OrderForm, DomainError> {
        let Some(model_id) = form.model_id else {
            return Ok(form);
        };
        let model = self
            .model(model_id)
            .ok_or_else(|| DomainError::not_found("model", model_id))?;
        form.item_code.clone_from(&model.item_code);
        form.product_image.clone_from(&model.product_image);
        form.bom = model.bom.clone();
        form.gender = model.gender;
        Ok(form)
    }

    fn set_archived(
        &mut self,
        actor: &User,
        id: ModelId,
        archived: bool,
    ) -> Result<Vec<Change>, DomainError> {
        require(actor, Capability::EditModel)?;
        let model = self.model_mut(id)?;
        model.is_archived = archived;
        Ok(vec![Change::Update(Record::Model(model.clone()))])
    }

    fn customer_name(&self, id: CustomerId) -> Result<String, DomainError> {
        self.customer(id)
            .map(|c| c.name.clone())
            .ok_or_else(|| DomainError::not_found("customer", id))
    }

    fn order_mut(&mut self, id: OrderId) -> Result<&mut ProductionOrder, DomainError> {
        self.orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| DomainError::not_found("order", id))
    }

    fn model_mut(&mut self, id: ModelId) -> Result<&mut ProductModel, DomainError> {
        self.models
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DomainError::not_found("model", id))
    }

    /// Rewrite the denormalized customer name on orders and shipping notes.
    fn propagate_customer_name(&mut self, id: CustomerId, name: &str) -> Vec<Change> {
        let mut changes = Vec::new();
        for order in self
            .orders
            .iter_mut()
            .filter(|o| o.customer_id == id && o.customer_name != name)
        {
            name.clone_into(&mut order.customer_name);
            changes.push(Change::Update(Record::Order(order.clone())));
        }
        for note in self
            .shipping_notes
            .iter_mut()
            .filter(|n| n.customer_id == id && n.customer_name != name)
        {
            name.clone_into(&mut note.customer_name);
            changes.push(Change::Update(Record::ShippingNote(note.clone())));
        }
        changes
    }
}

const fn delete(collection: Collection, id: uuid::Uuid) -> Change {
    Change::Delete { collection, id }
}

fn validate_user_form(form: &UserForm) -> Result<String, DomainError> {
    let username = form.username.trim();
    if username.is_empty() {
        return Err(DomainError::MissingField("username"));
    }
    if form.full_name.trim().is_empty() {
        return Err(DomainError::MissingField("fullName"));
    }
    Ok(username.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::customer::Customer;
    use crate::ledger::pending_shipment;
    use crate::order::OrderDetailRow;
    use crate::order::tests::{date, sample_form};
    use crate::permission::tests::user;
    use crate::types::{PaymentMethod, SizeBreakdown, UserRole};

    struct Fixture {
        state: FactoryState,
        admin: User,
        customer: Customer,
    }

    fn fixture() -> Fixture {
        let admin = user(UserRole::Admin);
        let customer = CustomerForm {
            name: "LA CAMIE".into(),
            code: "LC".into(),
            contact_person: String::new(),
            phone: String::new(),
            address: String::new(),
            debt_days: None,
            debt_limit: None,
        }
        .into_customer(Utc::now())
        .unwrap();
        let state = FactoryState {
            users: vec![admin.clone()],
            customers: vec![customer.clone()],
            ..FactoryState::default()
        };
        Fixture {
            state,
            admin,
            customer,
        }
    }

    fn run(state: &mut FactoryState, actor: &User, action: Action) -> Vec<Change> {
        let transition = state.apply(actor, action, Utc::now()).unwrap();
        *state = transition.state;
        transition.changes
    }

    fn create_order(fx: &mut Fixture) -> OrderId {
        let form = sample_form(fx.customer.id);
        run(&mut fx.state, &fx.admin, Action::CreateOrder { form });
        fx.state.orders[0].id
    }

    #[test]
    fn test_end_to_end_order_to_shipment() {
        let mut fx = fixture();
        let id = create_order(&mut fx);
        let order = fx.state.order(id).unwrap();
        assert_eq!(order.total_quantity, 50);
        assert_eq!(order.customer_name, "LA CAMIE");

        for stage in Stage::ALL {
            run(
                &mut fx.state,
                &fx.admin,
                Action::TransitionStage {
                    order_id: id,
                    stage,
                    status: StageStatus::Done,
                },
            );
        }
        let order = fx.state.order(id).unwrap().clone();
        assert_eq!(order.progress(), 100);
        assert!(order.is_fully_done());
        let pending: Vec<_> = pending_shipment(&fx.state.orders, &fx.state.shipping_notes)
            .map(|o| o.id)
            .collect();
        assert_eq!(pending, vec![id]);

        let form = ShippingForm::draft(&order, date("2026-01-20"));
        run(&mut fx.state, &fx.admin, Action::CreateShippingNote { form });
        assert_eq!(
            pending_shipment(&fx.state.orders, &fx.state.shipping_notes).count(),
            0
        );
    }

    #[test]
    fn test_overflowing_size_quantity_is_rejected() {
        let mut fx = fixture();
        let id = create_order(&mut fx);
        let row_id = fx.state.order(id).unwrap().details[0].id;

        let result = fx.state.apply(
            &fx.admin,
            Action::SetSizeQuantity {
                order_id: id,
                row_id,
                size: 36,
                quantity: u32::MAX,
            },
            Utc::now(),
        );

        assert!(matches!(result, Err(DomainError::InvalidQuantity)));
        assert_eq!(fx.state.order(id).unwrap().total_quantity, 50);
    }

    #[test]
    fn test_customer_reorder_keeps_other_customers_in_place() {
        let mut fx = fixture();
        let first = create_order(&mut fx);
        let other_customer = CustomerForm {
            name: "SHOES HOUSE".into(),
            code: "SH".into(),
            contact_person: String::new(),
            phone: String::new(),
            address: String::new(),
            debt_days: None,
            debt_limit: None,
        };
        run(
            &mut fx.state,
            &fx.admin,
            Action::CreateCustomer {
                form: other_customer,
            },
        );
        let other_id = fx.state.customers[0].id;
        let form = sample_form(other_id);
        run(&mut fx.state, &fx.admin, Action::CreateOrder { form });
        let foreign = fx.state.orders[0].id;
        let second = create_order(&mut fx);

        let changes = run(
            &mut fx.state,
            &fx.admin,
            Action::ReorderCustomerOrders {
                customer_id: fx.customer.id,
                visible: vec![second, first],
            },
        );

        assert_eq!(changes.len(), 2);
        assert_eq!(fx.state.order(second).unwrap().sort_order, 0);
        assert_eq!(fx.state.order(first).unwrap().sort_order, 2);
        assert_eq!(fx.state.order(foreign).unwrap().sort_order, 1);
        let listed: Vec<_> = fx
            .state
            .customer_orders(fx.customer.id)
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(listed, vec![second, first]);
    }

    #[test]
    fn test_new_orders_are_prepended_with_next_sort_order() {
        let mut fx = fixture();
        let first = create_order(&mut fx);
        let second = create_order(&mut fx);
        assert_eq!(fx.state.orders[0].id, second);
        assert_eq!(fx.state.order(first).unwrap().sort_order, 0);
        assert_eq!(fx.state.order(second).unwrap().sort_order, 1);
        assert!(fx.state.orders[0].stages.iter().all(|s| s.status == StageStatus::Pending));
    }

    #[test]
    fn test_order_from_model_copies_bom() {
        let mut fx = fixture();
        let model_form = ModelForm {
            item_code: "B0200".into(),
            product_image: "img".into(),
            bom: Bom {
                sole_code: "BV.049".into(),
                ..Bom::default()
            },
            gender: Gender::Female,
            technical_document: String::new(),
            edit_note: None,
        };
        run(&mut fx.state, &fx.admin, Action::CreateModel { form: model_form });
        let model_id = fx.state.models[0].id;

        let mut form = sample_form(fx.customer.id);
        form.model_id = Some(model_id);
        run(&mut fx.state, &fx.admin, Action::CreateOrder { form });

        let order = &fx.state.orders[0];
        assert_eq!(order.item_code, "B0200");
        assert_eq!(order.bom.sole_code, "BV.049");
        assert_eq!(order.model_id, Some(model_id));
    }

    #[test]
    fn test_rejected_action_leaves_state_unchanged() {
        let mut fx = fixture();
        let id = create_order(&mut fx);
        let before = fx.state.clone();
        let viewer = user(UserRole::Viewer);
        let result = fx.state.apply(
            &viewer,
            Action::TransitionStage {
                order_id: id,
                stage: Stage::Cutting,
                status: StageStatus::Done,
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::PermissionDenied(_))));
        assert_eq!(fx.state, before);
    }

    #[test]
    fn test_return_spawns_remake() {
        let mut fx = fixture();
        let id = create_order(&mut fx);
        let changes = run(
            &mut fx.state,
            &fx.admin,
            Action::RecordReturn {
                form: ReturnForm {
                    original_order_id: id,
                    color: "Đen".into(),
                    size: 37,
                    quantity: 3,
                    reason: "Bong keo".into(),
                },
            },
        );
        assert_eq!(changes.len(), 2);
        assert_eq!(fx.state.returns.len(), 1);
        assert_eq!(fx.state.orders.len(), 2);
        let remake = &fx.state.orders[0];
        assert_eq!(remake.parent_order_id, Some(id));
        assert_eq!(remake.total_quantity, 3);
        assert_eq!(remake.sort_order, 1);
        assert_ne!(remake.details[0].id, fx.state.order(id).unwrap().details[0].id);
        assert_eq!(fx.state.order(id).unwrap().total_quantity, 50);
    }

    #[test]
    fn test_return_with_unknown_color_records_nothing() {
        let mut fx = fixture();
        let id = create_order(&mut fx);
        let result = fx.state.apply(
            &fx.admin,
            Action::RecordReturn {
                form: ReturnForm {
                    original_order_id: id,
                    color: "Trắng".into(),
                    size: 37,
                    quantity: 3,
                    reason: "Bong keo".into(),
                },
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::RemakeColorNotFound(_))));
        assert!(fx.state.returns.is_empty());
    }

    #[test]
    fn test_reorder_emits_one_update_per_visible_order() {
        let mut fx = fixture();
        let a = create_order(&mut fx);
        let b = create_order(&mut fx);
        let c = create_order(&mut fx);
        run(
            &mut fx.state,
            &fx.admin,
            Action::ChangeOrderStatus {
                order_id: b,
                status: OrderStatus::Cancelled,
                reason: "Khách hủy".into(),
            },
        );
        let changes = run(
            &mut fx.state,
            &fx.admin,
            Action::ReorderOrders {
                visible: vec![a, c],
            },
        );
        assert_eq!(changes.len(), 2);
        let ids: Vec<_> = fx.state.orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![a, c, b]);
    }

    #[test]
    fn test_customer_rename_propagates() {
        let mut fx = fixture();
        let id = create_order(&mut fx);
        for stage in Stage::ALL {
            run(
                &mut fx.state,
                &fx.admin,
                Action::TransitionStage {
                    order_id: id,
                    stage,
                    status: StageStatus::Done,
                },
            );
        }
        let order = fx.state.order(id).unwrap().clone();
        let form = ShippingForm::draft(&order, date("2026-01-20"));
        run(&mut fx.state, &fx.admin, Action::CreateShippingNote { form });

        let changes = run(
            &mut fx.state,
            &fx.admin,
            Action::UpdateCustomer {
                id: fx.customer.id,
                form: CustomerForm {
                    name: "LA CAMIE VN".into(),
                    code: "LC".into(),
                    contact_person: String::new(),
                    phone: String::new(),
                    address: String::new(),
                    debt_days: Some(45),
                    debt_limit: None,
                },
            },
        );
        assert_eq!(changes.len(), 3);
        assert_eq!(fx.state.order(id).unwrap().customer_name, "LA CAMIE VN");
        assert_eq!(fx.state.shipping_notes[0].customer_name, "LA CAMIE VN");
        assert_eq!(fx.state.customer(fx.customer.id).unwrap().debt_days, 45);
    }

    #[test]
    fn test_payment_delete_is_persisted_change() {
        let mut fx = fixture();
        run(
            &mut fx.state,
            &fx.admin,
            Action::RecordPayment {
                form: PaymentForm {
                    customer_id: fx.customer.id,
                    amount: Decimal::from(4_000_000),
                    date: date("2026-01-10"),
                    method: PaymentMethod::Cash,
                    note: String::new(),
                },
            },
        );
        let payment = fx.state.payments[0].clone();
        assert_eq!(payment.created_by, fx.admin.full_name);

        let unconfirmed = fx.state.apply(
            &fx.admin,
            Action::DeletePayment {
                id: payment.id,
                confirmed: false,
            },
            Utc::now(),
        );
        assert!(matches!(
            unconfirmed,
            Err(DomainError::ConfirmationRequired(_))
        ));

        let changes = run(
            &mut fx.state,
            &fx.admin,
            Action::DeletePayment {
                id: payment.id,
                confirmed: true,
            },
        );
        assert_eq!(
            changes,
            vec![Change::Delete {
                collection: Collection::Payments,
                id: payment.id.as_uuid()
            }]
        );
        assert!(fx.state.payments.is_empty());
    }

    #[test]
    fn test_user_lifecycle() {
        let mut fx = fixture();
        let form = UserForm {
            username: "xuong".into(),
            full_name: "Tổ Trưởng Sản Xuất".into(),
            role: UserRole::Production,
            permissions: None,
        };
        run(
            &mut fx.state,
            &fx.admin,
            Action::CreateUser {
                form: form.clone(),
                password_hash: "hash".into(),
            },
        );
        let created = fx.state.users[0].clone();
        assert!(!created.permissions.can_edit);
        assert_eq!(fx.state.credentials.len(), 1);

        let duplicate = fx.state.apply(
            &fx.admin,
            Action::CreateUser {
                form,
                password_hash: "hash".into(),
            },
            Utc::now(),
        );
        assert!(matches!(duplicate, Err(DomainError::Duplicate(_))));

        let self_delete = fx.state.apply(
            &fx.admin,
            Action::DeleteUser { id: fx.admin.id },
            Utc::now(),
        );
        assert_eq!(self_delete.unwrap_err(), DomainError::CannotDeleteSelf);

        let changes = run(
            &mut fx.state,
            &fx.admin,
            Action::DeleteUser { id: created.id },
        );
        assert_eq!(changes.len(), 2);
        assert!(fx.state.credentials.is_empty());
    }

    #[test]
    fn test_set_size_via_action_keeps_totals() {
        let mut fx = fixture();
        let id = create_order(&mut fx);
        let row_id = fx.state.order(id).unwrap().details[0].id;
        run(
            &mut fx.state,
            &fx.admin,
            Action::SetSizeQuantity {
                order_id: id,
                row_id,
                size: 36,
                quantity: 10,
            },
        );
        let order = fx.state.order(id).unwrap();
        assert_eq!(order.total_quantity, 60);

        let mut with_rows = order.clone();
        with_rows.details.push(OrderDetailRow::new(
            "Nâu",
            "",
            SizeBreakdown::zeroed(Gender::Female),
        )
        .unwrap());
        with_rows.recompute_totals().unwrap();
        assert_eq!(with_rows.total_quantity, 60);
    }
}
