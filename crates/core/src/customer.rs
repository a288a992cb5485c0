//! Customers and their credit terms.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::types::CustomerId;

/// Days of credit granted to a new customer.
pub const DEFAULT_DEBT_DAYS: u32 = 30;

/// Credit ceiling of a new customer, in đồng.
pub const DEFAULT_DEBT_LIMIT: Decimal = Decimal::from_parts(500_000_000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Short code printed on documents.
    pub code: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    /// Grace period before a shipped balance is overdue.
    pub debt_days: u32,
    /// Maximum outstanding balance.
    #[serde(with = "rust_decimal::serde::float")]
    pub debt_limit: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Submitted fields for creating or editing a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub debt_days: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub debt_limit: Option<Decimal>,
}

impl CustomerForm {
    /// Build a new customer, filling unset credit terms with the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] if the name is blank.
    pub fn into_customer(self, now: DateTime<Utc>) -> Result<Customer, DomainError> {
        let mut customer = Customer {
            id: CustomerId::generate(),
            name: String::new(),
            code: String::new(),
            contact_person: String::new(),
            phone: String::new(),
            address: String::new(),
            debt_days: DEFAULT_DEBT_DAYS,
            debt_limit: DEFAULT_DEBT_LIMIT,
            created_at: now,
        };
        self.apply_to(&mut customer)?;
        Ok(customer)
    }

    /// Overwrite `customer` with the form's fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] if the name is blank.
    pub fn apply_to(self, customer: &mut Customer) -> Result<(), DomainError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::MissingField("name"));
        }
        customer.name = name.to_owned();
        customer.code = self.code;
        customer.contact_person = self.contact_person;
        customer.phone = self.phone;
        customer.address = self.address;
        if let Some(days) = self.debt_days {
            customer.debt_days = days;
        }
        if let Some(limit) = self.debt_limit {
            customer.debt_limit = limit;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str) -> CustomerForm {
        CustomerForm {
            name: name.into(),
            code: "LC".into(),
            contact_person: "Anh Nam".into(),
            phone: "0901234567".into(),
            address: "TP. Hồ Chí Minh".into(),
            debt_days: None,
            debt_limit: None,
        }
    }

    #[test]
    fn test_new_customer_gets_default_terms() {
        let customer = form("LA CAMIE").into_customer(Utc::now()).unwrap();
        assert_eq!(customer.debt_days, 30);
        assert_eq!(customer.debt_limit, Decimal::from(500_000_000));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert_eq!(
            form("  ").into_customer(Utc::now()),
            Err(DomainError::MissingField("name"))
        );
    }

    #[test]
    fn test_debt_limit_serializes_as_number() {
        let customer = form("LA CAMIE").into_customer(Utc::now()).unwrap();
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["debtLimit"], 500_000_000.0);
        assert_eq!(json["debtDays"], 30);
    }
}
