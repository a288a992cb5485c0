//! Bình Vương Core - domain model of the footwear production ERP.
//!
//! This crate holds everything the admin server and the CLI agree on:
//! - production orders, their seven stages and the mutation rules around them
//! - product models, customers, returns and defect remakes
//! - shipping notes, payments and the per-customer debt ledger
//! - users, role presets and permission checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. Every mutation goes through
//! [`FactoryState::apply`], which returns a new snapshot together with the
//! record [`Change`]s a persistence layer must commit. Callers install the new
//! snapshot only after the commit succeeds.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses, genders and size breakdowns
//! - [`stage`] - The production pipeline and progress math
//! - [`order`] - Production orders and the order form
//! - [`rules`] - Stage, size, gender, status and reorder rules
//! - [`remake`] - Return logging and remake orders
//! - [`shipping`] - Shipping notes and payments
//! - [`ledger`] - Debt, aging and pending-shipment queries
//! - [`customer`], [`product_model`], [`user`] - Master data
//! - [`permission`] - Capability checks
//! - [`state`], [`action`] - The state container and its transitions
//! - [`report`] - Order lists, the dashboard and production reports

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod action;
pub mod customer;
pub mod error;
pub mod ledger;
pub mod order;
pub mod permission;
pub mod product_model;
pub mod remake;
pub mod report;
pub mod rules;
pub mod shipping;
pub mod stage;
pub mod state;
pub mod types;
pub mod user;

pub use action::Action;
pub use error::DomainError;
pub use state::{Change, Collection, FactoryState, Record, Transition};
pub use types::*;
