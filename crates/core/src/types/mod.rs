//! Core value types for the production ERP.
//!
//! This module provides type-safe IDs, status enumerations, and the
//! gender-specific size breakdown shared by orders and shipping notes.

pub mod id;
pub mod size;
pub mod status;

pub use id::*;
pub use size::{Gender, SizeBreakdown};
pub use status::*;
