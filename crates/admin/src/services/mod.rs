//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Argon2 password hashing and login
//! - `factory` - Applies domain actions and commits them to the store
//! - `seed` - Default accounts and YAML seed files

pub mod auth;
pub mod factory;
pub mod seed;

pub use auth::{Argon2Verifier, AuthError, AuthService};
pub use factory::{FactoryService, system_actor};
pub use seed::{SeedFile, SeedReport, seed};
