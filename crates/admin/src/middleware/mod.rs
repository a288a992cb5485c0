//! HTTP middleware and extractors for admin.
//!
//! # Middleware Order (outermost first, see `routes::app`)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Handlers, which identify the caller with [`RequireActor`]

pub mod auth;

pub use auth::{RequireActor, USER_ID_HEADER};
