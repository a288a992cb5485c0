//! Caller identification for API handlers.
//!
//! The acting user is named by the `X-User-Id` header, which stands in for a
//! session established by `POST /api/users/login`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use binh_vuong_core::types::UserId;
use binh_vuong_core::user::User;

use crate::error::set_sentry_user;
use crate::state::AppState;

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires a known user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireActor(user): RequireActor) -> impl IntoResponse {
///     format!("Hello, {}!", user.full_name)
/// }
/// ```
pub struct RequireActor(pub User);

/// Error returned when the caller cannot be identified.
#[derive(Debug, PartialEq, Eq)]
pub enum ActorRejection {
    /// The header is absent.
    MissingHeader,
    /// The header is not a UUID.
    MalformedHeader,
    /// No user has this id.
    UnknownUser,
}

impl IntoResponse for ActorRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingHeader => "missing X-User-Id header",
            Self::MalformedHeader => "X-User-Id is not a valid id",
            Self::UnknownUser => "unknown user",
        };
        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}

impl FromRequestParts<AppState> for RequireActor {
    type Rejection = ActorRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(ActorRejection::MissingHeader)?;
        let id: UserId = raw
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or(ActorRejection::MalformedHeader)?;

        let user = state
            .read()
            .await
            .user(id)
            .cloned()
            .ok_or(ActorRejection::UnknownUser)?;

        set_sentry_user(&user.id.to_string(), &user.username);
        tracing::Span::current().record("user", tracing::field::display(&user.username));
        Ok(Self(user))
    }
}
