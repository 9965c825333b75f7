//! `Caller` extractor: identifies the user and loads their principal.
//!
//! The identity provider sits in front of this service and forwards the
//! internal user id in the `x-user-id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use docvault_auth::Principal;
use docvault_core::error::AppError;
use docvault_core::types::UserId;
use docvault_service::Credential;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated user's internal id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller with its groups, roles, and capabilities.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl Caller {
    /// The caller as an authorization credential.
    pub fn credential(&self) -> Credential {
        Credential::Principal(self.0.clone())
    }
}

impl std::ops::Deref for Caller {
    type Target = Principal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing x-user-id header"))?;
        let user_id = Uuid::parse_str(raw.trim())
            .map(UserId::from_uuid)
            .map_err(|_| AppError::authentication("Invalid x-user-id header"))?;

        let principal = state.principals.load(user_id).await?;
        Ok(Caller(principal))
    }
}
