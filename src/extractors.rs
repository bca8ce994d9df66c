use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::{cookies, session};
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub session_token: String,
}

impl CurrentUser {
    /// Creating, editing and deleting posts.
    pub fn can_manage_posts(&self) -> bool {
        self.is_admin
    }
}

/// Optional user extractor. Missing, forged, expired or revoked sessions all
/// resolve to anonymous; only storage failures reject the request.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = cookies::get_cookie_value(&parts.headers, &state.config.auth.cookie_name)
        else {
            return Ok(MaybeUser(None));
        };

        let Some(claims) = state.signer.verify(value) else {
            return Ok(MaybeUser(None));
        };

        let conn = state.db.get()?;
        let user = session::resolve(&conn, claims.uid, &claims.sid)?;
        Ok(MaybeUser(user))
    }
}

/// Extractor that requires authentication.
/// Anonymous requests are redirected to the login page.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.ok_or(AppError::LoginRequired)
    }
}

/// Extractor for the post-management routes. Anonymous requests get the login
/// redirect; signed-in users without the capability get 403.
pub struct Admin(pub CurrentUser);

impl FromRequestParts<AppState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.can_manage_posts() {
            tracing::warn!(
                "Rejected {} {} for non-admin user {}",
                parts.method,
                parts.uri.path(),
                user.id
            );
            return Err(AppError::Forbidden);
        }
        Ok(Admin(user))
    }
}
