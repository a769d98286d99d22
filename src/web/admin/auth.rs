use axum::{Json, http::StatusCode, response::Redirect};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{
    AppState,
    responses::{ApiMessage, json_error},
    session::SessionContext,
};

/// A session that carries an admin token, with the token pulled out.
pub struct AdminSession {
    pub ctx: SessionContext,
    pub token: String,
}

async fn load_admin(state: &AppState, jar: &CookieJar) -> Option<AdminSession> {
    let ctx = state.sessions().load(jar).await;
    if !ctx.data.is_admin() {
        return None;
    }
    let token = ctx.data.admin_auth_token.clone()?;
    Some(AdminSession { ctx, token })
}

/// Gate for page handlers: anonymous or non-admin sessions go to the admin login.
pub async fn require_admin(state: &AppState, jar: &CookieJar) -> Result<AdminSession, Redirect> {
    load_admin(state, jar)
        .await
        .ok_or_else(|| Redirect::to("/admin_login"))
}

/// Gate for AJAX handlers.
pub async fn require_admin_json(
    state: &AppState,
    jar: &CookieJar,
) -> Result<AdminSession, (StatusCode, Json<ApiMessage>)> {
    load_admin(state, jar)
        .await
        .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "Administrator login required."))
}
