use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    apis::auth::{self as auth_api, AuthReply},
    web::{
        AppState,
        session::{SessionContext, UserType},
        templates::{LoginKind, render_login_page},
    },
};

const SERVICE_UNAVAILABLE: &str = "Authentication service is unavailable, please try again later.";

#[derive(Deserialize)]
pub struct LoginForm {
    pub user_email: String,
    pub user_password: String,
}

#[derive(Deserialize)]
pub struct AdminLoginForm {
    pub admin_email: String,
    pub admin_password: String,
}

pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    let ctx = state.sessions().load(&jar).await;
    if ctx.data.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    Html(render_login_page(LoginKind::User, None)).into_response()
}

pub async fn admin_login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    let ctx = state.sessions().load(&jar).await;
    if ctx.data.is_admin() {
        return Redirect::to("/").into_response();
    }
    Html(render_login_page(LoginKind::Admin, None)).into_response()
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let url = state.config().auth_api_url.clone();
    establish_session(
        &state,
        jar,
        LoginKind::User,
        &url,
        &form.user_email,
        &form.user_password,
    )
    .await
}

pub async fn process_admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AdminLoginForm>,
) -> Response {
    let url = state.config().admin_auth_api_url.clone();
    establish_session(
        &state,
        jar,
        LoginKind::Admin,
        &url,
        &form.admin_email,
        &form.admin_password,
    )
    .await
}

async fn establish_session(
    state: &AppState,
    jar: CookieJar,
    kind: LoginKind,
    url: &str,
    email: &str,
    password: &str,
) -> Response {
    let reply = match auth_api::authenticate(state.api(), url, email, password).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(?err, ?kind, "auth service request failed");
            return login_failure(kind, StatusCode::BAD_GATEWAY, SERVICE_UNAVAILABLE);
        }
    };

    let token = match reply {
        AuthReply::Token(token) => token,
        AuthReply::Rejected(message) => {
            warn!(?kind, "login rejected by auth service");
            return login_failure(kind, StatusCode::UNAUTHORIZED, &message);
        }
    };

    let mut ctx = state.sessions().load(&jar).await;
    grant(&mut ctx, kind, token);

    match state.sessions().commit(&ctx, jar).await {
        Ok(jar) => {
            info!(?kind, "login succeeded");
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => {
            error!(?err, "failed to persist session after login");
            login_failure(
                kind,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong, Please try again",
            )
        }
    }
}

fn grant(ctx: &mut SessionContext, kind: LoginKind, token: String) {
    match kind {
        LoginKind::User => {
            ctx.data.user_type = UserType::User;
            ctx.data.auth_token = Some(token);
        }
        LoginKind::Admin => {
            ctx.data.user_type = UserType::Admin;
            ctx.data.admin_auth_token = Some(token);
        }
    }
}

fn login_failure(kind: LoginKind, status: StatusCode, message: &str) -> Response {
    (status, Html(render_login_page(kind, Some(message)))).into_response()
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let ctx = state.sessions().load(&jar).await;
    let jar = state.sessions().destroy(&ctx, jar).await;
    (jar, Redirect::to("/"))
}
