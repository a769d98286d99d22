use axum::{extract::State, response::Html};
use axum_extra::extract::cookie::CookieJar;

use crate::web::{
    AppState,
    session::UserType,
    templates::{LoginKind, render_admin_home, render_login_page, render_user_home},
};

pub async fn landing_page(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let ctx = state.sessions().load(&jar).await;

    let page = match ctx.data.user_type {
        UserType::Admin if ctx.data.is_admin() => render_admin_home(),
        UserType::User if ctx.data.is_authenticated() => render_user_home(),
        _ => render_login_page(LoginKind::User, None),
    };

    Html(page)
}
