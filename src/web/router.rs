use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use crate::web::{AppState, admin, auth, landing};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::landing_page))
        .route("/login", get(auth::login_page).post(auth::process_login))
        .route(
            "/admin_login",
            get(auth::admin_login_page).post(auth::process_admin_login),
        )
        .route("/logout", post(auth::logout))
        .route("/healthz", get(healthz))
        .route("/add_new_data", get(admin::add_record_page))
        .route("/insert_single_row_data", post(admin::insert_single_row_data))
        .route("/delete_data/:id/", delete(admin::delete_record))
        .route("/get_image", get(admin::get_image))
        .route("/admin_images/czi/:filename", get(admin::serve_image))
        .route(
            "/revert_archive_tissue_requests/",
            post(admin::revert_archive_tissue_requests),
        )
        .route(
            "/assets/js/revert_tissue_request.js",
            get(admin::revert_request_script),
        )
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
