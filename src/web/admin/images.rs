use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, warn};

use crate::{
    images::{self, ImageError, ImageName},
    web::{
        AppState,
        responses::{ImageLocation, json_error},
    },
};

use super::auth::require_admin_json;

#[derive(Deserialize)]
pub struct ImageQuery {
    pub filename: String,
}

pub async fn get_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ImageQuery>,
) -> Response {
    let mut admin = match require_admin_json(&state, &jar).await {
        Ok(admin) => admin,
        Err(rejection) => return rejection.into_response(),
    };

    let result = images::retrieve_image(
        state.api(),
        state.config(),
        state.images(),
        &mut admin.ctx.data,
        &query.filename,
    )
    .await;

    let file_url = match result {
        Ok(url) => url,
        Err(err) => return image_error_response(err),
    };

    match state.sessions().commit(&admin.ctx, jar).await {
        Ok(jar) => (jar, Json(ImageLocation::new(file_url))).into_response(),
        Err(err) => {
            error!(?err, "failed to persist image access on session");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to authorize image access.")
                .into_response()
        }
    }
}

fn image_error_response(err: ImageError) -> Response {
    match err {
        ImageError::InvalidFilename(filename) => {
            warn!(%filename, "rejected image filename");
            json_error(StatusCode::BAD_REQUEST, "Invalid image filename.").into_response()
        }
        ImageError::MissingToken => {
            json_error(StatusCode::UNAUTHORIZED, "Administrator login required.").into_response()
        }
        err @ (ImageError::Api(_) | ImageError::Io(_)) => {
            error!(?err, "image retrieval failed");
            json_error(
                StatusCode::BAD_GATEWAY,
                "Something went wrong in rendering image, Please try again!",
            )
            .into_response()
        }
    }
}

/// Stream a previously retrieved image back to the session that fetched it.
pub async fn serve_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(filename): Path<String>,
) -> Response {
    let ctx = state.sessions().load(&jar).await;
    if !ctx.data.may_view_image(&filename) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let Ok(name) = ImageName::parse(&filename) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let path = state.images().image_path(&name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, mime::IMAGE_PNG.essence_str()),
                (header::CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )
            .into_response(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            error!(?err, file = %path.display(), "failed to read cached image");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
