use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    apis::data::{self, DataReply},
    web::{AppState, templates::REVERT_REQUEST_SCRIPT},
};

use super::auth::require_admin_json;

#[derive(Deserialize)]
pub struct RevertRequestsBody {
    pub requests_ids: Vec<u64>,
}

/// Plain-text answer understood by the archived-request page script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertReply {
    Approved,
    Failed,
}

impl RevertReply {
    pub fn body(self) -> &'static str {
        match self {
            RevertReply::Approved => "approved",
            RevertReply::Failed => "failed",
        }
    }
}

impl IntoResponse for RevertReply {
    fn into_response(self) -> Response {
        let status = match self {
            RevertReply::Approved => StatusCode::OK,
            RevertReply::Failed => StatusCode::BAD_GATEWAY,
        };
        (status, self.body()).into_response()
    }
}

pub async fn revert_archive_tissue_requests(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RevertRequestsBody>,
) -> Response {
    let admin = match require_admin_json(&state, &jar).await {
        Ok(admin) => admin,
        Err(rejection) => return rejection.into_response(),
    };

    if body.requests_ids.is_empty() {
        return (StatusCode::BAD_REQUEST, RevertReply::Failed.body()).into_response();
    }

    let result = data::revert_tissue_requests(
        state.api(),
        state.config(),
        &admin.token,
        &body.requests_ids,
    )
    .await;

    let reply = match result {
        Ok(DataReply::Accepted) => {
            info!(ids = ?body.requests_ids, "archived tissue requests reverted");
            RevertReply::Approved
        }
        Ok(reply) => {
            warn!(ids = ?body.requests_ids, ?reply, "data API refused revert");
            RevertReply::Failed
        }
        Err(err) => {
            error!(?err, "revert request failed");
            RevertReply::Failed
        }
    };

    reply.into_response()
}

pub async fn revert_request_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        REVERT_REQUEST_SCRIPT,
    )
}
