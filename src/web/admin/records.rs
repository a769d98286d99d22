use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info, warn};

use crate::{
    apis::data::{self, DataReply},
    records::TissueRecordForm,
    web::{
        AppState,
        templates::{render_add_record_page, render_message_page},
    },
};

use super::auth::{require_admin, require_admin_json};

const GENERIC_FAILURE: &str = "Something went wrong, Please try again";
const UPLOAD_CONFIRMED: &str = "Cheers, Your data is uploaded";

/// `(msg_title, msg_body)` for the message view after an insert.
pub fn insert_message(reply: &DataReply) -> (&'static str, String) {
    match reply {
        DataReply::Accepted => ("Confirmation", UPLOAD_CONFIRMED.to_string()),
        DataReply::Rejected(message) => ("Error", message.clone()),
        DataReply::Unrecognized => ("Error", GENERIC_FAILURE.to_string()),
    }
}

pub async fn add_record_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    require_admin(&state, &jar).await?;
    Ok(Html(render_add_record_page()))
}

pub async fn insert_single_row_data(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<TissueRecordForm>,
) -> Result<Response, Redirect> {
    let admin = require_admin(&state, &jar).await?;

    let result = data::insert_record(
        state.api(),
        state.config(),
        &admin.token,
        form.to_api_fields(),
    )
    .await;

    let response = match result {
        Ok(reply) => {
            match &reply {
                DataReply::Accepted => info!(mbtb_code = %form.mbtb_code, "record inserted"),
                DataReply::Rejected(message) => {
                    warn!(mbtb_code = %form.mbtb_code, %message, "data API rejected record")
                }
                DataReply::Unrecognized => {
                    warn!(mbtb_code = %form.mbtb_code, "unrecognized data API reply to insert")
                }
            }
            let (title, body) = insert_message(&reply);
            Html(render_message_page(title, &body)).into_response()
        }
        Err(err) => {
            error!(?err, "insert single row data failed");
            (
                StatusCode::BAD_GATEWAY,
                Html(render_message_page("Error", GENERIC_FAILURE)),
            )
                .into_response()
        }
    };

    Ok(response)
}

/// Plain-text reply the record viewer checks for before redirecting.
pub async fn delete_record(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<u64>,
) -> Response {
    let admin = match require_admin_json(&state, &jar).await {
        Ok(admin) => admin,
        Err(rejection) => return rejection.into_response(),
    };

    match data::delete_record(state.api(), state.config(), &admin.token, record_id).await {
        Ok(DataReply::Accepted) => {
            info!(record_id, "record deleted");
            "Success".into_response()
        }
        Ok(reply) => {
            warn!(record_id, ?reply, "data API refused delete");
            "Failed".into_response()
        }
        Err(err) => {
            error!(?err, record_id, "delete request failed");
            (StatusCode::BAD_GATEWAY, "Failed").into_response()
        }
    }
}
