use serde::Serialize;
use tracing::warn;

use super::{ApiClient, ApiError, ApiReply, display_value, is_truthy};
use crate::config::PortalConfig;

/// How the data API answered a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataReply {
    /// `Response` was set.
    Accepted,
    /// `Error` was set; carries the message verbatim.
    Rejected(String),
    /// Not JSON, or JSON with neither key.
    Unrecognized,
}

/// `Error` wins over `Response` when both are present.
pub fn classify_data_reply(reply: &ApiReply) -> DataReply {
    let Some(object) = reply.json_object() else {
        warn!(status = %reply.status, "data API reply is not a JSON object");
        return DataReply::Unrecognized;
    };

    if let Some(error) = object.get("Error").filter(|value| is_truthy(value)) {
        return DataReply::Rejected(display_value(error));
    }

    if object.get("Response").is_some_and(is_truthy) {
        return DataReply::Accepted;
    }

    DataReply::Unrecognized
}

pub async fn insert_record(
    client: &ApiClient,
    config: &PortalConfig,
    admin_token: &str,
    fields: Vec<(&'static str, String)>,
) -> Result<DataReply, ApiError> {
    let url = config.data_endpoint("add_new_data/");
    let reply = client.post_multipart(&url, Some(admin_token), fields).await?;
    Ok(classify_data_reply(&reply))
}

pub async fn delete_record(
    client: &ApiClient,
    config: &PortalConfig,
    admin_token: &str,
    record_id: u64,
) -> Result<DataReply, ApiError> {
    let url = config.data_endpoint(&format!("delete_data/{record_id}/"));
    let reply = client.delete(&url, Some(admin_token)).await?;
    Ok(classify_data_reply(&reply))
}

#[derive(Debug, Serialize)]
struct RevertPayload<'a> {
    requests_ids: &'a [u64],
}

pub async fn revert_tissue_requests(
    client: &ApiClient,
    config: &PortalConfig,
    admin_token: &str,
    request_ids: &[u64],
) -> Result<DataReply, ApiError> {
    let url = config.data_endpoint("revert_archive_tissue_requests/");
    let payload = RevertPayload {
        requests_ids: request_ids,
    };
    let reply = client.post_json(&url, Some(admin_token), &payload).await?;
    Ok(classify_data_reply(&reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::test_support::spawn_stub;
    use axum::{
        Json, Router,
        extract::{Multipart, Path},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{delete, post},
    };
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn reply(body: &str) -> ApiReply {
        ApiReply {
            status: StatusCode::OK,
            body: body.to_string(),
        }
    }

    #[test]
    fn classifies_error_and_response_keys() {
        assert_eq!(
            classify_data_reply(&reply(r#"{"Error": "x"}"#)),
            DataReply::Rejected("x".to_string())
        );
        assert_eq!(
            classify_data_reply(&reply(r#"{"Response": true}"#)),
            DataReply::Accepted
        );
        assert_eq!(
            classify_data_reply(&reply(r#"{"Response": "Success"}"#)),
            DataReply::Accepted
        );
        assert_eq!(
            classify_data_reply(&reply("<html>oops</html>")),
            DataReply::Unrecognized
        );
        assert_eq!(
            classify_data_reply(&reply(r#"{"detail": "Not found."}"#)),
            DataReply::Unrecognized
        );
    }

    fn token_of(headers: &HeaderMap) -> String {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn insert_sends_token_and_fields() {
        let router = Router::new().route(
            "/add_new_data/",
            post(|headers: HeaderMap, mut multipart: Multipart| async move {
                if token_of(&headers) != "Token admin-tok" {
                    return (
                        AxumStatus::FORBIDDEN,
                        Json(json!({"detail": "Authentication credentials were not provided."})),
                    );
                }
                let mut duration = String::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    if field.name() == Some("duration") {
                        duration = field.text().await.unwrap();
                    }
                }
                if duration == "NaN" {
                    return (
                        AxumStatus::BAD_REQUEST,
                        Json(json!({"Error": "duration must be a number"})),
                    );
                }
                (AxumStatus::CREATED, Json(json!({"Response": "Success"})))
            }),
        );
        let base = spawn_stub(router).await;
        let config = PortalConfig::for_tests(&base, "/tmp");
        let client = ApiClient::new(Duration::from_secs(5)).unwrap();

        let ok = insert_record(
            &client,
            &config,
            "admin-tok",
            vec![("duration", "5".to_string())],
        )
        .await
        .unwrap();
        assert_eq!(ok, DataReply::Accepted);

        let bad = insert_record(
            &client,
            &config,
            "admin-tok",
            vec![("duration", "NaN".to_string())],
        )
        .await
        .unwrap();
        assert_eq!(
            bad,
            DataReply::Rejected("duration must be a number".to_string())
        );

        let forbidden = insert_record(&client, &config, "other", vec![])
            .await
            .unwrap();
        assert_eq!(forbidden, DataReply::Unrecognized);
    }

    #[tokio::test]
    async fn delete_and_revert_hit_their_endpoints() {
        let router = Router::new()
            .route(
                "/delete_data/:id/",
                delete(|Path(id): Path<u64>| async move {
                    if id == 7 {
                        Json(json!({"Response": "Success"}))
                    } else {
                        Json(json!({"Error": "Invalid ID"}))
                    }
                }),
            )
            .route(
                "/revert_archive_tissue_requests/",
                post(|Json(body): Json<Value>| async move {
                    if body["requests_ids"] == json!([42]) {
                        Json(json!({"Response": "Success"}))
                    } else {
                        Json(json!({"Error": "Unknown request"}))
                    }
                }),
            );
        let base = spawn_stub(router).await;
        let config = PortalConfig::for_tests(&base, "/tmp");
        let client = ApiClient::new(Duration::from_secs(5)).unwrap();

        assert_eq!(
            delete_record(&client, &config, "tok", 7).await.unwrap(),
            DataReply::Accepted
        );
        assert_eq!(
            delete_record(&client, &config, "tok", 8).await.unwrap(),
            DataReply::Rejected("Invalid ID".to_string())
        );
        assert_eq!(
            revert_tissue_requests(&client, &config, "tok", &[42])
                .await
                .unwrap(),
            DataReply::Accepted
        );
    }
}
