use super::{ApiClient, ApiError, ApiReply, display_value};

const DEFAULT_REJECTION: &str = "Invalid credentials";

/// Outcome of a credential exchange with the auth service.
///
/// The service answers a successful login with the bare token and a failed
/// one with a JSON object carrying `Error`, so the reply shape is the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthReply {
    Token(String),
    Rejected(String),
}

/// A JSON object is a rejection whatever the status. A token is only taken
/// from a non-empty 2xx body; every other reply is an [`ApiError::Status`].
pub fn classify_auth_reply(url: &str, reply: ApiReply) -> Result<AuthReply, ApiError> {
    if let Some(object) = reply.json_object() {
        let message = object
            .get("Error")
            .map(display_value)
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
        return Ok(AuthReply::Rejected(message));
    }

    if !reply.status.is_success() || reply.body.trim().is_empty() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status: reply.status,
            body: reply.body,
        });
    }

    Ok(AuthReply::Token(reply.body))
}

pub async fn authenticate(
    client: &ApiClient,
    url: &str,
    email: &str,
    password: &str,
) -> Result<AuthReply, ApiError> {
    let fields = vec![
        ("email", email.to_string()),
        ("password", password.to_string()),
    ];
    let reply = client.post_multipart(url, None, fields).await?;
    classify_auth_reply(url, reply)
}
