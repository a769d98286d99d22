//! Outbound HTTP client shared by the data, auth and image services.
//!
//! Every call resolves to exactly one `Result`: transport failures and
//! timeouts surface as [`ApiError`], everything the remote side answers is
//! handed back as an [`ApiReply`] so callers can interpret service-specific
//! error bodies themselves.

pub mod auth;
pub mod data;
pub mod image;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header, multipart};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
}

impl ApiError {
    fn transport(url: &str, source: reqwest::Error) -> Self {
        ApiError::Transport {
            url: url.to_string(),
            source,
        }
    }
}

/// Raw reply from an external service, regardless of status code.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: String,
}

impl ApiReply {
    /// Parse the body as a JSON object, if it is one.
    pub fn json_object(&self) -> Option<serde_json::Map<String, Value>> {
        match serde_json::from_str::<Value>(&self.body) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
}

impl ApiClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow::anyhow!("failed to build HTTP client: {err}"))?;
        Ok(Self { http })
    }

    /// POST a multipart body built from plain text fields.
    pub async fn post_multipart(
        &self,
        url: &str,
        token: Option<&str>,
        fields: Vec<(&'static str, String)>,
    ) -> Result<ApiReply, ApiError> {
        let form = fields
            .into_iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            });

        let builder = with_token(self.http.post(url), token).multipart(form);
        read_reply(url, builder).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<ApiReply, ApiError> {
        let builder = with_token(self.http.post(url), token).json(body);
        read_reply(url, builder).await
    }

    pub async fn delete(&self, url: &str, token: Option<&str>) -> Result<ApiReply, ApiError> {
        let builder = with_token(self.http.delete(url), token);
        read_reply(url, builder).await
    }

    /// GET carrying a JSON body, returning the live response for streaming.
    /// Non-success statuses are turned into [`ApiError::Status`].
    pub async fn get_stream<B: Serialize + ?Sized>(
        &self,
        url: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<Response, ApiError> {
        let response = with_token(self.http.get(url), token)
            .json(body)
            .send()
            .await
            .map_err(|err| ApiError::transport(url, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(response)
    }
}

fn with_token(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Token {token}")),
        None => builder,
    }
}

async fn read_reply(url: &str, builder: RequestBuilder) -> Result<ApiReply, ApiError> {
    let response = builder
        .send()
        .await
        .map_err(|err| ApiError::transport(url, err))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| ApiError::transport(url, err))?;
    Ok(ApiReply { status, body })
}

/// JavaScript-style truthiness, which is how the services' flags have always
/// been read.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value the way it would be shown to a user.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub async fn spawn_stub(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }
}
