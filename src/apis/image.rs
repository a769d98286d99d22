use reqwest::Response;
use serde::Serialize;

use super::{ApiClient, ApiError};
use crate::config::PortalConfig;

#[derive(Serialize)]
struct CziImageQuery<'a> {
    filename: &'a str,
}

/// Request a rendered CZI image; the body is left unread for streaming.
pub async fn request_czi_image(
    client: &ApiClient,
    config: &PortalConfig,
    admin_token: &str,
    filename: &str,
) -> Result<Response, ApiError> {
    let url = config.image_endpoint("czi_image/");
    client
        .get_stream(&url, Some(admin_token), &CziImageQuery { filename })
        .await
}
