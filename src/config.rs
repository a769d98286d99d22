use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_AUTH_API_URL: &str = "http://127.0.0.1:8000/user_auth";
const DEFAULT_ADMIN_AUTH_API_URL: &str = "http://127.0.0.1:8000/admin_auth";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
const DEFAULT_IMAGE_CACHE_TTL_MINUTES: i64 = 60;
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Directory under the application root that is never served statically.
pub const PROTECTED_DIR_NAME: &str = "protected files";

/// Runtime configuration for the portal, resolved once at startup.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub port: u16,
    pub data_api_url: String,
    pub image_api_url: String,
    pub auth_api_url: String,
    pub admin_auth_api_url: String,
    pub app_root: PathBuf,
    pub database_url: Option<String>,
    pub session_ttl: chrono::Duration,
    pub image_cache_ttl: chrono::Duration,
    pub api_timeout: Duration,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        let data_api_url = env::var("DATA_API_URL").context("DATA_API_URL env var is missing")?;
        let image_api_url =
            env::var("IMAGE_API_URL").context("IMAGE_API_URL env var is missing")?;

        let app_root = match env::var("APP_ROOT") {
            Ok(root) => PathBuf::from(root),
            Err(_) => env::current_dir().context("failed to resolve working directory")?,
        };

        let session_ttl_hours = parse_var("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        let image_ttl_minutes =
            parse_var("IMAGE_CACHE_TTL_MINUTES", DEFAULT_IMAGE_CACHE_TTL_MINUTES)?;
        let timeout_secs = parse_var("API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?;

        if session_ttl_hours <= 0 {
            bail!("SESSION_TTL_HOURS must be positive");
        }

        Ok(Self {
            port: parse_var("PORT", DEFAULT_PORT)?,
            data_api_url: normalize_base_url(&data_api_url),
            image_api_url: normalize_base_url(&image_api_url),
            auth_api_url: env::var("AUTH_API_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_API_URL.to_string()),
            admin_auth_api_url: env::var("ADMIN_AUTH_API_URL")
                .unwrap_or_else(|_| DEFAULT_ADMIN_AUTH_API_URL.to_string()),
            app_root,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            session_ttl: chrono::Duration::hours(session_ttl_hours),
            image_cache_ttl: chrono::Duration::minutes(image_ttl_minutes),
            api_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Configuration pointing every external service at `base`, used when wiring
    /// the portal against a local stand-in.
    #[cfg(test)]
    pub fn for_tests(base: &str, app_root: impl Into<PathBuf>) -> Self {
        let base = normalize_base_url(base);
        Self {
            port: 0,
            data_api_url: base.clone(),
            image_api_url: base.clone(),
            auth_api_url: format!("{base}user_auth"),
            admin_auth_api_url: format!("{base}admin_auth"),
            app_root: app_root.into(),
            database_url: None,
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            image_cache_ttl: chrono::Duration::minutes(DEFAULT_IMAGE_CACHE_TTL_MINUTES),
            api_timeout: Duration::from_secs(5),
        }
    }

    pub fn protected_dir(&self) -> PathBuf {
        self.app_root.join(PROTECTED_DIR_NAME)
    }

    pub fn data_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.data_api_url, path)
    }

    pub fn image_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.image_api_url, path)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Base URLs are joined by plain concatenation, so they must end in `/`.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_gain_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://data.local/api"),
            "http://data.local/api/"
        );
        assert_eq!(
            normalize_base_url(" http://data.local/api/ "),
            "http://data.local/api/"
        );
    }

    #[test]
    fn endpoints_concatenate_onto_base() {
        let config = PortalConfig::for_tests("http://127.0.0.1:9000", "/srv/mbtb");
        assert_eq!(
            config.data_endpoint("add_new_data/"),
            "http://127.0.0.1:9000/add_new_data/"
        );
        assert_eq!(
            config.image_endpoint("czi_image/"),
            "http://127.0.0.1:9000/czi_image/"
        );
        assert_eq!(
            config.protected_dir(),
            PathBuf::from("/srv/mbtb/protected files")
        );
    }
}
