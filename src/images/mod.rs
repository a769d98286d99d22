//! Image retrieval gate.
//!
//! Pulls a rendered CZI image from the image API into the protected
//! directory and authorizes the caller's session to view exactly that file
//! through `/admin_images/czi/{filename}`.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::SystemTime,
};

use futures::StreamExt;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    apis::{self, ApiClient, ApiError},
    config::PortalConfig,
    web::session::Session,
};

pub const CZI_SUBDIR: &str = "czi";
pub const SERVED_PREFIX: &str = "/admin_images/czi/";
const IMAGE_EXTENSION: &str = "png";
const PARTIAL_EXTENSION: &str = "partial";
const NAME_MAX: usize = 255;
/// Room for the `.png` suffix within a single path component.
const MAX_FILENAME_BYTES: usize = NAME_MAX - IMAGE_EXTENSION.len() - 1;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("filename {0:?} is not allowed")]
    InvalidFilename(String),
    #[error("session has no admin token")]
    MissingToken,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// A client-supplied image identifier that is safe to use as a file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName(String);

impl ImageName {
    pub fn parse(raw: &str) -> Result<Self, ImageError> {
        let reject = || ImageError::InvalidFilename(raw.to_string());

        if raw.is_empty() || raw.len() > MAX_FILENAME_BYTES || raw.starts_with('.') {
            return Err(reject());
        }
        if sanitize_filename::sanitize(raw) != raw {
            return Err(reject());
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Relative URL the viewer loads once the session has been authorized.
    pub fn served_url(&self) -> String {
        format!("{SERVED_PREFIX}{}", urlencoding::encode(&self.0))
    }
}

/// On-disk cache of retrieved images under `<protected>/czi`.
#[derive(Clone, Debug)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(protected_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: protected_dir.as_ref().join(CZI_SUBDIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn image_path(&self, name: &ImageName) -> PathBuf {
        self.dir.join(format!("{}.{IMAGE_EXTENSION}", name.as_str()))
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Write `response` to the image's path, returning the byte count.
    ///
    /// Bytes land in a private temp file first and are renamed into place,
    /// so readers and concurrent writers only ever see complete files.
    async fn store(&self, name: &ImageName, response: reqwest::Response) -> Result<u64, ImageError> {
        self.ensure_dir().await?;

        let temp_path = self
            .dir
            .join(format!(".{}.{PARTIAL_EXTENSION}", Uuid::new_v4()));

        let stored = match write_stream(&temp_path, response).await {
            Ok(written) => fs::rename(&temp_path, self.image_path(name))
                .await
                .map(|()| written)
                .map_err(ImageError::from),
            Err(err) => Err(err),
        };

        if stored.is_err() {
            if let Err(cleanup_err) = fs::remove_file(&temp_path).await {
                if cleanup_err.kind() != ErrorKind::NotFound {
                    warn!(?cleanup_err, file = %temp_path.display(), "failed to remove partial image");
                }
            }
        }
        stored
    }

    /// Remove cached images (and abandoned partial writes) last modified
    /// before `max_age` ago.
    pub async fn evict_older_than(&self, max_age: chrono::Duration) -> std::io::Result<u64> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err),
        };

        let max_age = max_age.to_std().unwrap_or_default();
        let now = SystemTime::now();
        let mut removed = 0_u64;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_cached = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == IMAGE_EXTENSION || ext == PARTIAL_EXTENSION);
            if !is_cached {
                continue;
            }

            // A concurrent writer may have renamed or evicted it already.
            let metadata = match fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            };
            if !metadata.is_file() {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();

            if age >= max_age {
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(removed)
    }
}

async fn write_stream(path: &Path, response: reqwest::Response) -> Result<u64, ImageError> {
    let url = response.url().to_string();
    let mut file = fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0_u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// Fetch `filename` from the image API and authorize the session to view it.
///
/// The session is only touched once the file is completely on disk; every
/// failure is returned to the caller.
pub async fn retrieve_image(
    client: &ApiClient,
    config: &PortalConfig,
    cache: &ImageCache,
    session: &mut Session,
    filename: &str,
) -> Result<String, ImageError> {
    let name = ImageName::parse(filename)?;
    let token = session
        .admin_auth_token
        .clone()
        .ok_or(ImageError::MissingToken)?;

    let response = apis::image::request_czi_image(client, config, &token, name.as_str()).await?;
    let bytes = cache.store(&name, response).await?;

    session.admin_filename = Some(name.as_str().to_string());
    session.admin_file_access = true;

    info!(filename = name.as_str(), bytes, "image retrieved");
    Ok(name.served_url())
}
