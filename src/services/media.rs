//! Avatar storage.
//!
//! Uploads are written under `{upload_dir}/avatars/` with a random name and
//! served from `{public_base_url}/avatars/`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::errors::ContactbookError;

const AVATAR_DIR: &str = "avatars";

/// Media upload failures
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("uploaded file is empty")]
    Empty,

    #[error("unsupported content type '{0}', expected an image")]
    UnsupportedType(String),

    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("failed to write media: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for ContactbookError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Io(source) => ContactbookError::Io {
                source,
                context: "Failed to store uploaded media".to_string(),
            },
            other => ContactbookError::upload(other.to_string()),
        }
    }
}

/// Persists uploaded files and hands back their public URL
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        filename: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, MediaError>;
}

/// Stores media on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl LocalMediaStore {
    pub fn new<P: AsRef<Path>>(root: P, public_base_url: &str, max_bytes: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(&config.upload_dir, &config.public_base_url, config.max_upload_bytes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Extension for an accepted raster image type. The stored name never takes
/// its extension from the client filename.
fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        filename: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(MediaError::TooLarge { limit: self.max_bytes });
        }

        let content_type = content_type.unwrap_or("application/octet-stream");
        let ext = image_extension(content_type)
            .ok_or_else(|| MediaError::UnsupportedType(content_type.to_string()))?;

        let dir = self.root.join(AVATAR_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::write(dir.join(&name), bytes).await?;

        let url = format!("{}/{}/{}", self.public_base_url, AVATAR_DIR, name);
        info!(%url, "Stored uploaded media");
        Ok(url)
    }
}
