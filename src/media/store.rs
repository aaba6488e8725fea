//! Upload storage on local disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::UploadConfig;

const VIDEO_SUBDIR: &str = "videos";

const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("File size exceeds limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("File type not allowed: {0}")]
    TypeNotAllowed(String),

    #[error("File must be a video")]
    NotAVideo,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    File,
    Video,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::File => "file",
            UploadKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_bytes: usize,
    pub allowed_types: Vec<String>,
}

impl UploadLimits {
    pub fn allows(&self, content_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(content_type))
    }
}

/// A file accepted by an upload endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    pub url: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A file found in the uploads directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub name: String,
    pub url: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
    file_limits: UploadLimits,
    video_limits: UploadLimits,
}

impl MediaStore {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            root: PathBuf::from(&config.dir),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
            file_limits: UploadLimits {
                max_bytes: config.max_file_bytes,
                allowed_types: config.allowed_file_types.clone(),
            },
            video_limits: UploadLimits {
                max_bytes: config.max_video_bytes,
                allowed_types: config.allowed_video_types.clone(),
            },
        }
    }

    fn limits(&self, kind: UploadKind) -> &UploadLimits {
        match kind {
            UploadKind::File => &self.file_limits,
            UploadKind::Video => &self.video_limits,
        }
    }

    /// Validate the declared type and open a fresh file for the upload body,
    /// creating the target directory if needed.
    pub async fn begin(
        &self,
        kind: UploadKind,
        original_name: &str,
        content_type: &str,
    ) -> Result<PendingUpload, MediaError> {
        let limits = self.limits(kind);
        if !limits.allows(content_type) {
            return Err(match kind {
                UploadKind::Video => MediaError::NotAVideo,
                UploadKind::File => MediaError::TypeNotAllowed(content_type.to_string()),
            });
        }

        let (dir, url_dir) = match kind {
            UploadKind::File => (self.root.clone(), self.url_prefix.clone()),
            UploadKind::Video => (
                self.root.join(VIDEO_SUBDIR),
                format!("{}/{}", self.url_prefix, VIDEO_SUBDIR),
            ),
        };
        fs::create_dir_all(&dir).await?;

        let (file, file_name) = create_unique(&dir, original_name, unix_millis()).await?;

        Ok(PendingUpload {
            file,
            path: dir.join(&file_name),
            url: format!("{url_dir}/{file_name}"),
            file_name,
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            kind,
            written: 0,
            max_bytes: limits.max_bytes as u64,
        })
    }

    /// Top-level files of the uploads directory, newest first.
    /// A missing directory is an empty library.
    pub async fn list(&self) -> Result<Vec<MediaEntry>, MediaError> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(UNIX_EPOCH);

            entries.push(MediaEntry {
                url: format!("{}/{}", self.url_prefix, name),
                name,
                size: metadata.len(),
                uploaded_at: DateTime::<Utc>::from(created),
            });
        }

        entries.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then_with(|| b.name.cmp(&a.name)));
        Ok(entries)
    }
}

/// An upload being written to disk chunk by chunk.
///
/// Either [`finish`](Self::finish) or [`discard`](Self::discard) it; a
/// rejected chunk leaves the partial file in place until discarded.
#[derive(Debug)]
pub struct PendingUpload {
    file: fs::File,
    path: PathBuf,
    file_name: String,
    url: String,
    original_name: String,
    content_type: String,
    kind: UploadKind,
    written: u64,
    max_bytes: u64,
}

impl PendingUpload {
    /// Append `chunk`, refusing it once the total would pass the size limit.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), MediaError> {
        let total = self.written.saturating_add(chunk.len() as u64);
        if total > self.max_bytes {
            return Err(MediaError::TooLarge {
                limit: self.max_bytes as usize,
            });
        }
        self.file.write_all(chunk).await?;
        self.written = total;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredFile, MediaError> {
        if let Err(e) = self.file.flush().await {
            self.discard().await;
            return Err(e.into());
        }

        tracing::info!(
            kind = self.kind.as_str(),
            file = %self.file_name,
            size = self.written,
            "Upload stored"
        );

        Ok(StoredFile {
            name: self.original_name,
            url: self.url,
            size: self.written,
            content_type: self.content_type,
            uploaded_at: Utc::now(),
        })
    }

    /// Remove the partial file.
    pub async fn discard(self) {
        let Self { file, path, .. } = self;
        drop(file);
        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
        }
    }
}

/// Open `<millis>-<name>` in `dir` without replacing an existing file,
/// falling back to `<millis>-<n>-<name>` on collisions.
async fn create_unique(
    dir: &Path,
    original_name: &str,
    millis: u128,
) -> std::io::Result<(fs::File, String)> {
    let base = disk_file_name(original_name, millis);
    let mut attempt = 0;
    loop {
        let file_name = if attempt == 0 {
            base.clone()
        } else {
            base.replacen('-', &format!("-{attempt}-"), 1)
        };

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&file_name))
            .await
        {
            Ok(file) => return Ok((file, file_name)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// `<millis>-<name>` with everything outside `[A-Za-z0-9.-]` replaced by `_`.
pub fn disk_file_name(original_name: &str, millis: u128) -> String {
    let sanitized: String = original_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    };
    format!("{millis}-{sanitized}")
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
