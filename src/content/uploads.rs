use super::ContentError;
use serde::Serialize;
use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};
use tokio::fs;
use tracing::{info, warn};

/// Which admin asset an upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Cv,
    HeroImage,
}

impl UploadKind {
    fn file_stem(&self) -> &'static str {
        match self {
            UploadKind::Cv => "cv",
            UploadKind::HeroImage => "hero",
        }
    }

    /// File extension matching the payload, or `None` when the bytes are not
    /// an accepted format for this kind.
    fn detect_extension(&self, bytes: &[u8]) -> Option<&'static str> {
        match self {
            UploadKind::Cv => bytes.starts_with(b"%PDF-").then_some("pdf"),
            UploadKind::HeroImage => sniff_image(bytes),
        }
    }

    /// Every extension `detect_extension` can produce for this kind.
    fn extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Cv => &["pdf"],
            UploadKind::HeroImage => &["png", "jpg", "gif", "webp"],
        }
    }

    fn accepted_formats(&self) -> &'static str {
        match self {
            UploadKind::Cv => "PDF",
            UploadKind::HeroImage => "PNG, JPEG, WebP or GIF",
        }
    }
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Where an upload ended up and the public URL it is served from.
#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    pub file_name: String,
    pub url: String,
    pub size: usize,
}

/// Uploaded assets on the local filesystem.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validate and write an upload, replacing any earlier file of the
    /// same kind whatever its format.
    pub async fn save(&self, kind: UploadKind, bytes: &[u8]) -> Result<StoredUpload, ContentError> {
        if bytes.is_empty() {
            return Err(ContentError::Validation("Uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(ContentError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        let extension = kind.detect_extension(bytes).ok_or_else(|| {
            ContentError::Validation(format!(
                "Unsupported file type, expected {}",
                kind.accepted_formats()
            ))
        })?;

        fs::create_dir_all(&self.root).await?;
        let file_name = format!("{}.{}", kind.file_stem(), extension);
        let target = self.root.join(&file_name);

        let mut tmp = target.clone().into_os_string();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &target).await?;
        self.remove_other_formats(kind, extension).await;

        info!(file = %file_name, size = bytes.len(), "Stored upload");
        Ok(StoredUpload {
            url: format!("/uploads/{file_name}"),
            file_name,
            size: bytes.len(),
        })
    }

    /// Drop files left by earlier uploads of `kind` in another format.
    async fn remove_other_formats(&self, kind: UploadKind, kept: &str) {
        for extension in kind.extensions().iter().filter(|ext| **ext != kept) {
            let stale = self.root.join(format!("{}.{}", kind.file_stem(), extension));
            match fs::remove_file(&stale).await {
                Ok(()) => info!(file = %stale.display(), "Removed replaced upload"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(file = %stale.display(), "Failed to remove replaced upload: {}", e),
            }
        }
    }

    /// Map a request path onto a file under the upload root. Anything that
    /// could escape the root is refused.
    pub fn resolve(&self, requested: &str) -> Option<PathBuf> {
        if requested.is_empty() || requested.contains('\\') {
            return None;
        }
        let relative = Path::new(requested);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}
