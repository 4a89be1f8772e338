use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{ObjectStore, StorageError};
use crate::config::StorageConfig;
use crate::content::slugify;
use crate::store::{Collection, DocumentStore};

/// Every media-library object lives under this prefix.
pub const UPLOAD_PREFIX: &str = "uploads/";

/// Collections scanned for URL references when a file is renamed.
const REFERENCING_COLLECTIONS: [Collection; 3] = [
    Collection::Stories,
    Collection::BlogPosts,
    Collection::Settings,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

fn extension(key: &str) -> Option<String> {
    let name = key.rsplit('/').next().unwrap_or(key);
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Classify an object key by its extension, case-insensitively.
pub fn classify(key: &str) -> FileKind {
    match extension(key).as_deref() {
        Some("jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "ico") => FileKind::Image,
        Some("mp4" | "mov" | "webm" | "mkv" | "avi") => FileKind::Video,
        Some("mp3" | "wav" | "m4a" | "ogg" | "flac") => FileKind::Audio,
        Some("pdf" | "doc" | "docx" | "txt") => FileKind::Document,
        _ => FileKind::Other,
    }
}

/// Characters that can continue a URL; a match followed or preceded by one
/// of these is part of a different URL.
fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~:/?#[]@!$&'()*+,;=%".contains(c)
}

/// Replace whole-URL occurrences of `old` in `s`. `None` when nothing matched.
fn replace_url(s: &str, old: &str, new: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    let mut replaced = false;
    while let Some(pos) = rest.find(old) {
        let end = pos + old.len();
        let before_ok = rest[..pos]
            .chars()
            .next_back()
            .or_else(|| out.chars().next_back())
            .is_none_or(|c| !is_url_char(c));
        let after_ok = rest[end..].chars().next().is_none_or(|c| !is_url_char(c));
        out.push_str(&rest[..pos]);
        if before_ok && after_ok {
            out.push_str(new);
            replaced = true;
        } else {
            out.push_str(old);
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    replaced.then_some(out)
}

/// Replace `old` with `new` wherever it appears as a whole URL in a string
/// of a JSON tree (`old.jpg.bak` and `old.jpg?v=2` are left alone). Returns
/// how many strings changed.
pub fn rewrite_urls(value: &mut Value, old: &str, new: &str) -> usize {
    match value {
        Value::String(s) => match replace_url(s, old, new) {
            Some(updated) => {
                *s = updated;
                1
            }
            None => 0,
        },
        Value::Array(items) => items.iter_mut().map(|v| rewrite_urls(v, old, new)).sum(),
        Value::Object(map) => map.values_mut().map(|v| rewrite_urls(v, old, new)).sum(),
        _ => 0,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub key: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOutcome {
    pub message: String,
    pub new_key: String,
    pub new_url: String,
    pub references_updated: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub total_usage: u64,
    pub quota: u64,
    /// Absent when no quota is configured.
    pub percentage: Option<f64>,
}

impl StorageUsage {
    pub fn new(total_usage: u64, quota: u64) -> Self {
        let percentage = (quota > 0).then(|| total_usage as f64 / quota as f64 * 100.0);
        Self {
            total_usage,
            quota,
            percentage,
        }
    }
}

/// Media-library operations over an object store.
#[derive(Clone)]
pub struct FileService {
    objects: Arc<dyn ObjectStore>,
    documents: Arc<dyn DocumentStore>,
    public_base_url: String,
    quota_bytes: u64,
    max_upload_bytes: usize,
}

impl FileService {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        documents: Arc<dyn DocumentStore>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            objects,
            documents,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            quota_bytes: config.quota_bytes(),
            max_upload_bytes: config.upload_max_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn backend(&self) -> &'static str {
        self.objects.backend()
    }

    pub async fn ping(&self) -> Result<(), StorageError> {
        self.objects.ping().await
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn check_upload_key(key: &str) -> Result<(), StorageError> {
        let name = key.strip_prefix(UPLOAD_PREFIX).unwrap_or_default();
        if name.is_empty() || name.contains("..") {
            return Err(StorageError::InvalidRequest(format!(
                "Key must be a file under {}",
                UPLOAD_PREFIX
            )));
        }
        Ok(())
    }

    /// Store a file under a random key and return its public URL.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<UploadedFile, StorageError> {
        if body.is_empty() {
            return Err(StorageError::InvalidRequest("File is empty".to_string()));
        }
        if body.len() > self.max_upload_bytes {
            return Err(StorageError::TooLarge {
                max: self.max_upload_bytes,
            });
        }

        let ext = extension(file_name)
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let key = format!("{}{}{}", UPLOAD_PREFIX, Uuid::new_v4(), ext);
        let content_type = content_type.unwrap_or("application/octet-stream");
        let size = body.len();

        self.objects.put(&key, body, content_type).await?;

        tracing::info!(%key, size, content_type, original = file_name, "file uploaded");

        Ok(UploadedFile {
            url: self.public_url(&key),
            key,
        })
    }

    /// Non-empty files under the upload prefix, newest-named first.
    pub async fn list(&self) -> Result<Vec<StoredFile>, StorageError> {
        let mut files: Vec<StoredFile> = self
            .objects
            .list(UPLOAD_PREFIX)
            .await?
            .into_iter()
            .filter(|object| object.size > 0)
            .map(|object| StoredFile {
                url: self.public_url(&object.key),
                kind: classify(&object.key),
                size: object.size,
                key: object.key,
            })
            .collect();
        files.sort_by(|a, b| b.key.cmp(&a.key));
        Ok(files)
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        Self::check_upload_key(key)?;
        self.objects.delete(key).await?;
        tracing::info!(%key, "file deleted");
        Ok(())
    }

    /// Rename a file to a slug of `new_name`, keeping its extension, then
    /// point every stored document at the new URL.
    ///
    /// Copy, delete and rewrite run in sequence with no rollback: a failure
    /// part-way leaves the earlier steps applied.
    pub async fn rename(&self, old_key: &str, new_name: &str) -> Result<RenameOutcome, StorageError> {
        Self::check_upload_key(old_key)?;

        let ext = extension(old_key).ok_or_else(|| {
            StorageError::InvalidRequest("File has no extension".to_string())
        })?;

        let wanted = new_name.trim();
        let wanted = wanted
            .len()
            .checked_sub(ext.len() + 1)
            .filter(|&cut| wanted.is_char_boundary(cut))
            .map(|cut| wanted.split_at(cut))
            .filter(|(_, tail)| tail.eq_ignore_ascii_case(&format!(".{}", ext)))
            .map(|(head, _)| head)
            .unwrap_or(wanted);

        let slug = slugify(wanted);
        if slug.is_empty() {
            return Err(StorageError::InvalidRequest(
                "New name must contain letters or numbers".to_string(),
            ));
        }

        if !self.objects.exists(old_key).await? {
            return Err(StorageError::NotFound(old_key.to_string()));
        }

        let mut new_key = format!("{}{}.{}", UPLOAD_PREFIX, slug, ext);
        let mut suffix = 2;
        while new_key != old_key && self.objects.exists(&new_key).await? {
            new_key = format!("{}{}-{}.{}", UPLOAD_PREFIX, slug, suffix, ext);
            suffix += 1;
        }

        let new_url = self.public_url(&new_key);
        if new_key == old_key {
            return Ok(RenameOutcome {
                message: "File name unchanged".to_string(),
                new_key,
                new_url,
                references_updated: 0,
            });
        }

        self.objects.copy(old_key, &new_key).await?;
        if let Err(e) = self.objects.delete(old_key).await {
            tracing::error!(%old_key, %new_key, error = %e, "rename: copied but failed to delete old key");
            return Err(e);
        }

        let references_updated = self
            .rewrite_references(&self.public_url(old_key), &new_url)
            .await
            .map_err(|e| {
                tracing::error!(%old_key, %new_key, error = %e, "rename: reference rewrite failed");
                StorageError::Backend(format!("File renamed but references were not updated: {}", e))
            })?;

        tracing::info!(%old_key, %new_key, references_updated, "file renamed");

        Ok(RenameOutcome {
            message: "File renamed successfully".to_string(),
            new_key,
            new_url,
            references_updated,
        })
    }

    /// Rewrite `old_url` to `new_url` across the referencing collections.
    /// Returns the number of documents changed.
    async fn rewrite_references(
        &self,
        old_url: &str,
        new_url: &str,
    ) -> Result<usize, crate::store::StoreError> {
        let mut updated = 0;
        for collection in REFERENCING_COLLECTIONS {
            for doc in self.documents.list(collection).await? {
                let mut data = doc.data;
                if rewrite_urls(&mut data, old_url, new_url) > 0 {
                    self.documents.replace(collection, &doc.id, data).await?;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    /// Bytes used across the whole bucket against the configured quota.
    pub async fn usage(&self) -> Result<StorageUsage, StorageError> {
        let total: u64 = self.objects.list("").await?.iter().map(|o| o.size).sum();
        Ok(StorageUsage::new(total, self.quota_bytes))
    }
}
