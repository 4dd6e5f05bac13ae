// src/media.rs
//
// Evidence photos and videos attached to complaints. Files live in one
// directory under names of the form `<16-char token>_<sanitized name>`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::auth::token::{generate_upload_token, is_token_char, UPLOAD_TOKEN_LEN};
use crate::errors::ComplaintError;

pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "mp4", "avi", "mov"];

/// How the channel should deliver an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

pub fn kind_of(name: &str) -> MediaKind {
    match extension(name).as_deref() {
        Some("png" | "jpg" | "jpeg") => MediaKind::Photo,
        Some("mp4" | "avi" | "mov") => MediaKind::Video,
        _ => MediaKind::Document,
    }
}

pub fn mime_of(name: &str) -> mime::Mime {
    match extension(name).as_deref() {
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("mp4") => "video/mp4".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        Some("mov") => "video/quicktime".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        Some("avi") => "video/x-msvideo".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Reduce a client-supplied file name to a safe one: last path component,
/// ASCII letters, digits, `.`, `-`, `_` only, no leading dots.
/// Returns `None` when nothing usable is left or the extension is not allowed.
pub fn sanitize_file_name(original: &str) -> Option<String> {
    let last = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();

    let ext = extension(&cleaned)?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) || cleaned.len() > 200 {
        return None;
    }
    Some(cleaned)
}

/// True for names `MediaStore::store` can have produced.
pub fn is_stored_name(name: &str) -> bool {
    if name.len() <= UPLOAD_TOKEN_LEN + 1 || !name.is_char_boundary(UPLOAD_TOKEN_LEN) {
        return false;
    }
    let (token, rest) = name.split_at(UPLOAD_TOKEN_LEN);
    let Some(original) = rest.strip_prefix('_') else {
        return false;
    };
    token.chars().all(is_token_char) && sanitize_file_name(original).as_deref() == Some(original)
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an upload and return the name to put in `media_ref`.
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, ComplaintError> {
        let clean = sanitize_file_name(original_name).ok_or_else(|| {
            ComplaintError::Validation(format!(
                "file type not allowed, use one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;
        if bytes.is_empty() {
            return Err(ComplaintError::Validation("uploaded file is empty".into()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ComplaintError::Validation(format!(
                "uploaded file exceeds {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| ComplaintError::Storage(format!("create upload dir failed: {e}")))?;

        let name = format!("{}_{}", generate_upload_token(), clean);
        fs::write(self.dir.join(&name), bytes)
            .map_err(|e| ComplaintError::Storage(format!("write upload failed: {e}")))?;

        info!(media = %name, size = bytes.len(), "stored upload");
        Ok(name)
    }

    /// Path of a stored file, or `None` if the name is not one of ours or
    /// the file is gone. Absence is expected and never an error.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_stored_name(name) {
            debug!(media = %name, "refusing to resolve foreign media name");
            return None;
        }
        let path = self.dir.join(name);
        path.is_file().then_some(path)
    }
}
