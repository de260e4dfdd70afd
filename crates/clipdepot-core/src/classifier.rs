//! Content type classification for uploads.
//!
//! The declared `Content-Type` of an uploaded part is parsed with its parameters stripped
//! (`image/jpeg; charset=binary` is `image/jpeg`) and checked against the allow-list of the
//! upload kind. An unparsable header is a malformed request; a well-formed but disallowed
//! type is an unsupported media type. The two map to different statuses.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::AppError;
use crate::models::MediaKind;

pub const THUMBNAIL_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png"];
pub const VIDEO_MEDIA_TYPES: &[&str] = &["video/mp4"];

/// A validated `type/subtype` pair, lowercase, without parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the `/`, used as the file extension of stored objects.
    pub fn subtype(&self) -> &str {
        self.0.split_once('/').map(|(_, sub)| sub).unwrap_or_default()
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a declared content type for the given upload kind.
pub fn classify(declared_content_type: &str, kind: MediaKind) -> Result<MediaType, AppError> {
    let declared = declared_content_type.trim();
    if declared.is_empty() {
        return Err(AppError::MalformedInput(format!(
            "Missing content type for {} upload",
            kind
        )));
    }

    let parsed: mime::Mime = declared.parse().map_err(|e| {
        AppError::MalformedInput(format!("Unparsable content type '{}': {}", declared, e))
    })?;
    if parsed.subtype().as_str().is_empty() {
        return Err(AppError::MalformedInput(format!(
            "Content type '{}' has no subtype",
            declared
        )));
    }
    let essence = parsed.essence_str().to_ascii_lowercase();

    if !kind.allowed_media_types().contains(&essence.as_str()) {
        return Err(AppError::UnsupportedMediaType(format!(
            "Invalid file type for {}: {}. Allowed types: {}",
            kind,
            essence,
            kind.allowed_media_types().join(", ")
        )));
    }

    Ok(MediaType(essence))
}

/// Best-effort content type for an object name, from its extension.
pub fn media_type_for_extension(object_name: &str) -> &'static str {
    let extension = object_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}
