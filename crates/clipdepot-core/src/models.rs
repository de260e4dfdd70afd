//! Domain models for media records and upload kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::classifier::{THUMBNAIL_MEDIA_TYPES, VIDEO_MEDIA_TYPES};

/// Logical category of an upload. Each kind has its own allow-list, size ceiling and
/// target URL field on the media record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Thumbnail,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Thumbnail => "thumbnail",
            MediaKind::Video => "video",
        }
    }

    /// Name of the multipart form field that carries the upload.
    pub fn form_field(&self) -> &'static str {
        self.as_str()
    }

    /// Media types (type/subtype, lowercase) accepted for this kind.
    pub fn allowed_media_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Thumbnail => THUMBNAIL_MEDIA_TYPES,
            MediaKind::Video => VIDEO_MEDIA_TYPES,
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "thumbnail" => Ok(MediaKind::Thumbnail),
            "video" => Ok(MediaKind::Video),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

/// Owner-scoped media record. The upload pipeline only ever mutates the URL fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MediaRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaRecord {
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn url(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Thumbnail => self.thumbnail_url.as_deref(),
            MediaKind::Video => self.video_url.as_deref(),
        }
    }

    pub fn set_url(&mut self, kind: MediaKind, url: String) {
        match kind {
            MediaKind::Thumbnail => self.thumbnail_url = Some(url),
            MediaKind::Video => self.video_url = Some(url),
        }
    }
}
