//! Request, outcome and state types of the upload orchestrator.

use clipdepot_core::{MediaKind, MediaRecord};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// One upload attempt against one media record.
pub struct UploadRequest<'a, R> {
    pub bearer_token: Option<&'a str>,
    pub record_id: Uuid,
    pub kind: MediaKind,
    /// Content type exactly as the client declared it for the uploaded part.
    pub declared_content_type: &'a str,
    /// Lower bound on the part size, used to refuse oversized bodies before reading them.
    pub declared_length: Option<u64>,
    pub body: R,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub record: MediaRecord,
    pub url: String,
    pub object_name: String,
    pub size_bytes: u64,
}

/// Orchestrator states. Transitions are strictly linear; any state may end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Authorizing,
    Validating,
    Staging,
    Storing,
    Linking,
    Done,
    Failed,
}

impl UploadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::Authorizing => "authorizing",
            UploadState::Validating => "validating",
            UploadState::Staging => "staging",
            UploadState::Storing => "storing",
            UploadState::Linking => "linking",
            UploadState::Done => "done",
            UploadState::Failed => "failed",
        }
    }
}

impl Display for UploadState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
