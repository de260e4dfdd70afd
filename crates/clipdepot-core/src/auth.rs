use uuid::Uuid;

use crate::error::AppError;

/// Resolves a caller's bearer credentials to a user ID.
///
/// Implementations must return [`AppError::Unauthorized`] for a missing, malformed, expired or
/// otherwise invalid token, and must not perform any I/O against the media record.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, bearer_token: Option<&str>) -> Result<Uuid, AppError>;
}
