//! Storage key generation.
//!
//! Keys are 32 bytes from the thread-local CSPRNG, URL-safe base64 encoded without padding,
//! followed by the media subtype as extension (`<43 chars>.png`). Nothing about the record,
//! its owner or the clock goes into a key, and no existence check is made before use: the
//! keyspace makes collisions negligible.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::classifier::MediaType;

/// Number of random bytes behind every key.
pub const KEY_ENTROPY_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    id: String,
    extension: String,
}

impl StorageKey {
    /// Generate a fresh key for an object of the given media type.
    pub fn generate(media_type: &MediaType) -> Self {
        let mut entropy = [0u8; KEY_ENTROPY_BYTES];
        rand::rng().fill_bytes(&mut entropy);

        Self {
            id: URL_SAFE_NO_PAD.encode(entropy),
            extension: media_type.subtype().to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Object name under which the blob is stored: `<id>.<extension>`.
    pub fn object_name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}", self.id, self.extension)
    }
}
