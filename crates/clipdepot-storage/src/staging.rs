//! Staging of inbound uploads.
//!
//! An upload body is copied into a bounded holding area (a memory buffer or a named temp
//! file) before anything is forwarded to a storage backend. Staging reads at most one byte
//! past the ceiling, so an oversized body is detected without buffering it. The resulting
//! [`StagedAsset`] is rewound to byte 0 and can be read once by a backend. Temp files are
//! removed when the asset, or a partially written file on an error path, is dropped.

use clipdepot_core::{MediaType, StagingMode};
use std::io::{Cursor, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, ReadBuf};

const TEMP_FILE_PREFIX: &str = "clipdepot-staging-";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("upload exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },

    #[error("upload is empty")]
    Empty,

    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),
}

enum Holding {
    Memory(Cursor<Vec<u8>>),
    // `file` is declared first so it is closed before `path` removes the file.
    File { file: File, path: TempPath },
}

/// A fully buffered upload of known length, positioned at byte 0.
pub struct StagedAsset {
    holding: Holding,
    len: u64,
    media_type: MediaType,
}

impl StagedAsset {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    /// Location of the backing temp file, if staged to disk.
    pub fn temp_path(&self) -> Option<&Path> {
        match &self.holding {
            Holding::Memory(_) => None,
            Holding::File { path, .. } => Some(path),
        }
    }

    /// Destroy the staged bytes now, removing the temp file if there is one.
    ///
    /// Unlike a plain drop, a failed removal is reported to the caller.
    pub fn release(self) -> std::io::Result<()> {
        match self.holding {
            Holding::Memory(_) => Ok(()),
            Holding::File { file, path } => {
                drop(file);
                tracing::debug!(path = %path.display(), size_bytes = self.len, "Removing staged upload");
                path.close()
            }
        }
    }
}

impl AsyncRead for StagedAsset {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match &mut self.get_mut().holding {
            Holding::Memory(cursor) => Pin::new(cursor).poll_read(cx, buf),
            Holding::File { file, .. } => Pin::new(file).poll_read(cx, buf),
        }
    }
}

/// Creates staged assets under a fixed directory. Requests never share a staging file.
#[derive(Debug, Clone)]
pub struct StagingManager {
    dir: PathBuf,
}

impl StagingManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Buffer `reader` into a staged asset of at most `max_bytes`.
    ///
    /// `declared_length` is a lower bound on the body size, when one is known. It is only
    /// used to fail fast and to size the memory buffer; the actual byte count is always
    /// measured.
    pub async fn stage<R>(
        &self,
        reader: &mut R,
        media_type: MediaType,
        max_bytes: u64,
        mode: StagingMode,
        declared_length: Option<u64>,
    ) -> Result<StagedAsset, StagingError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if declared_length.is_some_and(|declared| declared > max_bytes) {
            return Err(StagingError::TooLarge { max_bytes });
        }

        let mut limited = reader.take(max_bytes.saturating_add(1));
        let start = std::time::Instant::now();

        let (holding, len) = match mode {
            StagingMode::Memory => {
                let capacity = declared_length.unwrap_or(0).min(max_bytes);
                let mut buffer = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));
                limited.read_to_end(&mut buffer).await?;
                let len = buffer.len() as u64;
                if len > max_bytes {
                    return Err(StagingError::TooLarge { max_bytes });
                }
                (Holding::Memory(Cursor::new(buffer)), len)
            }
            StagingMode::File => {
                tokio::fs::create_dir_all(&self.dir).await?;
                let named = tempfile::Builder::new()
                    .prefix(TEMP_FILE_PREFIX)
                    .tempfile_in(&self.dir)?;
                // Dropping `path` on any early return below removes the partial file.
                let (std_file, path) = named.into_parts();
                let mut file = File::from_std(std_file);

                let len = tokio::io::copy(&mut limited, &mut file).await?;
                if len > max_bytes {
                    return Err(StagingError::TooLarge { max_bytes });
                }
                file.flush().await?;
                file.seek(SeekFrom::Start(0)).await?;
                (Holding::File { file, path }, len)
            }
        };

        if len == 0 {
            return Err(StagingError::Empty);
        }

        tracing::debug!(
            media_type = %media_type,
            mode = %mode,
            size_bytes = len,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload staged"
        );

        Ok(StagedAsset {
            holding,
            len,
            media_type,
        })
    }
}
