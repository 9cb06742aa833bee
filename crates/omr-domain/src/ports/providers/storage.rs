//! Shared artifact store port.
//!
//! A content-addressed file directory on a mounted volume. Messages in
//! flight convey paths relative to its root; workers read bytes through
//! this port. Concurrent readers are fine; each path has at most one
//! writer because paths embed a uuid suffix.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Bookkeeping document for a chunked upload
/// (`temp/uploads/<uploadId>/metadata.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub upload_id: String,
    pub total_chunks: u32,
    pub final_path: String,
    pub chunks_received: Vec<u32>,
}

impl UploadMetadata {
    /// Returns `true` once every chunk `0..total_chunks` has been seen.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        (0..self.total_chunks).all(|i| self.chunks_received.contains(&i))
    }

    /// Chunk indices not yet received, sorted.
    #[must_use]
    pub fn missing_chunks(&self) -> Vec<u32> {
        (0..self.total_chunks)
            .filter(|i| !self.chunks_received.contains(i))
            .collect()
    }
}

/// File/blob operations on the shared volume.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` at `rel_path`, creating parent directories. The write
    /// is atomic (temp-then-rename).
    async fn save(&self, rel_path: &str, bytes: &[u8]) -> Result<()>;

    /// Read the artifact at `rel_path`; `NotFound` if absent.
    async fn get(&self, rel_path: &str) -> Result<Vec<u8>>;

    /// Returns `true` if an artifact exists at `rel_path`.
    async fn exists(&self, rel_path: &str) -> Result<bool>;

    /// Size in bytes of the artifact at `rel_path`; `NotFound` if absent.
    async fn size(&self, rel_path: &str) -> Result<u64>;

    /// Remove the artifact at `rel_path`. Idempotent.
    async fn delete(&self, rel_path: &str) -> Result<()>;

    /// List files under `prefix` whose names match `pattern` (glob),
    /// as root-relative paths sorted lexicographically.
    async fn list(&self, prefix: &str, pattern: &str) -> Result<Vec<String>>;

    /// Stage one chunk of a chunked upload and record it in the upload's
    /// metadata. The metadata update is read-modify-write under a file
    /// lock; concurrent chunks must not lose each other's receipts.
    async fn save_chunk(
        &self,
        upload_id: &str,
        chunk_index: u32,
        total_chunks: u32,
        final_path: &str,
        bytes: &[u8],
    ) -> Result<()>;

    /// Read the upload's metadata document, if any.
    async fn upload_metadata(&self, upload_id: &str) -> Result<Option<UploadMetadata>>;

    /// Stream chunks `0..total_chunks` in order into `final_path`. Fails
    /// with `NotFound` naming the first missing chunk.
    async fn combine_chunks(
        &self,
        upload_id: &str,
        total_chunks: u32,
        final_path: &str,
    ) -> Result<()>;

    /// Drop the upload staging directory. Idempotent.
    async fn delete_upload(&self, upload_id: &str) -> Result<()>;

    /// Expand a `.zip` artifact into a sibling directory and delete the
    /// archive. Returns the extracted directory's root-relative path.
    async fn extract_zip(&self, rel_path: &str) -> Result<String>;
}
