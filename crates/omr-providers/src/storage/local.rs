//! Filesystem artifact store rooted at a mounted shared volume.
//!
//! Writes are atomic (temp-then-rename within the target directory).
//! Chunked-upload metadata is read-modify-written under an exclusive file
//! lock so concurrent chunk receipts never lose each other.

use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use globset::Glob;
use uuid::Uuid;
use walkdir::WalkDir;

use omr_domain::constants::storage::UPLOAD_METADATA_FILE;
use omr_domain::error::{Error, Result};
use omr_domain::ports::{ArtifactStore, UploadMetadata};
use omr_domain::value_objects::paths::{chunk_file_name, upload_staging_dir};

/// Artifact store over a local (or NFS-mounted) directory.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| Error::storage_with_source("could not create artifact root", e))?;
        Ok(Self { root })
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel_path: &str) -> Result<PathBuf> {
        let rel = Path::new(rel_path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(Error::invalid_argument(format!(
                "artifact path escapes the store root: {rel_path}"
            )));
        }
        Ok(self.root.join(rel))
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let parent = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;
        let tmp = parent.join(format!(".{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp, bytes)?;
        match fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                Err(e)
            }
        }
    }

    fn staging_dir(&self, upload_id: &str) -> Result<PathBuf> {
        self.resolve(&upload_staging_dir(upload_id))
    }

    /// Update the upload's metadata under an exclusive lock, creating it if
    /// this is the first chunk to arrive.
    fn record_chunk_locked(
        dir: &Path,
        upload_id: &str,
        chunk_index: u32,
        total_chunks: u32,
        final_path: &str,
    ) -> Result<()> {
        let lock_path = dir.join(".metadata.lock");
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Error::storage_with_source("could not open upload lock", e))?;
        lock.lock_exclusive()
            .map_err(|e| Error::storage_with_source("could not lock upload metadata", e))?;

        let metadata_path = dir.join(UPLOAD_METADATA_FILE);
        let mut metadata = match fs::read(&metadata_path) {
            Ok(bytes) => serde_json::from_slice::<UploadMetadata>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UploadMetadata {
                upload_id: upload_id.to_owned(),
                total_chunks,
                final_path: final_path.to_owned(),
                chunks_received: Vec::new(),
            },
            Err(e) => {
                let _ = FileExt::unlock(&lock);
                return Err(Error::storage_with_source("could not read upload metadata", e));
            }
        };
        if !metadata.chunks_received.contains(&chunk_index) {
            metadata.chunks_received.push(chunk_index);
            metadata.chunks_received.sort_unstable();
        }

        let outcome = Self::write_atomic(&metadata_path, &serde_json::to_vec_pretty(&metadata)?)
            .map_err(|e| Error::storage_with_source("could not write upload metadata", e));
        let _ = FileExt::unlock(&lock);
        outcome
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn save(&self, rel_path: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(rel_path)?;
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || Self::write_atomic(&path, &bytes))
            .await
            .map_err(|e| Error::internal(format!("storage task panicked: {e}")))?
            .map_err(|e| Error::storage_with_source("could not save artifact", e))
    }

    async fn get(&self, rel_path: &str) -> Result<Vec<u8>> {
        let path = self.resolve(rel_path)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(rel_path))
            }
            Err(e) => Err(Error::storage_with_source("could not read artifact", e)),
        }
    }

    async fn exists(&self, rel_path: &str) -> Result<bool> {
        let path = self.resolve(rel_path)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn size(&self, rel_path: &str) -> Result<u64> {
        let path = self.resolve(rel_path)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(rel_path))
            }
            Err(e) => Err(Error::storage_with_source("could not stat artifact", e)),
        }
    }

    async fn delete(&self, rel_path: &str) -> Result<()> {
        let path = self.resolve(rel_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage_with_source("could not delete artifact", e)),
        }
    }

    async fn list(&self, prefix: &str, pattern: &str) -> Result<Vec<String>> {
        let base = self.resolve(prefix)?;
        let root = self.root.clone();
        let matcher = Glob::new(pattern)
            .map_err(|e| Error::invalid_argument(format!("bad glob pattern '{pattern}': {e}")))?
            .compile_matcher();

        tokio::task::spawn_blocking(move || {
            let mut paths = Vec::new();
            for entry in WalkDir::new(&base).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                if !matcher.is_match(entry.file_name()) {
                    continue;
                }
                if let Ok(rel) = entry.path().strip_prefix(&root) {
                    paths.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
            paths.sort();
            Ok(paths)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task panicked: {e}")))?
    }

    async fn save_chunk(
        &self,
        upload_id: &str,
        chunk_index: u32,
        total_chunks: u32,
        final_path: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let dir = self.staging_dir(upload_id)?;
        let upload_id = upload_id.to_owned();
        let final_path = final_path.to_owned();
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || {
            fs::create_dir_all(&dir)
                .map_err(|e| Error::storage_with_source("could not create staging dir", e))?;
            Self::write_atomic(&dir.join(chunk_file_name(chunk_index)), &bytes)
                .map_err(|e| Error::storage_with_source("could not write chunk", e))?;
            Self::record_chunk_locked(&dir, &upload_id, chunk_index, total_chunks, &final_path)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task panicked: {e}")))?
    }

    async fn upload_metadata(&self, upload_id: &str) -> Result<Option<UploadMetadata>> {
        let path = self.staging_dir(upload_id)?.join(UPLOAD_METADATA_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage_with_source("could not read upload metadata", e)),
        }
    }

    async fn combine_chunks(
        &self,
        upload_id: &str,
        total_chunks: u32,
        final_path: &str,
    ) -> Result<()> {
        let dir = self.staging_dir(upload_id)?;
        let target = self.resolve(final_path)?;
        tokio::task::spawn_blocking(move || {
            let parent = target.parent().unwrap_or(Path::new("."));
            fs::create_dir_all(parent)
                .map_err(|e| Error::storage_with_source("could not create target dir", e))?;
            let tmp = parent.join(format!(".{}.tmp", Uuid::new_v4().simple()));
            let mut out = fs::File::create(&tmp)
                .map_err(|e| Error::storage_with_source("could not create combined file", e))?;

            for index in 0..total_chunks {
                let chunk_path = dir.join(chunk_file_name(index));
                let mut chunk = fs::File::open(&chunk_path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::not_found(chunk_file_name(index))
                    } else {
                        Error::storage_with_source("could not open chunk", e)
                    }
                })?;
                let mut buffer = [0u8; 8192];
                loop {
                    let n = chunk
                        .read(&mut buffer)
                        .map_err(|e| Error::storage_with_source("could not read chunk", e))?;
                    if n == 0 {
                        break;
                    }
                    out.write_all(&buffer[..n])
                        .map_err(|e| Error::storage_with_source("could not write chunk", e))?;
                }
            }
            out.flush()
                .map_err(|e| Error::storage_with_source("could not flush combined file", e))?;
            drop(out);
            fs::rename(&tmp, &target)
                .map_err(|e| Error::storage_with_source("could not finalize combined file", e))
        })
        .await
        .map_err(|e| Error::internal(format!("storage task panicked: {e}")))?
    }

    async fn delete_upload(&self, upload_id: &str) -> Result<()> {
        let dir = self.staging_dir(upload_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage_with_source("could not delete upload", e)),
        }
    }

    async fn extract_zip(&self, rel_path: &str) -> Result<String> {
        let archive_path = self.resolve(rel_path)?;
        let extracted_rel = rel_path
            .strip_suffix(".zip")
            .ok_or_else(|| Error::invalid_argument(format!("not a zip archive: {rel_path}")))?
            .to_owned();
        let target_dir = self.resolve(&extracted_rel)?;

        tokio::task::spawn_blocking(move || {
            let file = fs::File::open(&archive_path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::not_found(archive_path.to_string_lossy().into_owned())
                } else {
                    Error::storage_with_source("could not open archive", e)
                }
            })?;
            let mut archive = zip::ZipArchive::new(file)
                .map_err(|e| Error::storage_with_source("could not read archive", e))?;
            fs::create_dir_all(&target_dir)
                .map_err(|e| Error::storage_with_source("could not create extraction dir", e))?;

            for i in 0..archive.len() {
                let mut entry = archive
                    .by_index(i)
                    .map_err(|e| Error::storage_with_source("could not read archive entry", e))?;
                let Some(name) = entry.enclosed_name() else {
                    continue;
                };
                let out_path = target_dir.join(name);
                if entry.is_dir() {
                    fs::create_dir_all(&out_path).map_err(|e| {
                        Error::storage_with_source("could not create extracted dir", e)
                    })?;
                    continue;
                }
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        Error::storage_with_source("could not create extracted dir", e)
                    })?;
                }
                let mut out = fs::File::create(&out_path).map_err(|e| {
                    Error::storage_with_source("could not create extracted file", e)
                })?;
                std::io::copy(&mut entry, &mut out)
                    .map_err(|e| Error::storage_with_source("could not extract entry", e))?;
            }
            fs::remove_file(&archive_path)
                .map_err(|e| Error::storage_with_source("could not remove archive", e))?;
            Ok(extracted_rel)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task panicked: {e}")))?
    }
}
