use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::checksum::verify;
use crate::codec::decode_padded;
use crate::error::{UploadError, missing_preview};
use crate::store::ChunkStore;

/// Upper bound on `total_parts`. Completion work and the session bitmap are
/// sized by the declared total, so it must not be sender-controlled without limit.
pub const MAX_PARTS: u32 = 65_536;

/// One validated part of a multi-part upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkUpload {
    pub file_id: String,
    /// 1-based position of this part.
    pub part: u32,
    pub total_parts: u32,
    /// Base64 text, possibly with embedded line breaks.
    pub payload: String,
    pub crc32: u32,
}

impl ChunkUpload {
    pub fn validate(&self) -> Result<(), UploadError> {
        validate_file_id(&self.file_id)?;
        if self.part == 0 || self.total_parts == 0 {
            return Err(UploadError::MissingOrInvalidField(
                "part and total_parts must be positive".into(),
            ));
        }
        if self.total_parts > MAX_PARTS {
            return Err(UploadError::MissingOrInvalidField(format!(
                "total_parts {} exceeds the limit of {}",
                self.total_parts, MAX_PARTS
            )));
        }
        if self.part > self.total_parts {
            return Err(UploadError::MissingOrInvalidField(format!(
                "part {} exceeds total_parts {}",
                self.part, self.total_parts
            )));
        }
        if self.payload.is_empty() {
            return Err(UploadError::MissingOrInvalidField("data is empty".into()));
        }
        Ok(())
    }
}

/// Rejects identifiers that are not a single plain file name, since the
/// artifact path is derived from the identifier alone.
pub fn validate_file_id(file_id: &str) -> Result<(), UploadError> {
    let invalid = |why: &str| UploadError::MissingOrInvalidField(format!("filename {why}"));

    if file_id.is_empty() {
        return Err(invalid("is empty"));
    }
    if file_id.len() > 255 {
        return Err(invalid("is too long"));
    }
    if file_id.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    if file_id.contains(['/', '\\', '\0']) {
        return Err(invalid("must not contain path separators"));
    }
    let mut components = Path::new(file_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid("is not a plain file name")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A non-final part was verified and stored.
    Accepted { part: u32 },
    /// The declared-last part completed the file.
    Completed { artifact: PathBuf, size: u64 },
}

/// Accepts parts, and assembles the artifact when the part whose index equals
/// the declared total arrives.
pub struct Reassembler {
    store: ChunkStore,
    output_dir: PathBuf,
    // Serializes completion so two overlapping "last part" deliveries cannot
    // double-write the artifact or race each other's deletes.
    completion: Mutex<()>,
}

impl Reassembler {
    pub async fn new(store: ChunkStore, output_dir: PathBuf) -> Result<Self, UploadError> {
        fs::create_dir_all(&output_dir).await?;
        info!("Upload output directory: {}", output_dir.display());
        Ok(Self {
            store,
            output_dir,
            completion: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn artifact_path(&self, file_id: &str) -> PathBuf {
        self.output_dir.join(file_id)
    }

    /// Prune transfers idle for longer than `max_age`. Runs under the completion
    /// lock so parts are never removed while a file is being assembled from them.
    pub async fn prune_stale(&self, max_age: Duration) -> Result<usize, UploadError> {
        let _guard = self.completion.lock().await;
        self.store.prune_older_than(max_age).await
    }

    pub async fn accept_chunk(&self, req: &ChunkUpload) -> Result<Outcome, UploadError> {
        req.validate()?;

        let checked = verify(&req.payload, req.crc32);
        if !checked.ok {
            warn!(
                "Part {}/{} of {} failed CRC-32 (declared {:#010x}, computed {:#010x})",
                req.part, req.total_parts, req.file_id, req.crc32, checked.computed
            );
            return Err(UploadError::ChecksumMismatch {
                file: req.file_id.clone(),
                part: req.part,
                declared: req.crc32,
                computed: checked.computed,
            });
        }

        self.store
            .put(&req.file_id, req.part, &checked.payload)
            .await?;
        info!(
            "Part {}/{} of {} stored",
            req.part, req.total_parts, req.file_id
        );

        if req.part == req.total_parts {
            self.complete(&req.file_id, req.total_parts).await
        } else {
            Ok(Outcome::Accepted { part: req.part })
        }
    }

    async fn complete(&self, file_id: &str, total: u32) -> Result<Outcome, UploadError> {
        let _guard = self.completion.lock().await;

        let received = self.store.received(file_id, total).await?;
        if !received.is_complete() {
            let missing = received.missing();
            warn!(
                "Completion of {} aborted: {} of {} parts missing, first {:?}",
                file_id,
                missing.len(),
                total,
                missing_preview(&missing)
            );
            return Err(UploadError::IncompleteSequence {
                file: file_id.to_string(),
                total,
                missing,
            });
        }

        let tmp = self
            .output_dir
            .join(format!(".{file_id}.{}.partial", Uuid::new_v4()));
        let (size, digest) = match self.assemble_into(&tmp, file_id, total).await {
            Ok(done) => done,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&tmp).await {
                    warn!("Could not remove partial artifact {}: {}", tmp.display(), cleanup);
                }
                return Err(e);
            }
        };

        let artifact = self.artifact_path(file_id);
        fs::rename(&tmp, &artifact).await?;

        for part in 1..=total {
            self.store.delete(file_id, part).await?;
        }

        info!(
            "Assembled {} from {} parts ({} bytes, sha256 {})",
            artifact.display(),
            total,
            size,
            digest
        );
        Ok(Outcome::Completed { artifact, size })
    }

    /// Decode parts `1..=total` in index order into `path`.
    /// Returns the byte count and SHA-256 hex digest of what was written.
    async fn assemble_into(
        &self,
        path: &Path,
        file_id: &str,
        total: u32,
    ) -> Result<(u64, String), UploadError> {
        let mut out = fs::File::create(path).await?;
        let mut hasher = Sha256::new();
        let mut size: u64 = 0;

        for part in 1..=total {
            let encoded = self.store.get(file_id, part).await.map_err(|e| match e {
                UploadError::ChunkNotFound { file, part } => UploadError::IncompleteSequence {
                    file,
                    total,
                    missing: vec![part],
                },
                other => other,
            })?;

            let bytes = decode_padded(&encoded).map_err(|e| {
                warn!("Part {} of {} does not decode: {}", part, file_id, e);
                UploadError::InvalidEncoding {
                    file: file_id.to_string(),
                    part,
                }
            })?;

            hasher.update(&bytes);
            out.write_all(&bytes).await?;
            size += bytes.len() as u64;
        }

        out.sync_all().await?;
        Ok((size, hex::encode(hasher.finalize())))
    }
}
