use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::UploadError;
use crate::session::ReceivedParts;

/// On-disk store for in-flight parts.
///
/// Each part lives at `{dir}/{file_id}.part{index}` and holds the cleaned
/// Base64 text exactly as verified. Writing the same key again replaces it.
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    pub async fn new(dir: PathBuf) -> Result<Self, UploadError> {
        fs::create_dir_all(&dir).await?;
        info!("Chunk store directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn part_path(&self, file_id: &str, part: u32) -> PathBuf {
        self.dir.join(format!("{file_id}.part{part}"))
    }

    /// Store a part. The write goes to a temp file that is synced and then
    /// renamed into place, so a part is either whole or absent.
    pub async fn put(&self, file_id: &str, part: u32, payload: &str) -> Result<(), UploadError> {
        let tmp = self
            .dir
            .join(format!(".{file_id}.part{part}.{}.tmp", Uuid::new_v4()));

        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(payload.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, self.part_path(file_id, part)).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Could not remove temp part {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn get(&self, file_id: &str, part: u32) -> Result<Vec<u8>, UploadError> {
        match fs::read(self.part_path(file_id, part)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(UploadError::ChunkNotFound {
                file: file_id.to_string(),
                part,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, file_id: &str, part: u32) -> Result<(), UploadError> {
        match fs::remove_file(self.part_path(file_id, part)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(UploadError::ChunkNotFound {
                file: file_id.to_string(),
                part,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Scan the directory once and report which of parts `1..=total` exist.
    pub async fn received(&self, file_id: &str, total: u32) -> Result<ReceivedParts, UploadError> {
        let prefix = format!("{file_id}.part");
        let mut parts = ReceivedParts::new(total);

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(index) = name
                .to_str()
                .and_then(|n| n.strip_prefix(&prefix))
                .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|rest| rest.parse::<u32>().ok())
            else {
                continue;
            };
            parts.set(index);
        }

        Ok(parts)
    }

    /// Delete transfers with no part written in the last `max_age`, plus temp
    /// files older than that. A transfer's age is the newest mtime among its
    /// parts, so one fresh part keeps all of its siblings alive.
    /// Returns how many files were removed.
    pub async fn prune_older_than(&self, max_age: Duration) -> Result<usize, UploadError> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut transfers: HashMap<String, (SystemTime, Vec<PathBuf>)> = HashMap::new();
        let mut stale = Vec::new();

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified()?;
            let name = entry.file_name();
            match name.to_str().and_then(transfer_of) {
                Some(file_id) => {
                    let (newest, paths) = transfers
                        .entry(file_id.to_string())
                        .or_insert((SystemTime::UNIX_EPOCH, Vec::new()));
                    *newest = (*newest).max(modified);
                    paths.push(entry.path());
                }
                None if modified < cutoff => stale.push(entry.path()),
                None => {}
            }
        }

        for (file_id, (newest, paths)) in transfers {
            if newest < cutoff {
                debug!("Transfer {} idle past retention, {} parts", file_id, paths.len());
                stale.extend(paths);
            }
        }

        let mut removed = 0;
        for path in stale {
            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Pruned stale part {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(removed)
    }
}

/// File identifier of a stored part name `{file_id}.part{index}`.
fn transfer_of(name: &str) -> Option<&str> {
    let (file_id, index) = name.rsplit_once(".part")?;
    let is_index = !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit());
    (is_index && !file_id.is_empty()).then_some(file_id)
}
