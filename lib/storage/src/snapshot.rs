// Snapshot files: bincode body, gzip-compressed, written atomically
use anyhow::{anyhow, bail, Context, Result};
use atomicwrites::{AtomicFile, DisallowOverwrite};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tastematch_core::embedder::{resolve_builtin, Embedder};
use tastematch_recommend::{Snapshot, SnapshotData};
use tracing::{debug, info};

const SNAPSHOT_EXTENSION: &str = "snapshot";
const CHECKSUM_EXTENSION: &str = "sha256";

/// Snapshot description for listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

pub struct SnapshotManager {
    snapshot_dir: PathBuf,
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Result<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)
            .with_context(|| format!("Failed to create {}", snapshot_dir.display()))?;
        Ok(Self { snapshot_dir })
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// Timestamped file name; sorts chronologically
    fn generate_snapshot_name() -> String {
        let now: DateTime<Utc> = Utc::now();
        format!(
            "snapshot-{}.{SNAPSHOT_EXTENSION}",
            now.format("%Y-%m-%d-%H-%M-%S-%6f")
        )
    }

    /// `<name>.sha256` next to the snapshot, holding the hex digest of the file
    fn checksum_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(format!(".{CHECKSUM_EXTENSION}"));
        PathBuf::from(name)
    }

    fn snapshot_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && !name.contains(['/', '\\'])
            && name != "."
            && name != ".."
            && name.ends_with(&format!(".{SNAPSHOT_EXTENSION}"));
        if !valid {
            bail!("Invalid snapshot name '{}'", name);
        }
        Ok(self.snapshot_dir.join(name))
    }

    /// Persist a snapshot. Existing files are never overwritten.
    pub fn save(&self, snapshot: &Snapshot) -> Result<SnapshotDescription> {
        let body = bincode::serialize(snapshot).context("Failed to encode snapshot")?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        let compressed = encoder.finish()?;

        let name = Self::generate_snapshot_name();
        let path = self.snapshot_path(&name)?;
        let digest = checksum(&compressed);
        AtomicFile::new(&path, DisallowOverwrite)
            .write(|f| f.write_all(&compressed))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        AtomicFile::new(Self::checksum_path(&path), DisallowOverwrite)
            .write(|f| f.write_all(digest.as_bytes()))
            .with_context(|| format!("Failed to write checksum for {}", name))?;

        info!(
            "Saved snapshot {} ({} items, {} bytes)",
            name,
            snapshot.len(),
            compressed.len()
        );
        Ok(SnapshotDescription {
            name,
            creation_time: Some(format_time(Utc::now())),
            size: compressed.len() as u64,
            checksum: Some(digest),
        })
    }

    /// All snapshots, newest first.
    pub fn list(&self) -> Result<Vec<SnapshotDescription>> {
        if !self.snapshot_dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.snapshot_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let metadata = fs::metadata(&path)?;
            let file_data = fs::read(&path)?;
            let creation_time = metadata
                .modified()
                .ok()
                .map(|t| format_time(DateTime::<Utc>::from(t)));

            snapshots.push(SnapshotDescription {
                name: name.to_string(),
                creation_time,
                size: metadata.len(),
                checksum: Some(checksum(&file_data)),
            });
        }

        snapshots.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(snapshots)
    }

    /// Load with the built-in embedder lookup.
    pub fn load(&self, name: &str) -> Result<Snapshot> {
        self.load_with(name, resolve_builtin)
    }

    /// Load, resolving dense models through `resolver`. The file must match
    /// its recorded SHA-256 digest when one exists.
    pub fn load_with<F>(&self, name: &str, resolver: F) -> Result<Snapshot>
    where
        F: FnOnce(&str) -> tastematch_core::Result<Arc<dyn Embedder>>,
    {
        let path = self.snapshot_path(name)?;
        if !path.exists() {
            bail!("Snapshot '{}' not found", name);
        }
        let data = Self::read_data(&path)?;
        let snapshot = Snapshot::from_data(data, resolver)
            .with_context(|| format!("Snapshot '{}' is inconsistent", name))?;
        debug!("Loaded snapshot {} with {} items", name, snapshot.len());
        Ok(snapshot)
    }

    /// Load the newest snapshot, if any.
    pub fn load_latest(&self) -> Result<Option<Snapshot>> {
        match self.list()?.first() {
            Some(latest) => self.load(&latest.name).map(Some),
            None => Ok(None),
        }
    }

    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.snapshot_path(name)?;
        if path.exists() {
            fs::remove_file(&path)?;
            let checksum_path = Self::checksum_path(&path);
            if checksum_path.exists() {
                fs::remove_file(checksum_path)?;
            }
            info!("Deleted snapshot {}", name);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Path of an existing snapshot file
    pub fn get_snapshot_path(&self, name: &str) -> Option<PathBuf> {
        self.snapshot_path(name).ok().filter(|p| p.exists())
    }

    fn read_data(path: &Path) -> Result<SnapshotData> {
        let file_data = fs::read(path)?;
        let checksum_path = Self::checksum_path(path);
        if checksum_path.exists() {
            let expected = fs::read_to_string(&checksum_path)?;
            let actual = checksum(&file_data);
            if actual != expected.trim() {
                bail!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    path.display(),
                    expected.trim(),
                    actual
                );
            }
        }

        let mut decoder = GzDecoder::new(file_data.as_slice());
        let mut body = Vec::new();
        decoder
            .read_to_end(&mut body)
            .map_err(|e| anyhow!("Corrupt snapshot {}: {}", path.display(), e))?;
        bincode::deserialize(&body)
            .with_context(|| format!("Failed to decode snapshot {}", path.display()))
    }
}
