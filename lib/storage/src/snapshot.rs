// Catalog snapshots: gzip-compressed JSON dumps with SHA-256 checksums
use anyhow::{anyhow, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use teamroute_core::{AdministrativeUnit, StreetSegment, Team};

const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Snapshot description for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Full catalog content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshotData {
    pub units: Vec<AdministrativeUnit>,
    pub teams: Vec<Team>,
    pub segments: Vec<StreetSegment>,
    pub created_at: u64,
}

pub struct SnapshotManager {
    snapshot_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Result<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)?;
        Ok(Self { snapshot_dir })
    }

    /// Generate snapshot filename with timestamp
    fn generate_snapshot_name() -> String {
        let now: DateTime<Utc> = Utc::now();
        format!("catalog-{}.{}", now.format("%Y-%m-%d-%H-%M-%S-%3f"), SNAPSHOT_EXTENSION)
    }

    /// Resolve a snapshot name to a path inside the snapshot directory
    fn snapshot_path(&self, snapshot_name: &str) -> Result<PathBuf> {
        let valid = !snapshot_name.is_empty()
            && !snapshot_name.contains(['/', '\\'])
            && !snapshot_name.contains("..")
            && snapshot_name.ends_with(SNAPSHOT_EXTENSION);
        if !valid {
            return Err(anyhow!("Invalid snapshot name '{}'", snapshot_name));
        }
        Ok(self.snapshot_dir.join(snapshot_name))
    }

    fn describe(path: &Path, name: &str) -> Result<SnapshotDescription> {
        let metadata = fs::metadata(path)?;
        let checksum = format!("{:x}", Sha256::digest(fs::read(path)?));

        let creation_time = metadata
            .created()
            .or_else(|_| metadata.modified())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .and_then(|d| DateTime::from_timestamp(d.as_secs() as i64, 0))
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string());

        Ok(SnapshotDescription {
            name: name.to_string(),
            creation_time,
            size: metadata.len(),
            checksum: Some(checksum),
        })
    }

    /// Write a new snapshot
    pub fn create_snapshot(&self, data: &CatalogSnapshotData) -> Result<SnapshotDescription> {
        let snapshot_name = Self::generate_snapshot_name();
        let snapshot_path = self.snapshot_dir.join(&snapshot_name);

        let json_data = serde_json::to_vec(data)?;
        AtomicFile::new(&snapshot_path, OverwriteBehavior::DisallowOverwrite)
            .write(|file| {
                let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
                encoder.write_all(&json_data)?;
                let mut writer = encoder.finish()?;
                writer.flush()
            })
            .map_err(|e| anyhow!("Failed to write snapshot {}: {}", snapshot_name, e))?;

        Self::describe(&snapshot_path, &snapshot_name)
    }

    /// List snapshots, newest first
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotDescription>> {
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.snapshot_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                snapshots.push(Self::describe(&path, name)?);
            }
        }

        snapshots.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(snapshots)
    }

    /// Load a snapshot, verifying its checksum when one is given
    pub fn load_snapshot(
        &self,
        snapshot_name: &str,
        expected_checksum: Option<&str>,
    ) -> Result<CatalogSnapshotData> {
        let snapshot_path = self.snapshot_path(snapshot_name)?;
        if !snapshot_path.exists() {
            return Err(anyhow!("Snapshot '{}' not found", snapshot_name));
        }

        if let Some(expected) = expected_checksum {
            let actual = format!("{:x}", Sha256::digest(fs::read(&snapshot_path)?));
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(anyhow!(
                    "Checksum mismatch: expected {}, got {}",
                    expected,
                    actual
                ));
            }
        }

        let file = File::open(&snapshot_path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut json_data = Vec::new();
        decoder.read_to_end(&mut json_data)?;

        Ok(serde_json::from_slice(&json_data)?)
    }

    pub fn delete_snapshot(&self, snapshot_name: &str) -> Result<bool> {
        let snapshot_path = self.snapshot_path(snapshot_name)?;
        if snapshot_path.exists() {
            fs::remove_file(&snapshot_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn exists(&self, snapshot_name: &str) -> bool {
        self.snapshot_path(snapshot_name)
            .map(|p| p.exists())
            .unwrap_or(false)
    }
}
