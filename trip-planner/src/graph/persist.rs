//! Disk storage for graph snapshots, keyed by version string.
//!
//! Each version lives in `{dir}/graph-{version}.json`. Files are written to a
//! temporary name and renamed into place so a reader never sees a partial
//! snapshot.

use std::path::{Path, PathBuf};

use super::error::GraphError;
use super::snapshot::{GraphSnapshot, SnapshotData};

const FILE_PREFIX: &str = "graph-";
const FILE_SUFFIX: &str = ".json";

/// Directory of saved snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotFileStore {
    dir: PathBuf,
}

impl SnapshotFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, version: &str) -> Result<PathBuf, GraphError> {
        check_version(version)?;
        Ok(self.dir.join(format!("{FILE_PREFIX}{version}{FILE_SUFFIX}")))
    }

    /// Save a snapshot, replacing any file for the same version.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn save(&self, snapshot: &GraphSnapshot) -> Result<PathBuf, GraphError> {
        let path = self.path_for(snapshot.version())?;

        std::fs::create_dir_all(&self.dir).map_err(|e| GraphError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let json = serde_json::to_string(&snapshot.to_data())?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| GraphError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| GraphError::Io {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Load the snapshot saved for `version`.
    pub fn load(&self, version: &str) -> Result<GraphSnapshot, GraphError> {
        let path = self.path_for(version)?;
        let contents = std::fs::read_to_string(&path).map_err(|e| GraphError::Io {
            path: path.clone(),
            source: e,
        })?;
        let data: SnapshotData = serde_json::from_str(&contents)?;
        if data.version != version {
            return Err(GraphError::VersionMismatch {
                expected: version.to_string(),
                found: data.version,
            });
        }
        Ok(GraphSnapshot::from_data(data)?)
    }

    /// Versions present on disk, sorted.
    pub fn versions(&self) -> Result<Vec<String>, GraphError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GraphError::Io {
                    path: self.dir.clone(),
                    source: e,
                });
            }
        };

        let mut versions: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let version = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
                check_version(version).ok()?;
                Some(version.to_string())
            })
            .collect();
        versions.sort();
        Ok(versions)
    }

    /// Load the most recently built snapshot on disk.
    pub fn load_latest(&self) -> Result<Option<GraphSnapshot>, GraphError> {
        let mut latest: Option<GraphSnapshot> = None;
        for version in self.versions()? {
            let snapshot = self.load(&version)?;
            let newer = latest
                .as_ref()
                .is_none_or(|l| snapshot.metadata().built_at > l.metadata().built_at);
            if newer {
                latest = Some(snapshot);
            }
        }
        Ok(latest)
    }
}

/// Versions become file names, so only a safe alphabet is allowed.
fn check_version(version: &str) -> Result<(), GraphError> {
    let valid = !version.is_empty()
        && version.len() <= 64
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(GraphError::InvalidVersion(version.to_string()))
    }
}
