//! Local filesystem catalog (Hadoop-style warehouse layout).

use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{IceCheckError, Result};

use super::metadata::TableMetadata;
use super::{MetadataStore, TableHandle};

/// Metadata file names: `v3.metadata.json` or `00003-<uuid>.metadata.json`.
static METADATA_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v?(\d+)(?:-[^/]*)?\.metadata\.json$").expect("valid regex"));

const VERSION_HINT: &str = "version-hint.text";

/// Resolves tables stored directly under a local warehouse directory.
///
/// A table `ns.orders` lives in `<warehouse>/ns/orders` (or the Hive-style
/// `<warehouse>/ns.db/orders`) and keeps its metadata files in a
/// `metadata/` subdirectory.
#[derive(Debug, Clone, Default)]
pub struct FilesystemCatalog;

impl FilesystemCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Candidate table directories for a (possibly dotted) table name.
    ///
    /// Every name part must be a single plain path component, so a table
    /// never resolves outside the warehouse.
    fn table_dirs(warehouse: &Path, table: &str) -> Vec<PathBuf> {
        let parts: Vec<&str> = table.split('.').collect();
        if !parts.iter().all(|part| is_plain_component(part)) {
            return Vec::new();
        }

        let mut dirs = vec![parts.iter().fold(warehouse.to_path_buf(), |p, part| p.join(part))];
        match parts.as_slice() {
            [name] => dirs.push(warehouse.join("default").join(name)),
            [namespace, name] => dirs.push(warehouse.join(format!("{}.db", namespace)).join(name)),
            _ => {}
        }
        dirs
    }

    /// Pick the metadata file the table currently points at.
    fn find_metadata_file(metadata_dir: &Path) -> Result<Option<PathBuf>> {
        let entries = fs::read_dir(metadata_dir).map_err(|e| IceCheckError::Io {
            path: metadata_dir.to_path_buf(),
            source: e,
        })?;

        let mut versioned = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IceCheckError::Io {
                path: metadata_dir.to_path_buf(),
                source: e,
            })?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(caps) = METADATA_FILE.captures(&file_name) {
                if let Ok(version) = caps[1].parse::<u64>() {
                    versioned.push((version, entry.path()));
                }
            }
        }
        versioned.sort();

        if let Some(hinted) = Self::read_version_hint(metadata_dir, &versioned)? {
            return Ok(Some(hinted));
        }

        Ok(versioned.pop().map(|(_, path)| path))
    }

    /// Resolve `version-hint.text` if present and usable.
    fn read_version_hint(metadata_dir: &Path, versioned: &[(u64, PathBuf)]) -> Result<Option<PathBuf>> {
        let hint_path = metadata_dir.join(VERSION_HINT);
        if !hint_path.is_file() {
            return Ok(None);
        }

        let hint = fs::read_to_string(&hint_path).map_err(|e| IceCheckError::Io {
            path: hint_path.clone(),
            source: e,
        })?;
        let hint = hint.trim();

        if hint.ends_with(".metadata.json") {
            let path = metadata_dir.join(hint);
            if path.is_file() {
                return Ok(Some(path));
            }
        } else if let Ok(version) = hint.parse::<u64>() {
            if let Some((_, path)) = versioned.iter().find(|(v, _)| *v == version) {
                return Ok(Some(path.clone()));
            }
        }

        log::warn!(
            "Ignoring unusable version hint '{}' in {}",
            hint,
            metadata_dir.display()
        );
        Ok(None)
    }

    fn load_handle(table: &str, path: PathBuf) -> Result<TableHandle> {
        let mut file = File::open(&path).map_err(|e| IceCheckError::Io {
            path: path.clone(),
            source: e,
        })?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| IceCheckError::Io {
            path: path.clone(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let metadata: TableMetadata =
            serde_json::from_slice(&contents).map_err(|e| IceCheckError::Json {
                path: path.clone(),
                source: e,
            })?;

        if metadata.current_schema().is_none() {
            return Err(IceCheckError::Metadata {
                path,
                message: "no current schema".to_string(),
            });
        }

        let mut handle = TableHandle::new(table, path, metadata);
        handle.metadata_sha256 = hash;
        Ok(handle)
    }
}

fn is_plain_component(part: &str) -> bool {
    let mut components = Path::new(part).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !part.contains(['/', '\\'])
}

impl MetadataStore for FilesystemCatalog {
    fn resolve(&self, warehouse: &Path, table: &str) -> Result<TableHandle> {
        if !warehouse.is_dir() {
            return Err(IceCheckError::WarehouseNotFound(warehouse.to_path_buf()));
        }

        for dir in Self::table_dirs(warehouse, table) {
            let metadata_dir = dir.join("metadata");
            if !metadata_dir.is_dir() {
                continue;
            }

            log::debug!("Looking for metadata files in {}", metadata_dir.display());
            if let Some(path) = Self::find_metadata_file(&metadata_dir)? {
                log::debug!("Loading table metadata from {}", path.display());
                return Self::load_handle(table, path);
            }
        }

        Err(IceCheckError::TableNotFound {
            table: table.to_string(),
            warehouse: warehouse.to_path_buf(),
        })
    }
}
