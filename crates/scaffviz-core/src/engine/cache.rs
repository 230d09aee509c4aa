use crate::core::io::traits::staging_path;
use crate::core::models::columns::GroupKind;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CACHE_FORMAT_VERSION: u32 = 1;

/// Identity of a derived column group: what produced it and from which input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub kind: GroupKind,
    pub generator: String,
    pub params: String,
    pub input_hash: String,
}

impl CacheKey {
    pub fn new(
        kind: GroupKind,
        generator: impl Into<String>,
        params: impl Into<String>,
        input_hash: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            generator: generator.into(),
            params: params.into(),
            input_hash: input_hash.into(),
        }
    }

    /// The sidecar slot holding at most one entry per kind and generator.
    pub fn slot(&self) -> String {
        slot(self.kind, &self.generator)
    }

    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [
            self.kind.as_str(),
            self.generator.as_str(),
            self.params.as_str(),
            self.input_hash.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

pub fn slot(kind: GroupKind, generator: &str) -> String {
    format!("{}:{}", kind.as_str(), generator)
}

/// Hashes a sequence of optional cells, distinguishing missing from empty values.
pub fn hash_cells<'a>(cells: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let mut hasher = Sha256::new();
    for cell in cells {
        match cell {
            Some(value) => {
                hasher.update([1u8]);
                hasher.update(value.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        hasher.update([b'\n']);
    }
    hex::encode(hasher.finalize())
}

/// Hashes a named numeric matrix by column names and exact bit patterns.
pub fn hash_matrix(names: &[String], matrix: &DMatrix<f64>) -> String {
    let mut hasher = Sha256::new();
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update((matrix.nrows() as u64).to_le_bytes());
    for value in matrix.iter() {
        hasher.update(value.to_bits().to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheEntry {
    pub kind: GroupKind,
    pub generator: String,
    pub params: String,
    pub input_hash: String,
    pub fingerprint: String,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub axis_titles: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The recorded fingerprint matches.
    Fresh,
    /// The slot is recorded with a different fingerprint.
    Stale,
    /// Nothing is recorded for the slot.
    Unknown,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

/// Content-addressed record of the derived column groups of one table.
///
/// Lives in a JSON sidecar next to the table file (`<stem>.cache.json`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl ColumnCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sidecar_path(table_path: &Path) -> PathBuf {
        table_path.with_extension("cache.json")
    }

    /// Loads the sidecar of `table_path`.
    ///
    /// A missing or unreadable sidecar yields an empty cache; the table then
    /// falls back to column presence alone.
    pub fn load(table_path: &Path) -> Self {
        let path = Self::sidecar_path(table_path);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No column cache found.");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), "Could not read column cache: {}. Continuing without it.", e);
                return Self::new();
            }
        };
        match serde_json::from_str::<CacheFile>(&text) {
            Ok(file) if file.version == CACHE_FORMAT_VERSION => Self {
                entries: file.entries,
            },
            Ok(file) => {
                warn!(
                    path = %path.display(),
                    version = file.version,
                    "Unsupported column cache version. Continuing without it."
                );
                Self::new()
            }
            Err(e) => {
                warn!(path = %path.display(), "Corrupt column cache: {}. Continuing without it.", e);
                Self::new()
            }
        }
    }

    pub fn save(&self, table_path: &Path) -> io::Result<()> {
        let path = Self::sidecar_path(table_path);
        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(io::Error::other)?;
        let staging = staging_path(&path);
        fs::write(&staging, json)?;
        fs::rename(&staging, &path)
    }

    pub fn entry(&self, kind: GroupKind, generator: &str) -> Option<&CacheEntry> {
        self.entries.get(&slot(kind, generator))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn status(&self, key: &CacheKey) -> CacheStatus {
        match self.entries.get(&key.slot()) {
            Some(entry) if entry.fingerprint == key.fingerprint() => CacheStatus::Fresh,
            Some(_) => CacheStatus::Stale,
            None => CacheStatus::Unknown,
        }
    }

    pub fn record(&mut self, key: &CacheKey, columns: Vec<String>, axis_titles: Vec<String>) {
        self.entries.insert(
            key.slot(),
            CacheEntry {
                kind: key.kind,
                generator: key.generator.clone(),
                params: key.params.clone(),
                input_hash: key.input_hash.clone(),
                fingerprint: key.fingerprint(),
                columns,
                axis_titles,
            },
        );
    }

    pub fn forget(&mut self, kind: GroupKind, generator: &str) -> Option<CacheEntry> {
        self.entries.remove(&slot(kind, generator))
    }

    /// Drops every entry whose column group includes `column`.
    pub fn forget_column(&mut self, column: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.columns.iter().any(|c| c == column));
        before - self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(params: &str) -> CacheKey {
        CacheKey::new(GroupKind::Descriptor, "MorganFP", params, "abc")
    }

    #[test]
    fn fingerprint_depends_on_every_component() {
        let base = key("radius=2");
        assert_eq!(base.fingerprint(), key("radius=2").fingerprint());
        assert_ne!(base.fingerprint(), key("radius=3").fingerprint());
        let other_input = CacheKey::new(GroupKind::Descriptor, "MorganFP", "radius=2", "abd");
        assert_ne!(base.fingerprint(), other_input.fingerprint());
        let other_kind = CacheKey::new(GroupKind::Scaffold, "MorganFP", "radius=2", "abc");
        assert_ne!(base.fingerprint(), other_kind.fingerprint());
    }

    #[test]
    fn cell_hash_distinguishes_missing_from_empty() {
        assert_ne!(hash_cells([None]), hash_cells([Some("")]));
        assert_ne!(hash_cells([Some("a"), Some("b")]), hash_cells([Some("ab")]));
    }

    #[test]
    fn status_tracks_recorded_fingerprints() {
        let mut cache = ColumnCache::new();
        assert_eq!(cache.status(&key("radius=2")), CacheStatus::Unknown);
        cache.record(&key("radius=2"), vec!["Descriptor_MorganFP_0".into()], vec![]);
        assert_eq!(cache.status(&key("radius=2")), CacheStatus::Fresh);
        assert_eq!(cache.status(&key("radius=3")), CacheStatus::Stale);
    }

    #[test]
    fn sidecar_round_trips_and_sits_next_to_table() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("compounds.tsv");
        assert_eq!(
            ColumnCache::sidecar_path(&table),
            dir.path().join("compounds.cache.json")
        );

        let mut cache = ColumnCache::new();
        cache.record(&key("radius=2"), vec!["Descriptor_MorganFP_0".into()], vec![]);
        cache.save(&table).unwrap();
        assert_eq!(ColumnCache::load(&table), cache);
    }

    #[test]
    fn corrupt_sidecar_is_ignored() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("compounds.tsv");
        fs::write(ColumnCache::sidecar_path(&table), "{not json").unwrap();
        assert!(ColumnCache::load(&table).is_empty());
    }

    #[test]
    fn forgetting_a_column_drops_its_group() {
        let mut cache = ColumnCache::new();
        cache.record(
            &CacheKey::new(GroupKind::Manifold, "PCA", "components=2", "x"),
            vec!["PCA_1".into(), "PCA_2".into()],
            vec!["PC_1".into(), "PC_2".into()],
        );
        cache.record(&key("radius=2"), vec!["Descriptor_MorganFP_0".into()], vec![]);
        assert_eq!(cache.forget_column("PCA_2"), 1);
        assert!(cache.entry(GroupKind::Manifold, "PCA").is_none());
        assert!(cache.entry(GroupKind::Descriptor, "MorganFP").is_some());
    }
}
