//! Dataset types
//!
//! Each dataset declares a type key (for example `steamcsv`). The type decides
//! how the staged files of a dataset are validated before it is published.
//! Types are looked up in a [`KindRegistry`]; unknown keys resolve to the
//! default kind.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::error::{HubError, Result};

/// Type key used when a dataset does not name a registered type.
pub const DEFAULT_KIND: &str = SteamCsvKind::TYPE_KEY;

/// Validation strategy for one dataset type.
pub trait DatasetKind: Send + Sync {
    /// Registry key, stored in `dataset_metadata.dataset_type`.
    fn type_key(&self) -> &'static str;

    /// Validate every staged file in `folder`.
    ///
    /// Returns [`HubError::InvalidDataset`] with a human-readable message
    /// listing every offending file.
    fn validate_folder(&self, folder: &Path) -> Result<()>;
}

/// Map from type key to dataset kind.
#[derive(Clone)]
pub struct KindRegistry {
    kinds: BTreeMap<&'static str, Arc<dyn DatasetKind>>,
}

impl KindRegistry {
    /// An empty registry. [`KindRegistry::get`] still falls back to Steam CSV.
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    pub fn register(mut self, kind: Arc<dyn DatasetKind>) -> Self {
        self.kinds.insert(kind.type_key(), kind);
        self
    }

    pub fn contains(&self, type_key: &str) -> bool {
        self.kinds.contains_key(type_key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    /// Resolve a type key, failing on unregistered keys.
    pub fn require(&self, type_key: &str) -> Result<Arc<dyn DatasetKind>> {
        self.kinds
            .get(type_key)
            .cloned()
            .ok_or_else(|| HubError::UnknownDatasetType(type_key.to_string()))
    }

    /// Resolve a type key, falling back to the default kind.
    pub fn get(&self, type_key: &str) -> Arc<dyn DatasetKind> {
        match self.kinds.get(type_key) {
            Some(kind) => Arc::clone(kind),
            None => {
                tracing::debug!(type_key, "Unknown dataset type, using default");
                self.kinds
                    .get(DEFAULT_KIND)
                    .cloned()
                    .unwrap_or_else(|| Arc::new(SteamCsvKind))
            },
        }
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::empty().register(Arc::new(SteamCsvKind))
    }
}

/// Steam catalogue exports: one or more CSV files with a fixed header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteamCsvKind;

impl SteamCsvKind {
    pub const TYPE_KEY: &'static str = "steamcsv";

    pub const REQUIRED_HEADERS: [&'static str; 9] = [
        "appid",
        "name",
        "release_date",
        "is_free",
        "developers",
        "publishers",
        "platforms",
        "genres",
        "tags",
    ];

    /// Validate a single CSV document, returning a problem description.
    pub fn validate_csv<R: std::io::Read>(&self, name: &str, reader: R) -> Option<String> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = csv.records();

        let headers = match records.next() {
            Some(Ok(record)) => record,
            Some(Err(e)) => return Some(format!("{}: cannot read CSV ({})", name, e)),
            None => csv::StringRecord::new(),
        };

        if !headers.iter().eq(Self::REQUIRED_HEADERS.iter().copied()) {
            return Some(format!(
                "{}: invalid headers. Expected exactly: {} in this order",
                name,
                Self::REQUIRED_HEADERS.join(", ")
            ));
        }

        let mut rows = Vec::new();
        for (index, record) in records.enumerate() {
            match record {
                Ok(record) => rows.push((index + 2, record)),
                Err(e) => return Some(format!("{}: cannot read CSV ({})", name, e)),
            }
        }

        let has_data = rows
            .iter()
            .any(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()));
        if !has_data {
            return Some(format!("{}: must contain at least one data row", name));
        }

        rows.iter()
            .find(|(_, row)| row.len() != Self::REQUIRED_HEADERS.len())
            .map(|(line, _)| format!("{}: row {} does not match header column count", name, line))
    }
}

impl DatasetKind for SteamCsvKind {
    fn type_key(&self) -> &'static str {
        Self::TYPE_KEY
    }

    fn validate_folder(&self, folder: &Path) -> Result<()> {
        if !folder.is_dir() {
            return Ok(());
        }

        let mut entries: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        entries.sort();

        if entries.is_empty() {
            return Err(HubError::InvalidDataset(
                "No .csv files found for Steam CSV dataset type".to_string(),
            ));
        }

        let errors: Vec<String> = entries
            .iter()
            .filter_map(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match File::open(path) {
                    Ok(file) => self.validate_csv(&name, file),
                    Err(e) => Some(format!("{}: cannot read CSV ({})", name, e)),
                }
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HubError::InvalidDataset(errors.join("; ")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "appid,name,release_date,is_free,developers,publishers,platforms,genres,tags";

    fn write(dir: &Path, name: &str, content: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_valid_folder() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "games.csv",
            &format!("{}\n10,Counter-Strike,2000-11-01,false,Valve,Valve,windows,Action,FPS\n", HEADER),
        );
        write(dir.path(), "README.md", "ignored");

        assert!(SteamCsvKind.validate_folder(dir.path()).is_ok());
    }

    #[test]
    fn test_missing_folder_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SteamCsvKind.validate_folder(&dir.path().join("absent")).is_ok());
    }

    #[test]
    fn test_folder_without_csv() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", "hello");

        let err = SteamCsvKind.validate_folder(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No .csv files found"));
    }

    #[test]
    fn test_reports_every_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", "appid,name\n1,x\n");
        write(dir.path(), "b.csv", &format!("{}\n , , , , , , , , \n", HEADER));

        let err = SteamCsvKind.validate_folder(dir.path()).unwrap_err().to_string();
        assert!(err.contains("a.csv: invalid headers"));
        assert!(err.contains("b.csv: must contain at least one data row"));
    }

    #[test]
    fn test_row_width_mismatch() {
        let problem = SteamCsvKind.validate_csv(
            "short.csv",
            format!("{}\n1,a,b,c,d,e,f,g,h\n2,only-two\n", HEADER).as_bytes(),
        );
        assert_eq!(
            problem.as_deref(),
            Some("short.csv: row 3 does not match header column count")
        );
    }

    #[test]
    fn test_registry_falls_back_to_default() {
        let registry = KindRegistry::default();
        assert!(registry.contains("steamcsv"));
        assert!(!registry.contains("uvl"));
        assert_eq!(registry.get("uvl").type_key(), "steamcsv");
        assert_eq!(KindRegistry::empty().get("anything").type_key(), DEFAULT_KIND);
        assert!(matches!(
            registry.require("uvl"),
            Err(HubError::UnknownDatasetType(key)) if key == "uvl"
        ));
    }
}
