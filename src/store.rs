//! Whole-document persistence for the dataset. The file is read once when the
//! repository opens and rewritten in full after every mutation.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::StoreError;
use crate::models::Dataset;

/// Suffix for the sibling file a save writes before renaming it into place.
const TEMP_SUFFIX: &str = "tmp";

/// Durable storage for a [`Dataset`]. The repository only talks to this trait
/// so tests can swap in stores that count or fail saves.
pub trait Store {
    /// Read the persisted dataset, or an empty one when nothing was saved yet.
    fn load(&self) -> Result<Dataset, StoreError>;

    /// Replace the persisted dataset with `dataset`.
    fn save(&self, dataset: &Dataset) -> Result<(), StoreError>;
}

/// Stores the dataset as one pretty-printed JSON document.
///
/// Saves write to `<file>.tmp` next to the target and rename it over the
/// target, so an interrupted save leaves the previous document intact. There
/// is no locking: a second process writing the same file wins or loses at the
/// OS level.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Store for JsonStore {
    fn load(&self) -> Result<Dataset, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(
                    "event=store_load status=absent path={}",
                    self.path.display()
                );
                return Ok(Dataset::default());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        let dataset: Dataset = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "event=store_load status=ok students={} staff={}",
            dataset.students.len(),
            dataset.staff.len()
        );
        Ok(dataset)
    }

    fn save(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let payload = to_document(dataset)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
            }
        }

        let temp_path = self.temp_path();
        let write_result = (|| -> io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&payload)?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        })();

        if let Err(err) = write_result {
            // Best effort; the previous document is still in place.
            let _ = fs::remove_file(&temp_path);
            return Err(self.io_error(err));
        }

        debug!(
            "event=store_save status=ok bytes={} students={} staff={}",
            payload.len(),
            dataset.students.len(),
            dataset.staff.len()
        );
        Ok(())
    }
}

/// Serialize with four-space indentation, matching files written by earlier
/// versions of the tool.
fn to_document(dataset: &Dataset) -> Result<Vec<u8>, StoreError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    dataset
        .serialize(&mut serializer)
        .map_err(StoreError::Serialize)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{Gender, Student};

    #[test]
    fn temp_path_sits_next_to_target() {
        let store = JsonStore::new("/data/school_data.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/data/school_data.json.tmp")
        );
    }

    #[test]
    fn empty_dataset_document_lists_both_collections() {
        let bytes = to_document(&Dataset::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "{\n    \"students\": [],\n    \"staff\": []\n}");
    }

    fn sample() -> Dataset {
        Dataset {
            students: vec![Student {
                name: "Bob".to_string(),
                roll_no: 5,
                department: "CS".to_string(),
                phone_number: "0300123".to_string(),
                gender: Gender::Male,
                submission_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            }],
            staff: Vec::new(),
        }
    }

    #[test]
    fn missing_file_loads_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("school_data.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn saved_dataset_loads_back_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("school_data.json");
        let store = JsonStore::new(&path);

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
        assert!(!store.temp_path().exists());

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"Roll No\": 5"));
        assert!(raw.contains("\"Phone Number\": \"0300123\""));
        assert!(raw.contains("\"Submission Date\": \"2025-01-31\""));
    }

    #[test]
    fn missing_collection_key_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("school_data.json");
        fs::write(&path, r#"{"staff": []}"#).unwrap();
        let dataset = JsonStore::new(&path).load().unwrap();
        assert!(dataset.students.is_empty());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("school_data.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonStore::new(&path).load(),
            Err(StoreError::Parse { .. })
        ));
    }
}
