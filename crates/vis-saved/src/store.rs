//! Record stores: a directory of JSON files and an in-memory map.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::services::PersistenceStore;
use crate::{SavedVisError, SavedVisRecord, SavedVisResult};

const KIND: &str = "visualization";

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn check_id(id: &str) -> SavedVisResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && id != "."
        && id != "..";
    if valid {
        Ok(())
    } else {
        Err(SavedVisError::InvalidId(id.to_string()))
    }
}

/// One `<id>.json` file per record under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(root_dir: PathBuf) -> SavedVisResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root_dir.join(format!("{id}.json"))
    }

    pub fn has_record(&self, id: &str) -> bool {
        check_id(id).is_ok() && self.record_path(id).exists()
    }

    pub fn list_ids(&self) -> SavedVisResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn delete(&self, id: &str) -> SavedVisResult<()> {
        check_id(id)?;
        let path = self.record_path(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceStore for JsonFileStore {
    async fn load(&self, id: &str) -> SavedVisResult<SavedVisRecord> {
        check_id(id)?;
        let path = self.record_path(id);
        if !path.exists() {
            return Err(SavedVisError::NotFound {
                kind: KIND,
                id: id.to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, id: Option<&str>, record: &SavedVisRecord) -> SavedVisResult<String> {
        let id = match id {
            Some(id) => id.to_string(),
            None => new_id(),
        };
        check_id(&id)?;

        let content = serde_json::to_string_pretty(record)?;
        fs::write(self.record_path(&id), content)?;
        Ok(id)
    }
}

/// Records kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, SavedVisRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, record: SavedVisRecord) {
        self.lock().insert(id.into(), record);
    }

    pub fn get(&self, id: &str) -> Option<SavedVisRecord> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, SavedVisRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn load(&self, id: &str) -> SavedVisResult<SavedVisRecord> {
        self.get(id).ok_or_else(|| SavedVisError::NotFound {
            kind: KIND,
            id: id.to_string(),
        })
    }

    async fn save(&self, id: Option<&str>, record: &SavedVisRecord) -> SavedVisResult<String> {
        let id = match id {
            Some(id) => id.to_string(),
            None => new_id(),
        };
        self.insert(id.clone(), record.clone());
        Ok(id)
    }
}
