//! Persistent calibration storage.
//!
//! Calibration is kept as two JSON arrays per storage key: tone-field
//! geometry and label anchors. The store itself is a plain key/value
//! capability injected by the caller.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{EngineConfig, LABEL_KEY_PREFIX, SCALE_KEY_PREFIX, TONE_FIELD_KEY_PREFIX};
use crate::error::{Error, Result};
use crate::model::{LabelRecord, Scale, TemplateKey, ToneFieldRecord};

// ═══════════════════════════════════════════════════════════════════════
// Storage keys
// ═══════════════════════════════════════════════════════════════════════

/// Names the calibration slot for one selection: `scale_<id>` when a scale
/// is bound, otherwise the template key itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    suffix: String,
}

impl StorageKey {
    pub fn for_selection(template: TemplateKey, scale: Option<&Scale>) -> Self {
        match scale {
            Some(s) => StorageKey::for_scale(&s.id),
            None => StorageKey::for_template(template),
        }
    }

    pub fn for_scale(scale_id: &str) -> Self {
        StorageKey { suffix: format!("{SCALE_KEY_PREFIX}{scale_id}") }
    }

    pub fn for_template(template: TemplateKey) -> Self {
        StorageKey { suffix: template.as_str().to_string() }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn tone_field_key(&self, config: &EngineConfig) -> String {
        format!("{}{TONE_FIELD_KEY_PREFIX}{}", config.key_namespace, self.suffix)
    }

    pub fn label_key(&self, config: &EngineConfig) -> String {
        format!("{}{LABEL_KEY_PREFIX}{}", config.key_namespace, self.suffix)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Store capability
// ═══════════════════════════════════════════════════════════════════════

/// Key/value persistence for calibration arrays.
pub trait CalibrationStore {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn save(&mut self, key: &str, value: &Value) -> Result<()>;
}

/// In-process store, also the default for previews and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CalibrationStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// One pretty-printed JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        DirStore { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl CalibrationStore for DirStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|source| Error::Storage { path: path.clone(), source })?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|source| Error::Storage { path: self.dir.clone(), source })?;
        let path = self.path_for(key);
        let text = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, text).map_err(|source| Error::Storage { path, source })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Typed record access
// ═══════════════════════════════════════════════════════════════════════

/// Records carrying a tone-field id.
pub trait Identified {
    fn id(&self) -> u32;
}

impl Identified for ToneFieldRecord {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for LabelRecord {
    fn id(&self) -> u32 {
        self.id
    }
}

/// Keep the first record for each id, preserving order.
pub fn dedup_by_id<T: Identified>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    records.into_iter().filter(|r| seen.insert(r.id())).collect()
}

/// Load a record array. Missing, unreadable or malformed data is `None`;
/// the latter two are logged.
pub fn load_records<T, S>(store: &S, key: &str) -> Option<Vec<T>>
where
    T: DeserializeOwned + Identified,
    S: CalibrationStore + ?Sized,
{
    let value = match store.load(key) {
        Ok(Some(v)) => v,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "calibration read failed, treating as absent");
            return None;
        }
    };
    match serde_json::from_value::<Vec<T>>(value) {
        Ok(records) => {
            let before = records.len();
            let records = dedup_by_id(records);
            if records.len() != before {
                debug!(key, dropped = before - records.len(), "duplicate ids collapsed");
            }
            Some(records)
        }
        Err(e) => {
            warn!(key, error = %e, "malformed calibration data, treating as absent");
            None
        }
    }
}

pub fn save_records<T, S>(store: &mut S, key: &str, records: &[T]) -> Result<()>
where
    T: Serialize,
    S: CalibrationStore + ?Sized,
{
    let value = serde_json::to_value(records)?;
    store.save(key, &value)?;
    debug!(key, count = records.len(), "calibration saved");
    Ok(())
}

/// Both namespaces of one storage key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredCalibration {
    pub tone_fields: Option<Vec<ToneFieldRecord>>,
    pub labels: Option<Vec<LabelRecord>>,
}

impl StoredCalibration {
    pub fn load<S: CalibrationStore + ?Sized>(store: &S, key: &StorageKey, config: &EngineConfig) -> Self {
        StoredCalibration {
            tone_fields: load_records(store, &key.tone_field_key(config)),
            labels: load_records(store, &key.label_key(config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn storage_keys() {
        let cfg = EngineConfig::default();
        let scale = Scale::new("d_kurd_9", "D3", &[], &[]);
        let by_scale = StorageKey::for_selection(TemplateKey::Notes9, Some(&scale));
        assert_eq!(by_scale.tone_field_key(&cfg), "tonefield_calibration_scale_d_kurd_9");
        assert_eq!(by_scale.label_key(&cfg), "label_calibration_scale_d_kurd_9");

        let by_template = StorageKey::for_selection(TemplateKey::Notes12N, None);
        assert_eq!(by_template.tone_field_key(&cfg), "tonefield_calibration_12N");

        let legacy = EngineConfig { key_namespace: "minidigipan_".into(), ..Default::default() };
        assert_eq!(by_template.label_key(&legacy), "minidigipan_label_calibration_12N");
    }

    #[test]
    fn load_collapses_duplicate_ids() {
        let mut store = MemoryStore::new();
        store
            .save(
                "k",
                &json!([
                    {"id":12,"label":"13","cx":1,"cy":2,"scale":3,"rotate":4},
                    {"id":12,"label":"13","cx":9,"cy":9,"scale":9,"rotate":9},
                    {"id":13,"label":"14","cx":5,"cy":6,"scale":7,"rotate":8}
                ]),
            )
            .unwrap();
        let records: Vec<ToneFieldRecord> = load_records(&store, "k").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cx, 1.0);
    }

    #[test]
    fn malformed_data_is_absent() {
        let mut store = MemoryStore::new();
        store.save("k", &json!({"not":"an array"})).unwrap();
        assert!(load_records::<ToneFieldRecord, _>(&store, "k").is_none());
        assert!(load_records::<ToneFieldRecord, _>(&store, "missing").is_none());
    }
}
