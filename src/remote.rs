//! Remote layout service: a per-scale note set kept outside local storage.
//!
//! A non-empty fetched layout replaces the local note set wholesale.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::NoteData;

pub trait LayoutService {
    /// `Ok(None)` when the service has nothing for this scale.
    fn fetch_layout(&self, scale_id: &str) -> Result<Option<Vec<NoteData>>>;
    /// Returns whether the service accepted the layout.
    fn save_layout(&mut self, scale_id: &str, notes: &[NoteData]) -> Result<bool>;
}

/// Body of a save request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLayoutRequest {
    pub scale_id: String,
    pub layout_data: Vec<NoteData>,
}

/// Layout files stored as `<root>/<scaleId>.json`.
#[derive(Debug, Clone)]
pub struct DirLayoutService {
    root: PathBuf,
}

impl DirLayoutService {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DirLayoutService { root: root.as_ref().to_path_buf() }
    }

    fn path_for(&self, scale_id: &str) -> Result<PathBuf> {
        if scale_id.is_empty() || scale_id.contains(['/', '\\']) || scale_id.starts_with('.') {
            return Err(Error::Remote(format!("invalid scale id '{scale_id}'")));
        }
        Ok(self.root.join(format!("{scale_id}.json")))
    }

    /// Handle a save request body as the service endpoint would.
    pub fn handle_save(&mut self, body: &str) -> Result<bool> {
        let request: SaveLayoutRequest = serde_json::from_str(body)?;
        self.save_layout(&request.scale_id, &request.layout_data)
    }
}

impl LayoutService for DirLayoutService {
    fn fetch_layout(&self, scale_id: &str) -> Result<Option<Vec<NoteData>>> {
        let path = self.path_for(scale_id)?;
        if !path.exists() {
            debug!(scale_id, "no remote layout");
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|source| Error::Storage { path: path.clone(), source })?;
        let notes: Vec<NoteData> = serde_json::from_str(&text)?;
        Ok((!notes.is_empty()).then_some(notes))
    }

    fn save_layout(&mut self, scale_id: &str, notes: &[NoteData]) -> Result<bool> {
        let path = self.path_for(scale_id)?;
        std::fs::create_dir_all(&self.root)
            .map_err(|source| Error::Storage { path: self.root.clone(), source })?;
        let text = serde_json::to_string_pretty(notes)?;
        match std::fs::write(&path, text) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(scale_id, error = %e, "layout save failed");
                Err(Error::Storage { path, source: e })
            }
        }
    }
}
