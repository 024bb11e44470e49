//! Interactive calibration session.
//!
//! A session owns the current selection (template + optional scale) and the
//! resolved note set. Every edit changes one field of one tone field, writes
//! both calibration namespaces straight away and publishes a fresh snapshot.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::anchors::{render_layout, RenderModel};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::exceptions::ExceptionTable;
use crate::model::{LabelRecord, NoteData, Override, Scale, TemplateKey, ToneFieldRecord};
use crate::pitch::{PitchAssignment, PitchResolver};
use crate::remote::LayoutService;
use crate::resolver::{LayoutResolver, LayoutSource};
use crate::store::{save_records, CalibrationStore, StorageKey};
use crate::templates::TemplateRegistry;

/// Editable field of a tone field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    Cx,
    Cy,
    Scale,
    Rotate,
    LabelX,
    LabelY,
    LabelOffset,
    SymbolX,
    SymbolY,
    SymbolOffset,
    SymbolLeftX,
    SymbolLeftY,
    SymbolLeftOffset,
    SymbolBottomX,
    SymbolBottomY,
    SymbolBottomOffset,
    PitchTextX,
    PitchTextY,
    PitchTextScale,
    PitchTextRotate,
}

impl NoteField {
    pub fn name(&self) -> &'static str {
        match self {
            NoteField::Cx => "cx",
            NoteField::Cy => "cy",
            NoteField::Scale => "scale",
            NoteField::Rotate => "rotate",
            NoteField::LabelX => "labelX",
            NoteField::LabelY => "labelY",
            NoteField::LabelOffset => "labelOffset",
            NoteField::SymbolX => "symbolX",
            NoteField::SymbolY => "symbolY",
            NoteField::SymbolOffset => "symbolOffset",
            NoteField::SymbolLeftX => "symbolLeftX",
            NoteField::SymbolLeftY => "symbolLeftY",
            NoteField::SymbolLeftOffset => "symbolLeftOffset",
            NoteField::SymbolBottomX => "symbolBottomX",
            NoteField::SymbolBottomY => "symbolBottomY",
            NoteField::SymbolBottomOffset => "symbolBottomOffset",
            NoteField::PitchTextX => "pitchTextX",
            NoteField::PitchTextY => "pitchTextY",
            NoteField::PitchTextScale => "pitchTextScale",
            NoteField::PitchTextRotate => "pitchTextRotate",
        }
    }

    fn apply(&self, note: &mut NoteData, value: Override<f64>) -> Result<()> {
        let geometry = match self {
            NoteField::Cx => Some(&mut note.cx),
            NoteField::Cy => Some(&mut note.cy),
            NoteField::Scale => Some(&mut note.scale),
            NoteField::Rotate => Some(&mut note.rotate),
            _ => None,
        };
        if let Some(slot) = geometry {
            return match value {
                Override::Value(v) => {
                    *slot = v;
                    Ok(())
                }
                _ => Err(Error::InvalidEdit { field: self.name() }),
            };
        }

        let o = &mut note.overrides;
        let slot = match self {
            NoteField::LabelX => &mut o.label_x,
            NoteField::LabelY => &mut o.label_y,
            NoteField::LabelOffset => &mut o.label_offset,
            NoteField::SymbolX => &mut o.symbol_x,
            NoteField::SymbolY => &mut o.symbol_y,
            NoteField::SymbolOffset => &mut o.symbol_offset,
            NoteField::SymbolLeftX => &mut o.symbol_left_x,
            NoteField::SymbolLeftY => &mut o.symbol_left_y,
            NoteField::SymbolLeftOffset => &mut o.symbol_left_offset,
            NoteField::SymbolBottomX => &mut o.symbol_bottom_x,
            NoteField::SymbolBottomY => &mut o.symbol_bottom_y,
            NoteField::SymbolBottomOffset => &mut o.symbol_bottom_offset,
            NoteField::PitchTextX => &mut o.pitch_text_x,
            NoteField::PitchTextY => &mut o.pitch_text_y,
            NoteField::PitchTextScale => &mut o.pitch_text_scale,
            NoteField::PitchTextRotate => &mut o.pitch_text_rotate,
            NoteField::Cx | NoteField::Cy | NoteField::Scale | NoteField::Rotate => {
                return Err(Error::InvalidEdit { field: self.name() })
            }
        };
        *slot = value;
        Ok(())
    }
}

/// Identifies an in-flight remote fetch. Only the ticket of the current
/// selection may apply its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    scale_id: String,
}

impl FetchTicket {
    pub fn scale_id(&self) -> &str {
        &self.scale_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The fetched layout replaced the note set.
    Applied(usize),
    /// The service had nothing; the local layout stays.
    Empty,
    /// The selection changed while the fetch was in flight.
    Stale,
    Failed(String),
}

pub struct CalibrationSession<S: CalibrationStore> {
    store: S,
    registry: TemplateRegistry,
    exceptions: ExceptionTable,
    config: EngineConfig,
    template: TemplateKey,
    scale: Option<Scale>,
    source: LayoutSource,
    notes: Arc<[NoteData]>,
    generation: u64,
    status: Option<String>,
}

impl<S: CalibrationStore> CalibrationSession<S> {
    /// Session with the built-in templates, exceptions and default config.
    pub fn new(store: S, template: TemplateKey, scale: Option<Scale>) -> Self {
        Self::with_parts(
            store,
            TemplateRegistry::new(),
            ExceptionTable::builtin(),
            EngineConfig::default(),
            template,
            scale,
        )
    }

    pub fn with_parts(
        store: S,
        registry: TemplateRegistry,
        exceptions: ExceptionTable,
        config: EngineConfig,
        template: TemplateKey,
        scale: Option<Scale>,
    ) -> Self {
        let mut session = CalibrationSession {
            store,
            registry,
            exceptions,
            config,
            template,
            scale,
            source: LayoutSource::Defaults,
            notes: Arc::from(Vec::new()),
            generation: 0,
            status: None,
        };
        session.reload();
        session
    }

    // ── Selection ───────────────────────────────────────────────────

    /// Switch template and/or scale; the note set is rebuilt from scratch.
    pub fn select(&mut self, template: TemplateKey, scale: Option<Scale>) {
        self.template = template;
        self.scale = scale;
        self.reload();
    }

    /// Re-resolve the current selection from storage.
    pub fn reload(&mut self) {
        let resolved = LayoutResolver::new(&self.registry, &self.exceptions, &self.store, &self.config)
            .resolve(self.template, self.scale.as_ref());
        self.source = resolved.source;
        self.notes = Arc::from(resolved.notes);
        self.generation += 1;
        self.status = None;
    }

    pub fn template(&self) -> TemplateKey {
        self.template
    }

    pub fn scale(&self) -> Option<&Scale> {
        self.scale.as_ref()
    }

    pub fn source(&self) -> LayoutSource {
        self.source
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::for_selection(self.template, self.scale.as_ref())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Last persistence or remote message, cleared on reselection.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    // ── Snapshot access ─────────────────────────────────────────────

    pub fn notes(&self) -> Arc<[NoteData]> {
        Arc::clone(&self.notes)
    }

    pub fn note(&self, id: u32) -> Option<&NoteData> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn pitches(&self) -> PitchAssignment {
        PitchResolver::new(&self.exceptions).resolve(&self.notes, self.template, self.scale.as_ref())
    }

    pub fn render_model(&self) -> RenderModel {
        render_layout(&self.notes, self.template, self.scale.as_ref(), &self.exceptions, &self.config)
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Set one field of one tone field and persist.
    ///
    /// Geometry fields need `Override::Value`. A storage failure does not undo
    /// the edit; it is reported through [`status`](Self::status).
    pub fn update_note(&mut self, id: u32, field: NoteField, value: Override<f64>) -> Result<Arc<[NoteData]>> {
        let mut notes = self.notes.to_vec();
        let note = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(Error::UnknownNote(id))?;
        field.apply(note, value)?;
        self.notes = Arc::from(notes);

        if let Err(e) = self.persist() {
            warn!(id, field = field.name(), error = %e, "edit kept but not saved");
            self.status = Some(format!("Calibration not saved: {e}"));
        }
        Ok(self.notes())
    }

    /// Write both namespaces for the current selection.
    pub fn persist(&mut self) -> Result<()> {
        let key = self.storage_key();
        let tone_fields = self.tone_field_records();
        let labels = self.label_records();
        save_records(&mut self.store, &key.tone_field_key(&self.config), &tone_fields)?;
        save_records(&mut self.store, &key.label_key(&self.config), &labels)?;
        self.status = None;
        Ok(())
    }

    pub fn tone_field_records(&self) -> Vec<ToneFieldRecord> {
        self.notes.iter().map(NoteData::tone_field_record).collect()
    }

    pub fn label_records(&self) -> Vec<LabelRecord> {
        self.notes.iter().map(NoteData::label_record).collect()
    }

    pub fn export_tone_field_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.tone_field_records())?)
    }

    pub fn export_label_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.label_records())?)
    }

    // ── Remote layout ───────────────────────────────────────────────

    /// Persist locally, then push the note set to the layout service.
    ///
    /// A local write failure does not stop the push. Either failure is left
    /// in [`status`](Self::status).
    pub fn save_layout<L: LayoutService + ?Sized>(&mut self, service: &mut L) -> Result<bool> {
        let Some(scale_id) = self.scale.as_ref().map(|s| s.id.clone()) else {
            return Err(Error::Remote("no scale bound".to_string()));
        };
        let local = self.persist();
        if let Err(e) = &local {
            warn!(scale_id = %scale_id, error = %e, "layout not saved locally");
        }
        match service.save_layout(&scale_id, &self.notes) {
            Ok(accepted) => {
                self.status = Some(match (&local, accepted) {
                    (Err(e), _) => format!("Calibration not saved: {e}"),
                    (Ok(()), true) => "Layout saved".to_string(),
                    (Ok(()), false) => "Layout rejected".to_string(),
                });
                Ok(accepted)
            }
            Err(e) => {
                warn!(scale_id = %scale_id, error = %e, "layout save failed");
                self.status = Some(format!("Layout save failed: {e}"));
                Err(e)
            }
        }
    }

    /// Start a fetch for the bound scale. `None` when no scale is bound.
    pub fn begin_layout_fetch(&self) -> Option<FetchTicket> {
        self.scale.as_ref().map(|s| FetchTicket { generation: self.generation, scale_id: s.id.clone() })
    }

    /// Apply a fetch result if its ticket still matches the selection.
    pub fn complete_layout_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Option<Vec<NoteData>>>,
    ) -> FetchOutcome {
        if ticket.generation != self.generation {
            debug!(scale_id = %ticket.scale_id, "stale layout response discarded");
            return FetchOutcome::Stale;
        }
        match result {
            Ok(Some(mut notes)) if !notes.is_empty() => {
                for note in &mut notes {
                    note.position = self.template.position_of(note.id);
                }
                let count = notes.len();
                self.notes = Arc::from(notes);
                debug!(scale_id = %ticket.scale_id, count, "remote layout applied");
                FetchOutcome::Applied(count)
            }
            Ok(_) => FetchOutcome::Empty,
            Err(e) => {
                warn!(scale_id = %ticket.scale_id, error = %e, "layout fetch failed");
                self.status = Some(format!("Layout fetch failed: {e}"));
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Fetch and apply in one step.
    pub fn refresh_from<L: LayoutService + ?Sized>(&mut self, service: &L) -> FetchOutcome {
        match self.begin_layout_fetch() {
            Some(ticket) => {
                let result = service.fetch_layout(ticket.scale_id());
                self.complete_layout_fetch(ticket, result)
            }
            None => FetchOutcome::Empty,
        }
    }
}
