//! Builds the effective layout for a selection by layering stored
//! calibration over template defaults.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::exceptions::{ExceptionTable, LayoutAdjustment};
use crate::model::{LabelOverrides, LabelRecord, NoteData, Override, Scale, TemplateKey, ToneFieldRecord};
use crate::store::{CalibrationStore, StorageKey, StoredCalibration};
use crate::templates::TemplateRegistry;

/// Where the tone-field geometry of a resolved layout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutSource {
    Stored,
    Inherited,
    Defaults,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub storage_key: StorageKey,
    pub source: LayoutSource,
    pub notes: Vec<NoteData>,
}

pub struct LayoutResolver<'a, S: CalibrationStore + ?Sized> {
    registry: &'a TemplateRegistry,
    exceptions: &'a ExceptionTable,
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: CalibrationStore + ?Sized> LayoutResolver<'a, S> {
    pub fn new(
        registry: &'a TemplateRegistry,
        exceptions: &'a ExceptionTable,
        store: &'a S,
        config: &'a EngineConfig,
    ) -> Self {
        LayoutResolver { registry, exceptions, store, config }
    }

    pub fn resolve(&self, template: TemplateKey, scale: Option<&Scale>) -> ResolvedLayout {
        let storage_key = StorageKey::for_selection(template, scale);
        let stored = StoredCalibration::load(self.store, &storage_key, self.config);
        let defaults = self.registry.defaults(template, scale);

        let (source, tone_fields, labels) = match stored.tone_fields {
            Some(tone) => (LayoutSource::Stored, tone, stored.labels),
            None => match self.registry.inherit(template, scale, self.store, self.config) {
                Some(inherited) => {
                    let labels = match (stored.labels, inherited.labels) {
                        (Some(own), Some(borrowed)) => Some(fill_missing(own, borrowed, &inherited.appended)),
                        (own, borrowed) => own.or(borrowed),
                    };
                    (LayoutSource::Inherited, inherited.tone_fields, labels)
                }
                None => {
                    let tone = defaults.iter().map(NoteData::tone_field_record).collect();
                    (LayoutSource::Defaults, tone, stored.labels)
                }
            },
        };
        debug!(key = storage_key.suffix(), ?source, count = tone_fields.len(), "layout resolved");

        let mut notes = merge(template, &defaults, tone_fields, labels.unwrap_or_default());

        if source == LayoutSource::Defaults {
            if let Some(exception) = scale.and_then(|s| self.exceptions.get(&s.id)) {
                if !exception.layout.is_noop() {
                    self.adjust(&mut notes, &exception.layout);
                }
            }
        }

        ResolvedLayout { storage_key, source, notes }
    }

    /// Apply a scale's layout adjustment to default-derived notes.
    fn adjust(&self, notes: &mut [NoteData], adjustment: &LayoutAdjustment) {
        if let Some(from) = adjustment.borrow_bottom_from {
            let donor = StoredCalibration::load(self.store, &StorageKey::for_template(from), self.config);
            if let Some(tone) = donor.tone_fields {
                let labels = donor.labels.unwrap_or_default();
                for id in [10, 11] {
                    let (Some(src), Some(dst)) = (tone.iter().find(|r| r.id == id), notes.iter_mut().find(|n| n.id == id))
                    else {
                        continue;
                    };
                    dst.cx = src.cx;
                    dst.cy = src.cy;
                    dst.scale = src.scale;
                    dst.rotate = src.rotate;
                    let label = labels.iter().find(|r| r.id == id);
                    dst.overrides.label_x = borrowed_anchor(label.map(|r| r.overrides.label_x));
                    dst.overrides.label_y = borrowed_anchor(label.map(|r| r.overrides.label_y));
                }
                debug!(from = %from, "bottom pair borrowed");
            }
        }
        if adjustment.swap_bottom_pair {
            swap_bottom_pair(notes);
        }
    }
}

/// Add label anchors for appended ids the stored labels don't cover yet.
fn fill_missing(mut own: Vec<LabelRecord>, borrowed: Vec<LabelRecord>, appended: &[u32]) -> Vec<LabelRecord> {
    let missing: Vec<LabelRecord> = borrowed
        .into_iter()
        .filter(|r| appended.contains(&r.id) && !own.iter().any(|o| o.id == r.id))
        .collect();
    own.extend(missing);
    own
}

fn borrowed_anchor(value: Option<Override<f64>>) -> Override<f64> {
    match value {
        Some(Override::Value(v)) => Override::Value(v),
        _ => Override::Auto,
    }
}

/// Mirror ids 10 and 11: exchange placement and label anchors, keep size.
fn swap_bottom_pair(notes: &mut [NoteData]) {
    let (Some(a), Some(b)) = (
        notes.iter().position(|n| n.id == 10),
        notes.iter().position(|n| n.id == 11),
    ) else {
        return;
    };
    let (left, right) = (notes[a].clone(), notes[b].clone());
    for (dst, src) in [(a, &right), (b, &left)] {
        let n = &mut notes[dst];
        n.cx = src.cx;
        n.cy = src.cy;
        n.rotate = src.rotate;
        n.overrides.label_x = src.overrides.label_x;
        n.overrides.label_y = src.overrides.label_y;
    }
}

/// Seed per-id overrides from the defaults, overlay stored label records,
/// and emit one note per tone-field record.
fn merge(
    template: TemplateKey,
    defaults: &[NoteData],
    tone_fields: Vec<ToneFieldRecord>,
    labels: Vec<LabelRecord>,
) -> Vec<NoteData> {
    let seeds: HashMap<u32, &LabelOverrides> = defaults.iter().map(|n| (n.id, &n.overrides)).collect();
    let stored: HashMap<u32, &LabelOverrides> = labels.iter().map(|r| (r.id, &r.overrides)).collect();

    tone_fields
        .into_iter()
        .map(|record| {
            let seed = seeds.get(&record.id).copied().cloned().unwrap_or_default();
            let overrides = match stored.get(&record.id) {
                Some(upper) => seed.overlay(upper),
                None => seed,
            };
            NoteData {
                id: record.id,
                label: record.label,
                position: template.position_of(record.id),
                cx: record.cx,
                cy: record.cy,
                scale: record.scale,
                rotate: record.rotate,
                overrides,
            }
        })
        .collect()
}
