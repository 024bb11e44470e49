//! Canonical default layouts per template, plus the inheritance fallback
//! that seeds extended templates from a stored reference layout.

mod layouts;

use std::collections::HashMap;

use tracing::debug;

use crate::config::{EngineConfig, INHERITANCE_SOURCE_SCALE};
use crate::model::{
    LabelOverrides, LabelRecord, NoteData, Override, Scale, TemplateKey, ToneFieldRecord,
};
use crate::store::{CalibrationStore, StorageKey, StoredCalibration};

use layouts::FieldDefault;

/// A new tone field synthesized next to an existing anchor field.
#[derive(Debug, Clone, Copy)]
struct AppendRule {
    id: u32,
    label: &'static str,
    anchor: u32,
    dx: f64,
    dy: f64,
}

const fn append(id: u32, label: &'static str, anchor: u32, dx: f64, dy: f64) -> AppendRule {
    AppendRule { id, label, anchor, dx, dy }
}

// ── Inheritance rules ───────────────────────────────────────────────
const FIFTEEN_APPEND: &[AppendRule] = &[append(14, "15", 10, 0.0, -150.0)];

const EIGHTEEN_APPEND: &[AppendRule] = &[
    append(12, "13", 10, 100.0, 0.0),
    append(13, "14", 11, -100.0, 0.0),
    append(14, "15", 10, 0.0, -150.0),
    append(15, "16", 11, 0.0, -150.0),
    append(16, "17", 11, 100.0, -300.0),
    append(17, "18", 10, -100.0, -300.0),
];

const EIGHTEEN_SCALE: &str = "fs_low_pygmy_18_mutant";

/// Layout borrowed from the inheritance source, with any synthesized ids.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritedLayout {
    pub tone_fields: Vec<ToneFieldRecord>,
    pub labels: Option<Vec<LabelRecord>>,
    /// Ids added on top of the source layout.
    pub appended: Vec<u32>,
}

/// Immutable catalogue of default layouts. Build once and share.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    layouts: HashMap<TemplateKey, Vec<NoteData>>,
    /// Scale-specific replacements for a template's defaults.
    variants: HashMap<(String, TemplateKey), Vec<NoteData>>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        let mut layouts = HashMap::new();
        for key in TemplateKey::ALL {
            let fields: Vec<FieldDefault> = match key {
                TemplateKey::Notes10 => layouts::TEN.to_vec(),
                TemplateKey::Notes11 => layouts::ELEVEN.to_vec(),
                TemplateKey::Notes12N => layouts::TWELVE_N.to_vec(),
                TemplateKey::Notes14N => [layouts::TWELVE_N, layouts::FOURTEEN_N_EXTRA].concat(),
                TemplateKey::Notes14M => [layouts::TWELVE_N, layouts::FOURTEEN_M_EXTRA].concat(),
                // No dedicated artwork; extended templates usually inherit instead.
                TemplateKey::Notes9
                | TemplateKey::Notes12M
                | TemplateKey::Notes15
                | TemplateKey::Notes18 => layouts::NINE.to_vec(),
            };
            layouts.insert(key, build_notes(key, &fields));
        }

        let mut variants = HashMap::new();
        variants.insert(
            ("e_equinox_14".to_string(), TemplateKey::Notes14N),
            build_notes(
                TemplateKey::Notes14N,
                &[layouts::TWELVE_N, layouts::E_EQUINOX_14_EXTRA].concat(),
            ),
        );

        TemplateRegistry { layouts, variants }
    }

    /// Default layout for a template, honoring scale-specific variants.
    pub fn defaults(&self, key: TemplateKey, scale: Option<&Scale>) -> Vec<NoteData> {
        if let Some(scale) = scale {
            if let Some(notes) = self.variants.get(&(scale.id.clone(), key)) {
                return notes.clone();
            }
        }
        self.layouts.get(&key).cloned().unwrap_or_default()
    }

    /// Seed layout for an extended template (`14M`, `15`, `18`) from the
    /// stored layout of the inheritance source scale.
    ///
    /// The caller only asks when the target key has no saved tone-field data.
    /// Returns `None` when the template does not inherit or the source has
    /// nothing stored.
    pub fn inherit<S: CalibrationStore + ?Sized>(
        &self,
        key: TemplateKey,
        scale: Option<&Scale>,
        store: &S,
        config: &EngineConfig,
    ) -> Option<InheritedLayout> {
        if !matches!(key, TemplateKey::Notes14M | TemplateKey::Notes15 | TemplateKey::Notes18) {
            return None;
        }
        let source = StoredCalibration::load(store, &StorageKey::for_scale(INHERITANCE_SOURCE_SCALE), config);
        let tone_fields = source.tone_fields?;

        let rules: &[AppendRule] = match key {
            TemplateKey::Notes15 => FIFTEEN_APPEND,
            TemplateKey::Notes14M | TemplateKey::Notes18
                if scale.map(|s| s.id.as_str()) == Some(EIGHTEEN_SCALE) =>
            {
                EIGHTEEN_APPEND
            }
            _ => &[],
        };
        debug!(template = %key, appended = rules.len(), "inheriting layout from {INHERITANCE_SOURCE_SCALE}");

        let synthesized: Vec<ToneFieldRecord> = rules
            .iter()
            .map(|rule| {
                let anchor = tone_fields
                    .iter()
                    .find(|r| r.id == rule.anchor)
                    .cloned()
                    .unwrap_or_else(|| fallback_anchor(rule.anchor).tone_record());
                ToneFieldRecord {
                    id: rule.id,
                    label: rule.label.to_string(),
                    cx: anchor.cx + rule.dx,
                    cy: anchor.cy + rule.dy,
                    scale: anchor.scale,
                    rotate: anchor.rotate,
                }
            })
            .collect();

        let labels = source.labels.map(|labels| {
            let appended: Vec<LabelRecord> = rules
                .iter()
                .map(|rule| {
                    let fallback = fallback_anchor(rule.anchor);
                    let anchor = labels.iter().find(|r| r.id == rule.anchor);
                    let anchor_x = anchor
                        .and_then(|r| r.overrides.label_x.value().copied())
                        .or(fallback.label_x)
                        .unwrap_or(fallback.cx);
                    let anchor_y = anchor
                        .and_then(|r| r.overrides.label_y.value().copied())
                        .or(fallback.label_y)
                        .unwrap_or(fallback.cy);
                    LabelRecord {
                        id: rule.id,
                        label: rule.label.to_string(),
                        overrides: LabelOverrides {
                            label_x: Override::Value(anchor_x + rule.dx),
                            label_y: Override::Value(anchor_y + rule.dy),
                            label_offset: Override::Value(layouts::DEFAULT_LABEL_OFFSET),
                            ..Default::default()
                        },
                    }
                })
                .collect();
            replace_or_append(labels, appended, |r| r.id)
        });

        Some(InheritedLayout {
            tone_fields: replace_or_append(tone_fields, synthesized, |r| r.id),
            labels,
            appended: rules.iter().map(|r| r.id).collect(),
        })
    }
}

impl FieldDefault {
    fn tone_record(&self) -> ToneFieldRecord {
        ToneFieldRecord {
            id: self.id,
            label: self.label.to_string(),
            cx: self.cx,
            cy: self.cy,
            scale: self.scale,
            rotate: self.rotate,
        }
    }
}

/// Built-in anchor used when the source layout lacks one of the bottom pair.
fn fallback_anchor(id: u32) -> FieldDefault {
    if id == layouts::BOTTOM_RIGHT.id {
        layouts::BOTTOM_RIGHT
    } else {
        layouts::BOTTOM_LEFT
    }
}

/// Appended records replace same-id records already present.
fn replace_or_append<T>(base: Vec<T>, appended: Vec<T>, id: impl Fn(&T) -> u32) -> Vec<T> {
    let mut out: Vec<T> = base
        .into_iter()
        .filter(|r| !appended.iter().any(|a| id(a) == id(r)))
        .collect();
    out.extend(appended);
    out
}

fn build_notes(key: TemplateKey, fields: &[FieldDefault]) -> Vec<NoteData> {
    fields
        .iter()
        .map(|f| {
            let mut overrides = LabelOverrides {
                label_x: Override::from(f.label_x),
                label_y: Override::from(f.label_y),
                label_offset: Override::Value(layouts::DEFAULT_LABEL_OFFSET),
                ..Default::default()
            };
            if f.id == 0 {
                overrides.symbol_x = Override::Value(layouts::DING_SYMBOL_X);
                overrides.symbol_y = Override::Auto;
                overrides.symbol_offset = Override::Value(layouts::DEFAULT_SYMBOL_OFFSET);
                overrides.symbol_left_x = Override::Value(layouts::DING_SYMBOL_LEFT_X);
                overrides.symbol_left_y = Override::Auto;
                overrides.symbol_left_offset = Override::Value(layouts::DEFAULT_SYMBOL_OFFSET);
                overrides.symbol_bottom_x = Override::Auto;
                overrides.symbol_bottom_y = Override::Value(layouts::DING_SYMBOL_BOTTOM_Y);
                overrides.symbol_bottom_offset = Override::Value(layouts::DEFAULT_SYMBOL_OFFSET);
            }
            NoteData {
                id: f.id,
                label: f.label.to_string(),
                position: key.position_of(f.id),
                cx: f.cx,
                cy: f.cy,
                scale: f.scale,
                rotate: f.rotate,
                overrides,
            }
        })
        .collect()
}
