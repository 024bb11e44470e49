//! Data model for tone-field layouts and their stored calibration.
//!
//! All geometry lives in a 1000×1000 design space. A layout is a list of
//! [`NoteData`], one per tone field, keyed by a stable integer id where
//! id 0 is always the central ding.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::radii_from_scale;

// ═══════════════════════════════════════════════════════════════════════
// Tri-state override
// ═══════════════════════════════════════════════════════════════════════

/// A calibration value that may be inherited, forced automatic, or explicit.
///
/// In JSON a missing key is `Unset`, `null` is `Auto` and a number is `Value`.
/// Serialization writes `Auto` as `null`; `Unset` fields are skipped by the
/// `skip_serializing_if` on the containing struct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Override<T> {
    /// Inherit from the layer below.
    Unset,
    /// Compute the anchor automatically, ignoring any lower layer.
    Auto,
    Value(T),
}

impl<T> Default for Override<T> {
    fn default() -> Self {
        Override::Unset
    }
}

impl<T> Override<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Override::Unset)
    }

    /// The explicit value, if any. `Unset` and `Auto` both yield `None`.
    pub fn value(&self) -> Option<&T> {
        match self {
            Override::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Layer `upper` on top of `self`: only `Unset` lets `self` show through.
    pub fn overlay(self, upper: Override<T>) -> Override<T> {
        match upper {
            Override::Unset => self,
            other => other,
        }
    }
}

impl<T: Copy> Override<T> {
    pub fn value_or(&self, auto: T) -> T {
        match self {
            Override::Value(v) => *v,
            _ => auto,
        }
    }
}

impl<T> From<Option<T>> for Override<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Override::Value(v),
            None => Override::Auto,
        }
    }
}

impl<T: Serialize> Serialize for Override<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Override::Value(v) => serializer.serialize_some(v),
            Override::Unset | Override::Auto => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Override<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Override::from)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Label and marker overrides
// ═══════════════════════════════════════════════════════════════════════

/// Per-field anchor overrides for the label, the ding markers and the pitch text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelOverrides {
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub label_x: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub label_y: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub label_offset: Override<f64>,

    /// Right-side marker ("RS").
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_x: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_y: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_offset: Override<f64>,

    /// Left-side marker ("LS").
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_left_x: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_left_y: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_left_offset: Override<f64>,

    /// Bottom marker ("H").
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_bottom_x: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_bottom_y: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub symbol_bottom_offset: Override<f64>,

    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub pitch_text_x: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub pitch_text_y: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub pitch_text_scale: Override<f64>,
    #[serde(default, skip_serializing_if = "Override::is_unset")]
    pub pitch_text_rotate: Override<f64>,
}

impl LabelOverrides {
    /// Field-by-field overlay of `upper` on `self`.
    pub fn overlay(&self, upper: &LabelOverrides) -> LabelOverrides {
        LabelOverrides {
            label_x: self.label_x.overlay(upper.label_x),
            label_y: self.label_y.overlay(upper.label_y),
            label_offset: self.label_offset.overlay(upper.label_offset),
            symbol_x: self.symbol_x.overlay(upper.symbol_x),
            symbol_y: self.symbol_y.overlay(upper.symbol_y),
            symbol_offset: self.symbol_offset.overlay(upper.symbol_offset),
            symbol_left_x: self.symbol_left_x.overlay(upper.symbol_left_x),
            symbol_left_y: self.symbol_left_y.overlay(upper.symbol_left_y),
            symbol_left_offset: self.symbol_left_offset.overlay(upper.symbol_left_offset),
            symbol_bottom_x: self.symbol_bottom_x.overlay(upper.symbol_bottom_x),
            symbol_bottom_y: self.symbol_bottom_y.overlay(upper.symbol_bottom_y),
            symbol_bottom_offset: self.symbol_bottom_offset.overlay(upper.symbol_bottom_offset),
            pitch_text_x: self.pitch_text_x.overlay(upper.pitch_text_x),
            pitch_text_y: self.pitch_text_y.overlay(upper.pitch_text_y),
            pitch_text_scale: self.pitch_text_scale.overlay(upper.pitch_text_scale),
            pitch_text_rotate: self.pitch_text_rotate.overlay(upper.pitch_text_rotate),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Tone fields
// ═══════════════════════════════════════════════════════════════════════

/// Where a tone field sits on the instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Center,
    #[default]
    Top,
    Bottom,
}

/// One tone field of a resolved layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    pub id: u32,
    /// Fallback identifier, used when no rank label mapping applies.
    #[serde(default)]
    pub label: String,
    /// Inferred from the id and template family; re-derived after loading.
    #[serde(default)]
    pub position: Position,
    pub cx: f64,
    pub cy: f64,
    /// Size factor; the ellipse radii derive from it.
    pub scale: f64,
    /// Rotation in degrees, clockwise in screen space.
    pub rotate: f64,
    #[serde(flatten)]
    pub overrides: LabelOverrides,
}

impl NoteData {
    pub fn rx(&self) -> f64 {
        radii_from_scale(self.scale).0
    }

    pub fn ry(&self) -> f64 {
        radii_from_scale(self.scale).1
    }

    pub fn is_ding(&self) -> bool {
        self.id == 0
    }

    pub fn tone_field_record(&self) -> ToneFieldRecord {
        ToneFieldRecord {
            id: self.id,
            label: self.label.clone(),
            cx: self.cx,
            cy: self.cy,
            scale: self.scale,
            rotate: self.rotate,
        }
    }

    pub fn label_record(&self) -> LabelRecord {
        LabelRecord {
            id: self.id,
            label: self.label.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

/// Geometry half of a stored calibration (`tonefield_calibration_*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneFieldRecord {
    pub id: u32,
    #[serde(default)]
    pub label: String,
    pub cx: f64,
    pub cy: f64,
    pub scale: f64,
    pub rotate: f64,
}

/// Anchor half of a stored calibration (`label_calibration_*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub id: u32,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub overrides: LabelOverrides,
}

// ═══════════════════════════════════════════════════════════════════════
// Scales
// ═══════════════════════════════════════════════════════════════════════

/// Pitches of a scale, split by where they sit on the instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleNotes {
    pub ding: String,
    #[serde(default)]
    pub top: Vec<String>,
    #[serde(default)]
    pub bottom: Vec<String>,
}

/// A named tuning, read-only input from the scale catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub notes: ScaleNotes,
}

impl Scale {
    pub fn new(id: &str, ding: &str, top: &[&str], bottom: &[&str]) -> Self {
        Scale {
            id: id.to_string(),
            name: None,
            notes: ScaleNotes {
                ding: ding.to_string(),
                top: top.iter().map(|s| s.to_string()).collect(),
                bottom: bottom.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    /// Total tone-field count: ding + top + bottom.
    pub fn note_count(&self) -> usize {
        1 + self.notes.top.len() + self.notes.bottom.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Template keys
// ═══════════════════════════════════════════════════════════════════════

/// Identifies a canonical note-count layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateKey {
    Notes9,
    Notes10,
    Notes11,
    Notes12N,
    Notes12M,
    Notes14N,
    Notes14M,
    Notes15,
    Notes18,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 9] = [
        TemplateKey::Notes9,
        TemplateKey::Notes10,
        TemplateKey::Notes11,
        TemplateKey::Notes12N,
        TemplateKey::Notes12M,
        TemplateKey::Notes14N,
        TemplateKey::Notes14M,
        TemplateKey::Notes15,
        TemplateKey::Notes18,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKey::Notes9 => "9",
            TemplateKey::Notes10 => "10",
            TemplateKey::Notes11 => "11",
            TemplateKey::Notes12N => "12N",
            TemplateKey::Notes12M => "12M",
            TemplateKey::Notes14N => "14N",
            TemplateKey::Notes14M => "14M",
            TemplateKey::Notes15 => "15",
            TemplateKey::Notes18 => "18",
        }
    }

    /// Ids drawn on the underside of the instrument for this template family.
    pub fn bottom_ids(&self) -> &'static [u32] {
        match self {
            TemplateKey::Notes9 | TemplateKey::Notes10 => &[],
            TemplateKey::Notes11 | TemplateKey::Notes12N | TemplateKey::Notes12M => &[10, 11],
            TemplateKey::Notes14N
            | TemplateKey::Notes14M
            | TemplateKey::Notes15
            | TemplateKey::Notes18 => &[10, 11, 12, 13, 14, 15],
        }
    }

    pub fn position_of(&self, id: u32) -> Position {
        if id == 0 {
            Position::Center
        } else if self.bottom_ids().contains(&id) {
            Position::Bottom
        } else {
            Position::Top
        }
    }

    /// Template a scale is displayed on when the caller does not pick one.
    pub fn natural_for(scale: &Scale) -> TemplateKey {
        let top = scale.notes.top.len();
        let bottom = scale.notes.bottom.len();
        match scale.note_count() {
            11 => TemplateKey::Notes11,
            12 if top == 9 && bottom == 2 => TemplateKey::Notes12N,
            14 if scale.id.contains("mutant") => TemplateKey::Notes14M,
            14 => TemplateKey::Notes14N,
            15 => TemplateKey::Notes15,
            18 => TemplateKey::Notes14M,
            _ if top + 1 >= 10 => TemplateKey::Notes10,
            _ => TemplateKey::Notes9,
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownTemplate(s.to_string()))
    }
}

impl Serialize for TemplateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TemplateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Stored data uses bare numbers for the plain templates ("9": 9).
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u32),
            Str(String),
        }
        let text = match Raw::deserialize(deserializer)? {
            Raw::Num(n) => n.to_string(),
            Raw::Str(s) => s,
        };
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn override_json_tri_state() {
        let rec: LabelRecord =
            serde_json::from_str(r#"{"id":3,"label":"3","labelX":410.5,"labelY":null}"#).unwrap();
        assert_eq!(rec.overrides.label_x, Override::Value(410.5));
        assert_eq!(rec.overrides.label_y, Override::Auto);
        assert_eq!(rec.overrides.label_offset, Override::Unset);

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id":3,"label":"3","labelX":410.5,"labelY":null})
        );
    }

    #[test]
    fn overlay_respects_unset_and_auto() {
        let seed = LabelOverrides {
            label_x: Override::Value(100.0),
            label_y: Override::Value(200.0),
            ..Default::default()
        };
        let stored = LabelOverrides {
            label_y: Override::Auto,
            label_offset: Override::Value(40.0),
            ..Default::default()
        };
        let merged = seed.overlay(&stored);
        assert_eq!(merged.label_x, Override::Value(100.0));
        assert_eq!(merged.label_y, Override::Auto);
        assert_eq!(merged.label_offset, Override::Value(40.0));
    }

    #[test]
    fn template_key_parses_numbers_and_strings() {
        let keys: Vec<TemplateKey> = serde_json::from_str(r#"[9, "12N", "14m", "18"]"#).unwrap();
        assert_eq!(
            keys,
            vec![
                TemplateKey::Notes9,
                TemplateKey::Notes12N,
                TemplateKey::Notes14M,
                TemplateKey::Notes18
            ]
        );
        assert!("13".parse::<TemplateKey>().is_err());
    }

    #[test]
    fn position_follows_family_bottom_set() {
        assert_eq!(TemplateKey::Notes9.position_of(0), Position::Center);
        assert_eq!(TemplateKey::Notes10.position_of(9), Position::Top);
        assert_eq!(TemplateKey::Notes12N.position_of(11), Position::Bottom);
        assert_eq!(TemplateKey::Notes12N.position_of(12), Position::Top);
        assert_eq!(TemplateKey::Notes18.position_of(14), Position::Bottom);
        assert_eq!(TemplateKey::Notes18.position_of(16), Position::Top);
    }

    #[test]
    fn natural_template_selection() {
        let kurd9 = Scale::new("d_kurd_9", "D3", &["A3"; 8], &[]);
        let kurd10 = Scale::new("d_kurd_10", "D3", &["A3"; 9], &[]);
        let eleven = Scale::new("x_11", "D3", &["A3"; 8], &["D3"; 2]);
        let twelve = Scale::new("x_12", "D3", &["A3"; 9], &["D3"; 2]);
        let mutant = Scale::new("fs_low_pygmy_14_mutant", "F#3", &["A3"; 11], &["D3"; 2]);
        let normal14 = Scale::new("e_equinox_14", "E3", &["A3"; 9], &["D3"; 4]);
        let eighteen = Scale::new("fs_low_pygmy_18_mutant", "F#3", &["A3"; 11], &["D3"; 6]);
        assert_eq!(TemplateKey::natural_for(&kurd9), TemplateKey::Notes9);
        assert_eq!(TemplateKey::natural_for(&kurd10), TemplateKey::Notes10);
        assert_eq!(TemplateKey::natural_for(&eleven), TemplateKey::Notes11);
        assert_eq!(TemplateKey::natural_for(&twelve), TemplateKey::Notes12N);
        assert_eq!(TemplateKey::natural_for(&mutant), TemplateKey::Notes14M);
        assert_eq!(TemplateKey::natural_for(&normal14), TemplateKey::Notes14N);
        assert_eq!(TemplateKey::natural_for(&eighteen), TemplateKey::Notes14M);
    }
}
