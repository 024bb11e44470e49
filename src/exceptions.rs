//! Per-scale exceptions to the generic label, pitch and layout rules.
//!
//! Most scales follow the generic mapping of their template family. The
//! handful that don't are described here as data: ordered match rules for
//! labels and pitches, plus layout adjustments applied after defaults are
//! resolved. The table can also be loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{NoteData, TemplateKey};

/// Selects the tone field a rule applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteMatch {
    Id(u32),
    /// Matches the fallback label. Only used where synthesized fields carry
    /// their rank in the label rather than the id.
    Label(String),
}

impl NoteMatch {
    pub fn matches(&self, note: &NoteData) -> bool {
        match self {
            NoteMatch::Id(id) => note.id == *id,
            NoteMatch::Label(label) => note.label == *label,
        }
    }
}

/// Where a tone field's pitch text comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchSource {
    Literal(String),
    /// Index into the pitch-sorted top notes.
    Top(usize),
    /// Index into the pitch-sorted bottom notes.
    Bottom(usize),
    /// No pitch text.
    Silent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRule {
    #[serde(rename = "match")]
    pub matcher: NoteMatch,
    /// Empty text suppresses the label; no text shows the fallback label.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchRule {
    #[serde(rename = "match")]
    pub matcher: NoteMatch,
    pub source: PitchSource,
}

/// Adjustments applied to a layout built from template defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAdjustment {
    /// Copy the bottom pair (ids 10/11) from this template's stored calibration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrow_bottom_from: Option<TemplateKey>,
    /// Mirror ids 10 and 11 after borrowing.
    #[serde(default)]
    pub swap_bottom_pair: bool,
}

impl LayoutAdjustment {
    pub fn is_noop(&self) -> bool {
        self.borrow_bottom_from.is_none() && !self.swap_bottom_pair
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleException {
    pub scale_id: String,
    /// Templates the label rules apply on; empty means all.
    #[serde(default)]
    pub label_templates: Vec<TemplateKey>,
    #[serde(default)]
    pub label_rules: Vec<LabelRule>,
    #[serde(default)]
    pub pitch_rules: Vec<PitchRule>,
    #[serde(default)]
    pub layout: LayoutAdjustment,
}

impl ScaleException {
    fn new(scale_id: &str) -> Self {
        ScaleException {
            scale_id: scale_id.to_string(),
            label_templates: Vec::new(),
            label_rules: Vec::new(),
            pitch_rules: Vec::new(),
            layout: LayoutAdjustment::default(),
        }
    }

    fn on_templates(mut self, templates: &[TemplateKey]) -> Self {
        self.label_templates = templates.to_vec();
        self
    }

    fn label(mut self, matcher: NoteMatch, text: &str) -> Self {
        self.label_rules.push(LabelRule { matcher, text: Some(text.to_string()) });
        self
    }

    fn keep_labels(mut self, ids: &[u32]) -> Self {
        for id in ids {
            self.label_rules.push(LabelRule { matcher: NoteMatch::Id(*id), text: None });
        }
        self
    }

    fn labels_by_id(mut self, pairs: &[(u32, &str)]) -> Self {
        for (id, text) in pairs {
            self = self.label(NoteMatch::Id(*id), text);
        }
        self
    }

    fn pitch(mut self, matcher: NoteMatch, source: PitchSource) -> Self {
        self.pitch_rules.push(PitchRule { matcher, source });
        self
    }

    fn literal_pitches(mut self, pairs: &[(u32, &str)]) -> Self {
        for (id, pitch) in pairs {
            self = self.pitch(NoteMatch::Id(*id), PitchSource::Literal(pitch.to_string()));
        }
        self
    }

    fn layout(mut self, layout: LayoutAdjustment) -> Self {
        self.layout = layout;
        self
    }

    /// First matching label rule, if this template is in scope.
    pub fn label_for<'s>(&'s self, note: &'s NoteData, template: TemplateKey) -> Option<&'s str> {
        if !self.label_templates.is_empty() && !self.label_templates.contains(&template) {
            return None;
        }
        self.label_rules
            .iter()
            .find(|r| r.matcher.matches(note))
            .map(|r| r.text.as_deref().unwrap_or(note.label.as_str()))
    }

    pub fn pitch_for(&self, note: &NoteData) -> Option<&PitchSource> {
        self.pitch_rules
            .iter()
            .find(|r| r.matcher.matches(note))
            .map(|r| &r.source)
    }
}

/// Lookup table of [`ScaleException`]s keyed by scale id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExceptionTable {
    entries: Vec<ScaleException>,
}

impl Default for ExceptionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ExceptionTable {
    pub fn empty() -> Self {
        ExceptionTable { entries: Vec::new() }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, scale_id: &str) -> Option<&ScaleException> {
        self.entries.iter().find(|e| e.scale_id == scale_id)
    }

    pub fn entries(&self) -> &[ScaleException] {
        &self.entries
    }

    /// Exceptions for the scales shipped with the instrument catalog.
    pub fn builtin() -> Self {
        use NoteMatch::{Id, Label};
        use TemplateKey::*;

        let mut fs18 = ScaleException::new("fs_low_pygmy_18_mutant")
            .on_templates(&[Notes14M, Notes18])
            .label(Id(13), "7")
            .label(Label("16".into()), "6")
            .label(Id(12), "14")
            .labels_by_id(&[
                (10, "1"), (11, "2"), (0, "3"), (1, "4"), (2, "5"), (3, "8"), (4, "9"),
                (5, "10"), (6, "11"), (7, "12"), (14, "13"), (15, "14"), (8, "15"),
                (9, "16"), (16, "17"), (17, "18"),
            ])
            .literal_pitches(&[
                (1, "G#3"), (2, "A3"), (3, "D4"), (4, "E4"), (5, "F#4"), (6, "G#4"),
                (7, "A4"), (8, "D5"), (9, "E5"), (13, "C#4"), (14, "B4"), (15, "C#5"),
            ])
            .pitch(Label("13".into()), PitchSource::Literal("B3".into()));
        // Remaining fields carry their rank in the fallback label.
        for (rank, pitch) in [
            "D3", "E3", "F#3", "G#3", "A3", "B3", "C#4", "D4", "E4", "F#4", "G#4", "A4", "B4",
            "C#5", "D5", "E5", "F#5", "G#5",
        ]
        .iter()
        .enumerate()
        {
            fs18 = fs18.pitch(Label((rank + 1).to_string()), PitchSource::Literal(pitch.to_string()));
        }

        let fs14 = ScaleException::new("fs_low_pygmy_14_mutant")
            .literal_pitches(&[(12, "E5"), (13, "F#5")]);

        let asha15 = ScaleException::new("d_asha_15_mutant")
            .on_templates(&[Notes15])
            .labels_by_id(&[
                (0, "1"), (10, "2"), (11, "3"), (14, "4"), (1, "5"), (2, "6"), (3, "7"),
                (4, "8"), (5, "9"), (6, "10"), (7, "11"), (8, "12"), (9, "13"), (12, "14"),
                (13, "15"),
            ])
            .pitch(Id(12), PitchSource::Top(9))
            .pitch(Id(13), PitchSource::Top(10))
            .pitch(Id(14), PitchSource::Bottom(2))
            .pitch(Id(15), PitchSource::Silent);

        let equinox14 = ScaleException::new("e_equinox_14")
            .pitch(Id(12), PitchSource::Bottom(2))
            .pitch(Id(13), PitchSource::Bottom(3));

        let deepasia14 = ScaleException::new("cs_deepasia_14")
            .on_templates(&[Notes12N, Notes14N, Notes14M])
            .labels_by_id(&[
                (0, "1"), (10, "2"), (11, "3"), (12, "7"), (13, ""), (1, "4"), (2, "5"),
                (3, "6"), (4, "9"), (5, "8"), (6, "9"), (7, "10"), (8, "11"), (9, "12"),
            ])
            .literal_pitches(&[(6, "G#4"), (13, "F4")])
            .pitch(Id(12), PitchSource::Bottom(2));

        let borrow_eleven = LayoutAdjustment { borrow_bottom_from: Some(Notes11), swap_bottom_pair: false };

        let kurd12 = ScaleException::new("d_kurd_12")
            .on_templates(&[Notes12N, Notes14N, Notes14M])
            .labels_by_id(&[(0, "1"), (10, "2"), (11, "3")])
            .labels_by_id(&[
                (1, "4"), (2, "5"), (3, "6"), (4, "7"), (5, "8"), (6, "9"), (7, "10"),
                (8, "11"), (9, "12"),
            ])
            .keep_labels(&[12, 13])
            .layout(LayoutAdjustment { swap_bottom_pair: true, ..borrow_eleven.clone() });

        let pygmy12 = ScaleException::new("f_low_pygmy_12").layout(borrow_eleven.clone());
        let equinox12 = ScaleException::new("e_equinox_12").layout(borrow_eleven);

        ExceptionTable {
            entries: vec![fs18, fs14, asha15, equinox14, deepasia14, kurd12, pygmy12, equinox12],
        }
    }
}
