//! Pitch text for tone fields.
//!
//! Scale pitches are sorted low to high and handed out by id: the ding gets
//! the ding pitch, top fields take sorted top notes in id order, and the
//! bottom pair takes sorted bottom notes. Scales that break this pattern are
//! described in the [`ExceptionTable`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::exceptions::{ExceptionTable, PitchSource};
use crate::model::{NoteData, Scale, TemplateKey};

// ── Chromatic table (sharps and flats share a slot) ─────────────────
const PITCH_CLASSES: &[(&str, u32)] = &[
    ("C", 0),
    ("C#", 1),
    ("Db", 1),
    ("D", 2),
    ("D#", 3),
    ("Eb", 3),
    ("E", 4),
    ("F", 5),
    ("F#", 6),
    ("Gb", 6),
    ("G", 7),
    ("G#", 8),
    ("Ab", 8),
    ("A", 9),
    ("A#", 10),
    ("Bb", 10),
    ("B", 11),
];

/// Sorts after every known pitch class.
const UNKNOWN_PITCH_CLASS: u32 = 999;

/// Preview pitches shown when no scale is bound.
const PREVIEW_PITCHES: &[&str] = &["D3", "A", "Bb", "C4", "D", "E", "F", "G", "A"];

/// Legal tone-field counts (ding + top + bottom).
pub const SUPPORTED_NOTE_COUNTS: &[usize] = &[9, 10, 11, 12, 14, 15, 18];

fn octave_of(pitch: &str) -> i32 {
    let digits: String = pitch
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

fn pitch_class_of(pitch: &str) -> u32 {
    let name: String = pitch.chars().filter(|c| !c.is_ascii_digit()).collect();
    let mut chars = name.chars();
    let letter = match chars.next() {
        Some(c @ 'A'..='G') => c,
        _ => return UNKNOWN_PITCH_CLASS,
    };
    let key = match chars.next() {
        Some(acc @ ('#' | 'b')) => format!("{letter}{acc}"),
        _ => letter.to_string(),
    };
    PITCH_CLASSES
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, v)| *v)
        .unwrap_or(UNKNOWN_PITCH_CLASS)
}

/// Orders pitch names like `"Bb3"` low to high: octave first, then pitch
/// class. A missing octave counts as 0; unknown names sort last.
pub fn compare_pitch(a: &str, b: &str) -> Ordering {
    octave_of(a)
        .cmp(&octave_of(b))
        .then_with(|| pitch_class_of(a).cmp(&pitch_class_of(b)))
}

/// Stable pitch sort.
pub fn sorted_pitches(pitches: &[String]) -> Vec<String> {
    let mut sorted = pitches.to_vec();
    sorted.sort_by(|a, b| compare_pitch(a, b));
    sorted
}

/// Whether a scale's note counts fit one of the supported layouts.
pub fn is_compatible(scale: &Scale) -> bool {
    let top = scale.notes.top.len();
    let bottom = scale.notes.bottom.len();
    match scale.note_count() {
        11 => top == 8 && bottom == 2,
        12 => top == 9 && bottom == 2,
        14 | 15 | 18 => true,
        n if SUPPORTED_NOTE_COUNTS.contains(&n) => bottom == 0,
        _ => false,
    }
}

/// Bottom ids that take sorted bottom notes, with their index.
fn bottom_offsets(template: TemplateKey) -> &'static [(u32, usize)] {
    match template {
        TemplateKey::Notes9 | TemplateKey::Notes10 => &[],
        _ => &[(10, 0), (11, 1)],
    }
}

/// Pitch assignment for a whole layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "pitches")]
pub enum PitchAssignment {
    /// Pitch text per id; ids without an entry show none.
    Pitches(BTreeMap<u32, String>),
    /// The scale has no layout; show the placeholder instead of pitches.
    NotImplemented,
}

impl PitchAssignment {
    pub fn get(&self, id: u32) -> Option<&str> {
        match self {
            PitchAssignment::Pitches(map) => map.get(&id).map(String::as_str),
            PitchAssignment::NotImplemented => None,
        }
    }
}

/// Resolves pitch text for tone fields against an optional bound scale.
#[derive(Debug, Clone, Copy)]
pub struct PitchResolver<'a> {
    exceptions: &'a ExceptionTable,
}

impl<'a> PitchResolver<'a> {
    pub fn new(exceptions: &'a ExceptionTable) -> Self {
        PitchResolver { exceptions }
    }

    /// Assign pitches to every note. Without a scale the preview table is used.
    pub fn resolve(&self, notes: &[NoteData], template: TemplateKey, scale: Option<&Scale>) -> PitchAssignment {
        let Some(scale) = scale else {
            let map = notes
                .iter()
                .filter_map(|n| PREVIEW_PITCHES.get(n.id as usize).map(|p| (n.id, p.to_string())))
                .collect();
            return PitchAssignment::Pitches(map);
        };
        if !is_compatible(scale) {
            return PitchAssignment::NotImplemented;
        }

        let top = sorted_pitches(&scale.notes.top);
        let bottom = sorted_pitches(&scale.notes.bottom);
        let exception = self.exceptions.get(&scale.id);

        let map = notes
            .iter()
            .filter_map(|note| {
                // The ding always sounds the scale's ding, whatever its label.
                if note.is_ding() {
                    return Some((note.id, scale.notes.ding.clone()));
                }
                let pitch = match exception.and_then(|e| e.pitch_for(note)) {
                    Some(source) => from_source(source, &top, &bottom),
                    None => generic_pitch(note.id, template, &top, &bottom),
                };
                pitch.map(|p| (note.id, p))
            })
            .collect();
        PitchAssignment::Pitches(map)
    }
}

fn from_source(source: &PitchSource, top: &[String], bottom: &[String]) -> Option<String> {
    match source {
        PitchSource::Literal(p) => Some(p.clone()),
        PitchSource::Top(i) => top.get(*i).cloned(),
        PitchSource::Bottom(i) => bottom.get(*i).cloned(),
        PitchSource::Silent => None,
    }
}

fn generic_pitch(id: u32, template: TemplateKey, top: &[String], bottom: &[String]) -> Option<String> {
    if let Some((_, index)) = bottom_offsets(template).iter().find(|(bid, _)| *bid == id) {
        return bottom.get(*index).cloned();
    }
    if (1..=9).contains(&id) {
        return top.get(id as usize - 1).cloned();
    }
    None
}
