//! Displayed rank labels.
//!
//! The rank shown on a field is its position in the scale's pitch order,
//! which differs from its id once bottom fields exist: the bottom pair holds
//! the two lowest notes, so it takes ranks 1 and 2 and the ding moves to 3.

use crate::exceptions::ExceptionTable;
use crate::model::{NoteData, Scale, TemplateKey};

#[derive(Debug, Clone, Copy)]
pub struct LabelMapper<'a> {
    exceptions: &'a ExceptionTable,
}

impl<'a> LabelMapper<'a> {
    pub fn new(exceptions: &'a ExceptionTable) -> Self {
        LabelMapper { exceptions }
    }

    /// Label text for a field. An empty string means draw no label.
    pub fn display_label(&self, note: &NoteData, template: TemplateKey, scale: Option<&Scale>) -> String {
        if let Some(text) = scale
            .and_then(|s| self.exceptions.get(&s.id))
            .and_then(|e| e.label_for(note, template))
        {
            return text.to_string();
        }
        generic_label(note, template).unwrap_or_else(|| note.label.clone())
    }
}

fn generic_label(note: &NoteData, template: TemplateKey) -> Option<String> {
    let id = note.id;
    let top_span = match template {
        TemplateKey::Notes11 => 1..=8,
        TemplateKey::Notes12N | TemplateKey::Notes14N | TemplateKey::Notes14M => 1..=9,
        _ => return None,
    };
    let has_upper_pair = template != TemplateKey::Notes11;
    match id {
        10 => Some("1".to_string()),
        11 => Some("2".to_string()),
        0 => Some("3".to_string()),
        12 | 13 if has_upper_pair => Some((id + 1).to_string()),
        _ if top_span.contains(&id) => Some((id + 3).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabelOverrides, Position};
    use pretty_assertions::assert_eq;

    fn note(id: u32, label: &str) -> NoteData {
        NoteData {
            id,
            label: label.to_string(),
            position: Position::Top,
            cx: 0.0,
            cy: 0.0,
            scale: 100.0,
            rotate: 0.0,
            overrides: LabelOverrides::default(),
        }
    }

    fn labels(template: TemplateKey, scale: Option<&Scale>, ids: &[u32]) -> Vec<String> {
        let table = ExceptionTable::builtin();
        let mapper = LabelMapper::new(&table);
        ids.iter()
            .map(|&id| mapper.display_label(&note(id, &format!("f{id}")), template, scale))
            .collect()
    }

    #[test]
    fn twelve_n_family_ranks() {
        assert_eq!(
            labels(TemplateKey::Notes12N, None, &[10, 11, 0, 1, 5, 9]),
            vec!["1", "2", "3", "4", "8", "12"]
        );
        assert_eq!(labels(TemplateKey::Notes14M, None, &[12, 13]), vec!["13", "14"]);
    }

    #[test]
    fn eleven_family_ranks() {
        assert_eq!(
            labels(TemplateKey::Notes11, None, &[10, 11, 0, 8, 9]),
            vec!["1", "2", "3", "11", "f9"]
        );
    }

    #[test]
    fn plain_templates_use_fallback_label() {
        assert_eq!(labels(TemplateKey::Notes9, None, &[0, 4]), vec!["f0", "f4"]);
        assert_eq!(labels(TemplateKey::Notes18, None, &[16]), vec!["f16"]);
    }

    #[test]
    fn exception_overrides_and_suppression() {
        let deepasia = Scale::new("cs_deepasia_14", "C#3", &[], &[]);
        assert_eq!(
            labels(TemplateKey::Notes14N, Some(&deepasia), &[0, 12, 13, 6]),
            vec!["1", "7", "", "9"]
        );
        // Out-of-scope template falls back to generic rules.
        assert_eq!(labels(TemplateKey::Notes9, Some(&deepasia), &[0]), vec!["f0"]);
    }
}
