//! Anchor points for everything drawn around a tone field: its rank label,
//! the ding's side markers and the pitch text.

use serde::Serialize;

use crate::config::{EngineConfig, DESIGN_SIZE};
use crate::exceptions::ExceptionTable;
use crate::geometry::{ellipse_bottom_point, FieldTransform, Point};
use crate::labels::LabelMapper;
use crate::model::{NoteData, Position, Scale, TemplateKey};
use crate::pitch::{PitchAssignment, PitchResolver};

/// Marker drawn around the ding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolKind {
    /// Right side.
    RS,
    /// Left side.
    LS,
    /// Bottom.
    H,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolAnchor {
    pub kind: SymbolKind,
    pub at: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAnchor {
    pub text: String,
    pub at: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchTextAnchor {
    pub text: String,
    pub at: Point,
    pub size: f64,
    pub rotate: f64,
}

/// Everything a renderer needs to draw one tone field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNote {
    pub id: u32,
    pub position: Position,
    pub rx: f64,
    pub ry: f64,
    pub transform: FieldTransform,
    /// `None` when the label is suppressed.
    pub label: Option<TextAnchor>,
    pub pitch: Option<PitchTextAnchor>,
    pub symbols: Vec<SymbolAnchor>,
}

/// Label anchor: explicit coordinates win, otherwise just below the lowest
/// point of the rotated field.
pub fn label_anchor(note: &NoteData, config: &EngineConfig) -> Point {
    let o = &note.overrides;
    if let (Some(x), Some(y)) = (o.label_x.value(), o.label_y.value()) {
        return Point::new(*x, *y);
    }
    let bottom = ellipse_bottom_point(note.cx, note.cy, note.rx(), note.ry(), note.rotate);
    let offset = o.label_offset.value_or(config.default_label_offset);
    Point::new(
        o.label_x.value_or(bottom.x),
        o.label_y.value_or(bottom.y + offset),
    )
}

/// RS / LS / H markers, ding only.
pub fn symbol_anchors(note: &NoteData, config: &EngineConfig) -> Vec<SymbolAnchor> {
    if !note.is_ding() {
        return Vec::new();
    }
    let o = &note.overrides;
    let (rx, ry) = (note.rx(), note.ry());
    let rs_off = o.symbol_offset.value_or(config.default_symbol_offset);
    let ls_off = o.symbol_left_offset.value_or(config.default_symbol_offset);
    let h_off = o.symbol_bottom_offset.value_or(config.default_symbol_offset);
    vec![
        SymbolAnchor {
            kind: SymbolKind::RS,
            at: Point::new(
                o.symbol_x.value_or(note.cx + rx - rs_off),
                o.symbol_y.value_or(note.cy),
            ),
        },
        SymbolAnchor {
            kind: SymbolKind::LS,
            at: Point::new(
                o.symbol_left_x.value_or(note.cx - rx + ls_off),
                o.symbol_left_y.value_or(note.cy),
            ),
        },
        SymbolAnchor {
            kind: SymbolKind::H,
            at: Point::new(
                o.symbol_bottom_x.value_or(note.cx),
                o.symbol_bottom_y.value_or(note.cy + ry - h_off),
            ),
        },
    ]
}

/// Position, size and rotation of the pitch text.
pub fn pitch_text_placement(note: &NoteData, config: &EngineConfig) -> (Point, f64, f64) {
    let o = &note.overrides;
    let default_size = if note.is_ding() {
        config.ding_pitch_text_size
    } else {
        config.pitch_text_size
    };
    (
        Point::new(o.pitch_text_x.value_or(note.cx), o.pitch_text_y.value_or(note.cy)),
        o.pitch_text_scale.value_or(default_size),
        o.pitch_text_rotate.value_or(0.0),
    )
}

/// Assemble the render model for one note.
pub fn render_note(
    note: &NoteData,
    label: &str,
    pitch: Option<&str>,
    config: &EngineConfig,
) -> RenderedNote {
    let label = (!label.is_empty()).then(|| TextAnchor {
        text: label.to_string(),
        at: label_anchor(note, config),
    });
    let pitch = pitch.map(|text| {
        let (at, size, rotate) = pitch_text_placement(note, config);
        PitchTextAnchor { text: text.to_string(), at, size, rotate }
    });
    RenderedNote {
        id: note.id,
        position: note.position,
        rx: note.rx(),
        ry: note.ry(),
        transform: FieldTransform::new(note.cx, note.cy, note.rotate, 1.0),
        label,
        pitch,
        symbols: symbol_anchors(note, config),
    }
}

/// A fully resolved layout, ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    /// Side of the square view box the coordinates live in.
    pub design_size: f64,
    pub template: TemplateKey,
    pub scale_id: Option<String>,
    /// Set instead of pitch text when the scale has no layout.
    pub placeholder: Option<String>,
    pub notes: Vec<RenderedNote>,
}

pub fn render_layout(
    notes: &[NoteData],
    template: TemplateKey,
    scale: Option<&Scale>,
    exceptions: &ExceptionTable,
    config: &EngineConfig,
) -> RenderModel {
    let pitches = PitchResolver::new(exceptions).resolve(notes, template, scale);
    let labels = LabelMapper::new(exceptions);
    let placeholder = match pitches {
        PitchAssignment::NotImplemented => Some(config.not_implemented_text.clone()),
        PitchAssignment::Pitches(_) => None,
    };
    RenderModel {
        design_size: DESIGN_SIZE,
        template,
        scale_id: scale.map(|s| s.id.clone()),
        placeholder,
        notes: notes
            .iter()
            .map(|n| render_note(n, &labels.display_label(n, template, scale), pitches.get(n.id), config))
            .collect(),
    }
}
