//! Engine configuration and fixed design constants.

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ── Design space ────────────────────────────────────────────────────
/// Side length of the square design space all coordinates live in.
pub const DESIGN_SIZE: f64 = 1000.0;

// ── Tone-field shape ────────────────────────────────────────────────
pub const TONEFIELD_RATIO_X: f64 = 0.3; // rx = scale * ratio
pub const TONEFIELD_RATIO_Y: f64 = 0.425; // ry = scale * ratio

// ── Storage namespaces ──────────────────────────────────────────────
pub const TONE_FIELD_KEY_PREFIX: &str = "tonefield_calibration_";
pub const LABEL_KEY_PREFIX: &str = "label_calibration_";
pub const SCALE_KEY_PREFIX: &str = "scale_";

/// Scale whose stored layout seeds the extended templates when they have
/// nothing saved of their own.
pub const INHERITANCE_SOURCE_SCALE: &str = "fs_low_pygmy_14_mutant";

/// Tunable defaults used while resolving anchors and storage keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Prefix prepended to both storage namespaces (e.g. `"minidigipan_"`).
    pub key_namespace: String,
    /// Gap between a field's lowest point and its label baseline.
    pub default_label_offset: f64,
    /// Inset of the ding's RS / LS / H markers from its edge.
    pub default_symbol_offset: f64,
    pub ding_pitch_text_size: f64,
    pub pitch_text_size: f64,
    /// Text shown instead of pitches when a scale cannot be laid out.
    pub not_implemented_text: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_namespace: String::new(),
            default_label_offset: 25.0,
            default_symbol_offset: 15.0,
            ding_pitch_text_size: 37.0,
            pitch_text_size: 30.0,
            not_implemented_text: "Not implemented".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{"keyNamespace":"minidigipan_"}"#).unwrap();
        assert_eq!(cfg.key_namespace, "minidigipan_");
        assert_eq!(cfg.default_label_offset, 25.0);
        assert_eq!(cfg.not_implemented_text, "Not implemented");
    }
}
