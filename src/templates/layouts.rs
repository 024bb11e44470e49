//! Literal default layouts, in design-space units.

/// One default tone field. `None` anchors resolve automatically.
#[derive(Debug, Clone, Copy)]
pub(super) struct FieldDefault {
    pub id: u32,
    pub label: &'static str,
    pub cx: f64,
    pub cy: f64,
    pub scale: f64,
    pub rotate: f64,
    pub label_x: Option<f64>,
    pub label_y: Option<f64>,
}

const fn field(
    id: u32,
    label: &'static str,
    cx: f64,
    cy: f64,
    scale: f64,
    rotate: f64,
    label_x: Option<f64>,
    label_y: Option<f64>,
) -> FieldDefault {
    FieldDefault { id, label, cx, cy, scale, rotate, label_x, label_y }
}

// ── Shared values ───────────────────────────────────────────────────
pub(super) const DEFAULT_LABEL_OFFSET: f64 = 25.0;
pub(super) const DEFAULT_SYMBOL_OFFSET: f64 = 15.0;

// Ding markers: RS pinned in x, LS pinned in x, H pinned in y.
pub(super) const DING_SYMBOL_X: f64 = 945.0;
pub(super) const DING_SYMBOL_LEFT_X: f64 = 59.0;
pub(super) const DING_SYMBOL_BOTTOM_Y: f64 = 665.0;

// ── 9 notes: ding + 8 top ───────────────────────────────────────────
pub(super) const NINE: &[FieldDefault] = &[
    field(0, "D", 500.0, 500.0, 389.7, 90.0, None, Some(514.0)),
    field(1, "1", 661.0, 779.0, 286.0, 121.0, None, Some(886.0)),
    field(2, "2", 335.0, 776.0, 285.0, 61.0, None, Some(884.0)),
    field(3, "3", 813.0, 595.0, 253.0, 128.0, None, Some(697.0)),
    field(4, "4", 195.0, 594.0, 249.0, 47.0, None, Some(699.0)),
    field(5, "5", 808.0, 358.0, 237.0, 55.0, None, Some(453.0)),
    field(6, "6", 204.0, 366.0, 238.0, 125.0, None, Some(458.0)),
    field(7, "7", 630.0, 201.0, 226.0, 48.0, None, Some(295.0)),
    field(8, "8", 363.0, 200.0, 232.0, 133.0, None, Some(295.0)),
];

// ── 10 notes: 7/8 spread apart, 9 added at the top ──────────────────
pub(super) const TEN: &[FieldDefault] = &[
    field(0, "D", 500.0, 500.0, 389.7, 90.0, None, Some(514.0)),
    field(1, "1", 661.0, 779.0, 286.0, 121.0, None, Some(886.0)),
    field(2, "2", 335.0, 776.0, 285.0, 61.0, None, Some(884.0)),
    field(3, "3", 813.0, 595.0, 253.0, 128.0, None, Some(697.0)),
    field(4, "4", 195.0, 594.0, 249.0, 47.0, None, Some(699.0)),
    field(5, "5", 808.0, 358.0, 237.0, 55.0, None, Some(453.0)),
    field(6, "6", 204.0, 366.0, 238.0, 125.0, None, Some(458.0)),
    field(7, "7", 688.0, 201.0, 226.0, 48.0, None, Some(295.0)),
    field(8, "8", 321.0, 203.0, 232.0, 133.0, None, Some(295.0)),
    field(9, "9", 501.0, 143.0, 200.0, 0.0, None, None),
];

// ── Bottom pair, outside the shell on the left and right ────────────
pub(super) const BOTTOM_LEFT: FieldDefault =
    field(10, "1", -118.0, 608.0, 300.0, 164.0, Some(-98.0), Some(750.0));
pub(super) const BOTTOM_RIGHT: FieldDefault =
    field(11, "2", 1118.0, 608.0, 300.0, 19.0, Some(1084.0), Some(750.0));

// ── 11 notes: 9-note shell + bottom pair ────────────────────────────
pub(super) const ELEVEN: &[FieldDefault] = &[
    field(0, "3", 500.0, 500.0, 389.7, 90.0, None, Some(514.0)),
    field(1, "4", 661.0, 779.0, 286.0, 121.0, None, Some(886.0)),
    field(2, "5", 335.0, 776.0, 285.0, 61.0, None, Some(884.0)),
    field(3, "6", 813.0, 595.0, 253.0, 128.0, None, Some(697.0)),
    field(4, "7", 195.0, 594.0, 249.0, 47.0, None, Some(699.0)),
    field(5, "8", 808.0, 358.0, 237.0, 55.0, None, Some(453.0)),
    field(6, "9", 204.0, 366.0, 238.0, 125.0, None, Some(458.0)),
    field(7, "10", 630.0, 201.0, 226.0, 48.0, None, Some(295.0)),
    field(8, "11", 363.0, 200.0, 232.0, 133.0, None, Some(295.0)),
    BOTTOM_LEFT,
    BOTTOM_RIGHT,
];

// ── 12 notes (N): 10-note shell + bottom pair ───────────────────────
pub(super) const TWELVE_N: &[FieldDefault] = &[
    field(0, "3", 500.0, 500.0, 389.7, 90.0, None, Some(514.0)),
    field(1, "1", 661.0, 779.0, 286.0, 121.0, None, Some(886.0)),
    field(2, "2", 335.0, 776.0, 285.0, 61.0, None, Some(884.0)),
    field(3, "3", 813.0, 595.0, 253.0, 128.0, None, Some(697.0)),
    field(4, "4", 195.0, 594.0, 249.0, 47.0, None, Some(699.0)),
    field(5, "5", 808.0, 358.0, 237.0, 55.0, None, Some(453.0)),
    field(6, "6", 204.0, 366.0, 238.0, 125.0, None, Some(458.0)),
    field(7, "7", 688.0, 201.0, 226.0, 48.0, None, Some(295.0)),
    field(8, "8", 321.0, 203.0, 232.0, 133.0, None, Some(295.0)),
    field(9, "9", 501.0, 143.0, 200.0, 0.0, None, None),
    BOTTOM_LEFT,
    BOTTOM_RIGHT,
];

// ── 14 notes: 12N plus two more fields ──────────────────────────────
pub(super) const FOURTEEN_N_EXTRA: &[FieldDefault] = &[
    field(12, "13", 420.0, -96.0, 180.0, 251.0, None, Some(-29.0)),
    field(13, "14", 609.0, -90.0, 146.0, 290.0, None, Some(-20.0)),
];

pub(super) const FOURTEEN_M_EXTRA: &[FieldDefault] = &[
    field(12, "13", 500.0, 500.0, 200.0, 0.0, None, None),
    field(13, "14", 500.0, 500.0, 200.0, 0.0, None, None),
];

/// E Equinox 14 places its extra pair above the shell instead.
pub(super) const E_EQUINOX_14_EXTRA: &[FieldDefault] = &[
    field(12, "13", 420.0, 120.0, 180.0, 340.0, None, None),
    field(13, "14", 580.0, 120.0, 180.0, 20.0, None, None),
];
