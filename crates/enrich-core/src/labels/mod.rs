mod palette;
mod reconcile;

pub use palette::{
    ColorPair, ColorParseError, FALLBACK_COLOR, HexColor, foreground_for, palette,
    pick_color_pair,
};
pub use reconcile::{
    Label, LabelId, LabelResolution, MAX_CANDIDATE_CHARS, ReconcileLimits, ReconciliationInput,
    ReconciliationPlan, clean_candidates, reconcile, resolve_label,
};
