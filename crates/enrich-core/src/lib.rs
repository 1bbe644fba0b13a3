//! Domain logic shared by the enrichment pipeline: article text
//! preparation, the label color palette, tag/label reconciliation and the
//! parsing of model suggestions.

/// Label palette, label records and reconciliation against existing metadata.
pub mod labels;
/// Process-wide tracing setup.
pub mod observability;
/// Parsing of model responses into tag/label candidates.
pub mod suggestion;
/// Markup stripping, whitespace cleanup and prompt-size truncation.
pub mod text;

pub use labels::{
    ColorPair, HexColor, Label, LabelId, LabelResolution, ReconcileLimits, ReconciliationInput,
    ReconciliationPlan, reconcile, resolve_label,
};
pub use observability::init_observability;
pub use suggestion::{SuggestionOutcome, parse_suggestions};
pub use text::{TRUNCATION_SEPARATOR, TruncationPolicy, char_len, normalize, truncate};
