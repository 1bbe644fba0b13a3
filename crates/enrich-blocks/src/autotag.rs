//! Turns a tagging response into a reconciliation plan and reports what
//! was applied.

use rand::Rng;
use tracing::{debug, warn};

use enrich_core::{
    Label, ReconcileLimits, ReconciliationInput, ReconciliationPlan, SuggestionOutcome, reconcile,
};

use crate::host::ArticleRecord;

pub const NOTHING_APPLIED_MESSAGE: &str = "No labels or tags could be applied to the article.";
pub const NO_SUGGESTIONS_MESSAGE: &str = "Failed to generate labels and tags.";

/// Labels and tags written to an article by one auto-tag request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedTags {
    /// Attached labels with their host ids, reused ones included.
    pub labels: Vec<Label>,
    /// Tags that were not on the article before.
    pub tags: Vec<String>,
    /// The model answered in free text and the result is a best guess.
    pub fallback: bool,
}

impl AppliedTags {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.tags.is_empty()
    }

    /// `Successfully applied 2 label(s): a, b and 1 tag(s): c`.
    pub fn message(&self) -> String {
        if self.is_empty() {
            return NOTHING_APPLIED_MESSAGE.to_string();
        }
        let mut parts = Vec::with_capacity(2);
        if !self.labels.is_empty() {
            let captions: Vec<&str> = self.labels.iter().map(|l| l.caption.as_str()).collect();
            parts.push(format!(
                "{} label(s): {}",
                self.labels.len(),
                captions.join(", ")
            ));
        }
        if !self.tags.is_empty() {
            parts.push(format!("{} tag(s): {}", self.tags.len(), self.tags.join(", ")));
        }
        format!("Successfully applied {}", parts.join(" and "))
    }
}

/// Builds the reconciler input for `article` from a parsed response.
///
/// Free-text candidates are treated as label captions. Returns `None` when
/// the response held nothing usable.
pub fn reconciliation_input(
    outcome: &SuggestionOutcome,
    article: &ArticleRecord,
) -> Option<ReconciliationInput> {
    let (candidate_labels, candidate_tags) = match outcome {
        SuggestionOutcome::Structured { labels, tags } => (labels.clone(), tags.clone()),
        SuggestionOutcome::FreeTextFallback { candidates } => {
            warn!(
                event = "autotag.free_text_candidates",
                domain = "autotag",
                count = candidates.len() as u64,
                "applying comma separated candidates as labels"
            );
            (candidates.clone(), Vec::new())
        }
        SuggestionOutcome::Unparseable => return None,
    };
    if candidate_labels.is_empty() && candidate_tags.is_empty() {
        return None;
    }
    Some(ReconciliationInput {
        existing_tags: article.tags.clone(),
        existing_labels: article.owner_labels.clone(),
        candidate_tags,
        candidate_labels,
    })
}

/// Parsed response plus article metadata to a plan, or `None` if the model
/// suggested nothing.
pub fn plan_for_article<R: Rng + ?Sized>(
    outcome: &SuggestionOutcome,
    article: &ArticleRecord,
    max_tags: usize,
    rng: &mut R,
) -> Option<ReconciliationPlan> {
    let input = reconciliation_input(outcome, article)?;
    let plan = reconcile(
        &input,
        &ReconcileLimits {
            max_candidates: max_tags,
        },
        rng,
    );
    debug!(
        event = "autotag.planned",
        domain = "autotag",
        tags_to_add = plan.tags_to_add.len() as u64,
        labels = plan.labels.len() as u64,
        labels_to_create = plan.labels_to_create().count() as u64
    );
    Some(plan)
}
