//! Merges model-suggested tags and labels into an article's existing
//! metadata without introducing case-insensitive duplicates.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::palette::{ColorPair, HexColor, pick_color_pair};

/// Candidates longer than this many characters are discarded.
pub const MAX_CANDIDATE_CHARS: usize = 100;

/// Host-assigned label identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub i64);

/// A colored category marker owned by a user.
///
/// `id` is `None` until the host has persisted the label. Colors are fixed
/// when the label is created and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: Option<LabelId>,
    pub caption: String,
    pub fg_color: HexColor,
    pub bg_color: HexColor,
}

impl Label {
    pub fn new(caption: impl Into<String>, colors: ColorPair) -> Self {
        Self {
            id: None,
            caption: caption.into(),
            fg_color: colors.fg,
            bg_color: colors.bg,
        }
    }

    pub fn with_id(mut self, id: LabelId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn colors(&self) -> ColorPair {
        ColorPair {
            fg: self.fg_color,
            bg: self.bg_color,
        }
    }

    /// Case-insensitive caption comparison, ignoring surrounding whitespace.
    pub fn matches_caption(&self, caption: &str) -> bool {
        fold(&self.caption) == fold(caption)
    }
}

/// Existing metadata of one article plus the model's suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationInput {
    pub existing_tags: Vec<String>,
    /// Every label the owner already has, not only those on the article.
    pub existing_labels: Vec<Label>,
    pub candidate_tags: Vec<String>,
    pub candidate_labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileLimits {
    /// Maximum number of candidates considered per list, applied before
    /// any filtering so the first suggestions win.
    pub max_candidates: usize,
}

impl Default for ReconcileLimits {
    fn default() -> Self {
        Self { max_candidates: 5 }
    }
}

/// Outcome of looking a caption up among existing labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelResolution {
    /// An existing label with the same caption; identity and colors unchanged.
    Reused(Label),
    /// A new label with freshly assigned colors, to be created by the host.
    Created(Label),
}

impl LabelResolution {
    pub fn label(&self) -> &Label {
        match self {
            Self::Reused(label) | Self::Created(label) => label,
        }
    }

    pub fn into_label(self) -> Label {
        match self {
            Self::Reused(label) | Self::Created(label) => label,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Changes to apply to an article, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub tags_to_add: Vec<String>,
    pub labels: Vec<LabelResolution>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.tags_to_add.is_empty() && self.labels.is_empty()
    }

    /// Labels the host still has to create.
    pub fn labels_to_create(&self) -> impl Iterator<Item = &Label> {
        self.labels
            .iter()
            .filter(|resolution| resolution.is_new())
            .map(LabelResolution::label)
    }

    /// Full replacement tag list: existing tags first, then the new ones.
    pub fn merged_tags(&self, existing: &[String]) -> Vec<String> {
        existing
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .chain(self.tags_to_add.iter().cloned())
            .collect()
    }
}

/// Applies the candidate pipeline: trim, drop blanks and over-long entries,
/// then keep the first `max_candidates`. Deduplication happens later, on the
/// capped list, so duplicates still count against the cap.
pub fn clean_candidates(candidates: &[String], max_candidates: usize) -> Vec<String> {
    candidates
        .iter()
        .map(|candidate| candidate.trim())
        .filter(|candidate| !candidate.is_empty())
        .filter(|candidate| candidate.chars().count() <= MAX_CANDIDATE_CHARS)
        .take(max_candidates)
        .map(str::to_string)
        .collect()
}

/// Finds a label by caption or creates a new one with a palette color pair.
///
/// Resolving a caption that already exists always returns the stored label,
/// so repeated lookups yield the same identity and colors.
pub fn resolve_label<R: Rng + ?Sized>(
    caption: &str,
    existing: &[Label],
    rng: &mut R,
) -> LabelResolution {
    let caption = caption.trim();
    match existing.iter().find(|label| label.matches_caption(caption)) {
        Some(label) => LabelResolution::Reused(label.clone()),
        None => LabelResolution::Created(Label::new(caption, pick_color_pair(rng))),
    }
}

/// Computes the tags and labels to apply for one article.
pub fn reconcile<R: Rng + ?Sized>(
    input: &ReconciliationInput,
    limits: &ReconcileLimits,
    rng: &mut R,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    let mut seen_tags: Vec<String> = input
        .existing_tags
        .iter()
        .map(String::as_str)
        .map(fold)
        .collect();
    for tag in clean_candidates(&input.candidate_tags, limits.max_candidates) {
        let key = fold(&tag);
        if seen_tags.contains(&key) {
            debug!(event = "reconcile.tag_duplicate", domain = "labels", tag = %tag);
            continue;
        }
        seen_tags.push(key);
        plan.tags_to_add.push(tag);
    }

    let mut known = input.existing_labels.clone();
    let mut resolved: Vec<String> = Vec::new();
    for caption in clean_candidates(&input.candidate_labels, limits.max_candidates) {
        let key = fold(&caption);
        if resolved.contains(&key) {
            continue;
        }
        resolved.push(key);
        let resolution = resolve_label(&caption, &known, rng);
        if let LabelResolution::Created(label) = &resolution {
            debug!(
                event = "reconcile.label_created",
                domain = "labels",
                caption = %label.caption,
                bg = %label.bg_color,
                fg = %label.fg_color
            );
            known.push(label.clone());
        }
        plan.labels.push(resolution);
    }

    plan
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}
