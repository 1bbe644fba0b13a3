//! Host collaborator contract and an in-memory reference host.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use enrich_core::{ColorPair, Label, LabelId, TruncationPolicy};
use enrich_harness::{ProviderKind, RunOptions};

/// Identifies one article of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub owner_uid: i64,
    pub article_id: i64,
}

impl EntityRef {
    pub const fn new(owner_uid: i64, article_id: i64) -> Self {
        Self {
            owner_uid,
            article_id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_uid, self.article_id)
    }
}

/// What a request is for; selects prompt and truncation defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Summary,
    Tagging,
}

/// An article as loaded from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    /// Raw (usually HTML) content.
    pub content: String,
    pub tags: Vec<String>,
    /// Every label the owner has, used for lookup-or-create.
    pub owner_labels: Vec<Label>,
}

pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";
pub const DEFAULT_SUMMARY_PROMPT: &str = "Please provide a concise TL;DR summary of the following article in 1-2 sentences. Focus on the main points and key takeaways.";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_prompt_template() -> String {
    DEFAULT_SUMMARY_PROMPT.to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_max_tags() -> usize {
    5
}

fn default_label_language() -> String {
    "English".to_string()
}

fn default_min_article_length() -> usize {
    200
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    60
}

/// Settings for one model request, supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestParameters {
    #[serde(default)]
    pub provider_kind: ProviderKind,
    /// Full endpoint URL. Empty means the provider's default.
    #[serde(default)]
    pub endpoint_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
    #[serde(default)]
    pub truncation_policy: TruncationPolicy,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
    #[serde(default = "default_label_language")]
    pub label_language: String,
    /// Minimum normalized content length in characters; `0` disables.
    #[serde(default = "default_min_article_length")]
    pub min_article_length: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RequestParameters {
    fn default() -> Self {
        Self::summary()
    }
}

impl RequestParameters {
    pub fn summary() -> Self {
        Self {
            provider_kind: ProviderKind::OpenAi,
            endpoint_url: String::new(),
            api_key: String::new(),
            model: default_model(),
            prompt_template: default_prompt_template(),
            truncation_policy: TruncationPolicy::summary(),
            max_tokens: default_max_tokens(),
            temperature: None,
            max_tags: default_max_tags(),
            label_language: default_label_language(),
            min_article_length: default_min_article_length(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn tagging() -> Self {
        Self {
            truncation_policy: TruncationPolicy::tagging(),
            min_article_length: 50,
            ..Self::summary()
        }
    }

    pub fn for_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Summary => Self::summary(),
            RequestKind::Tagging => Self::tagging(),
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions::from_secs(self.connect_timeout_secs, self.timeout_secs)
    }
}

/// Errors reported by a host collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("article not found: {0}")]
    NotFound(EntityRef),
    #[error("host configuration error: {0}")]
    Config(String),
    #[error("host storage error: {0}")]
    Storage(String),
}

/// Persistence and settings owned by the embedding application.
#[async_trait::async_trait]
pub trait HostStore: Send + Sync {
    async fn fetch_request_parameters(
        &self,
        entity: &EntityRef,
        kind: RequestKind,
    ) -> Result<RequestParameters, HostError>;

    async fn load_article(&self, entity: &EntityRef) -> Result<ArticleRecord, HostError>;

    /// Replaces the article's tag list with `tags` in one write.
    async fn persist_tags(&self, entity: &EntityRef, tags: &[String]) -> Result<(), HostError>;

    /// Creates labels without an id and attaches every label to the
    /// article. Returns the labels with their host ids.
    async fn persist_labels(
        &self,
        entity: &EntityRef,
        labels: &[Label],
    ) -> Result<Vec<Label>, HostError>;
}

#[derive(Debug, Clone, Default)]
struct StoredArticle {
    title: String,
    content: String,
    tags: Vec<String>,
    labels: Vec<LabelId>,
}

/// In-memory [`HostStore`] for tests and demos.
#[derive(Default)]
pub struct MemoryHost {
    articles: DashMap<EntityRef, StoredArticle>,
    labels: DashMap<i64, Vec<Label>>,
    parameters: DashMap<RequestKind, RequestParameters>,
    next_label_id: AtomicI64,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_article(
        &self,
        entity: EntityRef,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) {
        self.articles.insert(
            entity,
            StoredArticle {
                title: title.into(),
                content: content.into(),
                tags,
                labels: Vec::new(),
            },
        );
    }

    pub fn set_parameters(&self, kind: RequestKind, parameters: RequestParameters) {
        self.parameters.insert(kind, parameters);
    }

    /// Creates a label for `owner_uid`, or returns the existing one with the
    /// same caption.
    pub fn add_label(&self, owner_uid: i64, caption: &str, colors: ColorPair) -> Label {
        let mut owned = self.labels.entry(owner_uid).or_default();
        if let Some(existing) = owned.iter().find(|label| label.matches_caption(caption)) {
            return existing.clone();
        }
        let label = Label::new(caption.trim(), colors).with_id(self.allocate_label_id());
        owned.push(label.clone());
        label
    }

    pub fn tags(&self, entity: &EntityRef) -> Option<Vec<String>> {
        self.articles.get(entity).map(|article| article.tags.clone())
    }

    pub fn owner_labels(&self, owner_uid: i64) -> Vec<Label> {
        self.labels
            .get(&owner_uid)
            .map(|labels| labels.clone())
            .unwrap_or_default()
    }

    /// Labels attached to the article, in attachment order.
    pub fn article_labels(&self, entity: &EntityRef) -> Vec<Label> {
        let Some(ids) = self.articles.get(entity).map(|article| article.labels.clone()) else {
            return Vec::new();
        };
        let owned = self.owner_labels(entity.owner_uid);
        ids.iter()
            .filter_map(|id| owned.iter().find(|label| label.id == Some(*id)).cloned())
            .collect()
    }

    fn allocate_label_id(&self) -> LabelId {
        LabelId(self.next_label_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait::async_trait]
impl HostStore for MemoryHost {
    async fn fetch_request_parameters(
        &self,
        _entity: &EntityRef,
        kind: RequestKind,
    ) -> Result<RequestParameters, HostError> {
        Ok(self
            .parameters
            .get(&kind)
            .map(|params| params.clone())
            .unwrap_or_else(|| RequestParameters::for_kind(kind)))
    }

    async fn load_article(&self, entity: &EntityRef) -> Result<ArticleRecord, HostError> {
        let article = self
            .articles
            .get(entity)
            .map(|article| article.clone())
            .ok_or(HostError::NotFound(*entity))?;
        Ok(ArticleRecord {
            title: article.title,
            content: article.content,
            tags: article.tags,
            owner_labels: self.owner_labels(entity.owner_uid),
        })
    }

    async fn persist_tags(&self, entity: &EntityRef, tags: &[String]) -> Result<(), HostError> {
        let mut article = self
            .articles
            .get_mut(entity)
            .ok_or(HostError::NotFound(*entity))?;
        article.tags = tags.to_vec();
        debug!(event = "host.tags_persisted", domain = "host", entity = %entity, count = tags.len() as u64);
        Ok(())
    }

    async fn persist_labels(
        &self,
        entity: &EntityRef,
        labels: &[Label],
    ) -> Result<Vec<Label>, HostError> {
        if !self.articles.contains_key(entity) {
            return Err(HostError::NotFound(*entity));
        }
        let mut persisted = Vec::with_capacity(labels.len());
        for label in labels {
            let stored = match label.id {
                Some(_) => label.clone(),
                None => self.add_label(entity.owner_uid, &label.caption, label.colors()),
            };
            persisted.push(stored);
        }

        let mut article = self
            .articles
            .get_mut(entity)
            .ok_or(HostError::NotFound(*entity))?;
        for label in &persisted {
            if let Some(id) = label.id
                && !article.labels.contains(&id)
            {
                article.labels.push(id);
            }
        }
        debug!(event = "host.labels_persisted", domain = "host", entity = %entity, count = persisted.len() as u64);
        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrich_core::HexColor;

    fn colors() -> ColorPair {
        ColorPair::for_background(HexColor::new(0x33, 0x66, 0x99))
    }

    #[test]
    fn parameters_deserialize_with_defaults() {
        let params: RequestParameters =
            serde_json::from_str(r#"{"provider_kind":"ollama","model":"llama3"}"#).expect("params");
        assert_eq!(params.provider_kind, ProviderKind::Ollama);
        assert_eq!(params.model, "llama3");
        assert_eq!(params.max_tokens, 150);
        assert_eq!(params.truncation_policy, TruncationPolicy::summary());
        assert_eq!(params.run_options(), RunOptions::default());
    }

    #[test]
    fn tagging_defaults_differ_from_summary() {
        let tagging = RequestParameters::for_kind(RequestKind::Tagging);
        assert_eq!(tagging.truncation_policy, TruncationPolicy::tagging());
        assert_eq!(tagging.min_article_length, 50);
    }

    #[tokio::test]
    async fn memory_host_round_trips_tags_and_labels() {
        let host = MemoryHost::new();
        let entity = EntityRef::new(1, 10);
        host.insert_article(entity, "Title", "<p>Body</p>", vec!["ai".into()]);
        let science = host.add_label(1, "Science", colors());

        host.persist_tags(&entity, &[String::from("ai"), String::from("policy")])
            .await
            .expect("tags");
        assert_eq!(host.tags(&entity), Some(vec!["ai".into(), "policy".into()]));

        let persisted = host
            .persist_labels(&entity, &[science.clone(), Label::new("World", colors())])
            .await
            .expect("labels");
        assert_eq!(persisted[0], science);
        assert!(persisted[1].id.is_some());
        assert_eq!(host.article_labels(&entity), persisted);

        let record = host.load_article(&entity).await.expect("article");
        assert_eq!(record.owner_labels.len(), 2);
    }

    #[tokio::test]
    async fn add_label_reuses_caption_case_insensitively() {
        let host = MemoryHost::new();
        let first = host.add_label(3, "Tech", colors());
        let second = host.add_label(3, " tech ", ColorPair::for_background(HexColor::WHITE));
        assert_eq!(first, second);
        assert_eq!(host.owner_labels(3).len(), 1);
    }

    #[tokio::test]
    async fn missing_article_is_not_found() {
        let host = MemoryHost::new();
        let entity = EntityRef::new(1, 99);
        assert_eq!(
            host.load_article(&entity).await,
            Err(HostError::NotFound(entity))
        );
        assert!(host.persist_tags(&entity, &[]).await.is_err());
    }
}
