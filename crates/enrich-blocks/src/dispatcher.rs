//! Request dispatch: at most one outstanding request per article and kind.
//!
//! Streaming summaries go through a per-article [`SummaryPresenter`] slot;
//! a submission while that presenter is loading is a no-op. Auto-tagging and
//! whole-response summaries use a separate in-flight set with the same
//! rule. Every failure reaches the caller as one user-visible message.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use enrich_core::{LabelResolution, parse_suggestions};
use enrich_harness::{
    ChatRequest, HarnessError, ProviderAdapter, RunFailure, RunStream, StreamEvent,
    vendors::build_provider,
};

use crate::autotag::{
    AppliedTags, NO_SUGGESTIONS_MESSAGE, NOTHING_APPLIED_MESSAGE, plan_for_article,
};
use crate::host::{ArticleRecord, EntityRef, HostError, HostStore, RequestKind, RequestParameters};
use crate::markdown::{MarkdownToHtml, PulldownMarkdownRenderer, escape_html};
use crate::presenter::{PresenterCaptions, SummaryPresenter};
use crate::prompt::{PreparedText, meets_min_length, prepare_text, summary_request, tagging_request};

pub const CONNECTION_TEST_PROMPT: &str =
    "Hello, this is a test. Please respond with 'API connection successful'.";
pub const CONNECTION_TEST_MAX_TOKENS: u32 = 20;

/// Creates the provider adapter for one request's parameters.
pub trait ProviderFactory: Send + Sync {
    fn provider(&self, params: &RequestParameters)
    -> Result<Arc<dyn ProviderAdapter>, HarnessError>;
}

/// Builds real HTTP adapters from the request parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn provider(
        &self,
        params: &RequestParameters,
    ) -> Result<Arc<dyn ProviderAdapter>, HarnessError> {
        build_provider(
            &params.provider_kind,
            &params.endpoint_url,
            &params.api_key,
            params.run_options(),
        )
    }
}

/// Result of one dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome<T> {
    /// A request of the same kind was already running for the article;
    /// nothing was sent.
    AlreadyInFlight,
    Completed(T),
    Failed { message: String },
}

impl<T> DispatchOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::AlreadyInFlight | Self::Failed { .. } => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            Self::AlreadyInFlight | Self::Completed(_) => None,
        }
    }
}

/// Any failure of a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Harness(#[from] HarnessError),
    #[error(transparent)]
    Run(#[from] RunFailure),
    #[error("article too short for {kind:?} (min {min} chars, found {found})")]
    TooShort {
        kind: RequestKind,
        min: usize,
        found: usize,
    },
    #[error("model returned an empty summary")]
    EmptySummary,
    #[error("model returned no usable suggestions")]
    NoSuggestions,
    #[error("no labels or tags left after reconciliation")]
    NothingApplied,
    /// Labels were attached but the tag write failed.
    #[error("labels applied but tags were not saved: {source}")]
    TagsNotSaved { labels: Vec<String>, source: HostError },
}

impl DispatchError {
    /// Message for display next to the article.
    pub fn user_message(&self) -> String {
        match self {
            Self::Host(HostError::NotFound(_)) => {
                "Article not found or access denied.".to_string()
            }
            Self::Host(HostError::Config(message)) => message.clone(),
            Self::Host(HostError::Storage(_)) => "Request failed".to_string(),
            Self::Harness(err) => err.user_message(),
            Self::Run(failure) => failure.user_message(),
            Self::TooShort {
                kind: RequestKind::Summary,
                min,
                found,
            } => format!(
                "Article content is too short for a summary (min: {min} chars, found: {found} chars)."
            ),
            Self::TooShort {
                kind: RequestKind::Tagging,
                min,
                found,
            } => format!(
                "Article content is too short for auto-tagging (min: {min} chars, found: {found} chars)."
            ),
            Self::EmptySummary => "Failed to generate summary.".to_string(),
            Self::NoSuggestions => NO_SUGGESTIONS_MESSAGE.to_string(),
            Self::NothingApplied => NOTHING_APPLIED_MESSAGE.to_string(),
            Self::TagsNotSaved { labels, .. } => format!(
                "Applied {} label(s): {} but saving tags failed.",
                labels.len(),
                labels.join(", ")
            ),
        }
    }
}

/// Removes its key from the in-flight set when dropped.
struct InFlight<'a> {
    set: &'a DashSet<(EntityRef, RequestKind)>,
    key: (EntityRef, RequestKind),
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

/// Runs enrichment requests against a host and a provider factory.
pub struct RequestDispatcher {
    host: Arc<dyn HostStore>,
    providers: Arc<dyn ProviderFactory>,
    renderer: Arc<dyn MarkdownToHtml>,
    captions: PresenterCaptions,
    presenters: DashMap<EntityRef, Arc<Mutex<SummaryPresenter>>>,
    in_flight: DashSet<(EntityRef, RequestKind)>,
}

impl RequestDispatcher {
    pub fn new(host: Arc<dyn HostStore>, providers: Arc<dyn ProviderFactory>) -> Self {
        Self {
            host,
            providers,
            renderer: Arc::new(PulldownMarkdownRenderer),
            captions: PresenterCaptions::default(),
            presenters: DashMap::new(),
            in_flight: DashSet::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MarkdownToHtml>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_captions(mut self, captions: PresenterCaptions) -> Self {
        self.captions = captions;
        self
    }

    /// The presenter for `entity`, if a summary was ever requested for it.
    pub fn presenter(&self, entity: &EntityRef) -> Option<Arc<Mutex<SummaryPresenter>>> {
        self.presenters.get(entity).map(|slot| Arc::clone(slot.value()))
    }

    /// Drops the presenter for `entity` unless its summary is still loading.
    /// Returns whether a slot was removed.
    ///
    /// Slots are otherwise kept for every article ever summarized, so hosts
    /// call this when an article leaves the view.
    pub fn release(&self, entity: &EntityRef) -> bool {
        let removed = self
            .presenters
            .remove_if(entity, |_, slot| {
                slot.try_lock()
                    .is_ok_and(|presenter| !presenter.state().is_loading())
            })
            .is_some();
        if removed {
            debug!(event = "dispatch.presenter_released", domain = "dispatch", entity = %entity);
        }
        removed
    }

    /// Resets the submit caption of every presenter, as on a header switch.
    pub async fn reset_labels(&self) {
        let slots: Vec<_> = self
            .presenters
            .iter()
            .map(|slot| Arc::clone(slot.value()))
            .collect();
        for slot in slots {
            slot.lock().await.reset_label();
        }
    }

    /// Streams a summary for `entity` into its presenter.
    ///
    /// Returns the full summary text on success. Partial output stays in the
    /// presenter when the stream fails.
    pub async fn summarize(&self, entity: EntityRef) -> DispatchOutcome<String> {
        let slot = self.slot(entity);
        let begun = slot.lock().await.begin();
        if begun.is_err() {
            debug!(event = "dispatch.already_in_flight", domain = "dispatch", entity = %entity, kind = "summary");
            return DispatchOutcome::AlreadyInFlight;
        }
        info!(event = "dispatch.summary_started", domain = "dispatch", entity = %entity);

        match self.stream_summary(entity, &slot).await {
            Ok(text) => {
                info!(
                    event = "dispatch.summary_completed",
                    domain = "dispatch",
                    entity = %entity,
                    len = text.len() as u64
                );
                DispatchOutcome::Completed(text)
            }
            Err(err) => {
                let message = err.user_message();
                warn!(event = "dispatch.summary_failed", domain = "dispatch", entity = %entity, error = %err);
                let mut presenter = slot.lock().await;
                if presenter.state().is_loading() {
                    presenter.fail(message.clone());
                }
                DispatchOutcome::Failed { message }
            }
        }
    }

    /// Asks for a summary without streaming and returns it as a TL;DR block.
    pub async fn summarize_once(&self, entity: EntityRef) -> DispatchOutcome<String> {
        let Some(_guard) = self.claim(entity, RequestKind::Summary) else {
            return DispatchOutcome::AlreadyInFlight;
        };
        match self.whole_summary(entity).await {
            Ok(summary) => DispatchOutcome::Completed(tldr_html(&summary)),
            Err(err) => {
                warn!(event = "dispatch.summary_failed", domain = "dispatch", entity = %entity, error = %err);
                DispatchOutcome::Failed {
                    message: err.user_message(),
                }
            }
        }
    }

    /// Suggests labels and tags for `entity` and writes them to the host.
    pub async fn autotag(&self, entity: EntityRef) -> DispatchOutcome<AppliedTags> {
        let Some(_guard) = self.claim(entity, RequestKind::Tagging) else {
            return DispatchOutcome::AlreadyInFlight;
        };
        info!(event = "dispatch.autotag_started", domain = "dispatch", entity = %entity);
        match self.apply_tags(entity).await {
            Ok(applied) => {
                info!(
                    event = "dispatch.autotag_completed",
                    domain = "dispatch",
                    entity = %entity,
                    labels = applied.labels.len() as u64,
                    tags = applied.tags.len() as u64,
                    fallback = applied.fallback
                );
                DispatchOutcome::Completed(applied)
            }
            Err(err) => {
                warn!(event = "dispatch.autotag_failed", domain = "dispatch", entity = %entity, error = %err);
                DispatchOutcome::Failed {
                    message: err.user_message(),
                }
            }
        }
    }

    /// Sends a tiny request with `params` and returns the model's reply.
    pub async fn test_connection(&self, params: &RequestParameters) -> Result<String, DispatchError> {
        let provider = self.providers.provider(params)?;
        let request = ChatRequest::new(params.model.clone())
            .user(CONNECTION_TEST_PROMPT)
            .max_tokens(CONNECTION_TEST_MAX_TOKENS);
        request.validate()?;
        let reply = provider
            .complete(request)
            .await
            .map_err(HarnessError::from)?;
        info!(
            event = "dispatch.connection_ok",
            domain = "dispatch",
            provider = %params.provider_kind,
            model = %params.model
        );
        Ok(reply)
    }

    fn slot(&self, entity: EntityRef) -> Arc<Mutex<SummaryPresenter>> {
        let slot = self.presenters.entry(entity).or_insert_with(|| {
            Arc::new(Mutex::new(SummaryPresenter::new(
                Arc::clone(&self.renderer),
                self.captions.clone(),
            )))
        });
        Arc::clone(slot.value())
    }

    fn claim(&self, entity: EntityRef, kind: RequestKind) -> Option<InFlight<'_>> {
        let key = (entity, kind);
        if !self.in_flight.insert(key) {
            debug!(event = "dispatch.already_in_flight", domain = "dispatch", entity = %entity, kind = ?kind);
            return None;
        }
        Some(InFlight {
            set: &self.in_flight,
            key,
        })
    }

    async fn prepare(
        &self,
        entity: EntityRef,
        kind: RequestKind,
    ) -> Result<(ArticleRecord, RequestParameters, PreparedText), DispatchError> {
        let params = self.host.fetch_request_parameters(&entity, kind).await?;
        let article = self.host.load_article(&entity).await?;
        let prepared = prepare_text(&article.content, &params);
        if !meets_min_length(&prepared, &params) {
            return Err(DispatchError::TooShort {
                kind,
                min: params.min_article_length,
                found: prepared.normalized_len,
            });
        }
        Ok((article, params, prepared))
    }

    async fn stream_summary(
        &self,
        entity: EntityRef,
        slot: &Mutex<SummaryPresenter>,
    ) -> Result<String, DispatchError> {
        let (article, params, prepared) = self.prepare(entity, RequestKind::Summary).await?;
        let provider = self.providers.provider(&params)?;
        let request = summary_request(&article, &prepared, &params);
        let mut run = RunStream::start(provider.as_ref(), request).await?;

        let result = loop {
            match run.next_event().await {
                Some(StreamEvent::Delta(delta)) => {
                    slot.lock().await.apply_delta(&delta);
                }
                Some(StreamEvent::Finished(result)) => break result,
                None => break run.finish().await,
            }
        };
        slot.lock().await.finish(&result);
        Ok(result.into_result()?)
    }

    async fn whole_summary(&self, entity: EntityRef) -> Result<String, DispatchError> {
        let (article, params, prepared) = self.prepare(entity, RequestKind::Summary).await?;
        let provider = self.providers.provider(&params)?;
        let request = summary_request(&article, &prepared, &params);
        request.validate()?;
        let summary = provider
            .complete(request)
            .await
            .map_err(HarnessError::from)?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(DispatchError::EmptySummary);
        }
        Ok(summary.to_string())
    }

    async fn apply_tags(&self, entity: EntityRef) -> Result<AppliedTags, DispatchError> {
        let (article, params, prepared) = self.prepare(entity, RequestKind::Tagging).await?;
        let provider = self.providers.provider(&params)?;
        let request = tagging_request(&article, &prepared, &params);
        request.validate()?;
        let content = provider
            .complete(request)
            .await
            .map_err(HarnessError::from)?;

        let outcome = parse_suggestions(&content, params.max_tags);
        let plan = {
            let mut rng = rand::thread_rng();
            plan_for_article(&outcome, &article, params.max_tags, &mut rng)
        }
        .ok_or(DispatchError::NoSuggestions)?;
        if plan.is_empty() {
            return Err(DispatchError::NothingApplied);
        }

        let mut applied = AppliedTags {
            fallback: outcome.is_fallback(),
            ..AppliedTags::default()
        };
        let merged = (!plan.tags_to_add.is_empty()).then(|| plan.merged_tags(&article.tags));
        if !plan.labels.is_empty() {
            let labels: Vec<_> = plan
                .labels
                .into_iter()
                .map(LabelResolution::into_label)
                .collect();
            applied.labels = self.host.persist_labels(&entity, &labels).await?;
        }
        if let Some(merged) = merged {
            if let Err(source) = self.host.persist_tags(&entity, &merged).await {
                if applied.labels.is_empty() {
                    return Err(source.into());
                }
                return Err(DispatchError::TagsNotSaved {
                    labels: applied.labels.into_iter().map(|label| label.caption).collect(),
                    source,
                });
            }
            applied.tags = plan.tags_to_add;
        }
        Ok(applied)
    }
}

/// Wraps a plain-text summary in the TL;DR block prepended to articles.
pub fn tldr_html(summary: &str) -> String {
    format!(
        "<div class=\"tldr-summary\"><p><strong>TL;DR</strong></p><p>{}</p></div>",
        escape_html(summary)
    )
}
