//! View state of one summary container.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use enrich_harness::{CompletionResult, DeltaEvent};

use crate::markdown::{MarkdownToHtml, PulldownMarkdownRenderer, plain_text_html};

/// Lifecycle of the request shown in one container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Error(String),
    Done,
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Texts shown by the presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterCaptions {
    pub loading_message: String,
    pub submit: String,
    pub busy: String,
    pub retry: String,
}

impl Default for PresenterCaptions {
    fn default() -> Self {
        Self {
            loading_message: "Loading…".to_string(),
            submit: "Summarize".to_string(),
            busy: "Summarizing…".to_string(),
            retry: "Retry".to_string(),
        }
    }
}

/// Returned by [`SummaryPresenter::begin`] when a request is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a request is already in flight for this container")]
pub struct AlreadyLoading;

/// Accumulates streamed summary text and keeps its rendered HTML current.
///
/// Every delta re-renders the whole accumulator, so the HTML never depends
/// on how the text was split into deltas.
pub struct SummaryPresenter {
    renderer: Arc<dyn MarkdownToHtml>,
    captions: PresenterCaptions,
    state: RequestState,
    accumulator: String,
    html: String,
    button_caption: String,
    button_enabled: bool,
}

impl Default for SummaryPresenter {
    fn default() -> Self {
        Self::new(Arc::new(PulldownMarkdownRenderer), PresenterCaptions::default())
    }
}

impl SummaryPresenter {
    pub fn new(renderer: Arc<dyn MarkdownToHtml>, captions: PresenterCaptions) -> Self {
        let button_caption = captions.submit.clone();
        Self {
            renderer,
            captions,
            state: RequestState::Idle,
            accumulator: String::new(),
            html: String::new(),
            button_caption,
            button_enabled: true,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// Rendered summary HTML. Kept on screen after an error.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn text(&self) -> &str {
        &self.accumulator
    }

    pub fn button_caption(&self) -> &str {
        &self.button_caption
    }

    pub fn button_enabled(&self) -> bool {
        self.button_enabled
    }

    /// Loading indicator or error text, if either is showing.
    pub fn status_message(&self) -> Option<&str> {
        match &self.state {
            RequestState::Loading => Some(&self.captions.loading_message),
            RequestState::Error(message) => Some(message),
            RequestState::Idle | RequestState::Done => None,
        }
    }

    /// Starts a new request: clears the previous summary and disables the
    /// submit control. Rejected while a request is loading.
    pub fn begin(&mut self) -> Result<(), AlreadyLoading> {
        if self.state.is_loading() {
            return Err(AlreadyLoading);
        }
        self.accumulator.clear();
        self.html.clear();
        self.state = RequestState::Loading;
        self.button_enabled = false;
        self.button_caption = self.captions.busy.clone();
        Ok(())
    }

    /// Appends `delta` and re-renders. Ignored unless a request is loading.
    pub fn apply_delta(&mut self, delta: &DeltaEvent) -> bool {
        if !self.state.is_loading() {
            debug!(event = "presenter.delta_ignored", domain = "presenter", seq = delta.seq);
            return false;
        }
        self.accumulator.push_str(&delta.text);
        self.render();
        true
    }

    /// Applies the terminal result of the current request.
    pub fn finish(&mut self, result: &CompletionResult) {
        if !self.state.is_loading() {
            debug!(event = "presenter.finish_ignored", domain = "presenter");
            return;
        }
        match result {
            CompletionResult::Done { full_text } => {
                if *full_text != self.accumulator {
                    self.accumulator.clone_from(full_text);
                    self.render();
                }
                self.state = RequestState::Done;
                self.button_caption = self.captions.submit.clone();
            }
            CompletionResult::Failed { failure } => {
                self.state = RequestState::Error(failure.user_message());
                self.button_caption = self.captions.retry.clone();
            }
        }
        self.button_enabled = true;
    }

    /// Marks the current request failed before any stream started.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = RequestState::Error(message.into());
        self.button_caption = self.captions.retry.clone();
        self.button_enabled = true;
    }

    /// Restores the submit caption without touching request state, as when
    /// the user moves to another article header.
    pub fn reset_label(&mut self) {
        self.button_caption = self.captions.submit.clone();
    }

    /// Re-derives the HTML from the whole accumulator.
    pub fn render(&mut self) {
        self.html = match self.renderer.render(&self.accumulator) {
            Ok(html) => html,
            Err(err) => {
                warn!(
                    event = "presenter.render_failed",
                    domain = "presenter",
                    error = %err,
                    "falling back to plain text"
                );
                plain_text_html(&self.accumulator)
            }
        };
    }
}
