//! Article enrichment on top of the harness: streamed summaries shown
//! through a [`SummaryPresenter`], auto-tagging, and the [`HostStore`]
//! contract the embedding application implements. Start from
//! [`RequestDispatcher`].

mod autotag;
mod dispatcher;
mod host;
mod markdown;
mod presenter;
mod prompt;

pub use autotag::{
    AppliedTags, NO_SUGGESTIONS_MESSAGE, NOTHING_APPLIED_MESSAGE, plan_for_article,
    reconciliation_input,
};
pub use dispatcher::{
    CONNECTION_TEST_MAX_TOKENS, CONNECTION_TEST_PROMPT, DispatchError, DispatchOutcome,
    HttpProviderFactory, ProviderFactory, RequestDispatcher, tldr_html,
};
pub use host::{
    ArticleRecord, DEFAULT_MODEL, DEFAULT_SUMMARY_PROMPT, EntityRef, HostError, HostStore,
    MemoryHost, RequestKind, RequestParameters,
};
pub use markdown::{MarkdownError, MarkdownToHtml, PulldownMarkdownRenderer, escape_html};
pub use presenter::{AlreadyLoading, PresenterCaptions, RequestState, SummaryPresenter};
pub use prompt::{
    PreparedText, SUMMARY_SYSTEM_PROMPT, TAGGING_SYSTEM_PROMPT, meets_min_length, prepare_text,
    summary_request, tagging_max_tokens, tagging_request,
};

pub use enrich_core::{Label, TruncationPolicy};
pub use enrich_harness::{CompletionResult, DeltaEvent, ProviderKind};
