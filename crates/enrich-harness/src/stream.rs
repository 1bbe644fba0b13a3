use crate::errors::RunFailure;

/// One ordered fragment of generated text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaEvent {
    /// Zero-based position of this delta within its run.
    pub seq: u64,
    pub text: String,
}

/// Terminal outcome of a run. Exactly one is produced per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionResult {
    Done { full_text: String },
    Failed { failure: RunFailure },
}

impl CompletionResult {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    /// The user-visible failure message, if the run failed.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Done { .. } => None,
            Self::Failed { failure } => Some(failure.user_message()),
        }
    }

    pub fn into_result(self) -> Result<String, RunFailure> {
        match self {
            Self::Done { full_text } => Ok(full_text),
            Self::Failed { failure } => Err(failure),
        }
    }
}

/// Normalized stream events exposed by `RunStream`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text output chunk.
    Delta(DeltaEvent),
    /// Terminal event; nothing follows it.
    Finished(CompletionResult),
}
