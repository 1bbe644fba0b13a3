pub use crate::{
    ChatMessage, ChatRequest, CompletionResult, DeltaEvent, HarnessError, ProviderAdapter,
    ProviderError, ProviderKind, ResponseFormat, Role, RunFailure, RunOptions, RunStream,
    StreamEvent, WireFormat,
};
