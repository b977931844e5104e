mod failure;
mod providers;
mod session;

pub use failure::{FailureKind, TipFailure};
pub use providers::{
    chat_completions_endpoint, extract_message_content, send_tip_request, ApiKey, DryrunProvider,
    TipProvider, TogetherProvider, DEFAULT_API_BASE, NO_RESPONSE_FALLBACK,
};
pub use session::{EcoSession, TipOutcome};
