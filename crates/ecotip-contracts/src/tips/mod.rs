mod prompt;
mod reply;

pub use prompt::{build_request, build_request_for_model, TipRequest, DEFAULT_TIP_MODEL, TIP_PERSONA};
pub use reply::{parse_tip, EcoTip, TipParseError, SCORE_MARKER};
