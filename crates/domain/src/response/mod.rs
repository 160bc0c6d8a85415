//! Query response domain types

mod normalized;
mod status;
mod summary;

pub use normalized::{ErrorSummary, NormalizedResponse, SuccessResponse};
pub use status::{StatusGuidance, guidance_for, reason_phrase};
pub use summary::ResponseSummary;
