//! Processing Quotas
//!
//! Per-user cumulative time budgets for long-running requests.

mod budget;

pub use budget::{handle_request, QuotaConfig, QuotaError, RequestOutcome, User};
