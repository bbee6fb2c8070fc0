//! Factor research reporting.

mod correlation;
mod summary;

pub use correlation::CorrelationMatrix;
pub use summary::{average_sharpe, FactorSummary, ResearchReport};
