//! Cross-cutting platform concerns: request admission control.

pub mod rate_limit;

pub use rate_limit::RateGovernor;
