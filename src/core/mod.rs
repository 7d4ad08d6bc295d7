//! Core Module - Business Logic
//!
//! Classification, reputation, risk factors, scoring and recommendations.
//! Pure and synchronous apart from factor collection.

pub mod analyzer;
pub mod classifier;
pub mod recommendations;
pub mod reputation;
pub mod risk_factors;
pub mod risk_score;

pub use analyzer::*;
pub use classifier::*;
pub use recommendations::*;
pub use reputation::*;
pub use risk_factors::*;
pub use risk_score::*;
