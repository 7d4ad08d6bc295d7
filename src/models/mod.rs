//! Models Module - Data Structures & Configuration
//!
//! Single source of truth for every type crossing module boundaries.

pub mod assessment;
pub mod config;
pub mod errors;
pub mod types;

pub use assessment::*;
pub use config::*;
pub use errors::*;
pub use types::*;
