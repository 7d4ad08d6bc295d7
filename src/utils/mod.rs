//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, the call-data decoder and the factor cache, shared by the
//! engine and the API layer.

pub mod cache;
pub mod constants;
pub mod decoder;

pub use cache::*;
pub use constants::*;
pub use decoder::*;
