//! Utility functions and supporting infrastructure.
//!
//! Provides error types, checked numeric narrowing, and the timing
//! collaborator seam used by the generation pipeline.

pub mod errors;
pub mod numeric;
pub mod timing;
