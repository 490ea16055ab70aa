//! Data structures representing parameter metadata and generated blocks.
//!
//! Contains structured representations of audio elements, parameter
//! definitions, channel labels and the parameter block records produced by
//! the generation pipeline.

pub mod audio_element;
pub mod channel;
pub mod param_definition;
pub mod parameter_block;
