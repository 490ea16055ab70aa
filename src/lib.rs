#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Parameter block generation engine for IAMF bitstream encoders.
//!
//! ### Pipeline
//!
//! 1. Build the per-ID metadata registry from audio elements and parameter
//!    definitions using
//!    [`ParameterBlockGenerator::initialize`](process::generate::ParameterBlockGenerator::initialize)
//! 2. Queue structured metadata items with
//!    [`add_metadata`](process::generate::ParameterBlockGenerator::add_metadata)
//! 3. Drain one parameter type at a time with `generate_demixing`,
//!    `generate_mix_gain` and `generate_recon_gain`
//!
//! ### Parameter Types
//!
//! - **Mix gain**: step, linear or bezier animation curves per subblock
//! - **Demixing**: decoder demixing mode, one subblock per block
//! - **Recon gain**: per-layer reconstruction gains for scalable channel
//!   layouts, computed via an injected calculator and reconciled bit-for-bit
//!   against user-declared values
//!
//! Timing and sample-domain gain computation are injected collaborators; the
//! output is in-memory records ready for an OBU writer.

/// Parameter block generation.
///
/// 1. **Generation** ([`process::generate`]): registry, metadata queues and
///    the per-type generation passes.
///
/// 2. **Demixing topology** ([`process::demix`]): channel labels synthesized
///    by upmixing between successive channel layers.
///
/// 3. **Recon gain** ([`process::recon_gain`]): gain packing, computation
///    and cross-validation against declared values.
pub mod process;

/// Data structures representing parameter metadata and generated blocks.
///
/// - **Audio Elements** ([`structs::audio_element`]): scalable channel layouts
/// - **Channels** ([`structs::channel`]): labels and per-layer channel counts
/// - **Parameter Definitions** ([`structs::param_definition`]): per-ID modes
/// - **Parameter Blocks** ([`structs::parameter_block`]): generated records
///   and structured input metadata
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Error Handling** ([`utils::errors`]): error types
/// - **Numeric Conversions** ([`utils::numeric`]): checked narrowing
/// - **Timing** ([`utils::timing`]): timing collaborator seam
pub mod utils;
