//! Parameter definitions.
//!
//! A parameter definition fixes the rate, duration mode and type of every
//! parameter block sharing one parameter ID. In per-block duration mode
//! (`param_definition_mode` set) the duration and subblock structure arrive
//! with each block instead of being fixed here.

use std::fmt::Display;

/// Demixing parameter value signaled to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DMixPMode {
    Mode1,
    Mode2,
    Mode3,
    Mode1N,
    Mode2N,
    Mode3N,
}

/// Resolved type of a parameter definition.
///
/// Extension definitions carry a raw type code instead and are rejected when
/// the registry is built, so this enum is total everywhere downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamDefinitionType {
    MixGain,
    Demixing,
    ReconGain,
}

impl Display for ParamDefinitionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamDefinitionType::MixGain => write!(f, "mix gain"),
            ParamDefinitionType::Demixing => write!(f, "demixing"),
            ParamDefinitionType::ReconGain => write!(f, "recon gain"),
        }
    }
}

/// Type-specific portion of a parameter definition.
#[derive(Debug, Clone)]
pub enum ParamDefinitionVariant {
    MixGain { default_mix_gain: i16 },
    Demixing { default_dmixp_mode: DMixPMode },
    ReconGain { audio_element_id: u32 },
    Extension { param_definition_type: u32 },
}

#[derive(Debug, Clone)]
pub struct ParamDefinition {
    pub parameter_id: u32,
    pub parameter_rate: u32,
    /// Per-block duration mode: duration and subblock structure are supplied
    /// with each parameter block rather than fixed below.
    pub param_definition_mode: bool,
    pub duration: u32,
    pub constant_subblock_duration: u32,
    pub num_subblocks: u32,
    pub variant: ParamDefinitionVariant,
}
