use crate::structs::channel::ChannelNumbers;
use crate::structs::param_definition::ParamDefinitionType;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error(
        "Audio element ID {audio_element_id} associated with the recon gain parameter of ID {parameter_id} not found"
    )]
    AudioElementNotFound {
        audio_element_id: u32,
        parameter_id: u32,
    },

    #[error("Unsupported param definition type {param_definition_type} for parameter ID {parameter_id}")]
    UnsupportedParamDefinitionType {
        parameter_id: u32,
        param_definition_type: u32,
    },

    #[error(
        "Audio element {audio_element_id} declares {num_layers} layers but carries channel numbers for {actual}"
    )]
    LayerCountMismatch {
        audio_element_id: u32,
        num_layers: u8,
        actual: usize,
    },

    #[error("No per-ID parameter metadata found for parameter ID {0}")]
    UnknownParameterId(u32),
}

#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error(
        "Channel numbers must be non-decreasing across layers: layer {layer} is {current}, lower layers accumulate to {previous}"
    )]
    NonMonotonicLayers {
        layer: usize,
        current: ChannelNumbers,
        previous: ChannelNumbers,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum DemixError {
    #[error("Unsupported number of surround channels: {0}")]
    UnsupportedSurround(u32),
}

#[derive(thiserror::Error, Debug)]
pub enum ReconGainError {
    #[error(
        "There are {num_layers} layers of scalable audio element, but the user only specifies {specified} layers"
    )]
    LayerCountMismatch { num_layers: u8, specified: usize },

    #[error("Recon gain bit position {0} exceeds the 12-bit layout")]
    BitPositionOutOfRange(u8),

    #[error(
        "Mismatch of whether user specified recon gain is present: {declared} vs whether recon gain should be computed: {computed}"
    )]
    PresenceFlagMismatch { declared: bool, computed: bool },

    #[error(
        "Original or decoded audio frame for audio element ID {0} not found when computing recon gains"
    )]
    LabeledFramesNotFound(u32),

    #[error(
        "Computed recon gain flag different from what user specified: {computed:#014b} vs {declared:#014b}"
    )]
    FlagMismatch { computed: u16, declared: u16 },

    #[error("Recon gains mismatch")]
    GainMismatch,

    #[error("Parameter ID {0} has no recon gain layer metadata")]
    NoLayerMetadata(u32),
}

#[derive(thiserror::Error, Debug)]
pub enum SubblockError {
    #[error("A parameter block must contain at least one subblock")]
    NoSubblocks,

    #[error("Expected {expected} subblocks, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("There should be only one subblock for demixing info")]
    MultipleDemixingSubblocks,

    #[error("There should be only one subblock for recon gain info")]
    MultipleReconGainSubblocks,

    #[error("Subblock payload is {actual}, but parameter ID {parameter_id} is defined as {expected}")]
    PayloadTypeMismatch {
        parameter_id: u32,
        expected: ParamDefinitionType,
        actual: ParamDefinitionType,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum NumericError {
    #[error("{field} = {value} does not fit in a signed 16-bit integer")]
    OutOfRangeI16 { field: &'static str, value: i32 },

    #[error("{field} = {value} does not fit in an unsigned 8-bit integer")]
    OutOfRangeU8 { field: &'static str, value: u32 },
}
