//! Parameter blocks, subblock payloads and structured input metadata.
//!
//! A parameter block is a time-bounded record carrying one or more subblocks
//! of a single parameter type's data. The types here are bitstream-ready but
//! in-memory; serialization into OBU bytes happens elsewhere.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};

use crate::structs::param_definition::{DMixPMode, ParamDefinitionType};
use crate::utils::errors::SubblockError;

/// Mix gain animation over one subblock, with bitstream-native widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Step {
        start_point_value: i16,
    },
    Linear {
        start_point_value: i16,
        end_point_value: i16,
    },
    Bezier {
        start_point_value: i16,
        end_point_value: i16,
        control_point_value: i16,
        control_point_relative_time: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixGainParameterData {
    pub animation: Animation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemixingInfoParameterData {
    pub dmixp_mode: DMixPMode,
}

/// Recon gain record for one layer: a 12-bit presence bitmask plus one
/// quantized gain per set bit. Bits 1 and 11 are permanently reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconGainElement {
    pub recon_gain_flag: u16,
    pub recon_gain: [u8; 12],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconGainInfoParameterData {
    /// One element per layer of the owning audio element.
    pub recon_gain_elements: Vec<ReconGainElement>,
}

/// Type-tagged payload of one subblock.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterData {
    MixGain(MixGainParameterData),
    Demixing(DemixingInfoParameterData),
    ReconGain(ReconGainInfoParameterData),
}

/// One timed payload unit within a parameter block.
///
/// `subblock_duration` is populated only when the block's subblocks are
/// variable-length (per-block mode with zero constant subblock duration).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSubblock {
    pub subblock_duration: Option<u32>,
    pub param_data: ParameterData,
}

/// A generated parameter block payload.
#[derive(Debug, Clone)]
pub struct ParameterBlock {
    pub parameter_id: u32,
    pub duration: u32,
    pub constant_subblock_duration: u32,
    num_subblocks: u32,
    pub subblocks: Vec<ParameterSubblock>,
}

impl ParameterBlock {
    /// Builds a block with explicit subblock structure (per-block duration
    /// mode). A nonzero constant subblock duration fixes the subblock count
    /// at `duration / constant_subblock_duration` rounded up; otherwise the
    /// given count stands and each subblock carries its own duration.
    pub fn with_explicit_subblocks(
        parameter_id: u32,
        duration: u32,
        constant_subblock_duration: u32,
        num_subblocks: u32,
    ) -> Result<Self> {
        let effective_subblocks = if constant_subblock_duration == 0 {
            num_subblocks
        } else {
            duration.div_ceil(constant_subblock_duration)
        };

        if effective_subblocks == 0 {
            return Err(anyhow!(SubblockError::NoSubblocks));
        }

        Ok(Self {
            parameter_id,
            duration,
            constant_subblock_duration,
            num_subblocks: effective_subblocks,
            subblocks: Vec::with_capacity(effective_subblocks as usize),
        })
    }

    /// Builds a block with a single implicit subblock spanning the whole
    /// duration from the parameter definition.
    pub fn with_implicit_subblock(parameter_id: u32, duration: u32) -> Self {
        Self {
            parameter_id,
            duration,
            constant_subblock_duration: duration,
            num_subblocks: 1,
            subblocks: Vec::with_capacity(1),
        }
    }

    pub fn num_subblocks(&self) -> usize {
        self.num_subblocks as usize
    }
}

/// A generated parameter block plus its resolved `[start, end)` time span.
#[derive(Debug, Clone)]
pub struct ParameterBlockWithData {
    pub obu: ParameterBlock,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
}

/// Mix gain animation as supplied by metadata, in wide value types.
///
/// Values are narrowed to bitstream widths when the subblock is built; a
/// value that does not fit rejects the block.
#[derive(Debug, Clone, Copy)]
pub enum AnimationMetadata {
    Step {
        start_point_value: i32,
    },
    Linear {
        start_point_value: i32,
        end_point_value: i32,
    },
    Bezier {
        start_point_value: i32,
        end_point_value: i32,
        control_point_value: i32,
        control_point_relative_time: u32,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct MixGainMetadata {
    pub animation: AnimationMetadata,
}

#[derive(Debug, Clone, Copy)]
pub struct DemixingMetadata {
    pub dmixp_mode: DMixPMode,
}

/// User-declared recon gains: one `bit position -> quantized gain` map per
/// layer of the owning audio element.
#[derive(Debug, Clone, Default)]
pub struct ReconGainMetadata {
    pub recon_gains_for_layer: Vec<BTreeMap<u8, u8>>,
}

/// Per-subblock payload of a metadata item.
#[derive(Debug, Clone)]
pub enum SubblockPayload {
    MixGain(MixGainMetadata),
    Demixing(DemixingMetadata),
    ReconGain(ReconGainMetadata),
}

impl SubblockPayload {
    pub fn param_definition_type(&self) -> ParamDefinitionType {
        match self {
            SubblockPayload::MixGain(_) => ParamDefinitionType::MixGain,
            SubblockPayload::Demixing(_) => ParamDefinitionType::Demixing,
            SubblockPayload::ReconGain(_) => ParamDefinitionType::ReconGain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubblockMetadata {
    /// Only meaningful when the block's subblocks are variable-length.
    pub subblock_duration: u32,
    pub payload: SubblockPayload,
}

/// Structured input for one parameter block.
///
/// `duration`, `constant_subblock_duration` and `num_subblocks` are only
/// meaningful when the parameter definition uses per-block duration mode.
#[derive(Debug, Clone)]
pub struct ParameterBlockMetadata {
    pub parameter_id: u32,
    pub start_timestamp: i64,
    pub duration: u32,
    pub constant_subblock_duration: u32,
    pub num_subblocks: u32,
    pub subblocks: Vec<SubblockMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_subblock_duration_fixes_count() -> Result<()> {
        let block = ParameterBlock::with_explicit_subblocks(1, 8, 3, 0)?;
        assert_eq!(block.num_subblocks(), 3);

        let block = ParameterBlock::with_explicit_subblocks(1, 8, 8, 99)?;
        assert_eq!(block.num_subblocks(), 1);

        Ok(())
    }

    #[test]
    fn explicit_count_stands_when_variable() -> Result<()> {
        let block = ParameterBlock::with_explicit_subblocks(1, 8, 0, 2)?;
        assert_eq!(block.num_subblocks(), 2);

        Ok(())
    }

    #[test]
    fn zero_subblocks_rejected() {
        assert!(ParameterBlock::with_explicit_subblocks(1, 8, 0, 0).is_err());
        assert!(ParameterBlock::with_explicit_subblocks(1, 0, 4, 0).is_err());
    }

    #[test]
    fn implicit_subblock_spans_duration() {
        let block = ParameterBlock::with_implicit_subblock(1, 64);
        assert_eq!(block.num_subblocks(), 1);
        assert_eq!(block.constant_subblock_duration, 64);
    }
}
