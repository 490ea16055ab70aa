//! Parameter block generation.
//!
//! The [`ParameterBlockGenerator`] owns a per-ID metadata registry built
//! once from audio elements and parameter definitions, plus one queue of
//! structured metadata per parameter type. A generation pass drains one
//! queue in enqueued order, resolving timing through the injected
//! [`GlobalTiming`] collaborator and dispatching each subblock to its
//! type-specific builder.
//!
//! Passes are transactional: on any failure nothing is appended to the
//! caller's output and the queue is retained. The timing collaborator may
//! already have advanced for items that succeeded before the failure, so
//! retrying the same queue is unsafe without resetting it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::mem;

use anyhow::{Result, anyhow, bail};
use log::debug;

use crate::process::recon_gain::{
    ReconGainCalculator, ReconGainContext, ReconGainLayerInfo, generate_recon_gain_subblock,
};
use crate::process::IdLabeledFrameMap;
use crate::structs::audio_element::AudioElement;
use crate::structs::param_definition::{ParamDefinition, ParamDefinitionType, ParamDefinitionVariant};
use crate::structs::parameter_block::{
    Animation, AnimationMetadata, DemixingInfoParameterData, MixGainMetadata,
    MixGainParameterData, ParameterBlock, ParameterBlockMetadata, ParameterBlockWithData,
    ParameterData, ParameterSubblock, SubblockMetadata, SubblockPayload,
};
use crate::utils::errors::{ReconGainError, RegistryError, SubblockError};
use crate::utils::numeric::{i32_to_i16, u32_to_u8};
use crate::utils::timing::GlobalTiming;

/// Registry entry for one parameter ID: its resolved type, its definition,
/// and layer information when the parameter carries recon gains.
#[derive(Debug, Clone)]
pub struct PerIdParameterMetadata {
    pub param_definition_type: ParamDefinitionType,
    pub param_definition: ParamDefinition,
    pub recon_gain: Option<ReconGainLayerInfo>,
}

fn build_per_id_metadata(
    parameter_id: u32,
    audio_elements: &HashMap<u32, AudioElement>,
    param_definition: &ParamDefinition,
) -> Result<PerIdParameterMetadata> {
    let (param_definition_type, recon_gain) = match param_definition.variant {
        ParamDefinitionVariant::MixGain { .. } => (ParamDefinitionType::MixGain, None),
        ParamDefinitionVariant::Demixing { .. } => (ParamDefinitionType::Demixing, None),
        ParamDefinitionVariant::ReconGain { audio_element_id } => {
            let Some(audio_element) = audio_elements.get(&audio_element_id) else {
                return Err(anyhow!(RegistryError::AudioElementNotFound {
                    audio_element_id,
                    parameter_id,
                }));
            };

            let num_layers = audio_element.num_layers();
            if audio_element.channel_numbers_for_layers.len() != num_layers as usize {
                return Err(anyhow!(RegistryError::LayerCountMismatch {
                    audio_element_id,
                    num_layers,
                    actual: audio_element.channel_numbers_for_layers.len(),
                }));
            }

            let recon_gain_is_present_flags = audio_element
                .config
                .channel_audio_layer_configs
                .iter()
                .map(|layer| layer.recon_gain_is_present_flag)
                .collect();

            (
                ParamDefinitionType::ReconGain,
                Some(ReconGainLayerInfo {
                    audio_element_id,
                    num_layers,
                    recon_gain_is_present_flags,
                    channel_numbers_for_layers: audio_element.channel_numbers_for_layers.clone(),
                }),
            )
        }
        ParamDefinitionVariant::Extension {
            param_definition_type,
        } => {
            return Err(anyhow!(RegistryError::UnsupportedParamDefinitionType {
                parameter_id,
                param_definition_type,
            }));
        }
    };

    Ok(PerIdParameterMetadata {
        param_definition_type,
        param_definition: param_definition.clone(),
        recon_gain,
    })
}

fn generate_mix_gain_subblock(metadata: &MixGainMetadata) -> Result<MixGainParameterData> {
    let animation = match metadata.animation {
        AnimationMetadata::Step { start_point_value } => Animation::Step {
            start_point_value: i32_to_i16("start_point_value", start_point_value)?,
        },
        AnimationMetadata::Linear {
            start_point_value,
            end_point_value,
        } => Animation::Linear {
            start_point_value: i32_to_i16("start_point_value", start_point_value)?,
            end_point_value: i32_to_i16("end_point_value", end_point_value)?,
        },
        AnimationMetadata::Bezier {
            start_point_value,
            end_point_value,
            control_point_value,
            control_point_relative_time,
        } => Animation::Bezier {
            start_point_value: i32_to_i16("start_point_value", start_point_value)?,
            end_point_value: i32_to_i16("end_point_value", end_point_value)?,
            control_point_value: i32_to_i16("control_point_value", control_point_value)?,
            control_point_relative_time: u32_to_u8(
                "control_point_relative_time",
                control_point_relative_time,
            )?,
        },
    };

    Ok(MixGainParameterData { animation })
}

fn generate_subblock(
    subblock_index: usize,
    include_subblock_duration: bool,
    subblock_metadata: &SubblockMetadata,
    per_id_metadata: &PerIdParameterMetadata,
    context: Option<ReconGainContext<'_>>,
    override_computed_recon_gains: bool,
    additional_logging: bool,
) -> Result<ParameterSubblock> {
    let parameter_id = per_id_metadata.param_definition.parameter_id;

    let param_data = match (
        per_id_metadata.param_definition_type,
        &subblock_metadata.payload,
    ) {
        (ParamDefinitionType::MixGain, SubblockPayload::MixGain(mix_gain)) => {
            ParameterData::MixGain(generate_mix_gain_subblock(mix_gain)?)
        }
        (ParamDefinitionType::Demixing, SubblockPayload::Demixing(demixing)) => {
            if subblock_index >= 1 {
                return Err(anyhow!(SubblockError::MultipleDemixingSubblocks));
            }
            ParameterData::Demixing(DemixingInfoParameterData {
                dmixp_mode: demixing.dmixp_mode,
            })
        }
        (ParamDefinitionType::ReconGain, SubblockPayload::ReconGain(recon_gain)) => {
            if subblock_index >= 1 {
                return Err(anyhow!(SubblockError::MultipleReconGainSubblocks));
            }
            let Some(layer_info) = per_id_metadata.recon_gain.as_ref() else {
                return Err(anyhow!(ReconGainError::NoLayerMetadata(parameter_id)));
            };
            let Some(context) = context else {
                bail!("Recon gain generation requires labeled frames and a calculator");
            };
            ParameterData::ReconGain(generate_recon_gain_subblock(
                override_computed_recon_gains,
                additional_logging,
                context,
                layer_info,
                recon_gain,
            )?)
        }
        (expected, payload) => {
            return Err(anyhow!(SubblockError::PayloadTypeMismatch {
                parameter_id,
                expected,
                actual: payload.param_definition_type(),
            }));
        }
    };

    Ok(ParameterSubblock {
        subblock_duration: include_subblock_duration
            .then_some(subblock_metadata.subblock_duration),
        param_data,
    })
}

/// Resolves the effective duration and the block's time span, and sizes the
/// subblock storage according to the parameter's duration mode.
fn populate_common_fields(
    metadata: &ParameterBlockMetadata,
    per_id_metadata: &PerIdParameterMetadata,
    timing: &mut dyn GlobalTiming,
) -> Result<ParameterBlockWithData> {
    let definition = &per_id_metadata.param_definition;

    // Per-block duration mode takes the duration from the metadata item,
    // otherwise it is fixed by the definition.
    let duration = if definition.param_definition_mode {
        metadata.duration
    } else {
        definition.duration
    };

    let (start_timestamp, end_timestamp) = timing.next_parameter_block_timestamps(
        metadata.parameter_id,
        metadata.start_timestamp,
        duration,
    )?;

    let obu = if definition.param_definition_mode {
        ParameterBlock::with_explicit_subblocks(
            metadata.parameter_id,
            metadata.duration,
            metadata.constant_subblock_duration,
            metadata.num_subblocks,
        )?
    } else {
        ParameterBlock::with_implicit_subblock(metadata.parameter_id, definition.duration)
    };

    Ok(ParameterBlockWithData {
        obu,
        start_timestamp,
        end_timestamp,
    })
}

fn populate_subblocks(
    metadata: &ParameterBlockMetadata,
    per_id_metadata: &PerIdParameterMetadata,
    context: Option<ReconGainContext<'_>>,
    override_computed_recon_gains: bool,
    additional_logging: bool,
    block: &mut ParameterBlockWithData,
) -> Result<()> {
    let num_subblocks = block.obu.num_subblocks();

    // All subblocks carry a serialized duration or none do.
    let include_subblock_duration = per_id_metadata.param_definition.param_definition_mode
        && block.obu.constant_subblock_duration == 0;

    if num_subblocks != metadata.subblocks.len() {
        return Err(anyhow!(SubblockError::CountMismatch {
            expected: num_subblocks,
            actual: metadata.subblocks.len(),
        }));
    }

    for (subblock_index, subblock_metadata) in metadata.subblocks.iter().enumerate() {
        let subblock = generate_subblock(
            subblock_index,
            include_subblock_duration,
            subblock_metadata,
            per_id_metadata,
            context,
            override_computed_recon_gains,
            additional_logging,
        )?;
        block.obu.subblocks.push(subblock);
    }

    Ok(())
}

/// Turns queued parameter metadata into bitstream-ready parameter blocks.
///
/// Build the registry once with [`initialize`](Self::initialize), queue
/// items with [`add_metadata`](Self::add_metadata), then drain one parameter
/// type at a time with the `generate_*` passes. Intended to be driven by a
/// single caller per encoding session.
pub struct ParameterBlockGenerator {
    parameter_id_to_metadata: HashMap<u32, PerIdParameterMetadata>,

    mix_gain_metadata: Vec<ParameterBlockMetadata>,
    demixing_metadata: Vec<ParameterBlockMetadata>,
    recon_gain_metadata: Vec<ParameterBlockMetadata>,

    override_computed_recon_gains: bool,
    additional_recon_gains_logging: bool,
}

impl Default for ParameterBlockGenerator {
    fn default() -> Self {
        Self {
            parameter_id_to_metadata: HashMap::new(),
            mix_gain_metadata: Vec::new(),
            demixing_metadata: Vec::new(),
            recon_gain_metadata: Vec::new(),
            override_computed_recon_gains: false,
            additional_recon_gains_logging: true,
        }
    }
}

impl ParameterBlockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trusts user-declared recon gains instead of recomputing and
    /// reconciling them, e.g. when sample-domain data is unavailable.
    pub fn set_override_computed_recon_gains(&mut self, override_computed_recon_gains: bool) {
        self.override_computed_recon_gains = override_computed_recon_gains;
    }

    /// Builds one registry entry per distinct parameter ID.
    ///
    /// Recon gain parameters resolve their owning audio element here; a
    /// missing element or an extension-typed definition rejects the input.
    /// Re-initialization with a repeated ID reuses the first-created entry.
    pub fn initialize(
        &mut self,
        audio_elements: &HashMap<u32, AudioElement>,
        param_definitions: &HashMap<u32, ParamDefinition>,
    ) -> Result<()> {
        for (&parameter_id, param_definition) in param_definitions {
            if let Entry::Vacant(entry) = self.parameter_id_to_metadata.entry(parameter_id) {
                entry.insert(build_per_id_metadata(
                    parameter_id,
                    audio_elements,
                    param_definition,
                )?);
            }
        }

        Ok(())
    }

    /// Queues one metadata item under its parameter's registered type.
    ///
    /// The registry's type mapping is authoritative; an unregistered
    /// parameter ID rejects the item.
    pub fn add_metadata(&mut self, metadata: ParameterBlockMetadata) -> Result<()> {
        let Some(per_id_metadata) = self.parameter_id_to_metadata.get(&metadata.parameter_id)
        else {
            return Err(anyhow!(RegistryError::UnknownParameterId(
                metadata.parameter_id
            )));
        };

        let param_definition_type = per_id_metadata.param_definition_type;
        self.queue_mut(param_definition_type).push(metadata);

        Ok(())
    }

    /// Drains the demixing queue into `output_parameter_blocks`.
    pub fn generate_demixing(
        &mut self,
        timing: &mut dyn GlobalTiming,
        output_parameter_blocks: &mut Vec<ParameterBlockWithData>,
    ) -> Result<()> {
        self.generate_parameter_blocks(
            ParamDefinitionType::Demixing,
            None,
            timing,
            output_parameter_blocks,
        )
    }

    /// Drains the mix gain queue into `output_parameter_blocks`.
    pub fn generate_mix_gain(
        &mut self,
        timing: &mut dyn GlobalTiming,
        output_parameter_blocks: &mut Vec<ParameterBlockWithData>,
    ) -> Result<()> {
        self.generate_parameter_blocks(
            ParamDefinitionType::MixGain,
            None,
            timing,
            output_parameter_blocks,
        )
    }

    /// Drains the recon gain queue into `output_parameter_blocks`,
    /// computing gains from the labeled original and decoded frames unless
    /// override mode is active.
    pub fn generate_recon_gain(
        &mut self,
        id_to_labeled_frame: &IdLabeledFrameMap,
        id_to_labeled_decoded_frame: &IdLabeledFrameMap,
        calculator: &dyn ReconGainCalculator,
        timing: &mut dyn GlobalTiming,
        output_parameter_blocks: &mut Vec<ParameterBlockWithData>,
    ) -> Result<()> {
        self.generate_parameter_blocks(
            ParamDefinitionType::ReconGain,
            Some(ReconGainContext {
                id_to_labeled_frame,
                id_to_labeled_decoded_frame,
                calculator,
            }),
            timing,
            output_parameter_blocks,
        )
    }

    fn queue_mut(
        &mut self,
        param_definition_type: ParamDefinitionType,
    ) -> &mut Vec<ParameterBlockMetadata> {
        match param_definition_type {
            ParamDefinitionType::MixGain => &mut self.mix_gain_metadata,
            ParamDefinitionType::Demixing => &mut self.demixing_metadata,
            ParamDefinitionType::ReconGain => &mut self.recon_gain_metadata,
        }
    }

    fn generate_one(
        &self,
        metadata: &ParameterBlockMetadata,
        context: Option<ReconGainContext<'_>>,
        additional_logging: bool,
        timing: &mut dyn GlobalTiming,
    ) -> Result<ParameterBlockWithData> {
        let Some(per_id_metadata) = self.parameter_id_to_metadata.get(&metadata.parameter_id)
        else {
            return Err(anyhow!(RegistryError::UnknownParameterId(
                metadata.parameter_id
            )));
        };

        let mut block = populate_common_fields(metadata, per_id_metadata, timing)?;
        populate_subblocks(
            metadata,
            per_id_metadata,
            context,
            self.override_computed_recon_gains,
            additional_logging,
            &mut block,
        )?;

        Ok(block)
    }

    fn generate_parameter_blocks(
        &mut self,
        param_definition_type: ParamDefinitionType,
        context: Option<ReconGainContext<'_>>,
        timing: &mut dyn GlobalTiming,
        output_parameter_blocks: &mut Vec<ParameterBlockWithData>,
    ) -> Result<()> {
        let queue = mem::take(self.queue_mut(param_definition_type));

        let mut generated = Vec::with_capacity(queue.len());
        let mut failure = None;
        for metadata in &queue {
            let result =
                self.generate_one(metadata, context, self.additional_recon_gains_logging, timing);

            // Verbose recon gain diagnostics only cover the first block of a
            // session, whether or not it was produced successfully.
            if !self.override_computed_recon_gains {
                self.additional_recon_gains_logging = false;
            }

            match result {
                Ok(block) => generated.push(block),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = failure {
            *self.queue_mut(param_definition_type) = queue;
            return Err(e);
        }

        if let (Some(first), Some(last)) = (generated.first(), generated.last()) {
            debug!(
                "First {param_definition_type} parameter block: ID {} [{}, {})",
                first.obu.parameter_id, first.start_timestamp, first.end_timestamp
            );
            if generated.len() > 1 {
                debug!(
                    "Last {param_definition_type} parameter block: ID {} [{}, {})",
                    last.obu.parameter_id, last.start_timestamp, last.end_timestamp
                );
            }
        }

        output_parameter_blocks.extend(generated);

        Ok(())
    }
}
