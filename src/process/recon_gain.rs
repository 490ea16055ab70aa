//! Recon gain computation, bit packing and cross-validation.
//!
//! For every layer above the base layer of a scalable audio element, the
//! channels synthesized by demixing need a reconstruction gain. Gains are
//! computed through an injected [`ReconGainCalculator`], quantized to 8 bits
//! and packed into a fixed 12-bit layout, then reconciled bit-for-bit
//! against the gains the user declared.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use log::{debug, error};

use crate::process::demix::find_demixed_channels;
use crate::process::{IdLabeledFrameMap, LabelSamplesMap};
use crate::structs::channel::{ChannelLabel, ChannelNumbers};
use crate::structs::parameter_block::{
    ReconGainElement, ReconGainInfoParameterData, ReconGainMetadata,
};
use crate::utils::errors::ReconGainError;

/// Sample-domain recon gain ratio computation, injected by the pipeline.
pub trait ReconGainCalculator {
    /// Returns the relative amplitude (typically in `0.0..=1.0`) between the
    /// original and the reconstructed audio of one demixed channel.
    fn compute_recon_gain(
        &self,
        label: ChannelLabel,
        label_to_samples: &LabelSamplesMap,
        label_to_decoded_samples: &LabelSamplesMap,
    ) -> Result<f64>;
}

/// Sample maps and calculator needed by a recon gain generation pass.
#[derive(Clone, Copy)]
pub struct ReconGainContext<'a> {
    pub id_to_labeled_frame: &'a IdLabeledFrameMap,
    pub id_to_labeled_decoded_frame: &'a IdLabeledFrameMap,
    pub calculator: &'a dyn ReconGainCalculator,
}

/// Registry-resolved layer information for one recon gain parameter ID.
#[derive(Debug, Clone)]
pub struct ReconGainLayerInfo {
    pub audio_element_id: u32,
    pub num_layers: u8,
    pub recon_gain_is_present_flags: Vec<bool>,
    pub channel_numbers_for_layers: Vec<ChannelNumbers>,
}

/// Packs computed gains into the fixed 12-slot layout.
///
/// Labels without a bit position are logged and skipped rather than
/// aborting the pack.
pub fn convert_recon_gains_and_flags(
    additional_logging: bool,
    label_to_recon_gain: &HashMap<ChannelLabel, f64>,
) -> ([u8; 12], u16) {
    let mut recon_gains = [0u8; 12];
    let mut recon_gain_flag: u16 = 0;

    for (&label, &recon_gain) in label_to_recon_gain {
        if additional_logging {
            debug!("Recon gain[{label}] = {recon_gain}");
        }

        let Some(bit_position) = label.recon_gain_bit_position() else {
            error!("Unrecognized demixed channel label: {label}");
            continue;
        };

        recon_gain_flag |= 1 << bit_position;
        recon_gains[bit_position as usize] = (recon_gain * 255.0).round() as u8;
    }

    (recon_gains, recon_gain_flag)
}

/// Computes and packs the recon gains of one layer.
///
/// The base layer always yields an empty gain set. The result must agree
/// with the layer's declared presence flag: a flag set with no demixed
/// channels, or demixed channels with the flag clear, rejects the input.
#[allow(clippy::too_many_arguments)]
pub fn compute_recon_gains(
    layer_index: usize,
    layer_channels: ChannelNumbers,
    accumulated_channels: ChannelNumbers,
    additional_logging: bool,
    calculator: &dyn ReconGainCalculator,
    label_to_samples: &LabelSamplesMap,
    label_to_decoded_samples: &LabelSamplesMap,
    recon_gain_is_present_flags: &[bool],
) -> Result<([u8; 12], u16)> {
    if additional_logging {
        debug!("Layer[{layer_index}]: {layer_channels}");
    }

    let mut label_to_recon_gain = HashMap::new();
    if layer_index > 0 {
        let demixed_channel_labels =
            find_demixed_channels(accumulated_channels, layer_channels)?;

        if additional_logging {
            debug!("Demixed channels: {demixed_channel_labels:?}");
        }
        for label in demixed_channel_labels {
            let recon_gain =
                calculator.compute_recon_gain(label, label_to_samples, label_to_decoded_samples)?;
            label_to_recon_gain.insert(label, recon_gain);
        }
    }

    let declared = recon_gain_is_present_flags
        .get(layer_index)
        .copied()
        .unwrap_or(false);
    let computed = !label_to_recon_gain.is_empty();
    if declared != computed {
        return Err(anyhow!(ReconGainError::PresenceFlagMismatch {
            declared,
            computed,
        }));
    }

    Ok(convert_recon_gains_and_flags(true, &label_to_recon_gain))
}

/// Builds the recon gain payload of one parameter block across all layers.
///
/// User-declared gains are always written through to the output. Unless
/// override mode is active, gains are recomputed independently and the
/// declared bitmask and all 12 value slots must match exactly; every
/// mismatching slot is logged before the aggregate failure is returned.
pub fn generate_recon_gain_subblock(
    override_computed_recon_gains: bool,
    additional_logging: bool,
    context: ReconGainContext<'_>,
    layer_info: &ReconGainLayerInfo,
    metadata: &ReconGainMetadata,
) -> Result<ReconGainInfoParameterData> {
    let num_layers = layer_info.num_layers as usize;
    let user_layers = &metadata.recon_gains_for_layer;
    if num_layers > 1 && num_layers != user_layers.len() {
        return Err(anyhow!(ReconGainError::LayerCountMismatch {
            num_layers: layer_info.num_layers,
            specified: user_layers.len(),
        }));
    }

    let mut recon_gain_elements = Vec::with_capacity(num_layers);
    let mut accumulated_channels = ChannelNumbers::default();

    for layer_index in 0..num_layers {
        let mut user_recon_gains = [0u8; 12];
        let mut user_recon_gain_flag: u16 = 0;
        if let Some(user_layer) = user_layers.get(layer_index) {
            for (&bit_position, &user_recon_gain) in user_layer {
                if bit_position >= 12 {
                    return Err(anyhow!(ReconGainError::BitPositionOutOfRange(bit_position)));
                }
                user_recon_gain_flag |= 1 << bit_position;
                user_recon_gains[bit_position as usize] = user_recon_gain;
            }
        }

        // Write out the user-supplied gains. Depending on the mode these
        // either match the computed recon gains or are used as an override.
        recon_gain_elements.push(ReconGainElement {
            recon_gain_flag: user_recon_gain_flag,
            recon_gain: user_recon_gains,
        });

        if override_computed_recon_gains {
            continue;
        }

        let layer_channels = layer_info.channel_numbers_for_layers[layer_index];

        let audio_element_id = layer_info.audio_element_id;
        let (Some(labeled_frame), Some(labeled_decoded_frame)) = (
            context.id_to_labeled_frame.get(&audio_element_id),
            context.id_to_labeled_decoded_frame.get(&audio_element_id),
        ) else {
            return Err(anyhow!(ReconGainError::LabeledFramesNotFound(
                audio_element_id
            )));
        };

        let (computed_recon_gains, computed_recon_gain_flag) = compute_recon_gains(
            layer_index,
            layer_channels,
            accumulated_channels,
            additional_logging,
            context.calculator,
            labeled_frame,
            labeled_decoded_frame,
            &layer_info.recon_gain_is_present_flags,
        )?;
        accumulated_channels = layer_channels;

        if !layer_info.recon_gain_is_present_flags[layer_index] {
            continue;
        }

        if computed_recon_gain_flag != user_recon_gain_flag {
            return Err(anyhow!(ReconGainError::FlagMismatch {
                computed: computed_recon_gain_flag,
                declared: user_recon_gain_flag,
            }));
        }

        let mut recon_gains_match = true;
        for i in 0..12 {
            if user_recon_gains[i] != computed_recon_gains[i] {
                // Report every mismatching slot before failing.
                error!(
                    "Computed recon gain [{i}] different from what user specified: {} vs {}",
                    computed_recon_gains[i], user_recon_gains[i]
                );
                recon_gains_match = false;
            }
        }
        if !recon_gains_match {
            return Err(anyhow!(ReconGainError::GainMismatch));
        }
    }

    Ok(ReconGainInfoParameterData {
        recon_gain_elements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Always reports full amplitude.
    struct UnityCalculator;

    impl ReconGainCalculator for UnityCalculator {
        fn compute_recon_gain(
            &self,
            _label: ChannelLabel,
            _label_to_samples: &LabelSamplesMap,
            _label_to_decoded_samples: &LabelSamplesMap,
        ) -> Result<f64> {
            Ok(1.0)
        }
    }

    struct FailingCalculator;

    impl ReconGainCalculator for FailingCalculator {
        fn compute_recon_gain(
            &self,
            label: ChannelLabel,
            _label_to_samples: &LabelSamplesMap,
            _label_to_decoded_samples: &LabelSamplesMap,
        ) -> Result<f64> {
            anyhow::bail!("no samples for {label}")
        }
    }

    fn mono_stereo_layer_info() -> ReconGainLayerInfo {
        ReconGainLayerInfo {
            audio_element_id: 300,
            num_layers: 2,
            recon_gain_is_present_flags: vec![false, true],
            channel_numbers_for_layers: vec![
                ChannelNumbers::new(1, 0, false),
                ChannelNumbers::new(2, 0, false),
            ],
        }
    }

    fn frames_for(audio_element_id: u32) -> IdLabeledFrameMap {
        let mut samples = LabelSamplesMap::new();
        samples.insert(ChannelLabel::Mono, vec![0; 8]);
        samples.insert(ChannelLabel::DemixedR2, vec![0; 8]);

        let mut frames = IdLabeledFrameMap::new();
        frames.insert(audio_element_id, samples);
        frames
    }

    fn declared_gains(gains: &[(u8, u8)]) -> ReconGainMetadata {
        ReconGainMetadata {
            recon_gains_for_layer: vec![BTreeMap::new(), gains.iter().copied().collect()],
        }
    }

    #[test]
    fn pack_unity_r2() {
        let mut label_to_recon_gain = HashMap::new();
        label_to_recon_gain.insert(ChannelLabel::DemixedR2, 1.0);

        let (gains, flag) = convert_recon_gains_and_flags(false, &label_to_recon_gain);

        assert_eq!(flag, 0b100);
        for (i, &gain) in gains.iter().enumerate() {
            assert_eq!(gain, if i == 2 { 255 } else { 0 });
        }
    }

    #[test]
    fn pack_skips_plain_labels() {
        let mut label_to_recon_gain = HashMap::new();
        label_to_recon_gain.insert(ChannelLabel::Centre, 1.0);

        let (gains, flag) = convert_recon_gains_and_flags(false, &label_to_recon_gain);

        assert_eq!(flag, 0);
        assert_eq!(gains, [0u8; 12]);
    }

    #[test]
    fn base_layer_is_empty() -> Result<()> {
        let samples = LabelSamplesMap::new();
        let (gains, flag) = compute_recon_gains(
            0,
            ChannelNumbers::new(1, 0, false),
            ChannelNumbers::default(),
            false,
            &FailingCalculator,
            &samples,
            &samples,
            &[false, true],
        )?;

        assert_eq!(flag, 0);
        assert_eq!(gains, [0u8; 12]);

        Ok(())
    }

    #[test]
    fn presence_flag_must_match_topology() {
        let samples = LabelSamplesMap::new();
        // Layer 1 of mono->stereo demixes R2, but the flag says no gains.
        let err = compute_recon_gains(
            1,
            ChannelNumbers::new(2, 0, false),
            ChannelNumbers::new(1, 0, false),
            false,
            &UnityCalculator,
            &samples,
            &samples,
            &[false, false],
        )
        .unwrap_err();

        assert!(err.to_string().contains("recon gain is present"));
    }

    #[test]
    fn reconciliation_succeeds_on_exact_match() -> Result<()> {
        let frames = frames_for(300);
        let context = ReconGainContext {
            id_to_labeled_frame: &frames,
            id_to_labeled_decoded_frame: &frames,
            calculator: &UnityCalculator,
        };

        let data = generate_recon_gain_subblock(
            false,
            false,
            context,
            &mono_stereo_layer_info(),
            &declared_gains(&[(2, 255)]),
        )?;

        assert_eq!(data.recon_gain_elements.len(), 2);
        assert_eq!(data.recon_gain_elements[0], ReconGainElement::default());
        assert_eq!(data.recon_gain_elements[1].recon_gain_flag, 0b100);
        assert_eq!(data.recon_gain_elements[1].recon_gain[2], 255);

        Ok(())
    }

    #[test]
    fn reconciliation_rejects_off_by_one_gain() {
        let frames = frames_for(300);
        let context = ReconGainContext {
            id_to_labeled_frame: &frames,
            id_to_labeled_decoded_frame: &frames,
            calculator: &UnityCalculator,
        };

        let err = generate_recon_gain_subblock(
            false,
            false,
            context,
            &mono_stereo_layer_info(),
            &declared_gains(&[(2, 254)]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("mismatch"));
    }

    #[test]
    fn reconciliation_rejects_wrong_flag() {
        let frames = frames_for(300);
        let context = ReconGainContext {
            id_to_labeled_frame: &frames,
            id_to_labeled_decoded_frame: &frames,
            calculator: &UnityCalculator,
        };

        let err = generate_recon_gain_subblock(
            false,
            false,
            context,
            &mono_stereo_layer_info(),
            &declared_gains(&[(0, 255)]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("flag"));
    }

    #[test]
    fn override_mode_skips_recomputation() -> Result<()> {
        let frames = IdLabeledFrameMap::new();
        let context = ReconGainContext {
            id_to_labeled_frame: &frames,
            id_to_labeled_decoded_frame: &frames,
            calculator: &FailingCalculator,
        };

        let data = generate_recon_gain_subblock(
            true,
            false,
            context,
            &mono_stereo_layer_info(),
            &declared_gains(&[(2, 200)]),
        )?;

        assert_eq!(data.recon_gain_elements[1].recon_gain[2], 200);

        Ok(())
    }

    #[test]
    fn missing_frames_rejected() {
        let frames = IdLabeledFrameMap::new();
        let context = ReconGainContext {
            id_to_labeled_frame: &frames,
            id_to_labeled_decoded_frame: &frames,
            calculator: &UnityCalculator,
        };

        let err = generate_recon_gain_subblock(
            false,
            false,
            context,
            &mono_stereo_layer_info(),
            &declared_gains(&[(2, 255)]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn layer_count_mismatch_rejected() {
        let frames = frames_for(300);
        let context = ReconGainContext {
            id_to_labeled_frame: &frames,
            id_to_labeled_decoded_frame: &frames,
            calculator: &UnityCalculator,
        };

        let metadata = ReconGainMetadata {
            recon_gains_for_layer: vec![BTreeMap::new()],
        };
        let err = generate_recon_gain_subblock(
            false,
            false,
            context,
            &mono_stereo_layer_info(),
            &metadata,
        )
        .unwrap_err();

        assert!(err.to_string().contains("2 layers"));
    }

    #[test]
    fn declared_bit_position_out_of_range_rejected() {
        let frames = frames_for(300);
        let context = ReconGainContext {
            id_to_labeled_frame: &frames,
            id_to_labeled_decoded_frame: &frames,
            calculator: &UnityCalculator,
        };

        let err = generate_recon_gain_subblock(
            false,
            false,
            context,
            &mono_stereo_layer_info(),
            &declared_gains(&[(12, 255)]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("12-bit"));
    }
}
