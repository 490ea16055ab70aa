//! Audio elements with scalable channel layouts.
//!
//! An audio element groups coded substreams into an ordered sequence of
//! channel layers. Each layer is decodable on its own or combined with the
//! layers below it; later layers are channel supersets of earlier ones.

use anyhow::{Result, anyhow};

use crate::structs::channel::ChannelNumbers;
use crate::utils::errors::LayoutError;

/// Loudspeaker layout of one channel layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoudspeakerLayout {
    Mono,
    Stereo,
    S3_1_2,
    S5_1,
    S5_1_2,
    S5_1_4,
    S7_1,
    S7_1_2,
    S7_1_4,
    Binaural,
}

impl LoudspeakerLayout {
    pub fn channel_numbers(self) -> ChannelNumbers {
        use LoudspeakerLayout::*;

        match self {
            Mono => ChannelNumbers::new(1, 0, false),
            Stereo | Binaural => ChannelNumbers::new(2, 0, false),
            S3_1_2 => ChannelNumbers::new(3, 2, true),
            S5_1 => ChannelNumbers::new(5, 0, true),
            S5_1_2 => ChannelNumbers::new(5, 2, true),
            S5_1_4 => ChannelNumbers::new(5, 4, true),
            S7_1 => ChannelNumbers::new(7, 0, true),
            S7_1_2 => ChannelNumbers::new(7, 2, true),
            S7_1_4 => ChannelNumbers::new(7, 4, true),
        }
    }
}

/// Configuration of one channel layer within a scalable layout.
#[derive(Debug, Clone)]
pub struct ChannelAudioLayerConfig {
    pub loudspeaker_layout: LoudspeakerLayout,
    pub output_gain_is_present_flag: bool,
    pub recon_gain_is_present_flag: bool,
    pub substream_count: u8,
    pub coupled_substream_count: u8,
}

#[derive(Debug, Clone, Default)]
pub struct ScalableChannelLayoutConfig {
    pub channel_audio_layer_configs: Vec<ChannelAudioLayerConfig>,
}

impl ScalableChannelLayoutConfig {
    pub fn num_layers(&self) -> u8 {
        self.channel_audio_layer_configs.len() as u8
    }
}

/// One audio element and its layer-by-layer channel counts.
#[derive(Debug, Clone)]
pub struct AudioElement {
    pub audio_element_id: u32,
    pub codec_config_id: u32,
    pub audio_substream_ids: Vec<u32>,
    pub config: ScalableChannelLayoutConfig,
    pub channel_numbers_for_layers: Vec<ChannelNumbers>,
}

impl AudioElement {
    /// Builds a scalable audio element, deriving the channel counts of each
    /// layer from its loudspeaker layout.
    ///
    /// Fails if a later layer carries fewer channels of any kind than an
    /// earlier one.
    pub fn new_scalable(
        audio_element_id: u32,
        codec_config_id: u32,
        audio_substream_ids: Vec<u32>,
        config: ScalableChannelLayoutConfig,
    ) -> Result<Self> {
        let mut channel_numbers_for_layers =
            Vec::with_capacity(config.channel_audio_layer_configs.len());
        let mut accumulated = ChannelNumbers::default();

        for (layer, layer_config) in config.channel_audio_layer_configs.iter().enumerate() {
            let current = layer_config.loudspeaker_layout.channel_numbers();

            if !accumulated.is_subset_of(&current) {
                return Err(anyhow!(LayoutError::NonMonotonicLayers {
                    layer,
                    current,
                    previous: accumulated,
                }));
            }

            channel_numbers_for_layers.push(current);
            accumulated = current;
        }

        Ok(Self {
            audio_element_id,
            codec_config_id,
            audio_substream_ids,
            config,
            channel_numbers_for_layers,
        })
    }

    pub fn num_layers(&self) -> u8 {
        self.config.num_layers()
    }
}
