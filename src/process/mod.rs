use std::collections::HashMap;

use crate::structs::channel::ChannelLabel;

/// Parameter block generation.
///
/// Provides the [`ParameterBlockGenerator`](generate::ParameterBlockGenerator)
/// for turning queued metadata into
/// [`ParameterBlockWithData`](crate::structs::parameter_block::ParameterBlockWithData)
/// records, one parameter type at a time.
pub mod generate;

/// Channel-layer demixing topology resolution.
///
/// Provides [`find_demixed_channels`](demix::find_demixed_channels) for
/// determining which channels are synthesized by upmixing between two
/// successive channel layers.
pub mod demix;

/// Recon gain computation, packing and cross-validation.
///
/// Provides [`generate_recon_gain_subblock`](recon_gain::generate_recon_gain_subblock)
/// and the [`ReconGainCalculator`](recon_gain::ReconGainCalculator) seam for
/// the sample-domain gain ratio computation.
pub mod recon_gain;

/// Audio samples of one frame, keyed by channel label.
pub type LabelSamplesMap = HashMap<ChannelLabel, Vec<i32>>;

/// Labeled frames keyed by audio element ID.
pub type IdLabeledFrameMap = HashMap<u32, LabelSamplesMap>;
