//! Channel-layer demixing topology resolution.
//!
//! Determines which channel labels are synthesized by upmixing between two
//! successive channel layers and therefore require a reconstruction gain.
//! The base layer never demixes; this resolver is only consulted for layers
//! above it.

use anyhow::{Result, anyhow};

use crate::structs::channel::{ChannelLabel, ChannelNumbers};
use crate::utils::errors::DemixError;

/// Returns the ordered demixed channel labels introduced by stepping from
/// the channels accumulated over lower layers to `layer_channels`.
///
/// Order follows the fixed recon gain bit layout. Surround counts above 7
/// are unsupported.
pub fn find_demixed_channels(
    accumulated_channels: ChannelNumbers,
    layer_channels: ChannelNumbers,
) -> Result<Vec<ChannelLabel>> {
    use ChannelLabel::*;

    let mut labels = Vec::new();

    for surround in accumulated_channels.surround + 1..=layer_channels.surround {
        match surround {
            2 => {
                // Only a mono lower layer demixes the right channel of a
                // stereo layer.
                if accumulated_channels.surround == 1 {
                    labels.push(DemixedR2);
                }
            }
            3 => labels.extend([DemixedL3, DemixedR3]),
            5 => labels.extend([DemixedLs5, DemixedRs5]),
            7 => labels.extend([DemixedL7, DemixedR7, DemixedLrs7, DemixedRrs7]),
            _ => {
                if surround > 7 {
                    return Err(anyhow!(DemixError::UnsupportedSurround(surround)));
                }
            }
        }
    }

    if accumulated_channels.height == 2 {
        if layer_channels.height == 4 {
            labels.extend([DemixedLtb4, DemixedRtb4]);
        } else if layer_channels.height == 2
            && accumulated_channels.surround == 3
            && layer_channels.surround > 3
        {
            labels.extend([DemixedLtf2, DemixedRtf2]);
        }
    }

    Ok(labels)
}
