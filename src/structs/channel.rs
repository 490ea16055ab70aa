//! Channel labels and per-layer channel counts.
//!
//! A scalable audio element is an ordered sequence of channel layers of
//! increasing channel count. Channels absent from a lower layer are
//! reconstructed at decode time by demixing from a higher layer; each such
//! synthesized channel is identified by a demixed [`ChannelLabel`] and owns
//! one position in the 12-bit recon gain layout.

use std::fmt::Display;

/// Channel count summary for one layer: surround channels, height channels
/// and LFE presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelNumbers {
    pub surround: u32,
    pub height: u32,
    pub lfe: bool,
}

impl ChannelNumbers {
    pub const fn new(surround: u32, height: u32, lfe: bool) -> Self {
        Self {
            surround,
            height,
            lfe,
        }
    }

    /// `other` carries at least as many channels of every kind as `self`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.surround <= other.surround && self.height <= other.height && (!self.lfe || other.lfe)
    }
}

impl Display for ChannelNumbers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.surround,
            if self.lfe { 1 } else { 0 },
            self.height
        )
    }
}

/// Label of one channel in a labeled sample map or a demixing topology.
///
/// Plain variants name channels as carried by a layer; `Demixed*` variants
/// name channels synthesized by upmixing between two layers.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLabel {
    Mono,
    L2,
    R2,
    Centre,
    LFE,
    L3,
    R3,
    Ltf3,
    Rtf3,
    L5,
    R5,
    Ls5,
    Rs5,
    L7,
    R7,
    Lss7,
    Rss7,
    Lrs7,
    Rrs7,
    Ltf2,
    Rtf2,
    Ltf4,
    Rtf4,
    Ltb4,
    Rtb4,

    DemixedR2,
    DemixedL3,
    DemixedR3,
    DemixedL5,
    DemixedR5,
    DemixedLs5,
    DemixedRs5,
    DemixedL7,
    DemixedR7,
    DemixedLrs7,
    DemixedRrs7,
    DemixedLtf2,
    DemixedRtf2,
    DemixedLtb4,
    DemixedRtb4,
}

impl ChannelLabel {
    /// Position of a demixed channel in the 12-bit recon gain layout.
    ///
    /// Bit 1 (centre) and bit 11 (LFE) are reserved: those channels are
    /// never demixed, so no label maps to them. Labels that are not demixed
    /// channels have no position at all.
    pub fn recon_gain_bit_position(self) -> Option<u8> {
        use ChannelLabel::*;

        Some(match self {
            // L2 is never demixed.
            DemixedL7 | DemixedL5 | DemixedL3 => 0,
            // Centre is never demixed, bit 1 stays clear.
            DemixedR7 | DemixedR5 | DemixedR3 | DemixedR2 => 2,
            DemixedLs5 => 3,
            DemixedRs5 => 4,
            DemixedLtf2 => 5,
            DemixedRtf2 => 6,
            DemixedLrs7 => 7,
            DemixedRrs7 => 8,
            DemixedLtb4 => 9,
            // LFE is never demixed, bit 11 stays clear.
            DemixedRtb4 => 10,
            _ => return None,
        })
    }
}

impl Display for ChannelLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
