//! Timing collaborator seam.
//!
//! Parameter block timestamps come from a timing module owned by the
//! surrounding encoder pipeline. The generator only asks it for the next
//! `[start, end)` pair per parameter ID; contiguity and monotonicity are the
//! implementor's responsibility.

use anyhow::Result;

/// Source of per-parameter-ID block timestamps.
pub trait GlobalTiming {
    /// Returns the `[start, end)` timestamps of the next parameter block for
    /// `parameter_id`, spanning `duration` ticks at the parameter rate.
    ///
    /// `start_hint` is the start timestamp declared by the metadata;
    /// implementors are expected to fail when it is inconsistent with the
    /// timeline they track.
    fn next_parameter_block_timestamps(
        &mut self,
        parameter_id: u32,
        start_hint: i64,
        duration: u32,
    ) -> Result<(i64, i64)>;
}
