//! Checked narrowing conversions to bitstream-native widths.

use anyhow::{Result, anyhow};

use crate::utils::errors::NumericError;

pub fn i32_to_i16(field: &'static str, value: i32) -> Result<i16> {
    i16::try_from(value).map_err(|_| anyhow!(NumericError::OutOfRangeI16 { field, value }))
}

pub fn u32_to_u8(field: &'static str, value: u32) -> Result<u8> {
    u8::try_from(value).map_err(|_| anyhow!(NumericError::OutOfRangeU8 { field, value }))
}
