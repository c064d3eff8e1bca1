//! Load-cell millivolt to kilogram conversion.

use crate::error::InitError;
use crate::timing::{FULL_SCALE_KG, FULL_SCALE_MV};

/// Linear calibration through the origin: 0 mV -> 0 kg, full-scale mV -> full-scale kg.
///
/// kg = raw_mv * full_scale_kg / full_scale_mv, in integer arithmetic (floor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadCellCalibration {
    full_scale_mv: u32,
    full_scale_kg: u32,
}

impl Default for LoadCellCalibration {
    fn default() -> Self {
        Self {
            full_scale_mv: FULL_SCALE_MV,
            full_scale_kg: FULL_SCALE_KG,
        }
    }
}

impl LoadCellCalibration {
    pub fn new(full_scale_mv: u32, full_scale_kg: u32) -> Result<Self, InitError> {
        if full_scale_mv == 0 {
            return Err(InitError::InvalidConfig("full-scale millivolts must be > 0"));
        }
        Ok(Self {
            full_scale_mv,
            full_scale_kg,
        })
    }

    #[inline]
    pub fn to_kg(&self, raw_mv: u16) -> u32 {
        let kg = u64::from(raw_mv) * u64::from(self.full_scale_kg) / u64::from(self.full_scale_mv);
        kg.min(u64::from(u32::MAX)) as u32
    }
}
