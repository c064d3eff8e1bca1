//! Runtime configuration consumed by the station.
//!
//! Separate from the TOML schema in `weigh_config`; see `conversions` for the bridge.

use crate::error::InitError;

/// Load-cell wiring. Calibration and timing are fixed constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationCfg {
    /// ADC channels read in order on every weighing tick.
    pub load_cell_channels: [u8; 2],
}

impl Default for StationCfg {
    fn default() -> Self {
        Self {
            load_cell_channels: [1, 2],
        }
    }
}

impl StationCfg {
    pub fn validate(&self) -> Result<(), InitError> {
        let [a, b] = self.load_cell_channels;
        if a == b {
            return Err(InitError::InvalidConfig(
                "load-cell channels must be distinct",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_channels_rejected() {
        let cfg = StationCfg {
            load_cell_channels: [3, 3],
        };
        assert!(matches!(cfg.validate(), Err(InitError::InvalidConfig(_))));
        assert!(StationCfg::default().validate().is_ok());
    }
}
