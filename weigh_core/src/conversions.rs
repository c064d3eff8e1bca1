//! `From` implementations bridging `weigh_config` types to `weigh_core` types.

use crate::config::StationCfg;

impl From<&weigh_config::Channels> for StationCfg {
    fn from(c: &weigh_config::Channels) -> Self {
        Self {
            load_cell_channels: [c.load_cell_1, c.load_cell_2],
        }
    }
}

impl From<&weigh_config::Config> for StationCfg {
    fn from(c: &weigh_config::Config) -> Self {
        Self::from(&c.channels)
    }
}
