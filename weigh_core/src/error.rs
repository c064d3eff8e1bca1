use thiserror::Error;

/// Transient read failure from the range sensor or a load-cell channel.
///
/// The owning task keeps its last good value and tries again next tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("sensor read timed out")]
    Timeout,
    #[error("sensor hardware error: {0}")]
    Hardware(String),
}

/// Startup failure. Nothing has been spawned when one of these is returned.
#[derive(Debug, Error, Clone)]
pub enum InitError {
    #[error("missing range sensor")]
    MissingRangeSensor,
    #[error("missing analog input")]
    MissingAnalogInput,
    #[error("missing advisory indicators")]
    MissingIndicators,
    #[error("missing barrier output")]
    MissingBarrier,
    #[error("missing serial link")]
    MissingSerial,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("failed to drive initial output state: {0}")]
    Output(String),
    #[error("failed to spawn task: {0}")]
    Spawn(String),
    #[error("failed to attach serial receiver: {0}")]
    Serial(String),
}

/// Runtime failure of a station task driving its outputs.
#[derive(Debug, Error, Clone)]
pub enum StationError {
    #[error("serial error: {0}")]
    Serial(String),
    #[error("output error: {0}")]
    Output(String),
}
