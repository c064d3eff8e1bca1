use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("sensor timeout")]
    Timeout,
    #[error("hc-sr04 echo timeout")]
    EchoTimeout,
    #[error("no such analog channel: {0}")]
    NoSuchChannel(u8),
    #[error("serial link closed")]
    SerialClosed,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
