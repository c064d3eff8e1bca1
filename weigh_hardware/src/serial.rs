//! Byte-stream serial link over any `Read`/`Write` pair (stdin/stdout on the host).

use std::io::{Read, Write};
use std::thread::JoinHandle;

use weigh_traits::{ByteSink, HwResult, SerialRx, SerialTx};

use crate::error::HwError;

/// Receive half over any byte reader. On `attach` a detached reader thread
/// reads one byte at a time and calls the sink for each; it ends at EOF or
/// on a read error.
pub struct ReaderRx {
    reader: Option<Box<dyn Read + Send>>,
}

impl ReaderRx {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Some(Box::new(reader)),
        }
    }

    /// Stdin-backed receiver.
    pub fn stdin() -> Self {
        Self::new(std::io::stdin())
    }

    /// Spawn the reader thread, delivering every byte straight to `sink`.
    pub fn spawn_with<R, F>(mut reader: R, mut sink: F) -> Result<JoinHandle<()>, HwError>
    where
        R: Read + Send + 'static,
        F: FnMut(u8) + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name("serial-rx".into())
            .spawn(move || {
                let mut byte = [0u8; 1];
                loop {
                    match reader.read(&mut byte) {
                        Ok(0) => {
                            tracing::debug!("serial input closed");
                            break;
                        }
                        Ok(_) => sink(byte[0]),
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "serial read failed");
                            break;
                        }
                    }
                }
            })?;
        Ok(handle)
    }
}

impl SerialRx for ReaderRx {
    fn attach(&mut self, sink: ByteSink) -> HwResult<()> {
        let reader = self.reader.take().ok_or(HwError::SerialClosed)?;
        // The reader thread is detached.
        drop(Self::spawn_with(reader, sink)?);
        Ok(())
    }
}

/// Transmit half; each line is written and flushed as-is.
pub struct WriterTx<W> {
    out: W,
    baud_rate: u32,
}

impl<W: Write> WriterTx<W> {
    pub fn new(out: W, baud_rate: u32) -> Self {
        Self { out, baud_rate }
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl WriterTx<std::io::Stdout> {
    pub fn stdout(baud_rate: u32) -> Self {
        Self::new(std::io::stdout(), baud_rate)
    }
}

impl<W: Write> SerialTx for WriterTx<W> {
    fn send_line(&mut self, text: &str) -> HwResult<()> {
        self.out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(HwError::from)?;
        Ok(())
    }
}
