//! Serial report of a completed weighing.

use crossbeam_channel as xch;
use weigh_traits::SerialTx;

use crate::error::StationError;
use crate::weighing::WeighResult;

/// The two report lines, CRLF-terminated, in transmission order.
pub fn format_report(result: &WeighResult) -> [String; 2] {
    [
        format!("Peso: {}kg\r\n", result.weight_kg),
        format!("Velocidad maxima: {:.1}m/s\r\n", result.max_speed_mps),
    ]
}

/// Transmit both lines of a report; stops at the first failed line.
pub fn send_report<T: SerialTx + ?Sized>(tx: &mut T, result: &WeighResult) -> Result<(), StationError> {
    for line in format_report(result) {
        tx.send_line(&line)
            .map_err(|e| StationError::Serial(e.to_string()))?;
    }
    Ok(())
}

/// Reporter task body: drain results until every sender is gone.
pub(crate) fn run<T: SerialTx>(mut tx: T, results: xch::Receiver<WeighResult>) {
    for result in results.iter() {
        if let Err(e) = send_report(&mut tx, &result) {
            tracing::error!(error = %e, weight_kg = result.weight_kg, "failed to transmit report");
        }
    }
    tracing::trace!("reporter task exiting");
}
