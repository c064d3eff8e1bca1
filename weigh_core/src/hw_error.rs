//! Maps `Box<dyn Error>` from the driver traits to a typed `SensorError`.
//!
//! The traits in `weigh_traits` use `Box<dyn Error + Send + Sync>`; this module
//! narrows those to our enum, with a feature-gated path that downcasts
//! `weigh_hardware::HwError` precisely.

use crate::error::SensorError;

/// Map a driver-boundary error to a typed `SensorError`.
///
/// Known hardware error types are downcast first, then string heuristics apply.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SensorError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<weigh_hardware::error::HwError>() {
            return match hw {
                weigh_hardware::error::HwError::Timeout => SensorError::Timeout,
                weigh_hardware::error::HwError::EchoTimeout => SensorError::Timeout,
                other => SensorError::Hardware(other.to_string()),
            };
        }
    }

    if let Some(se) = e.downcast_ref::<SensorError>() {
        return se.clone();
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        SensorError::Timeout
    } else {
        SensorError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e = std::io::Error::other("adc conversion timeout");
        assert_eq!(map_hw_error(&e), SensorError::Timeout);
    }

    #[test]
    fn other_text_is_kept() {
        let e = std::io::Error::other("bus fault");
        assert_eq!(map_hw_error(&e), SensorError::Hardware("bus fault".into()));
    }

    #[test]
    fn typed_sensor_error_passes_through() {
        let boxed: Box<dyn std::error::Error + Send + Sync> =
            Box::new(SensorError::Hardware("echo lost".into()));
        assert_eq!(
            map_hw_error(boxed.as_ref()),
            SensorError::Hardware("echo lost".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_timeout_downcasts() {
        let boxed: Box<dyn std::error::Error + Send + Sync> =
            Box::new(weigh_hardware::error::HwError::EchoTimeout);
        assert_eq!(map_hw_error(boxed.as_ref()), SensorError::Timeout);
    }
}
