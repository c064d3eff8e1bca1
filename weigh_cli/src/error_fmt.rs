//! Human-readable error descriptions, exit codes and structured JSON errors.

use std::fmt;
use std::path::PathBuf;

use weigh_core::error::{InitError, SensorError, StationError};

/// Exit code for configuration errors (unreadable, unparsable or invalid file).
pub const EXIT_CONFIG: i32 = 3;
/// Exit code for station initialization failures.
pub const EXIT_INIT: i32 = 4;

/// Context attached to every config loading failure so it can be told apart
/// from runtime errors.
#[derive(Debug)]
pub struct ConfigContext(pub Option<PathBuf>);

impl fmt::Display for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(p) => write!(f, "invalid configuration in {}", p.display()),
            None => write!(f, "invalid built-in configuration"),
        }
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if err.downcast_ref::<ConfigContext>().is_some() {
        let detail = err
            .chain()
            .skip(1)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ");
        return format!(
            "What happened: {err} ({detail}).\nLikely causes: Missing file, TOML syntax error, unknown key, or an out-of-range value.\nHow to fix: Edit the config file and rerun; every section is optional and falls back to defaults."
        );
    }

    if let Some(ie) = err.downcast_ref::<InitError>() {
        return match ie {
            InitError::MissingRangeSensor
            | InitError::MissingAnalogInput
            | InitError::MissingIndicators
            | InitError::MissingBarrier
            | InitError::MissingSerial => format!(
                "What happened: Station could not start ({ie}).\nLikely causes: A device failed to initialize and was not passed to the station builder.\nHow to fix: Check the earlier log lines for the failing device."
            ),
            InitError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Conflicting values in [channels] or [pins].\nHow to fix: Edit the config file, then rerun."
            ),
            InitError::Output(msg) => format!(
                "What happened: Could not drive the initial output state ({msg}).\nLikely causes: Wrong pin numbers or missing GPIO permissions.\nHow to fix: Check [pins] in the config and that the process may access GPIO."
            ),
            InitError::Spawn(msg) => format!(
                "What happened: A station task could not be started ({msg}).\nLikely causes: Thread limit reached or out of memory.\nHow to fix: Free system resources and rerun."
            ),
            InitError::Serial(msg) => format!(
                "What happened: The operator serial link could not be started ({msg}).\nLikely causes: The input stream was already claimed or could not spawn its reader.\nHow to fix: Check that stdin is available to the process and rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SensorError>() {
        return match se {
            SensorError::Timeout => "What happened: Sensor read timed out.\nLikely causes: HC-SR04 not wired correctly, no power, or nothing in range.\nHow to fix: Verify trigger/echo pins and power, and consider raising hardware.sensor_read_timeout_ms.".to_string(),
            SensorError::Hardware(msg) => format!(
                "What happened: Sensor hardware error ({msg}).\nLikely causes: Wiring or driver fault.\nHow to fix: Re-run with --log-level=debug for details."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<StationError>() {
        return format!(
            "What happened: {se}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 config, 4 init, 1 anything else. Usage errors exit 2 from clap.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigContext>().is_some() {
        return EXIT_CONFIG;
    }
    if err.downcast_ref::<InitError>().is_some() {
        return EXIT_INIT;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<ConfigContext>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<InitError>() {
        Some(
            InitError::MissingRangeSensor
            | InitError::MissingAnalogInput
            | InitError::MissingIndicators
            | InitError::MissingBarrier
            | InitError::MissingSerial,
        ) => "MissingDevice",
        Some(InitError::InvalidConfig(_)) => "InvalidConfig",
        Some(InitError::Output(_)) => "Output",
        Some(InitError::Spawn(_)) => "Spawn",
        Some(InitError::Serial(_)) => "Serial",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
