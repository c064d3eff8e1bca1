use rstest::rstest;
use weigh_config::{Config, load_file, load_toml};

const FULL: &str = r#"
[pins]
trigger = 2
echo = 3
barrier = 10
led_stopped = 11
led_moderate = 5
led_high = 4

[channels]
load_cell_1 = 1
load_cell_2 = 2

[serial]
baud_rate = 9600

[hardware]
sensor_read_timeout_ms = 60

[logging]
level = "debug"
rotation = "daily"

[simulation]
start_cm = 1500
stop_cm = 250
approach_speed_mps = 6.5
load_cell_mv = [1000, 2000]
range_fail_every = 7
"#;

#[test]
fn accepts_fully_specified_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.simulation.load_cell_mv, [1000, 2000]);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[test]
fn partial_sections_fill_defaults() {
    let cfg = load_toml("[pins]\nbarrier = 20\n").expect("parse TOML");
    assert_eq!(cfg.pins.barrier, 20);
    assert_eq!(cfg.pins.echo, Config::default().pins.echo);
    cfg.validate().expect("valid");
}

#[rstest]
#[case("[pins]\nbarrier = 11\n", "pins.barrier and pins.led_stopped")]
#[case("[channels]\nload_cell_2 = 1\n", "channels.load_cell_1 and channels.load_cell_2 must be distinct")]
#[case("[serial]\nbaud_rate = 0\n", "serial.baud_rate must be > 0")]
#[case("[hardware]\nsensor_read_timeout_ms = 0\n", "hardware.sensor_read_timeout_ms must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
#[case("[simulation]\nstart_cm = 300\nstop_cm = 300\n", "simulation.stop_cm must be < simulation.start_cm")]
#[case("[simulation]\napproach_speed_mps = 0.0\n", "simulation.approach_speed_mps must be > 0")]
#[case("[simulation]\nload_cell_mv = [3301, 0]\n", "simulation.load_cell_mv values must be <= 3300")]
fn rejects_invalid_values(#[case] toml: &str, #[case] msg: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(msg), "unexpected error: {err}");
}

#[test]
fn load_file_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("station.toml");
    std::fs::write(&path, "[serial]\nbaud_rate = 0\n").unwrap();
    let err = load_file(&path).expect_err("invalid baud rate");
    assert!(format!("{err:#}").contains("serial.baud_rate"));

    std::fs::write(&path, FULL).unwrap();
    assert!(load_file(&path).is_ok());
}

#[test]
fn load_file_reports_missing_path() {
    let err = load_file(std::path::Path::new("/definitely/not/here.toml")).expect_err("missing");
    assert!(format!("{err}").contains("reading config"));
}
