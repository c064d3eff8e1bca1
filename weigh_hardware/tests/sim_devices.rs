use rstest::rstest;
use weigh_hardware::error::HwError;
use weigh_hardware::{SimulatedLoadCells, SimulatedOutput, SimulatedRangeSensor, WriterTx};
use weigh_traits::{AnalogInput, DigitalOutput, RangeSensor, SerialTx};

#[rstest]
#[case(1200, 300, 10.0, 100)]
#[case(1000, 200, 4.0, 40)]
#[case(600, 0, 0.5, 5)]
fn approach_moves_one_step_per_read(
    #[case] start: u16,
    #[case] stop: u16,
    #[case] speed: f32,
    #[case] step: u16,
) {
    let mut s = SimulatedRangeSensor::new(start, stop, speed);
    let a = s.read_distance_cm().unwrap();
    let b = s.read_distance_cm().unwrap();
    assert_eq!(a, start);
    assert_eq!(a - b, step);
}

#[test]
fn approach_ends_parked() {
    let mut s = SimulatedRangeSensor::new(1200, 300, 10.0);
    let last = (0..50).map(|_| s.read_distance_cm().unwrap()).last().unwrap();
    assert_eq!(last, 300);
    assert_eq!(s.position_cm(), 300);
}

#[test]
fn load_cell_errors_are_typed() {
    let mut cells = SimulatedLoadCells::new([(1, 100), (2, 200)]);
    let err = cells.read_channel(3).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HwError>(),
        Some(HwError::NoSuchChannel(3))
    ));
}

#[test]
fn outputs_track_level() {
    let mut led = SimulatedOutput::new("led1");
    led.set_level(true).unwrap();
    assert!(led.is_high());
    led.set_level(false).unwrap();
    assert!(!led.is_high());
    assert_eq!(led.name(), "led1");
}

struct BrokenPipe;

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn writer_surfaces_io_errors() {
    let mut tx = WriterTx::new(BrokenPipe, 9600);
    let err = tx.send_line("Peso: 0kg\r\n").unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Io(_))));
}
