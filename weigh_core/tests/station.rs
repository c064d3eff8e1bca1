//! End-to-end station runs on mocks with the real clock.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use weigh_core::mocks::{ByteInjector, ChannelSerial, FixedAnalog, RecordingOutput, ScriptedRange};
use weigh_core::{AdvisoryLevel, InitError, Station, StationCfg, StationHandle, WeighPhase};

struct Rig {
    handle: StationHandle,
    inject: ByteInjector,
    lines: Arc<Mutex<Vec<String>>>,
    barrier: RecordingOutput,
    leds: [RecordingOutput; 3],
}

/// Vehicle approaching at 10 m/s from 12 m, parking at 3 m.
fn approach() -> ScriptedRange {
    ScriptedRange::new((0..=9u16).map(|i| Some(1200 - 100 * i)))
}

fn rig(range: ScriptedRange, mv: [u16; 2]) -> Rig {
    let (tx, rx, inject, lines) = ChannelSerial::pair();
    let barrier = RecordingOutput::new("barrier");
    let leds = [
        RecordingOutput::new("led1"),
        RecordingOutput::new("led2"),
        RecordingOutput::new("led3"),
    ];
    let handle = Station::builder()
        .with_range_sensor(range)
        .with_analog_input(FixedAnalog::new([(1, mv[0]), (2, mv[1])]))
        .with_indicators(leds[0].clone(), leds[1].clone(), leds[2].clone())
        .with_barrier(barrier.clone())
        .with_serial(tx, rx)
        .with_config(StationCfg {
            load_cell_channels: [1, 2],
        })
        .build()
        .expect("build")
        .start()
        .expect("start");
    Rig {
        handle,
        inject,
        lines,
        barrier,
        leds,
    }
}

fn wait_for(what: &str, timeout: Duration, mut f: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !f() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn armed_station_weighs_stopped_vehicle_once() {
    let rig = rig(approach(), [1650, 1650]);
    assert!(rig.inject.send(b'O'));
    wait_for("report", Duration::from_secs(10), || {
        rig.lines.lock().unwrap().len() >= 2
    });
    assert_eq!(
        rig.lines.lock().unwrap()[..2],
        [
            "Peso: 20000kg\r\n".to_string(),
            "Velocidad maxima: 10.0m/s\r\n".to_string()
        ]
    );
    assert!(rig.barrier.is_high());

    // The vehicle is still parked: no second report.
    std::thread::sleep(Duration::from_millis(500));
    let st = rig.handle.status();
    assert_eq!(st.cycles_completed, 1);
    assert_eq!(rig.lines.lock().unwrap().len(), 2);
    assert_eq!(st.speed_mps, Some(0.0));
    assert_eq!(st.distance_cm, Some(300));
    assert_eq!(st.phase, WeighPhase::Idle);
    rig.handle.shutdown();
}

#[test]
fn advisory_follows_speed_and_clears_on_disarm() {
    let rig = rig(approach(), [0, 0]);
    assert!(rig.inject.send(b'O'));
    wait_for("high advisory", Duration::from_secs(5), || {
        rig.handle.status().advisory == Some(AdvisoryLevel::High)
    });
    assert!(rig.leds[2].is_high());
    wait_for("stopped advisory", Duration::from_secs(5), || {
        rig.handle.status().advisory == Some(AdvisoryLevel::Stopped)
    });
    assert!(rig.leds[0].is_high() && !rig.leds[2].is_high());

    // second 'O' disarms
    assert!(rig.inject.send(b'O'));
    wait_for("indicators off", Duration::from_secs(5), || {
        rig.handle.status().advisory.is_none()
    });
    assert!(rig.leds.iter().all(|l| !l.is_high()));
    let st = rig.handle.status();
    assert!(!st.armed);
    assert_eq!(st.speed_mps, None);
}

#[test]
fn commands_apply_inside_the_byte_callback() {
    let rig = rig(approach(), [0, 0]);
    assert!(rig.inject.is_attached());
    assert!(rig.inject.send(b'O'));
    assert!(rig.barrier.is_high());
    assert!(rig.handle.status().barrier_open);
    assert!(rig.inject.send(b'C'));
    assert!(rig.inject.send(b'X'));
    assert!(!rig.barrier.is_high());
    let st = rig.handle.status();
    assert!(!st.barrier_open);
    assert!(st.armed);
}

#[test]
fn disarmed_station_reports_nothing() {
    let rig = rig(ScriptedRange::new([Some(300)]), [1650, 1650]);
    std::thread::sleep(Duration::from_millis(400));
    let st = rig.handle.status();
    assert_eq!(st.distance_cm, None);
    assert_eq!(st.cycles_completed, 0);
    assert!(rig.lines.lock().unwrap().is_empty());
    assert!(rig.handle.tick_stats().delivered > 0);
}

#[test]
fn missing_serial_is_an_init_error() {
    let r = Station::builder()
        .with_range_sensor(approach())
        .with_analog_input(FixedAnalog::default())
        .with_indicators(
            RecordingOutput::new("a"),
            RecordingOutput::new("b"),
            RecordingOutput::new("c"),
        )
        .with_barrier(RecordingOutput::new("barrier"))
        .build();
    assert!(matches!(r, Err(InitError::MissingSerial)));
}
