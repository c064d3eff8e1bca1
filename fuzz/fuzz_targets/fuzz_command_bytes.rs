#![no_main]
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use weigh_core::CommandChannel;
use weigh_core::mocks::RecordingOutput;
use weigh_core::shared::Shared;

// Any operator byte stream keeps the barrier output equal to the barrier flag.
fuzz_target!(|data: &[u8]| {
    let log = RecordingOutput::shared_log();
    let barrier = RecordingOutput::named("barrier", &log);
    let observed = barrier.clone();
    let shared = Arc::new(Shared::new());
    let mut channel = CommandChannel::new(barrier, shared.clone());
    for &b in data {
        let _ = channel.on_byte(b);
        let state = shared.state.snapshot();
        assert_eq!(observed.is_high(), state.barrier_open);
    }
});
