#![no_main]

use libfuzzer_sys::fuzz_target;
use odis_domains::{
    check_sequential_delay_rate_limit, SequentialDelayDomain, SequentialDelayStage,
    SequentialDelayState,
};

fn u64_at(data: &[u8], i: usize) -> u64 {
    let mut buf = [0u8; 8];
    if let Some(chunk) = data.get(i * 8..i * 8 + 8) {
        buf.copy_from_slice(chunk);
    }
    u64::from_le_bytes(buf)
}

fuzz_target!(|data: &[u8]| {
    // header: timer, counter, attempt time; then 4 words per stage
    if data.len() < 3 * 8 + 4 * 8 {
        return;
    }
    let state = SequentialDelayState {
        timer: u64_at(data, 0) as i64,
        counter: u64_at(data, 1),
        disabled: false,
    };
    let t = u64_at(data, 2) as i64;
    let stages: Vec<_> = (0..(data.len() / 8 - 3) / 4)
        .map(|s| {
            let w = |k| u64_at(data, 3 + s * 4 + k);
            let flags = w(3);
            SequentialDelayStage {
                delay: w(0),
                reset_timer: (flags & 1 == 1).then_some(flags & 2 == 2),
                batch_size: (flags & 4 == 4).then(|| w(1)),
                repetitions: (flags & 8 == 8).then(|| w(2)),
            }
        })
        .collect();
    let Ok(domain) = SequentialDelayDomain::new(stages, None, None) else {
        return;
    };

    let r = check_sequential_delay_rate_limit(&domain, t, Some(&state));
    if r.accepted {
        assert_eq!(r.state.counter, state.counter + 1);
    } else {
        assert_eq!(r.state, state);
        if let Some(nb) = r.not_before {
            assert!(nb > t);
        }
    }
});
