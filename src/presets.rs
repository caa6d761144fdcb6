//! Stage lists used by encrypted account backups.

use crate::types::SequentialDelayStage;

const DAY: u64 = 86_400;

fn stage(delay: u64, reset_timer: bool, batch_size: u64) -> SequentialDelayStage {
    SequentialDelayStage::new(delay)
        .with_reset_timer(reset_timer)
        .with_batch_size(batch_size)
}

/// Rate limit for hardening a 6-digit PIN.
///
/// One setup query, then 20 guesses spread over four days: 10 on the first day
/// (5 within 10s, 5 more over roughly 45 minutes), then 5, 3 and 2 on the following
/// days. Every later attempt is denied.
#[must_use]
pub fn pin_hardening() -> Vec<SequentialDelayStage> {
    vec![
        // setup
        stage(0, true, 1),
        // day 1
        stage(0, true, 3),
        stage(10, true, 2),
        stage(30, false, 1),
        stage(60, false, 1),
        stage(300, false, 1),
        stage(900, false, 1),
        stage(1800, true, 1),
        // day 2
        stage(DAY, true, 2),
        stage(10, false, 1),
        stage(30, false, 1),
        stage(60, true, 1),
        // day 3
        stage(DAY, true, 1),
        stage(10, false, 1),
        stage(30, true, 1),
        // day 4
        stage(DAY, true, 1),
        stage(10, false, 1),
    ]
}

/// Rate limit for hardening a password.
///
/// One setup query and 5 immediate attempts, then batches of two attempts every 5s,
/// 30s, 5min, 1h and 1 day, 20 attempts per tier.
#[must_use]
pub fn password_hardening() -> Vec<SequentialDelayStage> {
    let mut stages = vec![stage(0, true, 1), stage(0, true, 5)];
    stages.extend(
        [5, 30, 300, 3_600, DAY]
            .into_iter()
            .map(|delay| stage(delay, true, 2).with_repetitions(10)),
    );
    stages
}

/// Effectively unlimited quota, for end-to-end tests only.
#[must_use]
pub fn e2e_testing() -> Vec<SequentialDelayStage> {
    vec![stage(0, true, 1_000_000_000).with_repetitions(1_000_000_000)]
}

/// No quota at all, for end-to-end tests only.
#[must_use]
pub fn no_quota() -> Vec<SequentialDelayStage> {
    vec![stage(0, true, 0).with_repetitions(0)]
}
