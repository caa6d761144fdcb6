use crate::types::{
    SequentialDelayDomain, SequentialDelayResult, SequentialDelayStage, SequentialDelayState,
};

/// Stage covering `counter`, with the counter value at which that stage starts.
fn current_stage(
    domain: &SequentialDelayDomain,
    counter: u64,
) -> Option<(&SequentialDelayStage, u64)> {
    let mut start = 0u64;
    for stage in domain.stages() {
        let end = start.saturating_add(stage.attempts());
        if counter < end {
            return Some((stage, start));
        }
        start = end;
    }
    None
}

fn reject(not_before: Option<i64>, state: SequentialDelayState) -> SequentialDelayResult {
    SequentialDelayResult {
        accepted: false,
        not_before,
        state,
    }
}

/// Decide whether an attempt at `attempt_time` is admitted under `domain`.
///
/// Absent `state` is the zero state. Rejections return the input state untouched;
/// `not_before` is only reported when waiting would help, so a disabled or exhausted
/// domain rejects without one.
#[must_use]
pub fn check_sequential_delay_rate_limit(
    domain: &SequentialDelayDomain,
    attempt_time: i64,
    state: Option<&SequentialDelayState>,
) -> SequentialDelayResult {
    let state = state.copied().unwrap_or_default();
    if state.disabled {
        return reject(None, state);
    }
    let SequentialDelayState { timer, counter, .. } = state;

    let Some((stage, start)) = current_stage(domain, counter) else {
        return reject(None, state);
    };

    // Only the first attempt of each batch pays the stage delay.
    let opens_batch = matches!(
        (counter - start).checked_rem(stage.batch_size_or_default()),
        Some(0)
    );
    let delay = if opens_batch {
        i64::try_from(stage.delay).unwrap_or(i64::MAX)
    } else {
        0
    };

    let not_before = timer.saturating_add(delay);
    if attempt_time < not_before {
        return reject(Some(not_before), state);
    }

    SequentialDelayResult {
        accepted: true,
        not_before: None,
        state: SequentialDelayState {
            timer: if stage.reset_timer_or_default() {
                attempt_time
            } else {
                not_before
            },
            counter: counter + 1,
            disabled: false,
        },
    }
}

/// Attempts left before `domain` is exhausted, ignoring delays. Zero once disabled.
#[must_use]
pub fn remaining_quota(
    domain: &SequentialDelayDomain,
    state: Option<&SequentialDelayState>,
) -> u64 {
    match state {
        Some(s) if s.disabled => 0,
        Some(s) => domain.total_quota().saturating_sub(s.counter),
        None => domain.total_quota(),
    }
}
