//! Combining quota state reported by several signers, and request nonce checks.

use tracing::{debug, warn};

use crate::errors::DomainError;
use crate::types::{SequentialDelayDomain, SequentialDelayDomainOptions, SequentialDelayState};

/// Quota state that `threshold` of `num_signers` signers would all agree to serve.
///
/// When too many signers report the domain disabled for a threshold to remain, the
/// aggregate is the disabled state. Otherwise disabled reports are dropped, the
/// counter is the `threshold`-th smallest counter, and the timer is the
/// `threshold`-th smallest timer among states whose counter does not exceed it.
pub fn find_threshold_domain_state(
    states: &[SequentialDelayState],
    threshold: usize,
    num_signers: usize,
) -> Result<SequentialDelayState, DomainError> {
    let insufficient = |responses| DomainError::InsufficientSignerResponses {
        responses,
        threshold,
    };
    if states.len() < threshold {
        return Err(insufficient(states.len()));
    }

    let num_disabled = states.iter().filter(|s| s.disabled).count();
    if num_disabled > 0 && num_disabled < states.len() {
        warn!(
            num_disabled,
            responses = states.len(),
            "inconsistent domain disabled state across signers"
        );
    }
    if num_signers.saturating_sub(num_disabled) < threshold {
        return Ok(SequentialDelayState {
            timer: 0,
            counter: 0,
            disabled: true,
        });
    }

    let mut enabled: Vec<SequentialDelayState> =
        states.iter().filter(|s| !s.disabled).copied().collect();
    let nth = threshold.checked_sub(1);

    enabled.sort_by_key(|s| s.counter);
    let counter = nth
        .and_then(|i| enabled.get(i))
        .map(|s| s.counter)
        .ok_or_else(|| insufficient(enabled.len()))?;

    enabled.retain(|s| s.counter <= counter);
    enabled.sort_by_key(|s| s.timer);
    let timer = nth
        .and_then(|i| enabled.get(i))
        .map(|s| s.timer)
        .ok_or_else(|| insufficient(enabled.len()))?;

    debug!(counter, timer, threshold, "combined signer quota state");
    Ok(SequentialDelayState {
        timer,
        counter,
        disabled: false,
    })
}

/// Replay protection for authenticated domains.
///
/// A domain without an `address` is not signed by anyone and needs no nonce. Otherwise
/// the request must carry a nonce no smaller than the number of requests already served.
#[must_use]
pub fn check_nonce(
    domain: &SequentialDelayDomain,
    options: &SequentialDelayDomainOptions,
    state: &SequentialDelayState,
) -> bool {
    if domain.address().is_none() {
        return true;
    }
    match options.nonce {
        Some(nonce) => nonce >= state.counter,
        None => {
            warn!("authenticated domain request is missing a nonce");
            false
        }
    }
}
