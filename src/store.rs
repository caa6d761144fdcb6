//! In-memory quota state keyed by domain hash.
//!
//! Reading the prior state, deciding and writing the new state must happen as one
//! step per domain, or two concurrent requests could both be admitted against the
//! same state. [`StateStore::update`] is that step.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use odis_primitives::{to_hex_prefixed, Hash256};
use tracing::{debug, info, warn};

use crate::domain::{domain_hash, Domain};
use crate::errors::DomainError;
use crate::sequential_delay::{check_sequential_delay_rate_limit, remaining_quota};
use crate::types::{SequentialDelayResult, SequentialDelayState};

/// Durable map from domain hash to its latest quota state.
pub trait StateStore: Send + Sync {
    /// Latest state, or `None` if the domain has never been served.
    fn get(&self, key: &Hash256) -> Option<SequentialDelayState>;

    /// Atomic read-modify-write of one key.
    ///
    /// `f` receives the current state and returns the state to write (`None` leaves the
    /// record as it was) along with a value handed back to the caller. No other update
    /// of the same key runs while `f` does.
    fn update<F, R>(&self, key: Hash256, f: F) -> R
    where
        F: FnOnce(Option<SequentialDelayState>) -> (Option<SequentialDelayState>, R);
}

/// [`StateStore`] backed by a sharded concurrent map. Updates hold the key's shard lock.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    map: DashMap<Hash256, SequentialDelayState>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &Hash256) -> Option<SequentialDelayState> {
        self.map.get(key).map(|entry| *entry.value())
    }

    fn update<F, R>(&self, key: Hash256, f: F) -> R
    where
        F: FnOnce(Option<SequentialDelayState>) -> (Option<SequentialDelayState>, R),
    {
        match self.map.entry(key) {
            Entry::Occupied(mut e) => {
                let (next, out) = f(Some(*e.get()));
                if let Some(state) = next {
                    e.insert(state);
                }
                out
            }
            Entry::Vacant(e) => {
                let (next, out) = f(None);
                if let Some(state) = next {
                    e.insert(state);
                }
                out
            }
        }
    }
}

/// Quota snapshot of one domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaStatus {
    pub state: SequentialDelayState,
    /// Attempts the domain may still accept, ignoring delays.
    pub remaining: u64,
}

/// Evaluates domain requests against a [`StateStore`].
#[derive(Debug, Default)]
pub struct QuotaService<S> {
    store: S,
}

impl<S: StateStore> QuotaService<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Decide an attempt at `attempt_time` and persist the new state if it was accepted.
    pub fn check_and_update(
        &self,
        domain: &Domain,
        attempt_time: i64,
    ) -> Result<SequentialDelayResult, DomainError> {
        let key = domain_hash(domain)?;
        let result = match domain {
            Domain::SequentialDelay(d) => self.store.update(key, |prior| {
                let r = check_sequential_delay_rate_limit(d, attempt_time, prior.as_ref());
                (r.accepted.then_some(r.state), r)
            }),
        };

        let hash = to_hex_prefixed(&key);
        if result.accepted {
            info!(domain = %hash, counter = result.state.counter, "domain request accepted");
        } else if result.state.disabled {
            warn!(domain = %hash, "request against disabled domain");
        } else if let Some(not_before) = result.not_before {
            debug!(domain = %hash, attempt_time, not_before, "domain request delayed");
        } else {
            warn!(domain = %hash, counter = result.state.counter, "domain quota exceeded");
        }
        Ok(result)
    }

    /// Permanently disable `domain`. Counter and timer are kept.
    pub fn disable(&self, domain: &Domain) -> Result<SequentialDelayState, DomainError> {
        let key = domain_hash(domain)?;
        let state = self.store.update(key, |prior| {
            let next = SequentialDelayState {
                disabled: true,
                ..prior.unwrap_or_default()
            };
            (Some(next), next)
        });
        info!(domain = %to_hex_prefixed(&key), "domain disabled");
        Ok(state)
    }

    pub fn quota_status(&self, domain: &Domain) -> Result<QuotaStatus, DomainError> {
        let key = domain_hash(domain)?;
        let state = self.store.get(&key).unwrap_or_default();
        let remaining = match domain {
            Domain::SequentialDelay(d) => remaining_quota(d, Some(&state)),
        };
        Ok(QuotaStatus { state, remaining })
    }
}

#[cfg(test)]
#[allow(clippy::missing_assert_message)]
mod tests {
    use super::*;
    use crate::types::{SequentialDelayDomain, SequentialDelayStage};

    fn domain(stages: Vec<SequentialDelayStage>) -> Domain {
        SequentialDelayDomain::new(stages, None, None).unwrap().into()
    }

    #[test]
    fn rejections_are_not_persisted() {
        let service = QuotaService::new(InMemoryStateStore::new());
        let d = domain(vec![SequentialDelayStage::new(10)]);

        let r = service.check_and_update(&d, 5).unwrap();
        assert!(!r.accepted);
        assert!(service.store().is_empty());

        let r = service.check_and_update(&d, 10).unwrap();
        assert!(r.accepted);
        let key = domain_hash(&d).unwrap();
        assert_eq!(service.store().get(&key), Some(r.state));
    }

    #[test]
    fn distinct_domains_do_not_share_quota() {
        let service = QuotaService::new(InMemoryStateStore::new());
        let a = domain(vec![SequentialDelayStage::new(0)]);
        let b = domain(vec![SequentialDelayStage::new(0).with_reset_timer(true)]);
        assert!(service.check_and_update(&a, 0).unwrap().accepted);
        assert!(!service.check_and_update(&a, 0).unwrap().accepted);
        assert!(service.check_and_update(&b, 0).unwrap().accepted);
        assert_eq!(service.store().len(), 2);
    }

    #[test]
    fn disable_is_terminal() {
        let service = QuotaService::new(InMemoryStateStore::new());
        let d = domain(vec![SequentialDelayStage::new(0).with_batch_size(3)]);
        assert!(service.check_and_update(&d, 0).unwrap().accepted);

        let disabled = service.disable(&d).unwrap();
        assert_eq!(
            disabled,
            SequentialDelayState {
                timer: 0,
                counter: 1,
                disabled: true
            }
        );
        let r = service.check_and_update(&d, 100).unwrap();
        assert!(!r.accepted);
        assert_eq!(r.not_before, None);
        assert_eq!(r.state, disabled);

        let status = service.quota_status(&d).unwrap();
        assert_eq!(status.remaining, 0);
        assert!(status.state.disabled);
    }

    #[test]
    fn status_of_unknown_domain_is_zero_state() {
        let service = QuotaService::new(InMemoryStateStore::new());
        let d = domain(vec![SequentialDelayStage::new(0).with_repetitions(4)]);
        let status = service.quota_status(&d).unwrap();
        assert_eq!(status.state, SequentialDelayState::default());
        assert_eq!(status.remaining, 4);
    }

    #[test]
    fn concurrent_requests_never_exceed_quota() {
        let service = QuotaService::new(InMemoryStateStore::new());
        let d = domain(vec![SequentialDelayStage::new(0).with_batch_size(5)]);

        let accepted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..10)
                            .filter(|_| service.check_and_update(&d, 0).unwrap().accepted)
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(accepted, 5);
        assert_eq!(service.quota_status(&d).unwrap().state.counter, 5);
    }
}
