use odis_primitives::parse_address;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// `name` of every sequential delay domain.
pub const SEQUENTIAL_DELAY_DOMAIN_NAME: &str = "ODIS Sequential Delay Domain";
/// `version` of the sequential delay domain schema.
pub const SEQUENTIAL_DELAY_DOMAIN_VERSION: &str = "1";

pub const DEFAULT_RESET_TIMER: bool = true;
pub const DEFAULT_BATCH_SIZE: u64 = 1;
pub const DEFAULT_REPETITIONS: u64 = 1;

/// One escalation tier of a [`SequentialDelayDomain`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialDelayStage {
    /// Seconds each batch of attempts in this stage is delayed relative to the timer.
    pub delay: u64,
    /// Whether an accepted attempt moves the timer to the attempt time. Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::optional")]
    pub reset_timer: Option<bool>,
    /// Attempts admitted per delay interval. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::optional")]
    pub batch_size: Option<u64>,
    /// Number of times the stage repeats before the next one. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::optional")]
    pub repetitions: Option<u64>,
}

impl SequentialDelayStage {
    #[must_use]
    pub const fn new(delay: u64) -> Self {
        Self {
            delay,
            reset_timer: None,
            batch_size: None,
            repetitions: None,
        }
    }

    #[must_use]
    pub const fn with_reset_timer(mut self, reset_timer: bool) -> Self {
        self.reset_timer = Some(reset_timer);
        self
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    #[must_use]
    pub const fn with_repetitions(mut self, repetitions: u64) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    #[must_use]
    pub fn reset_timer_or_default(&self) -> bool {
        self.reset_timer.unwrap_or(DEFAULT_RESET_TIMER)
    }

    #[must_use]
    pub fn batch_size_or_default(&self) -> u64 {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    #[must_use]
    pub fn repetitions_or_default(&self) -> u64 {
        self.repetitions.unwrap_or(DEFAULT_REPETITIONS)
    }

    /// Attempts covered by this stage: `repetitions × batch_size`.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.repetitions_or_default()
            .saturating_mul(self.batch_size_or_default())
    }
}

/// Rate limited domain whose quota is released through an ordered list of delay stages.
///
/// Immutable once constructed; identified by its EIP-712 hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SequentialDelayDomainWire", into = "SequentialDelayDomainWire")]
pub struct SequentialDelayDomain {
    stages: Vec<SequentialDelayStage>,
    address: Option<String>,
    salt: Option<String>,
}

impl SequentialDelayDomain {
    /// Build a validated domain.
    ///
    /// # Errors
    ///
    /// `InvalidDomainConfiguration` if `stages` is empty or `address` is not a
    /// `0x`-prefixed 20-byte hex address.
    pub fn new(
        stages: Vec<SequentialDelayStage>,
        address: Option<String>,
        salt: Option<String>,
    ) -> Result<Self, DomainError> {
        if stages.is_empty() {
            return Err(DomainError::InvalidDomainConfiguration(
                "stages must not be empty",
            ));
        }
        if let Some(a) = &address {
            parse_address(a).map_err(|_| {
                DomainError::InvalidDomainConfiguration("address must be 0x followed by 40 hex digits")
            })?;
        }
        Ok(Self {
            stages,
            address,
            salt,
        })
    }

    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn name(&self) -> &'static str {
        SEQUENTIAL_DELAY_DOMAIN_NAME
    }

    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn version(&self) -> &'static str {
        SEQUENTIAL_DELAY_DOMAIN_VERSION
    }

    #[must_use]
    pub fn stages(&self) -> &[SequentialDelayStage] {
        &self.stages
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    #[must_use]
    pub fn salt(&self) -> Option<&str> {
        self.salt.as_deref()
    }

    /// Total number of attempts the domain will ever accept.
    #[must_use]
    pub fn total_quota(&self) -> u64 {
        self.stages
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.attempts()))
    }
}

/// JSON shape of a sequential delay domain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SequentialDelayDomainWire {
    pub(crate) name: String,
    pub(crate) version: String,
    stages: Vec<SequentialDelayStage>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::optional")]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::optional")]
    salt: Option<String>,
}

impl TryFrom<SequentialDelayDomainWire> for SequentialDelayDomain {
    type Error = DomainError;

    fn try_from(w: SequentialDelayDomainWire) -> Result<Self, Self::Error> {
        if !is_sequential_delay_domain(&w.name, &w.version) {
            return Err(DomainError::UnrecognizedDomainKind {
                name: w.name,
                version: w.version,
            });
        }
        Self::new(w.stages, w.address, w.salt)
    }
}

impl From<SequentialDelayDomain> for SequentialDelayDomainWire {
    fn from(d: SequentialDelayDomain) -> Self {
        Self {
            name: SEQUENTIAL_DELAY_DOMAIN_NAME.to_owned(),
            version: SEQUENTIAL_DELAY_DOMAIN_VERSION.to_owned(),
            stages: d.stages,
            address: d.address,
            salt: d.salt,
        }
    }
}

#[must_use]
pub fn is_sequential_delay_domain(name: &str, version: &str) -> bool {
    name == SEQUENTIAL_DELAY_DOMAIN_NAME && version == SEQUENTIAL_DELAY_DOMAIN_VERSION
}

/// Per-request options accompanying a [`SequentialDelayDomain`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialDelayDomainOptions {
    /// EIP-712 signature over the request by the domain `address`, `0x`-prefixed hex.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::optional")]
    pub signature: Option<String>,
    /// Replay protection; compared against the quota counter.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::optional")]
    pub nonce: Option<u64>,
}

/// Persisted quota record of one domain instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequentialDelayState {
    /// Reference timestamp (seconds) for the next delay computation.
    pub timer: i64,
    /// Number of accepted requests.
    pub counter: u64,
    /// Terminal override; only an external authority sets or clears it.
    pub disabled: bool,
}

/// Outcome of a rate limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialDelayResult {
    pub accepted: bool,
    /// Earliest time an attempt would be accepted. Absent when accepted or when the
    /// domain can never accept again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<i64>,
    /// State to persist. Unchanged unless `accepted`.
    pub state: SequentialDelayState,
}
