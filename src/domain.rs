//! Closed set of authorization domains and their canonical EIP-712 encoding.
//!
//! A domain doubles as its own EIP-712 domain separator (`name`, `version`) and as
//! the signed message (the full struct, stages included). Its typed data hash is
//! the key under which quota state is stored and the message signed by clients,
//! so the encoding here must stay bit-exact with every other implementation.

use odis_primitives::{
    constants::{EIP712_DOMAIN_TYPE, TYPE_ADDRESS, TYPE_BOOL, TYPE_STRING, TYPE_UINT256},
    eip712::{optional_type, optional_value, Eip712Types, TypedData, TypedField, TypesWithPrimary},
    Eip712Error, Hash256,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::errors::DomainError;
use crate::types::{
    is_sequential_delay_domain, SequentialDelayDomain, SequentialDelayDomainOptions,
    SequentialDelayDomainWire, SequentialDelayStage,
};

pub const SEQUENTIAL_DELAY_DOMAIN_TYPE: &str = "SequentialDelayDomain";
pub const SEQUENTIAL_DELAY_STAGE_TYPE: &str = "SequentialDelayStage";
pub const SEQUENTIAL_DELAY_DOMAIN_OPTIONS_TYPE: &str = "SequentialDelayDomainOptions";

/// Every domain kind the service understands.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Domain {
    SequentialDelay(SequentialDelayDomain),
}

/// Options companion of each [`Domain`] kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum DomainOptions {
    SequentialDelay(SequentialDelayDomainOptions),
}

impl Domain {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SequentialDelay(d) => d.name(),
        }
    }

    #[must_use]
    pub const fn version(&self) -> &'static str {
        match self {
            Self::SequentialDelay(d) => d.version(),
        }
    }

    /// Decode a domain from JSON, dispatching on its `name` and `version`.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };
        let (name, version) = (field("name"), field("version"));
        if is_sequential_delay_domain(&name, &version) {
            let wire: SequentialDelayDomainWire = serde_json::from_value(value)?;
            return Ok(Self::SequentialDelay(wire.try_into()?));
        }
        Err(DomainError::UnrecognizedDomainKind { name, version })
    }

    pub fn from_json(s: &str) -> Result<Self, DomainError> {
        Self::from_value(serde_json::from_str(s)?)
    }

    pub fn typed_data(&self) -> Result<TypedData, DomainError> {
        domain_typed_data(self)
    }

    pub fn hash(&self) -> Result<Hash256, DomainError> {
        domain_hash(self)
    }

    /// Decode the options companion matching this domain's kind.
    pub fn options_from_value(&self, value: Value) -> Result<DomainOptions, DomainError> {
        match self {
            Self::SequentialDelay(_) => Ok(DomainOptions::SequentialDelay(
                serde_json::from_value(value)?,
            )),
        }
    }
}

impl From<SequentialDelayDomain> for Domain {
    fn from(d: SequentialDelayDomain) -> Self {
        Self::SequentialDelay(d)
    }
}

impl From<SequentialDelayDomainOptions> for DomainOptions {
    fn from(o: SequentialDelayDomainOptions) -> Self {
        Self::SequentialDelay(o)
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn insert_optional(types: &mut Eip712Types, ty: &str) {
    let (name, fields) = optional_type(ty);
    types.insert(name, fields);
}

fn fields(members: &[(&str, &str)]) -> Vec<TypedField> {
    members.iter().map(|(n, t)| TypedField::new(*n, *t)).collect()
}

/// Schema of [`SequentialDelayDomain`]. Members are listed alphabetically.
#[must_use]
pub fn sequential_delay_domain_types() -> TypesWithPrimary {
    let mut types = Eip712Types::new();
    types.insert(
        SEQUENTIAL_DELAY_DOMAIN_TYPE.to_owned(),
        fields(&[
            ("address", "Optional<address>"),
            ("name", "string"),
            ("salt", "Optional<string>"),
            ("stages", "SequentialDelayStage[]"),
            ("version", "string"),
        ]),
    );
    types.insert(
        SEQUENTIAL_DELAY_STAGE_TYPE.to_owned(),
        fields(&[
            ("batchSize", "Optional<uint256>"),
            ("delay", "uint256"),
            ("repetitions", "Optional<uint256>"),
            ("resetTimer", "Optional<bool>"),
        ]),
    );
    for ty in [TYPE_ADDRESS, TYPE_STRING, TYPE_UINT256, TYPE_BOOL] {
        insert_optional(&mut types, ty);
    }
    TypesWithPrimary {
        types,
        primary_type: SEQUENTIAL_DELAY_DOMAIN_TYPE.to_owned(),
    }
}

/// Schema of [`SequentialDelayDomainOptions`].
#[must_use]
pub fn sequential_delay_domain_options_types() -> TypesWithPrimary {
    let mut types = Eip712Types::new();
    types.insert(
        SEQUENTIAL_DELAY_DOMAIN_OPTIONS_TYPE.to_owned(),
        fields(&[("nonce", "Optional<uint256>"), ("signature", "Optional<string>")]),
    );
    for ty in [TYPE_STRING, TYPE_UINT256] {
        insert_optional(&mut types, ty);
    }
    TypesWithPrimary {
        types,
        primary_type: SEQUENTIAL_DELAY_DOMAIN_OPTIONS_TYPE.to_owned(),
    }
}

#[must_use]
pub fn domain_types_for(domain: &Domain) -> TypesWithPrimary {
    match domain {
        Domain::SequentialDelay(_) => sequential_delay_domain_types(),
    }
}

#[must_use]
pub fn domain_options_types_for(options: &DomainOptions) -> TypesWithPrimary {
    match options {
        DomainOptions::SequentialDelay(_) => sequential_delay_domain_options_types(),
    }
}

fn eip712_domain_fields() -> Vec<TypedField> {
    fields(&[("name", "string"), ("version", "string")])
}

fn stage_message(stage: &SequentialDelayStage) -> Result<Value, Eip712Error> {
    Ok(json!({
        "batchSize": optional_value(stage.batch_size.map(Value::from), TYPE_UINT256)?,
        "delay": stage.delay,
        "repetitions": optional_value(stage.repetitions.map(Value::from), TYPE_UINT256)?,
        "resetTimer": optional_value(stage.reset_timer.map(Value::from), TYPE_BOOL)?,
    }))
}

fn sequential_delay_message(domain: &SequentialDelayDomain) -> Result<Value, Eip712Error> {
    let stages = domain
        .stages()
        .iter()
        .map(stage_message)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({
        "address": optional_value(domain.address().map(Value::from), TYPE_ADDRESS)?,
        "name": domain.name(),
        "salt": optional_value(domain.salt().map(Value::from), TYPE_STRING)?,
        "stages": stages,
        "version": domain.version(),
    }))
}

fn sequential_delay_options_message(
    options: &SequentialDelayDomainOptions,
) -> Result<Value, Eip712Error> {
    Ok(json!({
        "nonce": optional_value(options.nonce.map(Value::from), TYPE_UINT256)?,
        "signature": optional_value(options.signature.clone().map(Value::from), TYPE_STRING)?,
    }))
}

fn envelope(schema: TypesWithPrimary, domain: &Domain, message: Value) -> TypedData {
    let TypesWithPrimary {
        mut types,
        primary_type,
    } = schema;
    types.insert(EIP712_DOMAIN_TYPE.to_owned(), eip712_domain_fields());
    TypedData {
        types,
        primary_type,
        domain: json!({ "name": domain.name(), "version": domain.version() }),
        message,
    }
}

/// Typed data envelope for `domain`, ready for `eth_signTypedData_v4`.
pub fn domain_typed_data(domain: &Domain) -> Result<TypedData, DomainError> {
    let message = match domain {
        Domain::SequentialDelay(d) => sequential_delay_message(d)?,
    };
    Ok(envelope(domain_types_for(domain), domain, message))
}

/// Canonical 32-byte identifier of `domain`.
pub fn domain_hash(domain: &Domain) -> Result<Hash256, DomainError> {
    Ok(domain_typed_data(domain)?.hash()?)
}

/// Typed data envelope for the options sent alongside `domain`; the domain's
/// `name` and `version` form the separator.
pub fn domain_options_typed_data(
    domain: &Domain,
    options: &DomainOptions,
) -> Result<TypedData, DomainError> {
    let message = match (domain, options) {
        (Domain::SequentialDelay(_), DomainOptions::SequentialDelay(o)) => {
            sequential_delay_options_message(o)?
        }
    };
    Ok(envelope(domain_options_types_for(options), domain, message))
}

pub fn domain_options_hash(
    domain: &Domain,
    options: &DomainOptions,
) -> Result<Hash256, DomainError> {
    Ok(domain_options_typed_data(domain, options)?.hash()?)
}
