//! Known-answer tests for canonical domain hashes.
//!
//! Digests were produced by an independent EIP-712 v4 encoder from the same logical
//! values; any change here fragments quota state across deployments.

use hex_literal::hex;
use odis_domains::*;
use odis_primitives::eip712::type_hash;
use serde_json::json;

const ADDRESS: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

fn bare_domain() -> Domain {
    SequentialDelayDomain::new(vec![SequentialDelayStage::new(0)], None, None)
        .unwrap()
        .into()
}

fn authenticated_domain() -> Domain {
    SequentialDelayDomain::new(
        vec![SequentialDelayStage::new(0)
            .with_batch_size(2)
            .with_repetitions(10)],
        Some(ADDRESS.to_owned()),
        Some("himalayanPink".to_owned()),
    )
    .unwrap()
    .into()
}

#[test]
fn domain_type_hash() {
    let schema = domain::sequential_delay_domain_types();
    assert_eq!(
        type_hash(&schema.primary_type, &schema.types).unwrap(),
        hex!("a605d008e79800ec0fc8d4cdb7dbc24a11dcbb34d76cfd0d1aaf3acf259989c9")
    );
}

#[test]
fn bare_domain_hash() {
    assert_eq!(
        domain_hash(&bare_domain()).unwrap(),
        hex!("980b62975612c5a25fc39ff99fbb17163dd124d1ea4aafff41d04d0420294c1e")
    );
}

#[test]
fn explicit_defaults_hash() {
    let d: Domain = SequentialDelayDomain::new(
        vec![SequentialDelayStage::new(0)
            .with_batch_size(1)
            .with_repetitions(1)
            .with_reset_timer(true)],
        None,
        None,
    )
    .unwrap()
    .into();
    assert_eq!(
        domain_hash(&d).unwrap(),
        hex!("ba59479e27820fe3da71e71c8078ac913483b969c8cd4ed0a05ef1ba92c25d5e")
    );
}

#[test]
fn authenticated_domain_hash() {
    assert_eq!(
        domain_hash(&authenticated_domain()).unwrap(),
        hex!("b0b70d45107a71febfb0c0be503411e9a15f04897e78db41b302231fb7617c7f")
    );
}

#[test]
fn address_case_does_not_change_hash() {
    let lower: Domain = SequentialDelayDomain::new(
        vec![SequentialDelayStage::new(0)
            .with_batch_size(2)
            .with_repetitions(10)],
        Some(ADDRESS.to_lowercase()),
        Some("himalayanPink".to_owned()),
    )
    .unwrap()
    .into();
    assert_eq!(
        domain_hash(&lower).unwrap(),
        domain_hash(&authenticated_domain()).unwrap()
    );
}

#[test]
fn two_stage_domain_hash() {
    let d: Domain = SequentialDelayDomain::new(
        vec![
            SequentialDelayStage::new(0)
                .with_batch_size(5)
                .with_repetitions(1)
                .with_reset_timer(true),
            SequentialDelayStage::new(60)
                .with_repetitions(1)
                .with_reset_timer(true),
        ],
        None,
        None,
    )
    .unwrap()
    .into();
    assert_eq!(
        domain_hash(&d).unwrap(),
        hex!("07c682d43497d22daa8270826b5b57cc72dfbcd49c82b829e18f12fbd5c78114")
    );
}

#[test]
fn options_hash() {
    let options = DomainOptions::SequentialDelay(SequentialDelayDomainOptions {
        signature: None,
        nonce: Some(2),
    });
    assert_eq!(
        domain_options_hash(&bare_domain(), &options).unwrap(),
        hex!("82911b0e3687cbde26ada3b0c22ea427f3902459c0ade6f4443e058e1495e7a8")
    );
}

#[test]
fn wire_and_wrapped_forms_decode_to_the_same_domain() {
    let plain = Domain::from_value(json!({
        "name": "ODIS Sequential Delay Domain",
        "version": "1",
        "stages": [{ "delay": 0, "batchSize": 2, "repetitions": 10 }],
        "address": ADDRESS,
        "salt": "himalayanPink"
    }))
    .unwrap();
    let wrapped = Domain::from_value(json!({
        "salt": { "defined": true, "value": "himalayanPink" },
        "address": { "defined": true, "value": ADDRESS },
        "stages": [{
            "resetTimer": { "defined": false },
            "repetitions": { "defined": true, "value": 10 },
            "delay": 0,
            "batchSize": { "defined": true, "value": 2 }
        }],
        "version": "1",
        "name": "ODIS Sequential Delay Domain"
    }))
    .unwrap();
    assert_eq!(plain, wrapped);
    assert_eq!(plain, authenticated_domain());
    assert_eq!(domain_hash(&plain).unwrap(), domain_hash(&wrapped).unwrap());
}

#[test]
fn serialization_omits_unset_fields() {
    let value = serde_json::to_value(bare_domain()).unwrap();
    assert_eq!(
        value,
        json!({
            "name": "ODIS Sequential Delay Domain",
            "version": "1",
            "stages": [{ "delay": 0 }]
        })
    );
    let back: Domain = serde_json::from_value(value).unwrap();
    assert_eq!(back, bare_domain());
}

#[test]
fn typed_data_envelope_hashes_like_the_domain() {
    let d = authenticated_domain();
    let td = domain_typed_data(&d).unwrap();
    let envelope = serde_json::to_string(&td).unwrap();
    let parsed: TypedData = serde_json::from_str(&envelope).unwrap();
    assert_eq!(parsed.hash().unwrap(), domain_hash(&d).unwrap());
    assert_eq!(parsed.message["salt"], json!({ "defined": true, "value": "himalayanPink" }));
}
