//! Reference vectors from the EIP-712 specification ("Ether Mail").

use hex_literal::hex;
use odis_primitives::eip712::{
    encode_type, struct_hash, type_hash, typed_data_hash, Eip712Types, TypedData, TypedField,
};
use serde_json::json;

fn mail_typed_data() -> TypedData {
    let mut types = Eip712Types::new();
    types.insert(
        "EIP712Domain".into(),
        vec![
            TypedField::new("name", "string"),
            TypedField::new("version", "string"),
            TypedField::new("chainId", "uint256"),
            TypedField::new("verifyingContract", "address"),
        ],
    );
    types.insert(
        "Person".into(),
        vec![
            TypedField::new("name", "string"),
            TypedField::new("wallet", "address"),
        ],
    );
    types.insert(
        "Mail".into(),
        vec![
            TypedField::new("from", "Person"),
            TypedField::new("to", "Person"),
            TypedField::new("contents", "string"),
        ],
    );
    TypedData {
        types,
        primary_type: "Mail".into(),
        domain: json!({
            "name": "Ether Mail",
            "version": "1",
            "chainId": 1,
            "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
        }),
        message: json!({
            "from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
            "to": { "name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" },
            "contents": "Hello, Bob!"
        }),
    }
}

#[test]
fn mail_type_encoding_and_hash() {
    let td = mail_typed_data();
    assert_eq!(
        encode_type("Mail", &td.types).expect("encode type"),
        "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
    );
    assert_eq!(
        type_hash("Mail", &td.types).expect("type hash"),
        hex!("a0cedeb2dc280ba39b857546d74f5549c3a1d7bdc2dd96bf881f76108e23dac2")
    );
}

#[test]
fn mail_domain_separator_and_message_hash() {
    let td = mail_typed_data();
    assert_eq!(
        struct_hash("EIP712Domain", &td.domain, &td.types).expect("domain"),
        hex!("f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f")
    );
    assert_eq!(
        struct_hash("Mail", &td.message, &td.types).expect("message"),
        hex!("c52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e")
    );
}

#[test]
fn mail_signing_digest() {
    let td = mail_typed_data();
    let expected = hex!("be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2");
    assert_eq!(typed_data_hash(&td).expect("digest"), expected);
    assert_eq!(td.hash().expect("digest"), expected);
}

#[test]
fn envelope_survives_json_transport() {
    let td = mail_typed_data();
    let wire = serde_json::to_string(&td).expect("serialize");
    let back: TypedData = serde_json::from_str(&wire).expect("deserialize");
    assert_eq!(back, td);
    assert_eq!(back.hash().expect("digest"), td.hash().expect("digest"));
}
