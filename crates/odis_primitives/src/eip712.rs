//! EIP-712 typed structured data encoding (`eth_signTypedData_v4` rules).
//!
//! All functions take the type schema explicitly; nothing here holds state.
//! Values are carried as `serde_json::Value` so that the same envelope can be
//! handed to a wallet for signing and hashed locally.

use std::collections::{BTreeMap, BTreeSet};

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    constants, decode_hex, keccak256, keccak256_concat, parse_address, word_from_address,
    word_from_bool, word_from_i128, word_from_u256, Hash256, Word,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Eip712Error {
    #[error("unrecognized type {0} is not included in the EIP-712 type list")]
    UnknownType(String),

    #[error("missing field {field} of struct {struct_name}")]
    MissingField { struct_name: String, field: String },

    #[error("invalid {kind} value: {reason}")]
    InvalidValue { kind: String, reason: String },
}

/// One member of a struct type: `{ "name": ..., "type": ... }`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedField {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Struct name -> ordered member list.
pub type Eip712Types = BTreeMap<String, Vec<TypedField>>;

/// A type schema together with the name of its primary struct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypesWithPrimary {
    pub types: Eip712Types,
    pub primary_type: String,
}

/// The full typed data envelope, in the JSON shape wallets expect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub types: Eip712Types,
    pub primary_type: String,
    pub domain: Value,
    pub message: Value,
}

impl TypedData {
    /// Digest signed by `eth_signTypedData_v4`.
    pub fn hash(&self) -> Result<Hash256, Eip712Error> {
        typed_data_hash(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Atomic {
    Bool,
    Address,
    Uint(u32),
    Int(u32),
    FixedBytes(usize),
}

fn int_width(rest: &str) -> Option<u32> {
    let bits: u32 = rest.parse().ok()?;
    (bits % 8 == 0 && (8..=256).contains(&bits) && !rest.starts_with('0')).then_some(bits)
}

fn atomic(ty: &str) -> Option<Atomic> {
    match ty {
        constants::TYPE_BOOL => return Some(Atomic::Bool),
        constants::TYPE_ADDRESS => return Some(Atomic::Address),
        _ => {}
    }
    if let Some(rest) = ty.strip_prefix("uint") {
        return int_width(rest).map(Atomic::Uint);
    }
    if let Some(rest) = ty.strip_prefix("int") {
        return int_width(rest).map(Atomic::Int);
    }
    if let Some(rest) = ty.strip_prefix("bytes") {
        let n: usize = rest.parse().ok()?;
        return ((1..=32).contains(&n) && !rest.starts_with('0')).then_some(Atomic::FixedBytes(n));
    }
    None
}

fn is_builtin(ty: &str) -> bool {
    atomic(ty).is_some() || ty == constants::TYPE_STRING || ty == constants::TYPE_BYTES
}

/// Split `T[]` / `T[n]` into `(T, n)`.
fn array_member(ty: &str) -> Option<(&str, Option<usize>)> {
    let inner = ty.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let len = &inner[open + 1..];
    let member = &inner[..open];
    if member.is_empty() {
        return None;
    }
    if len.is_empty() {
        return Some((member, None));
    }
    len.parse().ok().map(|n| (member, Some(n)))
}

/// Build the `Optional<T>` struct schema entry for member type `ty`.
#[must_use]
pub fn optional_type(ty: &str) -> (String, Vec<TypedField>) {
    (
        format!("Optional<{ty}>"),
        vec![
            TypedField::new(constants::OPTIONAL_DEFINED, constants::TYPE_BOOL),
            TypedField::new(constants::OPTIONAL_VALUE, ty),
        ],
    )
}

/// Value of an `Optional<T>` struct. An absent value carries the zero value of `ty`.
pub fn optional_value(value: Option<Value>, ty: &str) -> Result<Value, Eip712Error> {
    let (defined, value) = match value {
        Some(v) => (true, v),
        None => (false, zero_value(ty, &Eip712Types::new())?),
    };
    let mut obj = Map::new();
    obj.insert(constants::OPTIONAL_DEFINED.to_owned(), Value::Bool(defined));
    obj.insert(constants::OPTIONAL_VALUE.to_owned(), value);
    Ok(Value::Object(obj))
}

/// Zero value of a type: `false`, `0`, `""`, the null address, empty bytes,
/// empty (or zero-filled fixed) arrays, and structs with every member zeroed.
pub fn zero_value(ty: &str, types: &Eip712Types) -> Result<Value, Eip712Error> {
    match atomic(ty) {
        Some(Atomic::Bool) => return Ok(Value::Bool(false)),
        Some(Atomic::Address) => return Ok(Value::String(constants::NULL_ADDRESS.to_owned())),
        Some(Atomic::Uint(_) | Atomic::Int(_)) => return Ok(Value::from(0u64)),
        Some(Atomic::FixedBytes(_)) => return Ok(Value::String("0x".to_owned())),
        None => {}
    }
    if ty == constants::TYPE_STRING {
        return Ok(Value::String(String::new()));
    }
    if ty == constants::TYPE_BYTES {
        return Ok(Value::String("0x".to_owned()));
    }
    if let Some((member, len)) = array_member(ty) {
        let n = len.unwrap_or(0);
        let items = (0..n)
            .map(|_| zero_value(member, types))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::Array(items));
    }
    let fields = types
        .get(ty)
        .ok_or_else(|| Eip712Error::UnknownType(ty.to_owned()))?;
    let mut obj = Map::new();
    for f in fields {
        obj.insert(f.name.clone(), zero_value(&f.ty, types)?);
    }
    Ok(Value::Object(obj))
}

fn collect_dependencies(
    ty: &str,
    types: &Eip712Types,
    found: &mut BTreeSet<String>,
) -> Result<(), Eip712Error> {
    if found.contains(ty) || is_builtin(ty) {
        return Ok(());
    }
    if let Some((member, _)) = array_member(ty) {
        return collect_dependencies(member, types, found);
    }
    let fields = types
        .get(ty)
        .ok_or_else(|| Eip712Error::UnknownType(ty.to_owned()))?;
    found.insert(ty.to_owned());
    for f in fields {
        collect_dependencies(&f.ty, types, found)?;
    }
    Ok(())
}

/// `encodeType`: the primary struct followed by its transitive dependencies sorted by name,
/// e.g. `Mail(Person from,Person to,string contents)Person(string name,address wallet)`.
pub fn encode_type(primary_type: &str, types: &Eip712Types) -> Result<String, Eip712Error> {
    let mut deps = BTreeSet::new();
    collect_dependencies(primary_type, types, &mut deps)?;
    if !deps.remove(primary_type) {
        return Err(Eip712Error::UnknownType(primary_type.to_owned()));
    }
    let mut out = String::new();
    for dep in std::iter::once(primary_type).chain(deps.iter().map(String::as_str)) {
        let fields = types
            .get(dep)
            .ok_or_else(|| Eip712Error::UnknownType(dep.to_owned()))?;
        out.push_str(dep);
        out.push('(');
        for (i, f) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&f.ty);
            out.push(' ');
            out.push_str(&f.name);
        }
        out.push(')');
    }
    Ok(out)
}

pub fn type_hash(primary_type: &str, types: &Eip712Types) -> Result<Hash256, Eip712Error> {
    Ok(keccak256(encode_type(primary_type, types)?.as_bytes()))
}

fn invalid(kind: &str, reason: impl Into<String>) -> Eip712Error {
    Eip712Error::InvalidValue {
        kind: kind.to_owned(),
        reason: reason.into(),
    }
}

fn parse_uint(ty: &str, bits: u32, value: &Value) -> Result<U256, Eip712Error> {
    let x = match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| invalid(ty, format!("{n} is not an unsigned integer")))?,
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(h) => U256::from_str_radix(h, 16).ok(),
                None => U256::from_dec_str(s).ok(),
            };
            parsed.ok_or_else(|| invalid(ty, format!("{s:?} is not an unsigned integer")))?
        }
        other => return Err(invalid(ty, format!("expected a number, got {other}"))),
    };
    if x.bits() > bits as usize {
        return Err(invalid(ty, format!("{x} does not fit in {bits} bits")));
    }
    Ok(x)
}

fn parse_int(ty: &str, bits: u32, value: &Value) -> Result<i128, Eip712Error> {
    let x = match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .ok_or_else(|| invalid(ty, format!("{n} is not an integer")))?,
        Value::String(s) => s
            .parse::<i128>()
            .map_err(|_| invalid(ty, format!("{s:?} is not an integer")))?,
        other => return Err(invalid(ty, format!("expected a number, got {other}"))),
    };
    if bits < 128 {
        let bound = 1i128 << (bits - 1);
        if x < -bound || x >= bound {
            return Err(invalid(ty, format!("{x} does not fit in {bits} bits")));
        }
    }
    Ok(x)
}

fn as_str<'a>(ty: &str, value: &'a Value) -> Result<&'a str, Eip712Error> {
    value
        .as_str()
        .ok_or_else(|| invalid(ty, format!("expected a string, got {value}")))
}

fn encode_atomic(ty: &str, kind: Atomic, value: &Value) -> Result<Word, Eip712Error> {
    match kind {
        Atomic::Bool => value
            .as_bool()
            .map(word_from_bool)
            .ok_or_else(|| invalid(ty, format!("expected a boolean, got {value}"))),
        Atomic::Address => Ok(word_from_address(&parse_address(as_str(ty, value)?)?)),
        Atomic::Uint(bits) => Ok(word_from_u256(parse_uint(ty, bits, value)?)),
        Atomic::Int(bits) => Ok(word_from_i128(parse_int(ty, bits, value)?)),
        Atomic::FixedBytes(n) => {
            let bytes = decode_hex(as_str(ty, value)?)?;
            if bytes.len() > n {
                return Err(invalid(ty, format!("{} bytes exceed {n}", bytes.len())));
            }
            // right padded
            let mut w = [0u8; 32];
            w[..bytes.len()].copy_from_slice(&bytes);
            Ok(w)
        }
    }
}

fn encode_value(ty: &str, value: &Value, types: &Eip712Types) -> Result<Word, Eip712Error> {
    if let Some(kind) = atomic(ty) {
        return encode_atomic(ty, kind, value);
    }
    if ty == constants::TYPE_STRING {
        return Ok(keccak256(as_str(ty, value)?.as_bytes()));
    }
    if ty == constants::TYPE_BYTES {
        // Hex when 0x-prefixed, UTF-8 otherwise.
        let s = as_str(ty, value)?;
        let bytes = if s.starts_with("0x") {
            decode_hex(s)?
        } else {
            s.as_bytes().to_vec()
        };
        return Ok(keccak256(&bytes));
    }
    if types.contains_key(ty) {
        return struct_hash(ty, value, types);
    }
    if let Some((member, _)) = array_member(ty) {
        // Fixed lengths are not checked.
        let items = value
            .as_array()
            .ok_or_else(|| invalid(ty, format!("expected an array, got {value}")))?;
        let mut buf = Vec::with_capacity(items.len() * 32);
        for item in items {
            buf.extend_from_slice(&encode_value(member, item, types)?);
        }
        return Ok(keccak256(&buf));
    }
    Err(Eip712Error::UnknownType(ty.to_owned()))
}

/// `encodeData`: the concatenated 32-byte encodings of every member, in schema order.
pub fn encode_data(
    primary_type: &str,
    data: &Value,
    types: &Eip712Types,
) -> Result<Vec<u8>, Eip712Error> {
    let fields = types
        .get(primary_type)
        .ok_or_else(|| Eip712Error::UnknownType(primary_type.to_owned()))?;
    let obj = data
        .as_object()
        .ok_or_else(|| invalid(primary_type, format!("expected an object, got {data}")))?;
    let mut out = Vec::with_capacity(fields.len() * 32);
    for f in fields {
        let v = obj.get(&f.name).ok_or_else(|| Eip712Error::MissingField {
            struct_name: primary_type.to_owned(),
            field: f.name.clone(),
        })?;
        out.extend_from_slice(&encode_value(&f.ty, v, types)?);
    }
    Ok(out)
}

/// `hashStruct = keccak256(typeHash || encodeData)`.
pub fn struct_hash(
    primary_type: &str,
    data: &Value,
    types: &Eip712Types,
) -> Result<Hash256, Eip712Error> {
    let th = type_hash(primary_type, types)?;
    let enc = encode_data(primary_type, data, types)?;
    Ok(keccak256_concat(&[&th, &enc]))
}

/// `keccak256(0x19 0x01 || hashStruct(EIP712Domain, domain) || hashStruct(primaryType, message))`.
pub fn typed_data_hash(typed_data: &TypedData) -> Result<Hash256, Eip712Error> {
    let domain = struct_hash(
        constants::EIP712_DOMAIN_TYPE,
        &typed_data.domain,
        &typed_data.types,
    )?;
    let message = struct_hash(
        &typed_data.primary_type,
        &typed_data.message,
        &typed_data.types,
    )?;
    Ok(keccak256_concat(&[&constants::EIP712_PREFIX, &domain, &message]))
}
