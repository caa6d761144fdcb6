//! Serde support for optional domain fields.
//!
//! On the wire an unset field is omitted (or `null`). Clients built against the
//! EIP-712 shape send `{"defined": bool, "value": T}` instead; both decode to the
//! same `Option<T>`. Encoding always produces the plain form.
//!
//! Use with `#[serde(default, skip_serializing_if = "Option::is_none", with = "crate::optional")]`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr<T> {
    Wrapped {
        defined: bool,
        value: Option<T>,
    },
    Plain(T),
}

#[allow(clippy::ref_option)]
pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<Repr<T>>::deserialize(deserializer)? {
        None | Some(Repr::Wrapped { defined: false, .. }) => Ok(None),
        Some(Repr::Plain(v) | Repr::Wrapped { value: Some(v), .. }) => Ok(Some(v)),
        Some(Repr::Wrapped { value: None, .. }) => {
            Err(D::Error::custom("optional field marked defined without a value"))
        }
    }
}
