#![forbid(unsafe_code)]

/// Prefix of every EIP-712 digest: `0x19 || 0x01`.
pub const EIP712_PREFIX: [u8; 2] = [0x19, 0x01];

/// Name of the domain separator struct.
pub const EIP712_DOMAIN_TYPE: &str = "EIP712Domain";

/// The null address, used as the zero value of `address`.
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub const TYPE_BOOL: &str = "bool";
pub const TYPE_ADDRESS: &str = "address";
pub const TYPE_STRING: &str = "string";
pub const TYPE_BYTES: &str = "bytes";
pub const TYPE_UINT256: &str = "uint256";

/// Field names of the `Optional<T>` struct, in schema order.
pub const OPTIONAL_DEFINED: &str = "defined";
pub const OPTIONAL_VALUE: &str = "value";
