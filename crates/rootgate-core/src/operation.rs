//! Operations (Merkle leaves) and the call context they execute under.
//!
//! An operation is never stored. Its identity inside a task is the hash of
//! its canonical encoding: eleven 32-byte big-endian words, with addresses
//! left-padded and `call_data` replaced by its SHA-256 digest.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use rootgate_store::{Address, Hash};

/// How the module executor should perform the call.
///
/// Only [`CallType::Call`] is ever executed; `DelegateCall` exists so that a
/// leaf claiming it can be committed and then rejected at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    #[default]
    Call,
    DelegateCall,
}

impl CallType {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Call => 0,
            Self::DelegateCall => 1,
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Call => "call",
            Self::DelegateCall => "delegate_call",
        };
        f.write_str(s)
    }
}

impl FromStr for CallType {
    type Err = CallTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(Self::Call),
            "delegate_call" => Ok(Self::DelegateCall),
            other => Err(CallTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`CallType`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid call type: {0:?} (expected call or delegate_call)")]
pub struct CallTypeParseError(pub String);

/// One pre-authorized call inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Destination of the call.
    pub target: Address,
    /// Native amount sent along with the call.
    pub value: u128,
    /// Opaque call payload.
    #[serde(with = "hex_bytes")]
    pub call_data: Vec<u8>,
    pub call_type: CallType,
    /// Index into the task's execution bitmap.
    pub operation_id: u32,
    pub is_repeatable: bool,
    /// First timestamp (inclusive) at which the operation may run.
    pub start_time: u64,
    /// Last timestamp (inclusive) at which the operation may run.
    pub end_time: u64,
    /// Upper bound on the invoking transaction's fee per gas.
    pub max_gas_price: u128,
    /// Carried in the leaf but not enforced.
    pub gas_limit: u64,
    /// Carried in the leaf but not enforced.
    pub gas_token: Address,
}

impl Operation {
    /// Number of 32-byte words in the canonical encoding.
    pub const ENCODED_WORDS: usize = 11;

    /// Canonical byte encoding hashed into the Merkle leaf.
    pub fn encode(&self) -> Vec<u8> {
        let data_digest: [u8; 32] = Sha256::digest(&self.call_data).into();

        let mut out = Vec::with_capacity(Self::ENCODED_WORDS * 32);
        out.extend_from_slice(&address_word(&self.target));
        out.extend_from_slice(&uint_word(self.value));
        out.extend_from_slice(&data_digest);
        out.extend_from_slice(&uint_word(u128::from(self.call_type.as_u8())));
        out.extend_from_slice(&uint_word(u128::from(self.operation_id)));
        out.extend_from_slice(&uint_word(u128::from(self.is_repeatable)));
        out.extend_from_slice(&uint_word(u128::from(self.start_time)));
        out.extend_from_slice(&uint_word(u128::from(self.end_time)));
        out.extend_from_slice(&uint_word(self.max_gas_price));
        out.extend_from_slice(&uint_word(u128::from(self.gas_limit)));
        out.extend_from_slice(&address_word(&self.gas_token));
        out
    }

    /// The Merkle leaf for this operation.
    pub fn leaf_hash(&self) -> Hash {
        Hash(Sha256::digest(self.encode()).into())
    }

    /// Whether `timestamp` falls inside `[start_time, end_time]`.
    pub fn is_within_window(&self, timestamp: u64) -> bool {
        self.start_time <= timestamp && timestamp <= self.end_time
    }
}

fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// The environment of the invoking transaction: who is calling, when, and
/// at what fee per gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    /// Current time in seconds.
    pub timestamp: u64,
    /// Effective fee per gas of the invoking transaction.
    pub gas_price: u128,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64, gas_price: u128) -> Self {
        Self {
            caller,
            timestamp,
            gas_price,
        }
    }

    /// A context for read-only and status calls where time and gas price
    /// play no part.
    pub fn from_caller(caller: Address) -> Self {
        Self::new(caller, 0, 0)
    }
}

/// Serde adapter for `0x`-prefixed hex byte strings.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(digits).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for amounts written as integers or decimal strings.
pub(crate) mod amount {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        match i64::try_from(*value) {
            Ok(small) => serializer.serialize_i64(small),
            Err(_) => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl Visitor<'_> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom(format!("amount {v} is negative")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(u128::from(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.replace('_', "")
                .parse()
                .map_err(|_| E::custom(format!("invalid amount {v:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op() -> Operation {
        Operation {
            target: Address::from_low_u8(0x11),
            value: 5,
            call_data: vec![0xde, 0xad, 0xbe, 0xef],
            call_type: CallType::Call,
            operation_id: 3,
            is_repeatable: false,
            start_time: 100,
            end_time: 200,
            max_gas_price: 50,
            gas_limit: 21_000,
            gas_token: Address::ZERO,
        }
    }

    #[test]
    fn encoding_has_fixed_width() {
        assert_eq!(op().encode().len(), Operation::ENCODED_WORDS * 32);
    }

    #[test]
    fn encoding_layout() {
        let encoded = op().encode();
        // Target is left-padded into the first word.
        assert_eq!(&encoded[..12], &[0u8; 12]);
        assert_eq!(encoded[31], 0x11);
        // Value is big-endian in the second word.
        assert_eq!(encoded[63], 5);
        // Operation id lives in the fifth word.
        assert_eq!(encoded[4 * 32 + 31], 3);
    }

    #[test]
    fn leaf_hash_is_deterministic() {
        assert_eq!(op().leaf_hash(), op().leaf_hash());
    }

    #[test]
    fn every_field_affects_the_leaf() {
        let base = op().leaf_hash();
        let variants: Vec<Operation> = vec![
            Operation { target: Address::from_low_u8(0x12), ..op() },
            Operation { value: 6, ..op() },
            Operation { call_data: vec![0xde, 0xad], ..op() },
            Operation { call_type: CallType::DelegateCall, ..op() },
            Operation { operation_id: 4, ..op() },
            Operation { is_repeatable: true, ..op() },
            Operation { start_time: 101, ..op() },
            Operation { end_time: 201, ..op() },
            Operation { max_gas_price: 51, ..op() },
            Operation { gas_limit: 1, ..op() },
            Operation { gas_token: Address::from_low_u8(1), ..op() },
        ];
        for variant in variants {
            assert_ne!(variant.leaf_hash(), base, "{variant:?}");
        }
    }

    #[test]
    fn window_is_inclusive() {
        let op = op();
        assert!(!op.is_within_window(99));
        assert!(op.is_within_window(100));
        assert!(op.is_within_window(200));
        assert!(!op.is_within_window(201));
    }

    #[test]
    fn call_type_parse() {
        assert_eq!("call".parse::<CallType>().unwrap(), CallType::Call);
        assert_eq!(
            "delegate_call".parse::<CallType>().unwrap(),
            CallType::DelegateCall
        );
        assert!("static_call".parse::<CallType>().is_err());
    }

    #[test]
    fn operation_json_uses_hex_call_data() {
        let json = serde_json::to_value(op()).unwrap();
        assert_eq!(json["call_data"], "0xdeadbeef");
        let back: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(back, op());
    }
}
