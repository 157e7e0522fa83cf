use std::str::FromStr;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use const_hex as hex;
use serde::{Deserialize, Serialize};

use crate::buf::Buf20;

/// Account address.
///
/// Addresses are opaque 20-byte identifiers assigned when an account is
/// created. They have no internal structure the state layer cares about.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Default,
    Arbitrary,
    BorshDeserialize,
    BorshSerialize,
    Deserialize,
    Serialize,
)]
pub struct Address(Buf20);
crate::impl_buf_wrapper!(Address, Buf20, 20);

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Buf20::from_str(s).map(Self::from)
    }
}

/// Process identifier, a single byte.
///
/// Process-scoped data keys carry this as their one-byte prefix.
pub type ProcessId = u8;
