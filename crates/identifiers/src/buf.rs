use std::str::FromStr;

use const_hex as hex;

use crate::macros::internal;

/// A 20-byte buffer.
///
/// This is the raw form of account addresses.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Buf20(pub [u8; 20]);
internal::impl_buf_core!(Buf20, 20);
internal::impl_buf_fmt!(Buf20, 20);
internal::impl_buf_borsh!(Buf20, 20);
internal::impl_buf_arbitrary!(Buf20, 20);
internal::impl_buf_serde!(Buf20, 20);

impl FromStr for Buf20 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode_to_array(s).map(Self::new)
    }
}

/// A 32-byte buffer.
///
/// This is useful for hashes and public key hashes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Buf32(pub [u8; 32]);
internal::impl_buf_core!(Buf32, 32);
internal::impl_buf_fmt!(Buf32, 32);
internal::impl_buf_borsh!(Buf32, 32);
internal::impl_buf_arbitrary!(Buf32, 32);
internal::impl_buf_serde!(Buf32, 32);

impl FromStr for Buf32 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode_to_array(s).map(Self::new)
    }
}
