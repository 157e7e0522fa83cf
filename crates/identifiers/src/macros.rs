/// Generates impls for newtypes wrapping one of the buffer types.
///
/// This must be a newtype a la `struct Foo(Bar);`.
#[macro_export]
macro_rules! impl_buf_wrapper {
    ($wrapper:ident, $name:ident, $len:expr) => {
        impl $wrapper {
            pub const LEN: usize = $len;

            pub const fn new(data: [u8; $len]) -> Self {
                Self($name::new(data))
            }

            pub const fn as_slice(&self) -> &[u8] {
                self.0.as_slice()
            }

            pub const fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            pub fn inner(&self) -> &$name {
                &self.0
            }

            pub fn into_inner(self) -> $name {
                self.0
            }
        }

        impl ::std::convert::From<$name> for $wrapper {
            fn from(value: $name) -> Self {
                Self(value)
            }
        }

        impl ::std::convert::From<$wrapper> for $name {
            fn from(value: $wrapper) -> Self {
                value.0
            }
        }

        impl ::std::convert::From<[u8; $len]> for $wrapper {
            fn from(value: [u8; $len]) -> Self {
                Self($name::new(value))
            }
        }

        impl ::std::convert::AsRef<[u8; $len]> for $wrapper {
            fn as_ref(&self) -> &[u8; $len] {
                self.0.as_ref()
            }
        }

        impl ::core::fmt::Debug for $wrapper {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Debug::fmt(&self.0, f)
            }
        }

        impl ::core::fmt::Display for $wrapper {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

pub(crate) mod internal {
    // Crate-internal impls.

    /// Generates the foundational API for a fixed-size byte buffer type.
    ///
    /// Provides constructors (`new`, `zero`), accessors (`as_slice`,
    /// `as_mut_slice`, `is_zero`), the `LEN` constant, standard conversion
    /// traits (`AsRef`, `AsMut`, `From`, `TryFrom`), and `Default`.
    macro_rules! impl_buf_core {
        ($name:ident, $len:expr) => {
            impl $name {
                pub const LEN: usize = $len;

                pub const fn new(data: [u8; $len]) -> Self {
                    Self(data)
                }

                pub const fn as_slice(&self) -> &[u8] {
                    &self.0
                }

                pub const fn as_mut_slice(&mut self) -> &mut [u8] {
                    &mut self.0
                }

                pub const fn zero() -> Self {
                    Self::new([0; $len])
                }

                pub const fn is_zero(&self) -> bool {
                    let mut i = 0;
                    while i < $len {
                        if self.0[i] != 0 {
                            return false;
                        }
                        i += 1;
                    }
                    true
                }
            }

            impl ::std::convert::AsRef<[u8; $len]> for $name {
                fn as_ref(&self) -> &[u8; $len] {
                    &self.0
                }
            }

            impl ::std::convert::AsMut<[u8]> for $name {
                fn as_mut(&mut self) -> &mut [u8] {
                    &mut self.0
                }
            }

            impl ::std::convert::From<[u8; $len]> for $name {
                fn from(data: [u8; $len]) -> Self {
                    Self(data)
                }
            }

            impl ::std::convert::From<$name> for [u8; $len] {
                fn from(buf: $name) -> Self {
                    buf.0
                }
            }

            impl<'a> ::std::convert::From<&'a [u8; $len]> for $name {
                fn from(data: &'a [u8; $len]) -> Self {
                    Self(*data)
                }
            }

            impl<'a> ::std::convert::TryFrom<&'a [u8]> for $name {
                type Error = &'a [u8];

                fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
                    if value.len() == $len {
                        let mut arr = [0; $len];
                        arr.copy_from_slice(value);
                        Ok(Self(arr))
                    } else {
                        Err(value)
                    }
                }
            }

            impl ::std::default::Default for $name {
                fn default() -> Self {
                    Self([0; $len])
                }
            }
        };
    }

    /// Generates `Debug` (full hex) and `Display` (truncated hex) formatting.
    macro_rules! impl_buf_fmt {
        ($name:ident, $len:expr) => {
            impl ::std::fmt::Debug for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    // twice as large, required by the hex::encode_to_slice.
                    let mut buf = [0; $len * 2];
                    ::const_hex::encode_to_slice(self.0, &mut buf).expect("buf: enc hex");
                    f.write_str(unsafe { ::core::str::from_utf8_unchecked(&buf) })
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    // fmt only first and last bits of data.
                    let mut buf = [0; 6];
                    ::const_hex::encode_to_slice(&self.0[..3], &mut buf).expect("buf: enc hex");
                    f.write_str(unsafe { ::core::str::from_utf8_unchecked(&buf) })?;
                    f.write_str("..")?;
                    ::const_hex::encode_to_slice(&self.0[$len - 3..], &mut buf)
                        .expect("buf: enc hex");
                    f.write_str(unsafe { ::core::str::from_utf8_unchecked(&buf) })?;
                    Ok(())
                }
            }
        };
    }

    /// Generates `BorshSerialize` and `BorshDeserialize` impls.
    macro_rules! impl_buf_borsh {
        ($name:ident, $len:expr) => {
            impl ::borsh::BorshSerialize for $name {
                fn serialize<W: ::std::io::Write>(&self, writer: &mut W) -> ::std::io::Result<()> {
                    writer.write_all(self.0.as_ref())?;
                    Ok(())
                }
            }

            impl ::borsh::BorshDeserialize for $name {
                fn deserialize_reader<R: ::std::io::Read>(
                    reader: &mut R,
                ) -> ::std::io::Result<Self> {
                    let mut array = [0u8; $len];
                    reader.read_exact(&mut array)?;
                    Ok(array.into())
                }
            }
        };
    }

    /// Generates `Arbitrary` impl for property-based testing.
    macro_rules! impl_buf_arbitrary {
        ($name:ident, $len:expr) => {
            impl<'a> ::arbitrary::Arbitrary<'a> for $name {
                fn arbitrary(u: &mut ::arbitrary::Unstructured<'a>) -> ::arbitrary::Result<Self> {
                    let mut array = [0u8; $len];
                    u.fill_buffer(&mut array)?;
                    Ok(array.into())
                }
            }
        };
    }

    /// Generates serde impls: hex strings for human-readable formats, raw
    /// bytes otherwise.
    macro_rules! impl_buf_serde {
        ($name:ident, $len:expr) => {
            impl ::serde::Serialize for $name {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: ::serde::Serializer,
                {
                    if serializer.is_human_readable() {
                        serializer.serialize_str(&::const_hex::encode(self.0))
                    } else {
                        serializer.serialize_bytes(&self.0)
                    }
                }
            }

            impl<'de> ::serde::Deserialize<'de> for $name {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: ::serde::Deserializer<'de>,
                {
                    // In the scope of the function to avoid name conflicts
                    // across macro invocations.
                    struct BufVisitor;

                    impl<'de> ::serde::de::Visitor<'de> for BufVisitor {
                        type Value = $name;

                        fn expecting(
                            &self,
                            formatter: &mut ::std::fmt::Formatter<'_>,
                        ) -> ::std::fmt::Result {
                            write!(
                                formatter,
                                "a hex string or byte buffer representing {} bytes",
                                $len
                            )
                        }

                        fn visit_str<E>(self, v: &str) -> Result<$name, E>
                        where
                            E: ::serde::de::Error,
                        {
                            let hex_str = v.strip_prefix("0x").unwrap_or(v);
                            let array = ::const_hex::decode_to_array::<_, $len>(hex_str)
                                .map_err(E::custom)?;
                            Ok($name(array))
                        }

                        fn visit_bytes<E>(self, v: &[u8]) -> Result<$name, E>
                        where
                            E: ::serde::de::Error,
                        {
                            if v.len() == $len {
                                let mut array = [0u8; $len];
                                array.copy_from_slice(v);
                                Ok($name(array))
                            } else {
                                // Try to interpret the bytes as a UTF-8
                                // encoded hex string.
                                let s = ::std::str::from_utf8(v).map_err(E::custom)?;
                                self.visit_str(s)
                            }
                        }
                    }

                    if deserializer.is_human_readable() {
                        deserializer.deserialize_str(BufVisitor)
                    } else {
                        deserializer.deserialize_bytes(BufVisitor)
                    }
                }
            }
        };
    }

    pub(crate) use impl_buf_arbitrary;
    pub(crate) use impl_buf_borsh;
    pub(crate) use impl_buf_core;
    pub(crate) use impl_buf_fmt;
    pub(crate) use impl_buf_serde;
}
