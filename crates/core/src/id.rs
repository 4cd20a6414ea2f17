//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 20-byte account address, as used by the external token service.
///
/// The all-zero address is a sentinel ("no account") and is never a valid
/// deposit owner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address([u8; 20]);

impl Address {
    /// The zero sentinel address.
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for Address {
    fn from(value: [u8; 20]) -> Self {
        Self(value)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("address must be 40 hex digits (optionally 0x-prefixed)")]
    InvalidLength,

    #[error("invalid hex digit at position {0}")]
    InvalidDigit(usize),
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        if hex.len() != 40 {
            return Err(ParseAddressError::InvalidLength);
        }

        let mut bytes = [0u8; 20];
        for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
            let hi = (chunk[0] as char)
                .to_digit(16)
                .ok_or(ParseAddressError::InvalidDigit(i * 2))?;
            let lo = (chunk[1] as char)
                .to_digit(16)
                .ok_or(ParseAddressError::InvalidDigit(i * 2 + 1))?;
            bytes[i] = (hi as u8) << 4 | lo as u8;
        }
        Ok(Self(bytes))
    }
}

macro_rules! impl_int_newtype {
    ($t:ty) => {
        impl $t {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

/// Identifier of a deposit. Caller-supplied; unique among *live* deposits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepositId(u64);

/// Identifier of a yield configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YieldConfigId(u64);

impl_int_newtype!(DepositId);
impl_int_newtype!(YieldConfigId);
