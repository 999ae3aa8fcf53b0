use crate::error::{DappError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Wei per ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
const ETHER_DECIMALS: usize = 18;

/// A 20-byte account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Case-insensitive comparison against an address string as returned by
    /// a wallet, a contract or the subgraph.
    pub fn matches(&self, other: &str) -> bool {
        self.to_string().eq_ignore_ascii_case(other.trim())
    }
}

impl FromStr for Address {
    type Err = DappError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| DappError::InvalidAddress(format!("missing 0x prefix: {}", raw)))?;
        if digits.len() != 40 {
            return Err(DappError::InvalidAddress(format!(
                "expected 40 hex digits, got {}: {}",
                digits.len(),
                raw
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| DappError::InvalidAddress(format!("{}: {}", raw, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub success: bool,
}

/// Encode an integer as a JSON-RPC hex quantity ("0x0", "0x1a").
pub fn to_quantity(value: u128) -> String {
    format!("{:#x}", value)
}

/// Decode a JSON-RPC hex quantity.
pub fn parse_quantity(raw: &str) -> Result<u128> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| DappError::abi(format!("quantity without 0x prefix: {}", raw)))?;
    if digits.is_empty() {
        return Err(DappError::abi("empty quantity"));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| DappError::abi(format!("invalid quantity {}: {}", raw, e)))
}

/// Parse a decimal ether amount ("0.01", "1", "2.5") into wei.
pub fn parse_ether(input: &str) -> Result<u128> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(DappError::InvalidAmount("empty amount".to_string()));
    }
    if raw.starts_with('-') {
        return Err(DappError::InvalidAmount(format!(
            "amount cannot be negative: {}",
            raw
        )));
    }

    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (raw, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(DappError::InvalidAmount(format!("not a number: {}", raw)));
    }
    if fraction.len() > ETHER_DECIMALS {
        return Err(DappError::InvalidAmount(format!(
            "more than {} decimal places: {}",
            ETHER_DECIMALS, raw
        )));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(DappError::InvalidAmount(format!("not a number: {}", raw)));
    }

    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .ok()
            .and_then(|w| w.checked_mul(WEI_PER_ETHER))
            .ok_or_else(|| DappError::InvalidAmount(format!("amount too large: {}", raw)))?
    };

    let fraction_wei = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = ETHER_DECIMALS);
        padded
            .parse::<u128>()
            .map_err(|e| DappError::InvalidAmount(format!("{}: {}", raw, e)))?
    };

    whole_wei
        .checked_add(fraction_wei)
        .ok_or_else(|| DappError::InvalidAmount(format!("amount too large: {}", raw)))
}

/// Render wei as a decimal ether string without trailing zeros.
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0>width$}", fraction, width = ETHER_DECIMALS);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
