//! Minimal ABI encoding for the static types the game contract uses.

use crate::error::{DappError, Result};
use crate::types::Address;
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(u128),
    Address(Address),
    Bool(bool),
}

/// First four bytes of keccak-256 of the canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Calldata for `signature` with the given static arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&encode_word(arg));
    }
    data
}

pub fn encode_word(token: &Token) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match token {
        Token::Uint(value) => word[16..].copy_from_slice(&value.to_be_bytes()),
        Token::Address(address) => word[12..].copy_from_slice(address.as_bytes()),
        Token::Bool(value) => word[31] = u8::from(*value),
    }
    word
}

fn first_word(data: &[u8]) -> Result<&[u8]> {
    data.get(..WORD).ok_or_else(|| {
        DappError::abi(format!(
            "return data too short: {} bytes, need {}",
            data.len(),
            WORD
        ))
    })
}

pub fn decode_bool(data: &[u8]) -> Result<bool> {
    let word = first_word(data)?;
    if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
        return Err(DappError::abi("invalid bool encoding"));
    }
    Ok(word[31] == 1)
}

pub fn decode_address(data: &[u8]) -> Result<Address> {
    let word = first_word(data)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(DappError::abi("invalid address encoding"));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::from_bytes(bytes))
}
