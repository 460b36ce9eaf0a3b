//! Account address decoding for XCM beneficiaries
//!
//! Accepts SS58 addresses of any network prefix as well as raw `0x`-prefixed
//! 32-byte account ids. See: https://docs.substrate.io/reference/address-formats/

use crate::error::{Error, Result};
use blake2::{Blake2b512, Digest};

/// SS58 prefix for checksum calculation
const SS58_PREFIX: &[u8] = b"SS58PRE";

/// Length of an AccountId32
pub const ACCOUNT_ID_LEN: usize = 32;

/// Decode a human readable address into the 32-byte account id
///
/// The network prefix of an SS58 address is not checked: the id is the same
/// on every chain and XCM junctions only carry the raw bytes.
pub fn decode_address(address: &str) -> Result<[u8; ACCOUNT_ID_LEN]> {
    let public_key = match address.strip_prefix("0x") {
        Some(hex_str) => hex::decode(hex_str)
            .map_err(|e| Error::InvalidAddress(format!("Invalid hex: {}", e)))?,
        None => decode_ss58(address)?.0,
    };

    public_key.try_into().map_err(|v: Vec<u8>| {
        Error::InvalidAddress(format!(
            "Account id must be {} bytes, got {}",
            ACCOUNT_ID_LEN,
            v.len()
        ))
    })
}

/// Encode a public key to SS58 address format
///
/// # Arguments
/// * `public_key` - 32-byte public key
/// * `prefix` - Network prefix (0 for Polkadot, 2 for Kusama, 42 for generic Substrate)
pub fn encode_ss58(public_key: &[u8], prefix: u16) -> Result<String> {
    if public_key.len() != ACCOUNT_ID_LEN {
        return Err(Error::InvalidAddress(format!(
            "Public key must be 32 bytes, got {}",
            public_key.len()
        )));
    }

    let mut payload = encode_prefix(prefix)?;
    payload.extend_from_slice(public_key);

    let checksum = ss58_checksum(&payload);
    payload.extend_from_slice(&checksum[..2]);

    Ok(bs58::encode(&payload).into_string())
}

/// Decode an SS58 address to public key and prefix
pub fn decode_ss58(address: &str) -> Result<(Vec<u8>, u16)> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| Error::InvalidAddress(format!("Invalid base58: {}", e)))?;

    if decoded.len() < 35 {
        return Err(Error::InvalidAddress("Address too short".to_string()));
    }

    let (prefix, prefix_len) = decode_prefix(&decoded)?;

    let checksum_start = decoded.len() - 2;
    let public_key = &decoded[prefix_len..checksum_start];
    let checksum = &decoded[checksum_start..];

    if public_key.len() != ACCOUNT_ID_LEN {
        return Err(Error::InvalidAddress(format!(
            "Invalid public key length: {}",
            public_key.len()
        )));
    }

    let expected_checksum = ss58_checksum(&decoded[..checksum_start]);
    if checksum != &expected_checksum[..2] {
        return Err(Error::InvalidAddress("Invalid checksum".to_string()));
    }

    Ok((public_key.to_vec(), prefix))
}

/// Encode SS58 prefix (supports single and two-byte prefixes)
fn encode_prefix(prefix: u16) -> Result<Vec<u8>> {
    if prefix < 64 {
        Ok(vec![prefix as u8])
    } else if prefix < 16384 {
        let first = ((prefix & 0b0000_0000_1111_1100) as u8) >> 2 | 0b0100_0000;
        let second = ((prefix >> 8) as u8) | ((prefix & 0b0000_0000_0000_0011) as u8) << 6;
        Ok(vec![first, second])
    } else {
        Err(Error::InvalidAddress(format!("Invalid prefix: {}", prefix)))
    }
}

fn decode_prefix(data: &[u8]) -> Result<(u16, usize)> {
    match data[0] {
        b if b < 64 => Ok((b as u16, 1)),
        b if b < 128 => {
            let lower = (b & 0b0011_1111) << 2 | (data[1] >> 6);
            let upper = data[1] & 0b0011_1111;
            Ok((((upper as u16) << 8) | (lower as u16), 2))
        }
        b => Err(Error::InvalidAddress(format!("Invalid prefix byte: {}", b))),
    }
}

/// Blake2b-512 of "SS58PRE" || payload
fn ss58_checksum(payload: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(payload);
    let mut checksum = [0u8; 64];
    checksum.copy_from_slice(&hasher.finalize());
    checksum
}
