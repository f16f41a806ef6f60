//! `.st` obfuscated script container.
//!
//! Layout: a 12-byte header of three little-endian `u32`s
//! `(xor_seed, payload_size, verify_seed)`, followed by `payload_size` bytes
//! XORed with a single derived byte. The de-XORed payload is deflate data
//! (zlib-wrapped or raw); the first [`PAD_LEN`] bytes of the inflated output
//! are padding, the rest is the script text.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};

use crate::error::DecodeError;

pub const HEADER_LEN: usize = 12;
pub const PAD_LEN: usize = 512;
const SEED_MASK: u32 = 0xFFFE_A4C8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub xor_seed: u32,
    pub payload_size: u32,
    /// Carried in the header but never checked.
    pub verify_seed: u32,
}

impl ContainerHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_LEN {
            return Err(DecodeError::TruncatedHeader { len: bytes.len() });
        }
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Ok(Self {
            xor_seed: word(0),
            payload_size: word(4),
            verify_seed: word(8),
        })
    }

    pub fn xor_key(&self) -> u8 {
        ((self.xor_seed ^ SEED_MASK) & 0xFF) as u8
    }
}

/// Decode a complete `.st` file into its script text.
pub fn decode(bytes: &[u8]) -> Result<String, DecodeError> {
    let header = ContainerHeader::parse(bytes)?;
    let key = header.xor_key();

    // A short body is taken as-is; inflate reports the damage.
    let end = HEADER_LEN.saturating_add(header.payload_size as usize).min(bytes.len());
    let payload: Vec<u8> = bytes[HEADER_LEN..end].iter().map(|b| b ^ key).collect();

    let inflated = inflate(&payload)?;
    if inflated.len() < PAD_LEN {
        return Err(DecodeError::CorruptPayload(format!(
            "inflated payload is {} bytes, shorter than the {PAD_LEN}-byte pad",
            inflated.len()
        )));
    }
    String::from_utf8(inflated[PAD_LEN..].to_vec())
        .map_err(|e| DecodeError::CorruptPayload(format!("script is not UTF-8: {e}")))
}

fn inflate(payload: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    let result = if has_zlib_header(payload) {
        ZlibDecoder::new(payload).read_to_end(&mut out)
    } else {
        DeflateDecoder::new(payload).read_to_end(&mut out)
    };
    result.map_err(|e| DecodeError::CorruptPayload(format!("inflate failed: {e}")))?;
    Ok(out)
}

/// RFC 1950: CM = 8, and CMF/FLG as a big-endian u16 is a multiple of 31.
fn has_zlib_header(payload: &[u8]) -> bool {
    match payload {
        [cmf, flg, ..] => cmf & 0x0F == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}
