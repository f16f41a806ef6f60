//! Two-layer AES: the leading block is an ECB-encrypted IV, the rest is
//! AES-128-CBC with PKCS#7 padding under the same key.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecrypt, BlockDecryptMut, KeyInit, KeyIvInit};
use aes::Aes128;

use crate::error::DecodeError;

type Aes128CbcDec = cbc::Decryptor<Aes128>;

pub const BLOCK_SIZE: usize = 16;

/// Decrypt `ciphertext` (`ecb(iv) || cbc(data)`) with a 16-byte `key`.
pub fn decrypt(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if key.len() != BLOCK_SIZE {
        return Err(DecodeError::InvalidKey(format!(
            "AES key must be {BLOCK_SIZE} bytes, got {}",
            key.len()
        )));
    }
    // IV block plus at least one padded data block.
    if ciphertext.len() < 2 * BLOCK_SIZE || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(DecodeError::DecryptionError(format!(
            "ciphertext length {} is not a whole number of blocks after the IV",
            ciphertext.len()
        )));
    }

    let ecb = Aes128::new_from_slice(key)
        .map_err(|e| DecodeError::InvalidKey(format!("failed to initialise AES: {e}")))?;
    let mut iv = aes::Block::clone_from_slice(&ciphertext[..BLOCK_SIZE]);
    ecb.decrypt_block(&mut iv);

    let mut buffer = ciphertext[BLOCK_SIZE..].to_vec();
    let plain_len = Aes128CbcDec::new_from_slices(key, iv.as_slice())
        .map_err(|e| DecodeError::DecryptionError(format!("failed to initialise AES-CBC: {e}")))?
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map_err(|_| DecodeError::DecryptionError("invalid PKCS#7 padding".to_string()))?
        .len();
    buffer.truncate(plain_len);
    Ok(buffer)
}
