//! AES-128-CBC helpers for frame payloads.
//!
//! Payloads are always whole blocks, so no padding scheme is applied; callers
//! pad with zeros before encrypting.

use aes::Aes128;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::constants::AES_BLOCK_SIZE;
use crate::error::BLError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Encrypt `plaintext` with AES-128-CBC.
///
/// Fails with [`BLError::InvalidPayloadLength`] unless the input is a multiple of 16 bytes.
pub fn encrypt(key: &[u8; 16], iv: &[u8; 16], plaintext: &[u8]) -> Result<Vec<u8>, BLError> {
    if !plaintext.len().is_multiple_of(AES_BLOCK_SIZE) {
        return Err(BLError::InvalidPayloadLength(plaintext.len()));
    }

    let mut buffer = plaintext.to_vec();
    let len = buffer.len();
    Aes128CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
        .map_err(|_| BLError::InvalidPayloadLength(len))?;

    Ok(buffer)
}

/// Decrypt `ciphertext` with AES-128-CBC.
///
/// Fails with [`BLError::BlockAlignment`] unless the input is a multiple of 16 bytes.
pub fn decrypt(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>, BLError> {
    if !ciphertext.len().is_multiple_of(AES_BLOCK_SIZE) {
        return Err(BLError::BlockAlignment(ciphertext.len()));
    }

    let mut buffer = ciphertext.to_vec();
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buffer)
        .map_err(|_| BLError::BlockAlignment(ciphertext.len()))?;

    Ok(buffer)
}
