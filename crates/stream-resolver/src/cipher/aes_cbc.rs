use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};

use super::error::DecryptError;

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

const IV_LEN: usize = 16;

/// AES-CBC with PKCS#7 padding. The AES variant follows the key length.
pub(crate) fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }
    if iv.len() != IV_LEN {
        return Err(DecryptError::InvalidIvLength(iv.len()));
    }

    let invalid_length = |_| DecryptError::InvalidKeyLength(key.len());
    let plaintext = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        other => return Err(DecryptError::InvalidKeyLength(other)),
    };

    plaintext.map_err(|_| DecryptError::BadPadding)
}

pub(crate) fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if iv.len() != IV_LEN {
        return Err(DecryptError::InvalidIvLength(iv.len()));
    }

    let invalid_length = |_| DecryptError::InvalidKeyLength(key.len());
    let ciphertext = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => Aes192CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_length)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        other => return Err(DecryptError::InvalidKeyLength(other)),
    };

    Ok(ciphertext)
}
