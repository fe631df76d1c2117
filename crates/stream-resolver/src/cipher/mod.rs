//! Password-based AES compatible with CryptoJS' OpenSSL convention.
//!
//! Pages embed payloads produced by `CryptoJS.AES.encrypt(text, passphrase)`.
//! These helpers reverse them byte for byte. Site specific variants are
//! modelled as [`CipherProfile`]s.

mod aes_cbc;
pub mod error;
pub mod kdf;
pub mod profiles;

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use error::DecryptError;
pub use kdf::{KdfDigest, evp_bytes_to_key};
pub use profiles::{CipherProfile, CipherSecret};

/// Marker OpenSSL writes in front of salted payloads.
pub const SALTED_MARKER: &[u8; 8] = b"Salted__";
pub const SALT_LEN: usize = 8;
pub const DEFAULT_KEY_BITS: u32 = 256;
const IV_BITS: u32 = 128;

/// Inputs of one CryptoJS style decryption.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CipherParams {
    pub ciphertext_b64: String,
    pub salt_hex: String,
    // informational, CryptoJS re-derives the IV from password and salt
    #[serde(default)]
    pub iv_hex: String,
    pub password: String,
}

#[derive(Deserialize)]
struct CryptoJsJson {
    ct: String,
    #[serde(default)]
    s: String,
    #[serde(default)]
    iv: String,
}

impl CipherParams {
    /// Builds params from the `{"ct": .., "s": .., "iv": ..}` JSON CryptoJS emits.
    pub fn from_cryptojs_json(json: &str, password: &str) -> Result<Self, DecryptError> {
        let parsed: CryptoJsJson = serde_json::from_str(json)
            .map_err(|e| DecryptError::MalformedPayload(e.to_string()))?;
        Ok(Self {
            ciphertext_b64: parsed.ct,
            salt_hex: parsed.s,
            iv_hex: parsed.iv,
            password: password.to_string(),
        })
    }
}

fn key_len(key_bits: u32) -> Result<usize, DecryptError> {
    match key_bits {
        128 | 192 | 256 => Ok((key_bits / 8) as usize),
        other => Err(DecryptError::UnsupportedKeySize(other)),
    }
}

fn decode_salt(salt_hex: &str) -> Result<Vec<u8>, DecryptError> {
    let salt = hex::decode(salt_hex.trim())?;
    if !salt.is_empty() && salt.len() != SALT_LEN {
        return Err(DecryptError::InvalidSaltLength(salt.len()));
    }
    Ok(salt)
}

/// Core routine shared by every EVP based profile.
pub(crate) fn decrypt_with_kdf(
    ciphertext: &[u8],
    password: &str,
    salt: &[u8],
    digest: KdfDigest,
    key_bits: u32,
) -> Result<Vec<u8>, DecryptError> {
    let key_len = key_len(key_bits)?;
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }
    let (key, iv) = evp_bytes_to_key(
        password.as_bytes(),
        salt,
        key_len,
        (IV_BITS / 8) as usize,
        digest,
    );
    aes_cbc::decrypt(&key, &iv, ciphertext)
}

fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    salt
}

/// Decrypts CryptoJS params with MD5 key derivation and AES-256.
pub fn decrypt(params: &CipherParams) -> Result<Vec<u8>, DecryptError> {
    let ciphertext = STANDARD.decode(params.ciphertext_b64.trim())?;
    let salt = decode_salt(&params.salt_hex)?;
    decrypt_with_kdf(
        &ciphertext,
        &params.password,
        &salt,
        KdfDigest::Md5,
        DEFAULT_KEY_BITS,
    )
}

fn encrypt_with_kdf(
    password: &str,
    salt: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), DecryptError> {
    let (key, iv) = evp_bytes_to_key(
        password.as_bytes(),
        salt,
        (DEFAULT_KEY_BITS / 8) as usize,
        (IV_BITS / 8) as usize,
        KdfDigest::Md5,
    );
    let ciphertext = aes_cbc::encrypt(&key, &iv, plaintext)?;
    Ok((ciphertext, iv))
}

/// Inverse of [`decrypt`]; a fresh random salt is drawn on every call.
pub fn encrypt(password: &str, plaintext: &[u8]) -> Result<CipherParams, DecryptError> {
    let salt = random_salt();
    let (ciphertext, iv) = encrypt_with_kdf(password, &salt, plaintext)?;

    Ok(CipherParams {
        ciphertext_b64: STANDARD.encode(ciphertext),
        salt_hex: hex::encode(salt),
        iv_hex: hex::encode(iv),
        password: password.to_string(),
    })
}

/// Decrypts `Salted__` + salt + ciphertext, the layout `openssl enc` and
/// `CryptoJS.AES.encrypt(..).toString()` produce.
pub fn decrypt_salted_prefix(cipher_bytes: &[u8], password: &str) -> Result<Vec<u8>, DecryptError> {
    decrypt_salted_prefix_with(cipher_bytes, password, KdfDigest::Md5, DEFAULT_KEY_BITS)
}

pub(crate) fn decrypt_salted_prefix_with(
    cipher_bytes: &[u8],
    password: &str,
    digest: KdfDigest,
    key_bits: u32,
) -> Result<Vec<u8>, DecryptError> {
    if cipher_bytes.is_empty() {
        return Ok(Vec::new());
    }
    if cipher_bytes.len() < SALTED_MARKER.len() + SALT_LEN
        || &cipher_bytes[..SALTED_MARKER.len()] != SALTED_MARKER
    {
        return Err(DecryptError::MissingSaltMarker);
    }
    let salt = &cipher_bytes[SALTED_MARKER.len()..SALTED_MARKER.len() + SALT_LEN];
    let ciphertext = &cipher_bytes[SALTED_MARKER.len() + SALT_LEN..];
    decrypt_with_kdf(ciphertext, password, salt, digest, key_bits)
}

/// Produces the salted-prefix layout read by [`decrypt_salted_prefix`].
pub fn encrypt_salted_prefix(password: &str, plaintext: &[u8]) -> Result<Vec<u8>, DecryptError> {
    let salt = random_salt();
    let (ciphertext, _) = encrypt_with_kdf(password, &salt, plaintext)?;

    let mut out = Vec::with_capacity(SALTED_MARKER.len() + SALT_LEN + ciphertext.len());
    out.extend_from_slice(SALTED_MARKER);
    out.extend_from_slice(&salt);
    out.extend(ciphertext);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALTED_VECTOR: &str =
        "U2FsdGVkX1+PDStqEcTpN/q0DLkdaMbvHDK6x7Qo/sKbm4+3TCJqhJq+wZzqSimfAkbgU3XgL8oti7L8nvCz7w==";

    #[test]
    fn test_decrypt_known_vector() {
        let params = CipherParams {
            ciphertext_b64: "aiwo40uf4NElkH+gTcmF7A==".to_string(),
            salt_hex: "0102030405060708".to_string(),
            iv_hex: String::new(),
            password: "Secret Passphrase".to_string(),
        };
        assert_eq!(decrypt(&params).unwrap(), b"Message");
    }

    #[test]
    fn test_decrypt_salted_prefix_vector() {
        let bytes = STANDARD.decode(SALTED_VECTOR).unwrap();
        let plaintext = decrypt_salted_prefix(&bytes, "tachi-embed-key").unwrap();
        assert_eq!(
            String::from_utf8(plaintext).unwrap(),
            "https://cdn.example.net/hls/master.m3u8"
        );
    }

    #[test]
    fn test_round_trip_with_random_salt() {
        for (password, text) in [
            ("pw", "".as_bytes()),
            ("Secret Passphrase", "Message".as_bytes()),
            ("ünïcødé", "exactly sixteen!".as_bytes()),
            ("k", &[0u8, 255, 16, 16, 16][..]),
        ] {
            let params = encrypt(password, text).unwrap();
            assert_eq!(decrypt(&params).unwrap(), text);

            let prefixed = encrypt_salted_prefix(password, text).unwrap();
            assert_eq!(decrypt_salted_prefix(&prefixed, password).unwrap(), text);
        }
    }

    #[test]
    fn test_encrypt_draws_fresh_salt() {
        let a = encrypt("pw", b"same input").unwrap();
        let b = encrypt("pw", b"same input").unwrap();
        assert_ne!(a.salt_hex, b.salt_hex);
    }

    #[test]
    fn test_salted_prefix_layout() {
        let prefixed = encrypt_salted_prefix("pw", b"seventeen bytes!!").unwrap();
        assert_eq!(&prefixed[..8], SALTED_MARKER);
        // marker, salt, then two padded blocks
        assert_eq!(prefixed.len(), 8 + SALT_LEN + 32);
        assert_eq!(
            decrypt_salted_prefix(&prefixed, "pw").unwrap(),
            b"seventeen bytes!!"
        );
    }

    #[test]
    fn test_empty_ciphertext_yields_empty_plaintext() {
        let params = CipherParams {
            ciphertext_b64: String::new(),
            salt_hex: "0102030405060708".to_string(),
            iv_hex: String::new(),
            password: "pw".to_string(),
        };
        assert!(decrypt(&params).unwrap().is_empty());
        assert!(decrypt_salted_prefix(&[], "pw").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_inputs() {
        let mut params = CipherParams {
            ciphertext_b64: "not base64!!".to_string(),
            salt_hex: "0102030405060708".to_string(),
            iv_hex: String::new(),
            password: "pw".to_string(),
        };
        assert!(matches!(decrypt(&params), Err(DecryptError::Base64(_))));

        params.ciphertext_b64 = "g7xSOvYAZKmgtLwERHOEaA==".to_string();
        params.password = "wrong".to_string();
        assert!(matches!(decrypt(&params), Err(DecryptError::BadPadding)));

        params.salt_hex = "0102".to_string();
        assert!(matches!(
            decrypt(&params),
            Err(DecryptError::InvalidSaltLength(2))
        ));

        assert!(matches!(
            decrypt_salted_prefix(b"NotSalted1234567abcdefgh", "pw"),
            Err(DecryptError::MissingSaltMarker)
        ));
    }

    #[test]
    fn test_params_from_cryptojs_json() {
        let json = r#"{"ct":"aiwo40uf4NElkH+gTcmF7A==","iv":"3a48206167f44f5613ebb55cc5a86cb2","s":"0102030405060708"}"#;
        let params = CipherParams::from_cryptojs_json(json, "Secret Passphrase").unwrap();
        assert_eq!(params.salt_hex, "0102030405060708");
        assert_eq!(decrypt(&params).unwrap(), b"Message");
    }
}
