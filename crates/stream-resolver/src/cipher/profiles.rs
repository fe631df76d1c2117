use std::sync::LazyLock;

use base64::{Engine, engine::general_purpose::STANDARD};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    CipherParams, DEFAULT_KEY_BITS, DecryptError, KdfDigest, aes_cbc, decode_salt,
    decrypt_salted_prefix_with, decrypt_with_kdf,
};

// base64 of "Salted__" always starts with this
static SALTED_B64_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"U2FsdGVkX1[A-Za-z0-9+/]+={0,2}").unwrap());

static CRYPTOJS_JSON_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{[^{}]*"ct"\s*:\s*"[^"]+"[^{}]*\}"#).unwrap());

static DATA_VALUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-(?:value|crypto|hash)\s*=\s*["']([A-Za-z0-9+/=]{16,})["']"#).unwrap()
});

static PREFIXED_IV_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"'\s]{16}[0-9a-fA-F]{32,})["']"#).unwrap());

fn default_key_bits() -> u32 {
    DEFAULT_KEY_BITS
}

/// A named cipher layout. Hosters disagree on framing and digests, so each
/// variant stays separate instead of being folded into one scheme.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CipherProfile {
    /// base64 of `Salted__` ++ salt ++ ciphertext.
    SaltedPrefix {
        #[serde(default)]
        digest: KdfDigest,
        #[serde(default = "default_key_bits")]
        key_bits: u32,
    },
    /// CryptoJS JSON formatter output: `{"ct": b64, "s": hex, "iv": hex}`.
    JsonParams {
        #[serde(default)]
        digest: KdfDigest,
        #[serde(default = "default_key_bits")]
        key_bits: u32,
    },
    /// base64 ciphertext under a fixed UTF-8 key and IV.
    StaticKey,
    /// 16 UTF-8 IV characters followed by hex ciphertext, password as key.
    PrefixedIv,
}

impl Default for CipherProfile {
    fn default() -> Self {
        CipherProfile::SaltedPrefix {
            digest: KdfDigest::Md5,
            key_bits: DEFAULT_KEY_BITS,
        }
    }
}

/// Secret material for a profile. `password` doubles as the raw key for
/// [`CipherProfile::StaticKey`] and [`CipherProfile::PrefixedIv`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CipherSecret {
    #[serde(default, alias = "key")]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
}

impl CipherSecret {
    pub fn password<S: Into<String>>(password: S) -> Self {
        Self {
            password: password.into(),
            iv: None,
        }
    }

    pub fn key_iv<S1: Into<String>, S2: Into<String>>(key: S1, iv: S2) -> Self {
        Self {
            password: key.into(),
            iv: Some(iv.into()),
        }
    }
}

impl CipherProfile {
    pub fn name(&self) -> &'static str {
        match self {
            CipherProfile::SaltedPrefix { .. } => "salted-prefix",
            CipherProfile::JsonParams { .. } => "json-params",
            CipherProfile::StaticKey => "static-key",
            CipherProfile::PrefixedIv => "prefixed-iv",
        }
    }

    pub fn decrypt(&self, payload: &str, secret: &CipherSecret) -> Result<Vec<u8>, DecryptError> {
        let payload = payload.trim();
        match self {
            CipherProfile::SaltedPrefix { digest, key_bits } => {
                let bytes = STANDARD.decode(payload)?;
                decrypt_salted_prefix_with(&bytes, &secret.password, *digest, *key_bits)
            }
            CipherProfile::JsonParams { digest, key_bits } => {
                let params = CipherParams::from_cryptojs_json(payload, &secret.password)?;
                let ciphertext = STANDARD.decode(params.ciphertext_b64.trim())?;
                let salt = decode_salt(&params.salt_hex)?;
                decrypt_with_kdf(&ciphertext, &params.password, &salt, *digest, *key_bits)
            }
            CipherProfile::StaticKey => {
                let iv = secret.iv.as_deref().ok_or(DecryptError::InvalidIvLength(0))?;
                let ciphertext = STANDARD.decode(payload)?;
                aes_cbc::decrypt(secret.password.as_bytes(), iv.as_bytes(), &ciphertext)
            }
            CipherProfile::PrefixedIv => {
                if payload.is_empty() {
                    return Ok(Vec::new());
                }
                let split = payload
                    .char_indices()
                    .nth(16)
                    .map(|(idx, _)| idx)
                    .ok_or_else(|| {
                        DecryptError::MalformedPayload(
                            "payload shorter than its 16 character iv".to_string(),
                        )
                    })?;
                let (iv, data) = payload.split_at(split);
                let ciphertext = hex::decode(data)?;
                aes_cbc::decrypt(secret.password.as_bytes(), iv.as_bytes(), &ciphertext)
            }
        }
    }

    pub fn decrypt_to_string(
        &self,
        payload: &str,
        secret: &CipherSecret,
    ) -> Result<String, DecryptError> {
        Ok(String::from_utf8(self.decrypt(payload, secret)?)?)
    }

    /// Locates payloads of this profile inside a page body, in document order.
    pub fn find_payloads<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            CipherProfile::SaltedPrefix { .. } => SALTED_B64_REGEX
                .find_iter(text)
                .map(|m| m.as_str())
                .collect(),
            CipherProfile::JsonParams { .. } => CRYPTOJS_JSON_REGEX
                .find_iter(text)
                .map(|m| m.as_str())
                .collect(),
            CipherProfile::StaticKey => DATA_VALUE_REGEX
                .captures_iter(text)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .collect(),
            CipherProfile::PrefixedIv => PREFIXED_IV_REGEX
                .captures_iter(text)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .collect(),
        }
    }
}
