//! OpenSSL `EVP_BytesToKey` key derivation, as used by CryptoJS for
//! passphrase-based AES.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest used to chain KDF blocks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KdfDigest {
    #[default]
    Md5,
    Sha256,
}

impl KdfDigest {
    fn digest(self, previous: &[u8], password: &[u8], salt: &[u8]) -> Vec<u8> {
        match self {
            KdfDigest::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(previous);
                hasher.update(password);
                hasher.update(salt);
                hasher.finalize().to_vec()
            }
            KdfDigest::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(previous);
                hasher.update(password);
                hasher.update(salt);
                hasher.finalize().to_vec()
            }
        }
    }
}

/// Derives `(key, iv)` with a single digest iteration per block.
///
/// Blocks are `D_1 = H(password ++ salt)`, `D_i = H(D_{i-1} ++ password ++ salt)`,
/// concatenated until `key_len + iv_len` bytes are available.
pub fn evp_bytes_to_key(
    password: &[u8],
    salt: &[u8],
    key_len: usize,
    iv_len: usize,
    digest: KdfDigest,
) -> (Vec<u8>, Vec<u8>) {
    let total = key_len + iv_len;
    let mut derived = Vec::with_capacity(total + 32);
    let mut block: Vec<u8> = Vec::new();

    while derived.len() < total {
        block = digest.digest(&block, password, salt);
        derived.extend_from_slice(&block);
    }

    let iv = derived[key_len..total].to_vec();
    derived.truncate(key_len);
    (derived, iv)
}

#[cfg(test)]
mod tests {
    use super::*;

    // reference values from `openssl enc -aes-256-cbc -md md5 -S <salt> -p`
    #[test]
    fn test_md5_matches_openssl() {
        let salt = hex::decode("8f0d2b6a11c4e937").unwrap();
        let (key, iv) = evp_bytes_to_key(b"tachi-embed-key", &salt, 32, 16, KdfDigest::Md5);
        assert_eq!(
            hex::encode(key),
            "45dc7a0675a03306389ce9cab99c4096ab3f0ec79e10ec9f3dd458d8e2d3447f"
        );
        assert_eq!(hex::encode(iv), "50cf5dea529b473acab0373360b321db");
    }

    #[test]
    fn test_sha256_matches_openssl() {
        let salt = hex::decode("a1b2c3d4e5f60718").unwrap();
        let (key, iv) = evp_bytes_to_key(b"sha-profile", &salt, 32, 16, KdfDigest::Sha256);
        assert_eq!(
            hex::encode(key),
            "9f160640e00982af699b1e45155915d3f7641669607317b2c29cc5a3414178e1"
        );
        assert_eq!(hex::encode(iv), "3a66fe8dd559f250f30e213eb903b58b");
    }

    #[test]
    fn test_aes128_key_split() {
        let salt = hex::decode("1122334455667788").unwrap();
        let (key, iv) = evp_bytes_to_key(b"k128", &salt, 16, 16, KdfDigest::Md5);
        assert_eq!(hex::encode(key), "bf9d0054787fc01993b84cd23ec6ddfb");
        assert_eq!(hex::encode(iv), "2c48fb6ff275899ea67a1cc395e9cb50");
    }
}
