use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecryptError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid salt length: {0} bytes (expected 8)")]
    InvalidSaltLength(usize),
    #[error("missing `Salted__` marker")]
    MissingSaltMarker,
    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),
    #[error("invalid iv length: {0} bytes (expected 16)")]
    InvalidIvLength(usize),
    #[error("unsupported key size: {0} bits")]
    UnsupportedKeySize(u32),
    #[error("bad padding or wrong password")]
    BadPadding,
    #[error("plaintext is not valid utf-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}
