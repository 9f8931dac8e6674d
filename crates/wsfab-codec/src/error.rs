#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    #[error("crypto provider could not be acquired")]
    ProviderAcquire,

    #[error("could not create hash context for algorithm {0:?}")]
    HashCreate(DigestAlgorithm),

    #[error("key derivation failed")]
    KeyDerive,

    #[error("cipher block length mismatch")]
    BlockLength,

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed")]
    Decrypt,

    #[error("input was not valid base64")]
    InvalidBase64,
}

/// Digest algorithms supported by [`crate::digest::digest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Md2,
    Md4,
    Md5,
    Sha256,
    Sha384,
    Sha512,
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        Self::Sha1
    }
}
