//! Base64 codec, legacy/SHA-family digests, and symmetric ciphers (C1).
//!
//! Every entry point in this crate acquires [`PROVIDER_LOCK`] on entry and
//! releases it on every exit path (including error paths), matching the
//! single, process-wide, non-re-entrant crypto provider described in
//! spec.md §5. Modern RustCrypto primitives are already re-entrant, so in
//! practice the lock is never contended; it exists to preserve the
//! documented single-provider contract rather than to work around real
//! re-entrancy bugs.

pub mod base64;
pub mod cipher;
pub mod digest;
pub mod error;

pub use cipher::{FastCipher, SymmetricCipher};
pub use error::{CodecError, DigestAlgorithm};

use std::sync::{Mutex, OnceLock};

static PROVIDER_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn provider_lock() -> &'static Mutex<()> {
    PROVIDER_LOCK.get_or_init(|| Mutex::new(()))
}

/// Stateless facade over this crate's digest/cipher primitives, scoping the
/// process-wide provider lock the way spec.md §5 demands: acquire on entry,
/// release on every exit path via the guard's `Drop`.
pub struct Codec;

impl Codec {
    /// Computes a digest, guarded by the provider lock.
    #[tracing::instrument(skip(data))]
    pub fn digest(algorithm: DigestAlgorithm, data: &[u8], digest_base64: bool) -> String {
        let _guard = provider_lock().lock().unwrap_or_else(|e| e.into_inner());
        digest::digest(algorithm, data, digest_base64)
    }

    /// AES-256-CBC encrypt, guarded by the provider lock.
    #[tracing::instrument(skip(password, cleartext))]
    pub fn encrypt(password: &str, cleartext: &str) -> Result<String, CodecError> {
        let _guard = provider_lock().lock().unwrap_or_else(|e| e.into_inner());
        SymmetricCipher::encrypt(password, cleartext)
    }

    /// AES-256-CBC decrypt, guarded by the provider lock.
    #[tracing::instrument(skip(password, ciphertext))]
    pub fn decrypt(password: &str, ciphertext: &str) -> Result<String, CodecError> {
        let _guard = provider_lock().lock().unwrap_or_else(|e| e.into_inner());
        SymmetricCipher::decrypt(password, ciphertext)
    }

    /// RC4 one-shot encrypt, guarded by the provider lock.
    #[tracing::instrument(skip(password, cleartext))]
    pub fn fast_encrypt(password: &str, cleartext: &str) -> Result<String, CodecError> {
        let _guard = provider_lock().lock().unwrap_or_else(|e| e.into_inner());
        FastCipher::encrypt(password, cleartext)
    }

    /// RC4 one-shot decrypt, guarded by the provider lock.
    #[tracing::instrument(skip(password, ciphertext))]
    pub fn fast_decrypt(password: &str, ciphertext: &str) -> Result<String, CodecError> {
        let _guard = provider_lock().lock().unwrap_or_else(|e| e.into_inner());
        FastCipher::decrypt(password, ciphertext)
    }
}
