use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rc4::{KeyInit, Rc4, StreamCipher};
use sha2::{Digest as _, Sha256};

use crate::base64;
use crate::error::CodecError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Symmetric cipher: AES-256-CBC keyed by SHA-256(password), PKCS7 padded.
///
/// Per spec.md §4.1 / DESIGN.md, the IV is sixteen zero bytes: the token is a
/// single symmetric shared secret with no channel to negotiate or transmit a
/// random IV alongside the ciphertext.
pub struct SymmetricCipher;

const ZERO_IV: [u8; 16] = [0u8; 16];

impl SymmetricCipher {
    fn derive_key(password: &str) -> [u8; 32] {
        let digest = Sha256::digest(password.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        key
    }

    /// Encrypts UTF-8 `cleartext` under `password`, returning Base64 ciphertext.
    pub fn encrypt(password: &str, cleartext: &str) -> Result<String, CodecError> {
        let key = Self::derive_key(password);
        let encryptor = Aes256CbcEnc::new(&key.into(), &ZERO_IV.into());
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(cleartext.as_bytes());
        Ok(base64::encode(&ciphertext))
    }

    /// Decrypts Base64 `ciphertext` under `password` back to UTF-8 cleartext.
    pub fn decrypt(password: &str, ciphertext: &str) -> Result<String, CodecError> {
        let key = Self::derive_key(password);
        let raw = base64::decode(ciphertext);
        if raw.is_empty() || raw.len() % 16 != 0 {
            return Err(CodecError::BlockLength);
        }
        let decryptor = Aes256CbcDec::new(&key.into(), &ZERO_IV.into());
        let plain = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&raw)
            .map_err(|_| CodecError::Decrypt)?;
        String::from_utf8(plain).map_err(|_| CodecError::Decrypt)
    }
}

/// RC4 "fast cipher": one-shot stream cipher keyed by the raw password bytes.
pub struct FastCipher;

impl FastCipher {
    /// Encrypts `cleartext`, returning Base64 ciphertext.
    pub fn encrypt(password: &str, cleartext: &str) -> Result<String, CodecError> {
        let mut buf = cleartext.as_bytes().to_vec();
        let mut rc4 = Rc4::new_from_slice(password.as_bytes()).map_err(|_| CodecError::KeyDerive)?;
        rc4.apply_keystream(&mut buf);
        Ok(base64::encode(&buf))
    }

    /// Decrypts Base64 `ciphertext`, returning UTF-8 cleartext.
    pub fn decrypt(password: &str, ciphertext: &str) -> Result<String, CodecError> {
        let mut buf = base64::decode(ciphertext);
        let mut rc4 = Rc4::new_from_slice(password.as_bytes()).map_err(|_| CodecError::KeyDerive)?;
        rc4.apply_keystream(&mut buf);
        String::from_utf8(buf).map_err(|_| CodecError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_round_trip() {
        let cipher = SymmetricCipher::encrypt("token", "hello world").unwrap();
        assert_eq!(SymmetricCipher::decrypt("token", &cipher).unwrap(), "hello world");
    }

    #[test]
    fn rc4_round_trip() {
        let cipher = FastCipher::encrypt("token", "hello world").unwrap();
        assert_eq!(FastCipher::decrypt("token", &cipher).unwrap(), "hello world");
    }

    #[test]
    fn aes_wrong_password_fails() {
        let cipher = SymmetricCipher::encrypt("token", "hello world").unwrap();
        assert!(SymmetricCipher::decrypt("wrong", &cipher).is_err());
    }
}
