use md2::Md2;
use md4::Md4;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest as _, Sha256, Sha384, Sha512};

use crate::base64;
use crate::error::DigestAlgorithm;

/// Computes the raw digest bytes for `data` under `algorithm`.
pub fn digest_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
        DigestAlgorithm::Md2 => Md2::digest(data).to_vec(),
        DigestAlgorithm::Md4 => Md4::digest(data).to_vec(),
        DigestAlgorithm::Md5 => Md5::digest(data).to_vec(),
        DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

/// Presentation of a digest: either lower-case hex or Base64, per the
/// `digestBase64` flag in spec.md §4.1.
pub fn digest(algorithm: DigestAlgorithm, data: &[u8], digest_base64: bool) -> String {
    let raw = digest_bytes(algorithm, data);
    if digest_base64 {
        base64::encode(&raw)
    } else {
        hex(&raw)
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_hex_of_empty_string() {
        assert_eq!(
            digest(DigestAlgorithm::Sha1, b"", false),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn sha256_of_abc() {
        let out = digest(DigestAlgorithm::Sha256, b"abc", false);
        assert_eq!(
            out,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
