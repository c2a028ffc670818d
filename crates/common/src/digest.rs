//! SHA-256 digests rendered as lowercase hex.

use sha2::{Digest, Sha256};

/// Hash `parts` in order and return the hex digest.
pub fn sha256_hex<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    to_hex(&hasher.finalize())
}

pub fn to_hex(bytes: &[u8]) -> String {
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
    fn test_known_digest() {
        assert_eq!(
            sha256_hex([b"abc".as_slice()]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_parts_hash_like_their_concatenation() {
        assert_eq!(sha256_hex([b"ab".as_slice(), b"c"]), sha256_hex([b"abc".as_slice()]));
        assert_eq!(to_hex(&[0x00, 0x0f, 0xff]), "000fff");
    }
}
