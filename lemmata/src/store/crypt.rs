//! ストアのキーと値の難読化
//!
//! キーはSHA-256ダイジェストの先頭16バイトを16進表記した文字列に置き換えられ、
//! 値は平文のキーから導出したキーストリームとのXORで変換されます。変換は
//! 決定的で、同じキーを知っていれば値を復元できます。

use sha2::{Digest, Sha256};

const KEY_DIGEST_LEN: usize = 16;

/// キーを難読化した文字列に変換します。
pub fn digest_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..KEY_DIGEST_LEN])
}

/// 値を難読化します。
///
/// 同じ `key` で二度適用すると元の値に戻ります。
pub fn encode_value(key: &str, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for (counter, chunk) in value.chunks(32).enumerate() {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update((counter as u64).to_le_bytes());
        let block = hasher.finalize();
        out.extend(chunk.iter().zip(block.iter()).map(|(a, b)| a ^ b));
    }
    out
}

/// 難読化された値を復元します。
#[inline(always)]
pub fn decode_value(key: &str, value: &[u8]) -> Vec<u8> {
    encode_value(key, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_key() {
        let digest = digest_key("hase");
        assert_eq!(digest.len(), 32);
        assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(digest, digest_key("hase"));
        assert_ne!(digest, digest_key("hasen"));
    }

    #[test]
    fn test_value_is_restored() {
        let value = "kaninchen#s|häschen#s|*^12|".repeat(5);
        let encoded = encode_value("hase", value.as_bytes());
        assert_ne!(encoded, value.as_bytes());
        assert_eq!(decode_value("hase", &encoded), value.as_bytes());
    }

    #[test]
    fn test_value_depends_on_key() {
        let a = encode_value("hase", b"#s");
        let b = encode_value("nase", b"#s");
        assert_ne!(a, b);
    }
}
