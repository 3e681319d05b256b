//! Shared configuration for the payload pipeline and the bit-stream layer.

use serde::{Deserialize, Serialize};

/// The two ciphers the payload pipeline knows how to drive.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    Aes128,
    Aes256,
}

impl CipherAlgorithm {
    /// Key length in bytes for this cipher.
    pub fn key_len(self) -> usize {
        match self {
            CipherAlgorithm::Aes128 => 16,
            CipherAlgorithm::Aes256 => 32,
        }
    }

    /// 8-byte, space-padded, ASCII representation used in the data header.
    pub fn as_header_bytes(self) -> [u8; 8] {
        let name: &[u8] = match self {
            CipherAlgorithm::Aes128 => b"AES128",
            CipherAlgorithm::Aes256 => b"AES256",
        };
        let mut out = [b' '; 8];
        out[..name.len()].copy_from_slice(name);
        out
    }

    pub fn parse(name: &str) -> Option<CipherAlgorithm> {
        match name.trim_end() {
            "AES128" => Some(CipherAlgorithm::Aes128),
            "AES256" => Some(CipherAlgorithm::Aes256),
            _ => None,
        }
    }
}

impl Default for CipherAlgorithm {
    fn default() -> Self { CipherAlgorithm::Aes128 }
}

/// Caller-tunable options shared by the facade and every algorithm.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub use_compression: bool,
    pub use_encryption: bool,
    pub password: String,
    pub encryption_algorithm: CipherAlgorithm,
    /// Only meaningful for LSB/RandomLSB; must be in `1..=8`.
    pub max_bits_used_per_channel: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            use_compression: true,
            use_encryption: false,
            password: String::new(),
            encryption_algorithm: CipherAlgorithm::Aes128,
            max_bits_used_per_channel: 1,
        }
    }
}

impl Config {
    pub fn has_password(&self) -> bool { !self.password.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_compress_only() {
        let c = Config::default();
        assert!(c.use_compression);
        assert!(!c.use_encryption);
        assert_eq!(c.encryption_algorithm, CipherAlgorithm::Aes128);
        assert_eq!(c.max_bits_used_per_channel, 1);
    }

    #[test]
    fn cipher_header_bytes_are_space_padded() {
        assert_eq!(&CipherAlgorithm::Aes128.as_header_bytes(), b"AES128  ");
        assert_eq!(&CipherAlgorithm::Aes256.as_header_bytes(), b"AES256  ");
    }

    #[test]
    fn cipher_parse_round_trips() {
        assert_eq!(CipherAlgorithm::parse("AES128  "), Some(CipherAlgorithm::Aes128));
        assert_eq!(CipherAlgorithm::parse("AES256"), Some(CipherAlgorithm::Aes256));
        assert_eq!(CipherAlgorithm::parse("DES"), None);
    }
}
