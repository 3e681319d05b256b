//! Optional gzip + AES-CBC payload pipeline.
//!
//! Gzip stage follows `calx::stego::embed_gzipped`/`extract`'s use of
//! `libflate::gzip`. The cipher stage is new — `calx` never needed one — and
//! is built the way the rest of the retrieval pack drives AES-CBC: `aes` +
//! `cbc` for the block cipher, `pbkdf2`+`sha2` for key derivation.

use crate::config::CipherAlgorithm;
use crate::error::{Namespace, StegError};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use libflate::gzip;
use log::warn;
use rand::RngCore;
use std::io::{self, Cursor, Read};

/// Fixed PBKDF2 salt; part of the wire contract, not a security parameter.
const SALT: [u8; 8] = [0x28, 0x5F, 0x71, 0xC9, 0x1E, 0x35, 0x0A, 0x62];
const PBKDF2_ROUNDS: u32 = 7;
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = gzip::Encoder::new(Vec::new()).expect("gzip encoder init is infallible");
    io::copy(&mut Cursor::new(data), &mut encoder).expect("writing to an in-memory encoder cannot fail");
    encoder.finish().into_result().expect("flushing an in-memory encoder cannot fail")
}

pub fn decompress(namespace: Namespace, data: &[u8]) -> Result<Vec<u8>, StegError> {
    if data.is_empty() {
        return Err(StegError::CorruptData { namespace, message: "compressed payload is empty".into() });
    }
    if data.len() < 2 || data[0..2] != GZIP_MAGIC {
        return Err(StegError::CorruptData { namespace, message: "missing gzip magic bytes".into() });
    }
    let mut decoder = gzip::Decoder::new(data)
        .map_err(|e| StegError::CorruptData { namespace, message: format!("gzip header rejected: {}", e) })?;
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| StegError::CorruptData { namespace, message: format!("gzip stream rejected: {}", e) })?;
    Ok(out)
}

fn derive_key(password: &str, algorithm: CipherAlgorithm) -> Vec<u8> {
    let mut key = vec![0u8; algorithm.key_len()];
    pbkdf2::pbkdf2_hmac::<sha2::Sha256>(password.as_bytes(), &SALT, PBKDF2_ROUNDS, &mut key);
    key
}

pub fn encrypt(
    namespace: Namespace,
    data: &[u8],
    password: &str,
    algorithm: CipherAlgorithm,
) -> Result<Vec<u8>, StegError> {
    let key = derive_key(password, algorithm);
    let mut iv = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = match algorithm {
        CipherAlgorithm::Aes128 => cbc::Encryptor::<aes::Aes128>::new_from_slices(&key, &iv)
            .map_err(|e| StegError::unhandled(namespace, format!("cipher init failed: {}", e)))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        CipherAlgorithm::Aes256 => cbc::Encryptor::<aes::Aes256>::new_from_slices(&key, &iv)
            .map_err(|e| StegError::unhandled(namespace, format!("cipher init failed: {}", e)))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
    };

    let mut out = Vec::with_capacity(1 + iv.len() + ciphertext.len());
    out.push(iv.len() as u8);
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

pub fn decrypt(
    namespace: Namespace,
    data: &[u8],
    password: &str,
    algorithm: CipherAlgorithm,
) -> Result<Vec<u8>, StegError> {
    if data.is_empty() {
        return Err(StegError::CorruptData { namespace, message: "encrypted payload is empty".into() });
    }
    let iv_len = data[0] as usize;
    if data.len() < 1 + iv_len {
        return Err(StegError::CorruptData { namespace, message: "encrypted payload shorter than its IV".into() });
    }
    let iv = &data[1..1 + iv_len];
    let ciphertext = &data[1 + iv_len..];
    let key = derive_key(password, algorithm);

    let plaintext = match algorithm {
        CipherAlgorithm::Aes128 => {
            let dec = cbc::Decryptor::<aes::Aes128>::new_from_slices(&key, iv)
                .map_err(|e| StegError::unhandled(namespace, format!("cipher init failed: {}", e)))?;
            dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        }
        CipherAlgorithm::Aes256 => {
            let dec = cbc::Decryptor::<aes::Aes256>::new_from_slices(&key, iv)
                .map_err(|e| StegError::unhandled(namespace, format!("cipher init failed: {}", e)))?;
            dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        }
    };

    plaintext.map_err(|_| {
        warn!("CBC padding rejected, treating as invalid password");
        StegError::InvalidPassword { namespace }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(10);
        let compressed = compress(&data);
        let out = decompress(Namespace::Steganos, &compressed).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn decompress_rejects_missing_magic() {
        let err = decompress(Namespace::Steganos, b"not gzip").unwrap_err();
        assert!(matches!(err, StegError::CorruptData { .. }));
    }

    #[test]
    fn decompress_rejects_empty() {
        let err = decompress(Namespace::Steganos, b"").unwrap_err();
        assert!(matches!(err, StegError::CorruptData { .. }));
    }

    #[test]
    fn aes128_round_trips() {
        let data = b"secret message bytes";
        let ct = encrypt(Namespace::Steganos, data, "pw", CipherAlgorithm::Aes128).unwrap();
        let pt = decrypt(Namespace::Steganos, &ct, "pw", CipherAlgorithm::Aes128).unwrap();
        assert_eq!(pt, data);
    }

    #[test]
    fn aes256_round_trips() {
        let data = b"another secret, somewhat longer than one block";
        let ct = encrypt(Namespace::Steganos, data, "correct horse battery staple", CipherAlgorithm::Aes256).unwrap();
        let pt = decrypt(Namespace::Steganos, &ct, "correct horse battery staple", CipherAlgorithm::Aes256).unwrap();
        assert_eq!(pt, data);
    }

    #[test]
    fn wrong_password_is_reported_distinctly() {
        let data = b"secret message bytes";
        let ct = encrypt(Namespace::Steganos, data, "right", CipherAlgorithm::Aes128).unwrap();
        let err = decrypt(Namespace::Steganos, &ct, "wrong", CipherAlgorithm::Aes128).unwrap_err();
        assert!(matches!(err, StegError::InvalidPassword { .. }));
    }

    #[test]
    fn iv_is_framed_with_length_prefix() {
        let ct = encrypt(Namespace::Steganos, b"x", "pw", CipherAlgorithm::Aes128).unwrap();
        assert_eq!(ct[0], 16);
    }
}
