//! Data Header codec: the fixed-layout record prefixing every hidden
//! payload.
//!
//! Grounded in the same shape as `calx::stego::embed_base`'s ad-hoc
//! magic/checksum/length header, generalized to the full field set the
//! payload pipeline and bit-stream layer need to recover a writer's choices
//! on the other side.

use crate::config::CipherAlgorithm;
use crate::error::{Namespace, StegError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

const MAGIC: &[u8; 9] = b"STEGAPY  ";
const VERSION: u8 = 0x02;

/// The header is always bit-packed at `channel_bits_used = 1`: a caller
/// with `k > 1` still gets a recoverable header.
pub const HEADER_PLANE_COUNT: u8 = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct DataHeader {
    pub payload_length: u32,
    pub channel_bits_used: u8,
    pub use_compression: bool,
    pub use_encryption: bool,
    pub cipher: Option<CipherAlgorithm>,
    pub filename: String,
}

impl DataHeader {
    pub fn to_bytes(&self, namespace: Namespace) -> Result<Vec<u8>, StegError> {
        let filename_bytes = self.filename.as_bytes();
        if filename_bytes.len() > 255 {
            return Err(StegError::unhandled(
                namespace,
                format!("filename is {} bytes, header field is 1 byte", filename_bytes.len()),
            ));
        }
        if !(1..=8).contains(&self.channel_bits_used) {
            return Err(StegError::unhandled(
                namespace,
                format!("channel_bits_used {} out of range [1,8]", self.channel_bits_used),
            ));
        }

        let mut out = Cursor::new(Vec::with_capacity(26 + filename_bytes.len()));
        out.get_mut().extend_from_slice(MAGIC);
        out.write_u8(VERSION).unwrap();
        out.write_u32::<LittleEndian>(self.payload_length).unwrap();
        out.write_u8(self.channel_bits_used).unwrap();
        out.write_u8(filename_bytes.len() as u8).unwrap();
        out.write_u8(self.use_compression as u8).unwrap();
        out.write_u8(self.use_encryption as u8).unwrap();

        let cipher_bytes = match self.cipher {
            Some(c) => c.as_header_bytes(),
            None => [b' '; 8],
        };
        out.get_mut().extend_from_slice(&cipher_bytes);
        out.get_mut().extend_from_slice(filename_bytes);

        Ok(out.into_inner())
    }

    pub fn from_bytes(namespace: Namespace, bytes: &[u8]) -> Result<(DataHeader, usize), StegError> {
        if bytes.len() < 26 {
            return Err(StegError::ImageDataRead { namespace });
        }
        if &bytes[0..9] != MAGIC {
            return Err(StegError::ImageDataRead { namespace });
        }
        let mut cur = Cursor::new(&bytes[9..]);
        let version = cur.read_u8().map_err(|_| StegError::ImageDataRead { namespace })?;
        if version != VERSION {
            return Err(StegError::ImageDataRead { namespace });
        }
        let payload_length = cur.read_u32::<LittleEndian>().map_err(|_| StegError::ImageDataRead { namespace })?;
        let channel_bits_used = cur.read_u8().map_err(|_| StegError::ImageDataRead { namespace })?;
        if !(1..=8).contains(&channel_bits_used) {
            return Err(StegError::ImageDataRead { namespace });
        }
        let filename_length = cur.read_u8().map_err(|_| StegError::ImageDataRead { namespace })? as usize;
        let use_compression = cur.read_u8().map_err(|_| StegError::ImageDataRead { namespace })? != 0;
        let use_encryption = cur.read_u8().map_err(|_| StegError::ImageDataRead { namespace })? != 0;

        let mut cipher_bytes = [0u8; 8];
        cur.read_exact(&mut cipher_bytes).map_err(|_| StegError::ImageDataRead { namespace })?;
        let cipher_name = String::from_utf8_lossy(&cipher_bytes);
        let cipher = if use_encryption {
            Some(CipherAlgorithm::parse(&cipher_name).ok_or_else(|| StegError::InvalidCryptAlgo {
                namespace,
                algorithm: cipher_name.trim_end().to_string(),
            })?)
        } else {
            None
        };

        let total_len = 26 + filename_length;
        if bytes.len() < total_len {
            return Err(StegError::ImageDataRead { namespace });
        }
        let filename = String::from_utf8(bytes[26..total_len].to_vec())
            .map_err(|_| StegError::ImageDataRead { namespace })?;

        Ok((
            DataHeader {
                payload_length,
                channel_bits_used,
                use_compression,
                use_encryption,
                cipher,
                filename,
            },
            total_len,
        ))
    }
}
