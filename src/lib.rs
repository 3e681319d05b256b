//! Spatial-domain data hiding and transform-domain Dugad watermarking for
//! still images.
//!
//! Two algorithm families share the pixel-grid machinery in this crate:
//! sequential and keyed-permutation LSB data hiding (`LSB`, `RandomLSB`),
//! and multi-level 2-D Haar DWT watermarking (`DWTDugad`). Pick an
//! algorithm from a [`Registry`] and drive it through the [`facade`]
//! functions, which handle capability checks and byte-level image
//! decode/encode around whichever algorithm you chose.
//!
//! ```no_run
//! use steganos::{facade, Config, Registry};
//!
//! let registry = Registry::new();
//! let algo = registry.get("LSB").unwrap();
//! let config = Config::default();
//! let cover = std::fs::read("cover.png").unwrap();
//! let stego = facade::embed_data(algo, b"hello", "m.txt", Some(&cover), "out.png", &config).unwrap();
//! ```

mod algorithm;
mod bitstream;
mod config;
mod dwt;
mod error;
mod header;
mod image_adapter;
mod pipeline;
mod prng;
mod registry;
mod signature;
mod watermark;

pub mod facade;

pub use crate::algorithm::{Algorithm, DwtDugadAlgorithm, LsbAlgorithm, Purpose, RandomLsbAlgorithm};
pub use crate::config::{CipherAlgorithm, Config};
pub use crate::dwt::Matrix;
pub use crate::error::{Namespace, StegError};
pub use crate::registry::Registry;
pub use crate::signature::{
    correlation, debug_view, high_watermark_level, low_watermark_level, DetectionDebug, DetectionDebugEntry, DetectionRecord, Signature,
    SubbandStats,
};

pub type Result<T> = std::result::Result<T, StegError>;
