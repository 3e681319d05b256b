//! The shared algorithm interface — a common trait rather than an
//! inheritance hierarchy — and its three implementations.

use crate::bitstream::{self, Reader, Writer};
use crate::config::Config;
use crate::dwt;
use crate::error::{Namespace, StegError};
use crate::header::{DataHeader, HEADER_PLANE_COUNT};
use crate::image_adapter;
use crate::pipeline;
use crate::signature::{DetectionDebug, Signature};
use crate::watermark;
use image::RgbImage;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Purpose {
    DataHiding,
    Watermarking,
}

/// Common surface for LSB, RandomLSB and DWTDugad. Capability checks live
/// both here (default method bodies) and at the facade, which consults
/// `purposes()` before dispatching at all.
pub trait Algorithm: std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn namespace(&self) -> Namespace;
    fn purposes(&self) -> &'static [Purpose];

    fn readable_extensions(&self) -> &'static [&'static str] {
        image_adapter::readable_extensions()
    }

    fn writable_extensions(&self) -> &'static [&'static str] {
        image_adapter::writable_extensions()
    }

    fn embed_data(
        &self,
        _payload: &[u8],
        _payload_name: &str,
        _cover: Option<&RgbImage>,
        _config: &Config,
    ) -> Result<RgbImage, StegError> {
        Err(StegError::PluginDoesNotSupportDataHiding { namespace: self.namespace() })
    }

    fn extract_data(&self, _stego: &RgbImage, _config: &mut Config) -> Result<(String, Vec<u8>), StegError> {
        Err(StegError::PluginDoesNotSupportDataHiding { namespace: self.namespace() })
    }

    fn embed_mark(&self, _signature: &Signature, _cover: &RgbImage) -> Result<RgbImage, StegError> {
        Err(StegError::PluginDoesNotSupportWatermarking { namespace: self.namespace() })
    }

    fn check_mark(&mut self, _stego: &RgbImage, _original: &Signature) -> Result<f64, StegError> {
        Err(StegError::PluginDoesNotSupportWatermarking { namespace: self.namespace() })
    }

    fn generate_signature(&self, _password: &str) -> Result<Signature, StegError> {
        Err(StegError::PluginDoesNotSupportWatermarking { namespace: self.namespace() })
    }
}

fn pipeline_encode(namespace: Namespace, payload: &[u8], config: &Config) -> Result<Vec<u8>, StegError> {
    let mut data = payload.to_vec();
    if config.use_compression {
        data = pipeline::compress(&data);
    }
    if config.use_encryption {
        data = pipeline::encrypt(namespace, &data, &config.password, config.encryption_algorithm)?;
    }
    Ok(data)
}

fn pipeline_decode(namespace: Namespace, data: Vec<u8>, header: &DataHeader, config: &Config) -> Result<Vec<u8>, StegError> {
    let mut data = data;
    if header.use_encryption {
        let cipher = header.cipher.ok_or_else(|| StegError::InvalidCryptAlgo {
            namespace,
            algorithm: "<none>".to_string(),
        })?;
        data = pipeline::decrypt(namespace, &data, &config.password, cipher)?;
    }
    if header.use_compression {
        data = pipeline::decompress(namespace, &data)?;
    }
    Ok(data)
}

fn build_header(payload_len: usize, payload_name: &str, config: &Config) -> DataHeader {
    DataHeader {
        payload_length: payload_len as u32,
        channel_bits_used: config.max_bits_used_per_channel,
        use_compression: config.use_compression,
        use_encryption: config.use_encryption,
        cipher: if config.use_encryption { Some(config.encryption_algorithm) } else { None },
        filename: payload_name.to_string(),
    }
}

/// Read the fixed 26-byte block plus the filename it names, reassembling a
/// `DataHeader` without knowing the filename length up front.
fn read_header(namespace: Namespace, reader: &mut Reader<'_>) -> Result<DataHeader, StegError> {
    let mut fixed = reader.read_bytes(namespace, 26, HEADER_PLANE_COUNT)?;
    let filename_len = fixed[15] as usize;
    let filename_bytes = reader.read_bytes(namespace, filename_len, HEADER_PLANE_COUNT)?;
    fixed.extend_from_slice(&filename_bytes);
    let (header, _) = DataHeader::from_bytes(namespace, &fixed)?;
    Ok(header)
}

fn apply_header_to_config(header: &DataHeader, config: &mut Config) {
    config.use_compression = header.use_compression;
    config.use_encryption = header.use_encryption;
    config.max_bits_used_per_channel = header.channel_bits_used;
    if let Some(cipher) = header.cipher {
        config.encryption_algorithm = cipher;
    }
}

/// Raster-order sequential LSB, generalized from `calx::stego`'s
/// one-byte-per-pixel encoder.
#[derive(Debug)]
pub struct LsbAlgorithm;

impl Algorithm for LsbAlgorithm {
    fn name(&self) -> &'static str {
        "LSB"
    }

    fn namespace(&self) -> Namespace {
        Namespace::Lsb
    }

    fn purposes(&self) -> &'static [Purpose] {
        &[Purpose::DataHiding]
    }

    fn embed_data(
        &self,
        payload: &[u8],
        payload_name: &str,
        cover: Option<&RgbImage>,
        config: &Config,
    ) -> Result<RgbImage, StegError> {
        let data = pipeline_encode(self.namespace(), payload, config)?;
        let header = build_header(data.len(), payload_name, config);
        let header_bytes = header.to_bytes(self.namespace())?;

        let generated;
        let cover_ref = match cover {
            Some(c) => c,
            None => {
                let n = bitstream::minimum_pixels(config.max_bits_used_per_channel, header_bytes.len(), data.len());
                generated = image_adapter::random_cover(n);
                &generated
            }
        };

        if !bitstream::fits(cover_ref.width(), cover_ref.height(), config.max_bits_used_per_channel, header_bytes.len(), data.len()) {
            return Err(StegError::FileTooSmall { namespace: self.namespace(), message: "cover cannot hold header and payload".into() });
        }

        let mut image = cover_ref.clone();
        let positions = bitstream::raster_positions(image.width(), image.height());
        let mut writer = Writer::new(&mut image, positions);
        writer.write_bytes(self.namespace(), &header_bytes, HEADER_PLANE_COUNT)?;
        writer.write_bytes(self.namespace(), &data, config.max_bits_used_per_channel)?;
        log::info!("LSB: embedded {} header bytes + {} payload bytes", header_bytes.len(), data.len());
        Ok(image)
    }

    fn extract_data(&self, stego: &RgbImage, config: &mut Config) -> Result<(String, Vec<u8>), StegError> {
        let positions = bitstream::raster_positions(stego.width(), stego.height());
        let mut reader = Reader::new(stego, positions);
        let header = read_header(self.namespace(), &mut reader)?;
        apply_header_to_config(&header, config);

        let raw = reader.read_bytes(self.namespace(), header.payload_length as usize, header.channel_bits_used)?;
        let data = pipeline_decode(self.namespace(), raw, &header, config)?;
        log::info!("LSB: extracted {} payload bytes for '{}'", data.len(), header.filename);
        Ok((header.filename, data))
    }
}

/// Keyed-permutation LSB. Both directions take the full `Config`: the
/// header's pipeline flags are always the writer's real settings, never
/// forced defaults.
#[derive(Debug)]
pub struct RandomLsbAlgorithm;

impl Algorithm for RandomLsbAlgorithm {
    fn name(&self) -> &'static str {
        "RandomLSB"
    }

    fn namespace(&self) -> Namespace {
        Namespace::RandomLsb
    }

    fn purposes(&self) -> &'static [Purpose] {
        &[Purpose::DataHiding]
    }

    fn embed_data(
        &self,
        payload: &[u8],
        payload_name: &str,
        cover: Option<&RgbImage>,
        config: &Config,
    ) -> Result<RgbImage, StegError> {
        let data = pipeline_encode(self.namespace(), payload, config)?;
        let header = build_header(data.len(), payload_name, config);
        let header_bytes = header.to_bytes(self.namespace())?;

        let generated;
        let cover_ref = match cover {
            Some(c) => c,
            None => {
                let n = bitstream::minimum_pixels(config.max_bits_used_per_channel, header_bytes.len(), data.len());
                generated = image_adapter::random_cover(n);
                &generated
            }
        };

        if !bitstream::fits(cover_ref.width(), cover_ref.height(), config.max_bits_used_per_channel, header_bytes.len(), data.len()) {
            return Err(StegError::FileTooSmall { namespace: self.namespace(), message: "cover cannot hold header and payload".into() });
        }

        let mut image = cover_ref.clone();
        let positions = bitstream::permuted_positions(image.width(), image.height(), &config.password);
        let mut writer = Writer::new(&mut image, positions);
        writer.write_bytes(self.namespace(), &header_bytes, HEADER_PLANE_COUNT)?;
        writer.write_bytes(self.namespace(), &data, config.max_bits_used_per_channel)?;
        log::info!("RandomLSB: embedded {} header bytes + {} payload bytes", header_bytes.len(), data.len());
        Ok(image)
    }

    fn extract_data(&self, stego: &RgbImage, config: &mut Config) -> Result<(String, Vec<u8>), StegError> {
        let positions = bitstream::permuted_positions(stego.width(), stego.height(), &config.password);
        let mut reader = Reader::new(stego, positions);
        let header = read_header(self.namespace(), &mut reader)?;
        apply_header_to_config(&header, config);

        let raw = reader.read_bytes(self.namespace(), header.payload_length as usize, header.channel_bits_used)?;
        let data = pipeline_decode(self.namespace(), raw, &header, config)?;
        log::info!("RandomLSB: extracted {} payload bytes for '{}'", data.len(), header.filename);
        Ok((header.filename, data))
    }
}

/// Transform-domain Dugad watermarker.
#[derive(Default, Debug)]
pub struct DwtDugadAlgorithm {
    last_detection: Option<DetectionDebug>,
}

impl DwtDugadAlgorithm {
    pub fn new() -> DwtDugadAlgorithm {
        DwtDugadAlgorithm::default()
    }

    /// The level-by-level `(m, z, v, matched)` debug view from the most
    /// recent `check_mark` call, an explicit caller-visible field rather
    /// than hidden global state.
    pub fn last_detection_debug(&self) -> Option<&DetectionDebug> {
        self.last_detection.as_ref()
    }
}

impl Algorithm for DwtDugadAlgorithm {
    fn name(&self) -> &'static str {
        "DWTDugad"
    }

    fn namespace(&self) -> Namespace {
        Namespace::DwtDugad
    }

    fn purposes(&self) -> &'static [Purpose] {
        &[Purpose::Watermarking]
    }

    fn generate_signature(&self, password: &str) -> Result<Signature, StegError> {
        if password.is_empty() {
            return Err(StegError::PasswordMandatoryForGenSig { namespace: self.namespace() });
        }
        Ok(Signature::generate(password))
    }

    fn embed_mark(&self, signature: &Signature, cover: &RgbImage) -> Result<RgbImage, StegError> {
        let (y, u, v) = dwt::rgb_to_yuv(cover);
        let mut pyramid = dwt::decompose(self.namespace(), &y, signature.levels as u32)?;
        watermark::cast(&mut pyramid, signature);
        let y2 = dwt::reconstruct(&pyramid);
        log::info!("DWTDugad: cast signature of {} samples over {} levels", signature.w.len(), signature.levels);
        Ok(dwt::yuv_to_rgb(&y2, &u, &v))
    }

    fn check_mark(&mut self, stego: &RgbImage, original: &Signature) -> Result<f64, StegError> {
        let (y, _u, _v) = dwt::rgb_to_yuv(stego);
        let pyramid = dwt::decompose(self.namespace(), &y, original.levels as u32)?;
        let record = watermark::detect(&pyramid, original);
        let debug = crate::signature::debug_view(&record);
        let score = debug.correlation;
        self.last_detection = Some(debug);
        log::info!("DWTDugad: correlation score {:.3}", score);
        Ok(score)
    }
}
