//! The six public operations: capability checks at the door, then
//! byte-level decode/encode around whichever algorithm instance is doing
//! the work.

use crate::algorithm::{Algorithm, Purpose};
use crate::config::Config;
use crate::error::{Namespace, StegError};
use crate::image_adapter;
use crate::signature::Signature;
use image::RgbImage;

fn require(algo: &dyn Algorithm, purpose: Purpose) -> Result<(), StegError> {
    if algo.purposes().contains(&purpose) {
        Ok(())
    } else {
        Err(match purpose {
            Purpose::DataHiding => StegError::PluginDoesNotSupportDataHiding { namespace: algo.namespace() },
            Purpose::Watermarking => StegError::PluginDoesNotSupportWatermarking { namespace: algo.namespace() },
        })
    }
}

pub fn embed_data(
    algo: &dyn Algorithm,
    payload: &[u8],
    payload_name: &str,
    cover: Option<&[u8]>,
    stego_name: &str,
    config: &Config,
) -> Result<Vec<u8>, StegError> {
    require(algo, Purpose::DataHiding)?;
    let cover_image = cover.map(|bytes| image_adapter::decode(algo.namespace(), bytes)).transpose()?;
    let stego_image = algo.embed_data(payload, payload_name, cover_image.as_ref(), config)?;
    image_adapter::encode(algo.namespace(), &stego_image, stego_name)
}

pub fn extract_data(algo: &dyn Algorithm, stego: &[u8], config: &mut Config) -> Result<(String, Vec<u8>), StegError> {
    require(algo, Purpose::DataHiding)?;
    let stego_image = image_adapter::decode(algo.namespace(), stego)?;
    algo.extract_data(&stego_image, config)
}

/// Bypasses the payload pipeline entirely — watermark embedding casts raw
/// signature coefficients, never compresses or encrypts them. A cover image
/// is mandatory; without one there is nothing to cast the watermark into.
pub fn embed_mark(algo: &dyn Algorithm, sig_bytes: &[u8], cover: Option<&[u8]>, stego_name: &str) -> Result<Vec<u8>, StegError> {
    require(algo, Purpose::Watermarking)?;
    let cover = cover.ok_or(StegError::NoCoverFile { namespace: algo.namespace() })?;
    let signature = Signature::from_bytes(algo.namespace(), sig_bytes)?;
    let cover_image = image_adapter::decode(algo.namespace(), cover)?;
    let stego_image = algo.embed_mark(&signature, &cover_image)?;
    image_adapter::encode(algo.namespace(), &stego_image, stego_name)
}

pub fn check_mark(algo: &mut dyn Algorithm, stego: &[u8], original_sig_bytes: &[u8]) -> Result<f64, StegError> {
    require(algo, Purpose::Watermarking)?;
    let signature = Signature::from_bytes(algo.namespace(), original_sig_bytes)?;
    let stego_image = image_adapter::decode(algo.namespace(), stego)?;
    let score = algo.check_mark(&stego_image, &signature)?;
    // NaN in the score is coerced to 0.0 at the facade.
    Ok(if score.is_nan() { 0.0 } else { score })
}

pub fn generate_signature(algo: &dyn Algorithm, password: &str) -> Result<Vec<u8>, StegError> {
    require(algo, Purpose::Watermarking)?;
    let signature = algo.generate_signature(password)?;
    Ok(signature.to_bytes())
}

/// `clip(10 * |stego - cover|, 0, 255)` per channel, purely diagnostic. Not
/// gated on any algorithm's capabilities — it only needs two same-sized
/// images.
pub fn get_diff(stego: &[u8], cover: &[u8], diff_name: &str) -> Result<Vec<u8>, StegError> {
    let namespace = Namespace::Steganos;
    let stego_image = image_adapter::decode(namespace, stego)?;
    let cover_image = image_adapter::decode(namespace, cover)?;
    if stego_image.dimensions() != cover_image.dimensions() {
        return Err(StegError::unhandled(namespace, "stego and cover dimensions differ"));
    }

    let mut diff = RgbImage::new(stego_image.width(), stego_image.height());
    for ((x, y, s), c) in stego_image.enumerate_pixels().zip(cover_image.pixels()) {
        let mut out = [0u8; 3];
        for ch in 0..3 {
            let d = (s.0[ch] as i32 - c.0[ch] as i32).abs() * 10;
            out[ch] = d.clamp(0, 255) as u8;
        }
        diff.put_pixel(x, y, image::Rgb(out));
    }
    image_adapter::encode(namespace, &diff, diff_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::LsbAlgorithm;
    use image::Rgb;

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        image_adapter::encode(Namespace::Steganos, img, "x.png").unwrap()
    }

    #[test]
    fn embed_then_extract_round_trips_through_bytes() {
        let algo = LsbAlgorithm;
        let cover = RgbImage::from_pixel(32, 32, Rgb([100, 100, 100]));
        let cover_bytes = png_bytes(&cover);
        let config = Config { use_compression: false, ..Config::default() };

        let stego_bytes = embed_data(&algo, b"hi there", "f.txt", Some(&cover_bytes), "out.png", &config).unwrap();
        let mut extract_config = Config::default();
        let (name, data) = extract_data(&algo, &stego_bytes, &mut extract_config).unwrap();
        assert_eq!(name, "f.txt");
        assert_eq!(data, b"hi there");
    }

    #[test]
    fn get_diff_is_zero_for_identical_images() {
        let img = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let bytes = png_bytes(&img);
        let diff_bytes = get_diff(&bytes, &bytes, "diff.png").unwrap();
        let diff = image_adapter::decode(Namespace::Steganos, &diff_bytes).unwrap();
        assert!(diff.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn get_diff_rejects_mismatched_dimensions() {
        let a = png_bytes(&RgbImage::from_pixel(4, 4, Rgb([1, 1, 1])));
        let b = png_bytes(&RgbImage::from_pixel(8, 8, Rgb([1, 1, 1])));
        assert!(get_diff(&a, &b, "diff.png").is_err());
    }

    #[test]
    fn capability_mismatch_is_reported_before_touching_images() {
        let algo = LsbAlgorithm;
        let err = embed_mark(&algo, b"not a signature", Some(b"not an image either"), "out.png").unwrap_err();
        assert!(matches!(err, StegError::PluginDoesNotSupportWatermarking { .. }));
    }

    #[test]
    fn embed_mark_without_cover_is_no_cover_file() {
        let algo = crate::algorithm::DwtDugadAlgorithm::new();
        let sig_bytes = generate_signature(&algo, "pw").unwrap();
        let err = embed_mark(&algo, &sig_bytes, None, "out.png").unwrap_err();
        assert!(matches!(err, StegError::NoCoverFile { .. }));
    }
}
