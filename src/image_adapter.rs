//! Decode/encode between raw bytes and an RGB8 pixel matrix.
//!
//! `calx::system`'s `save_screenshot` already calls `image::save_buffer`
//! against the same `image` crate version; this module generalizes that one
//! write path into a full decode/encode adapter plus a random-cover
//! generator for callers that embed without supplying one.

use crate::error::{Namespace, StegError};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::Rng;
use std::io::Cursor;

/// Decode arbitrary PNG/BMP/JPEG/GIF/TIFF bytes (sniffed by magic, via the
/// `image` crate's own format guessing) into an RGB8 matrix, converting
/// from palette/gray/RGBA as needed.
pub fn decode(namespace: Namespace, bytes: &[u8]) -> Result<RgbImage, StegError> {
    let img = image::load_from_memory(bytes).map_err(|e| {
        log::warn!("image decode failed: {}", e);
        StegError::ImageDataRead { namespace }
    })?;
    Ok(img.to_rgb8())
}

/// Encode `image` for `filename`'s extension. Only PNG and BMP are
/// permitted on the write path — LSB needs lossless reconstruction.
pub fn encode(namespace: Namespace, image: &RgbImage, filename: &str) -> Result<Vec<u8>, StegError> {
    let format = format_for_filename(namespace, filename)?;
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut out, format)
        .map_err(|e| StegError::unhandled(namespace, format!("image encode failed: {}", e)))?;
    Ok(out.into_inner())
}

fn format_for_filename(namespace: Namespace, filename: &str) -> Result<ImageFormat, StegError> {
    let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "bmp" => Ok(ImageFormat::Bmp),
        other => Err(StegError::unhandled(namespace, format!("writes via .{} are forbidden, use .png or .bmp", other))),
    }
}

/// `["png", "bmp", "jpg", "jpeg"]` — formats this library can decode.
pub fn readable_extensions() -> &'static [&'static str] {
    &["png", "bmp", "jpg", "jpeg", "gif", "tiff"]
}

/// `["png", "bmp"]` — formats this library can write.
pub fn writable_extensions() -> &'static [&'static str] {
    &["png", "bmp"]
}

/// A roughly-square random-noise RGB image with at least `num_pixels`
/// pixels, used when an embed call supplies no cover (`lsb_plugin.py`'s
/// `generate_random_image`).
pub fn random_cover(num_pixels: usize) -> RgbImage {
    let side = (num_pixels as f64).sqrt().ceil() as u32;
    let (w, h) = (side.max(1), side.max(1));
    let mut rng = rand::thread_rng();
    RgbImage::from_fn(w, h, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_through_encode_decode() {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 200]));
        let bytes = encode(Namespace::Lsb, &img, "cover.png").unwrap();
        let decoded = decode(Namespace::Lsb, &bytes).unwrap();
        assert_eq!(decoded.dimensions(), img.dimensions());
        assert_eq!(decoded.as_raw(), img.as_raw());
    }

    #[test]
    fn bmp_round_trips_through_encode_decode() {
        let img = RgbImage::from_fn(6, 6, |x, y| Rgb([x as u8, y as u8, 1]));
        let bytes = encode(Namespace::Lsb, &img, "cover.bmp").unwrap();
        let decoded = decode(Namespace::Lsb, &bytes).unwrap();
        assert_eq!(decoded.as_raw(), img.as_raw());
    }

    #[test]
    fn jpeg_write_path_is_forbidden() {
        let img = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        let err = encode(Namespace::Lsb, &img, "cover.jpg").unwrap_err();
        assert!(matches!(err, StegError::Unhandled { .. }));
    }

    #[test]
    fn random_cover_has_enough_pixels_and_is_square_ish() {
        let img = random_cover(1000);
        assert!((img.width() * img.height()) as usize >= 1000);
        assert!(img.width().abs_diff(img.height()) <= 1);
    }
}
