//! Multi-level 2-D Haar (Daubechies-1) discrete wavelet transform, plus the
//! YUV round-trip the watermarker casts into.
//!
//! Separable row-then-column filter bank with a shape-restoring crop/pad
//! between levels, laid out as small `#[derive]`d value types with plain
//! arithmetic methods.

use crate::error::{Namespace, StegError};
use image::{Rgb, RgbImage};

const SQRT2: f64 = std::f64::consts::SQRT_2;

/// A plain row-major real matrix; the unit both the luminance plane and
/// every wavelet subband are expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Matrix {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(nrows * ncols);
        for r in rows {
            debug_assert_eq!(r.len(), ncols);
            data.extend(r);
        }
        Matrix { rows: nrows, cols: ncols, data }
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f64) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn column(&self, c: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, c)).collect()
    }

    /// Flat accessor used by the watermark caster/detector, which treats a
    /// subband as a plain vector.
    pub fn as_flat(&self) -> &[f64] {
        &self.data
    }

    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        assert_eq!(data.len(), rows * cols);
        Matrix { rows, cols, data }
    }

    pub fn into_flat(self) -> Vec<f64> {
        self.data
    }

    /// Shape restore: top-left crop when larger, edge-replicate pad when
    /// smaller. One clamp handles both directions at once.
    pub fn crop_or_pad(&self, target_rows: usize, target_cols: usize) -> Matrix {
        let mut out = Matrix::zeros(target_rows, target_cols);
        for r in 0..target_rows {
            let sr = r.min(self.rows - 1);
            for c in 0..target_cols {
                let sc = c.min(self.cols - 1);
                out.set(r, c, self.get(sr, sc));
            }
        }
        out
    }
}

fn haar_forward_1d(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = x.len();
    let mut padded = x.to_vec();
    if n % 2 == 1 {
        // Symmetric (edge-replicating) boundary extension for odd length.
        padded.push(x[n - 1]);
    }
    let half = padded.len() / 2;
    let mut low = Vec::with_capacity(half);
    let mut high = Vec::with_capacity(half);
    for i in 0..half {
        let a = padded[2 * i];
        let b = padded[2 * i + 1];
        low.push((a + b) / SQRT2);
        high.push((a - b) / SQRT2);
    }
    (low, high)
}

fn haar_inverse_1d(low: &[f64], high: &[f64]) -> Vec<f64> {
    let half = low.len();
    let mut out = Vec::with_capacity(half * 2);
    for i in 0..half {
        out.push((low[i] + high[i]) / SQRT2);
        out.push((low[i] - high[i]) / SQRT2);
    }
    out
}

fn transform_rows(m: &Matrix) -> (Matrix, Matrix) {
    let mut low_rows = Vec::with_capacity(m.rows);
    let mut high_rows = Vec::with_capacity(m.rows);
    for r in 0..m.rows {
        let (low, high) = haar_forward_1d(m.row(r));
        low_rows.push(low);
        high_rows.push(high);
    }
    (Matrix::from_rows(low_rows), Matrix::from_rows(high_rows))
}

fn transform_cols(m: &Matrix) -> (Matrix, Matrix) {
    let mut low_cols = Vec::with_capacity(m.cols);
    let mut high_cols = Vec::with_capacity(m.cols);
    for c in 0..m.cols {
        let (low, high) = haar_forward_1d(&m.column(c));
        low_cols.push(low);
        high_cols.push(high);
    }
    let half = low_cols.first().map_or(0, |c| c.len());
    let mut low = Matrix::zeros(half, m.cols);
    let mut high = Matrix::zeros(half, m.cols);
    for c in 0..m.cols {
        for r in 0..half {
            low.set(r, c, low_cols[c][r]);
            high.set(r, c, high_cols[c][r]);
        }
    }
    (low, high)
}

fn inverse_cols(low: &Matrix, high: &Matrix) -> Matrix {
    let mut out = Matrix::zeros(low.rows * 2, low.cols);
    for c in 0..low.cols {
        let rebuilt = haar_inverse_1d(&low.column(c), &high.column(c));
        for (r, v) in rebuilt.into_iter().enumerate() {
            out.set(r, c, v);
        }
    }
    out
}

fn inverse_rows(low: &Matrix, high: &Matrix) -> Matrix {
    let mut rows = Vec::with_capacity(low.rows);
    for r in 0..low.rows {
        rows.push(haar_inverse_1d(low.row(r), high.row(r)));
    }
    Matrix::from_rows(rows)
}

/// One level of forward decomposition: `(cA, (cH, cV, cD))`.
pub fn forward_haar(m: &Matrix) -> (Matrix, (Matrix, Matrix, Matrix)) {
    let (l, h) = transform_rows(m);
    let (ll, lh) = transform_cols(&l);
    let (hl, hh) = transform_cols(&h);
    (ll, (lh, hl, hh))
}

/// Inverse of one level, restored to `(target_rows, target_cols)`.
pub fn inverse_haar(
    ca: &Matrix,
    ch: &Matrix,
    cv: &Matrix,
    cd: &Matrix,
    target_rows: usize,
    target_cols: usize,
) -> Matrix {
    let l = inverse_cols(ca, ch);
    let h = inverse_cols(cv, cd);
    inverse_rows(&l, &h).crop_or_pad(target_rows, target_cols)
}

/// The full coefficient pyramid: an approximation band plus one
/// `(cH, cV, cD)` triple per level, finest level first.
#[derive(Debug)]
pub struct Pyramid {
    pub approx: Matrix,
    pub details: Vec<(Matrix, Matrix, Matrix)>,
    shapes: Vec<(usize, usize)>,
}

pub fn decompose(namespace: Namespace, m: &Matrix, levels: u32) -> Result<Pyramid, StegError> {
    let mut cur = m.clone();
    let mut shapes = vec![(cur.rows, cur.cols)];
    let mut details = Vec::new();
    for _ in 0..levels {
        if cur.rows < 2 || cur.cols < 2 {
            return Err(StegError::FileTooSmall {
                namespace,
                message: format!("image too small to support {} decomposition levels", levels),
            });
        }
        let (ca, (ch, cv, cd)) = forward_haar(&cur);
        shapes.push((ca.rows, ca.cols));
        details.push((ch, cv, cd));
        cur = ca;
    }
    Ok(Pyramid { approx: cur, details, shapes })
}

pub fn reconstruct(pyramid: &Pyramid) -> Matrix {
    let mut cur = pyramid.approx.clone();
    for (i, (ch, cv, cd)) in pyramid.details.iter().enumerate().rev() {
        let (target_rows, target_cols) = pyramid.shapes[i];
        cur = inverse_haar(&cur, ch, cv, cd, target_rows, target_cols);
    }
    cur
}

fn clip8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// BT.601-like conversion.
pub fn rgb_to_yuv(image: &RgbImage) -> (Matrix, Matrix, Matrix) {
    let (w, h) = image.dimensions();
    let mut y = Matrix::zeros(h as usize, w as usize);
    let mut u = Matrix::zeros(h as usize, w as usize);
    let mut v = Matrix::zeros(h as usize, w as usize);
    for (x, py, pixel) in image.enumerate_pixels() {
        let r = pixel.0[0] as f64;
        let g = pixel.0[1] as f64;
        let b = pixel.0[2] as f64;
        let (r_i, c_i) = (py as usize, x as usize);
        y.set(r_i, c_i, 0.299 * r + 0.587 * g + 0.114 * b);
        u.set(r_i, c_i, -0.14713 * r - 0.28886 * g + 0.436 * b);
        v.set(r_i, c_i, 0.615 * r - 0.51499 * g - 0.10001 * b);
    }
    (y, u, v)
}

pub fn yuv_to_rgb(y: &Matrix, u: &Matrix, v: &Matrix) -> RgbImage {
    let (h, w) = (y.rows, y.cols);
    let mut out = RgbImage::new(w as u32, h as u32);
    for r in 0..h {
        for c in 0..w {
            let yy = y.get(r, c);
            let uu = u.get(r, c);
            let vv = v.get(r, c);
            let red = clip8(yy + 1.13983 * vv);
            let green = clip8(yy - 0.39465 * uu - 0.58060 * vv);
            let blue = clip8(yy + 2.03211 * uu);
            out.put_pixel(c as u32, r as u32, Rgb([red, green, blue]));
        }
    }
    out
}
