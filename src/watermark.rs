//! The Dugad additive casting/detection rule, operating on the coefficient
//! pyramid produced by `dwt::decompose`.

use crate::dwt::Matrix;
use crate::dwt::Pyramid;
use crate::signature::{DetectionRecord, Signature, SubbandStats};

fn cast_subband(subband: &Matrix, alpha: f64, cast_threshold: f64, w: &[f64]) -> Matrix {
    let n = w.len();
    let mut flat = subband.as_flat().to_vec();
    for (i, v) in flat.iter_mut().enumerate() {
        if v.abs() > cast_threshold {
            *v += alpha * v.abs() * w[i % n];
        }
    }
    Matrix::from_flat(subband.rows, subband.cols, flat)
}

/// Cast `signature`'s Gaussian sequence into every detail subband of every
/// level in `pyramid`, in place.
pub fn cast(pyramid: &mut Pyramid, signature: &Signature) {
    for (ch, cv, cd) in pyramid.details.iter_mut() {
        *ch = cast_subband(ch, signature.alpha, signature.cast_threshold, &signature.w);
        *cv = cast_subband(cv, signature.alpha, signature.cast_threshold, &signature.w);
        *cd = cast_subband(cd, signature.alpha, signature.cast_threshold, &signature.w);
    }
}

fn subband_stats(subband: &Matrix, detect_threshold: f64, w: &[f64]) -> SubbandStats {
    let n = w.len();
    let mut m = 0i32;
    let mut z = 0.0;
    let mut v_sum = 0.0;
    for (i, s) in subband.as_flat().iter().enumerate() {
        if *s > detect_threshold {
            m += 1;
            z += s * w[i % n];
            v_sum += s.abs();
        }
    }
    SubbandStats { m, z, v: v_sum }
}

/// Produce the detection record for `pyramid` against `signature`'s
/// threshold and Gaussian sequence. `signature.levels` and
/// `signature.alpha` are carried into the record for downstream scoring.
pub fn detect(pyramid: &Pyramid, signature: &Signature) -> DetectionRecord {
    let mut stats = Vec::with_capacity(pyramid.details.len() * 3);
    for (ch, cv, cd) in &pyramid.details {
        stats.push(subband_stats(ch, signature.detect_threshold, &signature.w));
        stats.push(subband_stats(cv, signature.detect_threshold, &signature.w));
        stats.push(subband_stats(cd, signature.detect_threshold, &signature.w));
    }
    DetectionRecord { levels: pyramid.details.len() as i32, alpha: signature.alpha, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dwt;
    use crate::error::Namespace;
    use crate::signature::correlation;

    fn crafted_signature(alpha: f64, cast_threshold: f64, detect_threshold: f64, w: Vec<f64>) -> Signature {
        Signature {
            wavelet_filter_method: 2,
            filter_id: 1,
            levels: 1,
            alpha,
            cast_threshold,
            detect_threshold,
            w,
        }
    }

    fn one_level_pyramid_with(subband: Matrix) -> Pyramid {
        let dummy = Matrix::zeros(subband.rows * 2, subband.cols * 2);
        let mut pyramid = dwt::decompose(Namespace::DwtDugad, &dummy, 1).unwrap();
        pyramid.details = vec![(subband.clone(), subband.clone(), subband.clone())];
        pyramid
    }

    #[test]
    fn casting_then_detecting_yields_high_correlation() {
        // alpha*s > alpha*(v_original+alpha*v_original) reduces to a fixed
        // worked case: uniform subband, uniform unit signature.
        let signature = crafted_signature(0.5, 0.0, 0.0, vec![1.0, 1.0, 1.0, 1.0]);
        let mut pyramid = one_level_pyramid_with(Matrix::from_flat(1, 4, vec![10.0, 10.0, 10.0, 10.0]));
        cast(&mut pyramid, &signature);
        let record = detect(&pyramid, &signature);
        assert_eq!(correlation(&record), 1.0);
    }

    #[test]
    fn all_subbands_below_threshold_yields_zero_correlation() {
        let signature = crafted_signature(0.2, 40.0, 50.0, vec![1.0, -1.0, 1.0, -1.0]);
        let pyramid = one_level_pyramid_with(Matrix::from_flat(1, 4, vec![1.0, 2.0, 3.0, 4.0]));
        let record = detect(&pyramid, &signature);
        assert_eq!(correlation(&record), 0.0);
    }
}
