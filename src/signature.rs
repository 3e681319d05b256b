//! Watermark signature and detection record codecs.
//!
//! Both are flat big-endian binary records in the same spirit as
//! `calx::stego::embed_base`'s magic/checksum/length header, just with a
//! richer field set and (for the signature) a forward magic search so a
//! caller-persisted file may carry an unrelated prelude.

use crate::error::{Namespace, StegError};
use crate::prng::{gaussian_sequence, rng_for_password};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

const SIG_MAGIC: &[u8; 4] = b"DGSG";
const DETECTION_MAGIC: &[u8; 4] = b"DGWM";

pub const DEFAULT_N: i32 = 1000;
pub const DEFAULT_FILTER_METHOD: i32 = 2;
pub const DEFAULT_FILTER_ID: i32 = 1;
pub const DEFAULT_LEVELS: i32 = 3;
pub const DEFAULT_ALPHA: f64 = 0.2;
pub const DEFAULT_CAST_THRESHOLD: f64 = 40.0;
pub const DEFAULT_DETECT_THRESHOLD: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    pub wavelet_filter_method: i32,
    pub filter_id: i32,
    pub levels: i32,
    pub alpha: f64,
    pub cast_threshold: f64,
    pub detect_threshold: f64,
    pub w: Vec<f64>,
}

impl Signature {
    /// Generate the default-parameter signature for a password.
    pub fn generate(password: &str) -> Signature {
        let mut rng = rng_for_password(password);
        let w = gaussian_sequence(&mut rng, DEFAULT_N as usize);
        Signature {
            wavelet_filter_method: DEFAULT_FILTER_METHOD,
            filter_id: DEFAULT_FILTER_ID,
            levels: DEFAULT_LEVELS,
            alpha: DEFAULT_ALPHA,
            cast_threshold: DEFAULT_CAST_THRESHOLD,
            detect_threshold: DEFAULT_DETECT_THRESHOLD,
            w,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Cursor::new(Vec::with_capacity(4 + 4 * 4 + 8 * 3 + self.w.len() * 8));
        out.get_mut().extend_from_slice(SIG_MAGIC);
        out.write_i32::<BigEndian>(self.w.len() as i32).unwrap();
        out.write_i32::<BigEndian>(self.wavelet_filter_method).unwrap();
        out.write_i32::<BigEndian>(self.filter_id).unwrap();
        out.write_i32::<BigEndian>(self.levels).unwrap();
        out.write_f64::<BigEndian>(self.alpha).unwrap();
        out.write_f64::<BigEndian>(self.cast_threshold).unwrap();
        out.write_f64::<BigEndian>(self.detect_threshold).unwrap();
        for x in &self.w {
            out.write_f64::<BigEndian>(*x).unwrap();
        }
        out.into_inner()
    }

    /// Forward-searches `bytes` for the first occurrence of the magic: a
    /// caller-persisted file may carry a serialization prelude ahead of the
    /// record.
    pub fn from_bytes(namespace: Namespace, bytes: &[u8]) -> Result<Signature, StegError> {
        let start = find_magic(bytes, SIG_MAGIC).ok_or_else(|| StegError::SigNotValid {
            namespace,
            message: "signature magic not found".into(),
        })?;
        let mut cur = Cursor::new(&bytes[start + 4..]);
        let bad = |_| StegError::SigNotValid { namespace, message: "truncated signature record".into() };

        let n = cur.read_i32::<BigEndian>().map_err(bad)?;
        if !(0..=100_000).contains(&n) {
            return Err(StegError::SigNotValid { namespace, message: format!("N={} out of range [0,100000]", n) });
        }
        let wavelet_filter_method = cur.read_i32::<BigEndian>().map_err(bad)?;
        let filter_id = cur.read_i32::<BigEndian>().map_err(bad)?;
        let levels = cur.read_i32::<BigEndian>().map_err(bad)?;
        if !(1..=10).contains(&levels) {
            return Err(StegError::SigNotValid { namespace, message: format!("levels={} out of range [1,10]", levels) });
        }
        let alpha = cur.read_f64::<BigEndian>().map_err(bad)?;
        let cast_threshold = cur.read_f64::<BigEndian>().map_err(bad)?;
        let detect_threshold = cur.read_f64::<BigEndian>().map_err(bad)?;
        let mut w = Vec::with_capacity(n as usize);
        for _ in 0..n {
            w.push(cur.read_f64::<BigEndian>().map_err(bad)?);
        }

        Ok(Signature { wavelet_filter_method, filter_id, levels, alpha, cast_threshold, detect_threshold, w })
    }
}

fn find_magic(haystack: &[u8], magic: &[u8; 4]) -> Option<usize> {
    haystack.windows(4).position(|w| w == magic)
}

/// One level's worth of detector statistics, in subband order H, V, D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubbandStats {
    pub m: i32,
    pub z: f64,
    pub v: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectionRecord {
    pub levels: i32,
    pub alpha: f64,
    /// `3 * levels` entries, level 1..levels, each level contributing
    /// `(H, V, D)` in that order.
    pub stats: Vec<SubbandStats>,
}

impl DetectionRecord {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Cursor::new(Vec::with_capacity(4 + 4 + 8 + self.stats.len() * 16));
        out.get_mut().extend_from_slice(DETECTION_MAGIC);
        out.write_i32::<BigEndian>(self.levels).unwrap();
        out.write_f64::<BigEndian>(self.alpha).unwrap();
        for s in &self.stats {
            out.write_i32::<BigEndian>(s.m).unwrap();
            out.write_f64::<BigEndian>(s.z).unwrap();
            out.write_f64::<BigEndian>(s.v).unwrap();
        }
        out.into_inner()
    }

    pub fn from_bytes(namespace: Namespace, bytes: &[u8]) -> Result<DetectionRecord, StegError> {
        if bytes.len() < 4 || &bytes[0..4] != DETECTION_MAGIC {
            return Err(StegError::CorruptData { namespace, message: "detection record magic not found".into() });
        }
        let mut cur = Cursor::new(&bytes[4..]);
        let bad = |_| StegError::CorruptData { namespace, message: "truncated detection record".into() };
        let levels = cur.read_i32::<BigEndian>().map_err(bad)?;
        let alpha = cur.read_f64::<BigEndian>().map_err(bad)?;
        let mut stats = Vec::with_capacity((3 * levels).max(0) as usize);
        for _ in 0..3 * levels {
            let m = cur.read_i32::<BigEndian>().map_err(bad)?;
            let z = cur.read_f64::<BigEndian>().map_err(bad)?;
            let v = cur.read_f64::<BigEndian>().map_err(bad)?;
            stats.push(SubbandStats { m, z, v });
        }
        Ok(DetectionRecord { levels, alpha, stats })
    }
}

/// Correlation score: `ok / n`, skipping subbands with no coefficients
/// above the detection threshold.
pub fn correlation(record: &DetectionRecord) -> f64 {
    let mut n = 3 * record.levels as i64;
    let mut ok = 0i64;
    for s in &record.stats {
        if s.m == 0 {
            n -= 1;
            continue;
        }
        if s.z > record.alpha * s.v {
            ok += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        ok as f64 / n as f64
    }
}

const SUBBAND_NAMES: [&str; 3] = ["H", "V", "D"];

/// One subband's detection statistics alongside the boolean test result the
/// correlation score folds into a single ratio, mirroring the Python
/// detector's `_last_correlation_debug` debug tuples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionDebugEntry {
    pub level: i32,
    pub subband: &'static str,
    pub m: i32,
    pub z: f64,
    pub v: f64,
    pub matched: bool,
}

/// Level-by-level view of a `DetectionRecord`, explicit and caller-visible
/// rather than hidden behind global state. Subbands with `m == 0` only
/// affect `n`, the same way they're excluded from `entries` in the Python
/// detector's debug tuples.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionDebug {
    pub correlation: f64,
    pub ok: i64,
    pub n: i64,
    pub entries: Vec<DetectionDebugEntry>,
}

/// Re-derive a level-by-level debug view from a `DetectionRecord`, the same
/// `(m, z, v, matched)` breakdown the correlation score is computed from.
pub fn debug_view(record: &DetectionRecord) -> DetectionDebug {
    let mut n = 3 * record.levels as i64;
    let mut ok = 0i64;
    let mut entries = Vec::with_capacity(record.stats.len());
    for (i, s) in record.stats.iter().enumerate() {
        if s.m == 0 {
            n -= 1;
            continue;
        }
        let level = i as i32 / 3 + 1;
        let subband = SUBBAND_NAMES[i % 3];
        let matched = s.z > record.alpha * s.v;
        if matched {
            ok += 1;
        }
        entries.push(DetectionDebugEntry { level, subband, m: s.m, z: s.z, v: s.v, matched });
    }
    let correlation = if n == 0 { 0.0 } else { ok as f64 / n as f64 };
    DetectionDebug { correlation, ok, n, entries }
}

pub fn high_watermark_level() -> f64 {
    0.7
}

pub fn low_watermark_level() -> f64 {
    0.3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trips() {
        let sig = Signature::generate("pw");
        let bytes = sig.to_bytes();
        let parsed = Signature::from_bytes(Namespace::DwtDugad, &bytes).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn signature_generation_is_deterministic() {
        let a = Signature::generate("w");
        let b = Signature::generate("w");
        assert_eq!(a, b);
    }

    #[test]
    fn signature_parses_with_arbitrary_prelude() {
        let sig = Signature::generate("pw");
        let mut buf = b"some unrelated serialization prelude bytes".to_vec();
        buf.extend_from_slice(&sig.to_bytes());
        let parsed = Signature::from_bytes(Namespace::DwtDugad, &buf).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn signature_rejects_out_of_range_n() {
        let mut sig = Signature::generate("pw");
        sig.w = vec![0.0; 200_000];
        let bytes = sig.to_bytes();
        let err = Signature::from_bytes(Namespace::DwtDugad, &bytes).unwrap_err();
        assert!(matches!(err, StegError::SigNotValid { .. }));
    }

    #[test]
    fn detection_record_round_trips() {
        let record = DetectionRecord {
            levels: 2,
            alpha: 0.2,
            stats: vec![
                SubbandStats { m: 10, z: 5.0, v: 20.0 },
                SubbandStats { m: 0, z: 0.0, v: 0.0 },
                SubbandStats { m: 3, z: 1.0, v: 2.0 },
                SubbandStats { m: 7, z: 9.0, v: 30.0 },
                SubbandStats { m: 1, z: 0.1, v: 1.0 },
                SubbandStats { m: 4, z: 2.0, v: 4.0 },
            ],
        };
        let bytes = record.to_bytes();
        let parsed = DetectionRecord::from_bytes(Namespace::DwtDugad, &bytes).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn correlation_matches_worked_example() {
        // n starts at 6; one m==0 drops n to 5; among remaining 5, those
        // with z > alpha*v count toward ok.
        let record = DetectionRecord {
            levels: 2,
            alpha: 0.2,
            stats: vec![
                SubbandStats { m: 10, z: 5.0, v: 20.0 },  // 5 > 4   -> ok
                SubbandStats { m: 0, z: 0.0, v: 0.0 },    // excluded
                SubbandStats { m: 3, z: 1.0, v: 2.0 },    // 1 > 0.4 -> ok
                SubbandStats { m: 7, z: 9.0, v: 30.0 },   // 9 > 6   -> ok
                SubbandStats { m: 1, z: 0.1, v: 1.0 },    // 0.1 < 0.2 -> no
                SubbandStats { m: 4, z: 2.0, v: 4.0 },    // 2 > 0.8 -> ok
            ],
        };
        assert!((correlation(&record) - (4.0 / 5.0)).abs() < 1e-12);
    }

    #[test]
    fn debug_view_matches_correlation_and_tags_matches() {
        let record = DetectionRecord {
            levels: 2,
            alpha: 0.2,
            stats: vec![
                SubbandStats { m: 10, z: 5.0, v: 20.0 },  // 5 > 4   -> matched
                SubbandStats { m: 0, z: 0.0, v: 0.0 },    // excluded, no entry
                SubbandStats { m: 3, z: 1.0, v: 2.0 },    // 1 > 0.4 -> matched
                SubbandStats { m: 7, z: 9.0, v: 30.0 },   // 9 > 6   -> matched
                SubbandStats { m: 1, z: 0.1, v: 1.0 },    // 0.1 < 0.2 -> not matched
                SubbandStats { m: 4, z: 2.0, v: 4.0 },    // 2 > 0.8 -> matched
            ],
        };
        let debug = debug_view(&record);
        assert!((debug.correlation - correlation(&record)).abs() < 1e-12);
        assert_eq!(debug.ok, 4);
        assert_eq!(debug.n, 5);
        assert_eq!(debug.entries.len(), 5);
        assert_eq!(debug.entries[0], DetectionDebugEntry { level: 1, subband: "H", m: 10, z: 5.0, v: 20.0, matched: true });
        assert_eq!(debug.entries[3], DetectionDebugEntry { level: 2, subband: "V", m: 1, z: 0.1, v: 1.0, matched: false });
    }
}
