//! The one deterministic PRNG the whole crate is pinned to.
//!
//! `calx::rng::seeded_rng` seeds an `XorShiftRng` from any `Hash` value using
//! `DefaultHasher`; this generalizes the same idea but seeds from a
//! password's SHA-256 digest instead, since the keyed pixel permutation and
//! the Gaussian watermark signature both need to reproduce bit-for-bit
//! across runs and (unlike `DefaultHasher`) SHA-256 is a pinned, documented
//! construction. `RandomPermutation` is lifted from `calx::rng` almost
//! unchanged — same lazy Fisher-Yates over a `VecMap`, just owning its RNG
//! instead of borrowing one, so it can live inside a long-lived reader or
//! writer.

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use sha2::{Digest, Sha256};
use vec_map::VecMap;

/// Derive the 64-bit seed from a UTF-8 password: the first 16 hex digits of
/// SHA-256(password), i.e. the first 8 digest bytes, read big-endian.
pub fn password_seed(password: &str) -> u64 {
    let digest = Sha256::digest(password.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Build the deterministic RNG for a password. The 16-byte xorshift seed is
/// the 64-bit password seed repeated twice in little-endian order — fully
/// portable, no reliance on native struct layout (unlike `calx::rng`'s
/// `transmute`, which ties its sequence to host endianness).
pub fn rng_for_password(password: &str) -> XorShiftRng {
    let seed64 = password_seed(password);
    // XorShift must not be seeded all-zero.
    let seed64 = if seed64 == 0 { 1 } else { seed64 };
    let mut seed = [0u8; 16];
    seed[..8].copy_from_slice(&seed64.to_le_bytes());
    seed[8..].copy_from_slice(&seed64.to_le_bytes());
    XorShiftRng::from_seed(seed)
}

/// Lazily evaluated random permutation of `0..n`, used both to walk pixel
/// positions in keyed (random-LSB) order and as the Fisher-Yates core of any
/// future keyed ordering. See `calx::rng::RandomPermutation`.
pub struct RandomPermutation<R: Rng> {
    remain: usize,
    shuffle: VecMap<usize>,
    rng: R,
}

impl<R: Rng> RandomPermutation<R> {
    pub fn new(rng: R, n: usize) -> RandomPermutation<R> {
        RandomPermutation { remain: n, shuffle: VecMap::new(), rng }
    }
}

impl<R: Rng> Iterator for RandomPermutation<R> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remain == 0 {
            return None;
        }

        let swap_idx = self.rng.gen_range(0..self.remain);
        self.remain -= 1;

        let head = *self.shuffle.get(self.remain).unwrap_or(&self.remain);
        Some(self.shuffle.insert(swap_idx, head).unwrap_or(swap_idx))
    }
}

/// Generate exactly `n` standard-normal variates via pairwise Box-Muller
/// rejection sampling. Pairs are drawn and emitted in order; if `n` is odd
/// only the first of the final pair is kept.
pub fn gaussian_sequence(rng: &mut impl Rng, n: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(n);
    let mut i = 0;
    while i < n {
        let (x1, x2, r) = loop {
            let x1 = 2.0 * rng.gen::<f64>() - 1.0;
            let x2 = 2.0 * rng.gen::<f64>() - 1.0;
            let s = x1 * x1 + x2 * x2;
            if s < 1.0 && s > 0.0 {
                break (x1, x2, (-2.0 * s.ln() / s).sqrt());
            }
        };
        out.push(x1 * r);
        i += 1;
        if i < n {
            out.push(x2 * r);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_seed_is_deterministic() {
        assert_eq!(password_seed("pw"), password_seed("pw"));
        assert_ne!(password_seed("pw"), password_seed("other"));
    }

    #[test]
    fn rng_for_password_reproduces_identical_streams() {
        let mut a = rng_for_password("seed");
        let mut b = rng_for_password("seed");
        let xs: Vec<u32> = (0..8).map(|_| a.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn permutation_is_a_bijection_on_0_n() {
        let rng = rng_for_password("k");
        let mut perm: Vec<usize> = RandomPermutation::new(rng, 200).collect();
        perm.sort_unstable();
        assert_eq!(perm, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn permutation_is_deterministic_for_fixed_password() {
        let a: Vec<usize> = RandomPermutation::new(rng_for_password("x"), 50).collect();
        let b: Vec<usize> = RandomPermutation::new(rng_for_password("x"), 50).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn gaussian_sequence_is_deterministic_and_sized() {
        let mut a = rng_for_password("w");
        let mut b = rng_for_password("w");
        let xs = gaussian_sequence(&mut a, 1001);
        let ys = gaussian_sequence(&mut b, 1001);
        assert_eq!(xs.len(), 1001);
        assert_eq!(xs, ys);
    }
}
