/*!

  Deterministic, seedable pseudo-random bit source used by the search engine.

  Built on `ChaCha8Rng` (`rand_chacha`) rather than a hand-rolled linear congruential
  generator: an LCG's low bits have short periods and visible correlation, which would
  bias `uniform_int` for small `n` (the `unsat_set`/tie-break selections in the search
  loop draw exactly this way). ChaCha8 is a real, documented, cryptographically-reviewed
  bit mixer, seeded explicitly from a `u64` so that two `Rng`s built from the same seed
  produce identical output regardless of platform or process — a fixed seed and flip
  budget must reproduce the same trial byte for byte.

*/

use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

#[derive(Clone)]
pub struct Rng {
  inner: ChaCha8Rng,
}

impl Rng {
  /// Builds a generator from a 64-bit seed. The mapping from `u64` to the ChaCha8
  /// 32-byte seed is explicit and platform-independent: `seed.to_le_bytes()` into the
  /// first 8 bytes, the remaining 24 bytes zero.
  pub fn with_seed(seed: u64) -> Rng {
    let mut seed_bytes = [0u8; 32];
    seed_bytes[..8].copy_from_slice(&seed.to_le_bytes());
    Rng { inner: ChaCha8Rng::from_seed(seed_bytes) }
  }

  /// Unbiased uniform integer in `[0, n)`. Panics if `n == 0`.
  ///
  /// Uses the standard rejection-sampling trick: draw `x` from the full `u64` range and
  /// reject values below `2^64 mod n` so that the accepted values divide evenly into
  /// `n` buckets.
  pub fn uniform_int(&mut self, n: u64) -> u64 {
    assert_ne!(n, 0, "uniform_int requires a nonempty range");
    if n == 1 {
      return 0;
    }
    let threshold = n.wrapping_neg() % n;
    loop {
      let x = self.inner.next_u64();
      if x >= threshold {
        return x % n;
      }
    }
  }

  /// Uniform double in `[0, 1)`.
  pub fn uniform_real(&mut self) -> f64 {
    // Top 53 bits of a u64 give a uniformly distributed double in [0, 1).
    const MANTISSA_BITS: u32 = 53;
    let bits = self.inner.next_u64() >> (64 - MANTISSA_BITS);
    (bits as f64) / ((1u64 << MANTISSA_BITS) as f64)
  }

  /// Convenience: a uniformly chosen index into a nonempty slice.
  pub fn choose_index(&mut self, len: usize) -> usize {
    assert_ne!(len, 0, "choose_index requires a nonempty slice");
    self.uniform_int(len as u64) as usize
  }
}
