//! Seedable random draws shared by the pool builder and the simulator.
//!
//! Every stream is derived from the run seed; nothing reads process-wide
//! random state.

use chrono::{Duration, NaiveDateTime};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

/// Random draws used by generation.
///
/// `Sampler` is the production source; tests provide scripted sources to
/// force specific outcomes.
pub trait Sampling {
    /// Draw a float in `[low, high)`. Returns `low` for an empty range.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Draw an integer in `[low, high]`. Returns `low` for an empty range.
    fn integer(&mut self, low: i64, high: i64) -> i64;

    /// True with probability `p` (clamped to `[0, 1]`).
    fn bernoulli(&mut self, p: f64) -> bool;

    /// Draw a timestamp in `[start, end]` at second resolution.
    fn date_between(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> NaiveDateTime;

    /// Draw a random (version 4) identifier.
    fn uuid(&mut self) -> Uuid;

    /// Weighted categorical draw. Non-positive weights are never chosen.
    fn choice<'a, T>(&mut self, options: &'a [(T, f64)]) -> Option<&'a T> {
        let total: f64 = options.iter().map(|(_, weight)| weight.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut target = self.uniform(0.0, total);
        let mut last = None;
        for (value, weight) in options {
            let weight = weight.max(0.0);
            if weight <= 0.0 {
                continue;
            }
            if target < weight {
                return Some(value);
            }
            target -= weight;
            last = Some(value);
        }
        last
    }

    /// Uniform draw over a slice.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.integer(0, items.len() as i64 - 1) as usize;
        items.get(idx)
    }
}

/// ChaCha8-backed sampler.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: ChaCha8Rng,
}

impl Sampler {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Independent stream named by `key`.
    pub fn derive(seed: u64, key: &str) -> Self {
        Self::from_seed(hash_seed(seed, key))
    }

    /// Independent stream for the `index`-th item of a sequence.
    pub fn for_index(seed: u64, index: u64) -> Self {
        Self::from_seed(hash_index_seed(seed, index))
    }
}

impl Sampling for Sampler {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low.is_nan() || high.is_nan() || high <= low {
            return low;
        }
        self.rng.random_range(low..high)
    }

    fn integer(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn bernoulli(&mut self, p: f64) -> bool {
        if p.is_nan() || p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.rng.random_bool(p)
    }

    fn date_between(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> NaiveDateTime {
        let span = (end - start).num_seconds();
        if span <= 0 {
            return start;
        }
        start + Duration::seconds(self.rng.random_range(0..=span))
    }

    fn uuid(&mut self) -> Uuid {
        let mut bytes = [0_u8; 16];
        self.rng.fill_bytes(&mut bytes);
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        Uuid::from_bytes(bytes)
    }
}

impl RngCore for Sampler {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }
}

pub(crate) fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hash_index_seed(seed: u64, index: u64) -> u64 {
    let mut hash = seed ^ index.wrapping_mul(0x9e3779b97f4a7c15);
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^ (hash >> 29)
}
