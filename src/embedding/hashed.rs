//! Deterministic offline embeddings derived from a SHA-256 hash stream.
//!
//! These vectors carry no semantic meaning. Identical texts map to identical
//! vectors, which is enough to exercise storage and nearest-neighbor search
//! without a network or a paid API.

use sha2::{Digest, Sha256};

const BYTES_PER_COMPONENT: usize = 4;
const SCALE: f64 = 4_294_967_296.0; // 2^32
/// Largest `f32` below 1.0. Words near `u32::MAX` would otherwise round up to 1.0.
const BELOW_ONE: f32 = 0.999_999_94;

/// Build a `dim`-component vector with values in `[0, 1)` from `text`.
///
/// The running digest starts as `sha256(text)` and is re-hashed before every
/// 32-byte block is appended, so the seed digest itself never lands in the pool.
pub fn hashed_embedding(text: &str, dim: usize) -> Vec<f32> {
    let needed = dim * BYTES_PER_COMPONENT;
    let mut digest = Sha256::digest(text.as_bytes());
    let mut pool: Vec<u8> = Vec::with_capacity(needed + 32);

    while pool.len() < needed {
        digest = Sha256::digest(digest);
        pool.extend_from_slice(&digest);
    }

    pool.chunks_exact(BYTES_PER_COMPONENT)
        .take(dim)
        .map(|bytes| {
            unit_interval(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        })
        .collect()
}

fn unit_interval(word: u32) -> f32 {
    ((f64::from(word) / SCALE) as f32).min(BELOW_ONE)
}
