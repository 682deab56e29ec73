//! Pixel fingerprint used to seed the synthetic detector.

pub type Fingerprint = u32;

/// Sample every 1000th pixel by default.
pub const DEFAULT_SAMPLE_STRIDE: usize = 1000;

const BYTES_PER_PIXEL: usize = 4;

/// Fold sampled RGBA pixels into a 32-bit rolling hash.
///
/// For each sampled pixel the hash advances as `hash * 31 + r + g + b`
/// (written `(hash << 5) - hash`) with 32-bit signed wraparound. The result
/// is the absolute value of the final hash.
pub fn fingerprint(rgba: &[u8], stride: usize) -> Fingerprint {
    let stride = stride.max(1);
    let mut hash: i32 = 0;

    for px in rgba.chunks_exact(BYTES_PER_PIXEL).step_by(stride) {
        let sum = px[0] as i32 + px[1] as i32 + px[2] as i32;
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(sum);
    }

    hash.unsigned_abs()
}
