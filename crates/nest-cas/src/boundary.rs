//! Content-defined chunk boundary detection.
//!
//! Boundaries are placed where a rolling hash over the trailing
//! [`WINDOW_SIZE`] bytes, masked with [`BOUNDARY_MASK`], hits zero. Because
//! the test depends only on local content, an insertion or edit early in a
//! file shifts at most the chunks around it — later boundaries re-align and
//! the unchanged chunks keep their addresses. This is the property
//! deduplication depends on.
//!
//! **The parameters below are fixed at deployment and must never change**,
//! otherwise the same data would chunk differently and dedup breaks.

use std::ops::Range;

/// Minimum chunk size (8 KB). No boundary test happens before this offset.
pub const MIN_CHUNK: usize = 8 * 1024;

/// Maximum chunk size (64 KB). A cut is forced at this limit.
pub const MAX_CHUNK: usize = 64 * 1024;

/// Boundary condition: cut where `hash & BOUNDARY_MASK == 0`.
///
/// A 12-bit mask gives an expected chunk size of ~4 KB past the minimum.
pub const BOUNDARY_MASK: u32 = 0x0FFF;

/// Number of trailing bytes the rolling hash covers.
pub const WINDOW_SIZE: usize = 48;

/// `31^WINDOW_SIZE mod 2^32` — the factor by which the outgoing byte's
/// contribution has grown by the time it leaves the window.
const WINDOW_FACTOR: u32 = pow31(WINDOW_SIZE as u32);

const fn pow31(n: u32) -> u32 {
    let mut acc = 1u32;
    let mut i = 0;
    while i < n {
        acc = acc.wrapping_mul(31);
        i += 1;
    }
    acc
}

/// Split a buffer into content-defined boundary ranges.
///
/// Returns ordered half-open ranges covering `[0, buffer.len())` with no
/// gaps or overlaps. The output depends only on the byte content of the
/// buffer: identical bytes always yield identical boundaries.
///
/// Edge cases: an empty buffer yields no ranges; a buffer shorter than
/// [`MIN_CHUNK`] yields a single range. The final range may be shorter than
/// `MIN_CHUNK`, but no range ever exceeds [`MAX_CHUNK`]. Runs in linear
/// time: the window hash is rolled forward one byte per candidate position.
pub fn find_boundaries(buffer: &[u8]) -> Vec<Range<usize>> {
    let len = buffer.len();
    let mut boundaries = Vec::new();
    let mut start = 0;

    while start < len {
        let limit = (start + MAX_CHUNK).min(len);

        // No candidate positions exist before start + MIN_CHUNK.
        if start + MIN_CHUNK >= limit {
            boundaries.push(start..limit);
            start = limit;
            continue;
        }

        let mut pos = start + MIN_CHUNK;
        let mut hash = window_hash(buffer, pos - WINDOW_SIZE, pos);
        let mut cut = limit;

        loop {
            if hash & BOUNDARY_MASK == 0 {
                cut = pos;
                break;
            }
            pos += 1;
            if pos >= limit {
                break;
            }
            // Roll the window forward: take in buffer[pos-1], drop
            // buffer[pos-1-WINDOW_SIZE]. All arithmetic wraps mod 2^32, so
            // the rolled value is bit-identical to recomputing the window.
            hash = hash
                .wrapping_mul(31)
                .wrapping_add(buffer[pos - 1] as u32)
                .wrapping_sub(WINDOW_FACTOR.wrapping_mul(buffer[pos - 1 - WINDOW_SIZE] as u32));
        }

        boundaries.push(start..cut);
        start = cut;
    }

    boundaries
}

/// Hash of `buffer[start..end]`: `h = h*31 + b` per byte, wrapping 32-bit.
///
/// This is the reference (non-rolling) form of the window hash; the scan
/// loop must produce exactly these values.
fn window_hash(buffer: &[u8], start: usize, end: usize) -> u32 {
    let mut hash = 0u32;
    for &b in &buffer[start..end] {
        hash = hash.wrapping_mul(31).wrapping_add(b as u32);
    }
    hash
}
