// Multi-needle byte search over one 16-byte window
//
// A window search answers "which of these 16 bytes equal any needle?" as a
// 16-bit mask (bit i = byte i). Up to three needles: the delimiter search uses
// field, tuple and collection-item delimiters; the escape search uses one.
//
// `ScalarSearch` is the reference implementation. `SimdSearch` is the fast
// path on `std::simd` (one 128-bit compare per needle). Both must produce
// bit-identical masks for every window; see tests/properties.rs.

use std::simd::prelude::*;

/// Bytes per window.
pub const WINDOW: usize = 16;

/// Maximum needles per search.
pub const MAX_NEEDLES: usize = 3;

/// Compute the needle-match mask of a window.
pub trait WindowSearch {
    /// Bit `i` is set iff `window[i]` equals one of the needles.
    ///
    /// Only the first `WINDOW` bytes are examined. Panics if `window` is
    /// shorter than `WINDOW`.
    fn find(&self, window: &[u8]) -> u16;
}

/// Pad a needle list to exactly three bytes by repeating the first needle.
#[inline]
fn pad_needles(needles: &[u8]) -> [u8; MAX_NEEDLES] {
    assert!(
        !needles.is_empty() && needles.len() <= MAX_NEEDLES,
        "window search takes 1 to {MAX_NEEDLES} needles, got {}",
        needles.len()
    );
    let mut padded = [needles[0]; MAX_NEEDLES];
    padded[..needles.len()].copy_from_slice(needles);
    padded
}

// ---------------------------------------------------------------------------
// Scalar reference
// ---------------------------------------------------------------------------

/// Byte-at-a-time search. Portable, and the reference for the fast paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarSearch {
    needles: [u8; MAX_NEEDLES],
}

impl ScalarSearch {
    pub fn new(needles: &[u8]) -> Self {
        ScalarSearch {
            needles: pad_needles(needles),
        }
    }
}

impl WindowSearch for ScalarSearch {
    #[inline]
    fn find(&self, window: &[u8]) -> u16 {
        let [a, b, c] = self.needles;
        let mut mask = 0u16;
        for (i, &byte) in window[..WINDOW].iter().enumerate() {
            if byte == a || byte == b || byte == c {
                mask |= 1 << i;
            }
        }
        mask
    }
}

// ---------------------------------------------------------------------------
// Portable SIMD
// ---------------------------------------------------------------------------

/// Three splatted compares OR-ed together, then a lane bitmask.
///
/// Uses only `Simd::from_slice`, `splat`, `simd_eq` and `to_bitmask`.
#[derive(Debug, Clone, Copy)]
pub struct SimdSearch {
    needles: [Simd<u8, WINDOW>; MAX_NEEDLES],
}

impl SimdSearch {
    pub fn new(needles: &[u8]) -> Self {
        let [a, b, c] = pad_needles(needles);
        SimdSearch {
            needles: [
                Simd::splat(a),
                Simd::splat(b),
                Simd::splat(c),
            ],
        }
    }
}

impl WindowSearch for SimdSearch {
    #[inline]
    fn find(&self, window: &[u8]) -> u16 {
        let chunk = Simd::<u8, WINDOW>::from_slice(&window[..WINDOW]);
        let [a, b, c] = self.needles;
        let hits = chunk.simd_eq(a) | chunk.simd_eq(b) | chunk.simd_eq(c);
        // Only the low WINDOW bits can be set.
        hits.to_bitmask() as u16
    }
}

/// Fastest search available.
pub type NeedleSearch = SimdSearch;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_three_needles() {
        let search = ScalarSearch::new(b",\n\x02");
        let window = b"a,b\nc\x02dddddddd,\n";
        assert_eq!(window.len(), WINDOW);
        // positions 1, 3, 5, 14, 15
        assert_eq!(search.find(window), 0b1100_0000_0010_1010);
    }

    #[test]
    fn test_single_needle_padding() {
        let search = ScalarSearch::new(b"\\");
        let window = b"\\\\abcdefghijklm\\";
        assert_eq!(search.find(window), 0b1000_0000_0000_0011);
    }

    #[test]
    fn test_only_first_window_examined() {
        let search = ScalarSearch::new(b",");
        let mut input = vec![b'x'; WINDOW];
        input.extend_from_slice(b",,,,");
        assert_eq!(search.find(&input), 0, "bytes past the window must be ignored");
    }

    #[test]
    #[should_panic]
    fn test_short_window_panics() {
        ScalarSearch::new(b",").find(b"a,b");
    }

    #[test]
    #[should_panic]
    fn test_too_many_needles_panics() {
        ScalarSearch::new(b",;|\t");
    }

    #[test]
    fn test_simd_matches_scalar_high_bytes() {
        // Signed-compare pitfalls live above 0x7F.
        let needles = [0x80u8, 0xFF, 0x01];
        let scalar = ScalarSearch::new(&needles);
        let fast = SimdSearch::new(&needles);
        let window: Vec<u8> = (0..WINDOW as u8).map(|i| i.wrapping_mul(37).wrapping_add(0x7E)).collect();
        let mut window = window;
        window[3] = 0x80;
        window[9] = 0xFF;
        window[15] = 0x01;
        assert_eq!(fast.find(&window), scalar.find(&window));
        assert_ne!(scalar.find(&window), 0);
    }

    #[test]
    fn test_simd_three_needles() {
        let search = SimdSearch::new(b",\n\x02");
        let window = b"a,b\nc\x02dddddddd,\n";
        assert_eq!(search.find(window), 0b1100_0000_0010_1010);
    }

    #[test]
    #[should_panic]
    fn test_simd_short_window_panics() {
        SimdSearch::new(b",").find(b"a,b");
    }
}
