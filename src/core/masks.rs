// Bit-range lookup tables for 16-bit window masks
//
// `BITS_AT_OR_ABOVE[a] & BITS_BELOW[b]` selects the half-open bit range
// [a, b) of a window mask. Built at compile time, shared by every parser.

use super::search::WINDOW;

/// `BITS_BELOW[n]` has bits `0..n` set.
pub const BITS_BELOW: [u16; WINDOW] = build_bits_below();

/// `BITS_AT_OR_ABOVE[n]` has bits `n..16` set.
pub const BITS_AT_OR_ABOVE: [u16; WINDOW] = build_bits_at_or_above();

/// Bit for the last byte of a window.
pub const LAST_BIT: u16 = 1 << (WINDOW - 1);

const fn build_bits_below() -> [u16; WINDOW] {
    let mut table = [0u16; WINDOW];
    let mut i = 0;
    while i < WINDOW {
        table[i] = ((1u32 << i) - 1) as u16;
        i += 1;
    }
    table
}

const fn build_bits_at_or_above() -> [u16; WINDOW] {
    let mut table = [0u16; WINDOW];
    let mut i = 0;
    while i < WINDOW {
        table[i] = (0xFFFFu32 << i) as u16;
        i += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_partition_the_window() {
        for n in 0..WINDOW {
            assert_eq!(
                BITS_BELOW[n] | BITS_AT_OR_ABOVE[n],
                0xFFFF,
                "tables at {n} must cover every bit"
            );
            assert_eq!(BITS_BELOW[n] & BITS_AT_OR_ABOVE[n], 0, "tables at {n} overlap");
        }
    }

    #[test]
    fn test_range_selection() {
        // [3, 7) -> bits 3,4,5,6
        assert_eq!(BITS_AT_OR_ABOVE[3] & BITS_BELOW[7], 0b0111_1000);
        // empty range
        assert_eq!(BITS_AT_OR_ABOVE[5] & BITS_BELOW[5], 0);
        assert_eq!(BITS_BELOW[0], 0);
        assert_eq!(BITS_AT_OR_ABOVE[0], 0xFFFF);
        assert_eq!(BITS_AT_OR_ABOVE[15], LAST_BIT);
    }
}
