// Escape correction for delimiter masks
//
// An escape byte escapes the byte after it, including another escape byte,
// so a run of k escapes escapes the byte that follows iff k is odd. The only
// state crossing a window boundary is whether the window's last byte is an
// active (unescaped) escape.

use super::masks::LAST_BIT;
use super::search::WINDOW;

/// Clear the delimiter bits that are escaped.
///
/// `escape_mask` has bit `i` set where byte `i` is the escape character.
/// `last_char_is_escape` is the carry in (previous window ended with an
/// active escape) and is replaced by the carry out.
#[inline]
pub fn process_escape_mask(mut escape_mask: u16, last_char_is_escape: &mut bool, delim_mask: &mut u16) {
    let first_char_is_escape = *last_char_is_escape;

    if escape_mask == 0 {
        if first_char_is_escape {
            *delim_mask &= !1;
        }
        *last_char_is_escape = false;
        return;
    }

    // Drop escapes that are themselves escaped, left to right.
    let mut escape_next = first_char_is_escape;
    for i in 0..WINDOW {
        let bit = 1u16 << i;
        if escape_next {
            escape_mask &= !bit;
        }
        escape_next = escape_mask & bit != 0;
    }

    *last_char_is_escape = escape_mask & LAST_BIT != 0;

    // Bit n now means "byte n is escaped by byte n-1".
    let escaped = (escape_mask << 1) | u16::from(first_char_is_escape);
    *delim_mask &= !escaped;
}
