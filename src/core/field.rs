// Field descriptors and unescaping

use std::borrow::Cow;

/// Location of one field inside the caller's input buffer.
///
/// `len` magnitude is the field length excluding its terminating delimiter.
/// A negative `len` marks a field containing escape bytes that must go
/// through [`unescape_field`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldLocation {
    /// Byte offset of the first field byte.
    pub start: usize,
    /// Signed field length; negative when escaped.
    pub len: isize,
}

impl FieldLocation {
    #[inline]
    pub fn new(start: usize, len: usize, escaped: bool) -> Self {
        let len = len as isize;
        FieldLocation {
            start,
            len: if escaped { -len } else { len },
        }
    }

    /// Field length in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.len.unsigned_abs()
    }

    #[inline]
    pub fn is_escaped(&self) -> bool {
        self.len < 0
    }

    /// Offset one past the last field byte (the delimiter position).
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.byte_len()
    }

    /// Raw field bytes, escapes included.
    #[inline]
    pub fn bytes<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.start..self.end()]
    }

    /// Field bytes ready for conversion: unescaped when flagged, borrowed otherwise.
    #[inline]
    pub fn materialize<'a>(&self, input: &'a [u8], escape: Option<u8>) -> Cow<'a, [u8]> {
        let raw = self.bytes(input);
        match escape {
            Some(esc) if self.is_escaped() => unescape_field(raw, esc),
            _ => Cow::Borrowed(raw),
        }
    }
}

/// Remove escape bytes, keeping whatever each one escapes.
///
/// `a\,b` becomes `a,b` and `a\\b` becomes `a\b`. A lone escape at the very
/// end has nothing to escape and is dropped.
pub fn unescape_field(field: &[u8], escape: u8) -> Cow<'_, [u8]> {
    // Fast path: nothing to remove
    if !field.contains(&escape) {
        return Cow::Borrowed(field);
    }

    let mut result = Vec::with_capacity(field.len());
    let mut escape_next = false;
    for &byte in field {
        if byte == escape && !escape_next {
            escape_next = true;
        } else {
            escape_next = false;
            result.push(byte);
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_len_marks_escape() {
        let loc = FieldLocation::new(3, 4, true);
        assert_eq!(loc.len, -4);
        assert!(loc.is_escaped());
        assert_eq!(loc.byte_len(), 4);
        assert_eq!(loc.end(), 7);

        let plain = FieldLocation::new(3, 4, false);
        assert_eq!(plain.len, 4);
        assert!(!plain.is_escaped());
    }

    #[test]
    fn test_bytes_slices_input() {
        let input = b"ab,cde\n";
        let loc = FieldLocation::new(3, 3, false);
        assert_eq!(loc.bytes(input), b"cde");
    }

    #[test]
    fn test_unescape_removes_single_escapes() {
        assert_eq!(unescape_field(br"a\,b", b'\\').as_ref(), b"a,b");
        assert_eq!(unescape_field(br"a\\b", b'\\').as_ref(), br"a\b");
        assert_eq!(unescape_field(br"\\\,", b'\\').as_ref(), br"\,");
    }

    #[test]
    fn test_unescape_drops_trailing_escape() {
        assert_eq!(unescape_field(br"abc\", b'\\').as_ref(), b"abc");
    }

    #[test]
    fn test_unescape_borrows_when_clean() {
        assert!(matches!(unescape_field(b"plain", b'\\'), Cow::Borrowed(_)));
    }

    #[test]
    fn test_materialize_respects_flag() {
        let input = br"a\,b,c";
        let escaped = FieldLocation::new(0, 4, true);
        assert_eq!(escaped.materialize(input, Some(b'\\')).as_ref(), b"a,b");
        // Not flagged: returned raw even though it has an escape byte.
        let raw = FieldLocation::new(0, 4, false);
        assert_eq!(raw.materialize(input, Some(b'\\')).as_ref(), br"a\,b");
        assert_eq!(escaped.materialize(input, None).as_ref(), br"a\,b");
    }
}
