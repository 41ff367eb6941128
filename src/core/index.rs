// Field index: tuple ends and field locations for a whole buffer
//
// Produced by the direct, parallel and streaming strategies. A field belongs
// to the first tuple whose delimiter sits at or after the field start, so
// rows are recovered with one forward cursor over `fields`.

use super::field::FieldLocation;

/// Every tuple end and materialized field of a scanned buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldIndex {
    /// Offsets of tuple delimiters.
    pub row_ends: Vec<usize>,
    /// Materialized fields, in input order.
    pub fields: Vec<FieldLocation>,
    /// Total input length.
    pub input_len: usize,
    /// Input ended inside a tuple (no final tuple delimiter).
    pub trailing_row: bool,
}

impl FieldIndex {
    pub fn with_capacity(input_len: usize) -> Self {
        FieldIndex {
            row_ends: Vec::with_capacity(input_len / 50 + 4),
            fields: Vec::with_capacity(input_len / 8 + 16),
            input_len,
            trailing_row: false,
        }
    }

    /// Number of tuples, counting an unterminated last one.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_ends.len() + usize::from(self.trailing_row)
    }

    /// Iterate over tuples with their fields.
    #[inline]
    pub fn rows(&self) -> RowIter<'_> {
        RowIter {
            index: self,
            row_idx: 0,
            pos: 0,
            field_cursor: 0,
        }
    }

    /// Append another index covering the bytes right after this one.
    pub fn append(&mut self, other: FieldIndex) {
        self.row_ends.extend(other.row_ends);
        self.fields.extend(other.fields);
        self.input_len = self.input_len.max(other.input_len);
        self.trailing_row = other.trailing_row;
    }
}

/// One tuple from [`FieldIndex::rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    /// Offset of the first tuple byte.
    pub start: usize,
    /// Offset of the tuple delimiter, or input end for a trailing tuple.
    pub content_end: usize,
    pub fields: &'a [FieldLocation],
}

/// Cursor-based row iterator.
pub struct RowIter<'a> {
    index: &'a FieldIndex,
    row_idx: usize,
    pos: usize,
    field_cursor: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Row<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let fields = &self.index.fields;
        let (start, content_end, field_end) = if self.row_idx < self.index.row_ends.len() {
            let end = self.index.row_ends[self.row_idx];
            let mut cursor = self.field_cursor;
            while cursor < fields.len() && fields[cursor].start <= end {
                cursor += 1;
            }
            (self.pos, end, cursor)
        } else if self.index.trailing_row && self.row_idx == self.index.row_ends.len() {
            (self.pos, self.index.input_len, fields.len())
        } else {
            return None;
        };

        let row = Row {
            start,
            content_end,
            fields: &fields[self.field_cursor..field_end],
        };
        self.field_cursor = field_end;
        self.pos = content_end + 1;
        self.row_idx += 1;
        Some(row)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.row_count().saturating_sub(self.row_idx);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(start: usize, len: usize) -> FieldLocation {
        FieldLocation::new(start, len, false)
    }

    fn make_index(row_ends: Vec<usize>, fields: Vec<FieldLocation>, len: usize, trailing: bool) -> FieldIndex {
        FieldIndex {
            row_ends,
            fields,
            input_len: len,
            trailing_row: trailing,
        }
    }

    #[test]
    fn test_rows_group_fields() {
        // "a,b,c\nd,e\nf\n"
        let idx = make_index(
            vec![5, 9, 11],
            vec![f(0, 1), f(2, 1), f(4, 1), f(6, 1), f(8, 1), f(10, 1)],
            12,
            false,
        );
        let rows: Vec<Row<'_>> = idx.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].fields.len(), 3);
        assert_eq!((rows[1].start, rows[1].content_end), (6, 9));
        assert_eq!(rows[1].fields, &[f(6, 1), f(8, 1)]);
        assert_eq!(rows[2].fields, &[f(10, 1)]);
    }

    #[test]
    fn test_empty_last_field_stays_in_its_row() {
        // "a,\nb\n": empty field at 2 starts on the row delimiter itself
        let idx = make_index(vec![2, 4], vec![f(0, 1), f(2, 0), f(3, 1)], 5, false);
        let rows: Vec<Vec<FieldLocation>> = idx.rows().map(|r| r.fields.to_vec()).collect();
        assert_eq!(rows, vec![vec![f(0, 1), f(2, 0)], vec![f(3, 1)]]);
    }

    #[test]
    fn test_trailing_row() {
        // "a,b\nc"
        let idx = make_index(vec![3], vec![f(0, 1), f(2, 1), f(4, 1)], 5, true);
        assert_eq!(idx.row_count(), 2);
        let rows: Vec<Row<'_>> = idx.rows().collect();
        assert_eq!(rows[1].start, 4);
        assert_eq!(rows[1].content_end, 5);
        assert_eq!(rows[1].fields, &[f(4, 1)]);
    }

    #[test]
    fn test_projected_rows_can_be_empty() {
        // Nothing projected: rows still come out, with no fields.
        let idx = make_index(vec![3, 7], vec![], 8, false);
        let rows: Vec<usize> = idx.rows().map(|r| r.fields.len()).collect();
        assert_eq!(rows, vec![0, 0]);
    }

    #[test]
    fn test_append_concatenates() {
        let mut a = make_index(vec![3], vec![f(0, 3)], 4, false);
        let b = make_index(vec![7], vec![f(4, 3)], 9, true);
        a.append(b);
        assert_eq!(a.row_ends, vec![3, 7]);
        assert_eq!(a.fields.len(), 2);
        assert_eq!(a.input_len, 9);
        assert!(a.trailing_row);
    }
}
