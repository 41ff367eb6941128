// Delimited text parser: field and tuple boundary scan
//
// Walks the input in 16-byte windows. Each window yields a delimiter mask
// (field, tuple and collection-item delimiters in one 3-needle search) and,
// when an escape character is configured, an escape mask used to clear
// escaped delimiters. Set bits are consumed low to high; every one closes a
// column, and tuple delimiters also close the tuple.
//
// All scan state lives in the parser and carries across calls: the column
// index within the current tuple, whether the open column has seen an escape,
// and whether the last scanned byte is an active escape. Scanning a stream in
// one call or in many (split at any byte) produces identical output, and the
// window loop and the scalar loop are interchangeable at any boundary.
//
// Output goes into caller-owned slices; the parser never allocates.

use super::config::{ConfigError, ParserConfig};
use super::escape::process_escape_mask;
use super::field::FieldLocation;
use super::masks::{BITS_AT_OR_ABOVE, BITS_BELOW};
use super::projection::{AllColumns, ColumnProjection};
use super::search::{NeedleSearch, WindowSearch, WINDOW};

// ---------------------------------------------------------------------------
// Cursor and output slots
// ---------------------------------------------------------------------------

/// Scan position over the caller's buffer: `pos..end` is still unscanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanCursor {
    pub pos: usize,
    pub end: usize,
}

impl ScanCursor {
    #[inline]
    pub fn new(pos: usize, end: usize) -> Self {
        ScanCursor { pos, end }
    }

    /// Cursor over a whole buffer.
    #[inline]
    pub fn over(input: &[u8]) -> Self {
        ScanCursor {
            pos: 0,
            end: input.len(),
        }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }
}

/// Caller-owned output for scan calls: tuple-end offsets and field locations,
/// plus how many of each have been written.
///
/// The counters persist across calls until [`ScanOutput::clear`].
pub struct ScanOutput<'o> {
    row_ends: &'o mut [usize],
    fields: &'o mut [FieldLocation],
    num_tuples: usize,
    num_fields: usize,
}

impl<'o> ScanOutput<'o> {
    pub fn new(row_ends: &'o mut [usize], fields: &'o mut [FieldLocation]) -> Self {
        ScanOutput {
            row_ends,
            fields,
            num_tuples: 0,
            num_fields: 0,
        }
    }

    #[inline]
    pub fn num_tuples(&self) -> usize {
        self.num_tuples
    }

    #[inline]
    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    /// Offsets of the tuple delimiters written so far.
    #[inline]
    pub fn row_ends(&self) -> &[usize] {
        &self.row_ends[..self.num_tuples]
    }

    /// Field locations written so far.
    #[inline]
    pub fn fields(&self) -> &[FieldLocation] {
        &self.fields[..self.num_fields]
    }

    /// Tuple-end slots available in total.
    /// Reset both counters so the slots can be reused.
    #[inline]
    pub fn clear(&mut self) {
        self.num_tuples = 0;
        self.num_fields = 0;
    }

    #[inline]
    fn push_field(&mut self, field: FieldLocation) {
        assert!(
            self.num_fields < self.fields.len(),
            "field output full ({} slots)",
            self.fields.len()
        );
        self.fields[self.num_fields] = field;
        self.num_fields += 1;
    }

    #[inline]
    fn push_row_end(&mut self, pos: usize) {
        assert!(
            self.num_tuples < self.row_ends.len(),
            "tuple output full ({} slots)",
            self.row_ends.len()
        );
        self.row_ends[self.num_tuples] = pos;
        self.num_tuples += 1;
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Scan state for one stream. Not shared between threads; run one parser per
/// split instead.
#[derive(Debug, Clone)]
pub struct DelimitedTextParser<P = AllColumns> {
    config: ParserConfig,
    projection: P,
    delim_search: NeedleSearch,
    /// Present iff an escape character is configured.
    escape_search: Option<NeedleSearch>,
    /// Table ordinal of the column being scanned.
    column_idx: usize,
    current_column_has_escape: bool,
    last_char_is_escape: bool,
}

impl DelimitedTextParser<AllColumns> {
    /// Parser materializing every column.
    pub fn new(config: ParserConfig) -> Result<Self, ConfigError> {
        Self::with_projection(config, AllColumns)
    }
}

impl<P: ColumnProjection> DelimitedTextParser<P> {
    pub fn with_projection(config: ParserConfig, projection: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(DelimitedTextParser {
            config,
            projection,
            delim_search: NeedleSearch::new(&config.delimiters()),
            escape_search: config.escape_char.map(|esc| NeedleSearch::new(&[esc])),
            column_idx: config.num_partition_keys,
            current_column_has_escape: false,
            last_char_is_escape: false,
        })
    }

    #[inline]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    #[inline]
    pub fn projection(&self) -> &P {
        &self.projection
    }

    #[inline]
    pub fn column_idx(&self) -> usize {
        self.column_idx
    }

    #[inline]
    pub fn current_column_has_escape(&self) -> bool {
        self.current_column_has_escape
    }

    #[inline]
    pub fn last_char_is_escape(&self) -> bool {
        self.last_char_is_escape
    }

    /// Forget all carried state, as at the start of a new stream.
    pub fn reset(&mut self) {
        self.column_idx = self.config.num_partition_keys;
        self.current_column_has_escape = false;
        self.last_char_is_escape = false;
    }

    /// Record the column ending `len` bytes after `next_column_start` (if
    /// projected) and step past its delimiter.
    #[inline]
    fn add_column<const ESCAPES: bool>(
        &mut self,
        len: usize,
        next_column_start: &mut usize,
        out: &mut ScanOutput<'_>,
    ) {
        if self.projection.should_materialize(self.column_idx) {
            let escaped = ESCAPES && self.current_column_has_escape;
            out.push_field(FieldLocation::new(*next_column_start, len, escaped));
        }
        if ESCAPES {
            self.current_column_has_escape = false;
        }
        *next_column_start += len + 1;
        self.column_idx += 1;
    }

    /// Close the tuple whose delimiter sits at `pos`. Returns true when the
    /// tuple bound is reached.
    #[inline]
    fn end_tuple(&mut self, pos: usize, max_tuples: usize, out: &mut ScanOutput<'_>) -> bool {
        self.column_idx = self.config.num_partition_keys;
        out.push_row_end(pos);
        out.num_tuples == max_tuples
    }

    // -----------------------------------------------------------------------
    // Window loop
    // -----------------------------------------------------------------------

    /// Scan whole 16-byte windows from `cursor.pos`.
    ///
    /// Returns once fewer than 16 bytes remain before `cursor.end` (the tail
    /// is left for [`parse_scalar`](Self::parse_scalar)) or once
    /// `out.num_tuples()` reaches `max_tuples`. In the latter case the cursor
    /// sits just past the last tuple delimiter.
    pub fn parse_windows(
        &mut self,
        input: &[u8],
        cursor: &mut ScanCursor,
        max_tuples: usize,
        out: &mut ScanOutput<'_>,
        next_column_start: &mut usize,
    ) {
        assert!(cursor.end <= input.len(), "cursor runs past the input");
        if out.num_tuples >= max_tuples {
            return;
        }
        if self.escape_search.is_some() {
            self.parse_windows_impl::<true>(input, cursor, max_tuples, out, next_column_start);
        } else {
            self.parse_windows_impl::<false>(input, cursor, max_tuples, out, next_column_start);
        }
    }

    fn parse_windows_impl<const ESCAPES: bool>(
        &mut self,
        input: &[u8],
        cursor: &mut ScanCursor,
        max_tuples: usize,
        out: &mut ScanOutput<'_>,
        next_column_start: &mut usize,
    ) {
        let delim_search = self.delim_search;
        let escape_search = self.escape_search;
        let tuple_delim = self.config.tuple_delim;
        debug_assert!(!ESCAPES || escape_search.is_some());

        while cursor.remaining() >= WINDOW {
            let window = &input[cursor.pos..cursor.pos + WINDOW];

            let mut delim_mask = delim_search.find(window);
            let mut escape_mask = 0u16;
            if ESCAPES {
                if let Some(search) = &escape_search {
                    escape_mask = search.find(window);
                    process_escape_mask(escape_mask, &mut self.last_char_is_escape, &mut delim_mask);
                }
            }

            // Start of the not-yet-attributed part of the window.
            let mut last_col_idx = 0usize;
            while delim_mask != 0 {
                let n = delim_mask.trailing_zeros() as usize;
                delim_mask &= delim_mask - 1;

                if ESCAPES {
                    // Any escape in [last_col_idx, n) belongs to this column.
                    if escape_mask & BITS_AT_OR_ABOVE[last_col_idx] & BITS_BELOW[n] != 0 {
                        self.current_column_has_escape = true;
                    }
                    last_col_idx = n;
                }

                let delim_pos = cursor.pos + n;
                self.add_column::<ESCAPES>(delim_pos - *next_column_start, next_column_start, out);

                if window[n] == tuple_delim && self.end_tuple(delim_pos, max_tuples, out) {
                    cursor.pos = delim_pos + 1;
                    if ESCAPES {
                        self.last_char_is_escape = false;
                    }
                    return;
                }
            }

            // Escapes after the last delimiter belong to the still-open column.
            if ESCAPES && escape_mask & BITS_AT_OR_ABOVE[last_col_idx] != 0 {
                self.current_column_has_escape = true;
            }

            cursor.pos += WINDOW;
        }
    }

    // -----------------------------------------------------------------------
    // Scalar loop
    // -----------------------------------------------------------------------

    /// Scan byte at a time up to `cursor.end`, or until `out.num_tuples()`
    /// reaches `max_tuples`. Same semantics as the window loop; used for
    /// tails shorter than a window.
    pub fn parse_scalar(
        &mut self,
        input: &[u8],
        cursor: &mut ScanCursor,
        max_tuples: usize,
        out: &mut ScanOutput<'_>,
        next_column_start: &mut usize,
    ) {
        assert!(cursor.end <= input.len(), "cursor runs past the input");
        if out.num_tuples >= max_tuples {
            return;
        }
        if self.escape_search.is_some() {
            self.parse_scalar_impl::<true>(input, cursor, max_tuples, out, next_column_start);
        } else {
            self.parse_scalar_impl::<false>(input, cursor, max_tuples, out, next_column_start);
        }
    }

    fn parse_scalar_impl<const ESCAPES: bool>(
        &mut self,
        input: &[u8],
        cursor: &mut ScanCursor,
        max_tuples: usize,
        out: &mut ScanOutput<'_>,
        next_column_start: &mut usize,
    ) {
        let ParserConfig {
            field_delim,
            tuple_delim,
            collection_item_delim,
            escape_char,
            ..
        } = self.config;

        while cursor.pos < cursor.end {
            let pos = cursor.pos;
            let byte = input[pos];
            cursor.pos += 1;

            if ESCAPES {
                let escaped = self.last_char_is_escape;
                if Some(byte) == escape_char {
                    self.current_column_has_escape = true;
                    self.last_char_is_escape = !escaped;
                    continue;
                }
                self.last_char_is_escape = false;
                if escaped {
                    continue;
                }
            }

            if byte == tuple_delim {
                self.add_column::<ESCAPES>(pos - *next_column_start, next_column_start, out);
                if self.end_tuple(pos, max_tuples, out) {
                    return;
                }
            } else if byte == field_delim || byte == collection_item_delim {
                self.add_column::<ESCAPES>(pos - *next_column_start, next_column_start, out);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Coordinator entry points
    // -----------------------------------------------------------------------

    /// Window loop, then the scalar loop over the remaining tail unless the
    /// tuple bound was hit. Consumes `cursor` up to `end` or the bound.
    pub fn parse_field_locations(
        &mut self,
        input: &[u8],
        cursor: &mut ScanCursor,
        max_tuples: usize,
        out: &mut ScanOutput<'_>,
        next_column_start: &mut usize,
    ) {
        self.parse_windows(input, cursor, max_tuples, out, next_column_start);
        if out.num_tuples < max_tuples {
            self.parse_scalar(input, cursor, max_tuples, out, next_column_start);
        }
    }

    /// Close an unterminated last tuple at end of stream `end`.
    ///
    /// Emits the open column (if projected) and resets tuple state. Returns
    /// false when the stream ended exactly on a tuple delimiter, i.e. there
    /// is no trailing tuple.
    pub fn fill_final_column(
        &mut self,
        end: usize,
        next_column_start: &mut usize,
        out: &mut ScanOutput<'_>,
    ) -> bool {
        let open = end > *next_column_start || self.column_idx != self.config.num_partition_keys;
        if !open {
            return false;
        }
        let len = end - *next_column_start;
        if self.escape_search.is_some() {
            self.add_column::<true>(len, next_column_start, out);
        } else {
            self.add_column::<false>(len, next_column_start, out);
        }
        // add_column stepped past a delimiter that isn't there.
        *next_column_start = end;
        self.reset();
        true
    }

    /// See [`find_first_tuple_start`].
    #[inline]
    pub fn find_first_tuple_start(&self, input: &[u8], from: usize) -> Option<usize> {
        find_first_tuple_start(input, &self.config, from)
    }
}

/// Offset just past the first unescaped tuple delimiter at or after `from`.
///
/// Escape parity is counted backwards from each candidate, looking before
/// `from` if needed, so a split boundary inside an escape run is handled.
pub fn find_first_tuple_start(input: &[u8], config: &ParserConfig, from: usize) -> Option<usize> {
    let tuple_delim = config.tuple_delim;
    let mut pos = from;
    while pos < input.len() {
        let idx = pos + input[pos..].iter().position(|&b| b == tuple_delim)?;
        let escaped = match config.escape_char {
            Some(esc) => input[..idx].iter().rev().take_while(|&&b| b == esc).count() % 2 == 1,
            None => false,
        };
        if !escaped {
            return Some(idx + 1);
        }
        pos = idx + 1;
    }
    None
}
