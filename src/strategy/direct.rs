// Direct strategy: single-threaded scan of a whole buffer
//
// Scans in byte-bounded batches so the output slots stay small and are
// reused: a batch of B bytes closes at most B fields, and a batch stops early
// after BATCH_TUPLES tuples. Each batch resumes exactly where the previous one
// stopped, so batching never changes the result.

use crate::core::{
    ColumnProjection, ConfigError, DelimitedTextParser, FieldIndex, FieldLocation, ParserConfig,
    ScanCursor, ScanOutput,
};
use std::borrow::Cow;

/// Bytes scanned per batch.
pub const BATCH_BYTES: usize = 64 * 1024;

/// Tuples per batch (the `max_tuples` bound of each scan call).
pub const BATCH_TUPLES: usize = 1024;

/// Scan `input` and index every tuple and projected field.
pub fn scan_to_index<P: ColumnProjection>(
    input: &[u8],
    config: ParserConfig,
    projection: P,
) -> Result<FieldIndex, ConfigError> {
    let mut parser = DelimitedTextParser::with_projection(config, projection)?;
    Ok(scan_range(&mut parser, input, 0, input.len(), true))
}

/// Scan `input[start..end]` with an existing parser.
///
/// With `finish`, an unterminated last tuple is closed at `end`.
pub(crate) fn scan_range<P: ColumnProjection>(
    parser: &mut DelimitedTextParser<P>,
    input: &[u8],
    start: usize,
    end: usize,
    finish: bool,
) -> FieldIndex {
    let mut index = FieldIndex::with_capacity(end - start);
    index.input_len = end;

    let mut row_ends = vec![0usize; BATCH_TUPLES];
    // +1 for the final column closed by fill_final_column
    let mut fields = vec![FieldLocation::default(); BATCH_BYTES.min(end - start) + 1];
    let mut cursor = ScanCursor::new(start, start);
    let mut next_column_start = start;

    while cursor.pos < end {
        cursor.end = (cursor.pos + BATCH_BYTES).min(end);
        let mut out = ScanOutput::new(&mut row_ends, &mut fields);
        parser.parse_field_locations(input, &mut cursor, BATCH_TUPLES, &mut out, &mut next_column_start);
        index.row_ends.extend_from_slice(out.row_ends());
        index.fields.extend_from_slice(out.fields());
    }

    if finish {
        let mut out = ScanOutput::new(&mut row_ends, &mut fields);
        index.trailing_row = parser.fill_final_column(end, &mut next_column_start, &mut out);
        index.fields.extend_from_slice(out.fields());
    }

    index
}

/// Materialize indexed rows, unescaping flagged fields.
pub fn rows_from_index<'a>(
    input: &'a [u8],
    index: &FieldIndex,
    escape: Option<u8>,
) -> Vec<Vec<Cow<'a, [u8]>>> {
    index
        .rows()
        .map(|row| {
            row.fields
                .iter()
                .map(|field| field.materialize(input, escape))
                .collect()
        })
        .collect()
}

/// Scan and materialize in one step.
pub fn parse_rows<'a, P: ColumnProjection>(
    input: &'a [u8],
    config: ParserConfig,
    projection: P,
) -> Result<Vec<Vec<Cow<'a, [u8]>>>, ConfigError> {
    let index = scan_to_index(input, config, projection)?;
    Ok(rows_from_index(input, &index, config.escape_char))
}
