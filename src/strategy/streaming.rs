// Streaming strategy: chunk-fed scanner
//
// Stateful chunked scanner for processing large files with bounded memory.
// Feed chunks of data and take complete rows as they become available.
//
// Key design:
// - Owns data (Vec<u8>) because input chunks are temporary
// - Every fed byte is scanned once; the parser's carried state (column index,
//   column escape flag, escape carry) bridges chunk boundaries, so rows are
//   identical to a single-pass scan however the input is chunked
// - Fields of the incomplete tuple wait in `pending` until its delimiter arrives

use crate::core::{
    ColumnProjection, ConfigError, DelimitedTextParser, FieldLocation, ParserConfig, Projection,
    ScanCursor, ScanOutput,
};
use thiserror::Error;

/// Default maximum buffer size for streaming scanners (256 MB).
pub const DEFAULT_MAX_BUFFER: usize = 256 * 1024 * 1024;

/// Bytes scanned per internal batch.
const SCAN_BATCH_BYTES: usize = 16 * 1024;

/// Tuples per internal batch.
const SCAN_BATCH_TUPLES: usize = 512;

/// Error returned when a `feed()` would exceed the buffer limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("streaming buffer would exceed {limit} bytes")]
pub struct BufferOverflow {
    pub limit: usize,
}

type OwnedRow = Vec<Vec<u8>>;

/// Chunk-fed scanner state
pub struct StreamingScanner<P = Projection> {
    parser: DelimitedTextParser<P>,
    /// Bytes of the incomplete tuple (and anything not yet compacted)
    buffer: Vec<u8>,
    /// Complete rows ready to be taken
    complete_rows: Vec<OwnedRow>,
    /// Fields already closed in the incomplete tuple
    pending: Vec<FieldLocation>,
    /// Position where the incomplete tuple starts
    partial_row_start: usize,
    /// Next byte to scan
    scan_pos: usize,
    next_column_start: usize,
    /// Reused output slots
    row_ends: Vec<usize>,
    fields: Vec<FieldLocation>,
    max_buffer_size: usize,
}

impl<P: ColumnProjection> StreamingScanner<P> {
    pub fn new(config: ParserConfig, projection: P) -> Result<Self, ConfigError> {
        Ok(StreamingScanner {
            parser: DelimitedTextParser::with_projection(config, projection)?,
            buffer: Vec::new(),
            complete_rows: Vec::new(),
            pending: Vec::new(),
            partial_row_start: 0,
            scan_pos: 0,
            next_column_start: 0,
            row_ends: vec![0; SCAN_BATCH_TUPLES],
            fields: vec![FieldLocation::default(); SCAN_BATCH_BYTES + 1],
            max_buffer_size: DEFAULT_MAX_BUFFER,
        })
    }

    /// Feed a chunk of data to the scanner.
    /// Returns `Err(BufferOverflow)` if the buffer would exceed `max_buffer_size`.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), BufferOverflow> {
        if self.buffer.len() + chunk.len() > self.max_buffer_size {
            return Err(BufferOverflow {
                limit: self.max_buffer_size,
            });
        }
        self.buffer.extend_from_slice(chunk);
        self.process_buffer();
        Ok(())
    }

    /// Set the maximum buffer size in bytes.
    pub fn set_max_buffer_size(&mut self, max: usize) {
        self.max_buffer_size = max;
    }

    /// Scan everything fed so far.
    fn process_buffer(&mut self) {
        let escape = self.parser.config().escape_char;
        let end = self.buffer.len();

        while self.scan_pos < end {
            let mut cursor = ScanCursor::new(self.scan_pos, (self.scan_pos + SCAN_BATCH_BYTES).min(end));
            let mut out = ScanOutput::new(&mut self.row_ends, &mut self.fields);
            self.parser.parse_field_locations(
                &self.buffer,
                &mut cursor,
                SCAN_BATCH_TUPLES,
                &mut out,
                &mut self.next_column_start,
            );

            let fields = out.fields();
            let mut taken = 0;
            for &row_end in out.row_ends() {
                let in_row = fields[taken..]
                    .iter()
                    .take_while(|f| f.start <= row_end)
                    .count();
                self.pending.extend_from_slice(&fields[taken..taken + in_row]);
                taken += in_row;
                self.complete_rows
                    .push(materialize_row(&self.buffer, &self.pending, escape));
                self.pending.clear();
                self.partial_row_start = row_end + 1;
            }
            self.pending.extend_from_slice(&fields[taken..]);
            self.scan_pos = cursor.pos;
        }

        // Compact buffer: drop completed tuples to prevent unbounded growth
        if self.partial_row_start > 0 && self.partial_row_start >= self.buffer.len() / 2 {
            self.compact_buffer();
        }
    }

    /// Shift the incomplete tuple to the front of the buffer.
    fn compact_buffer(&mut self) {
        let shift = self.partial_row_start;
        self.buffer.drain(..shift);
        for field in &mut self.pending {
            field.start -= shift;
        }
        self.scan_pos -= shift;
        self.next_column_start -= shift;
        self.partial_row_start = 0;
    }

    /// Take up to `max` complete rows.
    pub fn take_rows(&mut self, max: usize) -> Vec<OwnedRow> {
        let n = max.min(self.complete_rows.len());
        self.complete_rows.drain(..n).collect()
    }

    /// Number of complete rows waiting to be taken.
    pub fn available_rows(&self) -> usize {
        self.complete_rows.len()
    }

    /// Whether an incomplete tuple is buffered.
    pub fn has_partial(&self) -> bool {
        self.buffer.len() > self.partial_row_start
    }

    /// Current buffer size in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// End of input: close the incomplete tuple and return every remaining row.
    pub fn finalize(&mut self) -> Vec<OwnedRow> {
        let end = self.buffer.len();
        let mut out = ScanOutput::new(&mut self.row_ends, &mut self.fields);
        if self
            .parser
            .fill_final_column(end, &mut self.next_column_start, &mut out)
        {
            self.pending.extend_from_slice(out.fields());
            let escape = self.parser.config().escape_char;
            self.complete_rows
                .push(materialize_row(&self.buffer, &self.pending, escape));
        }
        self.pending.clear();
        self.partial_row_start = end;
        std::mem::take(&mut self.complete_rows)
    }

    /// Discard all buffered data and scan state.
    pub fn reset(&mut self) {
        self.parser.reset();
        self.buffer.clear();
        self.complete_rows.clear();
        self.pending.clear();
        self.partial_row_start = 0;
        self.scan_pos = 0;
        self.next_column_start = 0;
    }

    pub fn config(&self) -> &ParserConfig {
        self.parser.config()
    }
}

fn materialize_row(buffer: &[u8], fields: &[FieldLocation], escape: Option<u8>) -> OwnedRow {
    fields
        .iter()
        .map(|field| field.materialize(buffer, escape).into_owned())
        .collect()
}
