// Parallel strategy: one parser per split using Rayon
//
// Strategy:
// 1. Single-threaded: cut the input into byte splits and move each cut just
//    past the next unescaped tuple delimiter, so every split starts a tuple.
// 2. Parallel: scan each split with its own parser (parsers are never shared).
// 3. Concatenate the per-split indexes in order.
//
// A parser entering a split that starts a tuple has exactly the state a
// single pass would have there, so the result equals the direct strategy.
//
// Important: We can't build BEAM terms on worker threads, so rows are
// returned owned and converted to terms on the scheduler thread.

use super::direct::scan_range;
use crate::core::{
    find_first_tuple_start, ColumnProjection, ConfigError, DelimitedTextParser, FieldIndex,
    ParserConfig,
};
use rayon::prelude::*;

/// Split start offsets followed by `input.len()`; strictly increasing after
/// the leading 0.
pub fn split_boundaries(input: &[u8], config: &ParserConfig, num_splits: usize) -> Vec<usize> {
    let len = input.len();
    let splits = num_splits.max(1);
    let mut bounds = Vec::with_capacity(splits + 1);
    bounds.push(0);

    for i in 1..splits {
        let nominal = len * i / splits;
        if nominal == 0 {
            continue;
        }
        // A tuple starting exactly at `nominal` belongs to this split, so
        // look for the delimiter from the byte before it.
        let aligned = find_first_tuple_start(input, config, nominal - 1).unwrap_or(len);
        let prev = bounds[bounds.len() - 1];
        if aligned > prev && aligned < len {
            bounds.push(aligned);
        }
    }

    bounds.push(len);
    bounds
}

/// Scan `input` on `num_splits` parsers in parallel.
pub fn scan_to_index_parallel<P>(
    input: &[u8],
    config: ParserConfig,
    projection: P,
    num_splits: usize,
) -> Result<FieldIndex, ConfigError>
where
    P: ColumnProjection + Clone + Send,
{
    config.validate()?;
    let bounds = split_boundaries(input, &config, num_splits);
    let parsers = bounds[1..]
        .iter()
        .map(|_| DelimitedTextParser::with_projection(config, projection.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    let last = parsers.len() - 1;

    let parts: Vec<FieldIndex> = parsers
        .into_par_iter()
        .zip(bounds.par_windows(2))
        .enumerate()
        .map(|(i, (mut parser, range))| scan_range(&mut parser, input, range[0], range[1], i == last))
        .collect();

    let mut index = FieldIndex::with_capacity(input.len());
    for part in parts {
        index.append(part);
    }
    index.input_len = input.len();
    Ok(index)
}

/// Parse in parallel, returning owned, unescaped rows.
pub fn parse_rows_parallel<P>(
    input: &[u8],
    config: ParserConfig,
    projection: P,
    num_splits: usize,
) -> Result<Vec<Vec<Vec<u8>>>, ConfigError>
where
    P: ColumnProjection + Clone + Send,
{
    let index = scan_to_index_parallel(input, config, projection, num_splits)?;
    let escape = config.escape_char;
    let rows: Vec<_> = index.rows().collect();
    Ok(rows
        .into_par_iter()
        .map(|row| {
            row.fields
                .iter()
                .map(|field| field.materialize(input, escape).into_owned())
                .collect()
        })
        .collect())
}

/// Split count for the parallel strategy
pub fn recommended_splits() -> usize {
    // Use available parallelism, capped at 8 for NIF work
    std::thread::available_parallelism()
        .map(|p| p.get().min(8))
        .unwrap_or(4)
}
