// RustyText - Vectorized scanning of delimited text (Hive-style tables)
//
// Strategies:
// A: Direct single-threaded scan (scan_locations, parse_string)
// B: Parallel scan via rayon (parse_string_parallel)
// C: Streaming chunked scanner (streaming_*)

#![feature(portable_simd)]

use rustler::{Atom, Binary, Encoder, Env, Error, NifResult, ResourceArc, Term};

pub mod core;
mod resource;
pub mod strategy;
mod term;

use crate::core::{ParserConfig, Projection, SelectedColumns};
use resource::{StreamingScannerRef, StreamingScannerResource};
use strategy::{parse_rows, parse_rows_parallel, recommended_splits, scan_to_index};
use term::{cow_rows_to_term, index_to_term, owned_rows_to_term};

mod atoms {
    rustler::atoms! {
        ok,
        error,
        all,
        buffer_overflow,
    }
}

// ============================================================================
// Argument Decoding
// ============================================================================

/// Decode a delimiter or escape byte.
/// Accepts: integer 44 or binary <<44>>
fn decode_byte(term: Term<'_>) -> NifResult<u8> {
    if let Ok(byte) = term.decode::<u8>() {
        return Ok(byte);
    }
    match term.decode::<Binary<'_>>() {
        Ok(binary) if binary.len() == 1 => Ok(binary.as_slice()[0]),
        _ => Err(Error::BadArg),
    }
}

/// Decode `{field_delim, tuple_delim, collection_item_delim, escape, partition_keys}`.
/// `escape` is `nil` to disable escape processing. Colliding delimiters or a
/// partition-key count above `MAX_PARTITION_KEYS` are `BadArg`.
fn decode_config(term: Term<'_>) -> NifResult<ParserConfig> {
    let (field, tuple, collection, escape, partition_keys) =
        term.decode::<(Term, Term, Term, Option<Term>, usize)>()?;
    let escape = escape.map(decode_byte).transpose()?;
    let config = ParserConfig::new(decode_byte(field)?, decode_byte(tuple)?)
        .with_collection_item_delim(decode_byte(collection)?)
        .with_escape(escape)
        .with_partition_keys(partition_keys);
    config.validate().map_err(|_| Error::BadArg)?;
    Ok(config)
}

/// Decode `:all` or a list of table column indices.
fn decode_projection(term: Term<'_>) -> NifResult<Projection> {
    if let Ok(atom) = term.decode::<Atom>() {
        return if atom == atoms::all() {
            Ok(Projection::All)
        } else {
            Err(Error::BadArg)
        };
    }
    let indices = term.decode::<Vec<usize>>()?;
    Ok(Projection::Columns(SelectedColumns::new(indices)))
}

// ============================================================================
// Allocator Configuration
// ============================================================================

// When memory_tracking is enabled, wrap the allocator to track usage
#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            // SAFETY: forwarded unchanged; the caller upholds GlobalAlloc's contract.
            let ptr = unsafe { UNDERLYING.alloc(layout) };
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            // SAFETY: `ptr` came from UNDERLYING.alloc with this layout.
            unsafe { UNDERLYING.dealloc(ptr, layout) }
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

// When memory_tracking is disabled, use mimalloc directly (no overhead)
#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs (only meaningful with the memory_tracking feature)
// ============================================================================

#[cfg(feature = "memory_tracking")]
use std::sync::atomic::Ordering;

/// Current Rust heap allocation in bytes
#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory() -> usize {
    tracking::ALLOCATED.load(Ordering::SeqCst)
}

/// Peak Rust heap allocation since last reset
#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
}

/// Reset the peak to the current allocation; returns `{current, old_peak}`
#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    (0, 0)
}

// ============================================================================
// Strategy A: Direct Scan
// ============================================================================

/// Scan into `{row_ends, [{start, len}]}` without copying any field
#[rustler::nif]
fn scan_locations<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    config: Term<'a>,
    projection: Term<'a>,
) -> NifResult<Term<'a>> {
    let config = decode_config(config)?;
    let projection = decode_projection(projection)?;
    let index = scan_to_index(input.as_slice(), config, projection).map_err(|_| Error::BadArg)?;
    Ok(index_to_term(env, &index))
}

/// Parse into a list of rows, each a list of unescaped binaries
#[rustler::nif]
fn parse_string<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    config: Term<'a>,
    projection: Term<'a>,
) -> NifResult<Term<'a>> {
    let config = decode_config(config)?;
    let projection = decode_projection(projection)?;
    let rows = parse_rows(input.as_slice(), config, projection).map_err(|_| Error::BadArg)?;
    Ok(cow_rows_to_term(env, rows))
}

// ============================================================================
// Strategy B: Parallel Scan
// ============================================================================

/// Parse in parallel using the rayon thread pool
/// Uses DirtyCpu scheduler since this can take significant time
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_string_parallel<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    config: Term<'a>,
    projection: Term<'a>,
) -> NifResult<Term<'a>> {
    let config = decode_config(config)?;
    let projection = decode_projection(projection)?;
    let rows = parse_rows_parallel(input.as_slice(), config, projection, recommended_splits())
        .map_err(|_| Error::BadArg)?;
    Ok(owned_rows_to_term(env, rows))
}

// ============================================================================
// Strategy C: Streaming Scanner
// ============================================================================

/// Create a streaming scanner
#[rustler::nif]
fn streaming_new<'a>(config: Term<'a>, projection: Term<'a>) -> NifResult<StreamingScannerRef> {
    let config = decode_config(config)?;
    let projection = decode_projection(projection)?;
    let resource = StreamingScannerResource::new(config, projection).map_err(|_| Error::BadArg)?;
    Ok(ResourceArc::new(resource))
}

/// Feed a chunk; returns `{:ok, {available_rows, buffer_size}}` or
/// `{:error, :buffer_overflow}`
#[rustler::nif]
fn streaming_feed<'a>(
    env: Env<'a>,
    scanner: StreamingScannerRef,
    chunk: Binary<'a>,
) -> NifResult<Term<'a>> {
    let mut inner = scanner.lock()?;
    match inner.feed(chunk.as_slice()) {
        Ok(()) => Ok((atoms::ok(), (inner.available_rows(), inner.buffer_size())).encode(env)),
        Err(_) => Ok((atoms::error(), atoms::buffer_overflow()).encode(env)),
    }
}

/// Take up to `max` complete rows
#[rustler::nif]
fn streaming_next_rows<'a>(
    env: Env<'a>,
    scanner: StreamingScannerRef,
    max: usize,
) -> NifResult<Term<'a>> {
    let rows = scanner.lock()?.take_rows(max);
    Ok(owned_rows_to_term(env, rows))
}

/// Close the trailing tuple and take every remaining row
#[rustler::nif]
fn streaming_finalize<'a>(env: Env<'a>, scanner: StreamingScannerRef) -> NifResult<Term<'a>> {
    let rows = scanner.lock()?.finalize();
    Ok(owned_rows_to_term(env, rows))
}

/// Scanner status `{available_rows, buffer_size, has_partial}`
#[rustler::nif]
fn streaming_status(scanner: StreamingScannerRef) -> NifResult<(usize, usize, bool)> {
    let inner = scanner.lock()?;
    Ok((
        inner.available_rows(),
        inner.buffer_size(),
        inner.has_partial(),
    ))
}

/// Set the streaming buffer limit in bytes
#[rustler::nif]
fn streaming_set_max_buffer(scanner: StreamingScannerRef, max: usize) -> NifResult<Atom> {
    scanner.lock()?.set_max_buffer_size(max);
    Ok(atoms::ok())
}

// ============================================================================
// NIF Initialization
// ============================================================================

#[allow(non_local_definitions)]
fn load(env: Env, _info: Term) -> bool {
    let _ = rustler::resource!(StreamingScannerResource, env);
    true
}

rustler::init!("Elixir.RustyText.Native", load = load);
