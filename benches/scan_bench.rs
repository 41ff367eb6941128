// Standalone Rust benchmark for scanning strategies
//
// Run: cargo bench --bench scan_bench
//
// Compares scalar-only vs windowed vs parallel scanning across:
//   - Clean data (no escapes)
//   - Escaped data (escaped delimiters in some fields)
//   - Projected scans (one column of ten materialized)

use std::time::{Duration, Instant};

use rustytext::core::{
    AllColumns, DelimitedTextParser, FieldLocation, ParserConfig, ScanCursor, ScanOutput,
    SelectedColumns,
};
use rustytext::strategy::direct::scan_to_index;
use rustytext::strategy::parallel::{recommended_splits, scan_to_index_parallel};

/// Generate `num_rows` tuples of `fields_per_row` fields
fn generate_rows(num_rows: usize, fields_per_row: usize, escaped: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..num_rows {
        for j in 0..fields_per_row {
            if j > 0 {
                out.push(b',');
            }
            if escaped && j % 4 == 1 {
                out.extend_from_slice(format!("has\\,comma_{i}").as_bytes());
            } else {
                out.extend_from_slice(format!("field_{i}_{j}_value").as_bytes());
            }
        }
        out.push(b'\n');
    }
    out
}

struct BenchResult {
    name: String,
    iterations: u64,
    total_time: Duration,
    input_size: usize,
}

impl BenchResult {
    fn avg_ns(&self) -> f64 {
        self.total_time.as_nanos() as f64 / self.iterations as f64
    }

    fn throughput_mb_s(&self) -> f64 {
        let secs_per_iter = self.avg_ns() / 1_000_000_000.0;
        self.input_size as f64 / secs_per_iter / 1_000_000.0
    }
}

fn bench_fn<F: Fn() -> usize>(name: &str, input_size: usize, f: F, warmup_secs: f64, bench_secs: f64) -> BenchResult {
    // Warmup
    let warmup_deadline = Instant::now() + Duration::from_secs_f64(warmup_secs);
    while Instant::now() < warmup_deadline {
        std::hint::black_box(f());
    }

    // Benchmark
    let mut iterations: u64 = 0;
    let start = Instant::now();
    let deadline = start + Duration::from_secs_f64(bench_secs);
    while Instant::now() < deadline {
        std::hint::black_box(f());
        iterations += 1;
    }
    let total_time = start.elapsed();

    BenchResult {
        name: name.to_string(),
        iterations,
        total_time,
        input_size,
    }
}

fn print_results(results: &[BenchResult]) {
    let max_name_len = results.iter().map(|r| r.name.len()).max().unwrap_or(0);

    // Find fastest for comparison
    let fastest_ns = results
        .iter()
        .map(|r| r.avg_ns())
        .fold(f64::MAX, f64::min);

    for r in results {
        let avg = r.avg_ns();
        let speedup = avg / fastest_ns;
        let marker = if (speedup - 1.0).abs() < 0.01 { " (fastest)" } else { "" };
        println!(
            "  {:<width$}  {:>10.2} µs/iter  {:>8.1} MB/s  {:>6.2}x{}",
            r.name,
            avg / 1000.0,
            r.throughput_mb_s(),
            speedup,
            marker,
            width = max_name_len,
        );
    }
}

/// One unbounded scalar pass; returns the field count.
fn scan_scalar(input: &[u8], cfg: ParserConfig, fields: &mut [FieldLocation], row_ends: &mut [usize]) -> usize {
    let mut parser = DelimitedTextParser::new(cfg).unwrap();
    let mut out = ScanOutput::new(row_ends, fields);
    let mut cursor = ScanCursor::over(input);
    let mut next_column_start = 0;
    parser.parse_scalar(input, &mut cursor, usize::MAX, &mut out, &mut next_column_start);
    out.num_fields()
}

fn run_benchmark_suite(label: &str, input: &[u8], cfg: ParserConfig, warmup: f64, time: f64) {
    println!("\n--- {} ({} bytes) ---", label, input.len());

    let expected = scan_to_index(input, cfg, AllColumns).unwrap();
    let parallel = scan_to_index_parallel(input, cfg, AllColumns, recommended_splits()).unwrap();
    assert_eq!(expected, parallel, "parallel scan differs from direct!");

    let mut fields = vec![FieldLocation::default(); input.len() + 1];
    let mut row_ends = vec![0usize; input.len() + 1];
    let scalar_fields = scan_scalar(input, cfg, &mut fields, &mut row_ends);
    assert_eq!(scalar_fields, expected.fields.len(), "scalar scan differs from direct!");
    println!("  {} rows, {} fields (all strategies match)", expected.row_count(), scalar_fields);

    let fields = std::cell::RefCell::new(fields);
    let row_ends = std::cell::RefCell::new(row_ends);
    let results = vec![
        bench_fn("Scalar", input.len(), || {
            scan_scalar(input, cfg, &mut fields.borrow_mut(), &mut row_ends.borrow_mut())
        }, warmup, time),
        bench_fn("Windowed", input.len(), || {
            scan_to_index(input, cfg, AllColumns).unwrap().fields.len()
        }, warmup, time),
        bench_fn("Windowed, 1 column", input.len(), || {
            scan_to_index(input, cfg, SelectedColumns::new([3])).unwrap().fields.len()
        }, warmup, time),
        bench_fn("Parallel", input.len(), || {
            scan_to_index_parallel(input, cfg, AllColumns, recommended_splits())
                .unwrap()
                .fields
                .len()
        }, warmup, time),
    ];

    print_results(&results);
}

fn main() {
    println!("=== RustyText Scan Benchmark ===");
    println!("Strategies: Scalar (byte-by-byte), Windowed (16-byte masks), Parallel (rayon splits)");

    let warmup = 1.0;
    let time = 3.0;
    let cfg = ParserConfig::new(b',', b'\n');
    let escaped_cfg = cfg.with_escape(Some(b'\\'));

    let input = generate_rows(10_000, 10, false);
    run_benchmark_suite("10K rows x 10 fields (clean)", &input, cfg, warmup, time);

    let input = generate_rows(10_000, 10, true);
    run_benchmark_suite("10K rows x 10 fields (escaped)", &input, escaped_cfg, warmup, time);

    let input = generate_rows(100_000, 10, false);
    run_benchmark_suite("100K rows x 10 fields (clean)", &input, cfg, warmup, time);

    let input = generate_rows(100_000, 10, true);
    run_benchmark_suite("100K rows x 10 fields (escaped)", &input, escaped_cfg, warmup, time);
}
