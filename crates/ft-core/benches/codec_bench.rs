//! Criterion benchmarks for the frame codec.
//!
//! Measures encoding and parsing cost for the three frame formats at the
//! stock 45×35 display size and at a size large enough to need tiling.
//!
//! Run with:
//! ```bash
//! cargo bench --package ft-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ft_core::{parse_frame, Color, FrameBuffer, Offset, MAX_DATAGRAM_SIZE};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// A buffer with a diagonal gradient so PNG compression has real work to do.
fn make_gradient(width: u32, height: u32) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height, 5, false).expect("valid dimensions");
    for y in 0..height {
        for x in 0..width {
            let c = Color::new(
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) % 256) as u8,
            );
            fb.set(x as i32, y as i32, c);
        }
    }
    fb
}

const SIZES: &[(u32, u32)] = &[(45, 35), (200, 120)];

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks the plain frame encoding.
fn bench_encode_plain(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_plain");
    for &(w, h) in SIZES {
        let fb = make_gradient(w, h);
        group.bench_with_input(BenchmarkId::new("size", format!("{w}x{h}")), &fb, |b, fb| {
            b.iter(|| black_box(fb).encode())
        });
    }
    group.finish();
}

/// Benchmarks splitting into datagram-sized offset tiles.
fn bench_encode_tiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_tiles");
    for &(w, h) in SIZES {
        let fb = make_gradient(w, h);
        group.bench_with_input(BenchmarkId::new("size", format!("{w}x{h}")), &fb, |b, fb| {
            b.iter(|| {
                black_box(fb)
                    .encode_tiles(Offset::new(0, 0, 1), MAX_DATAGRAM_SIZE)
                    .expect("rows fit")
            })
        });
    }
    group.finish();
}

/// Benchmarks the Q7 frame, dominated by PNG compression.
fn bench_encode_q7(c: &mut Criterion) {
    let fb = make_gradient(45, 35);
    c.bench_function("encode_q7_45x35", |b| {
        b.iter(|| black_box(&fb).encode_q7(Offset::default()).expect("png encodes"))
    });
}

/// Benchmarks parsing pre-encoded frames of each kind.
fn bench_parse(c: &mut Criterion) {
    let fb = make_gradient(45, 35);
    let frames = [
        ("plain", fb.encode()),
        ("offset", fb.encode_with_offset(Offset::new(3, 4, 2))),
        ("q7", fb.encode_q7(Offset::default()).expect("png encodes")),
    ];

    let mut group = c.benchmark_group("parse_frame");
    for (name, bytes) in &frames {
        group.bench_with_input(BenchmarkId::new("kind", name), bytes, |b, bytes| {
            b.iter(|| parse_frame(black_box(bytes)).expect("frame parses"))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encode_plain,
    bench_encode_tiles,
    bench_encode_q7,
    bench_parse
);
criterion_main!(benches);
