//! Criterion benchmarks for canvas routing and coordinate remapping.
//!
//! `set` runs once per pixel per frame, so its per-call cost bounds the frame
//! rate a drawing loop can reach on a large composed wall.
//!
//! Run with:
//! ```bash
//! cargo bench --package ft-core --bench canvas_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ft_core::{
    Color, CoordinateTable, Display, DisplayError, FrameBuffer, RemappedDisplay, Run,
    UnifiedCanvas,
};

/// A framebuffer-backed display whose send is a no-op.
struct NullDisplay(FrameBuffer);

impl Display for NullDisplay {
    fn width(&self) -> u32 {
        self.0.width()
    }
    fn height(&self) -> u32 {
        self.0.height()
    }
    fn set(&mut self, x: i32, y: i32, color: Color) {
        self.0.set(x, y, color)
    }
    fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.0.get(x, y)
    }
    fn clear(&mut self) {
        self.0.clear()
    }
    fn send(&mut self) -> Result<(), DisplayError> {
        black_box(self.0.encode());
        Ok(())
    }
}

fn null(w: u32, h: u32) -> NullDisplay {
    NullDisplay(FrameBuffer::new(w, h, 0, false).expect("valid dimensions"))
}

/// A 3×3 wall of stock 45×35 panels.
fn make_wall() -> UnifiedCanvas<NullDisplay> {
    let mut canvas = UnifiedCanvas::new();
    for row in 0..3 {
        for col in 0..3 {
            canvas.add(null(45, 35), col * 45, row * 35);
        }
    }
    canvas
}

fn bench_canvas_set_full_frame(c: &mut Criterion) {
    let mut canvas = make_wall();
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    c.bench_function("canvas_set_full_frame_135x105", |b| {
        b.iter(|| {
            for y in 0..h {
                for x in 0..w {
                    canvas.set(black_box(x), black_box(y), Color::RED);
                }
            }
        })
    });
}

fn bench_canvas_send(c: &mut Criterion) {
    let mut canvas = make_wall();
    c.bench_function("canvas_send_9_members", |b| {
        b.iter(|| canvas.send().expect("null displays never fail"))
    });
}

fn bench_remapped_set(c: &mut Criterion) {
    // A zig-zag of ten 100-element rows.
    let lengths = vec![100; 10];
    let runs: Vec<Run> = (0..10)
        .map(|row| Run::Horizontal { x: 0, y: row, segments: vec![row as usize] })
        .collect();
    let table = CoordinateTable::build(100, 10, &lengths, &runs).expect("runs fit");
    let mut display = RemappedDisplay::new(null(1000, 1), table).expect("strip long enough");

    c.bench_function("remapped_set_full_frame_100x10", |b| {
        b.iter(|| {
            for y in 0..10 {
                for x in 0..100 {
                    display.set(black_box(x), black_box(y), Color::BLUE);
                }
            }
        })
    });
}

criterion_group!(
    benches,
    bench_canvas_set_full_frame,
    bench_canvas_send,
    bench_remapped_set
);
criterion_main!(benches);
