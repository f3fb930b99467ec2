//! Benchmarks for scanline reads and frame extraction.
//!
//! Run with: cargo bench
//!
//! Uses the synthetic codec, so no clip files or vendor library are needed.
//! The numbers measure the decode bridge and buffer copies, not the real
//! codec.

use std::hint::black_box;

use criterion::Criterion;

use braw_input::synthetic::{SyntheticClipSpec, SyntheticLibrary};
use braw_input::{FrameRange, OpenOptions, PixelFormat, ScanlineReader};

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;

fn options() -> OpenOptions {
    OpenOptions::new().with_library_path("/opt/braw/lib/libBlackmagicRawAPI.so")
}

fn library(frame_count: u64) -> SyntheticLibrary {
    SyntheticLibrary::new(
        SyntheticClipSpec::default()
            .with_dimensions(WIDTH, HEIGHT)
            .with_frame_count(frame_count),
    )
}

fn benchmark_open(criterion: &mut Criterion) {
    let library = library(24);

    criterion.bench_function("open clip (metadata + color negotiation)", |bencher| {
        bencher.iter(|| {
            let reader = ScanlineReader::open("bench.braw", &options(), &library).unwrap();
            black_box(reader.description().subimage_count);
        });
    });
}

fn benchmark_scanlines(criterion: &mut Criterion) {
    let library = library(24);
    let reader = ScanlineReader::open("bench.braw", &options(), &library).unwrap();
    let mut row = vec![0_u8; reader.layout().row_bytes()];

    criterion.bench_function("read all rows of a decoded frame", |bencher| {
        reader.read_scanline(0, 0, 0, &mut row).unwrap();
        bencher.iter(|| {
            for y in 0..HEIGHT as i32 {
                reader.read_scanline(0, 0, y, &mut row).unwrap();
            }
            black_box(&row);
        });
    });

    let mut subimage = 0;
    criterion.bench_function("decode frame and read first row", |bencher| {
        bencher.iter(|| {
            subimage = (subimage + 1) % 24;
            reader.read_scanline(subimage, 0, 0, &mut row).unwrap();
            black_box(&row);
        });
    });
}

fn benchmark_pixel_formats(criterion: &mut Criterion) {
    let library = library(2);

    for format in [PixelFormat::Rgba8, PixelFormat::Rgba16, PixelFormat::RgbaF32] {
        let request = options().with_pixel_format(format);
        let reader = ScanlineReader::open("bench.braw", &request, &library).unwrap();
        let mut frame = vec![0_u8; reader.layout().frame_bytes()];
        let mut subimage = 0;

        criterion.bench_function(&format!("decode whole frame ({format})"), |bencher| {
            bencher.iter(|| {
                subimage = 1 - subimage;
                reader.read_image(subimage, &mut frame).unwrap();
                black_box(&frame);
            });
        });
    }
}

fn benchmark_extraction(criterion: &mut Criterion) {
    let library = library(10);
    let reader = ScanlineReader::open("bench.braw", &options(), &library).unwrap();

    criterion.bench_function("extract 10 frames as images", |bencher| {
        bencher.iter(|| {
            let frames = reader.frames(FrameRange::Range(0, 9)).unwrap();
            black_box(frames);
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_open,
    benchmark_scanlines,
    benchmark_pixel_formats,
    benchmark_extraction,
);
criterion::criterion_main!(benches);
