use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kontur_canny::{blur, gradient, luma, sobel_preview, suppress, CannyPipeline};
use kontur_core::PixelBuffer;

/// 640x480 test card: curved ramps plus a hard vertical step, so every
/// stage has real work to do.
fn bench_buffer() -> PixelBuffer {
    let mut buf = PixelBuffer::new(640, 480);
    for y in 0..480u32 {
        for x in 0..640u32 {
            let v = if x > 320 {
                255
            } else {
                ((x * x + y * y) % 256) as u8
            };
            buf.set_pixel(x, y, [v, v, v, 255]);
        }
    }
    buf
}

fn bench_full_pipeline(c: &mut Criterion) {
    let input = bench_buffer();
    let pipeline = CannyPipeline::with_thresholds(20, 60).unwrap();

    let mut group = c.benchmark_group("canny_pipeline");
    group.sample_size(30);

    group.bench_function("full_640x480", |b| {
        b.iter(|| pipeline.run(black_box(&input)).unwrap());
    });

    group.bench_function("sobel_preview_640x480", |b| {
        b.iter(|| sobel_preview(black_box(&input)));
    });

    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let input = bench_buffer();
    let gray = luma::to_gray(&input);
    let field = gradient::sobel(&gray);

    let mut group = c.benchmark_group("canny_stages");

    group.bench_function("box_blur_r2", |b| {
        b.iter(|| blur::box_blur(black_box(&input), 2));
    });

    group.bench_function("grayscale", |b| {
        b.iter(|| luma::to_gray(black_box(&input)));
    });

    group.bench_function("sobel", |b| {
        b.iter(|| gradient::sobel(black_box(&gray)));
    });

    group.bench_function("non_maximum", |b| {
        b.iter(|| suppress::non_maximum(black_box(&field)));
    });

    group.finish();
}

criterion_group!(benches, bench_full_pipeline, bench_stages);
criterion_main!(benches);
