use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_tree_disparity::prelude::*;
use image::{Rgb, RgbImage};

fn tree_dp_bench(c: &mut Criterion) {

    // Build a textured scene and a copy shifted by four pixels
    let left = RgbImage::from_fn(160, 120, |x, y| {
        Rgb([
            ((x * 37 + y * 91) % 251) as u8,
            ((x * 53 + y * 17) % 251) as u8,
            ((x * 71 + y * 29) % 251) as u8
        ])
    });
    let right = RgbImage::from_fn(160, 120, |x, y| {
        *left.get_pixel((x + 4).min(159), y)
    });

    // Build disparity alg
    let mut disp = TreeDp::new(Params {
        window_size: 5,
        max_disparity: 16,
        ..Default::default()
    });

    // Build frame
    let frame = StereoFrame::new(left, right);

    // Benchmark compute function
    c.bench_function("tree_dp textured 160x120", |b| b.iter(|| disp.compute(black_box(&frame))));
}

criterion_group!(benches, tree_dp_bench);
criterion_main!(benches);
