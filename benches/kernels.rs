use criterion::{criterion_group, criterion_main, Criterion};
use edgefirst_motion::{
    kernels::blend_weight,
    pixel::SubpixelOrder,
    registry::{CpuLevel, Kernel, Operation, Registry},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const DIMS: [(usize, usize); 3] = [(320, 240), (640, 480), (1920, 1080)];

fn run(kernel: Kernel, a: &mut [u8], b: &[u8], out: &mut [u8], width: usize, height: usize) {
    match kernel {
        Kernel::Blend(f) => f(a, b, blend_weight(12)),
        Kernel::Delta(f) => f(a, b, out),
        Kernel::Convert(f) => f(a, out),
        Kernel::Deinterlace(f) => f(a, b, 40, width, height),
    }
}

pub fn benchmark_kernels(c: &mut Criterion) {
    let registry = Registry::build(CpuLevel::Avx2);
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let ops = [
        (Operation::Blend, SubpixelOrder::Gray8),
        (Operation::Blend, SubpixelOrder::Rgba),
        (Operation::Delta, SubpixelOrder::Gray8),
        (Operation::Delta, SubpixelOrder::Rgba),
        (Operation::Delta, SubpixelOrder::Yuyv),
        (Operation::Convert(SubpixelOrder::Gray8), SubpixelOrder::Rgba),
        (Operation::Convert(SubpixelOrder::Gray8), SubpixelOrder::Yuyv),
        (Operation::Deinterlace4Field, SubpixelOrder::Rgb),
    ];

    for (op, format) in ops {
        let mut group = c.benchmark_group(format!("{}/{}", op, format));
        for (width, height) in DIMS {
            let len = width * height * format.bytes_per_pixel();
            let mut a = vec![0u8; len];
            let mut b = vec![0u8; len];
            rng.fill(&mut a[..]);
            rng.fill(&mut b[..]);
            let mut out = vec![0u8; width * height * 4];
            for (level, kernel) in registry.variants(op, format) {
                group.bench_function(format!("{}/{}x{}", level, width, height), |bench| {
                    bench.iter(|| run(kernel, &mut a, &b, &mut out, width, height))
                });
            }
        }
    }
}

criterion_group!(benches, benchmark_kernels);
criterion_main!(benches);
