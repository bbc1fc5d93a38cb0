use criterion::{black_box, criterion_group, criterion_main, Bencher, Criterion};
use std::time::Duration;
use vellum_raster::impl_record;
use vellum_raster::math::Vec4;
use vellum_raster::renderer::Renderer;
use vellum_raster::surface::Surface;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
struct Vertex {
    pos: [f32; 4],
    uv: [f32; 2],
}
impl_record!(Vertex, 6);

fn triangle_benchmark(b: &mut Bencher, &[width, height]: &[usize; 2]) {
    let vertices = [
        Vertex { pos: [-1.0, -1.0, 0.0, 1.0], uv: [0.0, 0.0] },
        Vertex { pos: [1.0, -1.0, 0.0, 1.0], uv: [1.0, 0.0] },
        Vertex { pos: [0.0, 1.0, 0.0, 1.0], uv: [0.5, 1.0] },
    ];
    let indices = [0u32, 1, 2];

    let color = Surface::new(width, height);
    let mut renderer = Renderer::new(Some(&color), width, height);

    b.iter(|| {
        renderer.clear_depth();
        renderer.draw_element_array(
            &vertices,
            &indices,
            |v: &Vertex| *v,
            |p: &Vertex, _sampler| Vec4::new(p.uv[0], p.uv[1], 0.0, 1.0),
        );
        black_box(&color);
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function_over_inputs(
        "triangle",
        |b, &size| triangle_benchmark(b, size),
        &[[32, 32], [640, 480], [1024, 800], [2048, 1600]],
    );
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .warm_up_time(Duration::from_millis(500));
    targets = criterion_benchmark
}

criterion_main!(benches);
