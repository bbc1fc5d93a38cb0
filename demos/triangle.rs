//! Minimal non-normative usage example: rasterizes a single triangle and writes it to a
//! PNG. Run with `cargo run --example triangle --features image` once copied into an
//! `examples/` directory of a binary crate that depends on this one.

use vellum_raster::impl_record;
use vellum_raster::math::Vec4;
use vellum_raster::renderer::Renderer;
use vellum_raster::surface::Surface;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
struct Vertex {
    pos: [f32; 4],
}
impl_record!(Vertex, 4);

const W: usize = 640;
const H: usize = 480;

fn main() {
    let color = Surface::new(W, H);
    let renderer = Renderer::new(Some(&color), W, H);

    let vertices = [
        Vertex { pos: [-1.0, -1.0, 0.0, 1.0] },
        Vertex { pos: [1.0, -1.0, 0.0, 1.0] },
        Vertex { pos: [0.0, 1.0, 0.0, 1.0] },
    ];
    let indices = [0u32, 1, 2];

    renderer.draw_element_array(
        &vertices,
        &indices,
        |v: &Vertex| *v,
        |_p: &Vertex, _sampler| Vec4::new(1.0, 0.0, 0.0, 1.0),
    );

    #[cfg(feature = "image")]
    color.save_to_file("triangle.png").expect("failed to write triangle.png");
}
