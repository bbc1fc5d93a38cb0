//! Non-normative usage example: a shadow pass followed by a lit main pass, mirroring the
//! two-pass structure a caller wires up around a [`DirectionalLight`].

use vellum_raster::config::Config;
use vellum_raster::impl_record;
use vellum_raster::light::{DirectionalLight, ShadowCaster};
use vellum_raster::math::{Frustum, Mat4, Vec3, Vec4};
use vellum_raster::renderer::{Renderer, Sampler};
use vellum_raster::surface::Surface;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
struct Vertex {
    pos: [f32; 4],
    world: [f32; 3],
}
impl_record!(Vertex, 7);

const W: usize = 320;
const H: usize = 240;

fn main() {
    let config = Config::default();

    let quad_vertices = [
        Vertex { pos: [-1.0, -1.0, 0.5, 1.0], world: [-1.0, -1.0, 0.0] },
        Vertex { pos: [1.0, -1.0, 0.5, 1.0], world: [1.0, -1.0, 0.0] },
        Vertex { pos: [1.0, 1.0, 0.5, 1.0], world: [1.0, 1.0, 0.0] },
        Vertex { pos: [-1.0, 1.0, 0.5, 1.0], world: [-1.0, 1.0, 0.0] },
    ];
    let indices = [0u32, 1, 2, 0, 2, 3];

    let mut light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), 256);
    light.set_rotation(Vec3::new(-0.6, 0.3, 0.0));
    light.update_shadow_box(
        Frustum::symmetric(1.2, W as f32 / H as f32, 0.1, 25.0),
        Mat4::IDENTITY,
        &config,
    );

    light.clear_shadow_map();
    light.draw_to_shadow_map(
        &quad_vertices,
        &indices,
        |v: &Vertex| *v,
        |_p: &Vertex, _s: &Sampler<'_, Vertex>| Vec4::ZERO,
    );

    let color = Surface::new(W, H);
    let renderer = Renderer::new(Some(&color), W, H);

    let shadow_matrix = light.world_to_shadow_matrix();
    renderer.draw_element_array(
        &quad_vertices,
        &indices,
        |v: &Vertex| *v,
        |p: &Vertex, _s: &Sampler<'_, Vertex>| {
            let world = Vec3::new(p.world[0], p.world[1], p.world[2]);
            let in_light = shadow_matrix * Vec4::from(world);
            let s = in_light.x * 0.5 + 0.5;
            let t = in_light.y * 0.5 + 0.5;
            let p_depth = in_light.z * 0.5 + 0.5;
            let occlusion = light.multi_sample_shadow_map(s, t, p_depth, 3, &config);
            let lit = 1.0 - occlusion;
            Vec4::new(lit, lit, lit, 1.0)
        },
    );

    #[cfg(feature = "image")]
    color.save_to_file("shadowed_quad.png").expect("failed to write shadowed_quad.png");
}
