//! The rasterizer itself: vertex-shader dispatch with memoization, homogeneous clipping,
//! perspective-correct scanline fill, and depth testing.
//!
//! Ported from the original engine's `Renderer::DrawElementArray` / `ClipAndDrawTriangle` /
//! `DrawTriangle` / `DrawFlatTop` / `DrawFlatBottom`. The color target is borrowed, never
//! owned, so a [`Renderer`] can be pointed at a fresh [`Surface`] every frame without
//! reallocating its depth buffer.

mod clip;
mod sampler;

pub use sampler::Sampler;

use std::collections::HashMap;

use crate::command;
use crate::config::Config;
use crate::depth::DepthBuffer;
use crate::math::Vec2;
use crate::math::Vec4;
use crate::record::{self, Record};
use crate::surface::Surface;

#[inline]
fn safe_div(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

/// Owns a depth buffer and a bitfield of render flags; borrows a color target for the
/// duration of a draw call.
///
/// The target is `Option` so a renderer can run depth-only (as every light's shadow pass does).
/// Per the crate's concurrency notes, writes to the target and to the depth buffer go through
/// shared-reference, unsafe "exclusive" accessors even on the single-threaded path, so the same
/// code serves both the sequential and the `par`-feature parallel draw.
pub struct Renderer<'t> {
    target: Option<&'t Surface>,
    depth: DepthBuffer,
    flags: u32,
    config: Config,
}

impl<'t> Renderer<'t> {
    pub fn new(target: Option<&'t Surface>, width: usize, height: usize) -> Self {
        Self {
            target,
            depth: DepthBuffer::new(width, height),
            flags: 0,
            config: Config::default(),
        }
    }

    pub fn with_config(target: Option<&'t Surface>, width: usize, height: usize, config: Config) -> Self {
        Self {
            target,
            depth: DepthBuffer::new(width, height),
            flags: 0,
            config,
        }
    }

    /// Swaps the render target. The caller must ensure the new target shares the depth
    /// buffer's dimensions (or call [`Self::resize`] first).
    pub fn set_render_target(&mut self, target: Option<&'t Surface>) {
        self.target = target;
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn clear_depth(&mut self) {
        self.depth.clear();
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.depth.resize(width, height);
    }

    pub fn set_flags(&mut self, flags: u32) {
        self.flags |= flags;
    }

    pub fn clear_flags(&mut self, flags: u32) {
        self.flags &= !flags;
    }

    pub fn toggle_flags(&mut self, flags: u32) {
        self.flags ^= flags;
    }

    pub fn test_flags(&self, flags: u32) -> bool {
        self.flags & flags != 0
    }

    /// Applies a single command from a [`crate::command::CommandQueue`].
    pub fn apply(&mut self, cmd: command::Command) {
        match cmd {
            command::Command::Resize(w, h) => self.resize(w, h),
            command::Command::SetFlag(f) => self.set_flags(f),
            command::Command::ClearFlag(f) => self.clear_flags(f),
            command::Command::ToggleFlag(f) => self.toggle_flags(f),
        }
    }

    /// Renders `indices.len() / 3` triangles. `vertex_shader` runs at most once per unique
    /// index; `pixel_shader` runs once per surviving, depth-tested pixel.
    pub fn draw_element_array<V, R, F, G>(&self, vertices: &[V], indices: &[u32], vertex_shader: F, pixel_shader: G)
    where
        V: Sync,
        R: Record,
        F: Fn(&V) -> R + Sync,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4 + Sync,
    {
        assert_eq!(indices.len() % 3, 0, "index array length must be a multiple of 3");

        #[cfg(feature = "par")]
        {
            let triangle_count = indices.len() / 3;
            if triangle_count >= num_cpus::get().max(1) {
                self.draw_element_array_par(vertices, indices, &vertex_shader, &pixel_shader);
                return;
            }
        }
        self.draw_element_array_seq(vertices, indices, &vertex_shader, &pixel_shader);
    }

    fn draw_element_array_seq<V, R, F, G>(&self, vertices: &[V], indices: &[u32], vertex_shader: &F, pixel_shader: &G)
    where
        R: Record,
        F: Fn(&V) -> R,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4,
    {
        let mut cache: HashMap<u32, R> = HashMap::new();
        self.draw_indexed_chunk(vertices, indices, vertex_shader, pixel_shader, &mut cache);
    }

    #[cfg(feature = "par")]
    fn draw_element_array_par<V, R, F, G>(&self, vertices: &[V], indices: &[u32], vertex_shader: &F, pixel_shader: &G)
    where
        V: Sync,
        R: Record,
        F: Fn(&V) -> R + Sync,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4 + Sync,
    {
        let workers = num_cpus::get().max(1);
        let triangle_count = indices.len() / 3;
        let chunk_triangles = (triangle_count + workers - 1) / workers;
        if chunk_triangles == 0 {
            return;
        }

        std::thread::scope(|scope| {
            for chunk in indices.chunks(chunk_triangles * 3) {
                scope.spawn(move || {
                    let mut cache: fxhash::FxHashMap<u32, R> = fxhash::FxHashMap::default();
                    self.draw_indexed_chunk(vertices, chunk, vertex_shader, pixel_shader, &mut cache);
                });
            }
        });
    }

    fn draw_indexed_chunk<V, R, F, G, S: std::hash::BuildHasher>(
        &self,
        vertices: &[V],
        indices: &[u32],
        vertex_shader: &F,
        pixel_shader: &G,
        cache: &mut HashMap<u32, R, S>,
    ) where
        R: Record,
        F: Fn(&V) -> R,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4,
    {
        for tri in indices.chunks_exact(3) {
            let (i1, i2, i3) = (tri[0], tri[1], tri[2]);
            let p1 = *cache.entry(i1).or_insert_with(|| vertex_shader(&vertices[i1 as usize]));
            let p2 = *cache.entry(i2).or_insert_with(|| vertex_shader(&vertices[i2 as usize]));
            let p3 = *cache.entry(i3).or_insert_with(|| vertex_shader(&vertices[i3 as usize]));

            let mut clipped = Vec::new();
            clip::clip_and_collect(p1, p2, p3, &mut clipped);
            for (a, b, c) in clipped {
                self.draw_triangle(a, b, c, pixel_shader);
            }
        }
    }

    fn draw_triangle<R, G>(&self, p1: R, p2: R, p3: R, pixel_shader: &G)
    where
        R: Record,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4,
    {
        let divide = |r: R| -> R {
            let mut r = r;
            let pos = r.position();
            let w = pos[3];
            r.set_position([pos[0] / w, pos[1] / w, pos[2] / w, w]);
            r
        };
        let p1 = divide(p1);
        let p2 = divide(p2);
        let p3 = divide(p3);

        if self.flags & command::BACKFACE_CULL != 0 {
            let a = p1.position();
            let b = p2.position();
            let c = p3.position();
            let cross_z = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            if cross_z < 0.0 {
                return;
            }
        }

        let (w, h) = (self.depth.width() as f32, self.depth.height() as f32);
        let eps = self.config.viewport_epsilon;
        let to_screen = |r: &R| -> Vec2 {
            let pos = r.position();
            Vec2::new(((pos[0] + 1.0) * (w - eps) / 2.0).floor(), ((-pos[1] + 1.0) * (h - eps) / 2.0).floor())
        };
        let s1 = to_screen(&p1);
        let s2 = to_screen(&p2);
        let s3 = to_screen(&p3);

        if self.flags & command::WIREFRAME != 0 {
            if let Some(target) = self.target {
                unsafe {
                    target.draw_line_exclusive(s1.x as i32, s1.y as i32, s2.x as i32, s2.y as i32, Vec4::new(1.0, 1.0, 1.0, 1.0));
                    target.draw_line_exclusive(s1.x as i32, s1.y as i32, s3.x as i32, s3.y as i32, Vec4::new(1.0, 1.0, 1.0, 1.0));
                    target.draw_line_exclusive(s3.x as i32, s3.y as i32, s2.x as i32, s2.y as i32, Vec4::new(1.0, 1.0, 1.0, 1.0));
                }
            }
            return;
        }

        let mut verts = [(p1, s1), (p2, s2), (p3, s3)];
        verts.sort_by(|a, b| a.1.y.partial_cmp(&b.1.y).unwrap());
        let [(top, top_s), (mid, mid_s), (bot, bot_s)] = verts;

        let top = sampler::flip_perspective(&top);
        let mid = sampler::flip_perspective(&mid);
        let bot = sampler::flip_perspective(&bot);

        if top_s.y as i32 == bot_s.y as i32 {
            return;
        }

        let cut_alpha = safe_div(mid_s.y - top_s.y, bot_s.y - top_s.y);
        let cut_s = Vec2::lerp(top_s, bot_s, cut_alpha);
        let cut = record::lerp(&top, &bot, cut_alpha);

        if cut_s.x > mid_s.x {
            self.fill_flat_bottom(mid, mid_s, top, top_s, cut, cut_s, pixel_shader);
            self.fill_flat_top(mid, mid_s, bot, bot_s, cut, cut_s, pixel_shader);
        } else {
            self.fill_flat_bottom(cut, cut_s, top, top_s, mid, mid_s, pixel_shader);
            self.fill_flat_top(cut, cut_s, bot, bot_s, mid, mid_s, pixel_shader);
        }

        if self.flags & command::OUTLINES != 0 {
            if let Some(target) = self.target {
                unsafe {
                    target.draw_line_exclusive(s1.x as i32, s1.y as i32, s2.x as i32, s2.y as i32, Vec4::new(1.0, 1.0, 1.0, 1.0));
                    target.draw_line_exclusive(s1.x as i32, s1.y as i32, s3.x as i32, s3.y as i32, Vec4::new(1.0, 1.0, 1.0, 1.0));
                    target.draw_line_exclusive(s3.x as i32, s3.y as i32, s2.x as i32, s2.y as i32, Vec4::new(1.0, 1.0, 1.0, 1.0));
                }
            }
        }
    }

    /// A triangle half whose *bottom* edge (`left` - `right`) is flat; `top` is the lone apex.
    fn fill_flat_bottom<R, G>(&self, left: R, left_s: Vec2, top: R, top_s: Vec2, right: R, right_s: Vec2, pixel_shader: &G)
    where
        R: Record,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4,
    {
        let pixel_top = (top_s.y - 0.5).ceil() as i32;
        let pixel_bottom = (left_s.y - 0.5).ceil() as i32;
        let sampler = Sampler::new(self.flags, &self.config, false, left, left_s, top, top_s, right, right_s);

        for y in pixel_top..pixel_bottom {
            let alpha_down = safe_div((y - pixel_top) as f32, (pixel_bottom - pixel_top) as f32);
            let left_traveler = record::lerp(&top, &left, alpha_down);
            let left_traveler_s = Vec2::lerp(top_s, left_s, alpha_down);
            let right_traveler = record::lerp(&top, &right, alpha_down);
            let right_traveler_s = Vec2::lerp(top_s, right_s, alpha_down);

            self.fill_scanline(y, left_traveler, left_traveler_s, right_traveler, right_traveler_s, &sampler, pixel_shader);
        }
    }

    /// A triangle half whose *top* edge (`left` - `right`) is flat; `bottom` is the lone apex.
    fn fill_flat_top<R, G>(&self, left: R, left_s: Vec2, bottom: R, bottom_s: Vec2, right: R, right_s: Vec2, pixel_shader: &G)
    where
        R: Record,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4,
    {
        let pixel_top = (left_s.y - 0.5).ceil() as i32;
        let pixel_bottom = (bottom_s.y - 0.5).ceil() as i32;
        let sampler = Sampler::new(self.flags, &self.config, true, left, left_s, bottom, bottom_s, right, right_s);

        for y in pixel_top..pixel_bottom {
            let alpha_down = safe_div((y - pixel_top) as f32, (pixel_bottom - pixel_top) as f32);
            let left_traveler = record::lerp(&left, &bottom, alpha_down);
            let left_traveler_s = Vec2::lerp(left_s, bottom_s, alpha_down);
            let right_traveler = record::lerp(&right, &bottom, alpha_down);
            let right_traveler_s = Vec2::lerp(right_s, bottom_s, alpha_down);

            self.fill_scanline(y, left_traveler, left_traveler_s, right_traveler, right_traveler_s, &sampler, pixel_shader);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_scanline<R, G>(
        &self,
        y: i32,
        left_traveler: R,
        left_traveler_s: Vec2,
        right_traveler: R,
        right_traveler_s: Vec2,
        sampler: &Sampler<'_, R>,
        pixel_shader: &G,
    ) where
        R: Record,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4,
    {
        let pixel_left = (left_traveler_s.x - 0.5).ceil() as i32;
        let pixel_right = (right_traveler_s.x - 0.5).ceil() as i32;

        sampler.begin_scanline(y);

        for x in pixel_left..=pixel_right {
            let alpha_across = safe_div((x - pixel_left) as f32, (pixel_right - pixel_left) as f32);
            let across = record::lerp(&left_traveler, &right_traveler, alpha_across);
            let unflipped = sampler::flip_perspective(&across);

            sampler.visit_pixel(x, unflipped);

            if x >= 0 && y >= 0 && (x as usize) < self.depth.width() && (y as usize) < self.depth.height() {
                let pos = unflipped.position();
                let depth = (pos[2] + 1.0) / 2.0;
                let passed = unsafe { self.depth.test_and_set_exclusive_unchecked(x as usize, y as usize, depth) };
                if passed {
                    let color = pixel_shader(&unflipped, sampler);
                    if let Some(target) = self.target {
                        unsafe {
                            target.put_exclusive_unchecked(x as usize, y as usize, color);
                        }
                    }
                }
            }

            sampler.commit_pixel(x, unflipped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[repr(C)]
    #[derive(Copy, Clone, Debug, Default)]
    struct V {
        pos: [f32; 4],
    }
    crate::impl_record!(V, 4);

    fn pos(x: f32, y: f32, z: f32, w: f32) -> V {
        V { pos: [x, y, z, w] }
    }

    #[test]
    fn vertex_shader_runs_at_most_once_per_index() {
        let vertices = [pos(-1.0, -1.0, 0.0, 1.0), pos(1.0, -1.0, 0.0, 1.0), pos(0.0, 1.0, 0.0, 1.0)];
        // two triangles sharing every index - 6 index slots, 3 unique indices
        let indices = [0u32, 1, 2, 0, 1, 2];

        let target = Surface::new(10, 10);
        let renderer = Renderer::new(Some(&target), 10, 10);

        let calls = AtomicUsize::new(0);
        renderer.draw_element_array(
            &vertices,
            &indices,
            |v: &V| {
                calls.fetch_add(1, Ordering::SeqCst);
                *v
            },
            |_p: &V, _s: &Sampler<'_, V>| Vec4::new(1.0, 0.0, 0.0, 1.0),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn single_triangle_covers_roughly_half_a_100x100_target() {
        let vertices = [pos(-1.0, -1.0, 0.0, 1.0), pos(1.0, -1.0, 0.0, 1.0), pos(0.0, 1.0, 0.0, 1.0)];
        let indices = [0u32, 1, 2];

        let target = Surface::new(100, 100);
        let renderer = Renderer::new(Some(&target), 100, 100);

        renderer.draw_element_array(&vertices, &indices, |v: &V| *v, |_p: &V, _s: &Sampler<'_, V>| Vec4::new(1.0, 0.0, 0.0, 1.0));

        let red_count = (0..100)
            .flat_map(|y| (0..100).map(move |x| (x, y)))
            .filter(|&(x, y)| target.get(x, y).x > 0.5)
            .count();

        assert!(red_count > 4000 && red_count < 6000, "expected roughly half the target filled, got {red_count}");
    }

    #[test]
    fn nearer_triangle_wins_the_depth_test_regardless_of_submission_order() {
        let vertices = [pos(-1.0, -1.0, 0.5, 1.0), pos(1.0, -1.0, 0.5, 1.0), pos(0.0, 1.0, 0.5, 1.0)];
        let indices = [0u32, 1, 2];

        let target = Surface::new(20, 20);
        let renderer = Renderer::new(Some(&target), 20, 20);
        renderer.draw_element_array(&vertices, &indices, |v: &V| *v, |_p: &V, _s: &Sampler<'_, V>| Vec4::new(0.0, 1.0, 0.0, 1.0));

        let far_vertices = [pos(-1.0, -1.0, -0.5, 1.0), pos(1.0, -1.0, -0.5, 1.0), pos(0.0, 1.0, -0.5, 1.0)];
        renderer.draw_element_array(&far_vertices, &indices, |v: &V| *v, |_p: &V, _s: &Sampler<'_, V>| Vec4::new(1.0, 0.0, 0.0, 1.0));

        let c = target.get(10, 10);
        assert!(c.y > 0.5 && c.x < 0.5, "nearer (z=0.5) green triangle should still own the pixel");
    }

    #[test]
    fn degenerate_single_scanline_triangle_is_skipped_without_panicking() {
        let vertices = [pos(-1.0, 0.0, 0.0, 1.0), pos(1.0, 0.0, 0.0, 1.0), pos(0.0, 0.0, 0.0, 1.0)];
        let indices = [0u32, 1, 2];
        let target = Surface::new(10, 10);
        let renderer = Renderer::new(Some(&target), 10, 10);
        let ran = Cell::new(false);
        renderer.draw_element_array(
            &vertices,
            &indices,
            |v: &V| *v,
            |_p: &V, _s: &Sampler<'_, V>| {
                ran.set(true);
                Vec4::ZERO
            },
        );
        assert!(!ran.get());
    }
}
