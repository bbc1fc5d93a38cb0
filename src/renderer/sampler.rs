//! The texture-sampling view handed to every pixel-shader invocation.
//!
//! Ported from the original engine's `Renderer::Sampler<Pixel>` nested class: it knows the
//! current triangle's left/right/top-or-bottom vertices in both attribute- and screen-space,
//! the in-flight pixel, and a row-above lookup used to approximate screen-space derivatives for
//! mipmap LOD selection.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::command;
use crate::config::Config;
use crate::math::Vec2;
use crate::math::Vec4;
use crate::record::{self, Record};
use crate::surface::Surface;

/// Per-half-triangle sampling context. Constructed once per flat-top/flat-bottom half and
/// threaded through every pixel-shader call within it.
pub struct Sampler<'a, R: Record> {
    flags: u32,
    config: &'a Config,
    flat_top: bool,

    left: R,
    left_screen: Vec2,
    right: R,
    right_screen: Vec2,
    /// The third vertex: bottom if `flat_top`, top otherwise.
    third: R,
    third_screen: Vec2,

    x: Cell<i32>,
    y: Cell<i32>,
    current: Cell<R>,
    previous: Cell<R>,
    above_lookup: RefCell<HashMap<i32, R>>,
    new_scanline: Cell<bool>,
}

impl<'a, R: Record> Sampler<'a, R> {
    pub(crate) fn new(
        flags: u32,
        config: &'a Config,
        flat_top: bool,
        left: R,
        left_screen: Vec2,
        third: R,
        third_screen: Vec2,
        right: R,
        right_screen: Vec2,
    ) -> Self {
        Self {
            flags,
            config,
            flat_top,
            left,
            left_screen,
            right,
            right_screen,
            third,
            third_screen,
            x: Cell::new(0),
            y: Cell::new(0),
            current: Cell::new(left),
            previous: Cell::new(left),
            above_lookup: RefCell::new(HashMap::new()),
            new_scanline: Cell::new(true),
        }
    }

    pub(crate) fn begin_scanline(&self, y: i32) {
        self.y.set(y);
        self.new_scanline.set(true);
    }

    pub(crate) fn visit_pixel(&self, x: i32, current: R) {
        self.x.set(x);
        self.current.set(current);
    }

    pub(crate) fn commit_pixel(&self, x: i32, current: R) {
        self.previous.set(current);
        self.above_lookup.borrow_mut().insert(x, current);
    }

    /// Reconstructs the attribute record at `(x, y)` by re-interpolating along the triangle's
    /// edges, using exactly the same pixel-boundary rule (`ceil(v - 0.5)`) as rasterization so
    /// the synthesized neighbor lines up with what the scanline fill actually produced.
    fn interpolated_pixel(&self, x: i32, y: i32) -> R {
        let (top_y, bottom_y) = if self.flat_top {
            (self.left_screen.y, self.third_screen.y)
        } else {
            (self.third_screen.y, self.left_screen.y)
        };
        let pixel_top = (top_y - 0.5).ceil() as i32;
        let pixel_bottom = (bottom_y - 0.5).ceil() as i32;

        let alpha_down = ((y - pixel_top) as f32 / (pixel_bottom - pixel_top) as f32).clamp(0.0, 1.0);

        let (left_traveler, left_traveler_screen, right_traveler, right_traveler_screen) = if self.flat_top {
            (
                record::lerp(&self.left, &self.third, alpha_down),
                Vec2::lerp(self.left_screen, self.third_screen, alpha_down),
                record::lerp(&self.right, &self.third, alpha_down),
                Vec2::lerp(self.right_screen, self.third_screen, alpha_down),
            )
        } else {
            (
                record::lerp(&self.third, &self.left, alpha_down),
                Vec2::lerp(self.third_screen, self.left_screen, alpha_down),
                record::lerp(&self.third, &self.right, alpha_down),
                Vec2::lerp(self.third_screen, self.right_screen, alpha_down),
            )
        };

        let pixel_left = (left_traveler_screen.x - 0.5).ceil() as i32;
        let pixel_right = (right_traveler_screen.x - 0.5).ceil() as i32;
        let alpha_across = ((x - pixel_left) as f32 / (pixel_right - pixel_left) as f32).clamp(0.0, 1.0);

        let across = record::lerp(&left_traveler, &right_traveler, alpha_across);
        flip_perspective(&across)
    }

    /// Samples `texture` at the `(s, t)` pair living at float offset `texel_offset` within the
    /// current pixel record, honoring the `BILINEAR`/`MIPMAP`/`TRILINEAR` render flags.
    pub fn sample_tex2d(&self, texture: &Surface, texel_offset: usize) -> Vec4 {
        let current = self.current.get();
        let texel1 = texel_at(&current, texel_offset);

        if self.flags & command::MIPMAP != 0 {
            let x = self.x.get();
            let y = self.y.get();
            let have_row_above = self.above_lookup.borrow().contains_key(&x) && !self.new_scanline.get();

            let pixel2 = if have_row_above { self.previous.get() } else { self.interpolated_pixel(x - 1, y) };
            let texel2 = texel_at(&pixel2, texel_offset);

            let pixel3 = if have_row_above {
                *self.above_lookup.borrow().get(&x).unwrap()
            } else {
                self.interpolated_pixel(x, y - 1)
            };
            let texel3 = texel_at(&pixel3, texel_offset);

            self.new_scanline.set(false);

            let dudx = texture.width() as f32 * (texel2.x - texel1.x);
            let dvdx = texture.height() as f32 * (texel2.y - texel1.y);
            let dudy = texture.width() as f32 * (texel3.x - texel1.x);
            let dvdy = texture.height() as f32 * (texel3.y - texel1.y);

            let density_x = (dudx * dudx + dvdx * dvdx).sqrt();
            let density_y = (dudy * dudy + dvdy * dvdy).sqrt();
            let lod = density_x.max(density_y).max(1.0e-8).log2() + 0.5;

            if self.flags & command::TRILINEAR != 0 {
                let level = lod.floor().max(0.0) as i32;
                let mm1 = texture.mipmap(level);
                let mm2 = texture.mipmap(level + 1);
                let bilinear = self.flags & command::BILINEAR != 0;
                let s1 = if bilinear { bilinear_sample(mm1, texel1) } else { linear_sample(mm1, texel1, self.config.wrap_epsilon) };
                let s2 = if bilinear { bilinear_sample(mm2, texel1) } else { linear_sample(mm2, texel1, self.config.wrap_epsilon) };
                let frac = lod - lod.floor();
                return s1 * (1.0 - frac) + s2 * frac;
            }

            let level = lod.floor().max(0.0) as i32;
            let mip = texture.mipmap(level);
            return if self.flags & command::BILINEAR != 0 {
                bilinear_sample(mip, texel1)
            } else {
                linear_sample(mip, texel1, self.config.wrap_epsilon)
            };
        }

        if self.flags & command::BILINEAR != 0 {
            bilinear_sample(texture, texel1)
        } else {
            linear_sample(texture, texel1, self.config.wrap_epsilon)
        }
    }

    /// Samples a cube map given `planes = [+X, -X, +Y, -Y, +Z, -Z]` and a direction `(s, t, p)`.
    /// Always a linear sample (no bilinear, no mip), per Lengyel section 7.5.
    pub fn sample_cubemap(&self, planes: [&Surface; 6], s: f32, t: f32, p: f32) -> Vec4 {
        let (abs_s, abs_t, abs_p) = (s.abs(), t.abs(), p.abs());

        let (face, uv) = if abs_s >= abs_t && abs_s >= abs_p {
            if s > 0.0 {
                (planes[0], Vec2::new(0.5 - p / (2.0 * s), 0.5 - t / (2.0 * s)))
            } else {
                (planes[1], Vec2::new(0.5 - p / (2.0 * s), 0.5 + t / (2.0 * s)))
            }
        } else if abs_t >= abs_s && abs_t >= abs_p {
            if t > 0.0 {
                (planes[2], Vec2::new(0.5 + s / (2.0 * t), 0.5 + p / (2.0 * t)))
            } else {
                (planes[3], Vec2::new(0.5 - s / (2.0 * t), 0.5 + p / (2.0 * t)))
            }
        } else if p > 0.0 {
            (planes[4], Vec2::new(0.5 + s / (2.0 * p), 0.5 - t / (2.0 * p)))
        } else {
            (planes[5], Vec2::new(0.5 + s / (2.0 * p), 0.5 + t / (2.0 * p)))
        };

        linear_sample(face, uv, self.config.wrap_epsilon)
    }
}

#[inline]
fn texel_at<R: Record>(r: &R, offset: usize) -> Vec2 {
    let f = r.as_floats();
    Vec2::new(f[offset], f[offset + 1])
}

/// `p = p * (1/w)`, restoring the original `w` into the position afterwards. Applying this
/// twice is its own inverse: the first call divides by `w`, the second undoes it.
pub(crate) fn flip_perspective<R: Record>(r: &R) -> R {
    let pos = r.position();
    let inv_w = 1.0 / pos[3];
    let mut flipped = record::scale(r, inv_w);
    flipped.set_position([pos[0], pos[1], pos[2], inv_w]);
    flipped
}

#[inline]
fn wrap(v: f32, epsilon: f32) -> f32 {
    v - (v - epsilon).floor()
}

fn linear_sample(texture: &Surface, texel: Vec2, epsilon: f32) -> Vec4 {
    let s = wrap(texel.x, epsilon);
    let t = wrap(texel.y, epsilon);
    let x = (s * (texture.width() as f32 - 1.0)) as usize;
    let y = (t * (texture.height() as f32 - 1.0)) as usize;
    texture.get(x.min(texture.width() - 1), y.min(texture.height() - 1))
}

fn bilinear_sample(texture: &Surface, texel: Vec2) -> Vec4 {
    let fi = texture.width() as f32 * texel.x - 0.5;
    let fj = texture.height() as f32 * texel.y - 0.5;
    let i = fi.floor();
    let j = fj.floor();
    let alpha = fi - i;
    let beta = fj - j;
    let (i, j) = (i as isize, j as isize);

    let w = texture.width() as isize;
    let h = texture.height() as isize;
    let clampi = |v: isize| v.max(0).min(w - 1) as usize;
    let clampj = |v: isize| v.max(0).min(h - 1) as usize;

    let c1 = texture.get(clampi(i), clampj(j));
    let c2 = if i + 1 >= w { c1 } else { texture.get(clampi(i + 1), clampj(j)) };
    let c3 = if j + 1 >= h { c1 } else { texture.get(clampi(i), clampj(j + 1)) };
    let c4 = if i + 1 >= w || j + 1 >= h { c1 } else { texture.get(clampi(i + 1), clampj(j + 1)) };

    c1 * (1.0 - alpha) * (1.0 - beta) + c2 * alpha * (1.0 - beta) + c3 * (1.0 - alpha) * beta + c4 * alpha * beta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubemap_face_selection_is_scale_invariant() {
        let blank = Surface::new(4, 4);
        let planes = [&blank, &blank, &blank, &blank, &blank, &blank];
        let config = Config::default();
        let sampler: Sampler<'_, TestRecord> = Sampler::new(
            0,
            &config,
            true,
            TestRecord::default(),
            Vec2::ZERO,
            TestRecord::default(),
            Vec2::ZERO,
            TestRecord::default(),
            Vec2::ZERO,
        );
        let a = sampler.sample_cubemap(planes, 0.9, 0.1, 0.1);
        let b = sampler.sample_cubemap(planes, 1.8, 0.2, 0.2);
        assert_eq!(a, b);
    }

    #[repr(C)]
    #[derive(Copy, Clone, Debug, Default)]
    struct TestRecord {
        pos: [f32; 4],
    }
    crate::impl_record!(TestRecord, 4);
}
