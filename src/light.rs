//! Shadow-map-capable lights. A light owns a private depth-only `Renderer` and reuses the
//! same rasterizer for its shadow pass - no separate shadow rendering path exists.

use crate::config::Config;
use crate::math::{Box3, Frustum, Mat3, Mat4, Vec3, Vec4};
use crate::record::Record;
use crate::renderer::{Renderer, Sampler};

/// Any depth returned for a shadow-map lookup outside `[0, 1)` texture coordinates. Larger
/// than any real normalized depth, so it always reads as "unshadowed".
const LARGE_DEPTH: f32 = 1.0e6;

/// Behavior shared by every light: its own depth-only renderer and PCF shadow lookups.
pub trait ShadowCaster {
    fn renderer(&self) -> &Renderer<'static>;
    fn renderer_mut(&mut self) -> &mut Renderer<'static>;

    fn clear_shadow_map(&mut self) {
        self.renderer_mut().clear_depth();
    }

    /// Forwards to the private renderer's `draw_element_array`.
    fn draw_to_shadow_map<V, R, F, G>(&self, vertices: &[V], indices: &[u32], vertex_shader: F, pixel_shader: G)
    where
        V: Sync,
        R: Record,
        F: Fn(&V) -> R + Sync,
        G: Fn(&R, &Sampler<'_, R>) -> Vec4 + Sync,
    {
        self.renderer().draw_element_array(vertices, indices, vertex_shader, pixel_shader);
    }

    /// Depth stored at texel `(s*W, t*H)`. Coordinates outside `[0, 1)` return [`LARGE_DEPTH`]
    /// (treated by callers as "not shadowed").
    fn sample_shadow_map(&self, s: f32, t: f32) -> f32 {
        if !(0.0..1.0).contains(&s) || !(0.0..1.0).contains(&t) {
            return LARGE_DEPTH;
        }
        let depth = self.renderer().depth_buffer();
        let x = (s * depth.width() as f32) as usize;
        let y = (t * depth.height() as f32) as usize;
        depth.get(x.min(depth.width() - 1), y.min(depth.height() - 1))
    }

    /// `k x k` percentage-closer filter centered on `(s, t)`: the fraction of taps where the
    /// compared depth `p` is further than the stored depth plus bias (i.e. occluded).
    fn multi_sample_shadow_map(&self, s: f32, t: f32, p: f32, k: i32, config: &Config) -> f32 {
        let depth = self.renderer().depth_buffer();
        let texel_w = 1.0 / depth.width() as f32;
        let texel_h = 1.0 / depth.height() as f32;
        let half = k / 2;

        let mut occluded = 0;
        let mut total = 0;
        for dy in -half..=half {
            for dx in -half..=half {
                let stored = self.sample_shadow_map(s + dx as f32 * texel_w, t + dy as f32 * texel_h);
                if p > stored + config.shadow_bias {
                    occluded += 1;
                }
                total += 1;
            }
        }
        occluded as f32 / total as f32
    }
}

/// A light with a fixed direction, shining from "infinitely far away" - shadowed with an
/// orthographic projection fitted to the active camera frustum every frame.
pub struct DirectionalLight {
    pub color: Vec3,
    rotation: Vec3,
    direction: Vec3,
    view: Mat4,
    projection: Mat4,
    renderer: Renderer<'static>,
}

impl DirectionalLight {
    pub fn new(color: Vec3, shadow_map_resolution: usize) -> Self {
        let mut light = Self {
            color,
            rotation: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, -1.0),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            renderer: Renderer::new(None, shadow_map_resolution, shadow_map_resolution),
        };
        light.set_rotation(Vec3::ZERO);
        light
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        let rot = Mat3::rotation(rotation.x, rotation.y, rotation.z);
        self.direction = (rot * Vec3::new(0.0, 0.0, -1.0)).normalized();
        self.view = Mat4::from(rot).inverse();
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Fits an orthographic box around the view frustum's eight corners (transformed into
    /// light space), capping the effective far plane and padding the front to catch casters
    /// that sit behind the camera's near plane but still cast into view.
    pub fn update_shadow_box(&mut self, frustum: Frustum, cam_to_world: Mat4, config: &Config) {
        let capped_far = frustum.far.min(config.shadow_far_cap);
        let corners = frustum_corners(frustum.near, capped_far, frustum.left, frustum.right, frustum.top, frustum.bottom);

        let to_light = self.view * cam_to_world;
        let mut box3 = Box3 {
            front: f32::MAX,
            back: f32::MIN,
            left: f32::MAX,
            right: f32::MIN,
            top: f32::MIN,
            bottom: f32::MAX,
        };
        for corner in corners {
            let p = to_light * Vec4::from(corner);
            box3.left = box3.left.min(p.x);
            box3.right = box3.right.max(p.x);
            box3.bottom = box3.bottom.min(p.y);
            box3.top = box3.top.max(p.y);
            box3.front = box3.front.min(-p.z);
            box3.back = box3.back.max(-p.z);
        }
        box3.front -= config.shadow_box_offset;

        self.projection = box3.to_orthographic();
    }

    /// `projection * view`; typically premultiplied by the viewport matrix by the caller to
    /// get a direct shadow-map UV.
    pub fn world_to_shadow_matrix(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl ShadowCaster for DirectionalLight {
    fn renderer(&self) -> &Renderer<'static> {
        &self.renderer
    }
    fn renderer_mut(&mut self) -> &mut Renderer<'static> {
        &mut self.renderer
    }
}

/// A point light with a cone of effect: position, inverse-square-ish attenuation, and an
/// angular falloff exponent. Its shadow pass uses a perspective projection fitted from the
/// cone's extents.
pub struct SpotLight {
    pub color: Vec3,
    pub position: Vec3,
    rotation: Vec3,
    direction: Vec3,
    view: Mat4,
    projection: Mat4,
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
    pub concentration_exponent: f32,
    renderer: Renderer<'static>,
}

impl SpotLight {
    pub fn new(color: Vec3, position: Vec3, shadow_map_resolution: usize) -> Self {
        let mut light = Self {
            color,
            position,
            rotation: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, -1.0),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            attenuation_constant: 1.0,
            attenuation_linear: 0.0,
            attenuation_quadratic: 0.0,
            concentration_exponent: 1.0,
            renderer: Renderer::new(None, shadow_map_resolution, shadow_map_resolution),
        };
        light.set_rotation(Vec3::ZERO);
        light
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        let rot = Mat3::rotation(rotation.x, rotation.y, rotation.z);
        self.direction = (rot * Vec3::new(0.0, 0.0, -1.0)).normalized();
        self.view = Mat4::from(rot).inverse() * Mat4::translation(self.position * -1.0);
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn set_projection(&mut self, frustum: Frustum) {
        self.projection = frustum.to_perspective();
    }

    pub fn world_to_shadow_matrix(&self) -> Mat4 {
        self.projection * self.view
    }

    fn attenuation(&self, distance: f32) -> f32 {
        self.attenuation_constant + self.attenuation_linear * distance + self.attenuation_quadratic * distance * distance
    }

    /// `color * (direction . to_point)^exponent / attenuation`, clamped to zero for points
    /// behind the cone.
    pub fn color_at(&self, point: Vec3) -> Vec3 {
        let to_point = point - self.position;
        let distance = to_point.length();
        if distance <= 0.0 {
            return self.color;
        }
        let to_point = to_point.normalized();
        let alignment = self.direction.dot(to_point);
        if alignment <= 0.0 {
            return Vec3::ZERO;
        }
        let falloff = alignment.powf(self.concentration_exponent);
        self.color * (falloff / self.attenuation(distance))
    }
}

impl ShadowCaster for SpotLight {
    fn renderer(&self) -> &Renderer<'static> {
        &self.renderer
    }
    fn renderer_mut(&mut self) -> &mut Renderer<'static> {
        &mut self.renderer
    }
}

fn frustum_corners(near: f32, far: f32, left: f32, right: f32, top: f32, bottom: f32) -> [Vec3; 8] {
    let near_scale = 1.0;
    let far_scale = far / near;
    [
        Vec3::new(left * near_scale, bottom * near_scale, -near),
        Vec3::new(right * near_scale, bottom * near_scale, -near),
        Vec3::new(right * near_scale, top * near_scale, -near),
        Vec3::new(left * near_scale, top * near_scale, -near),
        Vec3::new(left * far_scale, bottom * far_scale, -far),
        Vec3::new(right * far_scale, bottom * far_scale, -far),
        Vec3::new(right * far_scale, top * far_scale, -far),
        Vec3::new(left * far_scale, top * far_scale, -far),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_light_starts_facing_negative_z() {
        let light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), 64);
        let d = light.direction();
        assert!((d.z - (-1.0)).abs() < 1e-5);
    }

    #[test]
    fn sample_outside_unit_range_returns_large_sentinel() {
        let light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), 64);
        assert_eq!(light.sample_shadow_map(-0.1, 0.5), LARGE_DEPTH);
        assert_eq!(light.sample_shadow_map(0.5, 1.0), LARGE_DEPTH);
    }

    #[test]
    fn single_tap_pcf_matches_direct_depth_comparison() {
        let light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), 4);
        let config = Config::default();
        // untouched depth buffer reads as the far sentinel, so any finite `p` is unshadowed
        let occlusion = light.multi_sample_shadow_map(0.5, 0.5, 0.9, 1, &config);
        assert_eq!(occlusion, 0.0);
    }

    #[test]
    fn spotlight_color_is_zero_behind_the_cone() {
        let mut light = SpotLight::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 0.0), 64);
        light.set_rotation(Vec3::ZERO); // facing -z
        let behind = Vec3::new(0.0, 0.0, 5.0); // +z, behind the cone
        let color = light.color_at(behind);
        assert_eq!(color, Vec3::ZERO);
    }

    #[test]
    fn spotlight_color_is_nonzero_in_front_of_the_cone() {
        let mut light = SpotLight::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 0.0), 64);
        light.set_rotation(Vec3::ZERO);
        let ahead = Vec3::new(0.0, 0.0, -5.0);
        let color = light.color_at(ahead);
        assert!(color.x > 0.0);
    }
}
