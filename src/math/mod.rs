//! Fixed math primitives: 2/3/4-component vectors, 3x3/4x4 matrices, and the small
//! plain-data shapes (`Frustum`, `Box`) that the renderer and lights build projections from.

mod mat3;
mod mat4;
mod vec2;
mod vec3;
mod vec4;

pub use mat3::Mat3;
pub use mat4::Mat4;
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;

/// A view frustum in camera space, used to derive perspective projections and to fit
/// shadow-map bounding boxes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Frustum {
    /// A symmetric perspective frustum derived from a vertical field of view (radians) and
    /// aspect ratio (`width / height`).
    pub fn symmetric(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let top = near * (fov_y * 0.5).tan();
        let right = top * aspect;
        Self {
            near,
            far,
            left: -right,
            right,
            top,
            bottom: -top,
        }
    }

    #[inline]
    pub fn to_perspective(&self) -> Mat4 {
        Mat4::perspective(self.near, self.far, self.left, self.right, self.top, self.bottom)
    }
}

/// An axis-aligned box in light space, used to fit an orthographic shadow projection around
/// the portion of the view frustum a light needs to cover.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Box3 {
    pub front: f32,
    pub back: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Box3 {
    #[inline]
    pub fn to_orthographic(&self) -> Mat4 {
        Mat4::orthographic(self.front, self.back, self.left, self.right, self.top, self.bottom)
    }
}
