//! Tuning constants the original engine hard-coded as magic numbers. Exposed here as a plain
//! `Copy` struct so an application can override them (e.g. from a config file via `serde`)
//! without forking the crate.

/// Rendering and shadow tuning constants.
///
/// The defaults match the values used throughout the spec this crate implements; none of them
/// are load-bearing for correctness, only for visual tuning, so overriding any of them is safe.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Depth bias subtracted before a shadow-map comparison counts as "in shadow", to avoid
    /// self-shadowing acne on flat surfaces.
    pub shadow_bias: f32,
    /// How far in front of the fitted view-frustum box a directional light's shadow volume
    /// is extended, to catch casters that sit just outside the camera's near plane.
    pub shadow_box_offset: f32,
    /// Caps the effective far plane used when fitting a directional light's shadow box, so a
    /// single shadow map doesn't have to cover an impractically large volume.
    pub shadow_far_cap: f32,
    /// Subtracted from `(width, height)` during viewport mapping so the rightmost/bottommost
    /// row of pixels doesn't wrap past the edge of the target.
    pub viewport_epsilon: f32,
    /// Texture coordinates are wrapped by `v - floor(v - epsilon)`; keeps a coordinate that
    /// lands exactly on `1.0` from wrapping to `0.0`.
    pub wrap_epsilon: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shadow_bias: 0.007,
            shadow_box_offset: 10.0,
            shadow_far_cap: 25.0,
            viewport_epsilon: 0.01,
            wrap_epsilon: 1.0e-7,
        }
    }
}
