//! A CPU-only software 3D rasterizer: homogeneous clipping, perspective-correct scanline
//! fill, mipmapped/bilinear/trilinear/cube-map texture sampling, and shadow-mapped
//! directional/spot lights, built on top of caller-supplied vertex and pixel shader
//! closures rather than a fixed vertex format.
//!
//! # Concurrency
//!
//! [`renderer::Renderer::draw_element_array`] dispatches across worker threads when the
//! `par` feature is enabled and the triangle count warrants it. Writes to the depth buffer
//! and color target during a parallel draw go through unsafe "exclusive" accessors that
//! bypass Rust's aliasing guarantees: two triangles that overlap in screen space race on
//! the shared pixel, and the result is last-writer-wins rather than a panic or UB beyond
//! that race. This is a deliberate trade-off, not a bug - see [`surface::Surface::put_exclusive_unchecked`].
//!
//! # Example
//!
//! ```
//! use vellum_raster::math::Vec4;
//! use vellum_raster::renderer::Renderer;
//! use vellum_raster::surface::Surface;
//! use vellum_raster::impl_record;
//!
//! #[repr(C)]
//! #[derive(Copy, Clone, Debug, Default)]
//! struct Vertex {
//!     pos: [f32; 4],
//! }
//! impl_record!(Vertex, 4);
//!
//! let target = Surface::new(64, 64);
//! let renderer = Renderer::new(Some(&target), 64, 64);
//!
//! let vertices = [
//!     Vertex { pos: [-1.0, -1.0, 0.0, 1.0] },
//!     Vertex { pos: [1.0, -1.0, 0.0, 1.0] },
//!     Vertex { pos: [0.0, 1.0, 0.0, 1.0] },
//! ];
//! let indices = [0u32, 1, 2];
//!
//! renderer.draw_element_array(
//!     &vertices,
//!     &indices,
//!     |v: &Vertex| *v,
//!     |_p: &Vertex, _s| Vec4::new(1.0, 0.0, 0.0, 1.0),
//! );
//! ```

pub mod command;
pub mod config;
pub mod depth;
pub mod error;
pub mod light;
pub mod math;
pub mod record;
pub mod renderer;
pub mod surface;

pub use config::Config;
pub use error::RendererError;
