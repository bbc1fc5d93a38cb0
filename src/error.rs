//! The crate's only fallible surface: resource acquisition (image decode/encode). Everything
//! inside a draw call is infallible by construction per the numerically-degenerate and
//! out-of-range policies documented on [`crate::renderer::Renderer`].

/// Errors surfacing from I/O at the edges of the renderer (decoding/encoding images).
///
/// Draw calls themselves never return this: a malformed scene produces degenerate-but-valid
/// output (dropped triangles, clamped LOD), never an `Err`.
#[derive(thiserror::Error, Debug)]
pub enum RendererError {
    #[error(transparent)]
    Surface(#[from] crate::surface::SurfaceError),
}
