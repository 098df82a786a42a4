//! Scanline software rasterizer
//!
//! Features:
//! - Bounding-box frustum culling per mesh
//! - Backface culling and Sutherland-Hodgman clipping per triangle
//! - Perspective-correct texture mapping with an inverse-depth z-buffer
//! - Flat shading through prescaled texture palettes

mod math;
mod types;
mod clip;
mod render;

pub use math::*;
pub use types::*;
pub use clip::*;
pub use render::*;

/// Default output resolution
pub const WIDTH: usize = 640;
pub const HEIGHT: usize = 480;

/// Distance from the eye to the near clip plane
pub const NEAR_PLANE: f32 = 0.2;

/// Number of prescaled palettes per texture
pub const PALETTE_LEVELS: usize = 32;

/// Vertex budget of a clipped triangle
pub const MAX_CLIP_VERTS: usize = 8;
