//! Software scanline rasterizer
//!
//! Renders a scene graph of textured triangle meshes into an RGBA
//! framebuffer without a GPU geometry stage:
//! - Frustum culling of whole meshes by bounding box
//! - Backface culling, near-plane clipping
//! - Perspective-correct texturing with an inverse-depth z-buffer
//! - Flat shading through prescaled palettes
//!
//! Scenes are imported from OBJ/MTL files.

pub mod rasterizer;
pub mod scene;
