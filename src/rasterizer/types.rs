//! Core types for the rasterizer

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::PALETTE_LEVELS;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 0.0-1.0 float channels (MTL `Kd` values)
    pub fn from_f32(r: f32, g: f32, b: f32) -> Self {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(c(r), c(g), c(b))
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i) as u8,
            g: (self.g as f32 * i) as u8,
            b: (self.b as f32 * i) as u8,
            a: self.a,
        }
    }

    /// Pack as 0xRRGGBBAA
    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 24) | ((self.g as u32) << 16) | ((self.b as u32) << 8) | (self.a as u32)
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Errors raised while reading asset files
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Palettized texture with one prescaled palette per shading level.
///
/// Shading a texel is a table selection: the rasterizer picks the palette
/// for the face's light level once per triangle and then only does
/// `palette[indices[texel]]` per pixel.
#[derive(Debug, Clone)]
pub struct Texture {
    /// Resolved file path (or any unique key for in-memory textures)
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Per-texel index into the base palette
    pub indices: Vec<u8>,
    /// Base palette at full intensity
    pub palette: Vec<Color>,
    palettes: Vec<Vec<Color>>,
}

impl Texture {
    /// Build from indexed texels and a base palette (at most 256 entries)
    pub fn from_indexed(name: impl Into<String>, width: usize, height: usize, indices: Vec<u8>, palette: Vec<Color>) -> Self {
        let name = name.into();
        if !width.is_power_of_two() || !height.is_power_of_two() {
            log::warn!(
                "Texture {} is {}x{}; sampling wraps by bitmask and assumes power-of-two sizes",
                name, width, height
            );
        }

        let palettes = (0..PALETTE_LEVELS)
            .map(|level| {
                let intensity = level as f32 / (PALETTE_LEVELS - 1) as f32;
                palette.iter().map(|c| c.shade(intensity)).collect()
            })
            .collect();

        Self {
            name,
            width,
            height,
            indices,
            palette,
            palettes,
        }
    }

    /// Build from full colors, quantizing to a 256-entry palette
    pub fn from_colors(name: impl Into<String>, width: usize, height: usize, pixels: &[Color]) -> Self {
        let (indices, palette) = quantize(pixels);
        Self::from_indexed(name, width, height, indices, palette)
    }

    /// Load texture from an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(img, path.to_string_lossy().to_string()))
    }

    fn from_image(img: image::DynamicImage, name: String) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();
        Self::from_colors(name, width as usize, height as usize, &pixels)
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut indices = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                indices.push(if checker { 0 } else { 1 });
            }
        }
        Self::from_indexed("checkerboard", width, height, indices, vec![color1, color2])
    }

    /// Prescaled palette for a shading level (clamped to the last level)
    pub fn shaded_palette(&self, level: usize) -> &[Color] {
        &self.palettes[level.min(PALETTE_LEVELS - 1)]
    }

    /// Palette index at texel x,y
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        self.indices[y * self.width + x]
    }
}

/// Reduce colors to at most 256 palette entries. Exact when the image has
/// few enough distinct colors, RGB332 otherwise.
fn quantize(pixels: &[Color]) -> (Vec<u8>, Vec<Color>) {
    let mut palette: Vec<Color> = Vec::new();
    let mut lookup: HashMap<u32, u8> = HashMap::new();
    let mut indices = Vec::with_capacity(pixels.len());

    for p in pixels {
        let key = p.to_u32();
        if let Some(&idx) = lookup.get(&key) {
            indices.push(idx);
            continue;
        }
        if palette.len() == 256 {
            return quantize_rgb332(pixels);
        }
        let idx = palette.len() as u8;
        lookup.insert(key, idx);
        palette.push(*p);
        indices.push(idx);
    }

    (indices, palette)
}

fn quantize_rgb332(pixels: &[Color]) -> (Vec<u8>, Vec<Color>) {
    let palette = (0..=255u8)
        .map(|i| {
            let r = ((i >> 5) & 7) as u32;
            let g = ((i >> 2) & 7) as u32;
            let b = (i & 3) as u32;
            Color::new((r * 255 / 7) as u8, (g * 255 / 7) as u8, (b * 255 / 3) as u8)
        })
        .collect();
    let indices = pixels
        .iter()
        .map(|p| (p.r & 0xE0) | ((p.g >> 3) & 0x1C) | (p.b >> 6))
        .collect();
    (indices, palette)
}

/// Surface description: diffuse color plus an optional texture handle
/// (index into the scene's texture list)
#[derive(Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    pub diffuse: Color,
    pub texture_id: Option<usize>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            diffuse: Color::WHITE,
            texture_id: None,
        }
    }

    pub fn with_texture(name: &str, texture_id: usize) -> Self {
        Self {
            texture_id: Some(texture_id),
            ..Self::new(name)
        }
    }
}

/// Shading mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingMode {
    None, // Brightest palette for every face
    Flat, // One palette per face, from the view-space normal
}

/// Rasterizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Backface culling
    pub backface_cull: bool,
    /// Clip triangles against all five frustum planes instead of the
    /// near and first side plane only
    pub clip_all_planes: bool,
    /// Shading mode
    pub shading: ShadingMode,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            backface_cull: true,
            clip_all_planes: false,
            shading: ShadingMode::Flat,
        }
    }
}
