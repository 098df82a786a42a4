//! Scene: the node tree plus the material and texture lists it refers to
//!
//! Meshes reference materials, and materials reference textures, by index
//! into these lists. Textures are shared by resolved path.

mod mesh;
mod graph;
mod import;
mod config;

pub use mesh::*;
pub use graph::*;
pub use config::*;

use std::path::{Path, PathBuf};

use crate::rasterizer::{Material, Texture};

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub root: SceneNode,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    /// Directory relative asset paths resolve against
    pub base_path: PathBuf,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import an OBJ file and attach it under the root
    pub fn add<P: AsRef<Path>>(&mut self, path: P, scale: f32) -> &mut SceneNode {
        let node = self.load_obj(path, scale);
        self.root.add(node)
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_texture(&mut self, texture: Texture) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    /// Latest material with this name. A later `newmtl` of the same name
    /// shadows earlier ones.
    pub fn find_material(&self, name: &str) -> Option<usize> {
        self.materials
            .iter()
            .rposition(|m| m.name.as_deref() == Some(name))
    }

    /// Texture loaded from this resolved path
    pub fn find_texture(&self, name: &str) -> Option<usize> {
        self.textures.iter().position(|t| t.name == name)
    }
}
