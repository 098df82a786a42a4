//! OBJ/MTL import
//!
//! Supported OBJ directives: `v`, `vt`, `vn`, `f`, `g`, `mtllib`, `usemtl`.
//! Supported MTL directives: `newmtl`, `Kd`, `map_Kd`. Everything else is
//! ignored, and keywords match case-insensitively.
//!
//! Each `usemtl` starts a sub-mesh and each `g` starts a group under the
//! root; a sub-mesh lands in whichever group was open when it started.
//! Within a sub-mesh every distinct (position, uv, normal) triple becomes
//! one vertex.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::SplitWhitespace;

use crate::rasterizer::{AssetError, Color, Material, Texture, Vec2, Vec3};
use super::{Mesh, NodeKind, Scene, SceneNode};

fn read_asset(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Text following the directive keyword
fn rest<'a>(line: &'a str, keyword: &str) -> &'a str {
    line.trim_start()[keyword.len()..].trim()
}

/// Best-effort float fields; missing or malformed values read as 0
fn parse_floats<const N: usize>(fields: SplitWhitespace<'_>) -> [f32; N] {
    let mut out = [0.0; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field.parse().unwrap_or(0.0);
    }
    out
}

/// Resolve a 1-based (or negative, relative) OBJ index against a list
fn resolve(field: &str, len: usize) -> Option<usize> {
    let i: i64 = field.parse().ok()?;
    let idx = match i {
        0 => return None,
        i if i > 0 => i - 1,
        i => len as i64 + i,
    };
    (0..len as i64).contains(&idx).then_some(idx as usize)
}

/// File-wide attribute lists
#[derive(Default)]
struct Attributes {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
}

struct UniqueVertex {
    uv: Option<usize>,
    normal: Option<usize>,
    index: usize,
}

/// Sub-mesh under construction
struct SubMesh {
    material: Option<usize>,
    /// Placeholder node: group index under the root (None = root itself)
    /// and child index within it
    group: Option<usize>,
    child: usize,
    /// OBJ position index -> triples already emitted for it
    unique: HashMap<usize, Vec<UniqueVertex>>,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<usize>,
}

impl SubMesh {
    fn new(material: Option<usize>, group: Option<usize>, child: usize) -> Self {
        Self {
            material,
            group,
            child,
            unique: HashMap::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Index of the vertex for this triple, appending it on first use
    fn vertex(&mut self, pos: usize, uv: Option<usize>, normal: Option<usize>, attrs: &Attributes) -> usize {
        let chain = self.unique.entry(pos).or_default();
        if let Some(v) = chain.iter().find(|v| v.uv == uv && v.normal == normal) {
            return v.index;
        }

        let index = self.positions.len();
        self.positions.push(attrs.positions[pos]);
        self.uvs.push(uv.map_or(Vec2::ZERO, |i| attrs.uvs[i]));
        self.normals.push(normal.map_or(Vec3::ZERO, |i| attrs.normals[i]));
        chain.push(UniqueVertex { uv, normal, index });
        index
    }
}

struct ObjReader {
    attrs: Attributes,
    root: SceneNode,
    group: Option<usize>,
    current: Option<SubMesh>,
}

impl ObjReader {
    fn new() -> Self {
        Self {
            attrs: Attributes::default(),
            root: SceneNode::new(),
            group: None,
            current: None,
        }
    }

    fn begin_group(&mut self, name: &str) {
        let node = if name.is_empty() {
            SceneNode::new()
        } else {
            SceneNode::group(name)
        };
        self.root.children.push(node);
        self.group = Some(self.root.children.len() - 1);
    }

    /// Close the open sub-mesh and start one bound to `material`
    fn begin_submesh(&mut self, material: Option<usize>) {
        self.finish_submesh();
        let group = self.group;
        let parent = match group {
            Some(g) => &mut self.root.children[g],
            None => &mut self.root,
        };
        parent.children.push(SceneNode::new());
        let child = parent.children.len() - 1;
        self.current = Some(SubMesh::new(material, group, child));
    }

    fn finish_submesh(&mut self) {
        let Some(sub) = self.current.take() else {
            return;
        };
        let node = match sub.group {
            Some(g) => &mut self.root.children[g].children[sub.child],
            None => &mut self.root.children[sub.child],
        };
        match Mesh::from_parts(&sub.positions, &sub.normals, &sub.uvs, sub.indices, sub.material) {
            Ok(mesh) => node.kind = NodeKind::Mesh(mesh),
            Err(e) => log::debug!("Dropping sub-mesh: {}", e),
        }
    }

    fn face(&mut self, fields: SplitWhitespace<'_>, line_no: usize) {
        let mut corners = Vec::with_capacity(4);
        for field in fields {
            let mut parts = field.split('/');
            let pos = parts.next().and_then(|s| resolve(s, self.attrs.positions.len()));
            let uv = parts.next().and_then(|s| resolve(s, self.attrs.uvs.len()));
            let normal = parts.next().and_then(|s| resolve(s, self.attrs.normals.len()));
            let Some(pos) = pos else {
                log::debug!("line {}: bad face vertex '{}'", line_no, field);
                return;
            };
            corners.push((pos, uv, normal));
        }
        if corners.len() < 3 {
            log::debug!("line {}: face with {} vertices", line_no, corners.len());
            return;
        }

        if self.current.is_none() {
            self.begin_submesh(None);
        }
        let Some(sub) = self.current.as_mut() else {
            return;
        };
        let ids: Vec<usize> = corners
            .iter()
            .map(|&(pos, uv, normal)| sub.vertex(pos, uv, normal, &self.attrs))
            .collect();
        // fan
        for i in 1..ids.len() - 1 {
            sub.indices.extend_from_slice(&[ids[0], ids[i], ids[i + 1]]);
        }
    }

    fn finish(mut self) -> SceneNode {
        self.finish_submesh();
        self.root
    }
}

impl Scene {
    /// Import an OBJ file into a new node tree, loading the MTL libraries
    /// it names. The file's directory becomes the scene base path. An
    /// unreadable file yields an empty node.
    pub fn load_obj<P: AsRef<Path>>(&mut self, path: P, scale: f32) -> SceneNode {
        let path = path.as_ref();
        let source = match read_asset(path) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("{}", e);
                return SceneNode::new();
            }
        };

        self.base_path = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let node = self.load_obj_from_str(&source, scale);
        log::info!(
            "Loaded {}: {} meshes, {} materials, {} textures",
            path.display(),
            node.meshes().len(),
            self.materials.len(),
            self.textures.len()
        );
        node
    }

    /// Import OBJ text, resolving `mtllib` against the current base path
    pub fn load_obj_from_str(&mut self, source: &str, scale: f32) -> SceneNode {
        let mut obj = ObjReader::new();

        for (i, line) in source.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(keyword) = fields.next() else {
                continue;
            };
            match keyword.to_ascii_lowercase().as_str() {
                "v" => {
                    let [x, y, z] = parse_floats::<3>(fields);
                    obj.attrs.positions.push(Vec3::new(x, y, z) * scale);
                }
                "vt" => {
                    let [u, v] = parse_floats::<2>(fields);
                    obj.attrs.uvs.push(Vec2::new(u, 1.0 - v));
                }
                "vn" => {
                    let [x, y, z] = parse_floats::<3>(fields);
                    obj.attrs.normals.push(Vec3::new(x, y, z));
                }
                "f" => obj.face(fields, i + 1),
                "g" => obj.begin_group(rest(line, keyword)),
                "usemtl" => {
                    let name = rest(line, keyword);
                    let material = self.find_material(name);
                    if material.is_none() {
                        log::debug!("line {}: unknown material '{}'", i + 1, name);
                    }
                    obj.begin_submesh(material);
                }
                "mtllib" => {
                    for file in fields {
                        let mtl = self.base_path.join(file);
                        self.load_mtl(mtl);
                    }
                }
                _ => {}
            }
        }

        obj.finish()
    }

    /// Load an MTL file; an unreadable file adds nothing
    pub fn load_mtl<P: AsRef<Path>>(&mut self, path: P) {
        match read_asset(path.as_ref()) {
            Ok(source) => self.load_mtl_from_str(&source),
            Err(e) => log::warn!("{}", e),
        }
    }

    /// Parse MTL text. `map_Kd` paths resolve under `<base>/textures/`.
    pub fn load_mtl_from_str(&mut self, source: &str) {
        let mut current: Option<usize> = None;

        for (i, line) in source.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(keyword) = fields.next() else {
                continue;
            };
            match keyword.to_ascii_lowercase().as_str() {
                "newmtl" => {
                    current = Some(self.add_material(Material::new(rest(line, keyword))));
                }
                "kd" => {
                    if let Some(m) = current {
                        let [r, g, b] = parse_floats::<3>(fields);
                        self.materials[m].diffuse = Color::from_f32(r, g, b);
                    }
                }
                "map_kd" => {
                    let Some(m) = current else {
                        log::debug!("line {}: map_Kd before newmtl", i + 1);
                        continue;
                    };
                    let path = self.base_path.join("textures").join(rest(line, keyword));
                    self.materials[m].texture_id = self.texture_for(&path);
                }
                _ => {}
            }
        }
    }

    /// Shared texture for a resolved path, loading it on first use
    fn texture_for(&mut self, path: &Path) -> Option<usize> {
        let key = path.to_string_lossy();
        if let Some(id) = self.find_texture(&key) {
            return Some(id);
        }
        match Texture::from_file(path) {
            Ok(texture) => Some(self.add_texture(texture)),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }
}
