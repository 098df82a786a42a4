//! Scene graph nodes

use crate::rasterizer::{Mat4, RenderContext, Vec3};
use super::mesh::Mesh;

/// What a node carries besides its transform
#[derive(Debug, Clone)]
pub enum NodeKind {
    Transform,
    Mesh(Mesh),
}

/// Axis order for Euler rotations; the matrices multiply left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EulerOrder {
    XYZ,
    XZY,
    YXZ,
    YZX,
    ZXY,
    ZYX,
}

impl EulerOrder {
    fn axes(self) -> [usize; 3] {
        match self {
            EulerOrder::XYZ => [0, 1, 2],
            EulerOrder::XZY => [0, 2, 1],
            EulerOrder::YXZ => [1, 0, 2],
            EulerOrder::YZX => [1, 2, 0],
            EulerOrder::ZXY => [2, 0, 1],
            EulerOrder::ZYX => [2, 1, 0],
        }
    }
}

/// Node owning a local transform and its children
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    pub local: Mat4,
    pub children: Vec<SceneNode>,
    pub kind: NodeKind,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneNode {
    /// Empty transform node
    pub fn new() -> Self {
        Self {
            name: None,
            local: Mat4::IDENTITY,
            children: Vec::new(),
            kind: NodeKind::Transform,
        }
    }

    pub fn group(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new()
        }
    }

    pub fn with_mesh(mesh: Mesh) -> Self {
        Self {
            kind: NodeKind::Mesh(mesh),
            ..Self::new()
        }
    }

    /// Append a child, returning it
    pub fn add(&mut self, child: SceneNode) -> &mut SceneNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Transform => None,
        }
    }

    pub fn set_position(&mut self, p: Vec3) {
        self.local.cells[3] = p.x;
        self.local.cells[7] = p.y;
        self.local.cells[11] = p.z;
    }

    pub fn position(&self) -> Vec3 {
        let c = &self.local.cells;
        Vec3::new(c[3], c[7], c[11])
    }

    /// Replace the rotation part with Euler angles (radians, indexed by
    /// axis) applied in `order`. Translation is untouched.
    pub fn set_rotation(&mut self, order: EulerOrder, angles: Vec3) {
        let angle = [angles.x, angles.y, angles.z];
        let rotation = order
            .axes()
            .iter()
            .map(|&axis| match axis {
                0 => Mat4::rotate_x(angle[0]),
                1 => Mat4::rotate_y(angle[1]),
                _ => Mat4::rotate_z(angle[2]),
            })
            .fold(Mat4::IDENTITY, |acc, m| acc * m);

        for row in 0..3 {
            for col in 0..3 {
                self.local.cells[row * 4 + col] = rotation.cells[row * 4 + col];
            }
        }
    }

    pub fn set_rotation_x(&mut self, angle: f32) {
        self.set_rotation(EulerOrder::XYZ, Vec3::new(angle, 0.0, 0.0));
    }

    pub fn set_rotation_y(&mut self, angle: f32) {
        self.set_rotation(EulerOrder::XYZ, Vec3::new(0.0, angle, 0.0));
    }

    pub fn set_rotation_z(&mut self, angle: f32) {
        self.set_rotation(EulerOrder::XYZ, Vec3::new(0.0, 0.0, angle));
    }

    /// Depth-first search by name
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }

    /// Meshes of this subtree in traversal order
    pub fn meshes(&self) -> Vec<&Mesh> {
        let mut out = Vec::new();
        self.collect_meshes(&mut out);
        out
    }

    fn collect_meshes<'a>(&'a self, out: &mut Vec<&'a Mesh>) {
        if let Some(mesh) = self.mesh() {
            out.push(mesh);
        }
        for child in &self.children {
            child.collect_meshes(out);
        }
    }

    /// Pre-order draw: compose `incoming * local`, draw this node's mesh,
    /// then the children in list order
    pub fn render(&mut self, incoming: &Mat4, ctx: &mut RenderContext) {
        let transform = *incoming * self.local;
        if let NodeKind::Mesh(mesh) = &mut self.kind {
            ctx.draw_mesh(mesh, &transform);
        }
        for child in &mut self.children {
            child.render(&transform, ctx);
        }
    }
}
