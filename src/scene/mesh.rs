//! Indexed triangle mesh
//!
//! Vertex attributes live in two contiguous blocks: positions (object
//! space, camera space, normal) and 2D coordinates (uv, screen). The camera
//! and screen thirds are per-frame scratch written by `transform_vertices`.

use thiserror::Error;

use crate::rasterizer::{project, Aabb, Mat4, Vec2, Vec3, NEAR_PLANE};

/// Errors from building a mesh out of raw attribute arrays
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("attribute counts differ: {positions} positions, {normals} normals, {uvs} uvs")]
    LengthMismatch {
        positions: usize,
        normals: usize,
        uvs: usize,
    },
    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: usize, vertex_count: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertex_count: usize,
    vertices: Vec<Vec3>,
    coords: Vec<Vec2>,
    face_normals: Vec<Vec3>,
    indices: Vec<usize>,
    /// Object-space bounding box
    pub bounds: Aabb,
    /// Index into the scene material list
    pub material: Option<usize>,
}

impl Mesh {
    /// Build a mesh, computing per-face normals and bounds. Face normals
    /// follow the winding but are flipped to agree with the second
    /// vertex normal of the triangle.
    pub fn from_parts(
        positions: &[Vec3],
        normals: &[Vec3],
        uvs: &[Vec2],
        indices: Vec<usize>,
        material: Option<usize>,
    ) -> Result<Self, MeshError> {
        let v = positions.len();
        if normals.len() != v || uvs.len() != v {
            return Err(MeshError::LengthMismatch {
                positions: v,
                normals: normals.len(),
                uvs: uvs.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= v) {
            return Err(MeshError::IndexOutOfRange { index, vertex_count: v });
        }

        let mut vertices = Vec::with_capacity(v * 3);
        vertices.extend_from_slice(positions);
        vertices.extend_from_slice(positions);
        vertices.extend_from_slice(normals);

        let mut coords = Vec::with_capacity(v * 2);
        coords.extend_from_slice(uvs);
        coords.resize(v * 2, Vec2::ZERO);

        let face_normals = indices
            .chunks_exact(3)
            .map(|t| {
                let (p0, p1, p2) = (positions[t[0]], positions[t[1]], positions[t[2]]);
                let n = (p1 - p0).cross(p2 - p0).normalize();
                if n.dot(normals[t[1]]) < 0.0 {
                    -n
                } else {
                    n
                }
            })
            .collect();

        Ok(Self {
            vertex_count: v,
            vertices,
            coords,
            face_normals,
            indices,
            bounds: Aabb::from_points(positions),
            material,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Object-space positions
    pub fn positions(&self) -> &[Vec3] {
        &self.vertices[..self.vertex_count]
    }

    /// Camera-space positions from the last `transform_vertices`
    pub fn transformed(&self) -> &[Vec3] {
        &self.vertices[self.vertex_count..self.vertex_count * 2]
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.vertices[self.vertex_count * 2..]
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.coords[..self.vertex_count]
    }

    /// Projected positions from the last `transform_vertices`
    pub fn screen_positions(&self) -> &[Vec2] {
        &self.coords[self.vertex_count..]
    }

    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    /// Triangle list, three vertex indices per face
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Transform every position into camera space and project the ones in
    /// front of the near plane onto a `width` x `height` screen
    pub fn transform_vertices(&mut self, transform: &Mat4, width: usize, height: usize) {
        let n = self.vertex_count;
        let (object, rest) = self.vertices.split_at_mut(n);
        let screen = &mut self.coords[n..];

        for ((p, c), s) in object.iter().zip(&mut rest[..n]).zip(screen) {
            *c = transform.transform_point(*p);
            if c.z < -NEAR_PLANE {
                *s = project(*c, width, height);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(normal: Vec3) -> Mesh {
        let positions = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, -1.0)];
        let uvs = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        Mesh::from_parts(&positions, &[normal; 3], &uvs, vec![0, 1, 2], Some(3)).unwrap()
    }

    #[test]
    fn test_blocks_and_bounds() {
        let mesh = triangle(Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.positions(), mesh.transformed());
        assert_eq!(mesh.normals().len(), 3);
        assert_eq!(mesh.uvs()[1], Vec2::new(1.0, 0.0));
        assert_eq!(mesh.screen_positions().len(), 3);
        assert_eq!(mesh.bounds.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(mesh.bounds.max, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(mesh.material, Some(3));
    }

    #[test]
    fn test_face_normal_follows_vertex_normals() {
        let front = triangle(Vec3::new(0.0, 0.0, 1.0)).face_normals()[0];
        let back = triangle(Vec3::new(0.0, 0.0, -1.0)).face_normals()[0];
        assert!(front.z > 0.0);
        assert!((front.len() - 1.0).abs() < 1e-5);
        assert_eq!(back, -front);
    }

    #[test]
    fn test_rejects_bad_input() {
        let p = [Vec3::ZERO; 3];
        let n = [Vec3::UP; 3];
        let uv = [Vec2::ZERO; 3];
        assert_eq!(
            Mesh::from_parts(&p, &n, &uv, vec![0, 1, 3], None).unwrap_err(),
            MeshError::IndexOutOfRange { index: 3, vertex_count: 3 }
        );
        assert_eq!(
            Mesh::from_parts(&p, &n, &uv, vec![0, 1], None).unwrap_err(),
            MeshError::PartialTriangle(2)
        );
        assert!(matches!(
            Mesh::from_parts(&p, &n[..2], &uv, vec![], None),
            Err(MeshError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_transform_writes_camera_and_screen_scratch() {
        let mut mesh = triangle(Vec3::new(0.0, 0.0, 1.0));
        let before = mesh.screen_positions().to_vec();
        mesh.transform_vertices(&Mat4::translation(Vec3::new(0.0, 0.0, -4.0)), 640, 480);
        assert_eq!(mesh.transformed()[1], Vec3::new(1.0, 0.0, -4.0));
        assert_eq!(mesh.positions()[1], Vec3::new(1.0, 0.0, 0.0));
        let s = mesh.screen_positions()[0];
        assert!((s.x - 320.0).abs() < 1e-4 && (s.y - 240.0).abs() < 1e-4);

        // behind the near plane the previous screen position is kept
        mesh.transform_vertices(&Mat4::translation(Vec3::new(0.0, 0.0, 4.0)), 640, 480);
        assert_eq!(mesh.screen_positions()[0], s);
        assert_ne!(before[0], s);
    }
}
