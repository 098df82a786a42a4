//! View frustum planes and Sutherland-Hodgman polygon clipping

use super::math::{Vec2, Vec3};
use super::{MAX_CLIP_VERTS, NEAR_PLANE};

/// Plane as normal + offset; a point is inside when `distance >= 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self { normal, offset }
    }

    /// Signed distance from the plane (positive = inside)
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.offset
    }
}

/// Build the five camera-space frustum planes for a `width` x `height`
/// target: near, left, bottom, right, top (screen y grows downward).
///
/// Side planes pass through the eye and two corner rays, each ray aimed at
/// a pixel center half a pixel inside the border. The camera looks down -Z.
pub fn frustum_planes(width: usize, height: usize) -> [Plane; 5] {
    let w = width as f32;
    let h = height as f32;
    let (x1, x2) = (0.5, w - 1.5);
    let (y1, y2) = (0.5, h - 1.5);
    let corner = |x: f32, y: f32| Vec3::new((w * 0.5 - x) / w, (h * 0.5 - y) / w, 1.0);

    let p1 = corner(x1, y1);
    let p2 = corner(x2, y1);
    let p3 = corner(x2, y2);
    let p4 = corner(x1, y2);
    let side = |a: Vec3, b: Vec3| Plane::new(a.cross(b - a).normalize(), 0.0);

    [
        Plane::new(Vec3::new(0.0, 0.0, -1.0), NEAR_PLANE),
        side(p1, p4),
        side(p2, p1),
        side(p3, p2),
        side(p4, p3),
    ]
}

/// Polygon vertex carried through clipping
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipVertex {
    pub pos: Vec3,
    pub uv: Vec2,
}

impl ClipVertex {
    pub fn new(pos: Vec3, uv: Vec2) -> Self {
        Self { pos, uv }
    }

    fn lerp(a: ClipVertex, b: ClipVertex, f: f32) -> Self {
        Self {
            pos: a.pos + (b.pos - a.pos) * f,
            uv: a.uv + (b.uv - a.uv) * f,
        }
    }
}

/// Double-buffered clip workspace, bounded to `MAX_CLIP_VERTS` vertices
pub struct Clipper {
    buffers: [[ClipVertex; MAX_CLIP_VERTS]; 2],
    current: usize,
    count: usize,
}

impl Clipper {
    pub fn new() -> Self {
        Self {
            buffers: [[ClipVertex::default(); MAX_CLIP_VERTS]; 2],
            current: 0,
            count: 0,
        }
    }

    /// Start a new polygon
    pub fn load(&mut self, verts: &[ClipVertex]) {
        let n = verts.len().min(MAX_CLIP_VERTS);
        self.current = 0;
        self.count = n;
        self.buffers[0][..n].copy_from_slice(&verts[..n]);
    }

    /// Clip the loaded polygon against each plane in turn. Returns the
    /// surviving polygon, empty when it lies entirely outside any plane.
    pub fn clip(&mut self, planes: &[Plane]) -> &[ClipVertex] {
        for plane in planes {
            if self.count == 0 {
                break;
            }
            let [b0, b1] = &mut self.buffers;
            let (src, dst) = if self.current == 0 { (&*b0, b1) } else { (&*b1, b0) };
            let nin = self.count;
            let mut nout = 0;
            let mut emit = |v: ClipVertex| {
                if nout < MAX_CLIP_VERTS {
                    dst[nout] = v;
                    nout += 1;
                }
            };

            for i in 0..nin {
                let a = src[(i + nin - 1) % nin];
                let b = src[i];
                let t1 = plane.distance(a.pos);
                let t2 = plane.distance(b.pos);
                if t1 < 0.0 && t2 >= 0.0 {
                    emit(ClipVertex::lerp(a, b, t1 / (t1 - t2)));
                    emit(b);
                } else if t1 >= 0.0 && t2 >= 0.0 {
                    emit(b);
                } else if t1 >= 0.0 && t2 < 0.0 {
                    emit(ClipVertex::lerp(a, b, t1 / (t1 - t2)));
                }
            }

            self.current = 1 - self.current;
            self.count = nout;
        }
        self.vertices()
    }

    pub fn vertices(&self) -> &[ClipVertex] {
        &self.buffers[self.current][..self.count]
    }

    pub fn vertices_mut(&mut self) -> &mut [ClipVertex] {
        &mut self.buffers[self.current][..self.count]
    }
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new()
    }
}
