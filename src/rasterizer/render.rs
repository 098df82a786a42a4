//! Frame rendering
//! Output surface, camera, and the scanline triangle pipeline

use super::clip::{frustum_planes, ClipVertex, Clipper, Plane};
use super::math::{Mat4, Vec3};
use super::types::{Color, Material, RasterSettings, ShadingMode, Texture};
use super::PALETTE_LEVELS;
use crate::scene::{Mesh, Scene};

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            self.put(y * self.width + x, color);
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let p = &self.pixels[idx..idx + 4];
        Some(Color::with_alpha(p[0], p[1], p[2], p[3]))
    }

    #[inline]
    fn put(&mut self, idx: usize, color: Color) {
        let i = idx * 4;
        self.pixels[i..i + 4].copy_from_slice(&color.to_bytes());
    }
}

/// Camera described by its world transform; the view matrix is its inverse
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Mat4,
}

impl Camera {
    /// Camera at the origin looking down -Z
    pub fn new() -> Self {
        Self {
            transform: Mat4::IDENTITY,
        }
    }

    pub fn set_position(&mut self, p: Vec3) {
        self.transform.cells[3] = p.x;
        self.transform.cells[7] = p.y;
        self.transform.cells[11] = p.z;
    }

    pub fn position(&self) -> Vec3 {
        let c = &self.transform.cells;
        Vec3::new(c[3], c[7], c[11])
    }

    pub fn right(&self) -> Vec3 {
        let c = &self.transform.cells;
        Vec3::new(c[0], c[4], c[8])
    }

    pub fn up(&self) -> Vec3 {
        let c = &self.transform.cells;
        Vec3::new(c[1], c[5], c[9])
    }

    pub fn forward(&self) -> Vec3 {
        let c = &self.transform.cells;
        Vec3::new(-c[2], -c[6], -c[10])
    }

    /// Aim the camera at `target` keeping world +Y up. Looking straight up
    /// or down leaves a degenerate basis and the frame is skipped.
    pub fn look_at(&mut self, target: Vec3) {
        let back = (self.position() - target).normalize();
        let right = Vec3::UP.cross(back).normalize();
        let up = back.cross(right).normalize();

        let c = &mut self.transform.cells;
        c[0] = right.x;
        c[4] = right.y;
        c[8] = right.z;
        c[1] = up.x;
        c[5] = up.y;
        c[9] = up.z;
        c[2] = back.x;
        c[6] = back.y;
        c[10] = back.z;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Mesh nodes reached by the traversal
    pub meshes: usize,
    /// Meshes rejected by the bounding box test
    pub meshes_culled: usize,
    /// Meshes skipped for lack of a bound texture
    pub meshes_untextured: usize,
    /// Triangles that entered the per-triangle stage
    pub triangles: usize,
    pub triangles_backfaced: usize,
    /// Triangles clipped away entirely
    pub triangles_clipped: usize,
    pub triangles_drawn: usize,
    pub pixels_written: usize,
}

/// Per-row edge tables: left/right x bounds with their inverse depth and
/// depth-weighted u/v. Rows outside the current triangle hold the empty
/// sentinel (left bound past the right one).
struct SpanTables {
    x_left: Vec<f32>,
    x_right: Vec<f32>,
    u_left: Vec<f32>,
    u_right: Vec<f32>,
    v_left: Vec<f32>,
    v_right: Vec<f32>,
    z_left: Vec<f32>,
    z_right: Vec<f32>,
    empty_left: f32,
}

impl SpanTables {
    fn new(width: usize, height: usize) -> Self {
        let empty_left = width.saturating_sub(1) as f32;
        Self {
            x_left: vec![empty_left; height],
            x_right: vec![0.0; height],
            u_left: vec![0.0; height],
            u_right: vec![0.0; height],
            v_left: vec![0.0; height],
            v_right: vec![0.0; height],
            z_left: vec![0.0; height],
            z_right: vec![0.0; height],
            empty_left,
        }
    }

    fn reset_rows(&mut self, first: i32, last: i32) {
        for y in first..=last {
            self.x_left[y as usize] = self.empty_left;
            self.x_right[y as usize] = 0.0;
        }
    }
}

/// Scanline rasterizer. Owns the scene and the render scratch state
/// (depth buffer, frustum, span tables), all sized once by `new`.
pub struct Rasterizer {
    pub scene: Scene,
    pub settings: RasterSettings,
    /// Counters from the last `render`
    pub stats: RenderStats,
    width: usize,
    height: usize,
    /// Inverse camera-space depth per pixel; 0.0 is infinitely far
    zbuffer: Vec<f32>,
    frustum: [Plane; 5],
    spans: SpanTables,
    clipper: Clipper,
}

impl Rasterizer {
    /// Size the scratch state for `target`
    pub fn new(target: &Framebuffer) -> Self {
        let (width, height) = (target.width, target.height);
        Self {
            scene: Scene::new(),
            settings: RasterSettings::default(),
            stats: RenderStats::default(),
            width,
            height,
            zbuffer: vec![0.0; width * height],
            frustum: frustum_planes(width, height),
            spans: SpanTables::new(width, height),
            clipper: Clipper::new(),
        }
    }

    /// Draw one frame of the scene as seen from `camera`
    pub fn render(&mut self, camera: &Camera, target: &mut Framebuffer) {
        self.stats = RenderStats::default();
        if target.width != self.width || target.height != self.height {
            log::warn!(
                "Render target is {}x{} but the rasterizer was sized for {}x{}",
                target.width, target.height, self.width, self.height
            );
            return;
        }

        self.zbuffer.fill(0.0);
        let Some(view) = camera.transform.inverse() else {
            log::debug!("Camera transform is singular, skipping frame");
            return;
        };

        let mut ctx = RenderContext {
            settings: &self.settings,
            frustum: &self.frustum,
            materials: &self.scene.materials,
            textures: &self.scene.textures,
            zbuffer: &mut self.zbuffer,
            spans: &mut self.spans,
            clipper: &mut self.clipper,
            stats: &mut self.stats,
            target,
        };
        self.scene.root.render(&view, &mut ctx);

        log::trace!("{:?}", self.stats);
    }

    /// Camera-space depth stored at a pixel (negative, the camera looks
    /// down -Z), or None where nothing was drawn
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let z = self.zbuffer[y * self.width + x];
        if z == 0.0 {
            None
        } else {
            Some(1.0 / z)
        }
    }
}

/// Borrowed render state handed down the scene graph for one frame
pub struct RenderContext<'a> {
    settings: &'a RasterSettings,
    frustum: &'a [Plane; 5],
    materials: &'a [Material],
    textures: &'a [Texture],
    zbuffer: &'a mut [f32],
    spans: &'a mut SpanTables,
    clipper: &'a mut Clipper,
    stats: &'a mut RenderStats,
    target: &'a mut Framebuffer,
}

impl RenderContext<'_> {
    /// Rasterize a mesh whose object space maps to camera space by `transform`
    pub fn draw_mesh(&mut self, mesh: &mut Mesh, transform: &Mat4) {
        self.stats.meshes += 1;

        // Whole-mesh reject: every bbox corner outside one plane
        let corners = mesh.bounds.corners().map(|c| transform.transform_point(c));
        let separated = self
            .frustum
            .iter()
            .any(|plane| corners.iter().all(|&c| plane.distance(c) < 0.0));
        if separated {
            self.stats.meshes_culled += 1;
            return;
        }

        mesh.transform_vertices(transform, self.target.width, self.target.height);

        let (materials, textures) = (self.materials, self.textures);
        let texture = mesh
            .material
            .and_then(|m| materials.get(m))
            .and_then(|m| m.texture_id)
            .and_then(|t| textures.get(t));
        let Some(texture) = texture else {
            self.stats.meshes_untextured += 1;
            return;
        };

        let frustum = self.frustum;
        let planes: &[Plane] = if self.settings.clip_all_planes {
            &frustum[..]
        } else {
            &frustum[..2]
        };
        let (w, h) = (self.target.width as f32, self.target.height as f32);
        let camera_space = mesh.transformed();
        let uvs = mesh.uvs();

        for (tri, normal) in mesh.indices().chunks_exact(3).zip(mesh.face_normals()) {
            self.stats.triangles += 1;

            let nt = transform.transform_vector(*normal);
            if self.settings.backface_cull && camera_space[tri[0]].dot(nt) >= 0.0 {
                self.stats.triangles_backfaced += 1;
                continue;
            }

            self.clipper.load(&[
                ClipVertex::new(camera_space[tri[0]], uvs[tri[0]]),
                ClipVertex::new(camera_space[tri[1]], uvs[tri[1]]),
                ClipVertex::new(camera_space[tri[2]], uvs[tri[2]]),
            ]);
            if self.clipper.clip(planes).is_empty() {
                self.stats.triangles_clipped += 1;
                continue;
            }

            let level = match self.settings.shading {
                ShadingMode::None => PALETTE_LEVELS - 1,
                ShadingMode::Flat => (nt.z.clamp(0.0, 1.0) * (PALETTE_LEVELS - 1) as f32) as usize,
            };
            let palette = texture.shaded_palette(level);

            // Project in place, keeping camera z for the inverse depth
            for v in self.clipper.vertices_mut() {
                let z = v.pos.z;
                v.pos.x = v.pos.x * w / -z + w * 0.5;
                v.pos.y = v.pos.y * w / z + h * 0.5;
            }

            self.stats.pixels_written += fill_polygon(
                self.clipper.vertices(),
                texture,
                palette,
                self.spans,
                self.zbuffer,
                self.target,
            );
            self.stats.triangles_drawn += 1;
        }
    }
}

/// Scan-convert a projected convex polygon. Returns the number of pixels
/// that passed the depth test.
fn fill_polygon(
    verts: &[ClipVertex],
    texture: &Texture,
    palette: &[Color],
    spans: &mut SpanTables,
    zbuffer: &mut [f32],
    target: &mut Framebuffer,
) -> usize {
    let width = target.width as i32;
    let height = target.height as i32;
    let n = verts.len();
    let mut min_y = height - 1;
    let mut max_y = 0;

    // Edge walk
    for i in 0..n {
        let (mut a, mut b) = (verts[i], verts[(i + 1) % n]);
        if a.pos.y > b.pos.y {
            std::mem::swap(&mut a, &mut b);
        }
        let (y0, y1) = (a.pos.y, b.pos.y);
        if y0 == y1 || y0 >= height as f32 || y1 < 1.0 {
            continue;
        }

        let iy0 = (y0 as i32 + 1).max(1);
        let iy1 = (y1 as i32).min(height - 2);
        let rydiff = 1.0 / (y1 - y0);

        let (z0, z1) = (1.0 / a.pos.z, 1.0 / b.pos.z);
        let (u0, u1) = (a.uv.x * z0, b.uv.x * z1);
        let (v0, v1) = (a.uv.y * z0, b.uv.y * z1);
        let dx = (b.pos.x - a.pos.x) * rydiff;
        let dz = (z1 - z0) * rydiff;
        let du = (u1 - u0) * rydiff;
        let dv = (v1 - v0) * rydiff;

        // Prestep to the first row center below y0
        let f = iy0 as f32 - y0;
        let mut x = a.pos.x + dx * f;
        let mut z = z0 + dz * f;
        let mut u = u0 + du * f;
        let mut v = v0 + dv * f;

        for y in iy0..=iy1 {
            let row = y as usize;
            if x < spans.x_left[row] {
                spans.x_left[row] = x;
                spans.z_left[row] = z;
                spans.u_left[row] = u;
                spans.v_left[row] = v;
            }
            if x > spans.x_right[row] {
                spans.x_right[row] = x;
                spans.z_right[row] = z;
                spans.u_right[row] = u;
                spans.v_right[row] = v;
            }
            x += dx;
            z += dz;
            u += du;
            v += dv;
        }

        min_y = min_y.min(iy0);
        max_y = max_y.max(iy1);
    }

    let tw = texture.width as f32;
    let th = texture.height as f32;
    let umask = texture.width as i32 - 1;
    let vmask = texture.height as i32 - 1;
    let mut written = 0;

    // Span fill
    for y in min_y..=max_y {
        let row = y as usize;
        let (x0, x1) = (spans.x_left[row], spans.x_right[row]);
        let ix0 = (x0 as i32 + 1).max(1);
        let ix1 = (x1 as i32).min(width - 2);
        if ix0 > ix1 {
            continue;
        }

        let rxdiff = 1.0 / (x1 - x0);
        let dz = (spans.z_right[row] - spans.z_left[row]) * rxdiff;
        let du = (spans.u_right[row] - spans.u_left[row]) * rxdiff;
        let dv = (spans.v_right[row] - spans.v_left[row]) * rxdiff;

        let f = ix0 as f32 - x0;
        let mut z = spans.z_left[row] + dz * f;
        let mut u = spans.u_left[row] + du * f;
        let mut v = spans.v_left[row] + dv * f;

        let line = row * target.width;
        for x in ix0..=ix1 {
            let idx = line + x as usize;
            if z < zbuffer[idx] {
                let depth = 1.0 / z;
                let tu = ((u * depth * tw) as i32 & umask) as usize;
                let tv = ((v * depth * th) as i32 & vmask) as usize;
                let color = texture
                    .indices
                    .get(tv * texture.width + tu)
                    .and_then(|&i| palette.get(i as usize))
                    .copied()
                    .unwrap_or(Color::BLACK);
                target.put(idx, color);
                zbuffer[idx] = z;
                written += 1;
            }
            z += dz;
            u += du;
            v += dv;
        }
    }

    spans.reset_rows(min_y, max_y);
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Vec2;
    use crate::scene::SceneNode;

    fn solid_material(scene: &mut Scene, color: Color) -> usize {
        let name = format!("solid{}", scene.textures.len());
        let tex = scene.add_texture(Texture::from_indexed(name.as_str(), 1, 1, vec![0], vec![color]));
        scene.add_material(Material::with_texture(&name, tex))
    }

    /// Square in the plane `z`, facing +Z (towards the default camera)
    fn square(z: f32, half: f32, normal_z: f32, material: Option<usize>) -> Mesh {
        let positions = [
            Vec3::new(-half, -half, z),
            Vec3::new(half, -half, z),
            Vec3::new(half, half, z),
            Vec3::new(-half, half, z),
        ];
        let normals = [Vec3::new(0.0, 0.0, normal_z); 4];
        let uvs = [Vec2::ZERO; 4];
        Mesh::from_parts(&positions, &normals, &uvs, vec![0, 1, 2, 0, 2, 3], material).unwrap()
    }

    fn setup(size: usize) -> (Rasterizer, Framebuffer) {
        let fb = Framebuffer::new(size, size);
        (Rasterizer::new(&fb), fb)
    }

    fn spans_are_clear(r: &Rasterizer) -> bool {
        r.spans.x_left.iter().all(|&x| x == r.spans.empty_left) && r.spans.x_right.iter().all(|&x| x == 0.0)
    }

    #[test]
    fn test_camera_look_at_basis() {
        let mut cam = Camera::new();
        cam.set_position(Vec3::new(0.0, 0.0, 5.0));
        cam.look_at(Vec3::ZERO);
        let f = cam.forward();
        assert!((f.z + 1.0).abs() < 1e-5);
        assert!((cam.right().x - 1.0).abs() < 1e-5);
        assert!((cam.up().y - 1.0).abs() < 1e-5);
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, 5.0));

        // the world origin lands 5 units in front of the camera
        let view = cam.transform.inverse().unwrap();
        let p = view.transform_point(Vec3::ZERO);
        assert!((p.z + 5.0).abs() < 1e-5);
        // world +X stays on the right of the screen
        assert!(view.transform_point(Vec3::new(1.0, 0.0, 0.0)).x > 0.0);
    }

    #[test]
    fn test_nearer_fragment_wins_in_any_order() {
        let mut frames = Vec::new();
        for near_first in [false, true] {
            let (mut r, mut fb) = setup(64);
            let red = solid_material(&mut r.scene, Color::RED);
            let blue = solid_material(&mut r.scene, Color::BLUE);
            let far = SceneNode::with_mesh(square(-5.0, 1.0, 1.0, Some(red)));
            let near = SceneNode::with_mesh(square(-3.0, 0.5, 1.0, Some(blue)));
            if near_first {
                r.scene.root.add(near);
                r.scene.root.add(far);
            } else {
                r.scene.root.add(far);
                r.scene.root.add(near);
            }
            r.render(&Camera::new(), &mut fb);

            assert_eq!(fb.get_pixel(32, 32), Some(Color::BLUE));
            assert!((r.depth_at(32, 32).unwrap() + 3.0).abs() < 1e-3);
            assert_eq!(fb.get_pixel(20, 32), Some(Color::RED));
            assert!((r.depth_at(20, 32).unwrap() + 5.0).abs() < 1e-3);
            assert_eq!(r.depth_at(2, 2), None);
            assert_eq!(r.stats.triangles_drawn, 4);
            frames.push(fb.pixels.clone());
        }
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn test_child_composes_parent_transform() {
        let (mut r, mut fb) = setup(64);
        let red = solid_material(&mut r.scene, Color::RED);
        let mut parent = SceneNode::new();
        parent.set_position(Vec3::new(0.0, 0.0, -5.0));
        let mut child = SceneNode::with_mesh(square(0.0, 0.5, 1.0, Some(red)));
        child.set_position(Vec3::new(1.0, 0.0, 0.0));
        parent.add(child);
        r.scene.root.add(parent);
        r.render(&Camera::new(), &mut fb);

        // (1, 0, -5) projects to x = 64 / 5 + 32
        assert_eq!(fb.get_pixel(44, 32), Some(Color::RED));
        assert!((r.depth_at(44, 32).unwrap() + 5.0).abs() < 1e-3);
        assert_eq!(r.depth_at(32, 32), None);
        assert_eq!(r.stats.meshes, 1);
    }

    #[test]
    fn test_sibling_transforms_do_not_leak() {
        let (mut r, mut fb) = setup(64);
        let red = solid_material(&mut r.scene, Color::RED);
        let blue = solid_material(&mut r.scene, Color::BLUE);
        let green = solid_material(&mut r.scene, Color::GREEN);
        let mut parent = SceneNode::new();
        parent.set_position(Vec3::new(0.0, 0.0, -5.0));
        let mut shifted = SceneNode::with_mesh(square(0.0, 0.5, 1.0, Some(red)));
        shifted.set_position(Vec3::new(1.0, 0.0, 0.0));
        parent.add(shifted);
        parent.add(SceneNode::with_mesh(square(0.0, 0.5, 1.0, Some(blue))));
        // same depth as the blue square; equal depths keep the earlier fragment
        parent.add(SceneNode::with_mesh(square(0.0, 0.5, 1.0, Some(green))));
        r.scene.root.add(parent);
        r.render(&Camera::new(), &mut fb);

        assert_eq!(fb.get_pixel(44, 32), Some(Color::RED));
        assert_eq!(fb.get_pixel(32, 32), Some(Color::BLUE));
        assert!((r.depth_at(32, 32).unwrap() + 5.0).abs() < 1e-3);
        assert_eq!(r.stats.meshes, 3);
        assert_eq!(r.stats.triangles_drawn, 6);
    }

    #[test]
    fn test_intersecting_tilted_quads() {
        // a: z = -4 + x/2, b: z = -4 - x/2, crossing along x = 0
        fn tilted(slope: f32, material: usize) -> Mesh {
            let positions = [
                Vec3::new(-1.0, -1.0, -4.0 - slope),
                Vec3::new(1.0, -1.0, -4.0 + slope),
                Vec3::new(1.0, 1.0, -4.0 + slope),
                Vec3::new(-1.0, 1.0, -4.0 - slope),
            ];
            let normals = [Vec3::new(-slope, 0.0, 1.0).normalize(); 4];
            let uvs = [Vec2::ZERO; 4];
            Mesh::from_parts(&positions, &normals, &uvs, vec![0, 1, 2, 0, 2, 3], Some(material)).unwrap()
        }

        let mut frames = Vec::new();
        for a_first in [true, false] {
            let (mut r, mut fb) = setup(64);
            r.settings.shading = ShadingMode::None;
            let red = solid_material(&mut r.scene, Color::RED);
            let blue = solid_material(&mut r.scene, Color::BLUE);
            let a = SceneNode::with_mesh(tilted(0.5, red));
            let b = SceneNode::with_mesh(tilted(-0.5, blue));
            if a_first {
                r.scene.root.add(a);
                r.scene.root.add(b);
            } else {
                r.scene.root.add(b);
                r.scene.root.add(a);
            }
            r.render(&Camera::new(), &mut fb);
            assert_eq!(r.stats.triangles_drawn, 4);

            // both quads cover these columns; the nearer one flips at the seam
            for x in 22..=29 {
                assert_eq!(fb.get_pixel(x, 32), Some(Color::BLUE), "column {}", x);
            }
            for x in 35..=42 {
                assert_eq!(fb.get_pixel(x, 32), Some(Color::RED), "column {}", x);
            }

            // the stored depth is the nearer plane, and it varies along the span
            let left = r.depth_at(20, 32).unwrap();
            let right = r.depth_at(44, 32).unwrap();
            assert!((left + 3.66).abs() < 0.03, "left depth {}", left);
            assert!((right + 3.66).abs() < 0.03, "right depth {}", right);
            assert!(r.depth_at(28, 32).unwrap() < left);
            assert!(r.depth_at(36, 32).unwrap() < right);

            // keep the seam columns out of the comparison, depths tie there
            let mut pixels = fb.pixels.clone();
            for y in 0..64 {
                for x in 30..=34 {
                    let i = (y * 64 + x) * 4;
                    pixels[i..i + 4].fill(0);
                }
            }
            frames.push(pixels);
        }
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn test_texture_is_perspective_correct() {
        let (mut r, mut fb) = setup(128);
        r.settings.shading = ShadingMode::None;
        // texel column i is stored as red = 4 * i
        let palette: Vec<Color> = (0..64u8).map(|i| Color::new(i * 4, 0, 0)).collect();
        let tex = r.scene.add_texture(Texture::from_indexed("ramp", 64, 1, (0..64).collect(), palette));
        let mat = r.scene.add_material(Material::with_texture("ramp", tex));

        // floor strip at y = -1 receding from z = -2 (u = 0) to z = -10 (u = 1)
        let positions = [
            Vec3::new(-0.5, -1.0, -2.0),
            Vec3::new(0.5, -1.0, -2.0),
            Vec3::new(0.5, -1.0, -10.0),
            Vec3::new(-0.5, -1.0, -10.0),
        ];
        let normals = [Vec3::UP; 4];
        let uvs = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0)];
        let mesh = Mesh::from_parts(&positions, &normals, &uvs, vec![0, 1, 2, 0, 2, 3], Some(mat)).unwrap();
        r.scene.root.add(SceneNode::with_mesh(mesh));
        r.render(&Camera::new(), &mut fb);

        for y in 85..=120usize {
            // invert the projection of the floor plane at this row
            let z = -128.0 / (y as f32 - 64.0);
            let u = (-z - 2.0) / 8.0;
            let expected = (u * 64.0) as i32;
            let got = (fb.get_pixel(64, y).unwrap().r / 4) as i32;
            assert!((got - expected).abs() <= 1, "row {}: expected texel {}, got {}", y, expected, got);
        }
    }

    #[test]
    fn test_mesh_behind_camera_is_culled_before_triangles() {
        let (mut r, mut fb) = setup(64);
        let mat = solid_material(&mut r.scene, Color::WHITE);
        r.scene.root.add(SceneNode::with_mesh(square(5.0, 1.0, 1.0, Some(mat))));
        r.render(&Camera::new(), &mut fb);
        assert_eq!(r.stats.meshes, 1);
        assert_eq!(r.stats.meshes_culled, 1);
        assert_eq!(r.stats.triangles, 0);
        assert_eq!(r.stats.pixels_written, 0);
    }

    #[test]
    fn test_untextured_mesh_is_skipped() {
        let (mut r, mut fb) = setup(64);
        let plain = r.scene.add_material(Material::new("plain"));
        r.scene.root.add(SceneNode::with_mesh(square(-5.0, 1.0, 1.0, Some(plain))));
        r.scene.root.add(SceneNode::with_mesh(square(-5.0, 1.0, 1.0, None)));
        r.render(&Camera::new(), &mut fb);
        assert_eq!(r.stats.meshes_untextured, 2);
        assert_eq!(r.stats.triangles, 0);
        assert_eq!(r.depth_at(32, 32), None);
    }

    #[test]
    fn test_backfaces_are_culled() {
        let (mut r, mut fb) = setup(64);
        let mat = solid_material(&mut r.scene, Color::WHITE);
        r.scene.root.add(SceneNode::with_mesh(square(-5.0, 1.0, -1.0, Some(mat))));
        r.render(&Camera::new(), &mut fb);
        assert_eq!(r.stats.triangles_backfaced, 2);
        assert_eq!(r.stats.pixels_written, 0);

        r.settings.backface_cull = false;
        r.render(&Camera::new(), &mut fb);
        assert_eq!(r.stats.triangles_drawn, 2);
        assert!(r.stats.pixels_written > 0);
        // facing away selects the darkest palette
        assert_eq!(fb.get_pixel(32, 32), Some(Color::BLACK));
    }

    #[test]
    fn test_near_plane_crossing_and_full_clip() {
        for clip_all_planes in [false, true] {
            let (mut r, mut fb) = setup(64);
            r.settings.clip_all_planes = clip_all_planes;
            let mat = solid_material(&mut r.scene, Color::GREEN);
            // floor running from in front of the camera to behind it
            let positions = [
                Vec3::new(-20.0, -1.0, -20.0),
                Vec3::new(20.0, -1.0, -20.0),
                Vec3::new(20.0, -1.0, 5.0),
                Vec3::new(-20.0, -1.0, 5.0),
            ];
            let uvs = [Vec2::ZERO; 4];
            let mesh = Mesh::from_parts(&positions, &[Vec3::UP; 4], &uvs, vec![0, 1, 2, 0, 2, 3], Some(mat)).unwrap();
            r.scene.root.add(SceneNode::with_mesh(mesh));
            r.render(&Camera::new(), &mut fb);

            assert!(r.stats.triangles_drawn > 0);
            // lower half is floor, upper half is empty
            assert!(r.depth_at(32, 60).is_some());
            assert_eq!(r.depth_at(32, 10), None);
            // border rows and columns are never written
            assert_eq!(r.depth_at(0, 60), None);
            assert_eq!(r.depth_at(32, 63), None);
            assert!(spans_are_clear(&r));
        }
    }

    #[test]
    fn test_span_rows_reset_after_each_triangle() {
        let (mut r, mut fb) = setup(64);
        let mat = solid_material(&mut r.scene, Color::WHITE);
        r.scene.root.add(SceneNode::with_mesh(square(-4.0, 1.0, 1.0, Some(mat))));
        assert!(spans_are_clear(&r));
        r.render(&Camera::new(), &mut fb);
        assert!(r.stats.pixels_written > 0);
        assert!(spans_are_clear(&r));
    }

    #[test]
    fn test_second_frame_clears_depth() {
        let (mut r, mut fb) = setup(64);
        let mat = solid_material(&mut r.scene, Color::WHITE);
        r.scene.root.add(SceneNode::with_mesh(square(-4.0, 1.0, 1.0, Some(mat))));
        r.render(&Camera::new(), &mut fb);
        let first = r.stats.pixels_written;
        r.render(&Camera::new(), &mut fb);
        assert_eq!(r.stats.pixels_written, first);
    }

    #[test]
    fn test_singular_camera_skips_frame() {
        let (mut r, mut fb) = setup(64);
        let mat = solid_material(&mut r.scene, Color::WHITE);
        r.scene.root.add(SceneNode::with_mesh(square(-4.0, 1.0, 1.0, Some(mat))));
        let mut cam = Camera::new();
        cam.transform = Mat4::scale(Vec3::ZERO);
        r.render(&cam, &mut fb);
        assert_eq!(r.stats, RenderStats::default());
    }

    #[test]
    fn test_mismatched_target_is_ignored() {
        let (mut r, _) = setup(64);
        let mut other = Framebuffer::new(32, 32);
        r.render(&Camera::new(), &mut other);
        assert_eq!(r.stats.meshes, 0);
    }
}
