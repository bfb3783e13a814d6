//! Shared visualization utilities for the brush compiler demos.
//!
//! Map space is Z-up; macroquad is Y-up. Everything drawn here goes through
//! [`to_view`], and [`OrbitCamera::eye_point`] maps back.

use std::hash::{Hash, Hasher};

use brush_bsp::{BrushDef, CompileFace, Contents, FaceVisitor, Real, Winding};
use macroquad::models::{Mesh, Vertex, draw_mesh};
use macroquad::prelude::*;
use nalgebra::{Point3, Vector3};

pub mod navigator;
pub use navigator::TreeNavigator;

/// Installs a `tracing` subscriber honouring `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info,brush_bsp=debug".into()))
        .init();
}

/// Converts a map-space point to view space.
pub fn to_view(p: &Point3<Real>) -> Vec3 {
    vec3(p.x as f32, p.z as f32, -p.y as f32)
}

/// Generates a deterministic color for a face.
///
/// Pieces of the same surface share a color, so merged and unmerged faces
/// look alike and only the outlines show where splits happened.
pub fn face_color(face: &CompileFace) -> Color {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    face.plane_num.hash(&mut hasher);
    face.tex_info.hash(&mut hasher);
    let hash = hasher.finish();

    let r = (((hash >> 16) & 0xFF) as u8).max(40);
    let g = (((hash >> 8) & 0xFF) as u8).max(40);
    let b = ((hash & 0xFF) as u8).max(40);

    // Liquids are drawn translucent
    let alpha = if face.contents.intersects(Contents::LIQUID) { 140 } else { 255 };
    Color::from_rgba(r, g, b, alpha)
}

/// Draws a winding by fan triangulation.
pub fn draw_winding(winding: &Winding, color: Color) {
    let points = winding.points();
    if points.len() < 3 {
        return;
    }

    let vertices: Vec<Vertex> = points
        .iter()
        .map(|p| Vertex::new2(to_view(p), vec2(0.0, 0.0), color))
        .collect();

    let mut indices: Vec<u16> = Vec::with_capacity((points.len() - 2) * 3);
    for i in 1..points.len() - 1 {
        indices.push(0);
        indices.push(i as u16);
        indices.push((i + 1) as u16);
    }

    draw_mesh(&Mesh {
        vertices,
        indices,
        texture: None,
    });
}

/// Draws the edges of a winding.
pub fn draw_winding_outline(winding: &Winding, color: Color) {
    let points = winding.points();
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        draw_line_3d(to_view(p), to_view(q), color);
    }
}

pub fn draw_face(face: &CompileFace, outline: bool) {
    draw_winding(&face.winding, face_color(face));
    if outline {
        draw_winding_outline(&face.winding, Color::from_rgba(0, 0, 0, 160));
    }
}

/// Visitor that draws faces as they are visited.
pub struct RenderVisitor {
    pub outline: bool,
    pub drawn: usize,
}

impl RenderVisitor {
    pub fn new(outline: bool) -> Self {
        Self { outline, drawn: 0 }
    }
}

impl FaceVisitor for RenderVisitor {
    fn visit(&mut self, faces: &[CompileFace]) {
        for face in faces {
            draw_face(face, self.outline);
        }
        self.drawn += faces.len();
    }
}

/// A hollow box room: six wall brushes around the given interior.
pub fn room_brushes(mins: Point3<Real>, maxs: Point3<Real>, thickness: Real) -> Vec<BrushDef> {
    let t = Vector3::repeat(thickness);
    let outer_min = mins - t;
    let outer_max = maxs + t;

    let wall = |lo: [Real; 3], hi: [Real; 3]| BrushDef::cuboid(Point3::from(lo), Point3::from(hi), Contents::SOLID);
    vec![
        wall([outer_min.x, outer_min.y, outer_min.z], [outer_max.x, outer_max.y, mins.z]),
        wall([outer_min.x, outer_min.y, maxs.z], [outer_max.x, outer_max.y, outer_max.z]),
        wall([outer_min.x, outer_min.y, mins.z], [mins.x, outer_max.y, maxs.z]),
        wall([maxs.x, outer_min.y, mins.z], [outer_max.x, outer_max.y, maxs.z]),
        wall([mins.x, outer_min.y, mins.z], [maxs.x, mins.y, maxs.z]),
        wall([mins.x, maxs.y, mins.z], [maxs.x, outer_max.y, maxs.z]),
    ]
}

/// Simple orbit camera for 3D scene navigation.
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub target: Vec3,
    /// Multiplier for scroll wheel zoom
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            distance,
            yaw,
            pitch,
            target: vec3(0.0, 0.0, 0.0),
            zoom_speed: 5.0,
            min_distance: 10.0,
            max_distance: 200.0,
        }
    }

    /// Sets the zoom configuration (speed and distance limits).
    pub fn with_zoom(mut self, speed: f32, min: f32, max: f32) -> Self {
        self.zoom_speed = speed;
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Sets the orbit target, in map space.
    pub fn with_target(mut self, target: Point3<Real>) -> Self {
        self.target = to_view(&target);
        self
    }

    /// Updates camera state from mouse drag, scroll and arrow keys.
    pub fn update(&mut self) {
        if is_mouse_button_down(MouseButton::Left) {
            let delta = mouse_delta_position();
            self.yaw -= delta.x * 2.0;
            self.pitch -= delta.y * 2.0;
        }

        self.pitch = self.pitch.clamp(-1.5, 1.5);

        let scroll = mouse_wheel().1;
        self.distance -= scroll * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);

        if is_key_down(KeyCode::Left) {
            self.yaw += 0.02;
        }
        if is_key_down(KeyCode::Right) {
            self.yaw -= 0.02;
        }
        if is_key_down(KeyCode::Up) {
            self.pitch += 0.02;
        }
        if is_key_down(KeyCode::Down) {
            self.pitch -= 0.02;
        }
    }

    /// Camera position in view space.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + vec3(x, y, z)
    }

    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: vec3(0.0, 1.0, 0.0),
            target: self.target,
            ..Default::default()
        }
    }

    /// Returns the eye point in map space for tree traversal.
    pub fn eye_point(&self) -> Point3<Real> {
        let pos = self.position();
        Point3::new(pos.x as Real, -pos.z as Real, pos.y as Real)
    }
}
