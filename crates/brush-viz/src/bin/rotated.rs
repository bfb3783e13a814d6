use brush_bsp::{BrushDef, CompileOptions, Contents, Real, compile};
use brush_viz::{OrbitCamera, TreeNavigator, init_logging};
use macroquad::prelude::*;
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use tracing::{error, info, warn};

const NUM_BRUSHES: usize = 10;
const WORLD_SIZE: Real = 30.0;
const MIN_BRUSH_SIZE: Real = 3.0;
const MAX_BRUSH_SIZE: Real = 8.0;

/// Simple seeded random number generator (LCG).
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_real(&mut self) -> Real {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((self.state >> 33) as Real) / (u32::MAX as Real / 2.0)
    }

    fn range(&mut self, min: Real, max: Real) -> Real {
        min + self.next_real() * (max - min)
    }
}

/// A cube brush rotated about its center.
fn rotated_cube(center: Point3<Real>, size: Real, rotation: &Rotation3<Real>) -> BrushDef {
    let half = size / 2.0;
    let axes: [Vector3<Real>; 6] = [Vector3::x(), -Vector3::x(), Vector3::y(), -Vector3::y(), Vector3::z(), -Vector3::z()];
    axes.iter().fold(BrushDef::new(Contents::SOLID), |def, axis| {
        let normal = rotation * axis;
        def.with_side(normal, normal.dot(&center.coords) + half, 0)
    })
}

/// Random rotated cubes, free to overlap each other.
fn random_rotated_brushes(seed: u64) -> Vec<BrushDef> {
    let mut rng = Rng::new(seed);

    (0..NUM_BRUSHES)
        .map(|_| {
            let center = Point3::new(
                (rng.next_real() - 0.5) * WORLD_SIZE,
                (rng.next_real() - 0.5) * WORLD_SIZE,
                (rng.next_real() - 0.5) * WORLD_SIZE,
            );
            let size = rng.range(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);

            let axis = Vector3::new(rng.next_real() - 0.5, rng.next_real() - 0.5, rng.next_real() - 0.5);
            let axis = if axis.norm() > 0.01 {
                Unit::new_normalize(axis)
            } else {
                Vector3::x_axis()
            };
            let angle = rng.next_real() * std::f64::consts::TAU;

            rotated_cube(center, size, &Rotation3::from_axis_angle(&axis, angle))
        })
        .collect()
}

#[macroquad::main("Rotated Brushes")]
async fn main() {
    init_logging();

    let brushes = random_rotated_brushes(42);
    info!(brushes = brushes.len(), "generated rotated brushes");

    let output = match compile(&brushes, &CompileOptions::default()) {
        Ok(output) => output,
        Err(err) => {
            error!(%err, "compile failed");
            return;
        }
    };
    if let Some(report) = output.report.as_ref().filter(|r| !r.valid) {
        for message in &report.errors {
            warn!("{message}");
        }
    }

    let mut camera = OrbitCamera::new(50.0, 0.0, 0.3).with_zoom(3.0, 10.0, 150.0);
    let mut navigator = TreeNavigator::new();
    let mut outline = true;

    loop {
        camera.update();
        navigator.update(&output.tree);
        if is_key_pressed(KeyCode::O) {
            outline = !outline;
        }

        clear_background(Color::from_rgba(15, 15, 25, 255));
        set_camera(&camera.to_camera3d());

        navigator.render(
            &output.tree,
            &output.assignment,
            &output.planes,
            &camera.eye_point(),
            outline,
        );

        // Map axes: X red, Y green, Z (up) blue
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(8.0, 0.0, 0.0), RED);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, -8.0), GREEN);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 8.0, 0.0), BLUE);

        set_default_camera();

        let stats = &output.stats;
        draw_text(
            &format!(
                "Rotated Brushes - {} brushes, {} fragments, {} faces",
                stats.input_brushes, stats.csg_fragments, stats.final_faces
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        let validity = match &output.report {
            Some(report) if report.valid => "valid".to_string(),
            Some(report) => format!("{} problems", report.errors.len()),
            None => "not checked".to_string(),
        };
        draw_text(
            &format!("Tree depth: {} | CSG: {}", stats.tree_depth, validity),
            10.0,
            45.0,
            18.0,
            GRAY,
        );

        navigator.draw_ui(&output.tree, &output.assignment, &output.planes, 70.0);

        draw_text("Drag mouse to rotate, scroll to zoom, [O]utlines", 10.0, 135.0, 16.0, DARKGRAY);
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 155.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
