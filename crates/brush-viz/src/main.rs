use brush_bsp::{BrushDef, CompileOptions, Contents, compile};
use brush_viz::{OrbitCamera, TreeNavigator, init_logging, room_brushes};
use macroquad::prelude::*;
use nalgebra::{Point3, Vector3};
use tracing::{error, info};

/// A room with a pillar through the floor, a detail crate and a pool.
fn demo_brushes() -> Vec<BrushDef> {
    let mut brushes = room_brushes(Point3::new(0.0, 0.0, 0.0), Point3::new(256.0, 256.0, 128.0), 16.0);

    // Pillar overlapping floor and ceiling, carved by CSG
    brushes.push(BrushDef::cuboid(
        Point3::new(112.0, 112.0, -8.0),
        Point3::new(144.0, 144.0, 136.0),
        Contents::SOLID,
    ));

    // A crate with one bevelled corner
    brushes.push(
        BrushDef::cuboid(
            Point3::new(32.0, 32.0, 0.0),
            Point3::new(80.0, 80.0, 48.0),
            Contents::SOLID | Contents::DETAIL,
        )
        .with_side(Vector3::new(1.0, 1.0, 0.0), 140.0, 3),
    );

    brushes.push(BrushDef::cuboid(
        Point3::new(176.0, 32.0, 0.0),
        Point3::new(240.0, 96.0, 24.0),
        Contents::WATER,
    ));
    brushes
}

#[macroquad::main("Brush Compiler")]
async fn main() {
    init_logging();

    let options = CompileOptions {
        preserve_detail: true,
        ..Default::default()
    };
    let output = match compile(&demo_brushes(), &options) {
        Ok(output) => output,
        Err(err) => {
            error!(%err, "compile failed");
            return;
        }
    };
    info!(
        fragments = output.stats.csg_fragments,
        nodes = output.stats.nodes,
        faces = output.stats.final_faces,
        valid = output.report.as_ref().is_some_and(|r| r.valid),
        "scene ready"
    );

    let mut camera = OrbitCamera::new(400.0, 0.6, 0.5)
        .with_zoom(20.0, 50.0, 1200.0)
        .with_target(Point3::new(128.0, 128.0, 64.0));
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
        let drawn = navigator.render(
            &output.tree,
            &output.assignment,
            &output.planes,
            &camera.eye_point(),
            outline,
        );
        set_default_camera();

        let stats = &output.stats;
        draw_text(
            &format!(
                "Brushes: {} -> {} fragments | Faces: {} ({} before merge)",
                stats.input_brushes, stats.csg_fragments, stats.final_faces, stats.extracted_faces
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!(
                "Nodes: {} | Leafs: {} | Depth: {} | Drawn: {}",
                stats.nodes, stats.leafs, stats.tree_depth, drawn
            ),
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
