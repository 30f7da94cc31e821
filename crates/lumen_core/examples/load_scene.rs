//! Example: Load and inspect a scene file.
//!
//! Run with: cargo run --example load_scene -- assets/cornell.txt

use std::env;

use anyhow::Context;
use lumen_core::{load_scene, GeomKind, Scene};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: load_scene <path-to-scene-file>");
        println!("\nExamples:");
        println!("  cargo run --example load_scene -- assets/cornell.txt");
        println!("  cargo run --example load_scene -- assets/cornell_mesh.txt");
        return;
    }

    if let Err(e) = run(&args[1]) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(path: &str) -> anyhow::Result<()> {
    println!("Loading scene file: {}", path);
    let scene = load_scene(path).with_context(|| format!("loading {}", path))?;
    print_summary(&scene);
    Ok(())
}

fn print_summary(scene: &Scene) {
    println!("\n=== Scene ===");
    println!("Materials: {}", scene.material_count());
    println!("Geoms: {}", scene.geom_count());
    println!("Total triangles: {}", scene.total_triangle_count());

    println!("\n--- Materials ---");
    for material in &scene.materials {
        println!(
            "  [{}] rgb ({:.2}, {:.2}, {:.2}) refl {:.2} refr {:.2} ior {:.2} emit {:.2}",
            material.id,
            material.base_color.x,
            material.base_color.y,
            material.base_color.z,
            material.reflective,
            material.refractive,
            material.ior,
            material.emittance
        );
    }

    println!("\n--- Geoms ---");
    for geom in &scene.geoms {
        let pos = geom.matrix.transform_point3(lumen_math::Vec3::ZERO);
        let detail = match &geom.kind {
            GeomKind::Implicit(surface) => surface.tag().to_string(),
            GeomKind::TriangleMesh(triangles) => format!(
                "{} triangles, normals: {}",
                triangles.len(),
                triangles.iter().any(|t| t.has_normals())
            ),
            other => other.name().to_string(),
        };
        println!(
            "  [{}] {} -> material {} at ({:.2}, {:.2}, {:.2})",
            geom.id, detail, geom.material_id, pos.x, pos.y, pos.z
        );
        if !geom.bounds.is_empty() {
            let (min, max) = (geom.bounds.min(), geom.bounds.max());
            println!(
                "       Bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
                min.x, min.y, min.z, max.x, max.y, max.z
            );
        }
    }

    let state = &scene.state;
    let camera = &state.camera;
    println!("\n--- Camera ---");
    println!("  Resolution: {}x{}", camera.resolution.x, camera.resolution.y);
    println!("  FOV: {:.2} x {:.2} deg", camera.fov.x, camera.fov.y);
    println!(
        "  Eye: ({:.2}, {:.2}, {:.2})  View: ({:.2}, {:.2}, {:.2})",
        camera.position.x,
        camera.position.y,
        camera.position.z,
        camera.view.x,
        camera.view.y,
        camera.view.z
    );
    println!(
        "  Iterations: {}  Depth: {}  Output: {}",
        state.iterations, state.trace_depth, state.image_name
    );

    if !scene.rejected.is_empty() {
        println!("\n--- Rejected ---");
        for err in &scene.rejected {
            println!("  {}", err);
        }
    }
}
