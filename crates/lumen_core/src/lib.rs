//! Lumen Core - Scene description loading for the Lumen path tracer.
//!
//! This crate provides:
//!
//! - **Scene tables**: `Material`, `Geom`, `Camera`, `RenderState`
//! - **Scene loading**: text scene parsing with OBJ mesh import
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::load_scene;
//!
//! let scene = load_scene("scenes/cornell.txt")?;
//! println!("Loaded {} materials, {} geoms",
//!     scene.material_count(),
//!     scene.geom_count());
//! ```

pub mod loader;
pub mod mesh;
pub mod parser;
pub mod scene;

// Re-export commonly used types
pub use loader::{
    load_scene, load_scene_from_str, load_scene_with_importer, EntityError, LoadError,
    LoadOptions, LoadResult,
};
pub use mesh::{MeshImportError, MeshImporter, ObjImporter};
pub use scene::{
    Camera, Geom, GeomKind, ImplicitSurface, Material, RenderState, Scene, Transform, Triangle,
};
