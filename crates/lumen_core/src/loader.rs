//! Scene loading: turns scene-description text into render tables.
//!
//! Directives are `MATERIAL <id>`, `OBJECT <id>` and `CAMERA`, each
//! followed by its property lines and a blank separator. Ids follow
//! declaration order: a MATERIAL id must equal the number of materials
//! loaded, an OBJECT id the number of objects declared so far. An object
//! rejected after its id was accepted keeps that id, so later objects
//! stay numbered as written.
//!
//! Two failure classes exist:
//! - [`LoadError`] is fatal: the scene file or a referenced mesh could not
//!   be read. Rendering without them is meaningless.
//! - [`EntityError`] is local: the offending block is logged, recorded in
//!   [`Scene::rejected`] and skipped, and loading carries on.

use std::fs;
use std::path::{Path, PathBuf};

use lumen_math::{Aabb, Mat4Ext, UVec2, Vec3};
use thiserror::Error;

use crate::mesh::{build_triangles, MeshImportError, MeshImporter, ObjImporter};
use crate::parser::{Line, SceneLexer};
use crate::scene::{
    Camera, Geom, GeomKind, ImplicitSurface, Material, RenderState, Scene, Transform, Triangle,
};

/// Property lines read after a `MATERIAL` header.
const MATERIAL_PROPERTY_LINES: usize = 8;

/// Scalar lines read after a `CAMERA` header, before the eye block.
const CAMERA_SCALAR_LINES: usize = 7;

/// Largest accumulation buffer a camera may request (8K is ~33M).
pub const MAX_IMAGE_PIXELS: u64 = 1 << 26;

/// Fatal errors that abort scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read scene file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to import mesh {}: {source}", path.display())]
    MeshImport {
        path: PathBuf,
        #[source]
        source: MeshImportError,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// A rejected entity. The loader logs it and continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error("line {line}: MATERIAL id {found} is out of sequence, expected {expected}")]
    MaterialOutOfSequence { line: usize, found: i64, expected: usize },

    #[error("line {line}: OBJECT id {found} is out of sequence, expected {expected}")]
    GeomOutOfSequence { line: usize, found: i64, expected: usize },

    #[error("line {line}: OBJECT is missing its geometry type")]
    MissingGeomType { line: usize },

    #[error("line {line}: unknown geometry type `{kind}`")]
    UnknownGeomType { line: usize, kind: String },

    #[error("line {line}: implicit OBJECT is missing its surface tag")]
    MissingImplicitSurface { line: usize },

    #[error("line {line}: unknown implicit surface `{tag}`")]
    UnknownImplicitSurface { line: usize, tag: String },

    #[error("line {line}: obj OBJECT is missing its mesh path")]
    MissingMeshPath { line: usize },

    #[error("line {line}: CAMERA resolution {width}x{height} exceeds {} pixels", MAX_IMAGE_PIXELS)]
    ResolutionTooLarge { line: usize, width: u32, height: u32 },
}

/// Options for scene loading.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Directory that relative mesh paths are resolved against.
    /// `None` leaves them relative to the working directory.
    pub base_dir: Option<PathBuf>,
}

/// Load a scene file.
///
/// Relative mesh paths are resolved against the scene file's directory.
///
/// # Example
///
/// ```ignore
/// use lumen_core::load_scene;
///
/// let scene = load_scene("scenes/cornell.txt")?;
/// println!("{} geoms", scene.geom_count());
/// ```
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    log::info!("Reading scene from {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let options = LoadOptions {
        base_dir: path.parent().map(Path::to_path_buf),
    };
    load_scene_with_importer(&content, &options, &ObjImporter)
}

/// Load a scene from a string, importing meshes as OBJ files.
pub fn load_scene_from_str(content: &str, options: &LoadOptions) -> LoadResult<Scene> {
    load_scene_with_importer(content, options, &ObjImporter)
}

/// Load a scene from a string with a caller-supplied mesh importer.
pub fn load_scene_with_importer(
    content: &str,
    options: &LoadOptions,
    importer: &dyn MeshImporter,
) -> LoadResult<Scene> {
    SceneBuilder::new(content, options, importer).build()
}

enum BuildError {
    Entity(EntityError),
    Fatal(LoadError),
}

impl From<EntityError> for BuildError {
    fn from(err: EntityError) -> Self {
        Self::Entity(err)
    }
}

impl From<LoadError> for BuildError {
    fn from(err: LoadError) -> Self {
        Self::Fatal(err)
    }
}

/// Builds a [`Scene`] by pulling directives from a [`SceneLexer`].
pub struct SceneBuilder<'a> {
    lexer: SceneLexer,
    options: &'a LoadOptions,
    importer: &'a dyn MeshImporter,
    scene: Scene,
    /// Next OBJECT id. Objects rejected after their id was accepted still
    /// use it up, so this can run ahead of `scene.geoms.len()`.
    next_geom_id: usize,
    camera_seen: bool,
}

impl<'a> SceneBuilder<'a> {
    /// Create a builder over scene text.
    pub fn new(content: &str, options: &'a LoadOptions, importer: &'a dyn MeshImporter) -> Self {
        Self {
            lexer: SceneLexer::new(content),
            options,
            importer,
            scene: Scene::default(),
            next_geom_id: 0,
            camera_seen: false,
        }
    }

    /// Consume every directive and return the finished scene.
    pub fn build(mut self) -> LoadResult<Scene> {
        while let Some(header) = self.lexer.next_directive() {
            let result = match header.keyword() {
                "MATERIAL" => self.load_material(&header),
                "OBJECT" => self.load_geom(&header),
                "CAMERA" => self.load_camera(&header),
                other => {
                    log::debug!("line {}: ignoring `{}`", header.number, other);
                    continue;
                }
            };

            match result {
                Ok(()) => {}
                Err(BuildError::Entity(err)) => {
                    log::error!("{}", err);
                    let skipped = self.lexer.skip_block();
                    log::debug!(
                        "Skipped {} line(s) of rejected block, resuming after line {}",
                        skipped,
                        self.lexer.current_line()
                    );
                    self.scene.rejected.push(err);
                }
                Err(BuildError::Fatal(err)) => return Err(err),
            }
        }

        self.finish()
    }

    fn finish(self) -> LoadResult<Scene> {
        let scene = self.scene;

        if !self.camera_seen {
            log::warn!("Scene has no CAMERA block; render state is empty");
        }
        for geom in &scene.geoms {
            if geom.material_id >= scene.materials.len() {
                log::warn!(
                    "Geom {} links material {} but only {} material(s) exist",
                    geom.id,
                    geom.material_id,
                    scene.materials.len()
                );
            }
        }

        log::info!(
            "Loaded {} material(s), {} geom(s) ({} triangles), {} rejected",
            scene.material_count(),
            scene.geom_count(),
            scene.total_triangle_count(),
            scene.rejected.len()
        );
        Ok(scene)
    }

    fn load_material(&mut self, header: &Line) -> Result<(), BuildError> {
        let found = header.int(1);
        let expected = self.scene.materials.len();
        if found != expected as i64 {
            return Err(EntityError::MaterialOutOfSequence {
                line: header.number,
                found,
                expected,
            }
            .into());
        }

        log::info!("Loading material {}", expected);
        let mut material = Material {
            id: expected,
            ..Default::default()
        };

        for _ in 0..MATERIAL_PROPERTY_LINES {
            let Some(line) = self.lexer.next_block_line() else {
                break;
            };
            match line.keyword() {
                "RGB" => material.base_color = line.vec3(1),
                "SPECEX" => material.specular_exponent = line.float(1),
                "SPECRGB" => material.specular_color = line.vec3(1),
                "REFL" => material.reflective = line.float(1),
                "REFR" => material.refractive = line.float(1),
                "REFRIOR" => material.ior = line.float(1),
                "EMITTANCE" => material.emittance = line.float(1),
                "PROTEX" => material.procedural_texture = line.float(1) != 0.0,
                other => log::debug!("line {}: ignoring material key `{}`", line.number, other),
            }
        }

        if material.refractive > 0.0 && material.ior <= 0.0 {
            log::warn!(
                "Material {} is refractive but has index of refraction {}",
                material.id,
                material.ior
            );
        }
        if material.reflective + material.refractive > 1.0 {
            log::debug!(
                "Material {} has REFL + REFR = {} > 1",
                material.id,
                material.reflective + material.refractive
            );
        }

        self.scene.materials.push(material);
        Ok(())
    }

    fn load_geom(&mut self, header: &Line) -> Result<(), BuildError> {
        let found = header.int(1);
        let expected = self.next_geom_id;
        if found != expected as i64 {
            return Err(EntityError::GeomOutOfSequence {
                line: header.number,
                found,
                expected,
            }
            .into());
        }
        self.next_geom_id += 1;

        log::info!("Loading geom {}", expected);
        let type_line = self
            .lexer
            .next_block_line()
            .ok_or(EntityError::MissingGeomType {
                line: header.number,
            })?;

        let mut bounds = Aabb::EMPTY;
        let kind = match type_line.keyword() {
            "implicit" => GeomKind::Implicit(self.read_implicit_surface(&type_line)?),
            "obj" => GeomKind::TriangleMesh(self.read_mesh(&type_line, &mut bounds)?),
            "sphere" => GeomKind::Sphere,
            "cube" => GeomKind::Cube,
            other => {
                return Err(EntityError::UnknownGeomType {
                    line: type_line.number,
                    kind: other.to_string(),
                }
                .into())
            }
        };
        log::debug!("Geom {} is a {}", expected, kind.name());

        let material_id = self.read_material_link();
        log::info!("Connecting geom {} to material {}", expected, material_id);

        let transform = self.read_transform();
        let geom = Geom::new(expected, kind, material_id, transform, bounds);
        if geom.matrix.is_singular() {
            log::warn!(
                "Geom {} has a singular transform (scale {:?}); its inverse is unusable",
                geom.id,
                transform.scale
            );
        }

        self.scene.geoms.push(geom);
        Ok(())
    }

    /// Read the single surface tag that follows `implicit`.
    fn read_implicit_surface(&mut self, type_line: &Line) -> Result<ImplicitSurface, BuildError> {
        let line = self
            .lexer
            .next_block_line()
            .ok_or(EntityError::MissingImplicitSurface {
                line: type_line.number,
            })?;

        ImplicitSurface::from_tag(line.keyword()).ok_or_else(|| {
            EntityError::UnknownImplicitSurface {
                line: line.number,
                tag: line.keyword().to_string(),
            }
            .into()
        })
    }

    /// Read the mesh path line and import it, growing `bounds`.
    fn read_mesh(&mut self, type_line: &Line, bounds: &mut Aabb) -> Result<Vec<Triangle>, BuildError> {
        let line = self
            .lexer
            .next_block_line()
            .ok_or(EntityError::MissingMeshPath {
                line: type_line.number,
            })?;

        let path = self.resolve_mesh_path(&line.text);
        log::info!("Loading mesh {}", path.display());

        let mesh = self
            .importer
            .import(&path)
            .map_err(|source| LoadError::MeshImport {
                path: path.clone(),
                source,
            })?;

        Ok(build_triangles(&mesh, bounds))
    }

    fn resolve_mesh_path(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        match &self.options.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Read the `materialid N` line. Missing links default to material 0.
    fn read_material_link(&mut self) -> usize {
        match self.lexer.next_block_line() {
            Some(line) => {
                if line.keyword() != "materialid" {
                    log::debug!(
                        "line {}: expected `materialid`, found `{}`",
                        line.number,
                        line.keyword()
                    );
                }
                line.index(1)
            }
            None => 0,
        }
    }

    /// Read TRANS/ROTAT/SCALE lines up to the block separator.
    fn read_transform(&mut self) -> Transform {
        let mut transform = Transform::default();
        while let Some(line) = self.lexer.next_block_line() {
            match line.keyword() {
                "TRANS" => transform.translation = line.vec3(1),
                "ROTAT" => transform.rotation = line.vec3(1),
                "SCALE" => transform.scale = line.vec3(1),
                other => log::debug!("line {}: ignoring transform key `{}`", line.number, other),
            }
        }
        transform
    }

    fn load_camera(&mut self, header: &Line) -> Result<(), BuildError> {
        log::info!("Loading camera");
        if self.camera_seen {
            log::warn!("line {}: CAMERA redefined; the last one wins", header.number);
        }

        let mut state = RenderState::default();
        let mut camera = Camera::default();
        let mut fov_y = 0.0;

        for _ in 0..CAMERA_SCALAR_LINES {
            let at_eye_block = self
                .lexer
                .peek_block_line()
                .map_or(true, |line| is_eye_key(line.keyword()));
            if at_eye_block {
                break;
            }
            let Some(line) = self.lexer.next_block_line() else {
                break;
            };
            match line.keyword() {
                "RES" => camera.resolution = UVec2::new(line.uint(1), line.uint(2)),
                "FOVY" => fov_y = line.float(1),
                "ITERATIONS" => state.iterations = line.uint(1),
                "DEPTH" => state.trace_depth = line.uint(1),
                "FILE" => state.image_name = line.token(1).to_string(),
                "LENSRADIUS" => camera.lens_radius = line.float(1),
                "FOCALDIST" => camera.focal_distance = line.float(1),
                other => log::debug!("line {}: ignoring camera key `{}`", line.number, other),
            }
        }

        while let Some(line) = self.lexer.next_block_line() {
            match line.keyword() {
                "EYE" => camera.position = line.vec3(1),
                "LOOKAT" => camera.look_at = line.vec3(1),
                "UP" => camera.up = line.vec3(1),
                other => log::debug!("line {}: ignoring camera key `{}`", line.number, other),
            }
        }

        let (width, height) = (camera.resolution.x, camera.resolution.y);
        if u64::from(width) * u64::from(height) > MAX_IMAGE_PIXELS {
            return Err(EntityError::ResolutionTooLarge {
                line: header.number,
                width,
                height,
            }
            .into());
        }

        camera.derive_frame(fov_y);
        if camera.pixel_count() == 0 {
            log::warn!("Camera resolution is {}x{}", camera.resolution.x, camera.resolution.y);
        }

        state.image = vec![Vec3::ZERO; camera.pixel_count()];
        state.camera = camera;
        self.scene.state = state;
        self.camera_seen = true;

        log::info!("Loaded camera");
        Ok(())
    }
}

fn is_eye_key(keyword: &str) -> bool {
    matches!(keyword, "EYE" | "LOOKAT" | "UP")
}
