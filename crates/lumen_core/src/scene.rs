//! Render-time scene tables.
//!
//! Everything in here is produced once by the loader and then shared
//! read-only by the intersection and shading stages for the whole render.

use bytemuck::{Pod, Zeroable};
use lumen_math::{compose_transform, Aabb, Mat4, Mat4Ext, UVec2, Vec2, Vec3};

use crate::loader::EntityError;

/// Surface description referenced by geoms through `material_id`.
///
/// Keys absent from the scene file stay at zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    /// Position in the material table; equals declaration order.
    pub id: usize,

    /// Diffuse/base color (RGB, 0-1)
    pub base_color: Vec3,

    /// Tint applied on specular reflection and transmission
    pub specular_color: Vec3,

    /// Phong-style specular exponent (carried for the shading stage)
    pub specular_exponent: f32,

    /// Probability weight of the mirror branch
    pub reflective: f32,

    /// Probability weight of the transmission branch
    pub refractive: f32,

    /// Index of refraction for the transmission branch
    pub ior: f32,

    /// Light emitted by the surface; zero for non-emitters
    pub emittance: f32,

    /// Procedural texture flag for the shading stage
    pub procedural_texture: bool,
}

impl Material {
    /// Check if this material emits light.
    pub fn is_emissive(&self) -> bool {
        self.emittance > 0.0
    }
}

/// Analytic surfaces selected by the `IMP_*` tags of an `implicit` object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImplicitSurface {
    Sphere,
    Mug,
    Coffee,
    BookCover,
    BookPages,
    Light,
}

impl ImplicitSurface {
    /// Look up a surface by its scene-file tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "IMP_SPHERE" => Some(Self::Sphere),
            "IMP_MUG" => Some(Self::Mug),
            "IMP_COFFEE" => Some(Self::Coffee),
            "IMP_BOOKCOVER" => Some(Self::BookCover),
            "IMP_BOOKPAGES" => Some(Self::BookPages),
            "IMP_LIGHT" => Some(Self::Light),
            _ => None,
        }
    }

    /// The scene-file tag for this surface.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Sphere => "IMP_SPHERE",
            Self::Mug => "IMP_MUG",
            Self::Coffee => "IMP_COFFEE",
            Self::BookCover => "IMP_BOOKCOVER",
            Self::BookPages => "IMP_BOOKPAGES",
            Self::Light => "IMP_LIGHT",
        }
    }
}

/// One mesh triangle in object space.
///
/// Normals are zero when the source mesh had none. Laid out for direct
/// upload to a device buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
}

impl Triangle {
    /// True if the source mesh supplied per-vertex normals.
    pub fn has_normals(&self) -> bool {
        self.normals.iter().any(|n| *n != Vec3::ZERO)
    }
}

/// Geometry type with any data the type owns.
#[derive(Clone, Debug, PartialEq)]
pub enum GeomKind {
    /// Unit sphere, resolved entirely through the transform
    Sphere,
    /// Unit cube, resolved entirely through the transform
    Cube,
    Implicit(ImplicitSurface),
    /// Imported mesh; the geom exclusively owns its triangles
    TriangleMesh(Vec<Triangle>),
}

impl GeomKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Cube => "cube",
            Self::Implicit(_) => "implicit",
            Self::TriangleMesh(_) => "obj",
        }
    }
}

/// Transform components as written in the scene file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Intrinsic XYZ Euler angles in degrees
    pub rotation: Vec3,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Convert to a 4x4 transformation matrix.
    pub fn to_matrix(&self) -> Mat4 {
        compose_transform(self.translation, self.rotation, self.scale)
    }
}

/// A scene object with its cached transforms.
///
/// The matrix, its inverse and inverse-transpose are computed once here
/// so intersection never inverts per ray.
#[derive(Clone, Debug, PartialEq)]
pub struct Geom {
    /// Declaration-order id from the OBJECT header. Objects rejected
    /// after their id was accepted leave a gap.
    pub id: usize,

    pub kind: GeomKind,

    /// Index into the material table. Not range-checked.
    pub material_id: usize,

    pub transform: Transform,

    /// Object to world
    pub matrix: Mat4,

    /// World to object
    pub inverse: Mat4,

    /// Inverse-transpose of `matrix`, for normals
    pub inverse_transpose: Mat4,

    /// Object-space bounds. Only meshes populate this; other kinds keep
    /// the empty sentinel box.
    pub bounds: Aabb,
}

impl Geom {
    /// Create a geom and cache its derived matrices.
    pub fn new(
        id: usize,
        kind: GeomKind,
        material_id: usize,
        transform: Transform,
        bounds: Aabb,
    ) -> Self {
        let matrix = transform.to_matrix();
        Self {
            id,
            kind,
            material_id,
            transform,
            matrix,
            inverse: matrix.inverse(),
            inverse_transpose: matrix.inverse_transpose(),
            bounds,
        }
    }

    /// Triangles owned by this geom (empty for non-mesh kinds).
    pub fn triangles(&self) -> &[Triangle] {
        match &self.kind {
            GeomKind::TriangleMesh(triangles) => triangles,
            _ => &[],
        }
    }

    /// Get the number of triangles in this geom.
    pub fn triangle_count(&self) -> usize {
        self.triangles().len()
    }

    /// Raw bytes of the triangle list for device upload.
    pub fn triangle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.triangles())
    }
}

/// Pinhole/thin-lens camera.
///
/// `fov` is in degrees; `fov.x` is derived from `fov.y` and the aspect
/// ratio. `view` and `right` are unit vectors derived from the eye,
/// look-at and up inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Camera {
    pub resolution: UVec2,
    pub fov: Vec2,
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    pub view: Vec3,
    pub right: Vec3,
    pub lens_radius: f32,
    pub focal_distance: f32,
    /// World-space size of one pixel on the image plane at unit distance
    pub pixel_length: Vec2,
}

impl Camera {
    /// Derive fov, view, right and pixel length from the raw inputs.
    ///
    /// `view` is recomputed from `look_at - position` before `right`
    /// is taken from it.
    pub(crate) fn derive_frame(&mut self, fov_y_degrees: f32) {
        let y_scaled = fov_y_degrees.to_radians().tan();
        let x_scaled = if self.resolution.y > 0 {
            y_scaled * self.resolution.x as f32 / self.resolution.y as f32
        } else {
            0.0
        };
        self.fov = Vec2::new(x_scaled.atan().to_degrees(), fov_y_degrees);

        self.view = (self.look_at - self.position).normalize_or_zero();
        self.right = self.view.cross(self.up).normalize_or_zero();

        self.pixel_length = Vec2::new(
            per_pixel(2.0 * x_scaled, self.resolution.x),
            per_pixel(2.0 * y_scaled, self.resolution.y),
        );

        if self.view == Vec3::ZERO {
            log::warn!("Camera eye and look-at coincide; view direction is undefined");
        } else if self.right == Vec3::ZERO {
            log::warn!("Camera up vector is parallel to the view direction");
        }
    }

    /// Number of pixels in the image.
    pub fn pixel_count(&self) -> usize {
        self.resolution.x as usize * self.resolution.y as usize
    }

    /// Camera up vector orthogonalized against view and right.
    pub fn true_up(&self) -> Vec3 {
        self.right.cross(self.view)
    }
}

fn per_pixel(extent: f32, pixels: u32) -> f32 {
    if pixels > 0 {
        extent / pixels as f32
    } else {
        0.0
    }
}

/// Camera plus the render-wide settings and the accumulation buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderState {
    pub camera: Camera,

    /// Samples per pixel to accumulate
    pub iterations: u32,

    /// Maximum bounce budget per path
    pub trace_depth: u32,

    /// Output image name from the `FILE` key
    pub image_name: String,

    /// Accumulation buffer, `resolution.x * resolution.y` entries
    pub image: Vec<Vec3>,
}

/// A loaded scene: materials, geoms and render state.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub materials: Vec<Material>,

    pub geoms: Vec<Geom>,

    pub state: RenderState,

    /// Entities the loader rejected and skipped
    pub rejected: Vec<EntityError>,
}

impl Scene {
    /// Get material count.
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Get geom count.
    pub fn geom_count(&self) -> usize {
        self.geoms.len()
    }

    /// Get total triangle count across all mesh geoms.
    pub fn total_triangle_count(&self) -> usize {
        self.geoms.iter().map(Geom::triangle_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_tags_roundtrip() {
        for surface in [
            ImplicitSurface::Sphere,
            ImplicitSurface::Mug,
            ImplicitSurface::Coffee,
            ImplicitSurface::BookCover,
            ImplicitSurface::BookPages,
            ImplicitSurface::Light,
        ] {
            assert_eq!(ImplicitSurface::from_tag(surface.tag()), Some(surface));
        }
        assert_eq!(ImplicitSurface::from_tag("IMP_TEAPOT"), None);
    }

    #[test]
    fn test_geom_caches_inverse() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let geom = Geom::new(0, GeomKind::Cube, 0, transform, Aabb::EMPTY);

        let product = (geom.inverse * geom.matrix).to_cols_array();
        let identity = Mat4::IDENTITY.to_cols_array();
        for (a, b) in product.iter().zip(identity.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
        // Pure translation leaves normals alone
        let normal = geom.inverse_transpose.transform_vector3(Vec3::Y);
        assert!((normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_triangle_bytes_layout() {
        let triangle = Triangle {
            positions: [Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: [Vec3::Z; 3],
        };
        let geom = Geom::new(
            0,
            GeomKind::TriangleMesh(vec![triangle, triangle]),
            0,
            Transform::default(),
            Aabb::EMPTY,
        );

        assert_eq!(std::mem::size_of::<Triangle>(), 6 * 3 * 4);
        assert_eq!(geom.triangle_bytes().len(), 2 * std::mem::size_of::<Triangle>());
        assert_eq!(geom.triangle_count(), 2);
    }

    #[test]
    fn test_triangle_has_normals() {
        let mut triangle = Triangle {
            positions: [Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: [Vec3::ZERO; 3],
        };
        assert!(!triangle.has_normals());

        triangle.normals[1] = Vec3::Z;
        assert!(triangle.has_normals());
    }

    #[test]
    fn test_camera_frame_uses_recomputed_view() {
        let mut camera = Camera {
            resolution: UVec2::new(800, 800),
            position: Vec3::new(0.0, 5.0, 10.5),
            look_at: Vec3::new(0.0, 5.0, 0.0),
            up: Vec3::Y,
            ..Default::default()
        };
        camera.derive_frame(45.0);

        assert!((camera.view - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.right - Vec3::X).length() < 1e-6);
        assert!((camera.true_up() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_camera_fov_x_from_aspect() {
        let mut camera = Camera {
            resolution: UVec2::new(200, 100),
            position: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            up: Vec3::Y,
            ..Default::default()
        };
        camera.derive_frame(45.0);

        // tan(45deg) = 1, so x_scaled = 2
        assert!((camera.fov.x - 2.0f32.atan().to_degrees()).abs() < 1e-4);
        assert_eq!(camera.fov.y, 45.0);
        assert!((camera.pixel_length.x - 4.0 / 200.0).abs() < 1e-6);
        assert!((camera.pixel_length.y - 2.0 / 100.0).abs() < 1e-6);
        assert_eq!(camera.pixel_count(), 20_000);
    }

    #[test]
    fn test_camera_zero_resolution_is_finite() {
        let mut camera = Camera::default();
        camera.derive_frame(45.0);

        assert_eq!(camera.pixel_length, Vec2::ZERO);
        assert_eq!(camera.view, Vec3::ZERO);
        assert_eq!(camera.right, Vec3::ZERO);
        assert_eq!(camera.fov.x, 0.0);
    }
}
