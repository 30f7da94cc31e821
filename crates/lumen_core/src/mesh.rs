//! Triangle mesh import.
//!
//! The loader only depends on the [`MeshImporter`] contract: a path goes
//! in, triangulated faces come out, each with three positions and
//! optionally three normals. [`ObjImporter`] fulfils it for Wavefront OBJ
//! files via `tobj`.

use std::path::Path;

use lumen_math::{Aabb, Vec3};
use thiserror::Error;

use crate::scene::Triangle;

/// Errors that can occur during mesh import.
#[derive(Error, Debug)]
pub enum MeshImportError {
    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("face {face} has {arity} vertices, expected a triangle")]
    NotTriangulated { face: usize, arity: u32 },

    #[error("face {face} references vertex {index} but only {count} exist")]
    IndexOutOfRange { face: usize, index: usize, count: usize },
}

/// One imported face.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedFace {
    pub positions: [Vec3; 3],

    /// Per-vertex normals, if the source had them
    pub normals: Option<[Vec3; 3]>,
}

/// Output of a [`MeshImporter`]: triangulated faces in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedMesh {
    pub faces: Vec<ImportedFace>,
}

/// Loads triangulated meshes from disk.
pub trait MeshImporter {
    /// Import the mesh at `path`.
    fn import(&self, path: &Path) -> Result<ImportedMesh, MeshImportError>;
}

/// Wavefront OBJ importer.
///
/// Polygons are triangulated on load. All models in the file are merged
/// into one face list; OBJ materials are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjImporter;

impl MeshImporter for ObjImporter {
    fn import(&self, path: &Path) -> Result<ImportedMesh, MeshImportError> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                single_index: false,
                triangulate: true,
                ..Default::default()
            },
        )?;

        let mut faces = Vec::new();
        for model in &models {
            faces.extend(faces_from_obj_mesh(&model.mesh)?);
        }

        log::info!(
            "Imported {} triangles from {} model(s) in {}",
            faces.len(),
            models.len(),
            path.display()
        );
        Ok(ImportedMesh { faces })
    }
}

fn faces_from_obj_mesh(mesh: &tobj::Mesh) -> Result<Vec<ImportedFace>, MeshImportError> {
    // Triangulation leaves face_arities empty; anything else is a contract break
    if let Some((face, &arity)) = mesh.face_arities.iter().enumerate().find(|(_, arity)| **arity != 3) {
        return Err(MeshImportError::NotTriangulated { face, arity });
    }

    let has_normals =
        !mesh.normal_indices.is_empty() && mesh.normal_indices.len() == mesh.indices.len();

    let mut faces = Vec::with_capacity(mesh.indices.len() / 3);
    for (face, corners) in mesh.indices.chunks_exact(3).enumerate() {
        let mut positions = [Vec3::ZERO; 3];
        for (slot, &index) in positions.iter_mut().zip(corners) {
            *slot = read_vec3(&mesh.positions, index as usize, face)?;
        }

        let normals = if has_normals {
            let mut normals = [Vec3::ZERO; 3];
            let normal_corners = &mesh.normal_indices[face * 3..face * 3 + 3];
            for (slot, &index) in normals.iter_mut().zip(normal_corners) {
                *slot = read_vec3(&mesh.normals, index as usize, face)?;
            }
            Some(normals)
        } else {
            None
        };

        faces.push(ImportedFace { positions, normals });
    }

    Ok(faces)
}

fn read_vec3(data: &[f32], index: usize, face: usize) -> Result<Vec3, MeshImportError> {
    data.get(index * 3..index * 3 + 3)
        .map(Vec3::from_slice)
        .ok_or(MeshImportError::IndexOutOfRange {
            face,
            index,
            count: data.len() / 3,
        })
}

/// Convert imported faces to scene triangles, extending `bounds` with
/// every vertex position.
///
/// Missing normals become zero vectors.
pub fn build_triangles(mesh: &ImportedMesh, bounds: &mut Aabb) -> Vec<Triangle> {
    mesh.faces
        .iter()
        .map(|face| {
            for position in face.positions {
                bounds.grow(position);
            }
            Triangle {
                positions: face.positions,
                normals: face.normals.unwrap_or([Vec3::ZERO; 3]),
            }
        })
        .collect()
}
