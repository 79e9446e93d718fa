//! Mesh selection and packing.

use tracing::debug;

use super::dedup::{self, IndexedMesh};
use crate::scene::{Mesh, Scene};

/// A used mesh with its deduplicated buffers.
#[derive(Debug)]
pub struct PackedMesh<'a> {
    pub name: &'a str,
    pub data: IndexedMesh,
}

/// Meshes that will be written: those with at least one user.
pub fn used_meshes(scene: &Scene) -> impl Iterator<Item = &Mesh> {
    scene.meshes.iter().filter(|mesh| {
        if mesh.users == 0 {
            debug!(mesh = %mesh.name, "mesh has no users, skipping");
        }
        mesh.users > 0
    })
}

/// The first mesh with more than one material slot, if any.
///
/// Per-corner material ids are not part of the format, so such a mesh can't be
/// represented. Every mesh is checked, used or not.
pub fn find_multi_material_mesh(scene: &Scene) -> Option<&Mesh> {
    scene.meshes.iter().find(|m| m.materials.len() > 1)
}

/// Deduplicate every used mesh, in scene order.
pub fn pack_meshes(scene: &Scene) -> Vec<PackedMesh<'_>> {
    used_meshes(scene)
        .map(|mesh| {
            let data = dedup::deduplicate(mesh);
            debug!(
                mesh = %mesh.name,
                loops = mesh.loop_count(),
                vertices = data.vertex_count(),
                triangles = data.triangle_count(),
                "packed mesh"
            );
            PackedMesh {
                name: &mesh.name,
                data,
            }
        })
        .collect()
}
