//! Collapse per-corner mesh attributes into an indexed vertex buffer.
//!
//! Each triangle corner is identified by its source vertex plus the exact bit
//! patterns of its loop UV and loop normal. Corners with identical keys share
//! one output vertex; anything else, including `0.0` versus `-0.0` or values
//! differing by a single ulp, yields a separate vertex.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::scene::Mesh;

/// Identity of one triangle corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CornerKey {
    vertex: u32,
    uv: Option<[u32; 2]>,
    normal: [u32; 3],
}

impl CornerKey {
    fn new(vertex: u32, uv: Option<[f32; 2]>, normal: [f32; 3]) -> Self {
        Self {
            vertex,
            uv: uv.map(|uv| uv.map(f32::to_bits)),
            normal: normal.map(f32::to_bits),
        }
    }
}

/// Deduplicated mesh data ready to be laid out in buffer views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Present iff the source mesh has a UV layer.
    pub uvs: Option<Vec<[f32; 2]>>,
    /// One entry per triangle corner, in source winding order.
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn corner_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Build the unique vertex list and index buffer for a validated mesh.
///
/// Vertex ids are dense and assigned in first-encounter order while walking
/// triangles and their corners in source order.
pub fn deduplicate(mesh: &Mesh) -> IndexedMesh {
    let corner_count = mesh.triangles.len() * 3;
    let mut ids: HashMap<CornerKey, u32> = HashMap::with_capacity(corner_count);
    let mut out = IndexedMesh {
        uvs: mesh.loop_uvs.as_ref().map(|_| Vec::new()),
        indices: Vec::with_capacity(corner_count),
        ..Default::default()
    };

    for triangle in &mesh.triangles {
        for &loop_index in triangle {
            let loop_index = loop_index as usize;
            let vertex = mesh.loop_vertices[loop_index];
            let uv = mesh.loop_uvs.as_ref().map(|uvs| uvs[loop_index]);
            let normal = mesh.loop_normals[loop_index];

            let id = match ids.entry(CornerKey::new(vertex, uv, normal)) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let id = out.positions.len() as u32;
                    out.positions.push(mesh.positions[vertex as usize]);
                    out.normals.push(normal);
                    if let (Some(uvs), Some(uv)) = (out.uvs.as_mut(), uv) {
                        uvs.push(uv);
                    }
                    *entry.insert(id)
                }
            };
            out.indices.push(id);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: [f32; 3] = [0.0, 0.0, 1.0];

    /// Two triangles forming a unit quad in the XY plane.
    fn quad(normals: Vec<[f32; 3]>, uvs: Option<Vec<[f32; 2]>>) -> Mesh {
        Mesh::builder()
            .name("quad")
            .users(1)
            .positions(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]])
            .loop_vertices(vec![0, 1, 2, 0, 2, 3])
            .loop_normals(normals)
            .maybe_loop_uvs(uvs)
            .triangles(vec![[0, 1, 2], [3, 4, 5]])
            .build()
    }

    /// Every corner of the indexed mesh must reproduce its source loop.
    fn assert_expands_to_source(mesh: &Mesh, indexed: &IndexedMesh) {
        let corners: Vec<u32> = mesh.triangles.iter().flatten().copied().collect();
        assert_eq!(corners.len(), indexed.indices.len());

        for (&loop_index, &id) in corners.iter().zip(&indexed.indices) {
            let l = loop_index as usize;
            let id = id as usize;
            assert_eq!(indexed.positions[id], mesh.positions[mesh.loop_vertices[l] as usize]);
            assert_eq!(
                indexed.normals[id].map(f32::to_bits),
                mesh.loop_normals[l].map(f32::to_bits)
            );
            if let Some(uvs) = &mesh.loop_uvs {
                assert_eq!(indexed.uvs.as_ref().unwrap()[id], uvs[l]);
            }
        }
    }

    #[test]
    fn smooth_quad_shares_vertices() {
        let mesh = quad(vec![UP; 6], Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]]));
        let indexed = deduplicate(&mesh);

        assert_eq!(indexed.vertex_count(), 4);
        assert_eq!(indexed.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_expands_to_source(&mesh, &indexed);
    }

    #[test]
    fn hard_edge_splits_vertices() {
        let tilted = [0.0, 0.6, 0.8];
        let mesh = quad(vec![UP, UP, UP, tilted, tilted, tilted], None);
        let indexed = deduplicate(&mesh);

        assert_eq!(indexed.vertex_count(), 6);
        assert_eq!(indexed.indices, vec![0, 1, 2, 3, 4, 5]);
        assert!(indexed.uvs.is_none());
        assert_expands_to_source(&mesh, &indexed);
    }

    #[test]
    fn uv_seam_splits_shared_position() {
        let uvs = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.5, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let mesh = quad(vec![UP; 6], Some(uvs));
        let indexed = deduplicate(&mesh);

        // vertex 0 is reached with two different UVs, vertex 2 with the same one
        assert_eq!(indexed.vertex_count(), 5);
        assert_eq!(indexed.indices, vec![0, 1, 2, 3, 2, 4]);
        assert_expands_to_source(&mesh, &indexed);
    }

    #[test]
    fn equal_values_from_different_loops_merge() {
        // Loops 0 and 3 are distinct loops of different triangles but carry
        // bit-identical attributes.
        let mesh = quad(vec![UP; 6], Some(vec![[0.25, 0.75]; 6]));
        let indexed = deduplicate(&mesh);
        assert_eq!(indexed.indices[0], indexed.indices[3]);
        assert_eq!(indexed.indices[2], indexed.indices[4]);
    }

    #[test]
    fn single_bit_difference_forces_new_vertex() {
        let nudged = f32::from_bits(1.0f32.to_bits() + 1);
        let mut normals = vec![UP; 6];
        normals[3] = [0.0, 0.0, nudged];
        let mesh = quad(normals, None);
        let indexed = deduplicate(&mesh);

        assert_eq!(indexed.vertex_count(), 5);
        assert_ne!(indexed.indices[0], indexed.indices[3]);
        assert_expands_to_source(&mesh, &indexed);
    }

    #[test]
    fn negative_zero_is_distinct() {
        let mut uvs = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        uvs[3] = [-0.0, 0.0];
        let mesh = quad(vec![UP; 6], Some(uvs));
        let indexed = deduplicate(&mesh);

        assert_ne!(indexed.indices[0], indexed.indices[3]);
        assert_eq!(indexed.vertex_count(), 5);
    }

    #[test]
    fn ids_follow_first_encounter_order() {
        // The first corner visited is vertex 2, so it gets id 0.
        let mesh = Mesh::builder()
            .name("tris")
            .users(1)
            .positions(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .loop_vertices(vec![2, 1, 0, 0, 1, 2])
            .loop_normals(vec![UP; 6])
            .triangles(vec![[0, 1, 2], [3, 4, 5]])
            .build();
        let indexed = deduplicate(&mesh);

        assert_eq!(indexed.indices, vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(indexed.positions[0], [0.0, 1.0, 0.0]);
        assert_expands_to_source(&mesh, &indexed);
    }

    #[test]
    fn empty_mesh_has_empty_buffers() {
        let mesh = Mesh::builder()
            .name("empty")
            .users(1)
            .positions(vec![[0.0; 3]])
            .loop_uvs(Vec::new())
            .build();
        let indexed = deduplicate(&mesh);

        assert_eq!(indexed.vertex_count(), 0);
        assert_eq!(indexed.corner_count(), 0);
        assert!(indexed.normals.is_empty());
        assert_eq!(indexed.uvs, Some(Vec::new()));
    }
}
