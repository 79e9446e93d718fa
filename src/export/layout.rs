//! Byte layout of the payload region.
//!
//! The exporter describes its payload as an ordered list of [`PayloadBlock`]s.
//! The same list drives both [`plan_views`] (offsets in the header) and the
//! binary writer (bytes in the file), so the two can never disagree on order.

use std::path::Path;

use super::dedup::IndexedMesh;
use super::header::{BufferView, MeshRecord, ViewType};

/// Where an image block's bytes come from at write time.
#[derive(Debug, Clone, Copy)]
pub enum ImagePayload<'a> {
    Packed(&'a [u8]),
    /// An on-disk file whose size was read while planning.
    File { path: &'a Path, byte_length: u64 },
}

impl ImagePayload<'_> {
    pub fn byte_length(&self) -> u64 {
        match self {
            ImagePayload::Packed(data) => data.len() as u64,
            ImagePayload::File { byte_length, .. } => *byte_length,
        }
    }
}

/// One contiguous run of payload bytes.
#[derive(Debug, Clone, Copy)]
pub enum PayloadBlock<'a> {
    Positions(&'a [[f32; 3]]),
    /// Triangle corner indices; three per triangle.
    Indices(&'a [u32]),
    TexCoords(&'a [[f32; 2]]),
    Normals(&'a [[f32; 3]]),
    Image(ImagePayload<'a>),
}

impl PayloadBlock<'_> {
    pub fn view_type(&self) -> ViewType {
        match self {
            PayloadBlock::Positions(_) | PayloadBlock::Normals(_) => ViewType::Vec3F32,
            PayloadBlock::Indices(_) => ViewType::Vec3U32,
            PayloadBlock::TexCoords(_) => ViewType::Vec2F32,
            PayloadBlock::Image(_) => ViewType::Uint8,
        }
    }

    pub fn byte_length(&self) -> u64 {
        match self {
            PayloadBlock::Positions(p) | PayloadBlock::Normals(p) => p.len() as u64 * 12,
            PayloadBlock::Indices(i) => i.len() as u64 * 4,
            PayloadBlock::TexCoords(uv) => uv.len() as u64 * 8,
            PayloadBlock::Image(image) => image.byte_length(),
        }
    }
}

/// The blocks of one mesh, in their fixed order: positions, indices,
/// texcoords (if the mesh has a UV layer), normals.
pub fn mesh_blocks(mesh: &IndexedMesh) -> Vec<PayloadBlock<'_>> {
    let mut blocks = vec![
        PayloadBlock::Positions(&mesh.positions),
        PayloadBlock::Indices(&mesh.indices),
    ];
    if let Some(uvs) = &mesh.uvs {
        blocks.push(PayloadBlock::TexCoords(uvs));
    }
    blocks.push(PayloadBlock::Normals(&mesh.normals));
    blocks
}

/// The record for a mesh whose [`mesh_blocks`] start at view `first_view`.
pub fn mesh_record(name: &str, first_view: usize, mesh: &IndexedMesh) -> MeshRecord {
    let texcoords = mesh.uvs.as_ref().map(|_| first_view + 2);
    MeshRecord {
        name: name.to_string(),
        positions: first_view,
        indices: first_view + 1,
        texcoords,
        normals: Some(texcoords.map_or(first_view + 2, |t| t + 1)),
    }
}

/// Assign consecutive views to `blocks` starting at byte `offset`.
///
/// Returns the views and the next free offset.
pub fn plan_views(blocks: &[PayloadBlock<'_>], offset: u64) -> (Vec<BufferView>, u64) {
    let mut next = offset;
    let views = blocks
        .iter()
        .map(|block| {
            let view = BufferView {
                byte_offset: next,
                byte_length: block.byte_length(),
                view_type: block.view_type(),
            };
            next += view.byte_length;
            view
        })
        .collect();
    (views, next)
}
