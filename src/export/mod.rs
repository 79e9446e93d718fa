//! Scene → CRTS export pipeline.
//!
//! Stages run in a fixed order: validation, mesh packing, image selection,
//! buffer layout, material and object mapping, then a single write pass. The
//! running byte offset and the name → index tables are plain values passed
//! from one stage to the next.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bon::Builder;
use rootcause::prelude::*;
use tracing::{error, info};

pub mod dedup;
pub mod header;
pub mod images;
pub mod layout;
pub mod materials;
pub mod meshes;
pub mod objects;
pub mod writer;

use self::header::{Header, ImageRecord};
use self::images::EmbeddedImage;
use self::layout::PayloadBlock;
use self::meshes::PackedMesh;
use self::objects::RecordIndices;
use self::writer::WrittenSizes;
use crate::error::ExportError;
use crate::scene::Scene;

/// Options controlling the written file.
#[derive(Debug, Clone, Default, Builder)]
pub struct ExportOptions {
    /// Indent the JSON header for human inspection.
    #[builder(default)]
    pub pretty_header: bool,
}

/// Outcome of an export that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Finished,
    /// The scene can't be represented; nothing was written.
    Cancelled,
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStatus::Finished => f.write_str("FINISHED"),
            ExportStatus::Cancelled => f.write_str("CANCELLED"),
        }
    }
}

/// The header plus the payload blocks it describes, in write order.
#[derive(Debug)]
pub struct ExportPlan<'a> {
    pub header: Header,
    pub blocks: Vec<PayloadBlock<'a>>,
    pub payload_length: u64,
}

impl<'a> ExportPlan<'a> {
    /// Lay out the payload and build every header record.
    ///
    /// Views are assigned mesh by mesh (positions, indices, texcoords,
    /// normals) and then image by image; records are resolved images first,
    /// then materials, meshes and objects.
    pub fn build(
        scene: &Scene,
        meshes: &'a [PackedMesh<'_>],
        images: &[EmbeddedImage<'a>],
        image_indices: &HashMap<&str, usize>,
    ) -> Self {
        let mut header = Header::default();
        let mut blocks = Vec::new();
        let mut offset = 0;

        let mut mesh_indices = HashMap::new();
        for mesh in meshes {
            let mesh_blocks = layout::mesh_blocks(&mesh.data);
            let record = layout::mesh_record(mesh.name, header.buffer_views.len(), &mesh.data);
            let (views, next) = layout::plan_views(&mesh_blocks, offset);
            offset = next;

            mesh_indices.insert(mesh.name, header.meshes.len());
            header.meshes.push(record);
            header.buffer_views.extend(views);
            blocks.extend(mesh_blocks);
        }

        for image in images {
            let block = PayloadBlock::Image(image.payload);
            let (views, next) = layout::plan_views(std::slice::from_ref(&block), offset);
            offset = next;

            header.images.push(ImageRecord {
                name: image.name.to_string(),
                view: header.buffer_views.len(),
                format: image.format.to_string(),
                color_space: image.color_space,
            });
            header.buffer_views.extend(views);
            blocks.push(block);
        }

        let (materials, material_indices) = materials::collect_materials(scene, image_indices);
        header.materials = materials;

        let indices = RecordIndices {
            meshes: mesh_indices,
            materials: material_indices,
        };
        header.objects = objects::collect_objects(&scene.objects, &indices);

        Self {
            header,
            blocks,
            payload_length: offset,
        }
    }
}

/// Checks that must pass before any output is opened.
///
/// Returns `Some(status)` when the export stops here without an error.
fn preflight(scene: &Scene) -> Result<Option<ExportStatus>, Report<ExportError>> {
    scene.validate().context(ExportError::InvalidScene)?;

    let Some(mesh) = meshes::find_multi_material_mesh(scene) else {
        return Ok(None);
    };
    error!(
        mesh = %mesh.name,
        materials = mesh.materials.len(),
        "multiple materials per mesh are not supported, cancelling export"
    );
    Ok(Some(ExportStatus::Cancelled))
}

/// Pack, plan and write a scene that already passed validation.
fn write_planned<W: Write>(
    scene: &Scene,
    writer: &mut W,
    options: &ExportOptions,
) -> Result<WrittenSizes, Report<ExportError>> {
    let meshes = meshes::pack_meshes(scene);
    let (images, image_indices) = images::collect_images(scene);
    let plan = ExportPlan::build(scene, &meshes, &images, &image_indices);

    let sizes = writer::write_crts(writer, &plan.header, &plan.blocks, options)?;
    debug_assert_eq!(sizes.payload, plan.payload_length);

    info!(
        meshes = plan.header.meshes.len(),
        materials = plan.header.materials.len(),
        images = plan.header.images.len(),
        objects = plan.header.objects.len(),
        bytes = sizes.total(),
        "wrote CRTS scene"
    );
    Ok(sizes)
}

/// Export `scene` to any writer.
///
/// Returns [`ExportStatus::Cancelled`] without writing anything when a used
/// mesh has more than one material.
pub fn write_scene<W: Write>(
    scene: &Scene,
    writer: &mut W,
    options: &ExportOptions,
) -> Result<ExportStatus, Report<ExportError>> {
    if let Some(status) = preflight(scene)? {
        return Ok(status);
    }

    write_planned(scene, writer, options)?;
    Ok(ExportStatus::Finished)
}

/// Export `scene` to a file at `path`.
///
/// The file is only created once validation has passed, so a cancelled export
/// leaves no file behind. Errors during writing leave a truncated file.
pub fn export_to_path(
    scene: &Scene,
    path: &Path,
    options: &ExportOptions,
) -> Result<ExportStatus, Report<ExportError>> {
    if let Some(status) = preflight(scene)? {
        return Ok(status);
    }

    let file = File::create(path).context(ExportError::CreateOutput(path.to_path_buf()))?;
    let mut writer = BufWriter::new(file);
    write_planned(scene, &mut writer, options)?;
    Ok(ExportStatus::Finished)
}
