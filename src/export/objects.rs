//! Scene object → object record mapping.

use std::collections::HashMap;
use std::f32::consts::PI;

use glam::{Mat4, Vec4};
use tracing::{info, warn};

use super::header::{ObjectKind, ObjectRecord};
use crate::scene::{AreaShape, Light, LightKind, Object, ObjectData};

/// -90° about X, taking Z-up to Y-up. Built from exact values so the quarter
/// turn carries no trigonometric rounding.
const Z_UP_TO_Y_UP: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, -1.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

/// Convert a row-major, Z-up world transform into the column-major, Y-up
/// 16-float layout of the file.
pub fn convert_matrix(rows: &[[f32; 4]; 4]) -> [f32; 16] {
    // glam stores columns, so reading the rows as columns yields the transpose.
    let world = Mat4::from_cols_array_2d(rows).transpose();
    (Z_UP_TO_Y_UP * world).to_cols_array()
}

/// Lookup tables for resolving object references.
#[derive(Debug, Default)]
pub struct RecordIndices<'s> {
    pub meshes: HashMap<&'s str, usize>,
    pub materials: HashMap<&'s str, usize>,
}

/// Emitting area of an area light, in square scene units.
fn area_of(light: &Light) -> f32 {
    match light.shape {
        AreaShape::Square => light.size * light.size,
        AreaShape::Rectangle => light.size * light.size_y,
        AreaShape::Disk => PI * light.size * light.size / 4.0,
        AreaShape::Ellipse => PI * light.size * light.size_y / 4.0,
    }
}

fn light_kind(object: &str, light: &Light) -> ObjectKind {
    let size = match light.shape {
        AreaShape::Rectangle | AreaShape::Ellipse => [light.size, light.size_y],
        AreaShape::Square | AreaShape::Disk => [light.size, light.size],
    };

    let energy = if light.kind == LightKind::Area {
        let area = area_of(light);
        if area > 0.0 {
            light.power / area
        } else {
            warn!(%object, "area light has no emitting area, exporting raw power");
            light.power
        }
    } else {
        warn!(%object, kind = ?light.kind, "only area lights are supported, exported values may be wrong");
        light.power
    };

    ObjectKind::Light {
        color: light.color,
        energy,
        size,
    }
}

/// Build the record for one object. Returns `None` for ignored object types
/// and for meshes that were not exported.
pub fn object_record(object: &Object, indices: &RecordIndices<'_>) -> Option<ObjectRecord> {
    let kind = match &object.data {
        ObjectData::Mesh { mesh, material } => {
            let Some(&mesh) = indices.meshes.get(mesh.as_str()) else {
                warn!(object = %object.name, %mesh, "object references a mesh that was not exported, skipping");
                return None;
            };
            let material = match material {
                Some(name) => match indices.materials.get(name.as_str()) {
                    Some(&index) => index as i64,
                    None => {
                        warn!(object = %object.name, material = %name, "material was not exported, using none");
                        -1
                    }
                },
                None => -1,
            };
            ObjectKind::Mesh { material, mesh }
        }
        ObjectData::Light(light) => light_kind(&object.name, light),
        ObjectData::Camera { angle_y } => ObjectKind::Camera {
            fov_y: angle_y.to_degrees(),
        },
        ObjectData::Other { kind } => {
            info!(object = %object.name, %kind, "unhandled or ignored object type");
            return None;
        }
    };

    Some(ObjectRecord {
        name: object.name.clone(),
        matrix: convert_matrix(&object.matrix_world),
        kind,
    })
}

/// Build records for all supported scene objects, in scene order.
pub fn collect_objects(objects: &[Object], indices: &RecordIndices<'_>) -> Vec<ObjectRecord> {
    objects
        .iter()
        .filter_map(|object| object_record(object, indices))
        .collect()
}
