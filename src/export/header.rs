//! JSON header records of a CRTS file.
//!
//! Every cross-reference between records is an array position into one of the
//! [`Header`] sequences and is only meaningful within a single file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub meshes: Vec<MeshRecord>,
    pub objects: Vec<ObjectRecord>,
    pub buffer_views: Vec<BufferView>,
    pub materials: Vec<MaterialRecord>,
    pub images: Vec<ImageRecord>,
}

/// Element type of a buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewType {
    #[serde(rename = "VEC3_F32")]
    Vec3F32,
    #[serde(rename = "VEC3_U32")]
    Vec3U32,
    #[serde(rename = "VEC2_F32")]
    Vec2F32,
    #[serde(rename = "UINT_8")]
    Uint8,
}

impl ViewType {
    /// Size in bytes of one element of this type.
    pub fn element_size(self) -> u64 {
        match self {
            ViewType::Vec3F32 | ViewType::Vec3U32 => 12,
            ViewType::Vec2F32 => 8,
            ViewType::Uint8 => 1,
        }
    }
}

/// A typed byte range of the payload region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferView {
    pub byte_offset: u64,
    pub byte_length: u64,
    #[serde(rename = "type")]
    pub view_type: ViewType,
}

impl BufferView {
    /// One past the last byte, or `None` if the range overflows `u64`.
    pub fn end(&self) -> Option<u64> {
        self.byte_offset.checked_add(self.byte_length)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    pub name: String,
    pub positions: usize,
    pub indices: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texcoords: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<usize>,
}

/// A scalar material parameter: a constant, or one channel of an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialParam {
    Value(f32),
    Texture { texture: usize, channel: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub name: String,
    pub base_color: [f32; 3],
    pub metallic: MaterialParam,
    pub specular: MaterialParam,
    pub specular_tint: MaterialParam,
    pub roughness: MaterialParam,
    pub anisotropy: MaterialParam,
    pub sheen: MaterialParam,
    pub sheen_tint: MaterialParam,
    pub clearcoat: MaterialParam,
    pub clearcoat_gloss: MaterialParam,
    pub ior: MaterialParam,
    pub specular_transmission: MaterialParam,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<usize>,
}

impl MaterialRecord {
    /// A record holding the principled BSDF defaults.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: [0.8, 0.8, 0.8],
            metallic: MaterialParam::Value(0.0),
            specular: MaterialParam::Value(0.5),
            specular_tint: MaterialParam::Value(0.0),
            roughness: MaterialParam::Value(0.5),
            anisotropy: MaterialParam::Value(0.0),
            sheen: MaterialParam::Value(0.0),
            sheen_tint: MaterialParam::Value(0.5),
            clearcoat: MaterialParam::Value(0.0),
            clearcoat_gloss: MaterialParam::Value(0.03),
            ior: MaterialParam::Value(1.45),
            specular_transmission: MaterialParam::Value(0.0),
            base_color_texture: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    #[serde(rename = "sRGB")]
    Srgb,
    #[serde(rename = "LINEAR")]
    Linear,
}

impl ColorSpace {
    /// Only the exact name `sRGB` is treated as sRGB; every other host color
    /// space is written as linear.
    pub fn from_host_name(name: &str) -> Self {
        if name == "sRGB" {
            ColorSpace::Srgb
        } else {
            ColorSpace::Linear
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub name: String,
    pub view: usize,
    /// Encoded file format tag, e.g. `PNG`.
    #[serde(rename = "type")]
    pub format: String,
    pub color_space: ColorSpace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    /// Column-major, Y-up world transform.
    pub matrix: [f32; 16],
    #[serde(flatten)]
    pub kind: ObjectKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum ObjectKind {
    Mesh {
        /// Material index, or -1 for none.
        material: i64,
        mesh: usize,
    },
    Light {
        color: [f32; 3],
        energy: f32,
        size: [f32; 2],
    },
    Camera {
        /// Vertical field of view in degrees.
        fov_y: f32,
    },
}
