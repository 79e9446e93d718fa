//! Read-only scene description consumed by the exporter.
//!
//! These types mirror what a host application exposes about its scene:
//! meshes with per-loop attributes, images, materials with a shader node
//! tree, and objects with world transforms. A [`Scene`] can be assembled in
//! code or loaded from a JSON scene description with [`Scene::from_json_file`].

use std::path::{Path, PathBuf};

use bon::Builder;
use rootcause::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("mesh '{mesh}': loop {loop_index} references vertex {vertex} but only {count} positions exist")]
    LoopVertexOutOfRange {
        mesh: String,
        loop_index: usize,
        vertex: u32,
        count: usize,
    },
    #[error("mesh '{mesh}': triangle {triangle} references loop {loop_index} but only {count} loops exist")]
    TriangleLoopOutOfRange {
        mesh: String,
        triangle: usize,
        loop_index: u32,
        count: usize,
    },
    #[error("mesh '{mesh}': {attribute} has {actual} entries, expected one per loop ({expected})")]
    LoopAttributeCount {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Everything the exporter reads from the host application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub objects: Vec<Object>,
}

impl Scene {
    /// Load a JSON scene description.
    ///
    /// Relative image file paths are resolved against the directory that
    /// contains the description, and the mesh data is validated.
    pub fn from_json_file(path: &Path) -> Result<Self, Report> {
        let data = std::fs::read(path).context("Failed to read scene description")?;
        let mut scene: Scene =
            serde_json::from_slice(&data).context("Failed to parse scene description")?;

        if let Some(base) = path.parent() {
            scene.resolve_image_paths(base);
        }

        scene
            .validate()
            .context("Scene description contains invalid mesh data")?;

        Ok(scene)
    }

    /// Rebase every relative on-disk image path onto `base`.
    pub fn resolve_image_paths(&mut self, base: &Path) {
        for image in &mut self.images {
            if let ImageSource::File { path } = &mut image.source {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }

    /// Check that every mesh's loop and triangle data is internally consistent.
    pub fn validate(&self) -> Result<(), Report<SceneError>> {
        self.meshes.iter().try_for_each(Mesh::validate)
    }

    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name == name)
    }
}

/// A triangulated mesh with per-loop attributes.
///
/// A loop is one corner of one face. `loop_vertices`, `loop_normals` and
/// (when present) `loop_uvs` all have one entry per loop; `triangles` holds
/// three loop indices per triangle in winding order.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct Mesh {
    #[builder(into)]
    pub name: String,
    /// Number of objects using this mesh.
    pub users: u32,
    #[builder(default)]
    pub positions: Vec<[f32; 3]>,
    #[builder(default)]
    pub loop_vertices: Vec<u32>,
    /// Split normals, one per loop.
    #[builder(default)]
    pub loop_normals: Vec<[f32; 3]>,
    /// Active UV layer, one pair per loop. `None` when the mesh has no UV layer.
    #[serde(default)]
    pub loop_uvs: Option<Vec<[f32; 2]>>,
    #[builder(default)]
    pub triangles: Vec<[u32; 3]>,
    /// Names of the materials assigned to this mesh's slots.
    #[serde(default)]
    #[builder(default)]
    pub materials: Vec<String>,
}

impl Mesh {
    pub fn loop_count(&self) -> usize {
        self.loop_vertices.len()
    }

    pub fn validate(&self) -> Result<(), Report<SceneError>> {
        let loops = self.loop_count();

        let attribute_count = |attribute: &'static str, actual: usize| {
            if actual == loops {
                Ok(())
            } else {
                Err(Report::new(SceneError::LoopAttributeCount {
                    mesh: self.name.clone(),
                    attribute,
                    expected: loops,
                    actual,
                }))
            }
        };
        attribute_count("loop_normals", self.loop_normals.len())?;
        if let Some(uvs) = &self.loop_uvs {
            attribute_count("loop_uvs", uvs.len())?;
        }

        if let Some((loop_index, &vertex)) = self
            .loop_vertices
            .iter()
            .enumerate()
            .find(|(_, v)| **v as usize >= self.positions.len())
        {
            return Err(Report::new(SceneError::LoopVertexOutOfRange {
                mesh: self.name.clone(),
                loop_index,
                vertex,
                count: self.positions.len(),
            }));
        }

        for (triangle, corners) in self.triangles.iter().enumerate() {
            if let Some(&loop_index) = corners.iter().find(|l| **l as usize >= loops) {
                return Err(Report::new(SceneError::TriangleLoopOutOfRange {
                    mesh: self.name.clone(),
                    triangle,
                    loop_index,
                    count: loops,
                }));
            }
        }

        Ok(())
    }
}

/// Where an image's encoded bytes live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Bytes embedded in the host's project file.
    Packed { data: Vec<u8> },
    /// An encoded image file on disk.
    File { path: PathBuf },
    Generated,
    Movie,
    Sequence,
}

impl ImageSource {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ImageSource::Packed { .. } => "packed",
            ImageSource::File { .. } => "file",
            ImageSource::Generated => "generated",
            ImageSource::Movie => "movie",
            ImageSource::Sequence => "sequence",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    pub users: u32,
    pub source: ImageSource,
    /// Encoded file format tag, e.g. `PNG` or `JPEG`.
    pub format: String,
    /// Host color space name, e.g. `sRGB`, `Linear`, `Non-Color`.
    pub color_space: String,
}

/// Node type tag of the principled BSDF shader.
pub const PRINCIPLED_BSDF: &str = "BSDF_PRINCIPLED";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub users: u32,
    /// Shader nodes of the material's node tree, in tree order.
    #[serde(default)]
    pub nodes: Vec<ShaderNode>,
}

impl Material {
    /// The first principled BSDF node in the node tree, if any.
    pub fn principled_node(&self) -> Option<&ShaderNode> {
        self.nodes.iter().find(|n| n.kind == PRINCIPLED_BSDF)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderNode {
    pub kind: String,
    #[serde(default)]
    pub inputs: Vec<NodeInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInput {
    pub name: String,
    /// Unlinked default value of the socket.
    pub value: InputValue,
    /// Upstream node chain feeding this socket.
    #[serde(default)]
    pub link: Option<NodeLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Scalar(f32),
    Color([f32; 4]),
}

/// The node feeding a socket, followed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeLink {
    /// Splits a color into R, G and B outputs; `channel` is the output used.
    SeparateChannel { channel: u8, from: Box<NodeLink> },
    /// Samples the named image.
    ImageTexture { image: String },
    /// Any other node type.
    Other { kind: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    /// World transform, row-major, Z-up.
    pub matrix_world: [[f32; 4]; 4],
    pub data: ObjectData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectData {
    Mesh {
        mesh: String,
        #[serde(default)]
        material: Option<String>,
    },
    Light(Light),
    Camera {
        /// Vertical field of view in radians.
        angle_y: f32,
    },
    /// Empties, curves, armatures and other types the exporter ignores.
    Other { kind: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LightKind {
    Point,
    Sun,
    Spot,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaShape {
    #[default]
    Square,
    Rectangle,
    Disk,
    Ellipse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: [f32; 3],
    /// Radiant power in watts.
    pub power: f32,
    pub size: f32,
    /// Second extent, only meaningful for rectangle and ellipse area lights.
    #[serde(default)]
    pub size_y: f32,
    #[serde(default)]
    pub shape: AreaShape,
}
