//! Principled BSDF → material record mapping.
//!
//! Only the fixed principled parameter set is read. A scalar parameter may be
//! driven by one channel of an image texture, but only through a
//! separate-channel node fed directly by an image texture node. Any other
//! routing keeps the socket's default value.

use std::collections::HashMap;

use tracing::warn;

use super::header::{MaterialParam, MaterialRecord};
use crate::scene::{InputValue, Material, NodeInput, NodeLink, Scene};

/// How a principled input can be exported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputBinding {
    /// The input can't be used as a scalar parameter.
    Unrecognized,
    Scalar(f32),
    ScalarWithChannelTexture { image: usize, channel: u8 },
}

impl InputBinding {
    fn into_param(self) -> Option<MaterialParam> {
        match self {
            InputBinding::Unrecognized => None,
            InputBinding::Scalar(value) => Some(MaterialParam::Value(value)),
            InputBinding::ScalarWithChannelTexture { image, channel } => {
                Some(MaterialParam::Texture {
                    texture: image,
                    channel,
                })
            }
        }
    }
}

/// Classify a scalar principled input.
pub fn recognize_scalar(
    input: &NodeInput,
    images: &HashMap<&str, usize>,
    material: &str,
) -> InputBinding {
    let InputValue::Scalar(value) = input.value else {
        return InputBinding::Unrecognized;
    };

    match &input.link {
        None => InputBinding::Scalar(value),
        Some(NodeLink::SeparateChannel { channel, from }) if *channel <= 2 => match from.as_ref() {
            NodeLink::ImageTexture { image } => match images.get(image.as_str()) {
                Some(&image) => InputBinding::ScalarWithChannelTexture {
                    image,
                    channel: *channel,
                },
                None => {
                    warn!(%material, input = %input.name, %image, "texture image was not exported, using default value");
                    InputBinding::Scalar(value)
                }
            },
            _ => {
                warn!(%material, input = %input.name, "unsupported texture routing, using default value");
                InputBinding::Scalar(value)
            }
        },
        Some(_) => {
            warn!(%material, input = %input.name, "unsupported texture routing, using default value");
            InputBinding::Scalar(value)
        }
    }
}

/// Image index for a base color fed directly by an image texture node.
fn base_color_texture(
    input: &NodeInput,
    images: &HashMap<&str, usize>,
    material: &str,
) -> Option<usize> {
    match input.link.as_ref()? {
        NodeLink::ImageTexture { image } => {
            let index = images.get(image.as_str()).copied();
            if index.is_none() {
                warn!(%material, %image, "base color image was not exported, ignoring texture");
            }
            index
        }
        _ => {
            warn!(%material, "unsupported base color routing, ignoring texture");
            None
        }
    }
}

/// Field of the material record a principled input maps to.
fn param_slot<'r>(record: &'r mut MaterialRecord, input: &str) -> Option<&'r mut MaterialParam> {
    Some(match input {
        "Metallic" => &mut record.metallic,
        "Specular" => &mut record.specular,
        "Specular Tint" => &mut record.specular_tint,
        "Roughness" => &mut record.roughness,
        "Anisotropic" => &mut record.anisotropy,
        "Sheen" => &mut record.sheen,
        "Sheen Tint" => &mut record.sheen_tint,
        "Clearcoat" => &mut record.clearcoat,
        "Clearcoat Roughness" => &mut record.clearcoat_gloss,
        "IOR" => &mut record.ior,
        // Transmission roughness is not separated from reflection roughness.
        "Transmission" => &mut record.specular_transmission,
        _ => return None,
    })
}

/// Build the record for one material, or `None` if it has no principled node.
pub fn material_record(material: &Material, images: &HashMap<&str, usize>) -> Option<MaterialRecord> {
    let Some(node) = material.principled_node() else {
        warn!(material = %material.name, "unsupported material, no principled BSDF found");
        return None;
    };

    let mut record = MaterialRecord::with_defaults(&material.name);
    for input in &node.inputs {
        if input.name == "Base Color" {
            match input.value {
                InputValue::Color([r, g, b, _]) => record.base_color = [r, g, b],
                InputValue::Scalar(v) => record.base_color = [v; 3],
            }
            record.base_color_texture = base_color_texture(input, images, &material.name);
            continue;
        }

        let Some(slot) = param_slot(&mut record, &input.name) else {
            continue;
        };
        match recognize_scalar(input, images, &material.name).into_param() {
            Some(param) => *slot = param,
            None => {
                warn!(material = %material.name, input = %input.name, "input is not a scalar, keeping default");
            }
        }
    }

    Some(record)
}

/// Build records for all used materials, plus a name → material index table.
pub fn collect_materials<'s>(
    scene: &'s Scene,
    images: &HashMap<&str, usize>,
) -> (Vec<MaterialRecord>, HashMap<&'s str, usize>) {
    let mut records = Vec::new();
    let mut indices = HashMap::new();

    for material in scene.materials.iter().filter(|m| m.users > 0) {
        if let Some(record) = material_record(material, images) {
            indices.insert(material.name.as_str(), records.len());
            records.push(record);
        }
    }

    (records, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ShaderNode, PRINCIPLED_BSDF};

    fn scalar(name: &str, value: f32, link: Option<NodeLink>) -> NodeInput {
        NodeInput {
            name: name.to_string(),
            value: InputValue::Scalar(value),
            link,
        }
    }

    fn channel_of(image: &str, channel: u8) -> NodeLink {
        NodeLink::SeparateChannel {
            channel,
            from: Box::new(NodeLink::ImageTexture {
                image: image.to_string(),
            }),
        }
    }

    fn principled(name: &str, inputs: Vec<NodeInput>) -> Material {
        Material {
            name: name.to_string(),
            users: 1,
            nodes: vec![
                ShaderNode {
                    kind: "OUTPUT_MATERIAL".to_string(),
                    inputs: Vec::new(),
                },
                ShaderNode {
                    kind: PRINCIPLED_BSDF.to_string(),
                    inputs,
                },
            ],
        }
    }

    fn images() -> HashMap<&'static str, usize> {
        HashMap::from([("albedo", 0), ("orm", 1)])
    }

    #[test]
    fn recognizer_cases() {
        let images = images();
        assert_eq!(
            recognize_scalar(&scalar("Metallic", 0.3, None), &images, "m"),
            InputBinding::Scalar(0.3)
        );
        assert_eq!(
            recognize_scalar(&scalar("Metallic", 0.3, Some(channel_of("orm", 2))), &images, "m"),
            InputBinding::ScalarWithChannelTexture { image: 1, channel: 2 }
        );
        // directly linked image without a channel split
        assert_eq!(
            recognize_scalar(
                &scalar("Metallic", 0.3, Some(NodeLink::ImageTexture { image: "orm".into() })),
                &images,
                "m"
            ),
            InputBinding::Scalar(0.3)
        );
        // procedural texture behind the channel split
        let procedural = NodeLink::SeparateChannel {
            channel: 0,
            from: Box::new(NodeLink::Other { kind: "TEX_NOISE".into() }),
        };
        assert_eq!(
            recognize_scalar(&scalar("Metallic", 0.3, Some(procedural)), &images, "m"),
            InputBinding::Scalar(0.3)
        );
        // image that was not exported
        assert_eq!(
            recognize_scalar(&scalar("Metallic", 0.3, Some(channel_of("gone", 0))), &images, "m"),
            InputBinding::Scalar(0.3)
        );
        // only RGB channels can be split out
        assert_eq!(
            recognize_scalar(&scalar("Metallic", 0.3, Some(channel_of("orm", 3))), &images, "m"),
            InputBinding::Scalar(0.3)
        );
        let color = NodeInput {
            name: "Metallic".into(),
            value: InputValue::Color([1.0; 4]),
            link: None,
        };
        assert_eq!(recognize_scalar(&color, &images, "m"), InputBinding::Unrecognized);
    }

    #[test]
    fn maps_principled_inputs() {
        let base = NodeInput {
            name: "Base Color".into(),
            value: InputValue::Color([0.1, 0.2, 0.3, 1.0]),
            link: Some(NodeLink::ImageTexture { image: "albedo".into() }),
        };
        let material = principled(
            "Painted",
            vec![
                base,
                scalar("Metallic", 1.0, None),
                scalar("Roughness", 0.4, Some(channel_of("orm", 1))),
                scalar("Anisotropic", 0.2, None),
                scalar("Clearcoat Roughness", 0.1, None),
                scalar("Transmission", 0.7, None),
                scalar("Subsurface", 0.9, None),
                scalar("IOR", 1.5, None),
            ],
        );

        let record = material_record(&material, &images()).unwrap();
        assert_eq!(record.name, "Painted");
        assert_eq!(record.base_color, [0.1, 0.2, 0.3]);
        assert_eq!(record.base_color_texture, Some(0));
        assert_eq!(record.metallic, MaterialParam::Value(1.0));
        assert_eq!(record.roughness, MaterialParam::Texture { texture: 1, channel: 1 });
        assert_eq!(record.anisotropy, MaterialParam::Value(0.2));
        assert_eq!(record.clearcoat_gloss, MaterialParam::Value(0.1));
        assert_eq!(record.specular_transmission, MaterialParam::Value(0.7));
        assert_eq!(record.ior, MaterialParam::Value(1.5));
        // untouched inputs keep the principled defaults
        assert_eq!(record.specular, MaterialParam::Value(0.5));
        assert_eq!(record.sheen_tint, MaterialParam::Value(0.5));
    }

    #[test]
    fn base_color_through_other_node_keeps_color_only() {
        let base = NodeInput {
            name: "Base Color".into(),
            value: InputValue::Color([0.2, 0.4, 0.6, 1.0]),
            link: Some(NodeLink::Other { kind: "MIX_RGB".into() }),
        };
        let split = NodeInput {
            name: "Base Color".into(),
            value: InputValue::Color([0.2, 0.4, 0.6, 1.0]),
            link: Some(channel_of("albedo", 0)),
        };

        for input in [base, split] {
            let record = material_record(&principled("Mixed", vec![input]), &images()).unwrap();
            assert_eq!(record.base_color, [0.2, 0.4, 0.6]);
            assert_eq!(record.base_color_texture, None);
        }
    }

    #[test]
    fn materials_without_principled_node_are_skipped() {
        let emission = Material {
            name: "Glow".into(),
            users: 1,
            nodes: vec![ShaderNode {
                kind: "EMISSION".into(),
                inputs: Vec::new(),
            }],
        };
        let mut unused = principled("Unused", Vec::new());
        unused.users = 0;
        let scene = Scene {
            materials: vec![emission, unused, principled("Plain", Vec::new())],
            ..Default::default()
        };

        let (records, indices) = collect_materials(&scene, &HashMap::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Plain");
        assert_eq!(indices.get("Plain"), Some(&0));
        assert!(!indices.contains_key("Glow"));
    }
}
