//! Image selection: which images get embedded, and where their bytes come from.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::header::ColorSpace;
use super::layout::ImagePayload;
use crate::scene::{Image, ImageSource, Scene};

/// An image that will be embedded in the output file.
#[derive(Debug, Clone)]
pub struct EmbeddedImage<'a> {
    pub name: &'a str,
    pub format: &'a str,
    pub color_space: ColorSpace,
    pub payload: ImagePayload<'a>,
}

/// Resolve an image's payload, or `None` if it can't be embedded.
fn embed(image: &Image) -> Option<EmbeddedImage<'_>> {
    let payload = match &image.source {
        ImageSource::Packed { data } => ImagePayload::Packed(data),
        ImageSource::File { path } => match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => ImagePayload::File {
                path,
                byte_length: meta.len(),
            },
            Ok(_) => {
                warn!(image = %image.name, path = %path.display(), "image path is not a file, skipping");
                return None;
            }
            Err(e) => {
                warn!(image = %image.name, path = %path.display(), "image file unavailable, skipping: {e}");
                return None;
            }
        },
        other => {
            warn!(
                image = %image.name,
                source = other.kind_name(),
                "unsupported image source, skipping"
            );
            return None;
        }
    };

    Some(EmbeddedImage {
        name: &image.name,
        format: &image.format,
        color_space: ColorSpace::from_host_name(&image.color_space),
        payload,
    })
}

/// Select the images to embed, in scene order, plus a name → image index table.
pub fn collect_images(scene: &Scene) -> (Vec<EmbeddedImage<'_>>, HashMap<&str, usize>) {
    let mut images = Vec::new();
    let mut indices = HashMap::new();

    for image in &scene.images {
        if image.users == 0 {
            debug!(image = %image.name, "image has no users, skipping");
            continue;
        }
        if let Some(embedded) = embed(image) {
            indices.insert(embedded.name, images.len());
            images.push(embedded);
        }
    }

    (images, indices)
}
