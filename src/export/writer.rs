//! CRTS binary writer.
//!
//! Layout: `u64` little-endian header length, the UTF-8 JSON header, then every
//! payload block back to back with no padding.

use std::fs::File;
use std::io::{self, Read, Write};

use rootcause::Report;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::ExportOptions;
use super::header::Header;
use super::layout::{ImagePayload, PayloadBlock};
use crate::error::ExportError;

/// Byte counts of a written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrittenSizes {
    pub header: u64,
    pub payload: u64,
}

impl WrittenSizes {
    /// Total file size, including the length prefix.
    pub fn total(&self) -> u64 {
        8 + self.header + self.payload
    }
}

fn encode_header(header: &Header, pretty: bool) -> Result<Vec<u8>, Report<ExportError>> {
    if !pretty {
        return serde_json::to_vec(header).map_err(|e| Report::new(ExportError::Serialize(e)));
    }

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    header
        .serialize(&mut ser)
        .map_err(|e| Report::new(ExportError::Serialize(e)))?;
    Ok(buf)
}

fn io_error(e: io::Error) -> Report<ExportError> {
    Report::new(ExportError::Io(e))
}

fn write_block<W: Write>(writer: &mut W, block: &PayloadBlock<'_>) -> Result<u64, Report<ExportError>> {
    let bytes: Vec<u8> = match block {
        PayloadBlock::Positions(v) | PayloadBlock::Normals(v) => {
            v.iter().flatten().flat_map(|c| c.to_le_bytes()).collect()
        }
        PayloadBlock::Indices(indices) => indices.iter().flat_map(|i| i.to_le_bytes()).collect(),
        PayloadBlock::TexCoords(uvs) => uvs.iter().flatten().flat_map(|c| c.to_le_bytes()).collect(),
        PayloadBlock::Image(ImagePayload::Packed(data)) => {
            writer.write_all(data).map_err(io_error)?;
            return Ok(data.len() as u64);
        }
        PayloadBlock::Image(ImagePayload::File { path, byte_length }) => {
            let file = File::open(path).map_err(|source| {
                Report::new(ExportError::ImageRead {
                    path: path.to_path_buf(),
                    source,
                })
            })?;
            let copied = io::copy(&mut file.take(*byte_length), writer).map_err(|source| {
                Report::new(ExportError::ImageRead {
                    path: path.to_path_buf(),
                    source,
                })
            })?;
            if copied != *byte_length {
                return Err(Report::new(ExportError::ImageSizeMismatch {
                    path: path.to_path_buf(),
                    expected: *byte_length,
                    actual: copied,
                }));
            }
            return Ok(copied);
        }
    };

    writer.write_all(&bytes).map_err(io_error)?;
    Ok(bytes.len() as u64)
}

/// Write a complete CRTS file: length prefix, header, then `blocks` in order.
///
/// `blocks` must be the list the header's buffer views were planned from. A
/// failure partway leaves whatever was already written in `writer`.
pub fn write_crts<W: Write>(
    writer: &mut W,
    header: &Header,
    blocks: &[PayloadBlock<'_>],
    options: &ExportOptions,
) -> Result<WrittenSizes, Report<ExportError>> {
    let header_bytes = encode_header(header, options.pretty_header)?;
    writer
        .write_all(&(header_bytes.len() as u64).to_le_bytes())
        .map_err(io_error)?;
    writer.write_all(&header_bytes).map_err(io_error)?;

    let mut payload = 0;
    for block in blocks {
        payload += write_block(writer, block)?;
    }
    writer.flush().map_err(io_error)?;

    Ok(WrittenSizes {
        header: header_bytes.len() as u64,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::export::header::{BufferView, ViewType};

    #[test]
    fn writes_prefix_header_and_little_endian_payload() {
        let positions = [[1.0f32, -2.0, 0.5]];
        let indices = [0u32, 1, 258];
        let blocks = [PayloadBlock::Positions(&positions), PayloadBlock::Indices(&indices)];
        let header = Header::default();

        let mut out = Vec::new();
        let sizes = write_crts(&mut out, &header, &blocks, &ExportOptions::default()).unwrap();

        let json = serde_json::to_vec(&header).unwrap();
        assert_eq!(sizes.header, json.len() as u64);
        assert_eq!(sizes.payload, 24);
        assert_eq!(sizes.total(), out.len() as u64);

        assert_eq!(&out[..8], &(json.len() as u64).to_le_bytes());
        assert_eq!(&out[8..8 + json.len()], json.as_slice());

        let payload = &out[8 + json.len()..];
        assert_eq!(&payload[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&payload[4..8], &(-2.0f32).to_le_bytes());
        assert_eq!(&payload[8..12], &0.5f32.to_le_bytes());
        assert_eq!(&payload[12..16], &[0, 0, 0, 0]);
        assert_eq!(&payload[20..24], &[2, 1, 0, 0]);
    }

    #[test]
    fn pretty_header_uses_four_space_indent() {
        let header = Header {
            buffer_views: vec![BufferView {
                byte_offset: 0,
                byte_length: 0,
                view_type: ViewType::Uint8,
            }],
            ..Default::default()
        };
        let mut out = Vec::new();
        let options = ExportOptions::builder().pretty_header(true).build();
        write_crts(&mut out, &header, &[], &options).unwrap();

        let text = std::str::from_utf8(&out[8..]).unwrap();
        assert!(text.starts_with("{\n    \"meshes\": []"));
        let parsed: Header = serde_json::from_str(text).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn streams_image_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really a png").unwrap();
        let blocks = [PayloadBlock::Image(ImagePayload::File {
            path: file.path(),
            byte_length: 16,
        })];

        let mut out = Vec::new();
        let sizes = write_crts(&mut out, &Header::default(), &blocks, &ExportOptions::default()).unwrap();
        assert_eq!(sizes.payload, 16);
        assert!(out.ends_with(b"not really a png"));
    }

    #[test]
    fn shrunken_image_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"short").unwrap();
        let blocks = [PayloadBlock::Image(ImagePayload::File {
            path: file.path(),
            byte_length: 64,
        })];

        let err = write_crts(&mut Vec::new(), &Header::default(), &blocks, &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            ExportError::ImageSizeMismatch { expected: 64, actual: 5, .. }
        ));
    }

    #[test]
    fn missing_image_file_is_an_error() {
        let blocks = [PayloadBlock::Image(ImagePayload::File {
            path: Path::new("/nonexistent/crts/texture.png"),
            byte_length: 4,
        })];
        let err = write_crts(&mut Vec::new(), &Header::default(), &blocks, &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err.current_context(), ExportError::ImageRead { .. }));
    }
}
