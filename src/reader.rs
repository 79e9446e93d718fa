//! Decoding of written CRTS files.

use rootcause::Report;
use winnow::Parser;
use winnow::binary::le_u64;
use winnow::error::ContextError;
use winnow::token::take;

use crate::error::ReadError;
use crate::export::header::{BufferView, Header, ViewType};

type WResult<T> = Result<T, winnow::error::ErrMode<ContextError>>;

/// A parsed CRTS file borrowing its payload from the input bytes.
#[derive(Debug)]
pub struct CrtsFile<'a> {
    pub header: Header,
    pub payload: &'a [u8],
}

/// Mesh attributes decoded from a file's buffer views.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub normals: Option<Vec<[f32; 3]>>,
}

fn parse_length_prefix(input: &mut &[u8]) -> WResult<u64> {
    le_u64.parse_next(input)
}

fn f32_at(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl<'a> CrtsFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, Report<ReadError>> {
        let input = &mut &data[..];
        let declared =
            parse_length_prefix(input).map_err(|_| Report::new(ReadError::MissingLengthPrefix))?;

        let header_len = usize::try_from(declared)
            .ok()
            .filter(|len| *len <= input.len())
            .ok_or_else(|| {
                Report::new(ReadError::HeaderTruncated {
                    declared,
                    available: input.len(),
                })
            })?;
        let header_bytes: WResult<&[u8]> = take(header_len).parse_next(input);
        let header_bytes = header_bytes.map_err(|_| {
            Report::new(ReadError::HeaderTruncated {
                declared,
                available: data.len() - 8,
            })
        })?;

        let header: Header =
            serde_json::from_slice(header_bytes).map_err(|e| Report::new(ReadError::HeaderJson(e)))?;

        Ok(Self {
            header,
            payload: *input,
        })
    }

    fn buffer_view(&self, index: usize) -> Result<&BufferView, Report<ReadError>> {
        self.header
            .buffer_views
            .get(index)
            .ok_or_else(|| Report::new(ReadError::ViewOutOfRange(index)))
    }

    /// Raw bytes of buffer view `index`.
    pub fn view_bytes(&self, index: usize) -> Result<&'a [u8], Report<ReadError>> {
        let view = self.buffer_view(index)?;
        let end = view.end();
        let out_of_bounds = || {
            Report::new(ReadError::ViewPastPayload {
                view: index,
                start: view.byte_offset,
                end: end.unwrap_or(u64::MAX),
                payload: self.payload.len(),
            })
        };
        let start = usize::try_from(view.byte_offset).map_err(|_| out_of_bounds())?;
        let end = end
            .and_then(|end| usize::try_from(end).ok())
            .ok_or_else(out_of_bounds)?;
        self.payload.get(start..end).ok_or_else(out_of_bounds)
    }

    /// Bytes of view `index`, checked to hold whole elements of `expected`.
    fn typed_view(&self, index: usize, expected: ViewType) -> Result<&'a [u8], Report<ReadError>> {
        let view = self.buffer_view(index)?;
        if view.view_type != expected {
            return Err(Report::new(ReadError::ViewType {
                view: index,
                expected,
                actual: view.view_type,
            }));
        }
        if view.byte_length % expected.element_size() != 0 {
            return Err(Report::new(ReadError::ViewLength {
                view: index,
                length: view.byte_length,
                element_size: expected.element_size(),
            }));
        }
        self.view_bytes(index)
    }

    pub fn vec3_f32(&self, index: usize) -> Result<Vec<[f32; 3]>, Report<ReadError>> {
        let bytes = self.typed_view(index, ViewType::Vec3F32)?;
        Ok(bytes
            .chunks_exact(12)
            .map(|c| [f32_at(c, 0), f32_at(c, 4), f32_at(c, 8)])
            .collect())
    }

    pub fn vec2_f32(&self, index: usize) -> Result<Vec<[f32; 2]>, Report<ReadError>> {
        let bytes = self.typed_view(index, ViewType::Vec2F32)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|c| [f32_at(c, 0), f32_at(c, 4)])
            .collect())
    }

    /// Triangle indices, flattened to one entry per corner.
    pub fn indices(&self, index: usize) -> Result<Vec<u32>, Report<ReadError>> {
        let bytes = self.typed_view(index, ViewType::Vec3U32)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    pub fn mesh(&self, index: usize) -> Result<DecodedMesh, Report<ReadError>> {
        let record = self
            .header
            .meshes
            .get(index)
            .ok_or_else(|| Report::new(ReadError::MeshOutOfRange(index)))?;

        Ok(DecodedMesh {
            name: record.name.clone(),
            positions: self.vec3_f32(record.positions)?,
            indices: self.indices(record.indices)?,
            uvs: record.texcoords.map(|v| self.vec2_f32(v)).transpose()?,
            normals: record.normals.map(|v| self.vec3_f32(v)).transpose()?,
        })
    }

    /// Check that the buffer views tile the payload exactly, in order.
    pub fn views_tile_payload(&self) -> bool {
        let mut expected = 0;
        for view in &self.header.buffer_views {
            if view.byte_offset != expected {
                return false;
            }
            let Some(end) = view.end() else {
                return false;
            };
            expected = end;
        }
        expected == self.payload.len() as u64
    }
}
