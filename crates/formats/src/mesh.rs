//! Image mesh codec.
//!
//! A mesh is a protocol-buffer message with two repeated fields:
//! field 1 holds vertices as packed little-endian `f32` xyz triples and
//! field 2 holds faces as packed base-128 varint vertex indices.

use serde::{Deserialize, Serialize};

const FIELD_VERTICES: u64 = 1;
const FIELD_FACES: u64 = 2;

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

/// Decoded mesh buffers in camera coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub faces: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    UnexpectedEof,
    InvalidVarint,
    UnsupportedWireType { field: u64, wire_type: u8 },
    InvalidLength { field: u64, len: usize },
    FaceIndexOutOfRange(u64),
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::UnexpectedEof => write!(f, "unexpected EOF"),
            MeshError::InvalidVarint => write!(f, "invalid varint"),
            MeshError::UnsupportedWireType { field, wire_type } => {
                write!(f, "unsupported wire type {wire_type} for field {field}")
            }
            MeshError::InvalidLength { field, len } => {
                write!(f, "invalid length {len} for field {field}")
            }
            MeshError::FaceIndexOutOfRange(index) => {
                write!(f, "face index {index} does not fit in 32 bits")
            }
        }
    }
}

impl std::error::Error for MeshError {}

pub fn decode_mesh(bytes: &[u8]) -> Result<MeshData, MeshError> {
    let mut r = Reader::new(bytes);
    let mut mesh = MeshData::default();

    while !r.is_done() {
        let key = r.read_var_u64()?;
        let field = key >> 3;
        let wire_type = (key & 0x7) as u8;

        match (field, wire_type) {
            (FIELD_VERTICES, WIRE_LEN) => {
                let payload = r.read_len_delimited()?;
                if payload.len() % 4 != 0 {
                    return Err(MeshError::InvalidLength {
                        field,
                        len: payload.len(),
                    });
                }
                mesh.vertices.reserve(payload.len() / 4);
                for chunk in payload.chunks_exact(4) {
                    mesh.vertices
                        .push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
                }
            }
            (FIELD_VERTICES, WIRE_FIXED32) => {
                mesh.vertices.push(f32::from_le_bytes(r.read_array::<4>()?));
            }
            (FIELD_FACES, WIRE_LEN) => {
                let payload = r.read_len_delimited()?;
                let mut inner = Reader::new(payload);
                while !inner.is_done() {
                    mesh.faces.push(face_index(inner.read_var_u64()?)?);
                }
            }
            (FIELD_FACES, WIRE_VARINT) => {
                mesh.faces.push(face_index(r.read_var_u64()?)?);
            }
            _ => r.skip(field, wire_type)?,
        }
    }

    Ok(mesh)
}

fn face_index(value: u64) -> Result<u32, MeshError> {
    u32::try_from(value).map_err(|_| MeshError::FaceIndexOutOfRange(value))
}

pub fn encode_mesh(mesh: &MeshData) -> Vec<u8> {
    let mut out = Vec::with_capacity(mesh.vertices.len() * 4 + mesh.faces.len() * 2 + 8);

    if !mesh.vertices.is_empty() {
        write_var_u64(&mut out, (FIELD_VERTICES << 3) | WIRE_LEN as u64);
        write_var_u64(&mut out, (mesh.vertices.len() * 4) as u64);
        for v in &mesh.vertices {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    if !mesh.faces.is_empty() {
        let mut packed = Vec::with_capacity(mesh.faces.len() * 2);
        for f in &mesh.faces {
            write_var_u64(&mut packed, *f as u64);
        }
        write_var_u64(&mut out, (FIELD_FACES << 3) | WIRE_LEN as u64);
        write_var_u64(&mut out, packed.len() as u64);
        out.extend_from_slice(&packed);
    }

    out
}

fn write_var_u64(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push(((v as u8) & 0x7F) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn read_u8(&mut self) -> Result<u8, MeshError> {
        if self.pos >= self.bytes.len() {
            return Err(MeshError::UnexpectedEof);
        }
        let b = self.bytes[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_slice(&mut self, n: usize) -> Result<&'a [u8], MeshError> {
        let end = self.pos.checked_add(n).ok_or(MeshError::UnexpectedEof)?;
        if end > self.bytes.len() {
            return Err(MeshError::UnexpectedEof);
        }
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], MeshError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    fn read_len_delimited(&mut self) -> Result<&'a [u8], MeshError> {
        let len = self.read_var_u64()?;
        let len = usize::try_from(len).map_err(|_| MeshError::UnexpectedEof)?;
        self.read_slice(len)
    }

    fn read_var_u64(&mut self) -> Result<u64, MeshError> {
        let mut out: u64 = 0;
        let mut shift = 0;
        for _ in 0..10 {
            let b = self.read_u8()?;
            out |= ((b & 0x7F) as u64) << shift;
            if (b & 0x80) == 0 {
                return Ok(out);
            }
            shift += 7;
        }
        Err(MeshError::InvalidVarint)
    }

    fn skip(&mut self, field: u64, wire_type: u8) -> Result<(), MeshError> {
        match wire_type {
            WIRE_VARINT => {
                self.read_var_u64()?;
            }
            WIRE_FIXED64 => {
                self.read_slice(8)?;
            }
            WIRE_LEN => {
                self.read_len_delimited()?;
            }
            WIRE_FIXED32 => {
                self.read_slice(4)?;
            }
            _ => return Err(MeshError::UnsupportedWireType { field, wire_type }),
        }
        Ok(())
    }
}
