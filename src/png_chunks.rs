//! PNG chunk surgery: declaring physical resolution.
//!
//! Encoders write pixels, not paper size. Editors then assume 72 DPI and a
//! 2550 px wide letter sheet opens as 35 inches wide. [`encode_png_with_physical_resolution`]
//! inserts a `pHYs` chunk right after `IHDR` so the file states its DPI.
//!
//! ## Chunk layout
//!
//! ```text
//! ┌────────────┬────────────┬─────────────────┬────────────┐
//! │ length u32 │ type [u8;4]│ data [u8;length]│ crc u32    │
//! └────────────┴────────────┴─────────────────┴────────────┘
//! ```
//!
//! All integers are big-endian. The CRC covers type and data, not length.
//! `pHYs` data is 9 bytes: pixels per unit X (u32), Y (u32), unit (1 = meter).

use thiserror::Error;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    #[error("missing PNG signature")]
    NotPng,
    #[error("chunk at byte {offset} runs past the end of the file")]
    Truncated { offset: usize },
    #[error("first chunk is {found:?}, expected IHDR")]
    MissingHeader { found: String },
}

/// A chunk borrowed from an encoded PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
    /// Byte offset of the length field within the file.
    pub offset: usize,
}

impl Chunk<'_> {
    pub fn kind_str(&self) -> &str {
        std::str::from_utf8(&self.kind).unwrap_or("????")
    }

    /// Total size on disk: length + type + data + crc.
    pub fn encoded_len(&self) -> usize {
        12 + self.data.len()
    }

    /// Whether the stored CRC matches type + data.
    pub fn crc_ok(&self) -> bool {
        chunk_crc(&self.kind, self.data) == self.crc
    }
}

/// Standard CRC-32 (reflected 0xEDB88320, init and final XOR 0xFFFFFFFF)
/// over the chunk type followed by its data.
pub fn chunk_crc(kind: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    hasher.finalize()
}

/// Serialize one chunk.
pub fn encode_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(kind, data).to_be_bytes());
    out
}

/// Walk every chunk after the signature.
pub fn parse_chunks(png: &[u8]) -> Result<Vec<Chunk<'_>>, ChunkError> {
    if !png.starts_with(&PNG_SIGNATURE) {
        return Err(ChunkError::NotPng);
    }
    let mut chunks = Vec::new();
    let mut offset = PNG_SIGNATURE.len();
    while offset < png.len() {
        let header = png
            .get(offset..offset + 8)
            .ok_or(ChunkError::Truncated { offset })?;
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];
        let data_start = offset + 8;
        let data = png
            .get(data_start..data_start + len)
            .ok_or(ChunkError::Truncated { offset })?;
        let crc_bytes = png
            .get(data_start + len..data_start + len + 4)
            .ok_or(ChunkError::Truncated { offset })?;
        let crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        chunks.push(Chunk {
            kind,
            data,
            crc,
            offset,
        });
        offset = data_start + len + 4;
    }
    Ok(chunks)
}

/// Pixels per meter for a DPI value: `round(dpi / 0.0254)`.
pub fn dpi_to_ppm(dpi: u32) -> u32 {
    (f64::from(dpi) / 0.0254).round() as u32
}

/// The 9-byte `pHYs` payload for a square-pixel DPI.
pub fn phys_data(dpi: u32) -> [u8; 9] {
    let ppm = dpi_to_ppm(dpi).to_be_bytes();
    [ppm[0], ppm[1], ppm[2], ppm[3], ppm[0], ppm[1], ppm[2], ppm[3], 1]
}

/// Re-emit `png` with a `pHYs` chunk for `dpi` immediately after `IHDR`.
///
/// Any existing `pHYs` is dropped first, so applying this twice yields the
/// same bytes as applying it once. Every other chunk is copied verbatim.
pub fn encode_png_with_physical_resolution(png: &[u8], dpi: u32) -> Result<Vec<u8>, ChunkError> {
    let chunks = parse_chunks(png)?;
    match chunks.first() {
        Some(first) if &first.kind == b"IHDR" => {}
        Some(first) => {
            return Err(ChunkError::MissingHeader {
                found: first.kind_str().to_string(),
            });
        }
        None => {
            return Err(ChunkError::MissingHeader {
                found: String::new(),
            });
        }
    }

    let phys = encode_chunk(b"pHYs", &phys_data(dpi));
    let mut out = Vec::with_capacity(png.len() + phys.len());
    out.extend_from_slice(&PNG_SIGNATURE);
    for (i, chunk) in chunks.iter().enumerate() {
        if &chunk.kind == b"pHYs" {
            continue;
        }
        out.extend_from_slice(&png[chunk.offset..chunk.offset + chunk.encoded_len()]);
        if i == 0 {
            out.extend_from_slice(&phys);
        }
    }
    Ok(out)
}

/// Read back the DPI declared by a `pHYs` chunk, if present and in meters.
pub fn physical_dpi(png: &[u8]) -> Option<(f64, f64)> {
    let chunks = parse_chunks(png).ok()?;
    let phys = chunks.iter().find(|c| &c.kind == b"pHYs")?;
    let d = phys.data;
    if d.len() != 9 || d[8] != 1 {
        return None;
    }
    let x = u32::from_be_bytes([d[0], d[1], d[2], d[3]]);
    let y = u32::from_be_bytes([d[4], d[5], d[6], d[7]]);
    Some((f64::from(x) * 0.0254, f64::from(y) * 0.0254))
}
