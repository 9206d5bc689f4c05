//! The `.pack` binary container.
//!
//! Layout (all integers little-endian):
//!
//! | bytes    | field                                              |
//! |----------|----------------------------------------------------|
//! | 0..4     | magic `TWPK`                                       |
//! | 4..6     | format version (`u16`)                             |
//! | 6..10    | decompressed payload size (`u32`)                  |
//! | 10..42   | v2 only: SHA-256 of the compressed payload         |
//! | rest     | zlib-compressed compact JSON of [`PackContent`]    |
//!
//! Version 1 files carry no checksum and are still readable.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::debug;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::pack::PackContent;

pub const MAGIC: [u8; 4] = *b"TWPK";
pub const FORMAT_V1: u16 = 1;
pub const FORMAT_V2: u16 = 2;
/// Version written by [`encode`] and [`compile`].
pub const CURRENT_FORMAT: u16 = FORMAT_V2;
pub const PACK_EXTENSION: &str = "pack";

pub const V1_HEADER_LEN: usize = 10;
pub const V2_HEADER_LEN: usize = V1_HEADER_LEN + CHECKSUM_LEN;
const CHECKSUM_LEN: usize = 32;
/// Upper bound on the buffer reserved up front from the (untrusted) size field.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Every way reading or writing a container can fail.
#[derive(Debug, Error)]
pub enum PackFileError {
    #[error("file too short for a pack header: {len} bytes, need {needed}")]
    TooShort { len: usize, needed: usize },
    #[error("bad magic bytes {0:02x?}, expected \"TWPK\"")]
    InvalidMagic([u8; 4]),
    #[error("unsupported pack format version {0}")]
    UnsupportedVersion(u16),
    #[error("payload checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("decompressed size mismatch: header says {expected} bytes, payload has {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("payload is not valid zlib data")]
    Decompress(#[source] io::Error),
    #[error("payload is not valid pack content")]
    Decode(#[source] serde_json::Error),
    #[error("could not serialise pack content")]
    Encode(#[source] serde_json::Error),
    #[error("payload of {0} bytes does not fit the u32 size field")]
    PayloadTooLarge(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parsed fixed-size header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHeader {
    pub version: u16,
    pub original_size: u32,
    pub checksum: Option<[u8; CHECKSUM_LEN]>,
}

impl PackHeader {
    pub fn header_len(&self) -> usize {
        match self.version {
            FORMAT_V1 => V1_HEADER_LEN,
            _ => V2_HEADER_LEN,
        }
    }
}

/// Summary of a container on disk, read without decoding the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackFileInfo {
    pub version: u16,
    pub original_size: u32,
    pub compressed_size: usize,
    pub file_size: u64,
    pub header_len: usize,
    /// Hex SHA-256 of the compressed payload (v2 only).
    pub checksum: Option<String>,
}

impl PackFileInfo {
    /// Compressed payload size over original size; 0.0 for an empty payload.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.compressed_size as f64 / f64::from(self.original_size)
        }
    }
}

/// Encode `content` in the current format.
///
/// # Errors
/// `Encode` if serialisation fails, `PayloadTooLarge` if the JSON exceeds `u32::MAX` bytes.
pub fn encode(content: &PackContent) -> Result<Vec<u8>, PackFileError> {
    encode_with_version(content, CURRENT_FORMAT)
}

/// Encode `content` as a specific format version. Only tooling and compatibility tests need v1.
///
/// # Errors
/// As [`encode`], plus `UnsupportedVersion` for unknown versions.
pub fn encode_with_version(content: &PackContent, version: u16) -> Result<Vec<u8>, PackFileError> {
    if version != FORMAT_V1 && version != FORMAT_V2 {
        return Err(PackFileError::UnsupportedVersion(version));
    }

    let json = serde_json::to_vec(content).map_err(PackFileError::Encode)?;
    let original_size = u32::try_from(json.len()).map_err(|_| PackFileError::PayloadTooLarge(json.len()))?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    let header_len = if version == FORMAT_V1 { V1_HEADER_LEN } else { V2_HEADER_LEN };
    let mut out = Vec::with_capacity(header_len + compressed.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&original_size.to_le_bytes());
    if version == FORMAT_V2 {
        out.extend_from_slice(&Sha256::digest(&compressed));
    }
    out.extend_from_slice(&compressed);

    debug!(
        "encoded pack '{}' as v{version}: {} bytes json, {} bytes compressed",
        content.id(),
        json.len(),
        compressed.len()
    );
    Ok(out)
}

/// Parse the header, checking magic and version but not the payload.
///
/// # Errors
/// `TooShort`, `InvalidMagic` or `UnsupportedVersion`.
pub fn read_header(bytes: &[u8]) -> Result<PackHeader, PackFileError> {
    if bytes.len() < 6 {
        return Err(PackFileError::TooShort {
            len: bytes.len(),
            needed: V1_HEADER_LEN,
        });
    }
    let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if magic != MAGIC {
        return Err(PackFileError::InvalidMagic(magic));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    let needed = match version {
        FORMAT_V1 => V1_HEADER_LEN,
        FORMAT_V2 => V2_HEADER_LEN,
        other => return Err(PackFileError::UnsupportedVersion(other)),
    };
    if bytes.len() < needed {
        return Err(PackFileError::TooShort {
            len: bytes.len(),
            needed,
        });
    }
    let original_size = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
    let checksum = (version == FORMAT_V2).then(|| {
        let mut sum = [0u8; CHECKSUM_LEN];
        sum.copy_from_slice(&bytes[V1_HEADER_LEN..V2_HEADER_LEN]);
        sum
    });
    Ok(PackHeader {
        version,
        original_size,
        checksum,
    })
}

/// Decode a container of any supported version.
///
/// # Errors
/// Any [`PackFileError`] other than `Encode`/`PayloadTooLarge`/`Io`.
pub fn decode(bytes: &[u8]) -> Result<PackContent, PackFileError> {
    match read_header(bytes)?.version {
        FORMAT_V1 => decode_v1(bytes),
        _ => decode_v2(bytes),
    }
}

/// Decode a v1 container (no checksum).
///
/// # Errors
/// As [`decode`]; `UnsupportedVersion` if the header is not v1.
pub fn decode_v1(bytes: &[u8]) -> Result<PackContent, PackFileError> {
    let header = read_header(bytes)?;
    if header.version != FORMAT_V1 {
        return Err(PackFileError::UnsupportedVersion(header.version));
    }
    inflate_and_decode(&bytes[V1_HEADER_LEN..], header.original_size)
}

/// Decode a v2 container, verifying the checksum before touching the payload.
///
/// # Errors
/// As [`decode`]; `UnsupportedVersion` if the header is not v2.
pub fn decode_v2(bytes: &[u8]) -> Result<PackContent, PackFileError> {
    let header = read_header(bytes)?;
    let Some(expected) = header.checksum else {
        return Err(PackFileError::UnsupportedVersion(header.version));
    };
    let payload = &bytes[V2_HEADER_LEN..];
    let actual = Sha256::digest(payload);
    if actual.as_slice() != expected {
        return Err(PackFileError::ChecksumMismatch {
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        });
    }
    inflate_and_decode(payload, header.original_size)
}

fn inflate_and_decode(payload: &[u8], original_size: u32) -> Result<PackContent, PackFileError> {
    let expected = original_size as usize;
    let mut json = Vec::with_capacity(expected.min(MAX_PREALLOC));
    // One byte past the stated size is enough to detect an oversized payload.
    ZlibDecoder::new(payload)
        .take(u64::from(original_size) + 1)
        .read_to_end(&mut json)
        .map_err(PackFileError::Decompress)?;
    if json.len() != expected {
        return Err(PackFileError::SizeMismatch {
            expected,
            actual: json.len(),
        });
    }
    serde_json::from_slice(&json).map_err(PackFileError::Decode)
}

/// Encode `content` and write it to `path`. Returns the number of bytes written.
///
/// # Errors
/// Encoding failures or I/O errors.
pub fn compile(content: &PackContent, path: &Path) -> Result<usize, PackFileError> {
    let bytes = encode(content)?;
    fs::write(path, &bytes)?;
    Ok(bytes.len())
}

/// Read and decode the container at `path`.
///
/// # Errors
/// I/O errors or any decode failure.
pub fn load(path: &Path) -> Result<PackContent, PackFileError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

/// True when the file starts with the pack magic, whatever its extension.
pub fn is_valid_pack_file(path: &Path) -> bool {
    let Ok(mut file) = fs::File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).is_ok() && magic == MAGIC
}

/// Header information for the container at `path`.
///
/// # Errors
/// I/O errors or header failures.
pub fn get_file_info(path: &Path) -> Result<PackFileInfo, PackFileError> {
    let bytes = fs::read(path)?;
    let header = read_header(&bytes)?;
    Ok(PackFileInfo {
        version: header.version,
        original_size: header.original_size,
        compressed_size: bytes.len() - header.header_len(),
        file_size: bytes.len() as u64,
        header_len: header.header_len(),
        checksum: header.checksum.map(hex::encode),
    })
}
