//! Save blob codec.
//!
//! A save file is a JSON document, gzip-compressed, then base64-encoded
//! twice. Decoding peels the layers in reverse order; any layer failing
//! aborts the whole decode with [`CoreErrorCode::Format`].

use std::io::{self, Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::document::SaveDocument;

pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;
const MAX_COMPRESSION_LEVEL: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecOptions {
    pub compression_level: u32,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl CodecOptions {
    pub fn with_compression_level(level: u32) -> Result<Self, CoreError> {
        if level > MAX_COMPRESSION_LEVEL {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("invalid compression level {level}, expected 0-{MAX_COMPRESSION_LEVEL}"),
            ));
        }
        Ok(Self {
            compression_level: level,
        })
    }
}

/// Byte length of every layer of a save blob, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecLayers {
    pub outer_len: usize,
    pub inner_len: usize,
    pub compressed_len: usize,
    pub json_len: usize,
}

pub fn decode(blob: &[u8]) -> Result<SaveDocument, CoreError> {
    let (layers, json) = unwrap_layers(blob)?;
    let text = std::str::from_utf8(&json).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Format,
            format!("decompressed payload is not UTF-8: {e}"),
        )
    })?;
    let root = serde_json::from_str(text).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Format,
            format!("decompressed payload is not a valid document: {e}"),
        )
    })?;

    debug!(
        outer_len = layers.outer_len,
        inner_len = layers.inner_len,
        compressed_len = layers.compressed_len,
        json_len = layers.json_len,
        "decoded save blob"
    );
    Ok(SaveDocument::new(root))
}

pub fn encode(doc: &SaveDocument) -> Result<Vec<u8>, CoreError> {
    encode_with(doc, &CodecOptions::default())
}

pub fn encode_with(doc: &SaveDocument, options: &CodecOptions) -> Result<Vec<u8>, CoreError> {
    let json = doc.to_vec()?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(options.compression_level));
    encoder.write_all(&json).map_err(compression_error)?;
    let compressed = encoder.finish().map_err(compression_error)?;

    let inner = STANDARD.encode(&compressed);
    let outer = STANDARD.encode(inner.as_bytes());
    debug!(
        json_len = json.len(),
        compressed_len = compressed.len(),
        inner_len = inner.len(),
        outer_len = outer.len(),
        "encoded save blob"
    );
    Ok(outer.into_bytes())
}

fn compression_error(e: io::Error) -> CoreError {
    CoreError::new(
        CoreErrorCode::Serialization,
        format!("gzip compression failed: {e}"),
    )
}

/// Peel every layer and report their sizes without parsing the document.
pub fn inspect(blob: &[u8]) -> Result<CodecLayers, CoreError> {
    unwrap_layers(blob).map(|(layers, _)| layers)
}

fn unwrap_layers(blob: &[u8]) -> Result<(CodecLayers, Vec<u8>), CoreError> {
    let inner = decode_base64_layer(blob, "outer")?;
    let compressed = decode_base64_layer(&inner, "inner")?;
    let json = gunzip(&compressed)?;

    let layers = CodecLayers {
        outer_len: blob.len(),
        inner_len: inner.len(),
        compressed_len: compressed.len(),
        json_len: json.len(),
    };
    Ok((layers, json))
}

fn decode_base64_layer(input: &[u8], layer: &str) -> Result<Vec<u8>, CoreError> {
    STANDARD.decode(input.trim_ascii()).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Format,
            format!("{layer} base64 layer is malformed: {e}"),
        )
    })
}

fn gunzip(compressed: &[u8]) -> Result<Vec<u8>, CoreError> {
    let mut decoder = MultiGzDecoder::new(compressed);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Format,
            format!("gzip stream is corrupt: {e}"),
        )
    })?;
    Ok(out)
}
