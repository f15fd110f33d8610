//! Header-level validator for Quake 2 (`IBSP` version 38) map files.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::contract::{MapSummary, MapValidator};
use crate::error::FormatValidationError;

const MAGIC: &[u8; 4] = b"IBSP";
const VERSION: i32 = 38;
const LUMP_COUNT: usize = 19;
const HEADER_LEN: usize = 8 + LUMP_COUNT * 8;

const LUMP_ENTITIES: usize = 0;
const LUMP_TEXINFO: usize = 5;
const TEXINFO_LEN: usize = 76;
const TEXINFO_NAME_AT: usize = 40;
const TEXINFO_NAME_LEN: usize = 32;

#[derive(Debug, Default, Clone, Copy)]
pub struct BspValidator;

impl BspValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates an in-memory BSP image.
    pub fn inspect(data: &[u8]) -> Result<MapSummary, FormatValidationError> {
        if data.len() < HEADER_LEN {
            return Err(FormatValidationError::Truncated);
        }
        if &data[..4] != MAGIC {
            return Err(FormatValidationError::BadMagic);
        }
        let version = read_i32(data, 4);
        if version != VERSION {
            return Err(FormatValidationError::UnsupportedVersion(version));
        }

        let mut lumps = Vec::with_capacity(LUMP_COUNT);
        for index in 0..LUMP_COUNT {
            let at = 8 + index * 8;
            let offset = read_i32(data, at);
            let length = read_i32(data, at + 4);
            let lump = usize::try_from(offset)
                .ok()
                .zip(usize::try_from(length).ok())
                .and_then(|(start, len)| data.get(start..start.checked_add(len)?))
                .ok_or(FormatValidationError::LumpOutOfBounds { index })?;
            lumps.push(lump);
        }

        let entity_count = count_entities(lumps[LUMP_ENTITIES]);
        let textures: BTreeSet<&[u8]> = lumps[LUMP_TEXINFO]
            .chunks_exact(TEXINFO_LEN)
            .map(|info| {
                let name = &info[TEXINFO_NAME_AT..TEXINFO_NAME_AT + TEXINFO_NAME_LEN];
                let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
                &name[..end]
            })
            .collect();

        Ok(MapSummary {
            entity_count,
            texture_count: textures.len(),
            byte_size: data.len() as u64,
        })
    }
}

impl MapValidator for BspValidator {
    fn validate(&self, path: &Path) -> Result<MapSummary, FormatValidationError> {
        let data = std::fs::read(path)?;
        let summary = Self::inspect(&data)?;
        debug!(path = %path.display(), ?summary, "Validated BSP");
        Ok(summary)
    }
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    i32::from_le_bytes(word)
}

/// Counts top-level `{ ... }` blocks, ignoring braces inside quoted values.
fn count_entities(lump: &[u8]) -> usize {
    let mut count = 0;
    let mut depth = 0usize;
    let mut quoted = false;
    for &b in lump {
        match b {
            b'"' => quoted = !quoted,
            b'{' if !quoted => {
                if depth == 0 {
                    count += 1;
                }
                depth += 1;
            }
            b'}' if !quoted => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    count
}

/// Builds a minimal valid BSP image with the given entity text and texture names.
pub fn build(entities: &str, textures: &[&str]) -> Vec<u8> {
    let mut texinfo = Vec::with_capacity(textures.len() * TEXINFO_LEN);
    for name in textures {
        let mut record = [0u8; TEXINFO_LEN];
        let bytes = name.as_bytes();
        let n = bytes.len().min(TEXINFO_NAME_LEN - 1);
        record[TEXINFO_NAME_AT..TEXINFO_NAME_AT + n].copy_from_slice(&bytes[..n]);
        texinfo.extend_from_slice(&record);
    }

    let mut out = vec![0u8; HEADER_LEN];
    out[..4].copy_from_slice(MAGIC);
    out[4..8].copy_from_slice(&VERSION.to_le_bytes());
    let put_lump = |out: &mut Vec<u8>, index: usize, body: &[u8]| {
        let offset = out.len() as i32;
        out.extend_from_slice(body);
        let at = 8 + index * 8;
        out[at..at + 4].copy_from_slice(&offset.to_le_bytes());
        out[at + 4..at + 8].copy_from_slice(&(body.len() as i32).to_le_bytes());
    };
    put_lump(&mut out, LUMP_ENTITIES, entities.as_bytes());
    put_lump(&mut out, LUMP_TEXINFO, &texinfo);
    out
}
