//! Reader for the Quake 2 PAK container.
//!
//! Layout: `"PACK"`, directory offset (u32 LE), directory length (u32 LE); the directory is
//! a run of 64-byte records, a NUL-padded 56-byte name followed by file offset and length.

use crate::error::PakError;

const MAGIC: &[u8; 4] = b"PACK";
const HEADER_LEN: usize = 12;
const ENTRY_LEN: usize = 64;
const NAME_LEN: usize = 56;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakEntry<'a> {
    pub name: String,
    pub data: &'a [u8],
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

fn slice(data: &[u8], offset: u32, length: u32) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(usize::try_from(length).ok()?)?;
    data.get(start..end)
}

/// Parses the directory and borrows each entry's bytes from `data`.
pub fn entries(data: &[u8]) -> Result<Vec<PakEntry<'_>>, PakError> {
    if data.len() < HEADER_LEN {
        return Err(PakError::Truncated);
    }
    if &data[..4] != MAGIC {
        return Err(PakError::BadMagic);
    }
    let dir_offset = read_u32(data, 4);
    let dir_length = read_u32(data, 8);
    if dir_length as usize % ENTRY_LEN != 0 {
        return Err(PakError::DirectoryMisaligned(dir_length));
    }
    let directory = slice(data, dir_offset, dir_length).ok_or(PakError::DirectoryOutOfBounds {
        offset: dir_offset,
        length: dir_length,
    })?;

    directory
        .chunks_exact(ENTRY_LEN)
        .map(|record| {
            let raw_name = &record[..NAME_LEN];
            let end = raw_name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
            let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();
            let offset = read_u32(record, NAME_LEN);
            let length = read_u32(record, NAME_LEN + 4);
            match slice(data, offset, length) {
                Some(bytes) => Ok(PakEntry { name, data: bytes }),
                None => Err(PakError::EntryOutOfBounds { name }),
            }
        })
        .collect()
}

/// Builds a PAK image from `(name, bytes)` pairs. Names longer than 55 bytes are truncated.
pub fn build(files: &[(&str, &[u8])]) -> Vec<u8> {
    let body_len: usize = files.iter().map(|(_, d)| d.len()).sum();
    let dir_offset = HEADER_LEN + body_len;
    let mut out = Vec::with_capacity(dir_offset + files.len() * ENTRY_LEN);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(dir_offset as u32).to_le_bytes());
    out.extend_from_slice(&((files.len() * ENTRY_LEN) as u32).to_le_bytes());

    let mut directory = Vec::with_capacity(files.len() * ENTRY_LEN);
    for (name, data) in files {
        let offset = out.len() as u32;
        out.extend_from_slice(data);
        let mut record = [0u8; ENTRY_LEN];
        let name = name.as_bytes();
        let n = name.len().min(NAME_LEN - 1);
        record[..n].copy_from_slice(&name[..n]);
        record[NAME_LEN..NAME_LEN + 4].copy_from_slice(&offset.to_le_bytes());
        record[NAME_LEN + 4..].copy_from_slice(&(data.len() as u32).to_le_bytes());
        directory.extend_from_slice(&record);
    }
    out.extend_from_slice(&directory);
    out
}
