//! Maps an uploaded file name to the kind of content it holds.

/// What an upload is, decided purely by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// A standalone `.bsp` map.
    MapFile,
    /// A Quake 2 PAK container.
    PakArchive,
    /// A zip container (`.zip`, `.pkz` and the dual-extension aliases).
    ZipArchive,
    Unrecognized,
}

impl ContentKind {
    pub fn is_archive(self) -> bool {
        matches!(self, ContentKind::PakArchive | ContentKind::ZipArchive)
    }
}

/// Recognised suffixes. Lookup picks the longest match.
const SUFFIXES: &[(&str, ContentKind)] = &[
    (".bsp", ContentKind::MapFile),
    (".pak", ContentKind::PakArchive),
    (".zip", ContentKind::ZipArchive),
    (".pkz", ContentKind::ZipArchive),
    (".bsp.zip", ContentKind::ZipArchive),
    (".pak.zip", ContentKind::ZipArchive),
];

/// Classifies `name` by case-insensitive suffix. Total: unknown names are `Unrecognized`.
pub fn classify(name: &str) -> ContentKind {
    let lower = name.to_lowercase();
    SUFFIXES
        .iter()
        .filter(|(suffix, _)| lower.len() > suffix.len() && lower.ends_with(suffix))
        .max_by_key(|(suffix, _)| suffix.len())
        .map(|(_, kind)| *kind)
        .unwrap_or(ContentKind::Unrecognized)
}

/// Last path segment of an attachment URL, without query string or fragment.
pub fn file_name_from_url(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    path.rsplit('/').next().unwrap_or(path)
}
