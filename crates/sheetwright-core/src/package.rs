//! The package layer: the ZIP archive interface, part path resolution,
//! and relationship-id allocation.
//!
//! The archive is treated as a bag of `{path -> bytes}`: reads are
//! materialized up front (read-through, never lazy) and writes buffer all
//! parts until `finish`.

use std::io::{Cursor, Read, Write};

use sheetwright_xml::relationships::{rel_types, Relationship, Relationships};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::{Error, Result};

/// Read side of the archive interface.
pub struct ArchiveReader {
    names: Vec<String>,
    archive: zip::ZipArchive<Cursor<Vec<u8>>>,
}

impl ArchiveReader {
    /// Open a ZIP archive from bytes.
    pub fn open(data: &[u8]) -> Result<Self> {
        let cursor = Cursor::new(data.to_vec());
        let archive = zip::ZipArchive::new(cursor).map_err(|e| Error::Zip(e.to_string()))?;
        let names = archive.file_names().map(|n| n.to_string()).collect();
        Ok(Self { names, archive })
    }

    /// Resolve a path against the member list: exact match first, then
    /// with the leading-slash difference normalized, then
    /// case-insensitively.
    fn resolve(&self, path: &str) -> Option<String> {
        let bare = path.trim_start_matches('/');
        if self.names.iter().any(|n| n == path) {
            return Some(path.to_string());
        }
        if self.names.iter().any(|n| n == bare) {
            return Some(bare.to_string());
        }
        let slashed = format!("/{bare}");
        if self.names.iter().any(|n| *n == slashed) {
            return Some(slashed);
        }
        self.names
            .iter()
            .find(|n| n.trim_start_matches('/').eq_ignore_ascii_case(bare))
            .cloned()
    }

    pub fn has(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    pub fn read_bytes(&mut self, path: &str) -> Option<Vec<u8>> {
        let name = self.resolve(path)?;
        let mut file = self.archive.by_name(&name).ok()?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf).ok()?;
        Some(buf)
    }

    pub fn read_utf8(&mut self, path: &str) -> Option<String> {
        let bytes = self.read_bytes(path)?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn member_names(&self) -> &[String] {
        &self.names
    }
}

/// Write side of the archive interface. Parts are buffered so the
/// compression decision is deferred to [`ArchiveWriter::finish`].
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    parts: Vec<(String, Vec<u8>)>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part. Re-adding a path replaces the previous bytes.
    pub fn add(&mut self, path: &str, bytes: Vec<u8>) {
        self.parts.retain(|(p, _)| p != path);
        self.parts.push((path.to_string(), bytes));
    }

    pub fn has(&self, path: &str) -> bool {
        self.parts.iter().any(|(p, _)| p == path)
    }

    /// Produce the archive bytes.
    pub fn finish(self, compress: bool) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let method = if compress {
                CompressionMethod::Deflated
            } else {
                CompressionMethod::Stored
            };
            let options = SimpleFileOptions::default().compression_method(method);
            for (path, bytes) in &self.parts {
                zip.start_file(path.as_str(), options)
                    .map_err(|e| Error::Zip(e.to_string()))?;
                zip.write_all(bytes)?;
            }
            zip.finish().map_err(|e| Error::Zip(e.to_string()))?;
        }
        Ok(buf)
    }
}

/// Resolve a relationship target against the referring part's directory,
/// stripping `./` and resolving `..` segments. External targets must be
/// handled by the caller before resolution.
pub fn resolve_target(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let base_dir = match base_part.rfind('/') {
        Some(pos) => &base_part[..pos],
        None => "",
    };
    let mut segments: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// The sibling `.rels` part for a given part path:
/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rfind('/') {
        Some(pos) => format!("{}/_rels/{}.rels", &part[..pos], &part[pos + 1..]),
        None => format!("_rels/{part}.rels"),
    }
}

/// Add a relationship. `id` of `None` auto-assigns the next free `rId<N>`
/// by scanning; an explicit id that is already taken is fatal. Hyperlink
/// relationships force `TargetMode=External`.
pub fn add_relationship(
    rels: &mut Relationships,
    id: Option<u32>,
    rel_type: &str,
    target: &str,
    external: bool,
) -> Result<String> {
    let n = match id {
        Some(n) => {
            if rels.is_taken(n) {
                return Err(Error::RelationshipIdCollision(n));
            }
            n
        }
        None => rels.next_free_id(),
    };
    let forced_external = external || rel_type == rel_types::HYPERLINK;
    let id = format!("rId{n}");
    rels.relationships.push(Relationship {
        id: id.clone(),
        rel_type: rel_type.to_string(),
        target: target.to_string(),
        target_mode: forced_external.then(|| "External".to_string()),
    });
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_archive() -> Vec<u8> {
        let mut w = ArchiveWriter::new();
        w.add("[Content_Types].xml", b"<Types/>".to_vec());
        w.add("xl/workbook.xml", b"<workbook/>".to_vec());
        w.add("xl/worksheets/sheet1.xml", b"<worksheet/>".to_vec());
        w.finish(true).unwrap()
    }

    // ----- archive round trips ---------------------------------------------

    #[test]
    fn test_write_then_read() {
        let bytes = sample_archive();
        let mut r = ArchiveReader::open(&bytes).unwrap();
        assert!(r.has("xl/workbook.xml"));
        assert_eq!(r.read_utf8("xl/workbook.xml").unwrap(), "<workbook/>");
        assert!(r.read_bytes("missing.xml").is_none());
    }

    #[test]
    fn test_stored_mode_roundtrip() {
        let mut w = ArchiveWriter::new();
        w.add("a.txt", b"hello".to_vec());
        let bytes = w.finish(false).unwrap();
        let mut r = ArchiveReader::open(&bytes).unwrap();
        assert_eq!(r.read_utf8("a.txt").unwrap(), "hello");
    }

    #[test]
    fn test_leading_slash_tolerance() {
        let bytes = sample_archive();
        let mut r = ArchiveReader::open(&bytes).unwrap();
        assert!(r.has("/xl/workbook.xml"));
        assert_eq!(r.read_utf8("/xl/workbook.xml").unwrap(), "<workbook/>");
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let bytes = sample_archive();
        let mut r = ArchiveReader::open(&bytes).unwrap();
        assert!(r.has("XL/WORKBOOK.XML"));
        assert_eq!(r.read_utf8("XL/WORKBOOK.XML").unwrap(), "<workbook/>");
    }

    #[test]
    fn test_open_garbage_fails() {
        assert!(ArchiveReader::open(b"not a zip").is_err());
    }

    #[test]
    fn test_add_replaces_existing_part() {
        let mut w = ArchiveWriter::new();
        w.add("a.txt", b"one".to_vec());
        w.add("a.txt", b"two".to_vec());
        let bytes = w.finish(true).unwrap();
        let mut r = ArchiveReader::open(&bytes).unwrap();
        assert_eq!(r.read_utf8("a.txt").unwrap(), "two");
    }

    // ----- path resolution --------------------------------------------------

    #[test]
    fn test_resolve_target_sibling() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
    }

    #[test]
    fn test_resolve_target_parent() {
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../comments1.xml"),
            "xl/comments1.xml"
        );
    }

    #[test]
    fn test_resolve_target_dot_segments() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "./styles.xml"),
            "xl/styles.xml"
        );
    }

    #[test]
    fn test_resolve_target_absolute() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "/docProps/core.xml"),
            "docProps/core.xml"
        );
    }

    #[test]
    fn test_resolve_target_from_root_part() {
        assert_eq!(resolve_target("_rels/.rels", "xl/workbook.xml"), "_rels/xl/workbook.xml");
        assert_eq!(resolve_target(".rels", "xl/workbook.xml"), "xl/workbook.xml");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("xl/workbook.xml"),
            "xl/_rels/workbook.xml.rels"
        );
        assert_eq!(
            rels_path_for("xl/worksheets/sheet2.xml"),
            "xl/worksheets/_rels/sheet2.xml.rels"
        );
    }

    // ----- relationship allocation ------------------------------------------

    #[test]
    fn test_add_relationship_auto_assign() {
        let mut rels = Relationships::new();
        let id1 = add_relationship(&mut rels, None, rel_types::WORKSHEET, "sheet1.xml", false)
            .unwrap();
        let id2 = add_relationship(&mut rels, None, rel_types::STYLES, "styles.xml", false)
            .unwrap();
        assert_eq!(id1, "rId1");
        assert_eq!(id2, "rId2");
    }

    #[test]
    fn test_add_relationship_explicit_id() {
        let mut rels = Relationships::new();
        let id = add_relationship(&mut rels, Some(5), rel_types::STYLES, "styles.xml", false)
            .unwrap();
        assert_eq!(id, "rId5");
        // Auto-assignment scans over the explicit id.
        let next = add_relationship(&mut rels, None, rel_types::THEME, "theme1.xml", false)
            .unwrap();
        assert_eq!(next, "rId1");
    }

    #[test]
    fn test_add_relationship_collision_is_fatal() {
        let mut rels = Relationships::new();
        add_relationship(&mut rels, Some(3), rel_types::STYLES, "styles.xml", false).unwrap();
        let err =
            add_relationship(&mut rels, Some(3), rel_types::THEME, "theme1.xml", false)
                .unwrap_err();
        assert_eq!(err.to_string(), "Cannot rewrite rId 3");
    }

    #[test]
    fn test_hyperlink_forces_external() {
        let mut rels = Relationships::new();
        add_relationship(
            &mut rels,
            None,
            rel_types::HYPERLINK,
            "https://example.com",
            false,
        )
        .unwrap();
        assert_eq!(
            rels.relationships[0].target_mode.as_deref(),
            Some("External")
        );
    }
}
