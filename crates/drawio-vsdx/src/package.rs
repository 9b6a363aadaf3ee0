// crates/drawio-vsdx/src/package.rs
//
// Reads a VSDX zip container into memory. XML parts are parsed up front, everything else is
// kept as raw bytes for image shapes. A part that fails to parse is set aside; it only turns
// into an error when a stage asks for it.

use crate::xml::{self, Element, XmlError};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};
use tracing::warn;

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOC: u64 = 1 << 20;

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error in part {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: XmlError,
    },
}

pub type PackageResult<T> = Result<T, PackageError>;

#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Element>,
    media: BTreeMap<String, Vec<u8>>,
    malformed: BTreeMap<String, Vec<u8>>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> PackageResult<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> PackageResult<Self> {
        let mut zip = zip::ZipArchive::new(reader)?;
        let mut package = Package::default();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = normalize_part_path(file.name());
            let reserve = usize::try_from(file.size().min(MAX_PREALLOC)).unwrap_or(0);
            let mut bytes = Vec::with_capacity(reserve);
            file.read_to_end(&mut bytes)?;
            package.insert_bytes(&name, bytes);
        }
        Ok(package)
    }

    /// Adds a part, parsing it when its extension marks it as XML. Unparseable XML parts are
    /// kept out of the part map.
    pub fn insert_bytes(&mut self, path: &str, bytes: Vec<u8>) {
        let path = normalize_part_path(path);
        if !is_xml_part(&path) {
            self.media.insert(path, bytes);
            return;
        }
        match xml::parse_bytes(&bytes) {
            Ok(element) => {
                self.parts.insert(path, element);
            }
            Err(error) => {
                warn!(part = %path, %error, "skipping malformed xml part");
                self.malformed.insert(path, bytes);
            }
        }
    }

    /// Parse error of a part that was set aside as malformed.
    pub fn part_error(&self, path: &str) -> Option<PackageError> {
        let path = normalize_part_path(path);
        let bytes = self.malformed.get(&path)?;
        xml::parse_bytes(bytes)
            .err()
            .map(|source| PackageError::Xml { part: path, source })
    }

    pub fn insert_part(&mut self, path: &str, element: Element) {
        self.parts.insert(normalize_part_path(path), element);
    }

    pub fn part(&self, path: &str) -> Option<&Element> {
        self.parts.get(&normalize_part_path(path))
    }

    pub fn media(&self, path: &str) -> Option<&[u8]> {
        self.media.get(&normalize_part_path(path)).map(Vec::as_slice)
    }

    pub fn parts(&self) -> &BTreeMap<String, Element> {
        &self.parts
    }

    pub fn part_paths(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }
}

fn is_xml_part(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".xml") || lower.ends_with(".rels") || lower.ends_with(".vml")
}

/// Canonical form of a part name: no leading slash, `.` and `..` segments collapsed,
/// backslashes treated as separators.
pub fn normalize_part_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Splits `visio/pages/page1.xml` into (`visio/pages`, `page1.xml`).
pub fn split_part_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Resolves a relationship target against the directory of the part that owns the rels.
pub fn resolve_target(owner_path: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_part_path(absolute);
    }
    let (dir, _) = split_part_path(owner_path);
    if dir.is_empty() {
        normalize_part_path(target)
    } else {
        normalize_part_path(&format!("{dir}/{target}"))
    }
}

/// Location of the relationships part that belongs to `path`.
pub fn rels_path_for(path: &str) -> String {
    let (dir, file) = split_part_path(path);
    if dir.is_empty() {
        format!("_rels/{file}.rels")
    } else {
        format!("{dir}/_rels/{file}.rels")
    }
}

/// Reads `Relationship(Id, Target)` entries of the rels part owned by `path`.
/// A missing rels part yields `None`, which callers treat as "no relationships".
pub fn relationships(parts: &BTreeMap<String, Element>, path: &str) -> Option<Relationships> {
    let rels = parts.get(&rels_path_for(path))?;
    let mut out = Relationships::default();
    for rel in rels.children_named("Relationship") {
        let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) else {
            continue;
        };
        if rel.attr("TargetMode") == Some("External") {
            continue;
        }
        out.entries.push(Relationship {
            id: id.to_string(),
            target: resolve_target(path, target),
            kind: rel.attr("Type").unwrap_or_default().to_string(),
        });
    }
    Some(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub target: String,
    pub kind: String,
}

#[derive(Debug, Clone, Default)]
pub struct Relationships {
    pub entries: Vec<Relationship>,
}

impl Relationships {
    pub fn target(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.target.as_str())
    }

    pub fn targets_of_kind<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |r| r.kind.ends_with(suffix))
            .map(|r| r.target.as_str())
    }
}
