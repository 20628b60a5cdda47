//! Route tree mapping for Routegen.
//!
//! Classifies every file under the route tree root and computes, for each
//! route-defining file, its unique flat location in the generated directory.
//! Classification is purely lexical: delimiter characters and reserved
//! filenames, never file system metadata or file contents.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path};

/// Reserved terminal stem for route definitions.
pub const ROUTE_STEM: &str = "page";
/// Reserved terminal stem for layout definitions.
pub const LAYOUT_STEM: &str = "layout";
/// Reserved top-level sub-root preserved path-for-path in the output.
pub const API_ROOT: &str = "api";
/// Extension of every generated artifact.
pub const GENERATED_EXT: &str = "js";
/// Target of a route file sitting directly at the tree root.
pub const INDEX_ARTIFACT: &str = "index.js";
/// Source extension candidates, in probe order. First match wins.
pub const SOURCE_EXTENSIONS: [&str; 4] = ["tsx", "ts", "jsx", "js"];

lazy_static! {
    /// Root-level files copied byte-for-byte instead of compiled.
    static ref SPECIAL_STEMS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("_app");
        s.insert("_document");
        s.insert("_error");
        s
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEGMENT CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    /// Contributes to the target path.
    Plain,
    /// Enclosed in the grouping delimiter pair; contributes to layout
    /// resolution but is elided from the target path.
    Group,
}

/// An unterminated delimiter does not match and degrades to `Plain`.
pub fn classify_segment(segment: &str) -> SegmentKind {
    if segment.len() >= 2 && segment.starts_with('(') && segment.ends_with(')') {
        SegmentKind::Group
    } else {
        SegmentKind::Plain
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROLE CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteRole {
    /// A page-equivalent, named by the reserved `page` stem.
    Route,
    /// A wrapping view for a grouping folder.
    Layout,
    /// Root-level shell file, copied verbatim.
    Special,
    /// Anything under the reserved API sub-root, preserved path-for-path.
    Passthrough,
    /// Co-located asset or helper. Ignored by generation, never copied.
    Other,
}

/// One source file under the route tree root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTreeEntry {
    pub abs_path: String,
    /// Relative to the tree root, forward-slash separated.
    pub rel_path: String,
    pub segments: Vec<String>,
    pub role: RouteRole,
}

impl RouteTreeEntry {
    /// Build an entry from the tree root and an absolute file path.
    /// Returns `None` for paths outside the root or not representable.
    pub fn from_paths(root: &Path, abs: &Path) -> Option<Self> {
        let rel = abs.strip_prefix(root).ok()?;
        let segments: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_str()?.to_string()),
                _ => None,
            })
            .collect();
        if segments.is_empty() {
            return None;
        }
        let role = classify_role(&segments);
        Some(Self {
            abs_path: abs.to_string_lossy().to_string(),
            rel_path: segments.join("/"),
            segments,
            role,
        })
    }
}

pub fn split_stem_ext(filename: &str) -> (&str, &str) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext),
        None => (filename, ""),
    }
}

pub fn is_source_file(filename: &str) -> bool {
    let (_, ext) = split_stem_ext(filename);
    SOURCE_EXTENSIONS.contains(&ext)
}

pub fn classify_role(segments: &[String]) -> RouteRole {
    let Some(terminal) = segments.last() else {
        return RouteRole::Other;
    };
    if !is_source_file(terminal) {
        return RouteRole::Other;
    }
    // The API sub-root takes precedence over every reserved stem below it.
    if segments.len() > 1 && segments[0] == API_ROOT {
        return RouteRole::Passthrough;
    }
    let (stem, _) = split_stem_ext(terminal);
    if stem == ROUTE_STEM {
        RouteRole::Route
    } else if stem == LAYOUT_STEM {
        RouteRole::Layout
    } else if segments.len() == 1 && SPECIAL_STEMS.contains(stem) {
        RouteRole::Special
    } else {
        RouteRole::Other
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TARGET PATH MAPPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Compute the flat output location for an entry, relative to the output
/// root. A pure function of the relative path and its grouping segments.
/// `Layout` and `Other` entries have no target of their own.
pub fn target_path(entry: &RouteTreeEntry) -> Option<String> {
    match entry.role {
        RouteRole::Passthrough => {
            let mut segments = entry.segments.clone();
            let terminal = segments.pop()?;
            let (stem, _) = split_stem_ext(&terminal);
            segments.push(format!("{}.{}", stem, GENERATED_EXT));
            Some(segments.join("/"))
        }
        RouteRole::Route => {
            let kept: Vec<&str> = entry.segments[..entry.segments.len() - 1]
                .iter()
                .filter(|s| classify_segment(s) == SegmentKind::Plain)
                .map(|s| s.as_str())
                .collect();
            if kept.is_empty() {
                // The home route: no retained segments maps to the index
                // artifact, never an empty path.
                return Some(INDEX_ARTIFACT.to_string());
            }
            Some(format!("{}.{}", kept.join("/"), GENERATED_EXT))
        }
        // Special copies keep their original filename, extension included.
        RouteRole::Special => entry.segments.last().cloned(),
        RouteRole::Layout | RouteRole::Other => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
