//! Layout chain resolution for Routegen.
//!
//! A route inherits the layouts of every grouping folder on its path,
//! outermost first. Layouts attach to grouping folders only; plain segments
//! never carry one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::mapper::{classify_segment, SegmentKind, LAYOUT_STEM, SOURCE_EXTENSIONS};

/// A resolved layout file, identified by its path relative to the tree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRef {
    pub rel_path: String,
}

impl LayoutRef {
    pub fn abs_path(&self, routes_dir: &Path) -> PathBuf {
        routes_dir.join(&self.rel_path)
    }
}

/// Walk the route's non-terminal segments left to right and probe each
/// grouping folder for a layout file, trying the fixed extension candidates
/// in order. The returned chain preserves traversal order, outermost first.
pub fn resolve_layout_chain(routes_dir: &Path, route_segments: &[String]) -> Vec<LayoutRef> {
    let mut chain = Vec::new();
    if route_segments.len() < 2 {
        return chain;
    }
    let mut prefix: Vec<&str> = Vec::new();
    for segment in &route_segments[..route_segments.len() - 1] {
        prefix.push(segment.as_str());
        if classify_segment(segment) == SegmentKind::Group {
            if let Some(layout) = probe_layout(routes_dir, &prefix) {
                chain.push(layout);
            }
        }
    }
    chain
}

fn probe_layout(routes_dir: &Path, folder_segments: &[&str]) -> Option<LayoutRef> {
    for ext in SOURCE_EXTENSIONS {
        let rel_path = format!(
            "{}/{}.{}",
            folder_segments.join("/"),
            LAYOUT_STEM,
            ext
        );
        if routes_dir.join(&rel_path).is_file() {
            return Some(LayoutRef { rel_path });
        }
    }
    None
}

/// Whether the given layout participates in the chain of the given route.
/// Used by the watch orchestrator to scope regeneration after a layout edit.
pub fn chain_contains(routes_dir: &Path, route_segments: &[String], layout_rel: &str) -> bool {
    resolve_layout_chain(routes_dir, route_segments)
        .iter()
        .any(|l| l.rel_path == layout_rel)
}
