//! Directory reconciliation for Routegen.
//!
//! One full pass enumerates the route tree, removes stale artifacts from
//! the output root, then writes every current artifact. The two phases run
//! in order; per-entry failures are isolated so one malformed or locked
//! file never aborts the pass.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry as MapEntry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::codegen::{
    generate_passthrough_artifact, generate_route_artifact, LayoutPlanEntry, RoutePlan,
};
use crate::config::CompilerConfig;
use crate::error::{Diagnostic, RoutegenError};
use crate::exports::ShapeCache;
use crate::layouts::{chain_contains, resolve_layout_chain};
use crate::mapper::{target_path, RouteRole, RouteTreeEntry};

// ═══════════════════════════════════════════════════════════════════════════════
// PASS REPORT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub written: usize,
    pub unchanged: usize,
    pub copied: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl SyncReport {
    fn absorb(&mut self, other: SyncReport) {
        self.written += other.written;
        self.unchanged += other.unchanged;
        self.copied += other.copied;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.diagnostics.extend(other.diagnostics);
    }

    fn skip(diagnostic: Diagnostic) -> SyncReport {
        SyncReport {
            skipped: 1,
            diagnostics: vec![diagnostic],
            ..SyncReport::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER CORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Owns the configuration and the export-shape cache for the process
/// lifetime. All reconciliation entry points live here.
pub struct RouteCompiler {
    config: CompilerConfig,
    cache: ShapeCache,
}

impl RouteCompiler {
    pub fn new(config: CompilerConfig) -> Result<Self, RoutegenError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: ShapeCache::new(),
        })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn cache(&self) -> &ShapeCache {
        &self.cache
    }

    /// Enumerate every file under the route tree root, sorted by relative
    /// path so collision handling and reports are deterministic.
    pub fn discover(&self) -> Vec<RouteTreeEntry> {
        let root = self.config.routes_root();
        let mut entries = Vec::new();
        for walked in WalkDir::new(root).follow_links(true) {
            if let Ok(walked) = walked {
                if walked.file_type().is_file() {
                    if let Some(entry) = RouteTreeEntry::from_paths(root, walked.path()) {
                        entries.push(entry);
                    }
                }
            }
        }
        entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        entries
    }

    /// One full reconciliation pass: delete stale artifacts, then write
    /// every current one.
    pub fn full_sync(&self) -> SyncReport {
        let mut report = SyncReport::default();
        let entries = self.discover();

        // Entry -> target map. Grouping elision can fold two distinct
        // folder paths onto one target; the first claim (lexicographic)
        // wins and the rest are reported.
        let mut targets: BTreeMap<String, RouteTreeEntry> = BTreeMap::new();
        for entry in entries {
            let Some(target) = target_path(&entry) else {
                continue;
            };
            match targets.entry(target) {
                MapEntry::Vacant(slot) => {
                    slot.insert(entry);
                }
                MapEntry::Occupied(slot) => {
                    report.absorb(SyncReport::skip(Diagnostic::warning(
                        format!(
                            "target {} already claimed by {}",
                            slot.key(),
                            slot.get().rel_path
                        ),
                        Some(entry.rel_path),
                    )));
                }
            }
        }

        report.absorb(self.delete_stale(&targets));

        let work: Vec<(&String, &RouteTreeEntry)> = targets.iter().collect();
        let outcomes: Vec<SyncReport> = work
            .par_iter()
            .map(|(target, entry)| self.emit_entry(entry, target.as_str()))
            .collect();
        for outcome in outcomes {
            report.absorb(outcome);
        }

        eprintln!(
            "[Routegen] sync complete: {} written, {} unchanged, {} copied, {} deleted, {} skipped",
            report.written, report.unchanged, report.copied, report.deleted, report.skipped
        );
        for diagnostic in &report.diagnostics {
            eprintln!(
                "[Routegen] {:?}: {} ({})",
                diagnostic.level,
                diagnostic.message,
                diagnostic.path.as_deref().unwrap_or("-")
            );
        }
        report
    }

    /// Regenerate the artifact(s) affected by one source file, without a
    /// full pass. Layout files fan out to exactly the routes whose chain
    /// contains them.
    pub fn regenerate_file(&self, abs_path: &Path) -> SyncReport {
        let root = self.config.routes_root();
        let Some(entry) = RouteTreeEntry::from_paths(root, abs_path) else {
            return SyncReport::default();
        };
        match entry.role {
            RouteRole::Route | RouteRole::Passthrough | RouteRole::Special => {
                match target_path(&entry) {
                    Some(target) => self.emit_entry(&entry, &target),
                    None => SyncReport::default(),
                }
            }
            RouteRole::Layout => self.regenerate_routes_under(&entry.rel_path),
            RouteRole::Other => SyncReport::default(),
        }
    }

    fn regenerate_routes_under(&self, layout_rel: &str) -> SyncReport {
        let root = self.config.routes_root();
        let mut report = SyncReport::default();
        for entry in self.discover() {
            if entry.role != RouteRole::Route {
                continue;
            }
            if !chain_contains(root, &entry.segments, layout_rel) {
                continue;
            }
            if let Some(target) = target_path(&entry) {
                report.absorb(self.emit_entry(&entry, &target));
            }
        }
        report
    }

    // ───────────────────────────────────────────────────────────────────────
    // Phase 1: stale-artifact removal
    // ───────────────────────────────────────────────────────────────────────

    fn delete_stale(&self, targets: &BTreeMap<String, RouteTreeEntry>) -> SyncReport {
        let mut report = SyncReport::default();
        let pages_root = self.config.pages_root();
        if !pages_root.is_dir() {
            return report;
        }
        for walked in WalkDir::new(pages_root) {
            let Ok(walked) = walked else { continue };
            if !walked.file_type().is_file() {
                continue;
            }
            let Some(rel) = slash_relative(pages_root, walked.path()) else {
                continue;
            };
            if targets.contains_key(&rel) {
                continue;
            }
            match fs::remove_file(walked.path()) {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    // A stuck deletion must not block the write phase.
                    report.diagnostics.push(Diagnostic::error(
                        format!("failed to delete stale artifact: {}", err),
                        Some(rel),
                    ));
                }
            }
        }
        report
    }

    // ───────────────────────────────────────────────────────────────────────
    // Phase 2: artifact emission
    // ───────────────────────────────────────────────────────────────────────

    fn emit_entry(&self, entry: &RouteTreeEntry, target_rel: &str) -> SyncReport {
        match entry.role {
            RouteRole::Route => self.emit_route(entry, target_rel),
            RouteRole::Passthrough => self.emit_passthrough(entry, target_rel),
            RouteRole::Special => self.copy_special(entry, target_rel),
            RouteRole::Layout | RouteRole::Other => SyncReport::default(),
        }
    }

    fn emit_route(&self, entry: &RouteTreeEntry, target_rel: &str) -> SyncReport {
        let root = self.config.routes_root();
        let shape = match self.cache.analyze(Path::new(&entry.abs_path), &entry.rel_path) {
            Ok(shape) => shape,
            Err(err) => return self.report_entry_error(err),
        };

        let mut layouts = Vec::new();
        for layout in resolve_layout_chain(root, &entry.segments) {
            let layout_abs = layout.abs_path(root);
            match self.cache.analyze(&layout_abs, &layout.rel_path) {
                Ok(layout_shape) => layouts.push(LayoutPlanEntry {
                    layout,
                    shape: layout_shape,
                }),
                // A broken layout poisons this route, not the pass.
                Err(err) => return self.report_entry_error(err),
            }
        }

        let plan = RoutePlan {
            rel_path: entry.rel_path.clone(),
            target_rel: target_rel.to_string(),
            shape,
            layouts,
        };
        match generate_route_artifact(&self.config, &plan) {
            Some(artifact) => self.write_artifact(target_rel, &artifact),
            None => SyncReport::skip(Diagnostic::warning(
                "route file exports neither a view unit nor a data loader",
                Some(entry.rel_path.clone()),
            )),
        }
    }

    fn emit_passthrough(&self, entry: &RouteTreeEntry, target_rel: &str) -> SyncReport {
        let shape = match self.cache.analyze(Path::new(&entry.abs_path), &entry.rel_path) {
            Ok(shape) => shape,
            Err(err) => return self.report_entry_error(err),
        };
        match generate_passthrough_artifact(&self.config, &entry.rel_path, target_rel, &shape) {
            Some(artifact) => self.write_artifact(target_rel, &artifact),
            None => SyncReport::skip(Diagnostic::warning(
                "passthrough file has no re-exportable default or sole named export",
                Some(entry.rel_path.clone()),
            )),
        }
    }

    fn copy_special(&self, entry: &RouteTreeEntry, target_rel: &str) -> SyncReport {
        let source = match fs::read(&entry.abs_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                return self.report_entry_error(RoutegenError::io(&entry.rel_path, err));
            }
        };
        let target_abs = self.config.pages_root().join(target_rel);
        if let Ok(existing) = fs::read(&target_abs) {
            if existing == source {
                return SyncReport {
                    unchanged: 1,
                    ..SyncReport::default()
                };
            }
        }
        if let Some(parent) = target_abs.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                return self
                    .report_entry_error(RoutegenError::write(target_rel, &err.to_string()));
            }
        }
        match fs::write(&target_abs, source) {
            Ok(()) => SyncReport {
                copied: 1,
                ..SyncReport::default()
            },
            Err(err) => self.report_entry_error(RoutegenError::write(target_rel, &err.to_string())),
        }
    }

    fn write_artifact(&self, target_rel: &str, artifact: &str) -> SyncReport {
        let target_abs = self.config.pages_root().join(target_rel);
        if let Ok(existing) = fs::read_to_string(&target_abs) {
            if existing == artifact {
                return SyncReport {
                    unchanged: 1,
                    ..SyncReport::default()
                };
            }
        }
        if let Some(parent) = target_abs.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                return self
                    .report_entry_error(RoutegenError::write(target_rel, &err.to_string()));
            }
        }
        match fs::write(&target_abs, artifact) {
            Ok(()) => SyncReport {
                written: 1,
                ..SyncReport::default()
            },
            Err(err) => self.report_entry_error(RoutegenError::write(target_rel, &err.to_string())),
        }
    }

    fn report_entry_error(&self, err: RoutegenError) -> SyncReport {
        eprintln!("[Routegen] {}", err);
        SyncReport::skip(Diagnostic::from(err))
    }
}

fn slash_relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
