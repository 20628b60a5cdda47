//! Export shape analysis for Routegen.
//!
//! Statically determines which top-level exports a source file provides,
//! without executing it. This is the single seam between "inspect source"
//! and "decide what to generate": the generator never touches syntax-tree
//! nodes directly.

use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingPattern, Declaration, ModuleExportName, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::RoutegenError;

/// Reserved identifier for the per-file data-loading export.
pub const DATA_LOADER_EXPORT: &str = "getServerSideProps";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportShape {
    pub has_default_export: bool,
    pub has_data_loader: bool,
    /// Top-level named export identifiers, in declaration order.
    /// The passthrough promotion rule needs the actual names.
    pub named_exports: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC ANALYSIS
// ═══════════════════════════════════════════════════════════════════════════════

/// Scan only top-level export statements. Tolerated forms: default-export
/// declarations, direct function/variable/class declarations, destructured
/// declarations, and export-specifier lists including re-exports. An
/// `export { x as default }` counts as a default export. `export *` cannot
/// be resolved statically and contributes nothing.
pub fn analyze_source(source: &str, file_path: &str) -> Result<ExportShape, RoutegenError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_typescript(true)
        .with_jsx(true)
        .with_module(true);

    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let detail = ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unrecoverable syntax error".to_string());
        return Err(RoutegenError::parse(file_path, &detail));
    }

    let mut shape = ExportShape::default();
    for stmt in &ret.program.body {
        match stmt {
            Statement::ExportDefaultDeclaration(_) => {
                shape.has_default_export = true;
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(declaration) = &decl.declaration {
                    collect_declared_names(declaration, &mut shape.named_exports);
                }
                for specifier in &decl.specifiers {
                    let exported = export_name(&specifier.exported);
                    if exported == "default" {
                        shape.has_default_export = true;
                    } else if !exported.is_empty() {
                        shape.named_exports.push(exported);
                    }
                }
            }
            _ => {}
        }
    }
    shape.has_data_loader = shape
        .named_exports
        .iter()
        .any(|name| name == DATA_LOADER_EXPORT);
    Ok(shape)
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(s) => s.value.to_string(),
        _ => String::new(),
    }
}

fn collect_declared_names(decl: &Declaration, out: &mut Vec<String>) {
    match decl {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                collect_binding_names(&declarator.id, out);
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                out.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                out.push(id.name.to_string());
            }
        }
        _ => {}
    }
}

fn collect_binding_names(pattern: &BindingPattern, out: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => {
            out.push(id.name.to_string());
        }
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_binding_names(&prop.value, out);
            }
            if let Some(rest) = &obj.rest {
                collect_binding_names(&rest.argument, out);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for element in arr.elements.iter().flatten() {
                collect_binding_names(element, out);
            }
            if let Some(rest) = &arr.rest {
                collect_binding_names(&rest.argument, out);
            }
        }
        _ => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMOIZATION CACHE
// ═══════════════════════════════════════════════════════════════════════════════

struct CacheSlot {
    hash: String,
    shape: ExportShape,
}

/// Process-wide memoization of export shapes, keyed by path and validated
/// by a content hash. Invalidation is explicit: the watch orchestrator
/// calls `invalidate` on every change or delete event for a path. Entries
/// never expire otherwise.
#[derive(Default)]
pub struct ShapeCache {
    entries: Mutex<HashMap<PathBuf, CacheSlot>>,
}

pub fn compute_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and analyze `abs_path`, reusing the memoized shape when the
    /// content hash still matches. `rel_path` identifies the file in errors.
    pub fn analyze(&self, abs_path: &Path, rel_path: &str) -> Result<ExportShape, RoutegenError> {
        let source =
            fs::read_to_string(abs_path).map_err(|e| RoutegenError::io(rel_path, e))?;
        let hash = compute_hash(&source);

        {
            let entries = self.entries.lock().unwrap();
            if let Some(slot) = entries.get(abs_path) {
                if slot.hash == hash {
                    return Ok(slot.shape.clone());
                }
            }
        }

        let shape = analyze_source(&source, rel_path)?;
        self.entries.lock().unwrap().insert(
            abs_path.to_path_buf(),
            CacheSlot {
                hash,
                shape: shape.clone(),
            },
        );
        Ok(shape)
    }

    pub fn invalidate(&self, abs_path: &Path) {
        self.entries.lock().unwrap().remove(abs_path);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(source: &str) -> ExportShape {
        analyze_source(source, "test.tsx").unwrap()
    }

    #[test]
    fn test_default_export_function() {
        let s = shape("export default function Page() { return null; }");
        assert!(s.has_default_export);
        assert!(!s.has_data_loader);
    }

    #[test]
    fn test_default_export_expression() {
        let s = shape("const Page = () => null;\nexport default Page;");
        assert!(s.has_default_export);
    }

    #[test]
    fn test_named_data_loader_function() {
        let s = shape("export async function getServerSideProps(ctx) { return { props: {} }; }");
        assert!(s.has_data_loader);
        assert!(!s.has_default_export);
    }

    #[test]
    fn test_named_data_loader_const() {
        let s = shape("export const getServerSideProps = async () => ({ props: {} });");
        assert!(s.has_data_loader);
    }

    #[test]
    fn test_destructured_export() {
        let s = shape("export const { getServerSideProps, extra } = factory();");
        assert!(s.has_data_loader);
        assert!(s.named_exports.contains(&"extra".to_string()));
    }

    #[test]
    fn test_specifier_list_and_rename() {
        let s = shape("const loader = async () => ({ props: {} });\nexport { loader as getServerSideProps };");
        assert!(s.has_data_loader);
    }

    #[test]
    fn test_reexport_from_module() {
        let s = shape("export { getServerSideProps } from './shared';");
        assert!(s.has_data_loader);
    }

    #[test]
    fn test_default_reexport() {
        let s = shape("export { default } from './page.impl';");
        assert!(s.has_default_export);
    }

    #[test]
    fn test_named_exports_recorded_in_order() {
        let s = shape("export function handler() {}\nexport const config = {};");
        assert_eq!(s.named_exports, vec!["handler", "config"]);
    }

    #[test]
    fn test_typescript_and_jsx_tolerated() {
        let s = shape(
            "type Props = { title: string };\nexport default function Page({ title }: Props) { return <h1>{title}</h1>; }",
        );
        assert!(s.has_default_export);
    }

    #[test]
    fn test_parse_error_reported() {
        let err = analyze_source("export default function (", "broken.tsx").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Parse);
        assert_eq!(err.path, "broken.tsx");
    }

    #[test]
    fn test_cache_reuses_and_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.tsx");
        fs::write(&file, "export default function Page() { return null; }").unwrap();

        let cache = ShapeCache::new();
        let first = cache.analyze(&file, "page.tsx").unwrap();
        assert!(first.has_default_export);
        assert_eq!(cache.len(), 1);

        // A content change is picked up even without explicit invalidation,
        // because the hash no longer matches.
        fs::write(&file, "export const getServerSideProps = async () => ({ props: {} });")
            .unwrap();
        let second = cache.analyze(&file, "page.tsx").unwrap();
        assert!(second.has_data_loader);
        assert!(!second.has_default_export);

        cache.invalidate(&file);
        assert!(cache.is_empty());
    }
}
