//! Artifact generation for Routegen.
//!
//! Combines a route's export shape and layout chain into new source text:
//! imports referencing the originals, one composed default view, and one
//! combined data-loading function. Output is deterministic for a given
//! input state so regeneration is idempotent; artifacts are regenerated
//! wholesale, never patched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::CompilerConfig;
use crate::exports::{ExportShape, DATA_LOADER_EXPORT};
use crate::layouts::LayoutRef;
use crate::mapper::split_stem_ext;
use crate::merge::LOADER_HELPERS_JS;

/// First line of every generated artifact.
pub const GENERATED_BANNER: &str = "// @generated by routegen. Do not edit.";

/// Named export promoted to default for data-only passthrough endpoints.
pub const PASSTHROUGH_DESIGNATED_EXPORT: &str = "handler";

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION PLAN
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPlanEntry {
    pub layout: LayoutRef,
    pub shape: ExportShape,
}

/// Everything the generator needs to know about one route, resolved by the
/// synchronizer. Layouts are ordered outermost first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub rel_path: String,
    pub target_rel: String,
    pub shape: ExportShape,
    pub layouts: Vec<LayoutPlanEntry>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW COMPOSITION IR
// ═══════════════════════════════════════════════════════════════════════════════

/// Intermediate representation of the composed view. Built by a fold over
/// the layout chain, serialized to source text in a separate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewExpr {
    Leaf { ident: String },
    Layer { ident: String, inner: Box<ViewExpr> },
}

/// Nest the route's view unit inside each layout's view unit, outermost
/// first.
pub fn compose_view(route_ident: &str, layout_idents: &[String]) -> ViewExpr {
    let mut expr = ViewExpr::Leaf {
        ident: route_ident.to_string(),
    };
    for ident in layout_idents.iter().rev() {
        expr = ViewExpr::Layer {
            ident: ident.clone(),
            inner: Box::new(expr),
        };
    }
    expr
}

/// Render the IR to a JSX expression. Every layer forwards the same
/// property bag to its inner child.
pub fn render_view(expr: &ViewExpr) -> String {
    match expr {
        ViewExpr::Leaf { ident } => format!("<{} {{...props}} />", ident),
        ViewExpr::Layer { ident, inner } => {
            format!("<{} {{...props}}>{}</{}>", ident, render_view(inner), ident)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORT PATHS
// ═══════════════════════════════════════════════════════════════════════════════

/// Relative module specifier from the directory holding the generated file
/// to a source file, extension stripped, always with a leading `./` or
/// `../` so the host resolver treats it as a relative import.
pub fn relative_import(from_dir: &Path, to_file: &Path) -> String {
    let from: Vec<_> = from_dir.components().collect();
    let to: Vec<_> = to_file.components().collect();
    let mut common = 0;
    while common < from.len() && common < to.len() && from[common] == to[common] {
        common += 1;
    }
    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

fn source_specifier(config: &CompilerConfig, target_rel: &str, source_rel: &str) -> String {
    let target_dir = match Path::new(target_rel).parent() {
        Some(parent) => config.pages_root().join(parent),
        None => config.pages_root().to_path_buf(),
    };
    let (stem, _) = split_stem_ext(source_rel);
    let source_file: PathBuf = config.routes_root().join(stem);
    relative_import(&target_dir, &source_file)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTE ARTIFACTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Produce the artifact text for one route, or `None` when the route file
/// exports neither a view unit nor a data loader and there is nothing to
/// emit.
pub fn generate_route_artifact(config: &CompilerConfig, plan: &RoutePlan) -> Option<String> {
    // Layouts participate in the view only with a default export; they
    // contribute to the combined loader independently of that.
    let view_layouts: Vec<(usize, &LayoutPlanEntry)> = plan
        .layouts
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.shape.has_default_export)
        .collect();
    let loader_layouts: Vec<(usize, &LayoutPlanEntry)> = plan
        .layouts
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.shape.has_data_loader)
        .collect();

    let emit_view = plan.shape.has_default_export;
    let emit_loader = plan.shape.has_data_loader || !loader_layouts.is_empty();
    if !emit_view && !emit_loader {
        return None;
    }

    let mut imports: Vec<String> = Vec::new();
    let mut body: Vec<String> = Vec::new();

    if emit_view {
        for (index, entry) in &view_layouts {
            let spec = source_specifier(config, &plan.target_rel, &entry.layout.rel_path);
            imports.push(format!("import Layout{} from \"{}\";", index, spec));
        }
        let page_spec = source_specifier(config, &plan.target_rel, &plan.rel_path);
        imports.push(format!("import Page from \"{}\";", page_spec));
    }

    if emit_loader {
        for (index, entry) in &loader_layouts {
            let spec = source_specifier(config, &plan.target_rel, &entry.layout.rel_path);
            imports.push(format!(
                "import {{ {} as layoutLoader{} }} from \"{}\";",
                DATA_LOADER_EXPORT, index, spec
            ));
        }
        if plan.shape.has_data_loader {
            let spec = source_specifier(config, &plan.target_rel, &plan.rel_path);
            imports.push(format!(
                "import {{ {} as pageLoader }} from \"{}\";",
                DATA_LOADER_EXPORT, spec
            ));
        }
    }

    if emit_view {
        if let Some(wrapper) = &config.component_wrapper_function {
            imports.push(format!(
                "import {{ {} }} from \"{}\";",
                wrapper.exported_name, wrapper.import_path
            ));
        }
        let idents: Vec<String> = view_layouts
            .iter()
            .map(|(index, _)| format!("Layout{}", index))
            .collect();
        let view = compose_view("Page", &idents);
        body.push(format!(
            "function RouteView(props) {{\n  return (\n    {}\n  );\n}}",
            render_view(&view)
        ));
        match &config.component_wrapper_function {
            Some(wrapper) => body.push(format!(
                "export default {}(RouteView);",
                wrapper.exported_name
            )),
            None => body.push("export default RouteView;".to_string()),
        }
    }

    if emit_loader {
        if let Some(wrapper) = &config.data_loader_wrapper_function {
            imports.push(format!(
                "import {{ {} }} from \"{}\";",
                wrapper.exported_name, wrapper.import_path
            ));
        }
        body.push(LOADER_HELPERS_JS.to_string());

        // Contributors run outermost layout first, route last; absent
        // loaders are skipped entirely. The fold starts from an empty
        // props object so a lone contributor still yields a well-formed
        // result.
        let mut calls: Vec<String> = Vec::new();
        for (index, _) in &loader_layouts {
            calls.push(format!(
                "  result = deepMerge(result, await layoutLoader{}(ctx));",
                index
            ));
        }
        if plan.shape.has_data_loader {
            calls.push("  result = deepMerge(result, await pageLoader(ctx));".to_string());
        }
        body.push(format!(
            "async function combinedLoader(ctx) {{\n  let result = {{ props: {{}} }};\n{}\n  return finalizeLoaderResult(result);\n}}",
            calls.join("\n")
        ));
        match &config.data_loader_wrapper_function {
            Some(wrapper) => body.push(format!(
                "export const {} = {}(combinedLoader);",
                DATA_LOADER_EXPORT, wrapper.exported_name
            )),
            None => body.push(format!(
                "export const {} = combinedLoader;",
                DATA_LOADER_EXPORT
            )),
        }
    }

    let mut artifact = String::new();
    artifact.push_str(GENERATED_BANNER);
    artifact.push('\n');
    if !imports.is_empty() {
        artifact.push_str(&imports.join("\n"));
        artifact.push('\n');
    }
    for block in body {
        artifact.push('\n');
        artifact.push_str(&block);
        artifact.push('\n');
    }
    Some(artifact)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASSTHROUGH ARTIFACTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Re-export a passthrough endpoint under its preserved path. A default
/// export is forwarded as-is; otherwise the designated named export, or a
/// sole named export, is promoted to default. Ambiguous shapes produce no
/// artifact and are reported by the caller.
pub fn generate_passthrough_artifact(
    config: &CompilerConfig,
    source_rel: &str,
    target_rel: &str,
    shape: &ExportShape,
) -> Option<String> {
    let spec = source_specifier(config, target_rel, source_rel);
    let export = if shape.has_default_export {
        format!("export {{ default }} from \"{}\";", spec)
    } else if shape
        .named_exports
        .iter()
        .any(|name| name == PASSTHROUGH_DESIGNATED_EXPORT)
    {
        format!(
            "export {{ {} as default }} from \"{}\";",
            PASSTHROUGH_DESIGNATED_EXPORT, spec
        )
    } else if shape.named_exports.len() == 1 {
        format!(
            "export {{ {} as default }} from \"{}\";",
            shape.named_exports[0], spec
        )
    } else {
        return None;
    };
    Some(format!("{}\n{}\n", GENERATED_BANNER, export))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
