//! # Routegen Native Core
//!
//! Compiles a nested route tree (grouping folders, per-branch layouts,
//! per-route data-loading exports) into the flat page directory a host
//! file-based router understands, and keeps the output in sync with the
//! source tree incrementally.
//!
//! ## Pipeline invariants
//!
//! 1. **Lexical mapping**: a file's role and target location depend only on
//!    its relative path, never on its contents.
//! 2. **Static shape only**: source files are parsed, never executed; the
//!    generator consumes `ExportShape` values and never touches syntax-tree
//!    nodes directly.
//! 3. **Wholesale regeneration**: artifacts are rewritten in full from the
//!    current input state; output is deterministic, so re-running a pass
//!    with no source changes is byte-stable.
//! 4. **Per-entry isolation**: a malformed or locked file degrades to one
//!    stale or missing artifact and a diagnostic, never a failed pass.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod codegen;
pub mod config;
pub mod error;
pub mod exports;
pub mod layouts;
pub mod mapper;
pub mod merge;
pub mod sync;
pub mod watch;

#[cfg(test)]
mod watch_tests;

pub use codegen::{generate_passthrough_artifact, generate_route_artifact, RoutePlan};
pub use config::{CompilerConfig, WrapperRef};
pub use error::{Diagnostic, DiagnosticLevel, ErrorKind, RoutegenError};
pub use exports::{analyze_source, ExportShape, ShapeCache, DATA_LOADER_EXPORT};
pub use layouts::{resolve_layout_chain, LayoutRef};
pub use mapper::{classify_segment, target_path, RouteRole, RouteTreeEntry, SegmentKind};
pub use sync::{RouteCompiler, SyncReport};
pub use watch::{WatchEvent, WatchEventKind, WatchOrchestrator};

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI BRIDGE
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
mod bridge_state {
    use super::*;
    use std::sync::{Arc, Mutex};

    pub struct ActiveCompiler {
        pub compiler: Arc<RouteCompiler>,
        pub orchestrator: WatchOrchestrator,
    }

    lazy_static::lazy_static! {
        pub static ref ACTIVE: Mutex<Option<ActiveCompiler>> = Mutex::new(None);
    }
}

/// Validate the host configuration, run nothing yet, and hold a process-wide
/// compiler whose orchestrator performs the startup pass on its own thread.
#[cfg(feature = "napi")]
#[napi]
pub fn init_compiler_native(options: serde_json::Value) -> napi::Result<()> {
    use std::sync::Arc;

    let config: CompilerConfig =
        serde_json::from_value(options).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let compiler =
        RouteCompiler::new(config).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let compiler = Arc::new(compiler);
    let orchestrator = WatchOrchestrator::start(Arc::clone(&compiler));
    *bridge_state::ACTIVE.lock().unwrap() = Some(bridge_state::ActiveCompiler {
        compiler,
        orchestrator,
    });
    Ok(())
}

/// Run one full reconciliation pass synchronously and return its report.
#[cfg(feature = "napi")]
#[napi]
pub fn run_full_sync_native() -> napi::Result<serde_json::Value> {
    let guard = bridge_state::ACTIVE.lock().unwrap();
    let active = guard
        .as_ref()
        .ok_or_else(|| napi::Error::from_reason("compiler is not initialized"))?;
    let report = active.compiler.full_sync();
    serde_json::to_value(report).map_err(|e| napi::Error::from_reason(e.to_string()))
}

/// Forward one event from the host's file-system watch primitive.
#[cfg(feature = "napi")]
#[napi]
pub fn notify_watch_event_native(kind: String, path: String) -> napi::Result<()> {
    let kind = WatchEventKind::parse(&kind)
        .ok_or_else(|| napi::Error::from_reason(format!("unknown event kind: {}", kind)))?;
    let guard = bridge_state::ACTIVE.lock().unwrap();
    let active = guard
        .as_ref()
        .ok_or_else(|| napi::Error::from_reason("compiler is not initialized"))?;
    active.orchestrator.notify(WatchEvent {
        kind,
        path: path.into(),
    });
    Ok(())
}

/// Analyze one source file's export shape, for host-side introspection.
#[cfg(feature = "napi")]
#[napi]
pub fn analyze_export_shape_native(path: String) -> napi::Result<serde_json::Value> {
    let source = std::fs::read_to_string(&path)
        .map_err(|e| napi::Error::from_reason(format!("{}: {}", path, e)))?;
    let shape =
        analyze_source(&source, &path).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(shape).map_err(|e| napi::Error::from_reason(e.to_string()))
}
