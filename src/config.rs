//! Compiler configuration.
//!
//! Passed once at setup by the host and held for the process lifetime.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RoutegenError;

/// Reference to a host-provided wrapper function: where to import it from
/// and the name it is exported under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct WrapperRef {
    pub import_path: String,
    pub exported_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Source tree root containing the nested route conventions.
    pub routes_dir: String,
    /// Output tree root consumed by the host file-based router.
    pub pages_dir: String,
    /// Applied once around every composed view expression.
    #[serde(default)]
    pub component_wrapper_function: Option<WrapperRef>,
    /// Applied once around every combined data-loading function.
    #[serde(default)]
    pub data_loader_wrapper_function: Option<WrapperRef>,
    /// Quiet period for coalescing watch events into one full pass.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
}

fn default_debounce_ms() -> u32 {
    200
}

impl CompilerConfig {
    pub fn new(routes_dir: impl Into<String>, pages_dir: impl Into<String>) -> Self {
        Self {
            routes_dir: routes_dir.into(),
            pages_dir: pages_dir.into(),
            component_wrapper_function: None,
            data_loader_wrapper_function: None,
            debounce_ms: default_debounce_ms(),
        }
    }

    pub fn routes_root(&self) -> &Path {
        Path::new(&self.routes_dir)
    }

    pub fn pages_root(&self) -> &Path {
        Path::new(&self.pages_dir)
    }

    /// Both roots are required; the source root must already exist.
    /// The output root is created on demand by the synchronizer.
    pub fn validate(&self) -> Result<(), RoutegenError> {
        if self.routes_dir.is_empty() {
            return Err(RoutegenError::io(
                "<config>",
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "routesDir is required"),
            ));
        }
        if self.pages_dir.is_empty() {
            return Err(RoutegenError::io(
                "<config>",
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "pagesDir is required"),
            ));
        }
        if !self.routes_root().is_dir() {
            return Err(RoutegenError::io(
                &self.routes_dir,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "routesDir does not exist or is not a directory",
                ),
            ));
        }
        Ok(())
    }
}
