//! Code generation module

mod engine;
pub mod fragment;
pub mod imports;
pub mod inplace;
pub mod naming;
pub mod template;

pub use engine::*;
pub use template::Manifest;

use std::path::Path;

use tracing::debug;

/// Best-effort gofmt on a written Go file.
pub(crate) fn format_file(path: &Path) {
    match std::process::Command::new("gofmt").arg("-w").arg(path).status() {
        Ok(status) if status.success() => debug!("formatted {}", path.display()),
        Ok(status) => debug!("gofmt exited with {} on {}", status, path.display()),
        Err(e) => debug!("gofmt unavailable: {}", e),
    }
}
