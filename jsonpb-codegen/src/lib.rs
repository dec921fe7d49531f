//! jsonpb-codegen: Add JSON marshalers to protoc-gen-go output
//!
//! Go structs generated by `protoc-gen-go` do not implement `json.Marshaler`,
//! so `encoding/json` serializes them field by field instead of following the
//! protobuf JSON mapping. This crate finds every struct whose fields carry a
//! `protobuf:"..."` tag and gives it a method delegating to a protobuf-aware
//! JSON runtime:
//!
//! ```go
//! func (m *Request) MarshalJSON() ([]byte, error) {
//! 	return protojson.Marshal(m)
//! }
//! ```
//!
//! Two modes are available:
//!
//! - **inplace**: the method is merged into the source right after each
//!   matched declaration and the runtime import is added. Everything else in
//!   the file is reproduced byte for byte.
//! - **template**: the source is left untouched and the methods are rendered
//!   into a separate companion file.
//!
//! # Usage in build.rs
//!
//! Configure in your `Cargo.toml`:
//!
//! ```toml
//! [package.metadata.jsonpb-codegen]
//! sources = ["proto/service.pb.go"]
//! mode = "template"
//! ```
//!
//! Then use a minimal `build.rs`:
//!
//! ```rust,ignore
//! fn main() {
//!     jsonpb_codegen::generate_from_cargo_metadata()
//!         .expect("Failed to generate JSON marshalers");
//! }
//! ```
//!
//! # Programmatic Configuration
//!
//! ```rust,ignore
//! use jsonpb_codegen::{CodegenBuilder, Mode};
//!
//! let generated = CodegenBuilder::new("api/service.pb.go")
//!     .mode(Mode::Template)
//!     .companion()
//!     .generate()?;
//! for diagnostic in &generated.diagnostics {
//!     eprintln!("warning: {}", diagnostic);
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! jsonpb-codegen --src api/service.pb.go --dest api/service.pb.go
//! jsonpb-codegen --src api/service.pb.go --mode template --companion
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod syntax;
pub mod visit;

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

pub use codegen::{Diagnostic, DuplicatePolicy, Engine, Generated, Manifest, Mode};
pub use config::{CodegenConfig, RuntimeConfig};
pub use error::{CodegenError, Result};

/// Main entry point for code generation
///
/// Validates the configuration before touching any file, runs the engine over
/// the source, then writes the destination once (stdout when unset). In dry
/// run mode nothing is written.
pub fn generate(config: &CodegenConfig) -> Result<Generated> {
    config.validate()?;

    info!("Reading Go source: {:?}", config.source);
    let source = std::fs::read_to_string(&config.source)?;
    let source_name = config
        .source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let engine = Engine::from_config(config);
    let mut generated = engine.generate(&source, config.mode, source_name.as_deref())?;
    info!(
        "{} mode matched {} types",
        config.mode,
        generated.matched.len()
    );

    if config.unmarshal {
        warn!("UnmarshalJSON generation is not supported, ignoring");
        generated.diagnostics.push(Diagnostic::Unsupported {
            feature: "UnmarshalJSON generation".to_string(),
        });
    }

    if config.dry_run {
        debug!("Dry run, nothing written");
        return Ok(generated);
    }

    match config.destination_path() {
        Some(dest) => {
            write_file(&dest, &generated.text)?;
            info!("Wrote {:?}", dest);
            if config.run_gofmt {
                codegen::format_file(&dest);
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(generated.text.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(generated)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// Builder pattern for easy configuration in build.rs
pub struct CodegenBuilder {
    config: CodegenConfig,
}

impl CodegenBuilder {
    /// Create a new builder with the given Go source file
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            config: CodegenConfig::default_with_source(source.as_ref().to_path_buf()),
        }
    }

    /// Set the output file; stdout when never set
    pub fn destination(mut self, path: impl AsRef<Path>) -> Self {
        self.config.destination = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the runtime the generated methods call
    pub fn runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.config.runtime = runtime;
        self
    }

    /// Set the tag substring identifying generated structs
    pub fn tag_marker(mut self, marker: &str) -> Self {
        self.config.tag_marker = marker.to_string();
        self
    }

    /// Skip types that already declare the method
    pub fn skip_existing(mut self) -> Self {
        self.config.skip_existing = true;
        self
    }

    /// Write the companion file next to the source (template mode)
    pub fn companion(mut self) -> Self {
        self.config.companion = true;
        self
    }

    /// Run gofmt on the written file, if gofmt is installed
    pub fn gofmt(mut self) -> Self {
        self.config.run_gofmt = true;
        self
    }

    /// Enable dry run mode (generate without writing files)
    pub fn dry_run(mut self) -> Self {
        self.config.dry_run = true;
        self
    }

    /// Generate the code
    pub fn generate(self) -> Result<Generated> {
        generate(&self.config)
    }
}

/// Configuration for `[package.metadata.jsonpb-codegen]` in Cargo.toml
#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CargoMetadataConfig {
    /// Go sources to process, relative to the manifest (required)
    #[serde(default)]
    sources: Vec<String>,

    /// `inplace` (default) or `template`
    mode: Option<Mode>,

    /// Output directory (default: OUT_DIR)
    output_dir: Option<String>,

    /// Runtime preset: `protojson` (default) or `jsonpb`
    runtime: Option<String>,

    /// Whether to skip types that already declare the method
    skip_existing: Option<bool>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoToml {
    package: Option<CargoPackage>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackage {
    metadata: Option<CargoPackageMetadata>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackageMetadata {
    #[serde(rename = "jsonpb-codegen")]
    jsonpb_codegen: Option<CargoMetadataConfig>,
}

/// Generate code from `[package.metadata.jsonpb-codegen]` in Cargo.toml
///
/// Every listed source is written into the output directory: under its own
/// file name in inplace mode, under its companion name (`x_json.pb.go`) in
/// template mode. Returns the written paths in source order.
pub fn generate_from_cargo_metadata() -> Result<Vec<PathBuf>> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").map_err(|_| {
        CodegenError::Config("CARGO_MANIFEST_DIR not set - are you running from build.rs?".into())
    })?;

    let cargo_toml_path = PathBuf::from(&manifest_dir).join("Cargo.toml");
    let cargo_toml_content = std::fs::read_to_string(&cargo_toml_path)?;

    let cargo_toml: CargoToml = toml::from_str(&cargo_toml_content).map_err(|e| {
        CodegenError::Config(format!(
            "Failed to parse {}: {}",
            cargo_toml_path.display(),
            e
        ))
    })?;

    let metadata_config = cargo_toml
        .package
        .and_then(|p| p.metadata)
        .and_then(|m| m.jsonpb_codegen)
        .ok_or_else(|| {
            CodegenError::Config(
                "Missing [package.metadata.jsonpb-codegen] section in Cargo.toml".into(),
            )
        })?;

    if metadata_config.sources.is_empty() {
        return Err(CodegenError::Config(
            "sources is required in [package.metadata.jsonpb-codegen]".into(),
        ));
    }

    let runtime = match metadata_config.runtime.as_deref() {
        Some(name) => RuntimeConfig::preset(name).ok_or_else(|| {
            CodegenError::Config(format!("unknown runtime preset `{}`", name))
        })?,
        None => RuntimeConfig::default(),
    };
    let mode = metadata_config.mode.unwrap_or_default();

    // Determine output directory (default to OUT_DIR)
    let out_dir = match metadata_config.output_dir {
        Some(dir) => PathBuf::from(&manifest_dir).join(dir),
        None => std::env::var("OUT_DIR").map(PathBuf::from).map_err(|_| {
            CodegenError::Config("OUT_DIR not set - are you running from build.rs?".into())
        })?,
    };

    let mut written = Vec::with_capacity(metadata_config.sources.len());
    for source in &metadata_config.sources {
        let source_path = PathBuf::from(&manifest_dir).join(source);
        let file_name = match mode {
            Mode::InPlace => source_path.file_name().map(PathBuf::from),
            Mode::Template => {
                codegen::naming::companion_file_name(&source_path)
                    .file_name()
                    .map(PathBuf::from)
            }
        }
        .ok_or_else(|| CodegenError::Config(format!("`{}` is not a file path", source)))?;
        let dest = out_dir.join(file_name);

        let mut builder = CodegenBuilder::new(&source_path)
            .destination(&dest)
            .mode(mode)
            .runtime(runtime.clone());
        if metadata_config.skip_existing.unwrap_or(false) {
            builder = builder.skip_existing();
        }
        builder.generate()?;

        // Emit rerun-if-changed
        println!("cargo:rerun-if-changed={}", source_path.display());
        written.push(dest);
    }
    println!("cargo:rerun-if-changed={}", cargo_toml_path.display());

    Ok(written)
}
