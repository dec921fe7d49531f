//! Configuration settings for jsonpb-codegen

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults;
use crate::codegen::naming::{companion_file_name, is_go_identifier};
use crate::codegen::Mode;
use crate::error::{CodegenError, Result};

/// Main configuration struct for code generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Go source file to transform
    #[serde(default)]
    pub source: PathBuf,

    /// Where to write the result; stdout when unset
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// `inplace` or `template`
    #[serde(default = "default_mode")]
    pub mode: Mode,

    /// Tag substring identifying generated data-model fields
    #[serde(default = "default_tag_marker")]
    pub tag_marker: String,

    /// Skip types that already declare the generated method
    #[serde(default = "default_skip_existing")]
    pub skip_existing: bool,

    /// Template mode: write to `<base>_json.<ext>` next to the source
    #[serde(default = "default_companion")]
    pub companion: bool,

    /// Request UnmarshalJSON generation as well (not implemented)
    #[serde(default)]
    pub unmarshal: bool,

    /// Run `gofmt -w` on a written destination file (best effort)
    #[serde(default = "default_run_gofmt")]
    pub run_gofmt: bool,

    /// Dry run mode - report matched types without writing anything
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Log level (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG env var
    #[serde(default)]
    pub log_level: Option<String>,

    /// JSON runtime the generated methods delegate to
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Names used in the generated methods and the import they need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_import_path")]
    pub import_path: String,

    #[serde(default = "default_package")]
    pub package: String,

    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_receiver")]
    pub receiver: String,
}

// Default value functions for serde
fn default_mode() -> Mode {
    defaults::MODE.parse().unwrap_or_default()
}
fn default_tag_marker() -> String {
    defaults::TAG_MARKER.to_string()
}
fn default_skip_existing() -> bool {
    defaults::SKIP_EXISTING
}
fn default_companion() -> bool {
    defaults::COMPANION
}
fn default_run_gofmt() -> bool {
    defaults::RUN_GOFMT
}
fn default_dry_run() -> bool {
    defaults::DRY_RUN
}
fn default_import_path() -> String {
    defaults::RUNTIME_IMPORT_PATH.to_string()
}
fn default_package() -> String {
    defaults::RUNTIME_PACKAGE.to_string()
}
fn default_entry_point() -> String {
    defaults::RUNTIME_ENTRY_POINT.to_string()
}
fn default_method() -> String {
    defaults::METHOD_NAME.to_string()
}
fn default_receiver() -> String {
    defaults::RECEIVER_NAME.to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            import_path: default_import_path(),
            package: default_package(),
            entry_point: default_entry_point(),
            method: default_method(),
            receiver: default_receiver(),
        }
    }
}

impl RuntimeConfig {
    /// Runtime for messages generated against github.com/golang/protobuf
    pub fn jsonpb() -> Self {
        Self {
            import_path: defaults::JSONPB_IMPORT_PATH.to_string(),
            package: defaults::JSONPB_PACKAGE.to_string(),
            ..Self::default()
        }
    }

    /// Look up a named preset (`protojson` or `jsonpb`)
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "protojson" | "google" | "google.golang.org" | "google.golang.org/protobuf" => {
                Some(Self::default())
            }
            "jsonpb" | "github" | "github.com" | "github.com/golang/protobuf" => {
                Some(Self::jsonpb())
            }
            _ => None,
        }
    }

    /// Check that every generated name is a legal Go identifier
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("package", &self.package),
            ("entry_point", &self.entry_point),
            ("method", &self.method),
            ("receiver", &self.receiver),
        ];
        for (field, value) in names {
            if !is_go_identifier(value) {
                return Err(CodegenError::Validation(format!(
                    "runtime.{} `{}` is not a valid Go identifier",
                    field, value
                )));
            }
        }
        if self.import_path.is_empty() || self.import_path.contains(['"', '\n', ' ']) {
            return Err(CodegenError::Validation(format!(
                "runtime.import_path {:?} is not a valid import path",
                self.import_path
            )));
        }
        Ok(())
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: None,
            mode: default_mode(),
            tag_marker: default_tag_marker(),
            skip_existing: default_skip_existing(),
            companion: default_companion(),
            unmarshal: false,
            run_gofmt: default_run_gofmt(),
            dry_run: default_dry_run(),
            debug: false,
            log_level: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl CodegenConfig {
    /// Create a default config with the given source file
    pub fn default_with_source(source: PathBuf) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CodegenConfig = toml::from_str(&content).map_err(|e| {
            CodegenError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config)
    }

    /// Load configuration using config-rs (file + environment variables)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from config file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        } else {
            // Try default locations
            builder = builder.add_source(File::with_name("jsonpb-codegen").required(false));
        }

        // Override with environment variables (JSONPB_CODEGEN__*)
        builder = builder.add_source(
            Environment::with_prefix("JSONPB_CODEGEN")
                .prefix_separator("__")
                .separator("__"),
        );

        let config: CodegenConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Resolved destination: explicit path, companion file, or stdout (`None`)
    pub fn destination_path(&self) -> Option<PathBuf> {
        match &self.destination {
            Some(dest) if !dest.as_os_str().is_empty() => Some(dest.clone()),
            _ if self.companion && self.mode == Mode::Template => {
                Some(companion_file_name(&self.source))
            }
            _ => None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source.as_os_str().is_empty() {
            return Err(CodegenError::Validation("source is required".into()));
        }

        if self.companion && self.mode != Mode::Template {
            return Err(CodegenError::Validation(
                "companion output is only available in template mode".into(),
            ));
        }

        if self.mode.requires_distinct_destination() {
            if let Some(dest) = self.destination_path() {
                if same_file(&self.source, &dest) {
                    return Err(CodegenError::Validation(format!(
                        "in {} mode, source cannot be the same as destination ({}); the source file must be left untouched",
                        self.mode,
                        dest.display()
                    )));
                }
            }
        }

        if self.tag_marker.is_empty() {
            return Err(CodegenError::Validation(
                "tag_marker must not be empty".into(),
            ));
        }

        self.runtime.validate()
    }
}

/// Path equality, resolving both sides when they exist on disk
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
