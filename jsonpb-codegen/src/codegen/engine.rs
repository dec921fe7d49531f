//! The rewriting engine: source text in, generated text plus diagnostics out

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::imports::{ensure_import, ImportOutcome};
use super::inplace::insert_methods;
use super::template::{self, Manifest};
use crate::config::{CodegenConfig, RuntimeConfig};
use crate::error::{CodegenError, Result};
use crate::syntax::{parse, print};

/// What to do with the synthesized methods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Merge the methods into the source file
    #[default]
    #[serde(rename = "inplace")]
    InPlace,
    /// Emit the methods into a separate companion file
    #[serde(rename = "template")]
    Template,
}

impl Mode {
    /// Whether the output must not overwrite the input
    pub fn requires_distinct_destination(self) -> bool {
        matches!(self, Mode::Template)
    }
}

impl FromStr for Mode {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inplace" => Ok(Mode::InPlace),
            "template" => Ok(Mode::Template),
            other => Err(CodegenError::Config(format!(
                "invalid mode `{}`; expected `inplace` or `template`",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::InPlace => "inplace",
            Mode::Template => "template",
        })
    }
}

/// How to treat types that already declare the generated method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Generate regardless; running in-place twice yields duplicate methods
    #[default]
    Always,
    /// Leave types that already have the method alone
    SkipExisting,
}

/// Non-fatal condition reported alongside the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The runtime import could not be added; the output will not compile as is
    ImportNotAdded { path: String, reason: String },
    /// No struct carried the tag marker
    NoMatches,
    SkippedExisting { type_name: String },
    /// A requested feature that is accepted but not implemented
    Unsupported { feature: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ImportNotAdded { path, reason } => write!(
                f,
                "could not add import {:?} ({}); add `import \"{}\"` by hand",
                path, reason, path
            ),
            Diagnostic::NoMatches => f.write_str("no struct types with a matching tag were found"),
            Diagnostic::SkippedExisting { type_name } => {
                write!(f, "{} already declares the method, skipped", type_name)
            }
            Diagnostic::Unsupported { feature } => write!(f, "{} is not supported", feature),
        }
    }
}

/// Result of one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    /// Types that received a method, in document order
    pub matched: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewriting engine, configured once and run per source text
#[derive(Debug, Clone)]
pub struct Engine {
    runtime: RuntimeConfig,
    marker: String,
    policy: DuplicatePolicy,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Engine {
    pub fn new(runtime: RuntimeConfig) -> Self {
        Self {
            runtime,
            marker: crate::config::defaults::TAG_MARKER.to_string(),
            policy: DuplicatePolicy::default(),
        }
    }

    pub fn from_config(config: &CodegenConfig) -> Self {
        let policy = if config.skip_existing {
            DuplicatePolicy::SkipExisting
        } else {
            DuplicatePolicy::Always
        };
        Self::new(config.runtime.clone())
            .marker(&config.tag_marker)
            .policy(policy)
    }

    /// Tag substring that marks a struct as generated
    pub fn marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }

    pub fn policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    /// Run the engine in the given mode
    pub fn generate(&self, source: &str, mode: Mode, source_name: Option<&str>) -> Result<Generated> {
        match mode {
            Mode::InPlace => self.rewrite(source),
            Mode::Template => self.render_companion(source, source_name),
        }
    }

    /// Merge a method into the source after every matched declaration
    ///
    /// Without matches the source comes back byte-identical: the import is
    /// only injected when a method was inserted.
    pub fn rewrite(&self, source: &str) -> Result<Generated> {
        let mut tree = parse(source)?;
        info!("rewriting package {}", tree.package_name().unwrap_or("?"));

        let action = insert_methods(&mut tree, &self.marker, &self.runtime, self.policy);
        let matched = action.inserted().to_vec();
        let mut diagnostics: Vec<Diagnostic> = action
            .skipped()
            .iter()
            .map(|t| Diagnostic::SkippedExisting {
                type_name: t.clone(),
            })
            .collect();

        if matched.is_empty() {
            if diagnostics.is_empty() {
                diagnostics.push(Diagnostic::NoMatches);
            }
        } else {
            match ensure_import(&mut tree, &self.runtime.import_path, &self.runtime.package) {
                ImportOutcome::Added => debug!("imported {}", self.runtime.import_path),
                ImportOutcome::AlreadyPresent => {
                    debug!("{} already imported", self.runtime.import_path)
                }
                ImportOutcome::Conflict(reason) => {
                    warn!("could not add import {}: {}", self.runtime.import_path, reason);
                    diagnostics.push(Diagnostic::ImportNotAdded {
                        path: self.runtime.import_path.clone(),
                        reason,
                    });
                }
            }
        }

        let text = print(&tree)?;
        info!("inserted {} methods", matched.len());
        Ok(Generated {
            text,
            matched,
            diagnostics,
        })
    }

    /// Build the manifest of types that would get a method
    pub fn collect(&self, source: &str, source_name: Option<&str>) -> Result<Manifest> {
        Ok(self.collect_with_skipped(source, source_name)?.0)
    }

    fn collect_with_skipped(
        &self,
        source: &str,
        source_name: Option<&str>,
    ) -> Result<(Manifest, Vec<String>)> {
        let mut tree = parse(source)?;
        template::collect(
            &mut tree,
            &self.marker,
            &self.runtime,
            self.policy,
            source_name,
        )
    }

    /// Render the companion file holding one method per matched type
    pub fn render_companion(&self, source: &str, source_name: Option<&str>) -> Result<Generated> {
        let (manifest, skipped) = self.collect_with_skipped(source, source_name)?;
        info!(
            "rendering {} methods for package {}",
            manifest.types.len(),
            manifest.package
        );

        let mut diagnostics: Vec<Diagnostic> = skipped
            .into_iter()
            .map(|type_name| Diagnostic::SkippedExisting { type_name })
            .collect();
        if manifest.types.is_empty() && diagnostics.is_empty() {
            diagnostics.push(Diagnostic::NoMatches);
        }

        let text = template::render(&manifest, &self.runtime)?;
        Ok(Generated {
            text,
            matched: manifest.types,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SINGLE: &str = "package p\n\ntype T struct {\n\tF string `protobuf:\"1\"`\n}\n";

    #[test]
    fn test_mode_parsing() {
        assert_eq!("inplace".parse::<Mode>().unwrap(), Mode::InPlace);
        assert_eq!("template".parse::<Mode>().unwrap(), Mode::Template);
        assert!("in-place".parse::<Mode>().is_err());
        assert_eq!(Mode::Template.to_string(), "template");
        assert!(Mode::Template.requires_distinct_destination());
        assert!(!Mode::InPlace.requires_distinct_destination());
    }

    #[test]
    fn test_rewrite_single_type() {
        let out = Engine::default().rewrite(SINGLE).unwrap();
        assert_eq!(
            out.text,
            "package p\n\nimport \"google.golang.org/protobuf/encoding/protojson\"\n\ntype T struct {\n\tF string `protobuf:\"1\"`\n}\n\nfunc (m *T) MarshalJSON() ([]byte, error) {\n\treturn protojson.Marshal(m)\n}\n"
        );
        assert_eq!(out.matched, ["T"]);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_no_matches_is_byte_identical() {
        let source = "package p\n\nimport \"fmt\"\n\ntype U struct {\n\tName string `json:\"name\"`\n}\n";
        let out = Engine::default().rewrite(source).unwrap();
        assert_eq!(out.text, source);
        assert!(out.matched.is_empty());
        assert_eq!(out.diagnostics, [Diagnostic::NoMatches]);
    }

    #[test]
    fn test_empty_import_group() {
        let source = "package p\n\nimport ()\n\ntype A struct {\n\tX int `protobuf:\"1\"`\n}\n";
        let out = Engine::default().rewrite(source).unwrap();
        assert_eq!(out.matched, ["A"]);
        assert_eq!(
            out.text,
            "package p\n\nimport (\n\t\"google.golang.org/protobuf/encoding/protojson\"\n)\n\ntype A struct {\n\tX int `protobuf:\"1\"`\n}\n\nfunc (m *A) MarshalJSON() ([]byte, error) {\n\treturn protojson.Marshal(m)\n}\n"
        );
    }

    #[test]
    fn test_consecutive_types_keep_trailing_comments() {
        let source = "package p\n\ntype A struct {\n\tX int `protobuf:\"1\"`\n} // a\n\ntype B struct {\n\tY int `protobuf:\"1\"`\n} // b\n";
        let out = Engine::default().rewrite(source).unwrap();
        assert_eq!(out.matched, ["A", "B"]);
        assert_eq!(
            out.text,
            "package p\n\nimport \"google.golang.org/protobuf/encoding/protojson\"\n\ntype A struct {\n\tX int `protobuf:\"1\"`\n} // a\n\nfunc (m *A) MarshalJSON() ([]byte, error) {\n\treturn protojson.Marshal(m)\n}\n\ntype B struct {\n\tY int `protobuf:\"1\"`\n} // b\n\nfunc (m *B) MarshalJSON() ([]byte, error) {\n\treturn protojson.Marshal(m)\n}\n"
        );
    }

    #[test]
    fn test_import_conflict_is_diagnostic() {
        let source = "package p\n\nimport protojson \"example.com/fake\"\n\ntype T struct {\n\tF string `protobuf:\"1\"`\n}\n";
        let out = Engine::default().rewrite(source).unwrap();
        assert_eq!(out.matched, ["T"]);
        assert!(out.text.contains("func (m *T) MarshalJSON()"));
        assert!(matches!(
            out.diagnostics.as_slice(),
            [Diagnostic::ImportNotAdded { .. }]
        ));
        assert!(out.diagnostics[0]
            .to_string()
            .contains("import \"google.golang.org/protobuf/encoding/protojson\""));
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = Engine::default().rewrite("package p\n\ntype T struct {\n").unwrap_err();
        assert!(matches!(err, CodegenError::Parse { .. }));
    }

    #[test]
    fn test_custom_marker() {
        let source = "package p\n\ntype T struct {\n\tF string `gen:\"x\"`\n}\n";
        assert!(Engine::default().rewrite(source).unwrap().matched.is_empty());
        let out = Engine::default().marker("gen:").rewrite(source).unwrap();
        assert_eq!(out.matched, ["T"]);
    }

    #[test]
    fn test_template_mode_leaves_tree_alone() {
        let out = Engine::new(RuntimeConfig::jsonpb())
            .generate(SINGLE, Mode::Template, Some("t.pb.go"))
            .unwrap();
        assert!(out.text.starts_with("// Code generated by jsonpb-codegen. DO NOT EDIT.\n// source: t.pb.go\n"));
        assert!(out.text.contains("import \"github.com/ajm188/go-jsonpb\""));
        assert!(out.text.contains("return jsonpb.Marshal(m)"));
        assert!(!out.text.contains("type T struct"));
    }

    #[test]
    fn test_skip_existing_in_template_mode() {
        let source = format!("{SINGLE}\nfunc (m *T) MarshalJSON() ([]byte, error) {{ return nil, nil }}\n");
        let out = Engine::default()
            .policy(DuplicatePolicy::SkipExisting)
            .render_companion(&source, None)
            .unwrap();
        assert!(out.matched.is_empty());
        assert_eq!(
            out.diagnostics,
            [Diagnostic::SkippedExisting {
                type_name: "T".to_string()
            }]
        );
    }
}
