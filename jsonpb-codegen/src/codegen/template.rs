//! Companion file rendering
//!
//! Template mode never touches the tree. A [`ManifestCollector`] records the
//! matched type names and the file's package, and [`render`] fills the
//! companion template from that manifest.

use std::collections::HashSet;

use tracing::{debug, info};

use super::naming::is_go_identifier;
use super::DuplicatePolicy;
use crate::config::RuntimeConfig;
use crate::error::{CodegenError, Result};
use crate::syntax::SyntaxTree;
use crate::visit::{walk, Cursor, Match, MatchAction, StructMatcher};

/// Header, package clause and import of a companion file
pub const COMPANION_TEMPLATE: &str = "// Code generated by jsonpb-codegen. DO NOT EDIT.
{{source_line}}
package {{package}}

import \"{{import_path}}\"
{{methods}}";

/// One generated method; rendered once per manifest entry
pub const METHOD_TEMPLATE: &str = "
func ({{receiver}} *{{type_name}}) {{method}}() ([]byte, error) {
\treturn {{runtime_package}}.{{entry_point}}({{receiver}})
}
";

/// Everything the companion template needs to know about a source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub package: String,
    /// Matched types in document order
    pub types: Vec<String>,
    pub source_name: Option<String>,
}

/// Action recording matched type names without touching the tree
#[derive(Debug, Default)]
pub struct ManifestCollector {
    skip: HashSet<String>,
    types: Vec<String>,
    skipped: Vec<String>,
}

impl ManifestCollector {
    pub fn new(tree: &SyntaxTree, runtime: &RuntimeConfig, policy: DuplicatePolicy) -> Self {
        let skip = match policy {
            DuplicatePolicy::Always => HashSet::new(),
            DuplicatePolicy::SkipExisting => tree
                .receivers_with_method(&runtime.method)
                .into_iter()
                .collect(),
        };
        Self {
            skip,
            ..Self::default()
        }
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

impl MatchAction for ManifestCollector {
    fn on_match(&mut self, _cursor: &mut Cursor<'_>, found: &Match) {
        if self.skip.contains(&found.type_name) {
            info!("{} already declares the method, skipping", found.type_name);
            self.skipped.push(found.type_name.clone());
        } else {
            self.types.push(found.type_name.clone());
        }
    }
}

/// Walk the tree and build the manifest
///
/// Returns the manifest and the types skipped under
/// [`DuplicatePolicy::SkipExisting`].
pub fn collect(
    tree: &mut SyntaxTree,
    marker: &str,
    runtime: &RuntimeConfig,
    policy: DuplicatePolicy,
    source_name: Option<&str>,
) -> Result<(Manifest, Vec<String>)> {
    let package = tree
        .package_name()
        .ok_or_else(|| CodegenError::Template("source has no package clause".into()))?
        .to_string();

    let collector = ManifestCollector::new(tree, runtime, policy);
    let mut matcher = StructMatcher::new(marker, collector);
    walk(tree, &mut matcher);
    let collector = matcher.into_action();
    debug!("collected {} types from package {}", collector.types.len(), package);

    let manifest = Manifest {
        package,
        types: collector.types,
        source_name: source_name.map(str::to_string),
    };
    Ok((manifest, collector.skipped))
}

/// Render the companion file for a manifest
pub fn render(manifest: &Manifest, runtime: &RuntimeConfig) -> Result<String> {
    check_identifier("package", &manifest.package)?;
    for (what, name) in [
        ("runtime package", &runtime.package),
        ("entry point", &runtime.entry_point),
        ("method", &runtime.method),
        ("receiver", &runtime.receiver),
    ] {
        check_identifier(what, name)?;
    }
    if runtime.import_path.is_empty() || runtime.import_path.contains(['"', '\n']) {
        return Err(CodegenError::Template(format!(
            "invalid import path {:?}",
            runtime.import_path
        )));
    }

    let mut methods = String::new();
    for type_name in &manifest.types {
        check_identifier("type", type_name)?;
        methods.push_str(&fill(
            METHOD_TEMPLATE,
            &[
                ("receiver", &runtime.receiver),
                ("type_name", type_name),
                ("method", &runtime.method),
                ("runtime_package", &runtime.package),
                ("entry_point", &runtime.entry_point),
            ],
        )?);
    }

    let source_line = match &manifest.source_name {
        Some(name) if !name.contains('\n') => format!("// source: {}\n", name),
        _ => String::new(),
    };

    fill(
        COMPANION_TEMPLATE,
        &[
            ("source_line", &source_line),
            ("package", &manifest.package),
            ("import_path", &runtime.import_path),
            ("methods", &methods),
        ],
    )
}

fn check_identifier(what: &str, name: &str) -> Result<()> {
    if is_go_identifier(name) {
        Ok(())
    } else {
        Err(CodegenError::Template(format!(
            "{} `{}` is not a valid Go identifier",
            what, name
        )))
    }
}

/// Substitute `{{name}}` placeholders
///
/// Every placeholder must be bound; a `{{` without a closing `}}` is an error.
fn fill(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            CodegenError::Template(format!("unclosed placeholder near {:?}", truncate(after)))
        })?;
        let key = after[..end].trim();
        let value = values
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
            .ok_or_else(|| CodegenError::Template(format!("unknown placeholder `{}`", key)))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(20) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
