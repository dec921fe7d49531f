//! Import injection
//!
//! Makes sure the runtime package is imported exactly once, editing the
//! import declarations the way goimports would: into the best-matching
//! group, in sorted position when that run of specs is sorted.

use tracing::debug;

use super::naming::import_local_name;
use crate::syntax::{DeclKind, ImportSpec, NodeId, NodeKind, SyntaxTree};

/// Result of [`ensure_import`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    AlreadyPresent,
    Added,
    /// The import could not be added without breaking the file
    Conflict(String),
}

/// Ensure `path` is imported under the name `package`
pub fn ensure_import(tree: &mut SyntaxTree, path: &str, package: &str) -> ImportOutcome {
    let specs: Vec<ImportSpec> = tree
        .import_specs()
        .into_iter()
        .map(|(_, spec)| spec.clone())
        .collect();

    if specs
        .iter()
        .any(|s| s.path == path && (s.alias.is_none() || s.alias.as_deref() == Some(package)))
    {
        return ImportOutcome::AlreadyPresent;
    }

    for spec in &specs {
        if spec.path == path && spec.alias.as_deref() != Some("_") {
            return ImportOutcome::Conflict(format!(
                "{:?} is already imported as `{}`",
                path,
                spec.alias.as_deref().unwrap_or_default()
            ));
        }
        if spec.path != path && local_name(spec).as_deref() == Some(package) {
            return ImportOutcome::Conflict(format!(
                "`{}` already refers to {:?}",
                package, spec.path
            ));
        }
    }

    let new_spec = if import_local_name(path) == package {
        ImportSpec::new(path)
    } else {
        ImportSpec::with_alias(path, package)
    };

    match best_decl(tree, path) {
        Some(decl) => {
            let grouped = matches!(tree.kind(decl), NodeKind::Decl { grouped: true, .. });
            // An empty group has no parsed spec to anchor the new one on
            if grouped && !spec_children(tree, decl).is_empty() {
                insert_into_group(tree, decl, new_spec);
            } else {
                regroup(tree, decl, new_spec);
            }
        }
        None => add_declaration(tree, new_spec),
    }

    debug!("added import {:?}", path);
    ImportOutcome::Added
}

/// The name an import binds in file scope; `None` for `_` and `.`
fn local_name(spec: &ImportSpec) -> Option<String> {
    match spec.alias.as_deref() {
        Some("_") | Some(".") => None,
        Some(alias) => Some(alias.to_string()),
        None => Some(import_local_name(&spec.path)),
    }
}

/// Number of leading path elements two import paths share
fn shared_elements(a: &str, b: &str) -> usize {
    a.split('/')
        .zip(b.split('/'))
        .take_while(|(x, y)| x == y)
        .count()
}

fn spec_path(tree: &SyntaxTree, id: NodeId) -> &str {
    match tree.kind(id) {
        NodeKind::ImportSpec(spec) => spec.path.as_str(),
        _ => "",
    }
}

/// Import specs of a declaration, skipping comments inside its group
fn spec_children(tree: &SyntaxTree, decl: NodeId) -> Vec<NodeId> {
    tree.children(decl)
        .iter()
        .copied()
        .filter(|&id| matches!(tree.kind(id), NodeKind::ImportSpec(_)))
        .collect()
}

/// Import declaration whose specs best match `path`; the first on ties
fn best_decl(tree: &SyntaxTree, path: &str) -> Option<NodeId> {
    let mut best: Option<(NodeId, usize)> = None;
    for decl in tree.import_decls() {
        let score = spec_children(tree, decl)
            .iter()
            .map(|&id| shared_elements(spec_path(tree, id), path))
            .max()
            .unwrap_or(0);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((decl, score));
        }
    }
    best.map(|(decl, _)| decl)
}

fn insert_into_group(tree: &mut SyntaxTree, decl: NodeId, spec: ImportSpec) {
    let children = tree.children(decl).to_vec();
    let specs = spec_children(tree, decl);
    let paths: Vec<&str> = specs.iter().map(|&id| spec_path(tree, id)).collect();
    let path = spec.path.as_str();

    // After the spec with the longest shared prefix, the last one on ties
    let mut best: Option<(usize, usize)> = None;
    for (i, p) in paths.iter().enumerate() {
        let score = shared_elements(p, path);
        if best.is_none_or(|(_, s)| score >= s) {
            best = Some((i, score));
        }
    }
    let mut at = best.map(|(i, _)| i + 1).unwrap_or(paths.len());

    if !paths.is_empty() {
        let anchor = at.saturating_sub(1).min(paths.len() - 1);
        let (lo, hi) = run_bounds(tree, &specs, anchor);
        let run = &paths[lo..hi];
        if run.windows(2).all(|w| w[0] <= w[1]) {
            while at > lo && paths[at - 1] > path {
                at -= 1;
            }
            while at < hi && paths[at] < path {
                at += 1;
            }
        }
    }

    // Spec position to child position: ahead of the comments leading the
    // next spec, or right behind the last spec
    let position = |id: NodeId| children.iter().position(|&c| c == id);
    let index = match specs.get(at) {
        Some(&next) => {
            let mut index = position(next).unwrap_or(children.len());
            while index > 0 && own_line_comment(tree, children[index - 1]) {
                index -= 1;
            }
            index
        }
        None => specs
            .last()
            .and_then(|&last| position(last))
            .map_or(children.len(), |i| i + 1),
    };

    let id = tree.synthesize(NodeKind::ImportSpec(spec));
    tree.insert_child(decl, index, id);
}

/// A parsed comment with nothing but indentation before it on its line
fn own_line_comment(tree: &SyntaxTree, id: NodeId) -> bool {
    match (tree.kind(id), tree.span(id)) {
        (NodeKind::Comment, Some(span)) => tree.source()[..span.start]
            .rsplit('\n')
            .next()
            .is_some_and(|line| line.trim().is_empty()),
        _ => false,
    }
}

/// Index range of the blank-line-delimited run of specs containing `index`
fn run_bounds(tree: &SyntaxTree, specs: &[NodeId], index: usize) -> (usize, usize) {
    // Comment lines between two specs do not split the run
    let blank_between = |a: NodeId, b: NodeId| match (tree.span(a), tree.span(b)) {
        (Some(x), Some(y)) if x.end <= y.start => {
            let lines: Vec<&str> = tree.source()[x.end..y.start].split('\n').collect();
            lines.len() > 2
                && lines[1..lines.len() - 1]
                    .iter()
                    .any(|line| line.trim().is_empty())
        }
        _ => false,
    };

    let mut lo = index;
    while lo > 0 && !blank_between(specs[lo - 1], specs[lo]) {
        lo -= 1;
    }
    let mut hi = index + 1;
    while hi < specs.len() && !blank_between(specs[hi - 1], specs[hi]) {
        hi += 1;
    }
    (lo, hi)
}

/// Turn `import "x"` (or an empty `import ()`) into a parenthesized group
/// holding the existing specs and the new one
fn regroup(tree: &mut SyntaxTree, decl: NodeId, spec: ImportSpec) {
    let Some(index) = tree.index_in_parent(decl) else {
        return;
    };
    let existing = tree.children(decl).to_vec();
    let parent = tree.root();

    let group = tree.synthesize(NodeKind::Decl {
        kind: DeclKind::Import,
        grouped: true,
    });
    tree.replace_child(parent, index, group);

    let path = spec.path.clone();
    let new_id = tree.synthesize(NodeKind::ImportSpec(spec));
    let mut placed = false;
    for id in existing {
        if !placed && spec_path(tree, id) > path.as_str() {
            tree.append_child(group, new_id);
            placed = true;
        }
        tree.append_child(group, id);
    }
    if !placed {
        tree.append_child(group, new_id);
    }
}

/// Add `import "x"` right after the package clause
fn add_declaration(tree: &mut SyntaxTree, spec: ImportSpec) {
    let root = tree.root();
    let after_package = tree
        .children(root)
        .iter()
        .position(|&id| matches!(tree.kind(id), NodeKind::Package { .. }))
        .map(|i| i + 1)
        .unwrap_or(0);

    let decl = tree.synthesize(NodeKind::Decl {
        kind: DeclKind::Import,
        grouped: false,
    });
    let spec_id = tree.synthesize(NodeKind::ImportSpec(spec));
    tree.append_child(decl, spec_id);
    tree.insert_child(root, after_package, decl);
}
