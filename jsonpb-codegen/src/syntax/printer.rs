//! Print a (possibly mutated) [`SyntaxTree`] back to Go source
//!
//! Parsed nodes are emitted as their original bytes, with any synthesized
//! children spliced in between. Untouched code therefore round-trips
//! byte-for-byte, comments and layout included.

use super::tree::{DeclKind, NodeId, NodeKind, Origin, Span, SyntaxTree};
use crate::error::{CodegenError, Result};

/// Render the tree to source text
///
/// A malformed synthesized node stops printing; the error carries whatever
/// was produced up to that point.
pub fn print(tree: &SyntaxTree) -> Result<String> {
    let mut out = String::with_capacity(tree.source().len() + 256);
    match print_node(tree, tree.root(), &mut out) {
        Ok(()) => Ok(out),
        Err(message) => Err(CodegenError::Print {
            message,
            partial: out,
        }),
    }
}

type PrintResult = std::result::Result<(), String>;

fn print_node(tree: &SyntaxTree, id: NodeId, out: &mut String) -> PrintResult {
    match tree.origin(id) {
        Origin::Source(span) => splice(tree, id, span, out),
        Origin::Synthesized | Origin::Rewritten(_) => print_synthesized(tree, id, out),
    }
}

/// Text inserted between a synthesized child and its neighbour
fn separator(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::File => "\n\n",
        NodeKind::Decl { .. } => "\n\t",
        _ => "\n",
    }
}

/// Synthesized children of a declaration group attach in front of the next
/// parsed sibling, so an insertion at the head of a blank-line-separated run
/// lands inside that run. Elsewhere they attach after the previous sibling.
/// Either way a same-line comment trailing the previous parsed sibling stays
/// on that sibling's line.
fn splice(tree: &SyntaxTree, id: NodeId, span: Span, out: &mut String) -> PrintResult {
    let source = tree.source();
    let children = tree.children(id);
    let sep = separator(tree.kind(id));
    let prefer_next = matches!(tree.kind(id), NodeKind::Decl { .. });
    let mut pos = span.start;
    let mut after_parsed = false;
    let mut consumed = None;

    for (i, &child) in children.iter().enumerate() {
        if consumed == Some(child) {
            continue;
        }
        if let Some(child_span) = tree.span(child) {
            out.push_str(&source[pos..child_span.start]);
            print_node(tree, child, out)?;
            pos = child_span.end;
            after_parsed = true;
            continue;
        }

        let rest = &children[i + 1..];
        if after_parsed {
            if let Some((comment, end)) = trailing_comment(tree, rest, pos, consumed) {
                out.push_str(&source[pos..end]);
                pos = end;
                consumed = Some(comment);
            }
        }

        let next = rest
            .iter()
            .filter(|&&c| Some(c) != consumed)
            .find_map(|&c| tree.span(c));
        match next {
            Some(anchor) if prefer_next || i == 0 => {
                out.push_str(&source[pos..anchor.start]);
                print_node(tree, child, out)?;
                out.push_str(sep);
                pos = anchor.start;
            }
            _ if i > 0 => {
                out.push_str(sep);
                print_node(tree, child, out)?;
            }
            _ => {
                return Err(format!(
                    "{} has no parsed child to anchor synthesized nodes",
                    tree.kind(id).label()
                ))
            }
        }
    }

    out.push_str(&source[pos..span.end]);
    Ok(())
}

/// The next parsed sibling, if it is a comment on the line ending at `pos`
/// that has not been printed yet
fn trailing_comment(
    tree: &SyntaxTree,
    rest: &[NodeId],
    pos: usize,
    consumed: Option<NodeId>,
) -> Option<(NodeId, usize)> {
    let (id, span) = rest.iter().find_map(|&c| tree.span(c).map(|s| (c, s)))?;
    if Some(id) == consumed || !matches!(tree.kind(id), NodeKind::Comment) {
        return None;
    }
    (!tree.source()[pos..span.start].contains('\n')).then_some((id, span.end))
}

fn print_synthesized(tree: &SyntaxTree, id: NodeId, out: &mut String) -> PrintResult {
    match tree.kind(id) {
        NodeKind::Method(func) => {
            func.validate()?;
            out.push_str(&func.to_string());
            Ok(())
        }
        NodeKind::ImportSpec(spec) => {
            if spec.path.is_empty() || spec.path.contains(['"', '\n']) {
                return Err(format!("invalid import path {:?}", spec.path));
            }
            if let Some(alias) = &spec.alias {
                out.push_str(alias);
                out.push(' ');
            }
            out.push('"');
            out.push_str(&spec.path);
            out.push('"');
            Ok(())
        }
        NodeKind::Decl {
            kind: DeclKind::Import,
            grouped,
        } => {
            let children = tree.children(id);
            if *grouped {
                out.push_str("import (\n");
                for &child in children {
                    out.push('\t');
                    print_node(tree, child, out)?;
                    out.push('\n');
                }
                out.push(')');
                Ok(())
            } else {
                let [child] = children else {
                    return Err(format!(
                        "ungrouped import declaration with {} specs",
                        children.len()
                    ));
                };
                out.push_str("import ");
                print_node(tree, *child, out)
            }
        }
        other => Err(format!("cannot print synthesized {}", other.label())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::fragment::{marshal_json, Ident};
    use crate::config::RuntimeConfig;
    use crate::syntax::parse;
    use crate::syntax::tree::ImportSpec;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "// header\npackage p\n\nimport (\n\t\"fmt\"\n)\n\n/* keep */ type T struct {\n\tA int `protobuf:\"1\"` // trailing\n}\n\nfunc f() {   }\n";

    #[test]
    fn test_round_trip_is_byte_identical() {
        let tree = parse(SOURCE).unwrap();
        assert_eq!(print(&tree).unwrap(), SOURCE);
    }

    #[test]
    fn test_synthesized_method_after_declaration() {
        let mut tree = parse(SOURCE).unwrap();
        let root = tree.root();
        let method = tree.synthesize(NodeKind::Method(marshal_json(
            "T",
            &RuntimeConfig::default(),
        )));
        // comment, package, import, comment, type, func
        tree.insert_child(root, 5, method);

        let out = print(&tree).unwrap();
        assert_eq!(
            out,
            "// header\npackage p\n\nimport (\n\t\"fmt\"\n)\n\n/* keep */ type T struct {\n\tA int `protobuf:\"1\"` // trailing\n}\n\nfunc (m *T) MarshalJSON() ([]byte, error) {\n\treturn protojson.Marshal(m)\n}\n\nfunc f() {   }\n"
        );
    }

    #[test]
    fn test_trailing_comment_stays_on_its_line() {
        let source = "package p\n\ntype T struct {\n\tA int\n} // T\n\nvar x = 1\n";
        let mut tree = parse(source).unwrap();
        let root = tree.root();
        let method = tree.synthesize(NodeKind::Method(marshal_json(
            "T",
            &RuntimeConfig::default(),
        )));
        // package, type, comment, var
        tree.insert_child(root, 2, method);

        assert_eq!(
            print(&tree).unwrap(),
            "package p\n\ntype T struct {\n\tA int\n} // T\n\nfunc (m *T) MarshalJSON() ([]byte, error) {\n\treturn protojson.Marshal(m)\n}\n\nvar x = 1\n"
        );
    }

    #[test]
    fn test_synthesized_spec_inside_group() {
        let mut tree = parse(SOURCE).unwrap();
        let decl = tree.import_decls()[0];
        let spec = tree.synthesize(NodeKind::ImportSpec(ImportSpec::new("os")));
        tree.insert_child(decl, 1, spec);
        let before = tree.synthesize(NodeKind::ImportSpec(ImportSpec::new("bytes")));
        tree.insert_child(decl, 0, before);

        let out = print(&tree).unwrap();
        assert!(out.contains("import (\n\t\"bytes\"\n\t\"fmt\"\n\t\"os\"\n)\n"), "{out}");
    }

    #[test]
    fn test_malformed_method_reports_partial_output() {
        let mut tree = parse(SOURCE).unwrap();
        let root = tree.root();
        let mut func = marshal_json("T", &RuntimeConfig::default());
        func.name = Ident::new("func");
        let method = tree.synthesize(NodeKind::Method(func));
        tree.insert_child(root, 5, method);

        let err = print(&tree).unwrap_err();
        let partial = err.partial_output().unwrap();
        assert!(partial.starts_with("// header\npackage p"));
        assert!(!partial.contains("MarshalJSON"));
    }

    #[test]
    fn test_unanchored_synthesized_child_is_an_error() {
        let mut tree = parse("package p\n\nimport ()\n").unwrap();
        let decl = tree.import_decls()[0];
        let spec = tree.synthesize(NodeKind::ImportSpec(ImportSpec::new("fmt")));
        tree.insert_child(decl, 0, spec);
        assert!(matches!(print(&tree), Err(CodegenError::Print { .. })));
    }
}
