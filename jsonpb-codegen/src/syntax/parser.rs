//! Go source parser using tree-sitter-go
//!
//! The concrete tree is lowered to a [`SyntaxTree`] at declaration
//! granularity: top-level declarations, import specs, type specs, struct
//! types and their fields. Function bodies and value expressions are kept
//! only as byte spans.

use tree_sitter::{Node, Parser};

use super::tree::{DeclKind, Field, ImportSpec, NodeId, NodeKind, Origin, Span, SyntaxTree};
use crate::error::{CodegenError, Result};

/// Parse Go source text into a [`SyntaxTree`]
///
/// Any syntax error is fatal; the error carries the 1-based position of the
/// first offending node.
pub fn parse(source: &str) -> Result<SyntaxTree> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_go::LANGUAGE.into())?;

    let ts_tree = parser.parse(source, None).ok_or_else(|| CodegenError::Parse {
        line: 1,
        column: 1,
        message: "parser produced no tree".into(),
    })?;
    let root = ts_tree.root_node();

    if root.has_error() {
        return Err(first_syntax_error(root, source));
    }

    let mut tree = SyntaxTree::new(source.to_string());
    let mut lowering = Lowering {
        src: source.as_bytes(),
        tree: &mut tree,
    };

    let file = lowering.tree.root();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        let id = lowering.top_level(child);
        lowering.tree.append_child(file, id);
    }

    if tree.package_name().is_none() {
        return Err(CodegenError::Parse {
            line: 1,
            column: 1,
            message: "missing package clause".into(),
        });
    }

    Ok(tree)
}

/// Locate the first ERROR or MISSING node in document order
fn first_syntax_error(root: Node<'_>, source: &str) -> CodegenError {
    let mut stack = vec![root];
    let mut found = None;

    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let earlier = found
                .as_ref()
                .map(|f: &Node<'_>| node.start_byte() < f.start_byte())
                .unwrap_or(true);
            if earlier {
                found = Some(node);
            }
            continue;
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }

    let Some(node) = found else {
        return CodegenError::Parse {
            line: 1,
            column: 1,
            message: "syntax error".into(),
        };
    };

    let position = node.start_position();
    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        let snippet: String = node
            .utf8_text(source.as_bytes())
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(40)
            .collect();
        format!("unexpected `{}`", snippet)
    };

    CodegenError::Parse {
        line: position.row.saturating_add(1),
        column: position.column.saturating_add(1),
        message,
    }
}

struct Lowering<'a> {
    src: &'a [u8],
    tree: &'a mut SyntaxTree,
}

impl Lowering<'_> {
    fn text(&self, node: Node<'_>) -> String {
        node.utf8_text(self.src).unwrap_or_default().to_string()
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> Option<String> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    fn alloc(&mut self, kind: NodeKind, node: Node<'_>) -> NodeId {
        self.tree.alloc(
            kind,
            Origin::Source(Span::new(node.start_byte(), node.end_byte())),
        )
    }

    fn top_level(&mut self, node: Node<'_>) -> NodeId {
        match node.kind() {
            "package_clause" => {
                let mut cursor = node.walk();
                let name = node
                    .named_children(&mut cursor)
                    .find(|n| n.kind() == "package_identifier" || n.kind() == "identifier")
                    .map(|n| self.text(n))
                    .unwrap_or_default();
                self.alloc(NodeKind::Package { name }, node)
            }
            "import_declaration" => self.import_decl(node),
            "type_declaration" => self.type_decl(node),
            "var_declaration" => self.value_decl(node, DeclKind::Var),
            "const_declaration" => self.value_decl(node, DeclKind::Const),
            "function_declaration" => {
                let name = self.field_text(node, "name").unwrap_or_default();
                self.alloc(
                    NodeKind::Func {
                        name,
                        receiver: None,
                    },
                    node,
                )
            }
            "method_declaration" => {
                let name = self.field_text(node, "name").unwrap_or_default();
                let receiver = node
                    .child_by_field_name("receiver")
                    .and_then(|list| self.receiver_type(list));
                self.alloc(NodeKind::Func { name, receiver }, node)
            }
            "comment" => self.alloc(NodeKind::Comment, node),
            other => self.alloc(NodeKind::Other(other.to_string()), node),
        }
    }

    fn import_decl(&mut self, node: Node<'_>) -> NodeId {
        let mut specs = Vec::new();
        let mut grouped = false;

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => specs.push(child),
                "import_spec_list" => {
                    grouped = true;
                    let mut inner = child.walk();
                    specs.extend(
                        child
                            .named_children(&mut inner)
                            .filter(|n| matches!(n.kind(), "import_spec" | "comment")),
                    );
                }
                _ => {}
            }
        }

        let decl = self.alloc(
            NodeKind::Decl {
                kind: DeclKind::Import,
                grouped,
            },
            node,
        );
        for spec in specs {
            if spec.kind() == "comment" {
                let id = self.alloc(NodeKind::Comment, spec);
                self.tree.append_child(decl, id);
                continue;
            }
            let alias = self.field_text(spec, "name");
            let path = self
                .field_text(spec, "path")
                .map(|p| unquote(&p).to_string())
                .unwrap_or_default();
            let id = self.alloc(NodeKind::ImportSpec(ImportSpec { alias, path }), spec);
            self.tree.append_child(decl, id);
        }
        decl
    }

    fn type_decl(&mut self, node: Node<'_>) -> NodeId {
        let mut specs = Vec::new();
        let mut grouped = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "(" => grouped = true,
                "type_spec" | "type_alias" => specs.push(child),
                _ => {}
            }
        }

        let decl = self.alloc(
            NodeKind::Decl {
                kind: DeclKind::Type,
                grouped,
            },
            node,
        );
        for spec in specs {
            let id = self.type_spec(spec);
            self.tree.append_child(decl, id);
        }
        decl
    }

    fn type_spec(&mut self, node: Node<'_>) -> NodeId {
        let name = self.field_text(node, "name").unwrap_or_default();
        let spec = self.alloc(NodeKind::TypeSpec { name }, node);

        // Aliases never introduce a new named struct, so they are not
        // candidates even when the right-hand side is a struct literal.
        let ty = node.child_by_field_name("type");
        let ty_id = match ty {
            Some(ty) if node.kind() == "type_spec" && ty.kind() == "struct_type" => {
                self.struct_type(ty)
            }
            Some(ty) => self.alloc(NodeKind::OtherType, ty),
            None => self.alloc(NodeKind::OtherType, node),
        };
        self.tree.append_child(spec, ty_id);
        spec
    }

    fn struct_type(&mut self, node: Node<'_>) -> NodeId {
        let id = self.alloc(NodeKind::StructType, node);

        let mut cursor = node.walk();
        let list = node
            .named_children(&mut cursor)
            .find(|n| n.kind() == "field_declaration_list");
        let Some(list) = list else {
            return id;
        };

        let mut inner = list.walk();
        let declarations: Vec<Node<'_>> = list
            .named_children(&mut inner)
            .filter(|n| n.kind() == "field_declaration")
            .collect();

        for decl in declarations {
            let field = self.field(decl);
            let field_id = self.alloc(NodeKind::Field(field), decl);
            self.tree.append_child(id, field_id);
        }
        id
    }

    fn field(&self, node: Node<'_>) -> Field {
        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| self.text(n))
            .collect();

        let mut ty = self.field_text(node, "type").unwrap_or_default();
        if names.is_empty() && self.text(node).starts_with('*') && !ty.starts_with('*') {
            ty = format!("*{}", ty);
        }

        Field {
            names,
            ty,
            tag: self.field_text(node, "tag"),
        }
    }

    fn value_decl(&mut self, node: Node<'_>, kind: DeclKind) -> NodeId {
        let mut cursor = node.walk();
        let grouped = node.children(&mut cursor).any(|n| n.kind() == "(");
        self.alloc(NodeKind::Decl { kind, grouped }, node)
    }

    /// Base type name of a method receiver: `(m *Foo[T])` yields `Foo`
    fn receiver_type(&self, list: Node<'_>) -> Option<String> {
        let mut cursor = list.walk();
        let param = list
            .named_children(&mut cursor)
            .find(|n| n.kind() == "parameter_declaration")?;
        let ty = self.field_text(param, "type")?;
        let base = ty.trim_start_matches(['*', '(', ' ']);
        let base = base.split(['[', ')', ' ']).next().unwrap_or(base);
        if base.is_empty() {
            None
        } else {
            Some(base.to_string())
        }
    }
}

/// Strip the quotes from an interpreted or raw string literal
fn unquote(literal: &str) -> &str {
    literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            literal
                .strip_prefix('`')
                .and_then(|s| s.strip_suffix('`'))
        })
        .unwrap_or(literal)
}
