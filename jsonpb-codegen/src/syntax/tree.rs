//! Arena-backed syntax tree for a single Go source file
//!
//! Nodes are stored in a flat `Vec` and addressed by [`NodeId`]. Edits only
//! ever append to the arena and rewrite child lists, so an id handed out
//! during a walk stays valid for the lifetime of the tree.

use crate::codegen::fragment::FuncDecl;

/// Stable handle to a node in a [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Half-open byte range into the original source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Where a node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Parsed from the source; printed as its original bytes
    Source(Span),
    /// Built by the engine; printed from its structure
    Synthesized,
    /// Built by the engine in place of a parsed node; printed from its
    /// structure over the replaced node's span
    Rewritten(Span),
}

/// The keyword of a general declaration group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Import,
    Type,
    Var,
    Const,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Import => "import",
            DeclKind::Type => "type",
            DeclKind::Var => "var",
            DeclKind::Const => "const",
        }
    }
}

/// A single entry of an import declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit package name, including `_` and `.`
    pub alias: Option<String>,
    /// Unquoted import path
    pub path: String,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            alias: None,
            path: path.into(),
        }
    }

    pub fn with_alias(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            path: path.into(),
        }
    }

    /// Whether the import is `_` or `.`, neither of which binds a name
    pub fn is_blank_or_dot(&self) -> bool {
        matches!(self.alias.as_deref(), Some("_") | Some("."))
    }
}

/// A struct field declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field names; empty for embedded fields
    pub names: Vec<String>,
    /// Type as written in the source
    pub ty: String,
    /// Raw tag literal including its quotes
    pub tag: Option<String>,
}

/// Node payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    File,
    Package { name: String },
    /// `import`, `type`, `var` or `const` declaration, parenthesized or not
    Decl { kind: DeclKind, grouped: bool },
    ImportSpec(ImportSpec),
    TypeSpec { name: String },
    StructType,
    Field(Field),
    /// Any non-struct type on the right-hand side of a type spec
    OtherType,
    /// A parsed function or method declaration
    Func {
        name: String,
        /// Base type name of the receiver, without `*` or type arguments
        receiver: Option<String>,
    },
    /// A method built by the engine
    Method(FuncDecl),
    Comment,
    /// Top-level grammar node the engine has no model for
    Other(String),
}

impl NodeKind {
    /// Short human-readable name for logs and inspection output
    pub fn label(&self) -> String {
        match self {
            NodeKind::File => "file".to_string(),
            NodeKind::Package { name } => format!("package {}", name),
            NodeKind::Decl { kind, grouped } => {
                if *grouped {
                    format!("{} group", kind.keyword())
                } else {
                    format!("{} declaration", kind.keyword())
                }
            }
            NodeKind::ImportSpec(spec) => match &spec.alias {
                Some(alias) => format!("import {} {:?}", alias, spec.path),
                None => format!("import {:?}", spec.path),
            },
            NodeKind::TypeSpec { name } => format!("type spec {}", name),
            NodeKind::StructType => "struct".to_string(),
            NodeKind::Field(field) => format!("field {}", field.names.join(", ")),
            NodeKind::OtherType => "non-struct type".to_string(),
            NodeKind::Func {
                name,
                receiver: Some(recv),
            } => format!("method {}.{}", recv, name),
            NodeKind::Func {
                name,
                receiver: None,
            } => format!("func {}", name),
            NodeKind::Method(func) => format!("generated method {}", func.name),
            NodeKind::Comment => "comment".to_string(),
            NodeKind::Other(kind) => kind.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    origin: Origin,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed Go file plus any nodes the engine has added to it
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    /// Create a tree whose root `File` node spans the whole source
    pub fn new(source: String) -> Self {
        let root = NodeData {
            kind: NodeKind::File,
            origin: Origin::Source(Span::new(0, source.len())),
            parent: None,
            children: Vec::new(),
        };
        Self {
            source,
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn origin(&self, id: NodeId) -> Origin {
        self.nodes[id.0].origin
    }

    pub fn span(&self, id: NodeId) -> Option<Span> {
        match self.nodes[id.0].origin {
            Origin::Source(span) | Origin::Rewritten(span) => Some(span),
            Origin::Synthesized => None,
        }
    }

    /// Original text of the source range a node occupies
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.span(id).map(|span| &self.source[span.start..span.end])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Add a detached node to the arena
    pub fn alloc(&mut self, kind: NodeKind, origin: Origin) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            origin,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Add a synthesized node to the arena
    pub fn synthesize(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind, Origin::Synthesized)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` at `index` in the parent's child list (clamped to the end)
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Swap the child at `index` for `child`, returning the detached node
    ///
    /// A synthesized replacement takes over the span of the node it replaces.
    pub fn replace_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> NodeId {
        let old = std::mem::replace(&mut self.nodes[parent.0].children[index], child);
        if let (Origin::Synthesized, Some(span)) = (self.origin(child), self.span(old)) {
            self.nodes[child.0].origin = Origin::Rewritten(span);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        old
    }

    /// Position of `child` within its parent's child list
    pub fn index_in_parent(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Package name from the package clause
    pub fn package_name(&self) -> Option<&str> {
        self.children(self.root)
            .iter()
            .find_map(|&id| match self.kind(id) {
                NodeKind::Package { name } => Some(name.as_str()),
                _ => None,
            })
    }

    /// Top-level import declarations in document order
    pub fn import_decls(&self) -> Vec<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .filter(|&id| {
                matches!(
                    self.kind(id),
                    NodeKind::Decl {
                        kind: DeclKind::Import,
                        ..
                    }
                )
            })
            .collect()
    }

    /// Every import spec in the file, in document order
    pub fn import_specs(&self) -> Vec<(NodeId, &ImportSpec)> {
        self.import_decls()
            .into_iter()
            .flat_map(|decl| self.children(decl).iter().copied())
            .filter_map(|id| match self.kind(id) {
                NodeKind::ImportSpec(spec) => Some((id, spec)),
                _ => None,
            })
            .collect()
    }

    /// The `StructType` child of a type spec, if the spec declares a struct
    pub fn struct_of(&self, spec: NodeId) -> Option<NodeId> {
        self.children(spec)
            .iter()
            .copied()
            .find(|&id| matches!(self.kind(id), NodeKind::StructType))
    }

    /// Field declarations of a struct node
    pub fn fields(&self, struct_id: NodeId) -> impl Iterator<Item = &Field> + '_ {
        self.children(struct_id)
            .iter()
            .filter_map(|&id| match self.kind(id) {
                NodeKind::Field(field) => Some(field),
                _ => None,
            })
    }

    /// Receiver type names that already declare a method called `method`,
    /// whether parsed or synthesized
    pub fn receivers_with_method(&self, method: &str) -> Vec<String> {
        self.children(self.root)
            .iter()
            .filter_map(|&id| match self.kind(id) {
                NodeKind::Func {
                    name,
                    receiver: Some(recv),
                } if name == method => Some(recv.clone()),
                NodeKind::Method(func) if func.name.as_str() == method => {
                    func.receiver_type_name().map(str::to_string)
                }
                _ => None,
            })
            .collect()
    }
}
