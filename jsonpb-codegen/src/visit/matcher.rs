//! Find protoc-generated struct declarations

use tracing::debug;

use super::walk::{Cursor, Visitor};
use crate::syntax::{DeclKind, NodeId, NodeKind, SyntaxTree};

/// A type spec that satisfied the match predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The type declaration group holding the spec
    pub decl: NodeId,
    pub spec: NodeId,
    pub type_name: String,
}

/// What to do with each matched type
///
/// The cursor sits on the enclosing declaration group, so anything inserted
/// after it lands after the whole group.
pub trait MatchAction {
    fn on_match(&mut self, cursor: &mut Cursor<'_>, found: &Match);
}

impl<F> MatchAction for F
where
    F: FnMut(&mut Cursor<'_>, &Match),
{
    fn on_match(&mut self, cursor: &mut Cursor<'_>, found: &Match) {
        self(cursor, found)
    }
}

/// Whether any field of the struct carries a tag containing `marker`
///
/// Plain substring containment; the tag's key/value grammar is not parsed.
pub fn is_candidate(tree: &SyntaxTree, struct_id: NodeId, marker: &str) -> bool {
    tree.fields(struct_id)
        .filter_map(|field| field.tag.as_deref())
        .any(|tag| tag.contains(marker))
}

/// Visitor that prunes the walk to type declarations and reports every
/// struct matching [`is_candidate`] to its action
pub struct StructMatcher<'m, A> {
    marker: &'m str,
    action: A,
    matched: usize,
}

impl<'m, A: MatchAction> StructMatcher<'m, A> {
    pub fn new(marker: &'m str, action: A) -> Self {
        Self {
            marker,
            action,
            matched: 0,
        }
    }

    /// Number of matches reported so far
    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn into_action(self) -> A {
        self.action
    }
}

impl<A: MatchAction> Visitor for StructMatcher<'_, A> {
    fn descend(&mut self, tree: &SyntaxTree, node: NodeId) -> bool {
        match tree.kind(node) {
            NodeKind::File => true,
            NodeKind::Decl {
                kind: DeclKind::Type,
                ..
            } => true,
            other => {
                debug!("(pre) found {}, not traversing it", other.label());
                false
            }
        }
    }

    fn post_visit(&mut self, cursor: &mut Cursor<'_>) {
        let decl = cursor.node();
        let NodeKind::Decl {
            kind: DeclKind::Type,
            ..
        } = cursor.tree().kind(decl)
        else {
            return;
        };

        let specs = cursor.tree().children(decl).to_vec();
        for spec in specs {
            let tree = cursor.tree();
            let NodeKind::TypeSpec { name } = tree.kind(spec) else {
                continue;
            };
            let Some(struct_id) = tree.struct_of(spec) else {
                debug!("type {} is not a struct", name);
                continue;
            };
            if tree.children(struct_id).is_empty() {
                debug!("struct {} has no fields", name);
                continue;
            }
            if !is_candidate(tree, struct_id, self.marker) {
                continue;
            }

            let found = Match {
                decl,
                spec,
                type_name: name.clone(),
            };
            debug!("matched struct {}", found.type_name);
            self.matched += 1;
            self.action.on_match(cursor, &found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;
    use crate::visit::walk;

    const MARKER: &str = "protobuf:";

    fn matched_names(source: &str) -> Vec<String> {
        let mut tree = parse(source).unwrap();
        let mut names = Vec::new();
        let mut matcher = StructMatcher::new(MARKER, |_: &mut Cursor<'_>, found: &Match| {
            names.push(found.type_name.clone())
        });
        walk(&mut tree, &mut matcher);
        names
    }

    #[test]
    fn test_tagged_struct_matches() {
        let names = matched_names("package p\n\ntype T struct {\n\tF string `protobuf:\"1\"`\n}\n");
        assert_eq!(names, vec!["T"]);
    }

    #[test]
    fn test_untagged_and_empty_structs_never_match() {
        let source = r#"package p

type Empty struct{}

type Plain struct {
	A string
	B int `json:"b"`
}

type Iface interface{ M() }
"#;
        assert!(matched_names(source).is_empty());
    }

    #[test]
    fn test_any_single_tagged_field_is_enough() {
        let source = r#"package p

type Msg struct {
	state   int
	Name    string `protobuf:"bytes,1,opt,name=name,proto3" json:"name,omitempty"`
	unknown []byte
}
"#;
        assert_eq!(matched_names(source), vec!["Msg"]);
    }

    #[test]
    fn test_grouped_specs_continue_past_non_structs() {
        let source = r#"package p

type (
	Empty struct{}
	Enum  int32
	A     struct {
		X int `protobuf:"varint,1"`
	}
	B struct {
		Y int `protobuf:"varint,1"`
	}
)
"#;
        assert_eq!(matched_names(source), vec!["A", "B"]);
    }

    #[test]
    fn test_structs_inside_functions_are_not_visited() {
        let source = r#"package p

func f() {
	type Local struct {
		X int `protobuf:"varint,1"`
	}
	_ = Local{}
}

var v = struct {
	X int `protobuf:"varint,1"`
}{}
"#;
        assert!(matched_names(source).is_empty());
    }

    #[test]
    fn test_custom_marker() {
        let mut tree =
            parse("package p\n\ntype T struct {\n\tF string `thrift:\"1\"`\n}\n").unwrap();
        let mut count = 0;
        let mut matcher =
            StructMatcher::new("thrift:", |_: &mut Cursor<'_>, _: &Match| count += 1);
        walk(&mut tree, &mut matcher);
        assert_eq!(matcher.matched(), 1);
        drop(matcher);
        assert_eq!(count, 1);
    }
}
