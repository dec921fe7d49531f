//! Depth-first traversal with post-visit editing
//!
//! [`walk`] asks the visitor whether to enter each node, walks the children
//! of entered nodes, then hands the visitor a [`Cursor`] positioned at the
//! node. Siblings inserted through the cursor are not visited by the walk in
//! progress.

use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// Callbacks driving a [`walk`]
pub trait Visitor {
    /// Whether `node` and its subtree should be visited at all
    fn descend(&mut self, tree: &SyntaxTree, node: NodeId) -> bool;

    /// Runs after the children of an entered node have been visited
    fn post_visit(&mut self, cursor: &mut Cursor<'_>);
}

/// Position of the node being post-visited, with sibling editing
pub struct Cursor<'t> {
    tree: &'t mut SyntaxTree,
    parent: Option<NodeId>,
    node: NodeId,
    index: usize,
    inserted_after: usize,
}

impl<'t> Cursor<'t> {
    fn new(tree: &'t mut SyntaxTree, parent: Option<NodeId>, index: usize, node: NodeId) -> Self {
        Self {
            tree,
            parent,
            node,
            index,
            inserted_after: 0,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Index of the current node in its parent's child list
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn tree(&self) -> &SyntaxTree {
        &*self.tree
    }

    /// Insert a new sibling after the current node
    ///
    /// Repeated calls keep call order. Returns `None` at the root.
    pub fn insert_after(&mut self, kind: NodeKind) -> Option<NodeId> {
        let parent = self.parent?;
        let id = self.tree.synthesize(kind);
        let at = self.index + 1 + self.inserted_after;
        self.tree.insert_child(parent, at, id);
        self.inserted_after += 1;
        Some(id)
    }

    /// Insert a new sibling before the current node
    pub fn insert_before(&mut self, kind: NodeKind) -> Option<NodeId> {
        let parent = self.parent?;
        let id = self.tree.synthesize(kind);
        self.tree.insert_child(parent, self.index, id);
        self.index += 1;
        Some(id)
    }

    /// Replace the current node with a new one
    pub fn replace(&mut self, kind: NodeKind) -> Option<NodeId> {
        let parent = self.parent?;
        let id = self.tree.synthesize(kind);
        self.tree.replace_child(parent, self.index, id);
        self.node = id;
        Some(id)
    }

    /// Index the walk continues from once this post-visit returns
    fn next_index(&self) -> usize {
        self.index + 1 + self.inserted_after
    }
}

/// Walk the whole tree from the root
pub fn walk<V: Visitor + ?Sized>(tree: &mut SyntaxTree, visitor: &mut V) {
    let root = tree.root();
    visit(tree, visitor, None, 0, root);
}

/// Visit `node` at `index` under `parent`; returns the next sibling index
fn visit<V: Visitor + ?Sized>(
    tree: &mut SyntaxTree,
    visitor: &mut V,
    parent: Option<NodeId>,
    index: usize,
    node: NodeId,
) -> usize {
    if !visitor.descend(tree, node) {
        return index + 1;
    }

    let mut i = 0;
    while let Some(&child) = tree.children(node).get(i) {
        i = visit(tree, visitor, Some(node), i, child);
    }

    let mut cursor = Cursor::new(tree, parent, index, node);
    visitor.post_visit(&mut cursor);
    cursor.next_index()
}
