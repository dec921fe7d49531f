//! In-place rewrite: a `MarshalJSON` method after every matched declaration

use std::collections::HashSet;

use tracing::{debug, info};

use super::fragment::marshal_json;
use super::DuplicatePolicy;
use crate::config::RuntimeConfig;
use crate::syntax::{NodeKind, SyntaxTree};
use crate::visit::{walk, Cursor, Match, MatchAction, StructMatcher};

/// Action inserting a synthesized method after the matched type's declaration
pub struct InsertMarshaler<'r> {
    runtime: &'r RuntimeConfig,
    policy: DuplicatePolicy,
    existing: HashSet<String>,
    inserted: Vec<String>,
    skipped: Vec<String>,
}

impl<'r> InsertMarshaler<'r> {
    pub fn new(tree: &SyntaxTree, runtime: &'r RuntimeConfig, policy: DuplicatePolicy) -> Self {
        let existing = match policy {
            DuplicatePolicy::Always => HashSet::new(),
            DuplicatePolicy::SkipExisting => tree
                .receivers_with_method(&runtime.method)
                .into_iter()
                .collect(),
        };
        Self {
            runtime,
            policy,
            existing,
            inserted: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Types that received a method, in document order
    pub fn inserted(&self) -> &[String] {
        &self.inserted
    }

    /// Types left alone because they already declare the method
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

impl MatchAction for InsertMarshaler<'_> {
    fn on_match(&mut self, cursor: &mut Cursor<'_>, found: &Match) {
        if self.policy == DuplicatePolicy::SkipExisting && self.existing.contains(&found.type_name)
        {
            info!(
                "{} already declares {}, skipping",
                found.type_name, self.runtime.method
            );
            self.skipped.push(found.type_name.clone());
            return;
        }

        let method = marshal_json(&found.type_name, self.runtime);
        if cursor.insert_after(NodeKind::Method(method)).is_some() {
            debug!("inserted {}.{}", found.type_name, self.runtime.method);
            self.inserted.push(found.type_name.clone());
        }
    }
}

/// Walk the tree inserting methods; returns the action for its bookkeeping
pub fn insert_methods<'r>(
    tree: &mut SyntaxTree,
    marker: &str,
    runtime: &'r RuntimeConfig,
    policy: DuplicatePolicy,
) -> InsertMarshaler<'r> {
    let action = InsertMarshaler::new(tree, runtime, policy);
    let mut matcher = StructMatcher::new(marker, action);
    walk(tree, &mut matcher);
    matcher.into_action()
}
