//! Column reference descriptors: the merge input produced by the resolution
//! phase.
//!
//! A [`ColumnRef`] carries its ordered path steps plus a parallel list of
//! [`LinkId`](crate::query_planner::LinkId) handles. Merging rewrites those
//! handles in place so that columns sharing a path prefix end up observing
//! the same shared link records.

use crate::query_planner::logical_expr::LogicalExpr;
use crate::query_planner::types::LinkId;

/// One segment of a dotted reference path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub id: String,
    /// Attached filter condition, e.g. `author[books > 2].name`.
    pub filter: Option<LogicalExpr>,
}

impl PathStep {
    pub fn new(id: impl Into<String>) -> Self {
        PathStep {
            id: id.into(),
            filter: None,
        }
    }

    pub fn with_filter(id: impl Into<String>, filter: LogicalExpr) -> Self {
        PathStep {
            id: id.into(),
            filter: Some(filter),
        }
    }

    /// Child-key identity under a parent node: the step identifier, extended
    /// with the serialized filter when one is attached. The same association
    /// traversed with different filters must yield distinct keys.
    pub fn child_key(&self) -> String {
        match &self.filter {
            Some(filter) => format!("{}[{}]", self.id, filter),
            None => self.id.clone(),
        }
    }
}

/// A column's resolved reference path, ready to be merged into a join tree.
#[derive(Debug, Clone)]
pub struct ColumnRef {
    path: Vec<PathStep>,
    /// Parallel to `path`; rewritten in place by the merge so repeated
    /// prefixes converge on shared link records.
    links: Vec<LinkId>,
    /// Nested-structure projection (the column projects the association's
    /// structure rather than a plain scalar).
    expand: bool,
}

impl ColumnRef {
    /// `links` must parallel `path` one-to-one; the resolution phase
    /// guarantees this for valid input.
    pub fn new(path: Vec<PathStep>, links: Vec<LinkId>) -> Self {
        debug_assert_eq!(path.len(), links.len());
        ColumnRef {
            path,
            links,
            expand: false,
        }
    }

    /// Mark this column as a nested-structure projection.
    pub fn with_expand(mut self) -> Self {
        self.expand = true;
        self
    }

    pub fn is_expand(&self) -> bool {
        self.expand
    }

    pub fn path(&self) -> &[PathStep] {
        &self.path
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub(crate) fn set_link(&mut self, index: usize, link: LinkId) {
        self.links[index] = link;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_planner::logical_expr::{Literal, LogicalExpr, Operator};

    #[test]
    fn test_child_key_without_filter() {
        assert_eq!(PathStep::new("author").child_key(), "author");
    }

    #[test]
    fn test_child_key_includes_serialized_filter() {
        let filter = LogicalExpr::binary(
            Operator::Eq,
            LogicalExpr::Column("stock".to_string()),
            LogicalExpr::Literal(Literal::Integer(0)),
        );
        let step = PathStep::with_filter("author", filter);
        assert_eq!(step.child_key(), "author[(stock = 0)]");
    }
}
