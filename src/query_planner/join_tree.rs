//! Join tree: the intermediate structure mapping all association traversals
//! of a query to a minimal set of joins.
//!
//! Built once per query compilation. Roots are created immediately from the
//! query's source set (recursing into nested source sets so subquery-internal
//! aliases are pre-reserved); nodes below roots are created lazily as columns
//! are merged. Once all columns are merged the tree is read-only and is
//! consumed by the SQL generation stage through [`JoinTree::roots`],
//! [`JoinTree::find_next_assoc`] and the node/link accessors.
//!
//! # Shared state
//!
//! Nodes and link records live in `Vec` arenas addressed by [`NodeId`] and
//! [`LinkId`]. Columns store link indices, never copies, so every column
//! whose path prefix resolves to the same node observes the same mutable
//! link record by construction.
//!
//! # Join necessity
//!
//! A new association node starts optimistic: `join_required = false`, meaning
//! the association is resolvable purely through copied foreign-key values.
//! The flag is upgraded to `true` - and never downgraded - when:
//! - the step carries an attached filter (a predicate cannot be satisfied by
//!   foreign-key copying alone),
//! - a child step falls outside the node's declared foreign-key set,
//! - the node is the target of a nested-structure projection.

use std::rc::Rc;
use std::sync::Arc;

use crate::query_planner::alias_registry::{AliasRegistry, ScopeHandle};
use crate::query_planner::column::ColumnRef;
use crate::query_planner::errors::JoinTreeError;
use crate::query_planner::logical_expr::LogicalExpr;
use crate::query_planner::types::{LinkId, NodeId};
use crate::schema_catalog::{Association, SchemaDefinition, SourceSet};

/// Mutable record shared by every path-step occurrence that resolves to the
/// same tree node.
#[derive(Debug, Clone)]
pub struct Link {
    target: Arc<SchemaDefinition>,
    association: Option<Association>,
    join_required: bool,
    alias: Option<String>,
}

impl Link {
    /// Link record for a FROM-clause source.
    pub fn for_source(target: Arc<SchemaDefinition>) -> Self {
        Link {
            target,
            association: None,
            join_required: false,
            alias: None,
        }
    }

    /// Link record for an association traversal step.
    pub fn for_association(target: Arc<SchemaDefinition>, association: Association) -> Self {
        Link {
            target,
            association: Some(association),
            join_required: false,
            alias: None,
        }
    }

    /// Link record for a scalar (non-association) step; `target` is the
    /// definition the element lives on.
    pub fn for_element(target: Arc<SchemaDefinition>) -> Self {
        Link {
            target,
            association: None,
            join_required: false,
            alias: None,
        }
    }

    pub fn target(&self) -> &Arc<SchemaDefinition> {
        &self.target
    }

    pub fn association(&self) -> Option<&Association> {
        self.association.as_ref()
    }

    pub fn is_association(&self) -> bool {
        self.association.is_some()
    }

    pub fn join_required(&self) -> bool {
        self.join_required
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

/// One node of the join tree: a path step, or a source root when `parent`
/// is absent.
#[derive(Debug, Clone)]
pub struct JoinNode {
    link: LinkId,
    parent: Option<NodeId>,
    filter: Option<LogicalExpr>,
    /// Key under the parent's children; deduplicates repeated prefixes.
    child_key: String,
    /// Insertion order, i.e. the order in which columns introduced them.
    /// Load-bearing: the generator's join emission order follows it.
    children: Vec<NodeId>,
}

impl JoinNode {
    pub fn link(&self) -> LinkId {
        self.link
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn filter(&self) -> Option<&LogicalExpr> {
        self.filter.as_ref()
    }

    pub fn child_key(&self) -> &str {
        &self.child_key
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// The join tree for one query scope.
#[derive(Debug)]
pub struct JoinTree {
    links: Vec<Link>,
    nodes: Vec<JoinNode>,
    /// Assigned alias -> source root, in FROM-clause order.
    roots: Vec<(String, NodeId)>,
    scope: ScopeHandle,
    /// Enclosing scopes, outermost last; fixed at construction, read-only.
    outer_scopes: Vec<ScopeHandle>,
    is_initial: bool,
}

impl JoinTree {
    /// Build the tree for a query's source set, registering every source
    /// alias and recursing into nested source sets (derived queries) so
    /// their internal aliases are pre-reserved without building their trees.
    pub fn new(sources: &SourceSet, outer_scopes: Vec<ScopeHandle>) -> Self {
        let mut tree = JoinTree {
            links: Vec::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
            scope: AliasRegistry::new_handle(),
            outer_scopes,
            is_initial: true,
        };
        for (alias, definition) in sources.iter() {
            let assigned = tree.allocate_alias(alias);
            let link = tree.add_link(Link {
                alias: Some(assigned.clone()),
                ..Link::for_source(Arc::clone(definition))
            });
            let node = tree.add_node(JoinNode {
                link,
                parent: None,
                filter: None,
                child_key: assigned.clone(),
                children: Vec::new(),
            });
            tree.roots.push((assigned, node));
            if let Some(nested) = definition.sources.as_ref() {
                tree.reserve_nested_aliases(nested);
            }
        }
        tree
    }

    // ========================================================================
    // Arena access
    // ========================================================================

    /// Register a link record; the resolution phase uses this to hand each
    /// path step a stable handle before merging.
    pub fn add_link(&mut self, link: Link) -> LinkId {
        self.links.push(link);
        LinkId(self.links.len() - 1)
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn node(&self, id: NodeId) -> &JoinNode {
        &self.nodes[id.0]
    }

    fn add_node(&mut self, node: JoinNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    // ========================================================================
    // Scope / roots
    // ========================================================================

    /// Lookup handle onto this scope's alias registry, for constructing
    /// subquery trees.
    pub fn scope_handle(&self) -> ScopeHandle {
        Rc::clone(&self.scope)
    }

    /// FROM-clause sources: assigned alias plus root node, in source order.
    pub fn roots(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.roots.iter().map(|(alias, node)| (alias.as_str(), *node))
    }

    /// Whether no column has been merged yet.
    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    /// Child of `parent` with the given key, if any.
    pub fn child(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].child_key == key)
    }

    fn root_by_alias(&self, alias: &str) -> Option<NodeId> {
        let wanted = alias.to_uppercase();
        self.roots
            .iter()
            .find(|(assigned, _)| assigned.to_uppercase() == wanted)
            .map(|(_, node)| *node)
    }

    fn allocate_alias(&mut self, candidate: &str) -> String {
        self.scope
            .borrow_mut()
            .allocate(candidate, &self.outer_scopes)
    }

    /// Register the aliases of a derived query's source set, recursing into
    /// deeper nested queries, so later allocations never collide with
    /// subquery-internal aliases. No nodes are created for them.
    fn reserve_nested_aliases(&mut self, sources: &SourceSet) {
        for (alias, definition) in sources.iter() {
            self.allocate_alias(alias);
            if let Some(nested) = definition.sources.as_ref() {
                self.reserve_nested_aliases(nested);
            }
        }
    }

    // ========================================================================
    // Column merge
    // ========================================================================

    /// Incorporate one column's reference path into the tree.
    ///
    /// The column's link handles are rewritten in place: wherever the path
    /// shares a prefix with an earlier column, the handle for that step is
    /// re-pointed at the existing node's shared link record. Inputs are
    /// pre-validated by the resolution phase; the only failure mode is a
    /// head step that matches no root, which is an upstream defect and
    /// aborts compilation.
    pub fn merge_column(&mut self, column: &mut ColumnRef) -> Result<(), JoinTreeError> {
        self.is_initial = false;
        crate::debug_print!(
            "DEBUG JoinTree::merge_column: path={:?}, expand={}",
            column.path().iter().map(|s| s.child_key()).collect::<Vec<_>>(),
            column.is_expand()
        );

        let mut node = self.locate_start(column)?;
        let last = column.path().len() - 1;
        for i in 1..=last {
            let step = column.path()[i].clone();
            let key = step.child_key();

            if let Some(existing) = self.child(node, &key) {
                // Re-point the handle at the shared record; this is what
                // makes prefix-sharing columns converge on one state.
                column.set_link(i, self.nodes[existing.0].link);
                node = existing;
                continue;
            }

            if i == last && column.is_expand() {
                // Nested-structure projection: the projected association is
                // materialized by the generator itself, so no child node is
                // created; the node it hangs off must be joined.
                let current = self.nodes[node.0].link;
                self.require_join(current);
                return Ok(());
            }

            let step_link = column.links()[i];
            if self.links[step_link.0].is_association() {
                if step.filter.is_some() {
                    // A predicate cannot be satisfied by foreign-key
                    // copying alone.
                    self.require_join(step_link);
                } else {
                    let alias = self.allocate_alias(&step.id);
                    self.links[step_link.0].alias = Some(alias);
                }
                self.check_parent_keys(node, &step.id);
                let child = self.add_node(JoinNode {
                    link: step_link,
                    parent: Some(node),
                    filter: step.filter.clone(),
                    child_key: key,
                    children: Vec::new(),
                });
                self.nodes[node.0].children.push(child);
                node = child;
            } else {
                // Scalar steps create no nodes; only their effect on the
                // current node's join necessity is observable.
                self.check_parent_keys(node, &step.id);
            }
        }
        Ok(())
    }

    /// Locate the root the column's head step denotes and rewrite its handle.
    ///
    /// Heads either name a registered source alias directly, or - for columns
    /// synthesized without an explicit source alias - resolve to a definition
    /// matching one of the roots (possibly through the derived query's
    /// originating definition). Either way the head positions the walk at the
    /// root and creates no node of its own.
    fn locate_start(&mut self, column: &mut ColumnRef) -> Result<NodeId, JoinTreeError> {
        let head = column
            .path()
            .first()
            .ok_or(JoinTreeError::EmptyColumnPath)?;

        if let Some(root) = self.root_by_alias(&head.id) {
            column.set_link(0, self.nodes[root.0].link);
            return Ok(root);
        }

        let head_target = Arc::clone(self.links[column.links()[0].0].target());
        let matched = self
            .roots
            .iter()
            .map(|(_, node)| *node)
            .find(|&node| {
                let root_def = self.links[self.nodes[node.0].link.0].target();
                root_def.name == head_target.name
                    || head_target
                        .origin
                        .as_ref()
                        .is_some_and(|origin| origin.name == root_def.name)
            });

        match matched {
            Some(root) => {
                column.set_link(0, self.nodes[root.0].link);
                Ok(root)
            }
            None => Err(JoinTreeError::UnresolvedColumnRoot {
                head: head.id.clone(),
            }),
        }
    }

    /// Force `parent` to a real join when `step_id` falls outside its
    /// declared foreign-key set: the node is then used for more than
    /// foreign-key projection. Source roots have no foreign-key set to
    /// exceed and are never upgraded here.
    fn check_parent_keys(&mut self, parent: NodeId, step_id: &str) {
        let parent_link = self.nodes[parent.0].link;
        let covered = match self.links[parent_link.0].association.as_ref() {
            Some(assoc) => assoc.foreign_keys.iter().any(|fk| fk == step_id),
            None => true,
        };
        if !covered {
            self.require_join(parent_link);
        }
    }

    /// Upgrade a link to `join_required = true`. The flag never transitions
    /// back to optional.
    fn require_join(&mut self, link: LinkId) {
        let record = &mut self.links[link.0];
        if !record.join_required {
            record.join_required = true;
            log::debug!(
                "Join required for `{}`",
                record
                    .association
                    .as_ref()
                    .map(|a| a.name.as_str())
                    .unwrap_or(record.target.name.as_str())
            );
        }
    }

    // ========================================================================
    // Association lookup
    // ========================================================================

    /// Depth-first, pre-order search over `from` and its descendants for the
    /// nearest association node with `join_required = true`. Siblings are
    /// visited in insertion order. Optional nodes are never returned but
    /// their subtrees are still searched; the generator resolves them via
    /// foreign-key value copy and recurses independently below each node
    /// this returns.
    pub fn find_next_assoc(&self, from: NodeId) -> Option<NodeId> {
        let node = &self.nodes[from.0];
        let link = &self.links[node.link.0];
        if link.is_association() && link.join_required {
            return Some(from);
        }
        node.children
            .iter()
            .find_map(|&child| self.find_next_assoc(child))
    }
}
