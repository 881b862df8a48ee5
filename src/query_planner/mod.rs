//! Query planner: join-tree construction for navigational path queries.
//!
//! The tree is built once per query compilation. [`JoinTree::new`] creates
//! one root per FROM-clause source (pre-registering nested subquery aliases
//! as it goes); [`JoinTree::merge_column`] then incorporates every column
//! that traverses associations, reusing nodes for shared path prefixes and
//! updating shared join-necessity state. The generation stage finally walks
//! the read-only tree via [`JoinTree::find_next_assoc`], emitting a real
//! JOIN only where `join_required` is set and copying foreign-key values
//! everywhere else.
//!
//! # Scope Chain
//!
//! Each tree owns one [`AliasRegistry`]. A subquery's tree receives ordered
//! [`ScopeHandle`]s of its enclosing queries at construction:
//!
//! ```text
//! SELECT ... ( SELECT ... ( SELECT ... ) )
//! └─ scope1 ──┴─ scope2 ───┴─ scope3 ─────┘
//! ```
//!
//! Alias allocation consults the whole chain; inner scopes never mutate
//! outer state.

pub mod alias_registry;
pub mod column;
pub mod errors;
pub mod join_tree;
pub mod logical_expr;
pub mod types;

pub use alias_registry::{AliasRegistry, ScopeHandle};
pub use column::{ColumnRef, PathStep};
pub use errors::JoinTreeError;
pub use join_tree::{JoinNode, JoinTree, Link};
pub use logical_expr::{Literal, LogicalExpr, Operator, OperatorApplication};
pub use types::{LinkId, NodeId};
