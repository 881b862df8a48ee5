//! Error types for join-tree construction.
//!
//! The tree trusts inputs that the resolution phase already validated, so
//! the only failures here are upstream defects. They abort compilation with
//! a diagnostic instead of silently dropping the column.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum JoinTreeError {
    #[error(
        "No source found for column path starting at `{head}`: the FROM clause has no matching alias or definition"
    )]
    UnresolvedColumnRoot { head: String },

    #[error("Column has no path steps")]
    EmptyColumnPath,
}
