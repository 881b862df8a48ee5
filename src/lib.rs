//! Navsql - join-tree construction for navigational query compilation
//!
//! This crate provides the core intermediate structure used when translating
//! a structured query over navigational association paths into SQL:
//! - Per-scope table alias allocation (collision-free across nested queries)
//! - Merging of column reference paths into a shared join tree
//! - Join-necessity inference (real JOIN vs. foreign-key value copy)
//! - Association lookup for the downstream SQL generation stage

/// Debug print macro that only compiles in debug builds.
/// In release builds, this expands to nothing, so there's zero runtime cost.
#[macro_export]
macro_rules! debug_print {
    ($($arg:tt)*) => {
        #[cfg(debug_assertions)]
        eprintln!($($arg)*);
    };
}

pub mod query_planner;
pub mod schema_catalog;
