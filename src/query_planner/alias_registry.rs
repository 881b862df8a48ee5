//! Per-scope table alias allocation.
//!
//! Every query scope owns one [`AliasRegistry`]. A subquery's tree receives
//! a fixed, ordered list of [`ScopeHandle`]s for its enclosing scopes at
//! construction time and only ever reads them; inner scopes never mutate
//! outer state.
//!
//! All comparisons are case-insensitive. SQL identifiers collide under case
//! folding, so a mismatch here would surface as silent alias collisions in
//! generated statements.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Read-only lookup capability onto another scope's registry.
pub type ScopeHandle = Rc<RefCell<AliasRegistry>>;

/// Tracks the aliases assigned within one query scope.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    /// Uppercase alias -> canonical alias as handed out.
    assigned: HashMap<String, String>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_handle() -> ScopeHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Check whether an alias is taken in this scope (case-insensitive).
    pub fn is_taken(&self, alias: &str) -> bool {
        self.assigned.contains_key(&alias.to_uppercase())
    }

    /// Allocate the next collision-free alias for `candidate`.
    ///
    /// Returns `candidate` unchanged if it is free in this scope and in every
    /// scope in `outer_scopes`; otherwise appends a numeric suffix starting
    /// at 2, incrementing until a combination is free everywhere
    /// simultaneously. The suffix search is monotonic and unbounded, so it
    /// terminates for any finite set of pre-existing aliases.
    pub fn allocate(&mut self, candidate: &str, outer_scopes: &[ScopeHandle]) -> String {
        if self.is_free_everywhere(candidate, outer_scopes) {
            self.register(candidate);
            return candidate.to_string();
        }
        let mut suffix: u64 = 2;
        loop {
            let attempt = format!("{candidate}{suffix}");
            if self.is_free_everywhere(&attempt, outer_scopes) {
                log::debug!("Alias `{candidate}` taken, allocated `{attempt}`");
                self.register(&attempt);
                return attempt;
            }
            suffix += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Canonical aliases handed out by this scope, in no particular order.
    pub fn aliases(&self) -> impl Iterator<Item = &String> {
        self.assigned.values()
    }

    fn is_free_everywhere(&self, alias: &str, outer_scopes: &[ScopeHandle]) -> bool {
        !self.is_taken(alias)
            && outer_scopes
                .iter()
                .all(|scope| !scope.borrow().is_taken(alias))
    }

    fn register(&mut self, alias: &str) {
        self.assigned
            .insert(alias.to_uppercase(), alias.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_candidate_returned_unchanged() {
        let mut registry = AliasRegistry::new();
        assert_eq!(registry.allocate("Books", &[]), "Books");
        assert!(registry.is_taken("Books"));
    }

    #[test]
    fn test_deterministic_suffixing() {
        let mut registry = AliasRegistry::new();
        assert_eq!(registry.allocate("A", &[]), "A");
        assert_eq!(registry.allocate("A", &[]), "A2");
        assert_eq!(registry.allocate("A", &[]), "A3");
    }

    #[test]
    fn test_case_insensitive_collision() {
        let mut registry = AliasRegistry::new();
        assert_eq!(registry.allocate("Books", &[]), "Books");
        assert_eq!(registry.allocate("books", &[]), "books2");
        assert_eq!(registry.allocate("BOOKS", &[]), "BOOKS3");
    }

    #[test]
    fn test_alias_uniqueness_under_case_varying_duplicates() {
        let mut registry = AliasRegistry::new();
        let candidates = ["a", "A", "a", "b", "B", "a2", "A2"];
        let mut seen = std::collections::HashSet::new();
        for candidate in candidates {
            let alias = registry.allocate(candidate, &[]);
            assert!(
                seen.insert(alias.to_uppercase()),
                "alias `{alias}` collided case-insensitively"
            );
        }
    }

    #[test]
    fn test_outer_scope_avoidance() {
        let outer = AliasRegistry::new_handle();
        outer.borrow_mut().allocate("A", &[]);

        let mut inner = AliasRegistry::new();
        let alias = inner.allocate("A", &[Rc::clone(&outer)]);
        assert_eq!(alias, "A2");
        // Outer state is read, never written.
        assert_eq!(outer.borrow().len(), 1);
    }

    #[test]
    fn test_suffix_skips_aliases_taken_in_any_scope() {
        let outer1 = AliasRegistry::new_handle();
        let outer2 = AliasRegistry::new_handle();
        outer1.borrow_mut().allocate("T", &[]);
        outer2.borrow_mut().allocate("T2", &[]);

        let mut inner = AliasRegistry::new();
        inner.allocate("T3", &[]);
        let alias = inner.allocate("T", &[outer1, outer2]);
        assert_eq!(alias, "T4");
    }
}
