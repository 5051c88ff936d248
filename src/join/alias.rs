//! Deterministic join aliases.

use crate::query::SelectQuery;

const ALIAS_PREFIX: &str = "j";

/// Hands out `j0`, `j1`, ... for one traversal
#[derive(Debug, Clone, Default)]
pub struct AliasGenerator {
    next: usize,
}

impl AliasGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next alias not already used as a table or alias in `query`
    pub fn next_alias(&mut self, query: &SelectQuery) -> String {
        loop {
            let alias = format!("{ALIAS_PREFIX}{}", self.next);
            self.next += 1;
            if !query.is_reference_taken(&alias) {
                return alias;
            }
        }
    }

    /// Aliases handed out so far
    pub fn issued(&self) -> usize {
        self.next
    }
}
