//! Request-driven feature scopes.
//!
//! Each scope checks its allow-list on the root model, ignores request entries
//! outside it, walks relation paths through the shared join context and
//! appends its own clause:
//!
//! - **search**: `CONCAT_WS(' ', ...) LIKE ?` across all searchable columns
//! - **filter**: equality, `IN`, `IS NULL` / `IS NOT NULL`
//! - **sort**: `ORDER BY`
//! - **range**: `BETWEEN`
//! - **autoload**: eager-load instruction
//! - **load_count**: count-aggregate column per relation

pub mod autoload;
pub mod filter;
pub mod load_count;
pub mod range;
pub mod search;
pub mod sort;

use crate::query::{SelectItem, SelectQuery};
use std::fmt;

/// A traversal capability a model can opt into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Search,
    Filter,
    Sort,
    Range,
    Autoload,
    LoadCount,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Search,
        Feature::Filter,
        Feature::Sort,
        Feature::Range,
        Feature::Autoload,
        Feature::LoadCount,
    ];

    /// Past participle used in configuration errors
    pub fn verb(self) -> &'static str {
        match self {
            Feature::Search => "searched",
            Feature::Filter => "filtered",
            Feature::Sort => "sorted",
            Feature::Range => "ranged",
            Feature::Autoload => "autoloaded",
            Feature::LoadCount => "load-counted",
        }
    }

    /// Request key of the feature
    pub fn key(self) -> &'static str {
        match self {
            Feature::Search => "search",
            Feature::Filter => "filter",
            Feature::Sort => "sort",
            Feature::Range => "range",
            Feature::Autoload => "autoload",
            Feature::LoadCount => "loadCount",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Select `<root>.*` unless the query already has a select list
pub(crate) fn ensure_base_select(query: &mut SelectQuery) {
    if query.columns().is_none() {
        let table = query.table().to_string();
        query.add_select(SelectItem::AllColumns(table));
    }
}

/// Intersect requested names with the allow-list, keeping allow-list order
pub(crate) fn intersect(allowed: &[String], requested: &[String]) -> Vec<String> {
    allowed
        .iter()
        .filter(|name| requested.contains(name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbs() {
        assert_eq!(Feature::Filter.verb(), "filtered");
        assert_eq!(Feature::LoadCount.verb(), "load-counted");
        assert_eq!(Feature::LoadCount.to_string(), "loadCount");
    }

    #[test]
    fn test_ensure_base_select_once() {
        let mut query = SelectQuery::new("posts");
        ensure_base_select(&mut query);
        ensure_base_select(&mut query);
        assert_eq!(query.columns(), Some(&[SelectItem::AllColumns("posts".into())][..]));
    }

    #[test]
    fn test_intersect_keeps_allow_list_order() {
        let allowed = vec!["author".to_string(), "tags".to_string(), "comments".to_string()];
        let requested = vec!["comments".to_string(), "author".to_string(), "secrets".to_string()];
        assert_eq!(intersect(&allowed, &requested), vec!["author".to_string(), "comments".to_string()]);
    }
}
