//! SQL dialect selection.

use sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, SelectStatement, SqliteQueryBuilder, Values};
use serde::Deserialize;

/// Database backend the query will run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl Backend {
    /// Pattern operator for text search; PostgreSQL needs ILIKE to match case-insensitively
    pub fn like_operator(self) -> &'static str {
        match self {
            Backend::Postgres => "ILIKE",
            Backend::MySql | Backend::Sqlite => "LIKE",
        }
    }

    /// Target type for `CAST(... AS <type>)` of integer aggregates
    pub fn integer_type(self) -> &'static str {
        match self {
            Backend::MySql => "SIGNED",
            Backend::Postgres | Backend::Sqlite => "INTEGER",
        }
    }

    fn quote_char(self) -> char {
        match self {
            Backend::MySql => '`',
            Backend::Postgres | Backend::Sqlite => '"',
        }
    }

    /// Quote an identifier for embedding in raw SQL
    pub fn quote(self, ident: &str) -> String {
        let q = self.quote_char();
        let escaped = ident.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// `"table"."column"` in this dialect
    pub fn quote_column(self, table: &str, column: &str) -> String {
        format!("{}.{}", self.quote(table), self.quote(column))
    }

    pub(crate) fn build(self, stmt: &SelectStatement) -> (String, Values) {
        match self {
            Backend::Postgres => stmt.build(PostgresQueryBuilder),
            Backend::MySql => stmt.build(MysqlQueryBuilder),
            Backend::Sqlite => stmt.build(SqliteQueryBuilder),
        }
    }

    pub(crate) fn to_sql(self, stmt: &SelectStatement) -> String {
        match self {
            Backend::Postgres => stmt.to_string(PostgresQueryBuilder),
            Backend::MySql => stmt.to_string(MysqlQueryBuilder),
            Backend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_operator() {
        assert_eq!(Backend::Postgres.like_operator(), "ILIKE");
        assert_eq!(Backend::MySql.like_operator(), "LIKE");
        assert_eq!(Backend::Sqlite.like_operator(), "LIKE");
    }

    #[test]
    fn test_quote_column() {
        assert_eq!(Backend::Postgres.quote_column("posts", "id"), "\"posts\".\"id\"");
        assert_eq!(Backend::MySql.quote_column("posts", "id"), "`posts`.`id`");
        assert_eq!(Backend::Sqlite.quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_integer_type() {
        assert_eq!(Backend::MySql.integer_type(), "SIGNED");
        assert_eq!(Backend::Postgres.integer_type(), "INTEGER");
    }
}
