//! Clause model for the accumulated query.
//!
//! Predicates are kept as plain data so the traversal scopes can inspect what a
//! query already contains before adding to it. They are turned into SeaQuery
//! conditions only when the query is rendered.

use serde_json::Value as JsonValue;
use std::fmt;

/// Scalar operand of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Convert a JSON scalar; arrays, objects and `null` yield `None`.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Bool(b) => Some(Scalar::Bool(*b)),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_u64().map(Scalar::UInt))
                .or_else(|| n.as_f64().map(Scalar::Float)),
            JsonValue::String(s) => Some(Scalar::Text(s.clone())),
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::UInt(u) => write!(f, "{u}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::Int(i64::from(i))
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<u64> for Scalar {
    fn from(u: u64) -> Self {
        i64::try_from(u).map_or(Scalar::UInt(u), Scalar::Int)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<Scalar> for sea_query::Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Bool(b) => b.into(),
            Scalar::Int(i) => i.into(),
            Scalar::UInt(u) => u.into(),
            Scalar::Float(x) => x.into(),
            Scalar::Text(s) => s.into(),
        }
    }
}

/// Comparison operator of a basic predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl Operator {
    pub fn parse(op: &str) -> Option<Self> {
        let op = match op.trim().to_ascii_uppercase().as_str() {
            "=" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

/// Table-qualified column; `table` is a table name or a join alias
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Parse `table.column`; a bare column is qualified with `default_table`.
    pub fn parse(path: &str, default_table: &str) -> Self {
        match path.rsplit_once('.') {
            Some((table, column)) => Self::new(table, column),
            None => Self::new(default_table, path),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// A WHERE predicate or an extra condition on a JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: ColumnRef,
        operator: Operator,
        value: Scalar,
    },
    /// Column-to-column equality, as used in JOIN ... ON
    Columns { left: ColumnRef, right: ColumnRef },
    In { column: ColumnRef, values: Vec<Scalar> },
    Null { column: ColumnRef, negated: bool },
    Between {
        column: ColumnRef,
        low: Scalar,
        high: Scalar,
    },
    /// Raw SQL with `?` placeholders bound to `values`
    Raw { sql: String, values: Vec<Scalar> },
    /// Nested boolean group (`AND` unless `any`)
    Group { any: bool, predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn eq(column: ColumnRef, value: impl Into<Scalar>) -> Self {
        Predicate::Compare {
            column,
            operator: Operator::Eq,
            value: value.into(),
        }
    }

    pub fn is_null(column: ColumnRef) -> Self {
        Predicate::Null {
            column,
            negated: false,
        }
    }

    pub fn is_not_null(column: ColumnRef) -> Self {
        Predicate::Null {
            column,
            negated: true,
        }
    }

    /// Column the predicate tests, if it tests exactly one
    pub fn column(&self) -> Option<&ColumnRef> {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::In { column, .. }
            | Predicate::Null { column, .. }
            | Predicate::Between { column, .. } => Some(column),
            Predicate::Columns { .. } | Predicate::Raw { .. } | Predicate::Group { .. } => None,
        }
    }
}
