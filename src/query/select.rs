//! Select query builder.
//!
//! `SelectQuery` accumulates clauses as data so traversal scopes can inspect
//! what is already present (joins, wheres, orders) before adding to it. It is
//! turned into a SeaQuery `SelectStatement` only when rendered.
//!
//! Builder methods take `self` by value for chaining; the `add_*` methods do
//! the same work through `&mut self`.
//!
//! # Example
//!
//! ```
//! use traversify::query::{Backend, ColumnRef, Predicate, SelectQuery, SortDirection};
//!
//! let query = SelectQuery::new("posts")
//!     .filter(Predicate::eq(ColumnRef::new("posts", "status"), "draft"))
//!     .order_by(ColumnRef::new("posts", "title"), SortDirection::Asc)
//!     .limit(10);
//!
//! let sql = query.to_sql(Backend::Postgres);
//! assert!(sql.starts_with("SELECT * FROM \"posts\""));
//! ```

use crate::model::ModelDef;
use crate::query::{Backend, ColumnRef, Predicate};
use crate::relation::RelationDescriptor;
use sea_query::Values;

/// One entry of the select list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// `"table".*`
    AllColumns(String),
    Column(ColumnRef),
    /// Raw expression with an output alias
    Expr { sql: String, alias: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

/// A join with its ON predicates and any extra conditions
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub on: Vec<Predicate>,
    pub conditions: Vec<Predicate>,
}

impl JoinClause {
    pub fn left(table: impl Into<String>) -> Self {
        Self {
            kind: JoinKind::Left,
            table: table.into(),
            alias: None,
            on: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn on(mut self, predicate: Predicate) -> Self {
        self.on.push(predicate);
        self
    }

    /// Name the rest of the query uses for this table
    pub fn table_or_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    pub fn has_condition(&self, predicate: &Predicate) -> bool {
        self.on.contains(predicate) || self.conditions.contains(predicate)
    }

    /// Add an extra condition unless the clause already carries it
    pub fn add_condition(&mut self, predicate: Predicate) -> bool {
        if self.has_condition(&predicate) {
            return false;
        }
        self.conditions.push(predicate);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive `asc` / `desc`
    pub fn parse(direction: &str) -> Option<Self> {
        if direction.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if direction.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// Soft-delete visibility of the root table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrashedScope {
    /// Soft-deleted rows are excluded
    #[default]
    Without,
    /// Soft-deleted rows are included
    With,
    /// Only soft-deleted rows
    Only,
}

/// A count-aggregate load of one relation
#[derive(Debug, Clone, PartialEq)]
pub struct CountLoad {
    pub relation: String,
    pub descriptor: RelationDescriptor,
    /// Table-or-alias of the parent in the outer query
    pub parent: String,
}

impl CountLoad {
    pub fn alias(&self) -> String {
        format!("{}_count", self.relation)
    }
}

/// Query builder for selecting rows of one root table
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    soft_delete: Option<String>,
    trashed: TrashedScope,
    columns: Option<Vec<SelectItem>>,
    joins: Vec<JoinClause>,
    wheres: Vec<Predicate>,
    orders: Vec<OrderClause>,
    groups: Vec<ColumnRef>,
    eager: Vec<String>,
    counts: Vec<CountLoad>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectQuery {
    /// Create a new select over `table`. No columns means `SELECT *`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            soft_delete: None,
            trashed: TrashedScope::default(),
            columns: None,
            joins: Vec::new(),
            wheres: Vec::new(),
            orders: Vec::new(),
            groups: Vec::new(),
            eager: Vec::new(),
            counts: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Select over a model's table, honoring its soft-delete column
    pub fn for_model(model: &ModelDef) -> Self {
        let mut query = Self::new(model.table());
        query.soft_delete = model.deleted_at_column().map(str::to_string);
        query
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn soft_delete_column(&self) -> Option<&str> {
        self.soft_delete.as_deref()
    }

    pub fn select(mut self, item: SelectItem) -> Self {
        self.add_select(item);
        self
    }

    pub fn add_select(&mut self, item: SelectItem) -> &mut Self {
        self.columns.get_or_insert_with(Vec::new).push(item);
        self
    }

    /// Explicit select list; `None` when nothing was selected
    pub fn columns(&self) -> Option<&[SelectItem]> {
        self.columns.as_deref()
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.add_join(join);
        self
    }

    pub fn add_join(&mut self, join: JoinClause) -> &mut Self {
        self.joins.push(join);
        self
    }

    /// `LEFT JOIN table ON left = right`
    pub fn left_join(self, table: impl Into<String>, left: ColumnRef, right: ColumnRef) -> Self {
        self.join(JoinClause::left(table).on(Predicate::Columns { left, right }))
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.add_where(predicate);
        self
    }

    pub fn add_where(&mut self, predicate: Predicate) -> &mut Self {
        self.wheres.push(predicate);
        self
    }

    pub fn wheres(&self) -> &[Predicate] {
        &self.wheres
    }

    pub fn has_where(&self, predicate: &Predicate) -> bool {
        self.wheres.contains(predicate)
    }

    pub fn order_by(mut self, column: ColumnRef, direction: SortDirection) -> Self {
        self.add_order(column, direction);
        self
    }

    pub fn add_order(&mut self, column: ColumnRef, direction: SortDirection) -> &mut Self {
        self.orders.push(OrderClause { column, direction });
        self
    }

    pub fn orders(&self) -> &[OrderClause] {
        &self.orders
    }

    pub fn group_by(mut self, column: ColumnRef) -> Self {
        self.groups.push(column);
        self
    }

    pub fn groups(&self) -> &[ColumnRef] {
        &self.groups
    }

    /// Eager-load relations; names already requested are not repeated
    pub fn with<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_with(relations);
        self
    }

    pub fn add_with<I, S>(&mut self, relations: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for relation in relations {
            let relation = relation.into();
            if !self.eager.contains(&relation) {
                self.eager.push(relation);
            }
        }
        self
    }

    pub fn eager_loads(&self) -> &[String] {
        &self.eager
    }

    /// Add a count-aggregate load; a relation already counted is kept as is
    pub fn add_count(&mut self, load: CountLoad) -> &mut Self {
        if !self.counts.iter().any(|c| c.relation == load.relation) {
            self.counts.push(load);
        }
        self
    }

    pub fn counts(&self) -> &[CountLoad] {
        &self.counts
    }

    pub fn only_trashed(mut self) -> Self {
        self.trashed = TrashedScope::Only;
        self
    }

    pub fn with_trashed(mut self) -> Self {
        self.trashed = TrashedScope::With;
        self
    }

    pub fn set_trashed(&mut self, scope: TrashedScope) -> &mut Self {
        self.trashed = scope;
        self
    }

    pub fn trashed(&self) -> TrashedScope {
        self.trashed
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Whether `table` is joined, under its own name or an alias
    pub fn has_joined_table(&self, table: &str) -> bool {
        self.joins.iter().any(|join| join.table == table)
    }

    /// Whether `name` already names a table or alias in the query
    pub fn is_reference_taken(&self, name: &str) -> bool {
        self.table == name
            || self
                .joins
                .iter()
                .any(|join| join.table == name || join.alias.as_deref() == Some(name))
    }

    /// Parameterized SQL for `backend`
    pub fn build(&self, backend: Backend) -> (String, Values) {
        backend.build(&self.to_statement(backend))
    }

    /// SQL with values inlined
    pub fn to_sql(&self, backend: Backend) -> String {
        backend.to_sql(&self.to_statement(backend))
    }
}
