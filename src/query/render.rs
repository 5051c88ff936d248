//! Rendering of the clause model into SeaQuery statements.

use crate::query::select::{CountLoad, JoinKind, SelectItem, SortDirection, TrashedScope};
use crate::query::{Backend, ColumnRef, Operator, Predicate, Scalar, SelectQuery};
use crate::relation::TableRefs;
use sea_query::{Asterisk, Condition, Expr, ExprTrait, Iden, JoinType, Order, Query, SelectStatement, Value};

/// Table alias of the far table inside a count subquery
const COUNT_RELATED: &str = "counted";
/// Table alias of the pivot/intermediate table inside a count subquery
const COUNT_THROUGH: &str = "counted_through";

/// Runtime identifier (table, alias or column name)
#[derive(Debug, Clone)]
struct Ident(String);

impl Iden for Ident {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

fn ident(name: &str) -> Ident {
    Ident(name.to_string())
}

fn column(column: &ColumnRef) -> Expr {
    Expr::col((ident(&column.table), ident(&column.column)))
}

fn pattern(value: &Scalar) -> String {
    match value {
        Scalar::Text(text) => text.clone(),
        other => other.to_string(),
    }
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
            JoinKind::Right => JoinType::RightJoin,
        }
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// Rewrite `?` placeholders of a raw fragment into the backend's style.
///
/// PostgreSQL custom expressions bind `$1..$n`, numbered per fragment. A `?`
/// inside a quoted literal or identifier is left alone.
fn placeholders(sql: &str, backend: Backend) -> String {
    if backend != Backend::Postgres {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len() + 4);
    let mut quote: Option<char> = None;
    let mut index = 0usize;
    for c in sql.chars() {
        match (quote, c) {
            (Some(open), _) if c == open => quote = None,
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '?') => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
                continue;
            }
            _ => {}
        }
        out.push(c);
    }
    out
}

impl Predicate {
    pub(crate) fn to_condition(&self, backend: Backend) -> Condition {
        let expr = match self {
            Predicate::Group { any, predicates } => {
                let group = if *any { Condition::any() } else { Condition::all() };
                return predicates
                    .iter()
                    .fold(group, |cond, predicate| cond.add(predicate.to_condition(backend)));
            }
            Predicate::Compare {
                column: col,
                operator,
                value,
            } => {
                let col = column(col);
                let v: Value = value.clone().into();
                match operator {
                    Operator::Eq => col.eq(v),
                    Operator::Ne => col.ne(v),
                    Operator::Lt => col.lt(v),
                    Operator::Lte => col.lte(v),
                    Operator::Gt => col.gt(v),
                    Operator::Gte => col.gte(v),
                    Operator::Like => col.like(pattern(value)),
                    Operator::NotLike => col.not_like(pattern(value)),
                }
            }
            Predicate::Columns { left, right } => {
                column(left).equals((ident(&right.table), ident(&right.column)))
            }
            Predicate::In { column: col, values } => {
                column(col).is_in(values.iter().cloned().map(Value::from))
            }
            Predicate::Null {
                column: col,
                negated: true,
            } => column(col).is_not_null(),
            Predicate::Null { column: col, .. } => column(col).is_null(),
            Predicate::Between {
                column: col,
                low,
                high,
            } => column(col).between(Value::from(low.clone()), Value::from(high.clone())),
            Predicate::Raw { sql, values } => {
                Expr::cust_with_values(placeholders(sql, backend), values.iter().cloned().map(Value::from))
            }
        };
        Condition::all().add(expr)
    }
}

/// `CAST((SELECT COUNT(*) ...) AS <int>)` correlated with the outer parent
fn count_expression(load: &CountLoad, backend: Backend) -> String {
    let descriptor = &load.descriptor;
    let refs = TableRefs {
        parent: load.parent.clone(),
        through: descriptor.through_table.as_ref().map(|_| COUNT_THROUGH.to_string()),
        related: COUNT_RELATED.to_string(),
    };

    let mut sub = Query::select();
    sub.expr(Expr::cust("COUNT(*)"));

    let mut cond = Condition::all();
    for (idx, step) in descriptor.steps.iter().enumerate() {
        let reference = refs.resolve(step.side);
        let mut on = Condition::all();
        for pair in &step.on {
            on = on.add(pair.to_predicate(&refs).to_condition(backend));
        }
        if let Some(deleted_at) = &step.soft_delete {
            on = on.add(column(&ColumnRef::new(reference, deleted_at.clone())).is_null());
        }
        if idx == 0 {
            // first step correlates with the outer query
            sub.from_as(ident(&step.table), ident(reference));
            cond = cond.add(on);
        } else {
            sub.join_as(JoinType::InnerJoin, ident(&step.table), ident(reference), on);
        }
    }
    for predicate in descriptor.constraint_predicates(&refs) {
        cond = cond.add(predicate.to_condition(backend));
    }
    sub.cond_where(cond);

    format!("CAST(({}) AS {})", backend.to_sql(&sub), backend.integer_type())
}

impl SelectQuery {
    /// Assemble the SeaQuery statement
    pub fn to_statement(&self, backend: Backend) -> SelectStatement {
        let mut stmt = Query::select();

        match self.columns() {
            None => {
                stmt.column(Asterisk);
            }
            Some(items) => {
                for item in items {
                    match item {
                        SelectItem::AllColumns(table) => {
                            stmt.column((ident(table), Asterisk));
                        }
                        SelectItem::Column(col) => {
                            stmt.column((ident(&col.table), ident(&col.column)));
                        }
                        SelectItem::Expr { sql, alias } => {
                            stmt.expr_as(Expr::cust(sql.clone()), ident(alias));
                        }
                    }
                }
            }
        }
        for load in self.counts() {
            stmt.expr_as(Expr::cust(count_expression(load, backend)), ident(&load.alias()));
        }

        stmt.from(ident(self.table()));

        for join in self.joins() {
            let cond = join
                .on
                .iter()
                .chain(join.conditions.iter())
                .fold(Condition::all(), |cond, predicate| cond.add(predicate.to_condition(backend)));
            match &join.alias {
                Some(alias) => {
                    stmt.join_as(join.kind.into(), ident(&join.table), ident(alias), cond);
                }
                None => {
                    stmt.join(join.kind.into(), ident(&join.table), cond);
                }
            }
        }

        if let Some(deleted_at) = self.soft_delete_column() {
            let col = column(&ColumnRef::new(self.table(), deleted_at));
            match self.trashed() {
                TrashedScope::Without => {
                    stmt.cond_where(Condition::all().add(col.is_null()));
                }
                TrashedScope::Only => {
                    stmt.cond_where(Condition::all().add(col.is_not_null()));
                }
                TrashedScope::With => {}
            }
        }
        for predicate in self.wheres() {
            stmt.cond_where(predicate.to_condition(backend));
        }
        for group in self.groups() {
            stmt.group_by_col((ident(&group.table), ident(&group.column)));
        }
        for order in self.orders() {
            stmt.order_by((ident(&order.column.table), ident(&order.column.column)), order.direction.into());
        }
        if let Some(limit) = self.limit_value() {
            stmt.limit(limit);
        }
        if let Some(offset) = self.offset_value() {
            stmt.offset(offset);
        }
        stmt
    }
}
