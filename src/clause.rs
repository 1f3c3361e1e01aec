//! Boolean filter expressions over the rows of a table.
//!
//! `And` narrows the index one sub clause at a time. `Or` and `Not` evaluate their sub clauses
//! against the index they were given and merge the results with one co-walk over it, which
//! only works because every sub result keeps the order of its input. The co-walk checks that
//! and reports a broken sub result as [TableError::Internal].
//!
//! `Not` of an atomic filter never reaches the co-walk. It flips the filter's inverse bit and
//! the column evaluates it, so null cells follow the inverse operator rather than set algebra.

use std::borrow::Cow;
use std::fmt;

use tracing::trace;

use crate::column::Column;
use crate::error::{Result, TableError};
use crate::index::{RowIndex, new_mask};
use crate::predicate::{Arg, Comparatee, Operator, Predicate};
use crate::table::Table;

/// Atomic filter: one column, one predicate, one argument.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub predicate: Predicate,
    pub arg: Arg,
    /// Select the rows the predicate rejects. A relation runs as its inverse operator and keeps
    /// that operator's null behavior. Any other predicate is negated, null cells included.
    pub inverse: bool,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: Operator, arg: impl Into<Arg>) -> Self {
        Self::with(column, Predicate::Op(op), arg)
    }

    /// Filter with an operator that takes no argument, such as [Operator::IsNull].
    pub fn unary(column: impl Into<String>, op: Operator) -> Self {
        Self::with(column, Predicate::Op(op), Arg::None)
    }

    /// Filter with a user function or an operator.
    pub fn with(column: impl Into<String>, predicate: Predicate, arg: impl Into<Arg>) -> Self {
        Self {
            column: column.into(),
            predicate,
            arg: arg.into(),
            inverse: false,
        }
    }

    /// Parses `token` as an operator, e.g. `">="` or `"ilike"`.
    pub fn parse(column: impl Into<String>, token: &str, arg: impl Into<Arg>) -> Result<Self> {
        Ok(Self::new(column, token.parse()?, arg))
    }

    pub fn inverse(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    /// Predicate and inverse bit handed to the column.
    fn planned(&self) -> (Cow<'_, Predicate>, bool) {
        match &self.predicate {
            Predicate::Op(op) if self.inverse => match op.inverse() {
                Some(inverse) => (Cow::Owned(Predicate::Op(inverse)), false),
                None => (Cow::Borrowed(&self.predicate), true),
            },
            predicate => (Cow::Borrowed(predicate), self.inverse),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let atom = format!("[{:?}, {:?}, {}]", self.predicate.to_string(), self.column, self.arg);
        if self.inverse {
            write!(f, "[\"not\", {atom}]")
        } else {
            f.write_str(&atom)
        }
    }
}

#[derive(Debug, Clone)]
pub enum Clause {
    Filter(Filter),
    And(Vec<Clause>),
    Or(Vec<Clause>),
    Not(Box<Clause>),
    /// Keeps every row.
    All,
}

impl Clause {
    pub fn and(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Self::And(clauses.into_iter().collect())
    }

    pub fn or(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Self::Or(clauses.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(clause: impl Into<Clause>) -> Self {
        Self::Not(Box::new(clause.into()))
    }

    /// Rows of `index` selected by the clause, in index order.
    pub(crate) fn evaluate(&self, table: &Table, index: &RowIndex) -> Result<RowIndex> {
        match self {
            Self::All => Ok(index.clone()),
            Self::Filter(filter) => apply_filters(table, index, &[filter]),
            Self::And(clauses) => {
                if clauses.is_empty() {
                    return Err(TableError::EmptyClause("and"));
                }
                // every sub clause runs, even on an empty index, so that its errors surface
                let mut current = index.clone();
                for clause in clauses {
                    current = clause.evaluate(table, &current)?;
                }
                Ok(current)
            }
            Self::Or(clauses) => {
                if clauses.is_empty() {
                    return Err(TableError::EmptyClause("or"));
                }
                let mut parts = Vec::new();
                let mut pending: Vec<&Filter> = Vec::new();
                for clause in clauses {
                    if let Self::Filter(filter) = clause {
                        pending.push(filter);
                        continue;
                    }
                    if !pending.is_empty() {
                        parts.push(apply_filters(table, index, &pending)?);
                        pending.clear();
                    }
                    parts.push(clause.evaluate(table, index)?);
                }
                if !pending.is_empty() {
                    parts.push(apply_filters(table, index, &pending)?);
                }
                index.union_of(&parts)
            }
            Self::Not(clause) => match clause.as_ref() {
                Self::Not(inner) => inner.evaluate(table, index),
                Self::Filter(filter) => {
                    let inverted = filter.clone().inverse();
                    apply_filters(table, index, &[&inverted])
                }
                Self::All => Ok(RowIndex::default()),
                other => index.difference(&other.evaluate(table, index)?),
            },
        }
    }
}

impl From<Filter> for Clause {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, clauses: &[Clause]) -> fmt::Result {
            write!(f, "[{name:?}")?;
            for clause in clauses {
                write!(f, ", {clause}")?;
            }
            f.write_str("]")
        }

        match self {
            Self::Filter(filter) => write!(f, "{filter}"),
            Self::And(clauses) => list(f, "and", clauses),
            Self::Or(clauses) => list(f, "or", clauses),
            Self::Not(clause) => write!(f, "[\"not\", {clause}]"),
            Self::All => f.write_str("[]"),
        }
    }
}

/// Resolves a column reference in `arg` against `table`.
fn comparatee<'a>(table: &'a Table, arg: &'a Arg) -> Result<Comparatee<'a>> {
    let resolved = match arg {
        Arg::None => Comparatee::None,
        Arg::Int(i) => Comparatee::Int(*i),
        Arg::Float(x) => Comparatee::Float(*x),
        Arg::Bool(b) => Comparatee::Bool(*b),
        Arg::Str(s) => Comparatee::Str(s),
        Arg::IntSet(v) => Comparatee::IntSet(v),
        Arg::StrSet(v) => Comparatee::StrSet(v),
        Arg::Column(name) => Comparatee::Column(&**table.column(name)?),
    };
    Ok(resolved)
}

/// Runs `filters` over `index` into a single mask and compacts it once. A row is kept when
/// any filter selects it.
///
/// Fails without a result as soon as one filter fails.
pub(crate) fn apply_filters(
    table: &Table,
    index: &RowIndex,
    filters: &[&Filter],
) -> Result<RowIndex> {
    let mut mask = new_mask(index.len());
    for filter in filters {
        let column: &dyn Column = &**table.column(&filter.column)?;
        let arg = comparatee(table, &filter.arg).map_err(|e| e.in_filter(&filter.column))?;
        let (predicate, inverse) = filter.planned();
        column
            .filter(index, &predicate, &arg, inverse, &mut mask)
            .map_err(|e| e.in_filter(&filter.column))?;
    }
    let result = index.compact(&mask);
    trace!(
        filters = filters.len(),
        rows_in = index.len(),
        rows_out = result.len(),
        "filter pass"
    );
    Ok(result)
}
