use crate::index::ranges::TileRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the children of a boolean query combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    /// Every child must match.
    And,
    /// At least one child must match.
    Or,
}

/// Query handed to the search backend.
///
/// Tiles never touch the index directly; they are expressed as term, prefix
/// or numeric range lookups, composed with boolean operators. The enum
/// serializes as internally tagged JSON so a backend adapter can consume it
/// as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// Exact term match.
    Term { field: String, value: String },

    /// Any term starting with `value`.
    Prefix { field: String, value: String },

    /// Numeric values in the half-open interval `[start, stop)`.
    Range {
        field: String,
        start: u64,
        stop: u64,
    },

    /// Boolean composition of other queries.
    Boolean { op: BooleanOp, children: Vec<Query> },
}

impl Query {
    /// Create a term query
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a prefix query
    pub fn prefix(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Prefix {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a range query over an ordinal interval
    pub fn range(field: impl Into<String>, range: TileRange) -> Self {
        Query::Range {
            field: field.into(),
            start: range.start,
            stop: range.stop,
        }
    }

    /// Disjunction of the given queries.
    ///
    /// A single child is returned unwrapped. No children gives an empty
    /// disjunction, which matches nothing.
    pub fn any(children: impl IntoIterator<Item = Query>) -> Self {
        Self::boolean(BooleanOp::Or, children)
    }

    /// Conjunction of the given queries, unwrapping a single child.
    pub fn all(children: impl IntoIterator<Item = Query>) -> Self {
        Self::boolean(BooleanOp::And, children)
    }

    fn boolean(op: BooleanOp, children: impl IntoIterator<Item = Query>) -> Self {
        let mut children: Vec<Query> = children.into_iter().collect();
        if children.len() == 1 {
            return children.remove(0);
        }
        Query::Boolean { op, children }
    }

    /// Number of leaf clauses the backend has to evaluate.
    pub fn clause_count(&self) -> usize {
        match self {
            Query::Boolean { children, .. } => children.iter().map(Query::clause_count).sum(),
            _ => 1,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term { field, value } => write!(f, "{field}:{value}"),
            Query::Prefix { field, value } => write!(f, "{field}:{value}*"),
            Query::Range { field, start, stop } => write!(f, "{field}:[{start} TO {stop}}}"),
            Query::Boolean { op, children } => {
                let sep = match op {
                    BooleanOp::And => " AND ",
                    BooleanOp::Or => " OR ",
                };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}
