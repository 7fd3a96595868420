//! Query values
//!
//! A [`Query`] is an immutable description of what to fetch from one
//! collection: an ordered list of filter predicates (logical AND), an
//! ordered list of sort keys, and an optional result limit. Every builder
//! method borrows the query and returns a new one, so a partially built
//! query can be shared and extended in several directions:
//!
//! ```ignore
//! let base = Query::new("diary").filter("mood", Operator::Eq, "good");
//! let newest = base.order_by("createdOn", Direction::Desc).limit(5);
//! let oldest = base.order_by("createdOn", Direction::Asc).limit(5);
//! ```
//!
//! Evaluation lives in [`eval`]; it is a pure function of the query and a
//! collection snapshot.

pub mod eval;

use std::fmt;
use std::str::FromStr;

use fieldbook_core::{Error, Result, Value};

pub use eval::{count, evaluate};

/// Comparison operator of a filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `array-contains`
    ArrayContains,
}

impl Operator {
    /// All operators, in documentation order
    pub const ALL: [Operator; 7] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
        Operator::ArrayContains,
    ];

    /// Wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::ArrayContains => "array-contains",
        }
    }

    /// True for `>`, `<`, `>=`, `<=`
    pub fn is_range(&self) -> bool {
        matches!(self, Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                Error::validation(format!(
                    "unsupported operator '{}'; expected one of ==, !=, >, <, >=, <=, array-contains",
                    s
                ))
            })
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Ascending (default)
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(Error::validation(format!(
                "unsupported sort direction '{}'; expected asc or desc",
                other
            ))),
        }
    }
}

/// One `(field, operator, value)` filter
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Dotted field path
    pub field: String,
    /// Comparison operator
    pub op: Operator,
    /// Right-hand operand
    pub value: Value,
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Dotted field path
    pub field: String,
    /// Direction
    pub direction: Direction,
}

/// Immutable query over a single collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: String,
    predicates: Vec<Predicate>,
    order: Vec<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    /// Query returning the whole collection in stored order
    pub fn new(collection: impl Into<String>) -> Self {
        Query {
            collection: collection.into(),
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Target collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Filter predicates, in application order
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Sort keys, most significant first
    pub fn order(&self) -> &[OrderBy] {
        &self.order
    }

    /// Result cap, if any
    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Add a filter predicate
    pub fn filter(&self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Query {
        let mut next = self.clone();
        next.predicates.push(Predicate {
            field: field.into(),
            op,
            value: value.into(),
        });
        next
    }

    /// Add a filter predicate with the operator given in its wire spelling
    ///
    /// # Errors
    ///
    /// `Error::Validation` for an unsupported operator string.
    pub fn filter_op(
        &self,
        field: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<Query> {
        Ok(self.filter(field, op.parse()?, value))
    }

    /// Append a sort key
    ///
    /// Later keys break ties left by earlier ones.
    pub fn order_by(&self, field: impl Into<String>, direction: Direction) -> Query {
        let mut next = self.clone();
        next.order.push(OrderBy {
            field: field.into(),
            direction,
        });
        next
    }

    /// Cap the number of results; a later call replaces an earlier one
    pub fn limit(&self, n: usize) -> Query {
        let mut next = self.clone();
        next.limit = Some(n);
        next
    }

    /// Check field paths before evaluation
    ///
    /// # Errors
    ///
    /// `Error::Validation` for empty paths or paths with empty segments.
    pub fn validate(&self) -> Result<()> {
        let fields = self
            .predicates
            .iter()
            .map(|p| p.field.as_str())
            .chain(self.order.iter().map(|o| o.field.as_str()));
        for field in fields {
            if field.is_empty() || field.split('.').any(str::is_empty) {
                return Err(Error::validation(format!("invalid field path '{}'", field)));
            }
        }
        Ok(())
    }
}
