//! Query evaluation
//!
//! Three stages over an owned collection snapshot:
//!
//! 1. **Filter**: predicates in order, all must hold. A document missing the
//!    field never matches, whatever the operator.
//! 2. **Sort**: stable sort by each key in turn. `Desc` reverses the
//!    comparator, so equal keys keep stored order in both directions.
//!    Documents missing a sort field are dropped.
//! 3. **Limit**: truncate after sorting; without sort keys the stored
//!    (insertion) order decides which documents survive.
//!
//! Range operators and sort keys require operands of one ordered kind
//! (numbers, strings, timestamps, booleans); anything else is
//! `Error::TypeMismatch`. `array-contains` requires an array field.

use std::borrow::Cow;
use std::cmp::Ordering;

use fieldbook_core::{Document, Error, Result, Value};
use tracing::trace;

use super::{Direction, Operator, OrderBy, Predicate, Query};

/// Evaluate `query` against `documents` (stored order)
///
/// Returns the surviving documents. The input is consumed, so results are
/// never aliases of the caller's snapshot.
pub fn evaluate(query: &Query, documents: Vec<Document>) -> Result<Vec<Document>> {
    query.validate()?;
    let scanned = documents.len();

    let mut survivors = Vec::with_capacity(documents.len());
    for doc in documents {
        if matches_all(&doc, query.predicates())? {
            survivors.push(doc);
        }
    }

    if !query.order().is_empty() {
        survivors = sort(survivors, query.order())?;
    }

    if let Some(n) = query.max_results() {
        survivors.truncate(n);
    }

    trace!(
        target: "fieldbook::query",
        collection = query.collection(),
        scanned,
        returned = survivors.len(),
        "query evaluated"
    );
    Ok(survivors)
}

/// Number of documents `query` would return
pub fn count(query: &Query, documents: Vec<Document>) -> Result<usize> {
    evaluate(query, documents).map(|docs| docs.len())
}

fn matches_all(doc: &Document, predicates: &[Predicate]) -> Result<bool> {
    for predicate in predicates {
        if !predicate.matches(doc)? {
            return Ok(false);
        }
    }
    Ok(true)
}

impl Predicate {
    /// Test one document
    ///
    /// # Errors
    ///
    /// `Error::TypeMismatch` when a range operator meets operands of
    /// different or unordered kinds, or `array-contains` meets a non-array.
    pub fn matches(&self, doc: &Document) -> Result<bool> {
        let Some(actual) = doc.resolve(&self.field) else {
            return Ok(false);
        };
        let actual = actual.as_ref();

        match self.op {
            Operator::Eq => Ok(actual == &self.value),
            Operator::Ne => Ok(actual != &self.value),
            Operator::ArrayContains => match actual {
                Value::Array(items) => Ok(items.contains(&self.value)),
                other => Err(Error::TypeMismatch {
                    field: self.field.clone(),
                    left: other.type_name(),
                    right: "Array",
                }),
            },
            Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le => {
                if !actual.is_comparable_with(&self.value) {
                    return Err(Error::TypeMismatch {
                        field: self.field.clone(),
                        left: actual.type_name(),
                        right: self.value.type_name(),
                    });
                }
                // NaN has no ordering and satisfies no range
                Ok(actual
                    .compare(&self.value)
                    .is_some_and(|ord| range_accepts(self.op, ord)))
            }
        }
    }
}

fn range_accepts(op: Operator, ord: Ordering) -> bool {
    match op {
        Operator::Gt => ord == Ordering::Greater,
        Operator::Lt => ord == Ordering::Less,
        Operator::Ge => ord != Ordering::Less,
        Operator::Le => ord != Ordering::Greater,
        _ => false,
    }
}

fn sort(documents: Vec<Document>, order: &[OrderBy]) -> Result<Vec<Document>> {
    let mut keyed: Vec<(Vec<Value>, Document)> = documents
        .into_iter()
        .filter_map(|doc| {
            let keys: Option<Vec<Value>> = order
                .iter()
                .map(|key| doc.resolve(&key.field).map(Cow::into_owned))
                .collect();
            keys.map(|keys| (keys, doc))
        })
        .collect();

    for (column, key) in order.iter().enumerate() {
        check_sort_column(&keyed, column, &key.field)?;
    }

    // Vec::sort_by is stable
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, order));
    Ok(keyed.into_iter().map(|(_, doc)| doc).collect())
}

fn check_sort_column(keyed: &[(Vec<Value>, Document)], column: usize, field: &str) -> Result<()> {
    let mut first: Option<&Value> = None;
    for (keys, _) in keyed {
        let value = &keys[column];
        let mismatch = match first {
            None => !value.kind().is_ordered(),
            Some(seen) => !seen.is_comparable_with(value),
        };
        if mismatch {
            return Err(Error::TypeMismatch {
                field: field.to_string(),
                left: first.unwrap_or(value).type_name(),
                right: value.type_name(),
            });
        }
        first.get_or_insert(value);
    }
    Ok(())
}

fn compare_keys(a: &[Value], b: &[Value], order: &[OrderBy]) -> Ordering {
    for ((left, right), key) in a.iter().zip(b).zip(order) {
        let ord = left.compare(right).unwrap_or(Ordering::Equal);
        let ord = match key.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
