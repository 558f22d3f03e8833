//! Predicate evaluation for in-memory record filtering.
//!
//! This module provides the evaluation engine for query predicates and the total order used
//! to sort records, both working directly on BSON documents.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime};

use kiln_core::{
    error::{BackendError, BackendResult},
    query::{Operator, Predicate, QueryVisitor},
};

/// Comparable representation of BSON values.
///
/// Integers compare exactly as `i64`; an integer and a `Double` compare by numeric value.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value, also used for missing fields and non comparable types
    Null,
    /// Integer value (`Int32` and `Int64`)
    Int(i64),
    /// Floating point value
    Number(f64),
    /// String value
    String(&'a str),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Boolean value
    Bool(bool),
    /// DateTime value
    DateTime(DateTime),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl Comparable<'_> {
    /// Position of the value's type in the sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Int(_) | Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Bool(_) => 5,
            Comparable::DateTime(_) => 6,
        }
    }

    /// Total order across all values: by type first, then by value.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Int(a), Comparable::Int(b)) => a.cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => cmp_float(*a, *b),
            // NaN sorts after every other number
            (Comparable::Int(a), Comparable::Number(b)) => {
                cmp_int_float(*a, *b).unwrap_or(Ordering::Less)
            }
            (Comparable::Number(a), Comparable::Int(b)) => {
                cmp_int_float(*b, *a).map_or(Ordering::Greater, Ordering::reverse)
            }
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::Int(a), Comparable::Number(b)) | (Comparable::Number(b), Comparable::Int(a)) => {
                cmp_int_float(*a, *b).is_some_and(Ordering::is_eq)
            }
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Number(b)) => cmp_int_float(*a, *b),
            (Comparable::Number(a), Comparable::Int(b)) => cmp_int_float(*b, *a).map(Ordering::reverse),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares an integer with a float without rounding the integer. `None` if `float` is NaN.
fn cmp_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63, the first float above every i64
    const I64_END: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    if float >= I64_END {
        return Some(Ordering::Less);
    }
    if float < -I64_END {
        return Some(Ordering::Greater);
    }

    // |whole| < 2^63, so the cast is exact
    let whole = float.trunc();
    let fraction = 0.0_f64.partial_cmp(&(float - whole))?;

    Some(int.cmp(&(whole as i64)).then(fraction))
}

/// Orders floats with every NaN after all other numbers and both zeros equal.
fn cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Resolves a dotted field path inside a document.
pub(crate) fn lookup<'d>(document: &'d Document, path: &str) -> Option<&'d Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Sets the value at a dotted field path, creating intermediate documents as needed.
pub(crate) fn assign(document: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(document.get(head), Some(Bson::Document(_))) {
                document.insert(head, Document::new());
            }
            if let Some(Bson::Document(child)) = document.get_mut(head) {
                assign(child, rest, value);
            }
        }
    }
}

/// Evaluates query predicates against one document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn matches(&mut self, filters: &[Predicate]) -> BackendResult<bool> {
        self.visit_conjunction(filters)
    }
}

fn require_array<'v>(operator: Operator, value: &'v Bson) -> BackendResult<&'v Vec<Bson>> {
    value
        .as_array()
        .ok_or_else(|| BackendError::Internal(format!("{operator} operator requires an array value")))
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = BackendError;

    fn visit_conjunction(&mut self, filters: &[Predicate]) -> Result<Self::Output, Self::Error> {
        for predicate in filters {
            if !self.visit_predicate(&predicate.field, predicate.operator, &predicate.value)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_predicate(&mut self, field: &str, operator: Operator, value: &Bson) -> Result<Self::Output, Self::Error> {
        // Records without the field never match, whatever the operator.
        let Some(field_value) = lookup(self.document, field) else {
            return match operator {
                Operator::In | Operator::NotIn | Operator::ArrayContainsAny => {
                    require_array(operator, value).map(|_| false)
                }
                _ => Ok(false),
            };
        };
        let left = Comparable::from(field_value);

        match operator {
            Operator::Equal => Ok(left == Comparable::from(value)),
            Operator::NotEqual => Ok(left != Comparable::from(value)),
            Operator::LessThan
            | Operator::LessThanOrEqual
            | Operator::GreaterThan
            | Operator::GreaterThanOrEqual => Ok(match left.partial_cmp(&Comparable::from(value)) {
                Some(ordering) => match operator {
                    Operator::LessThan => ordering.is_lt(),
                    Operator::LessThanOrEqual => ordering.is_le(),
                    Operator::GreaterThan => ordering.is_gt(),
                    _ => ordering.is_ge(),
                },
                None => false,
            }),
            Operator::ArrayContains => Ok(match left {
                Comparable::Array(items) => items.contains(&Comparable::from(value)),
                _ => false,
            }),
            Operator::ArrayContainsAny => {
                let candidates = require_array(operator, value)?;
                Ok(match left {
                    Comparable::Array(items) => candidates
                        .iter()
                        .any(|candidate| items.contains(&Comparable::from(candidate))),
                    _ => false,
                })
            }
            Operator::In => Ok(require_array(operator, value)?
                .iter()
                .any(|candidate| left == Comparable::from(candidate))),
            Operator::NotIn => Ok(!require_array(operator, value)?
                .iter()
                .any(|candidate| left == Comparable::from(candidate))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use kiln_core::query::Filter;

    fn book() -> Document {
        doc! {
            "name": "Galaxy",
            "pages": 100_i64,
            "rating": 4.5,
            "hardcover": false,
            "tags": ["sci-fi", "comedy"],
            "meta": { "isbn": "0-345-39180-2" },
        }
    }

    fn check(predicate: Predicate) -> bool {
        DocumentEvaluator::new(&book()).matches(&[predicate]).unwrap()
    }

    #[test]
    fn comparisons() {
        assert!(check(Filter::eq("name", "Galaxy")));
        assert!(check(Filter::eq("pages", 100)));
        assert!(check(Filter::ne("name", "Restaurant")));
        assert!(check(Filter::lt("rating", 5)));
        assert!(check(Filter::lte("pages", 100)));
        assert!(check(Filter::gt("pages", 99.5)));
        assert!(check(Filter::gte("name", "Galaxy")));
        assert!(!check(Filter::gt("name", 1)));
    }

    #[test]
    fn array_operators() {
        assert!(check(Filter::array_contains("tags", "comedy")));
        assert!(!check(Filter::array_contains("tags", "drama")));
        assert!(check(Filter::array_contains_any("tags", vec!["drama", "sci-fi"])));
        assert!(!check(Filter::array_contains_any("tags", vec!["drama"])));
        assert!(!check(Filter::array_contains("name", "Galaxy")));
    }

    #[test]
    fn membership_operators() {
        assert!(check(Filter::is_in("pages", vec![10, 100])));
        assert!(!check(Filter::is_in("pages", vec![10])));
        assert!(check(Filter::not_in("name", vec!["Restaurant"])));
        assert!(!check(Filter::not_in("hardcover", vec![false])));
    }

    #[test]
    fn membership_requires_array_values() {
        let result = DocumentEvaluator::new(&book()).matches(&[Filter::is_in("pages", 100)]);
        assert!(matches!(result, Err(BackendError::Internal(_))));
    }

    #[test]
    fn missing_fields_never_match() {
        assert!(!check(Filter::ne("author", "anyone")));
        assert!(!check(Filter::not_in("author", vec!["anyone"])));
    }

    #[test]
    fn nested_paths() {
        assert!(check(Filter::eq("meta.isbn", "0-345-39180-2")));
        assert!(!check(Filter::eq("meta.isbn.raw", "x")));
    }

    #[test]
    fn predicates_are_conjunctive() {
        let book = book();
        let mut evaluator = DocumentEvaluator::new(&book);

        assert!(evaluator.matches(&[Filter::eq("name", "Galaxy"), Filter::gt("pages", 1)]).unwrap());
        assert!(!evaluator.matches(&[Filter::eq("name", "Galaxy"), Filter::gt("pages", 1000)]).unwrap());
        assert!(evaluator.matches(&[]).unwrap());
    }

    #[test]
    fn assign_creates_nested_documents() {
        let mut document = doc! { "meta": "flat" };
        assign(&mut document, "meta.isbn", Bson::from("x"));
        assign(&mut document, "name", Bson::from("Galaxy"));

        assert_eq!(document, doc! { "meta": { "isbn": "x" }, "name": "Galaxy" });
    }

    #[test]
    fn total_order_ranks_types() {
        let null = Bson::Null;
        let number = Bson::Int64(3);
        let string = Bson::from("a");

        assert!(Comparable::from(&null).total_cmp(&Comparable::from(&number)).is_lt());
        assert!(Comparable::from(&number).total_cmp(&Comparable::from(&string)).is_lt());
        assert!(Comparable::from(&string).total_cmp(&Comparable::from(&string)).is_eq());
    }

    #[test]
    fn large_integers_compare_exactly() {
        let document = doc! { "n": 9_007_199_254_740_992_i64 };
        let mut evaluator = DocumentEvaluator::new(&document);

        assert!(!evaluator.matches(&[Filter::eq("n", 9_007_199_254_740_993_i64)]).unwrap());
        assert!(evaluator.matches(&[Filter::lt("n", 9_007_199_254_740_993_i64)]).unwrap());
        assert!(evaluator.matches(&[Filter::eq("n", 9_007_199_254_740_992.0)]).unwrap());

        let (low, high) = (Bson::Int64(i64::MAX - 1), Bson::Int64(i64::MAX));
        assert!(Comparable::from(&low).total_cmp(&Comparable::from(&high)).is_lt());
    }

    #[test]
    fn mixed_integers_and_floats() {
        let (three, three_f, half) = (Bson::Int32(3), Bson::Double(3.0), Bson::Double(3.5));
        let nan = Bson::Double(f64::NAN);

        assert_eq!(Comparable::from(&three), Comparable::from(&three_f));
        assert!(Comparable::from(&three) < Comparable::from(&half));
        assert!(Comparable::from(&half).total_cmp(&Comparable::from(&three)).is_gt());
        assert!(Comparable::from(&three).partial_cmp(&Comparable::from(&nan)).is_none());
        assert!(Comparable::from(&nan).total_cmp(&Comparable::from(&three)).is_gt());
    }
}
