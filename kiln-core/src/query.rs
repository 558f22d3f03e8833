//! Criteria and query construction for record stores.
//!
//! Callers describe a query with a [`Criteria`]: the collection, a list of predicates that are
//! all required to match, an optional order-by field and a limit. The
//! [`QueryExecutor`](crate::executor::QueryExecutor) shapes a criteria into a backend
//! [`Query`] and streams the results back.
//!
//! ```ignore
//! use kiln::query::{Criteria, Filter};
//!
//! let criteria = Criteria::builder("books")
//!     .filter(Filter::eq("author", "Douglas Adams"))
//!     .filter(Filter::gte("pages", 100))
//!     .order_by("published")
//!     .descending()
//!     .limit(10)
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! [`Filter`] provides a constructor for every [`Operator`]:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - Array: `array_contains`, `array_contains_any`
//! - Membership: `is_in`, `not_in`

use bson::Bson;
use std::{fmt, str::FromStr};

use crate::error::{BackendError, StoreError, StoreResult};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    #[default]
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field path to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Comparison operators a predicate can apply.
///
/// The set is closed. Value semantics (for example `In` expecting an array) are defined by
/// the store and not validated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `array-contains`: the array field holds the value.
    ArrayContains,
    /// `array-contains-any`: the array field holds at least one of the values.
    ArrayContainsAny,
    /// `in`: the field equals one of the values.
    In,
    /// `not-in`: the field equals none of the values.
    NotIn,
}

impl Operator {
    /// All operators, in declaration order.
    pub const ALL: [Operator; 10] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::ArrayContains,
        Operator::ArrayContainsAny,
        Operator::In,
        Operator::NotIn,
    ];

    /// Returns the symbol the operator is known by in store queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::ArrayContains => "array-contains",
            Operator::ArrayContainsAny => "array-contains-any",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| StoreError::invalid(format!("unknown operator {s:?}")))
    }
}

/// A single field/operator/value condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// The field path the condition applies to.
    pub field: String,
    /// The comparison operator.
    pub operator: Operator,
    /// The value to compare against.
    pub value: Bson,
}

impl Predicate {
    /// Creates a predicate.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Bson>) -> Self {
        Self { field: field.into(), operator, value: value.into() }
    }
}

/// Helper struct for constructing predicates.
///
/// # Example
///
/// ```ignore
/// use kiln::query::Filter;
///
/// let recent = Filter::gt("published", 1_600_000_000_i64);
/// let tagged = Filter::array_contains_any("tags", vec!["sci-fi", "comedy"]);
/// ```
pub struct Filter;

impl Filter {
    /// Matches records where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::Equal, value)
    }

    /// Matches records where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::NotEqual, value)
    }

    /// Matches records where the field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::LessThan, value)
    }

    /// Matches records where the field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::LessThanOrEqual, value)
    }

    /// Matches records where the field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::GreaterThan, value)
    }

    /// Matches records where the field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::GreaterThanOrEqual, value)
    }

    /// Matches records whose array field holds the value.
    pub fn array_contains(field: impl Into<String>, value: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::ArrayContains, value)
    }

    /// Matches records whose array field holds any of the values.
    pub fn array_contains_any(field: impl Into<String>, values: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::ArrayContainsAny, values)
    }

    /// Matches records whose field equals one of the values.
    pub fn is_in(field: impl Into<String>, values: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::In, values)
    }

    /// Matches records whose field equals none of the values.
    pub fn not_in(field: impl Into<String>, values: impl Into<Bson>) -> Predicate {
        Predicate::new(field, Operator::NotIn, values)
    }
}

/// The full filter, sort and limit specification of one query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Criteria {
    /// Collection to query. Must not be empty.
    pub collection: String,
    /// Conditions that must all match.
    pub predicates: Vec<Predicate>,
    /// Field to order by. `None` or an empty name keeps the store's natural order.
    pub order_by: Option<String>,
    /// Order descending instead of ascending.
    pub descending: bool,
    /// Maximum number of results. `0` leaves the cap to the store.
    pub limit: usize,
}

impl Criteria {
    /// Creates a criteria builder for a collection.
    pub fn builder(collection: impl Into<String>) -> CriteriaBuilder {
        CriteriaBuilder::new(collection)
    }

    /// Checks the criteria can be executed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] when the collection name is empty.
    pub fn validate(&self) -> StoreResult<()> {
        if self.collection.is_empty() {
            return Err(StoreError::invalid(format!("valid query required: {self:?}")));
        }

        Ok(())
    }

    /// Returns the backend query this criteria describes.
    pub fn to_query(&self) -> Query {
        let mut builder = self
            .predicates
            .iter()
            .cloned()
            .fold(Query::builder(), QueryBuilder::filter);

        if let Some(field) = self.order_by.as_deref().filter(|f| !f.is_empty()) {
            builder = builder.sort(
                field,
                if self.descending { SortDirection::Desc } else { SortDirection::Asc },
            );
        }
        if self.limit > 0 {
            builder = builder.limit(self.limit);
        }

        builder.build()
    }
}

/// Builder for [`Criteria`].
#[derive(Debug, Clone)]
pub struct CriteriaBuilder {
    criteria: Criteria,
}

impl CriteriaBuilder {
    /// Creates a builder for a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self { criteria: Criteria { collection: collection.into(), ..Criteria::default() } }
    }

    /// Adds a predicate. Predicates are conjunctive.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.criteria.predicates.push(predicate);
        self
    }

    /// Adds a predicate from its parts.
    pub fn where_field(
        self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Bson>,
    ) -> Self {
        self.filter(Predicate::new(field, operator, value))
    }

    /// Orders the results by a field.
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.criteria.order_by = Some(field.into());
        self
    }

    /// Orders the results descending.
    pub fn descending(mut self) -> Self {
        self.criteria.descending = true;
        self
    }

    /// Caps the number of results. `0` leaves the cap to the store.
    pub fn limit(mut self, limit: usize) -> Self {
        self.criteria.limit = limit;
        self
    }

    /// Builds and returns the criteria.
    pub fn build(self) -> Criteria {
        self.criteria
    }
}

/// A backend query: what a [`StoreBackend`](crate::backend::StoreBackend) executes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Conditions that must all match.
    pub filters: Vec<Predicate>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Adds a conjunctive filter.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.query.filters.push(predicate);
        self
    }

    /// Sets the maximum number of records to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the sort specification for the query results.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks the filters of a query, letting backends evaluate or translate them.
pub trait QueryVisitor {
    type Output;
    type Error: Into<BackendError>;

    fn visit_predicate(
        &mut self,
        field: &str,
        operator: Operator,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_conjunction(&mut self, filters: &[Predicate]) -> Result<Self::Output, Self::Error>;

    fn visit_query(&mut self, query: &Query) -> Result<Self::Output, Self::Error> {
        self.visit_conjunction(&query.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn operators_parse_from_their_symbols() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }

        let err = "~=".parse::<Operator>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn empty_collection_is_rejected() {
        let err = Criteria::builder("").build().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert!(Criteria::builder("books").build().validate().is_ok());
    }

    #[test]
    fn criteria_shapes_backend_query() {
        let query = Criteria::builder("books")
            .filter(Filter::eq("author", "Douglas Adams"))
            .where_field("pages", Operator::GreaterThan, 100)
            .order_by("published")
            .descending()
            .limit(5)
            .build()
            .to_query();

        assert_eq!(
            query,
            Query {
                filters: vec![
                    Predicate::new("author", Operator::Equal, "Douglas Adams"),
                    Predicate::new("pages", Operator::GreaterThan, 100),
                ],
                sort: Some(Sort { field: "published".into(), direction: SortDirection::Desc }),
                limit: Some(5),
            },
        );
    }

    #[test]
    fn zero_limit_and_blank_order_are_left_to_the_store() {
        let query = Criteria::builder("books").order_by("").build().to_query();

        assert_eq!(query.sort, None);
        assert_eq!(query.limit, None);
    }
}
