//! Query translation from kiln predicates to MongoDB query syntax.
//!
//! This module translates kiln's conjunctive predicate lists into MongoDB BSON filter
//! documents for execution by the MongoDB query engine.

use bson::{Bson, Document, doc};

use kiln_core::{
    error::BackendError,
    query::{Operator, Predicate, QueryVisitor},
};

/// Translates kiln predicates into MongoDB filter documents.
pub(crate) struct MongoQueryTranslator;

fn require_array(operator: Operator, value: &Bson) -> Result<&Bson, BackendError> {
    match value {
        Bson::Array(_) => Ok(value),
        _ => Err(BackendError::Internal(format!("{operator} operator requires an array value"))),
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = BackendError;

    fn visit_conjunction(&mut self, filters: &[Predicate]) -> Result<Self::Output, Self::Error> {
        let mut clauses = filters
            .iter()
            .map(|p| self.visit_predicate(&p.field, p.operator, &p.value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match clauses.len() {
            0 => doc! {},
            1 => clauses.remove(0),
            _ => doc! { "$and": clauses },
        })
    }

    fn visit_predicate(&mut self, field: &str, operator: Operator, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match operator {
                Operator::Equal => doc! { "$eq": value },
                Operator::NotEqual => doc! { "$exists": true, "$ne": value },
                Operator::LessThan => doc! { "$lt": value },
                Operator::LessThanOrEqual => doc! { "$lte": value },
                Operator::GreaterThan => doc! { "$gt": value },
                Operator::GreaterThanOrEqual => doc! { "$gte": value },
                Operator::ArrayContains => doc! { "$elemMatch": { "$eq": value } },
                Operator::ArrayContainsAny | Operator::In => doc! { "$in": require_array(operator, value)? },
                Operator::NotIn => doc! { "$exists": true, "$nin": require_array(operator, value)? },
            }
        })
    }
}
