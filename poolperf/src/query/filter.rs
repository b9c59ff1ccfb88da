use serde::{Deserialize, Serialize};

use crate::catalog::{ROLE_INSTANCE_DIMENSION, ROLE_NAME_DIMENSION};

/// Abstract identity predicate. Encoding into a wire filter syntax belongs to a
/// [`FilterEncoder`]; query building only composes the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    Equals { field: String, value: String },
    And(Box<FilterExpr>, Box<FilterExpr>),
}

impl FilterExpr {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals { field: field.into(), value: value.into() }
    }

    pub fn and(self, rhs: Self) -> Self {
        Self::And(Box::new(self), Box::new(rhs))
    }
}

/// Seam to the filter expression library that serializes predicates for the wire.
///
/// The crate ships no implementation. Descriptors carry the [`FilterExpr`] tree as JSON, and the
/// [`QueryExecutor`](crate::service::QueryExecutor) that talks to the telemetry service provides
/// an encoder for whatever filter syntax that service expects.
pub trait FilterEncoder {
    fn encode(&self, filter: &FilterExpr) -> String;
}

/// Pool predicate, AND-narrowed to the node when one is given.
pub fn compose_identity_filter(pool_id: &str, node_id: Option<&str>) -> FilterExpr {
    let pool = FilterExpr::equals(ROLE_NAME_DIMENSION, pool_id);
    match node_id {
        None => pool,
        Some(node) => pool.and(FilterExpr::equals(ROLE_INSTANCE_DIMENSION, node)),
    }
}
