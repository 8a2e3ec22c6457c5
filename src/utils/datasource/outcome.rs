//! Result types for best-effort reads.
//!
//! Query, view and lookup failures that are not fatal are carried as values
//! instead of errors, so a caller can still tell "no data" from "the call
//! failed" while the convenience accessors keep the forgiving behavior.

use serde_json::Value;

use crate::error::StoreError;

#[derive(Debug)]
pub enum QueryOutcome<T> {
    Complete(T),
    Failed(StoreError),
}

impl<T> QueryOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&StoreError> {
        match self {
            QueryOutcome::Failed(e) => Some(e),
            QueryOutcome::Complete(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, StoreError> {
        match self {
            QueryOutcome::Complete(value) => Ok(value),
            QueryOutcome::Failed(e) => Err(e),
        }
    }
}

impl<T: Default> QueryOutcome<T> {
    /// The result, or an empty one if the operation failed.
    pub fn or_empty(self) -> T {
        match self {
            QueryOutcome::Complete(value) => value,
            QueryOutcome::Failed(_) => T::default(),
        }
    }
}

/// Outcome of fetching a single document by id.
#[derive(Debug)]
pub enum Lookup {
    Found(Value),
    Missing,
    Failed(StoreError),
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// `Missing` and `Failed` both collapse to `None`.
    pub fn into_option(self) -> Option<Value> {
        match self {
            Lookup::Found(document) => Some(document),
            Lookup::Missing | Lookup::Failed(_) => None,
        }
    }
}
