//! Error types for exploration and the test model

use thiserror::Error;

pub type ExploreResult<T> = Result<T, ExploreError>;
pub type ModelResult<T> = Result<T, ModelError>;

/// Invalid requests made to the exploration driver
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExploreError {
    #[error("Type '{type_name}' is not attached to a live assembly")]
    DetachedType { type_name: String },
}

/// Structural defects in a finalized test tree
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Duplicate test id '{id}' in the test model")]
    DuplicateId { id: String },
}
