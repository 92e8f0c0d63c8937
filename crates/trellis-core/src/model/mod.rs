//! Finalized test tree and the indexed test model

pub mod node;
pub mod test_model;

pub use node::{Metadata, PreOrder, TestAction, TestKind, TestNode, DESCRIPTION_KEY};
pub use test_model::{TestIndex, TestModel};
pub use crate::error::ModelError;
