//! Domain layer: the decision tree and its entities
//!
//! This layer is independent of external concerns (no I/O, no document
//! parsing).

pub mod decision;
pub mod error;
pub mod tree;

pub use decision::Decision;
pub use error::{TreeError, TreeResult};
pub use tree::{DecisionTree, PostOrderIterator, TreeIterator};
