//! Editable decision trees.
//!
//! A [`DecisionTree`] holds question nodes in an arena, addressed by
//! string id, each with an ordered list of answer labels. Labels that
//! match another node's id form the edges of the tree; labels without
//! one are terminal choices. All structural editing goes through the
//! tree, which keeps the parent/child links consistent in both
//! directions.
//!
//! ```
//! use dtree::domain::DecisionTree;
//!
//! let mut tree = DecisionTree::new("friday night", "What to do tonight?", vec![]);
//! tree.insert("stay in", "Staying in how?", "friday night", vec!["gaming".into()])
//!     .unwrap();
//!
//! assert_eq!(tree.previous("stay in").unwrap().id(), "friday night");
//! assert!(tree.root().unwrap().answers().contains(&"stay in".to_string()));
//! ```

pub mod domain;
pub mod loader;
pub mod tree_traits;
pub mod util;

pub use domain::{Decision, DecisionTree, TreeError, TreeResult};
pub use loader::{DecisionDescriptor, RootDescriptor, TreeDocument, TreeLoader};
pub use tree_traits::DecisionTreeDisplay;
