use termtree::Tree;
use tracing::instrument;

use crate::domain::{Decision, DecisionTree};

pub trait DecisionTreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl DecisionTreeDisplay for DecisionTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        if let Some(root) = self.root() {
            let mut tree = Tree::new(root.id().to_string());

            fn build_tree(store: &DecisionTree, node: &Decision, parent_tree: &mut Tree<String>) {
                for label in node.answers() {
                    match store.get(label) {
                        Some(child) => {
                            let mut child_tree = Tree::new(child.id().to_string());
                            build_tree(store, child, &mut child_tree);
                            parent_tree.push(child_tree);
                        }
                        // a bare leaf answer with no decision behind it
                        None => {
                            parent_tree.push(Tree::new(label.clone()));
                        }
                    }
                }
            }

            build_tree(self, root, &mut tree);
            tree
        } else {
            Tree::new("Empty tree".to_string())
        }
    }
}
