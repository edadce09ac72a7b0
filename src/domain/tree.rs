//! Arena-backed decision tree with structural editing operations.
//!
//! The arena is the sole owner of every [`Decision`]; the id index and
//! the parent handles inside the nodes are bookkeeping only. Every
//! public operation restores the two-way link invariant before it
//! returns: a non-root node's id appears exactly once in its parent's
//! answer list, and an answer label that resolves to a node implies
//! that node points back at the labeling decision.

use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use itertools::Itertools;
use tracing::instrument;

use crate::domain::decision::Decision;
use crate::domain::error::{TreeError, TreeResult};

/// Drop duplicate labels, keeping the first occurrence of each.
fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    labels.into_iter().unique().collect()
}

/// Mutable, navigable decision tree.
///
/// Nodes live in a generational arena and are addressed by their string
/// id through a flat index. The root is the only node without a parent;
/// removing it empties the tree, and [`DecisionTree::replant`] is the
/// only way back out of that state.
#[derive(Debug)]
pub struct DecisionTree {
    /// Arena storage for all decision nodes
    arena: Arena<Decision>,
    /// id -> arena index, the authoritative membership record
    ids: HashMap<String, Index>,
    /// Index of the root node, None only for an emptied tree
    root: Option<Index>,
}

impl DecisionTree {
    /// Creates the tree together with its root decision.
    ///
    /// The root is the only node ever constructed without a parent. A
    /// label naming the root itself is dropped.
    pub fn new(id: &str, question: &str, answers: Vec<String>) -> Self {
        let mut answers = dedup_labels(answers);
        answers.retain(|label| label != id);
        let mut arena = Arena::new();
        let root_idx = arena.insert(Decision::new(id, question, answers, None));
        let mut ids = HashMap::new();
        ids.insert(id.to_string(), root_idx);
        Self {
            arena,
            ids,
            root: Some(root_idx),
        }
    }

    fn index_of(&self, id: &str) -> Option<Index> {
        self.ids.get(id).copied()
    }

    /// True when `label` appears in the answer list of any node other
    /// than `except`. Bare labels may be shared between nodes, but an
    /// id must not: a label equal to an id resolves to that node, so a
    /// second occurrence would claim the same child for two parents.
    fn label_in_use(&self, label: &str, except: Option<Index>) -> bool {
        self.arena.iter().any(|(idx, node)| {
            Some(idx) != except && node.answers().iter().any(|a| a == label)
        })
    }

    /// O(1) lookup. Not finding an id is a normal outcome here; callers
    /// routinely probe whether an answer label has a decision behind it.
    pub fn get(&self, id: &str) -> Option<&Decision> {
        self.index_of(id).and_then(|idx| self.arena.get(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// All current decision ids, unordered. Drives selection UIs.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }

    pub fn root(&self) -> Option<&Decision> {
        self.root.and_then(|idx| self.arena.get(idx))
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root().map(Decision::id)
    }

    /// Parent of the decision with the given id, None for the root or
    /// an unresolved id.
    pub fn previous(&self, id: &str) -> Option<&Decision> {
        self.get(id).and_then(|node| self.previous_of(node))
    }

    /// Parent of a decision already in hand.
    pub fn previous_of(&self, decision: &Decision) -> Option<&Decision> {
        decision.previous().and_then(|idx| self.arena.get(idx))
    }

    /// Inserts a new decision under `parent_id`.
    ///
    /// The new id is appended to the parent's answer list when not
    /// already present, so inserting a child also wires the edge from
    /// the terse answer label. Fails with [`TreeError::DuplicateId`] or
    /// [`TreeError::ParentNotFound`] before any state changes.
    #[instrument(level = "debug", skip(self, question, answers))]
    pub fn insert(
        &mut self,
        id: &str,
        question: &str,
        parent_id: &str,
        answers: Vec<String>,
    ) -> TreeResult<()> {
        if self.ids.contains_key(id) {
            return Err(TreeError::DuplicateId(id.to_string()));
        }
        let parent_idx = self
            .index_of(parent_id)
            .ok_or_else(|| TreeError::ParentNotFound(parent_id.to_string()))?;
        // the id may pre-exist as an answer label, but only on the
        // parent it is being attached to
        if self.label_in_use(id, Some(parent_idx)) {
            return Err(TreeError::DuplicateId(id.to_string()));
        }
        let answers = dedup_labels(answers);
        for label in &answers {
            if label == id || self.ids.contains_key(label.as_str()) {
                return Err(TreeError::DuplicateId(label.clone()));
            }
        }

        let node = Decision::new(id, question, answers, Some(parent_idx));
        let node_idx = self.arena.insert(node);
        self.ids.insert(id.to_string(), node_idx);

        if let Some(parent) = self.arena.get_mut(parent_idx) {
            if !parent.answers().iter().any(|a| a == id) {
                parent.answers_mut().push(id.to_string());
            }
        }
        Ok(())
    }

    /// Re-keys a decision, updating the matching answer label in the
    /// parent position-preserving. Never overwrites: a taken `new_id`
    /// reports [`TreeError::DuplicateId`].
    #[instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, id: &str, new_id: &str) -> TreeResult<()> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| TreeError::DecisionNotFound(id.to_string()))?;
        // the new id must not collide with another id, nor with any
        // answer label: those would start resolving to this node
        if self.ids.contains_key(new_id) || self.label_in_use(new_id, None) {
            return Err(TreeError::DuplicateId(new_id.to_string()));
        }

        self.ids.remove(id);
        self.ids.insert(new_id.to_string(), idx);

        let parent_idx = match self.arena.get_mut(idx) {
            Some(node) => {
                node.set_id(new_id.to_string());
                node.previous()
            }
            None => None,
        };

        // the root has no parent label to update
        if let Some(parent_idx) = parent_idx {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                if let Some(pos) = parent.answers().iter().position(|a| a == id) {
                    parent.answers_mut()[pos] = new_id.to_string();
                }
            }
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self, question))]
    pub fn set_question(&mut self, id: &str, question: &str) -> TreeResult<()> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| TreeError::DecisionNotFound(id.to_string()))?;
        if let Some(node) = self.arena.get_mut(idx) {
            node.set_question(question.to_string());
        }
        Ok(())
    }

    /// Appends `labels` to the decision's answers with set semantics:
    /// labels already present are dropped, existing order is kept.
    #[instrument(level = "debug", skip(self))]
    pub fn add_answers(&mut self, id: &str, labels: &[String]) -> TreeResult<()> {
        if labels.is_empty() {
            return Err(TreeError::InvalidArgument(
                "no answers given to add".to_string(),
            ));
        }
        let idx = self
            .index_of(id)
            .ok_or_else(|| TreeError::DecisionNotFound(id.to_string()))?;
        // a label that resolves to a decision elsewhere would claim
        // that child for a second parent; reject before mutating
        if let Some(node) = self.arena.get(idx) {
            for label in labels {
                if !node.answers().contains(label) && self.ids.contains_key(label.as_str()) {
                    return Err(TreeError::DuplicateId(label.clone()));
                }
            }
        }
        if let Some(node) = self.arena.get_mut(idx) {
            for label in labels {
                if !node.answers().contains(label) {
                    node.answers_mut().push(label.clone());
                }
            }
        }
        Ok(())
    }

    /// Cascading delete: removes the decision and every descendant
    /// reachable through its answer labels (post-order), then splices
    /// the id out of the parent's answer list. Removing the root leaves
    /// the tree empty; see [`DecisionTree::replant`].
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, id: &str) -> TreeResult<()> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| TreeError::DecisionNotFound(id.to_string()))?;

        self.remove_descendants(idx);

        self.ids.remove(id);
        if let Some(node) = self.arena.remove(idx) {
            if let Some(parent_idx) = node.previous() {
                if let Some(parent) = self.arena.get_mut(parent_idx) {
                    parent.answers_mut().retain(|a| a != id);
                }
            }
        }
        if self.root == Some(idx) {
            self.root = None;
        }
        Ok(())
    }

    /// Removes everything below `idx` without touching the node itself
    /// or its parent's answer list.
    fn remove_descendants(&mut self, idx: Index) {
        let child_ids: Vec<String> = match self.arena.get(idx) {
            Some(node) => node
                .answers()
                .iter()
                .filter(|label| self.ids.contains_key(label.as_str()))
                .cloned()
                .collect(),
            None => return,
        };
        for child_id in child_ids {
            if let Some(child_idx) = self.index_of(&child_id) {
                self.remove_descendants(child_idx);
                self.arena.remove(child_idx);
                self.ids.remove(&child_id);
            }
        }
    }

    /// Removes specific answer edges: per label, a resolving child is
    /// cascade-deleted first, then the label itself is stripped. A
    /// decision whose answer list drains to empty is dead and leaves
    /// the tree; its own label in the parent stays behind as a bare
    /// leaf answer.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_answers(&mut self, id: &str, labels: &[String]) -> TreeResult<()> {
        if labels.is_empty() {
            return Err(TreeError::InvalidArgument(
                "no answers given to remove".to_string(),
            ));
        }
        let idx = self
            .index_of(id)
            .ok_or_else(|| TreeError::DecisionNotFound(id.to_string()))?;

        for label in labels {
            if self.ids.contains_key(label.as_str()) {
                // splices the label out of this node's answers as well
                self.remove_subtree(label)?;
            }
            if let Some(node) = self.arena.get_mut(idx) {
                node.answers_mut().retain(|a| a != label);
            }
        }

        let drained = self
            .arena
            .get(idx)
            .map(|node| node.answers().is_empty())
            .unwrap_or(false);
        if drained {
            if let Some(node) = self.arena.remove(idx) {
                self.ids.remove(node.id());
            }
            if self.root == Some(idx) {
                self.root = None;
            }
        }
        Ok(())
    }

    /// Positional bulk answer edit.
    ///
    /// - both lists empty: no-op
    /// - only `old_labels`: same as [`DecisionTree::remove_answers`]
    /// - only `new_labels`: every current answer's subtree is wiped and
    ///   the answer list is replaced wholesale
    /// - both given: pairs `(old[i], new[i])` are applied in place over
    ///   the common prefix; a pair is skipped entirely when the old
    ///   label is absent or the new label would collide with an
    ///   existing answer or decision id. A resolving child keeps its
    ///   subtree under the new label via the rename mechanism. Extra
    ///   new labels are appended as bare leaf answers; extra old labels
    ///   beyond the paired prefix are left untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn edit_answers(
        &mut self,
        id: &str,
        old_labels: &[String],
        new_labels: &[String],
    ) -> TreeResult<()> {
        if old_labels.is_empty() && new_labels.is_empty() {
            return Ok(());
        }
        let idx = self
            .index_of(id)
            .ok_or_else(|| TreeError::DecisionNotFound(id.to_string()))?;

        if new_labels.is_empty() {
            return self.remove_answers(id, old_labels);
        }

        if old_labels.is_empty() {
            let current: Vec<String> = self
                .arena
                .get(idx)
                .map(|node| node.answers().to_vec())
                .unwrap_or_default();
            for label in &current {
                if self.ids.contains_key(label.as_str()) {
                    self.remove_subtree(label)?;
                }
            }
            // labels that still resolve after the wipe belong to
            // decisions elsewhere in the tree; taking them would alias
            let replacement: Vec<String> = dedup_labels(new_labels.to_vec())
                .into_iter()
                .filter(|label| !self.ids.contains_key(label.as_str()))
                .collect();
            if let Some(node) = self.arena.get_mut(idx) {
                *node.answers_mut() = replacement;
            }
            return Ok(());
        }

        let paired = old_labels.len().min(new_labels.len());
        for i in 0..paired {
            let old = &old_labels[i];
            let new = &new_labels[i];

            let (old_pos, new_taken) = match self.arena.get(idx) {
                Some(node) => (
                    node.answers().iter().position(|a| a == old),
                    node.answers().iter().any(|a| a == new),
                ),
                None => (None, false),
            };
            let pos = match old_pos {
                Some(pos) => pos,
                None => continue,
            };
            if new_taken {
                continue;
            }

            if self.ids.contains_key(old.as_str()) {
                // a taken decision id or answer label elsewhere also
                // skips the pair instead of clobbering it
                if self.rename(old, new).is_err() {
                    continue;
                }
            } else if self.ids.contains_key(new.as_str()) {
                // the bare label must not start resolving to a
                // decision elsewhere in the tree
                continue;
            } else if let Some(node) = self.arena.get_mut(idx) {
                node.answers_mut()[pos] = new.clone();
            }
        }

        for new in new_labels.iter().skip(paired) {
            if self.ids.contains_key(new.as_str()) {
                continue;
            }
            if let Some(node) = self.arena.get_mut(idx) {
                if !node.answers().contains(new) {
                    node.answers_mut().push(new.clone());
                }
            }
        }
        Ok(())
    }

    /// Installs a fresh root after the tree has been emptied by
    /// removing the previous one. Fails on a non-empty tree.
    #[instrument(level = "debug", skip(self, question, answers))]
    pub fn replant(&mut self, id: &str, question: &str, answers: Vec<String>) -> TreeResult<()> {
        if !self.is_empty() {
            return Err(TreeError::InvalidArgument(
                "tree already has a root".to_string(),
            ));
        }
        let mut answers = dedup_labels(answers);
        answers.retain(|label| label != id);
        let root_idx = self.arena.insert(Decision::new(id, question, answers, None));
        self.ids.insert(id.to_string(), root_idx);
        self.root = Some(root_idx);
        Ok(())
    }

    fn child_indices(&self, node: &Decision) -> Vec<Index> {
        node.answers()
            .iter()
            .filter_map(|label| self.ids.get(label.as_str()).copied())
            .collect()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.arena.get(node_idx) {
            1 + self
                .child_indices(node)
                .into_iter()
                .map(|child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Ids of decisions none of whose answers resolve to a child.
    /// Empty trees return an empty vector.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_ids(&self) -> Vec<String> {
        let mut leaves = Vec::new();
        if let Some(root) = self.root {
            self.collect_leaves(root, &mut leaves);
        }
        leaves
    }

    fn collect_leaves(&self, node_idx: Index, leaves: &mut Vec<String>) {
        if let Some(node) = self.arena.get(node_idx) {
            let children = self.child_indices(node);
            if children.is_empty() {
                leaves.push(node.id().to_string());
            } else {
                for child in children {
                    self.collect_leaves(child, leaves);
                }
            }
        }
    }

    /// Verifies the full invariant set: id index and arena agree, the
    /// root is the only parentless node, parent and child labels line
    /// up both ways, answers are duplicate-free, and every node is
    /// reachable from the root exactly once.
    pub fn check_consistency(&self) -> TreeResult<()> {
        if self.ids.len() != self.arena.len() {
            return Err(TreeError::InternalError(format!(
                "id index has {} entries for {} nodes",
                self.ids.len(),
                self.arena.len()
            )));
        }
        if self.arena.is_empty() {
            return match self.root {
                Some(_) => Err(TreeError::InternalError(
                    "empty tree still has a root index".to_string(),
                )),
                None => Ok(()),
            };
        }
        let root_idx = self.root.ok_or_else(|| {
            TreeError::InternalError("non-empty tree without a root".to_string())
        })?;

        for (id, &idx) in &self.ids {
            let node = self.arena.get(idx).ok_or_else(|| {
                TreeError::InternalError(format!("id {} maps to a dead arena slot", id))
            })?;
            if node.id() != id {
                return Err(TreeError::InternalError(format!(
                    "id {} maps to a node named {}",
                    id,
                    node.id()
                )));
            }
        }

        for (idx, node) in self.arena.iter() {
            let mut seen = HashSet::new();
            for label in node.answers() {
                if !seen.insert(label) {
                    return Err(TreeError::InternalError(format!(
                        "duplicate answer {} on {}",
                        label,
                        node.id()
                    )));
                }
            }

            match node.previous() {
                None => {
                    if idx != root_idx {
                        return Err(TreeError::InternalError(format!(
                            "{} has no parent but is not the root",
                            node.id()
                        )));
                    }
                }
                Some(parent_idx) => {
                    let parent = self.arena.get(parent_idx).ok_or_else(|| {
                        TreeError::InternalError(format!(
                            "{} points at a dead parent slot",
                            node.id()
                        ))
                    })?;
                    let labeled = parent
                        .answers()
                        .iter()
                        .filter(|a| a.as_str() == node.id())
                        .count();
                    if labeled != 1 {
                        return Err(TreeError::InternalError(format!(
                            "{} appears {} times in the answers of {}",
                            node.id(),
                            labeled,
                            parent.id()
                        )));
                    }
                }
            }

            for label in node.answers() {
                if let Some(&child_idx) = self.ids.get(label.as_str()) {
                    let child = self.arena.get(child_idx).ok_or_else(|| {
                        TreeError::InternalError(format!("id {} maps to a dead arena slot", label))
                    })?;
                    if child.previous() != Some(idx) {
                        return Err(TreeError::InternalError(format!(
                            "{} is listed under {} but points elsewhere",
                            label,
                            node.id()
                        )));
                    }
                }
            }
        }

        let mut visited = HashSet::new();
        let mut stack = vec![root_idx];
        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                return Err(TreeError::InternalError(
                    "cycle reachable from the root".to_string(),
                ));
            }
            if let Some(node) = self.arena.get(idx) {
                stack.extend(self.child_indices(node));
            }
        }
        if visited.len() != self.arena.len() {
            return Err(TreeError::InternalError(format!(
                "{} of {} nodes reachable from the root",
                visited.len(),
                self.arena.len()
            )));
        }
        Ok(())
    }
}

pub struct TreeIterator<'a> {
    tree: &'a DecisionTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a DecisionTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a Decision);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for child in self.tree.child_indices(node).into_iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a DecisionTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a DecisionTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root {
            stack.push((root, false));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a Decision);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for child in self.tree.child_indices(node).into_iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
