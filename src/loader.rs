//! Bootstrap of a [`DecisionTree`] from a persisted document.
//!
//! The document shape mirrors the JSON payload an editing frontend
//! stores: one root descriptor plus a collection of further node
//! descriptors, each naming its parent by id. The collection may arrive
//! in any order; assembly defers descriptors until their parent is
//! registered.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::instrument;

use crate::domain::{DecisionTree, TreeError, TreeResult};

/// Root node record of a tree document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootDescriptor {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Non-root node record of a tree document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionDescriptor {
    pub id: String,
    pub question: String,
    /// Parent id; every non-root descriptor must carry one.
    pub previous_id: Option<String>,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Complete tree document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDocument {
    pub top_decision: RootDescriptor,
    #[serde(default)]
    pub decisions: Vec<DecisionDescriptor>,
}

/// Assembles decision trees from bootstrap documents.
#[derive(Debug, Default)]
pub struct TreeLoader;

impl TreeLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parses a JSON document and loads it.
    #[instrument(level = "debug", skip(self, json))]
    pub fn from_json(&self, json: &str) -> TreeResult<DecisionTree> {
        let document: TreeDocument = serde_json::from_str(json)?;
        self.load(document)
    }

    /// Builds a tree from an already-deserialized document.
    ///
    /// Descriptors may reference parents registered later in the
    /// collection; unresolved ones are retried until a pass makes no
    /// progress, at which point a leftover parent id reports
    /// [`TreeError::ParentNotFound`]. A descriptor without a
    /// `previousId` reports [`TreeError::MissingParent`], a reused id
    /// [`TreeError::DuplicateId`].
    #[instrument(level = "debug", skip(self, document))]
    pub fn load(&self, document: TreeDocument) -> TreeResult<DecisionTree> {
        let root = document.top_decision;
        let mut tree = DecisionTree::new(&root.id, &root.question, root.answers);

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(root.id);
        let mut pending = Vec::with_capacity(document.decisions.len());
        for descriptor in document.decisions {
            let previous_id = match descriptor.previous_id.as_deref() {
                Some(parent) if !parent.is_empty() => parent.to_string(),
                _ => return Err(TreeError::MissingParent(descriptor.id)),
            };
            if !seen.insert(descriptor.id.clone()) {
                return Err(TreeError::DuplicateId(descriptor.id));
            }
            pending.push((descriptor, previous_id));
        }

        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut progressed = false;

            for (descriptor, previous_id) in pending {
                if tree.contains(&previous_id) {
                    tree.insert(
                        &descriptor.id,
                        &descriptor.question,
                        &previous_id,
                        descriptor.answers,
                    )?;
                    progressed = true;
                } else {
                    deferred.push((descriptor, previous_id));
                }
            }

            if !progressed {
                let leftover = deferred
                    .into_iter()
                    .next()
                    .map(|(_, previous_id)| previous_id)
                    .unwrap_or_default();
                return Err(TreeError::ParentNotFound(leftover));
            }
            pending = deferred;
        }

        Ok(tree)
    }
}
