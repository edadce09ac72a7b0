//! Decision entity: one question node of the tree

use generational_arena::Index;

/// A single decision node: a question plus its ordered answer labels.
///
/// Pure value holder. All structural mutation goes through
/// [`DecisionTree`](crate::domain::DecisionTree); the setters are
/// crate-private so outside code cannot desynchronize the answer list
/// from the children it points to.
///
/// `previous` is a non-owning handle into the tree's arena, kept purely
/// for upward navigation. The arena owns every node; dropping a
/// `Decision` never frees another.
#[derive(Debug, Clone)]
pub struct Decision {
    id: String,
    question: String,
    answers: Vec<String>,
    previous: Option<Index>,
}

impl Decision {
    pub(crate) fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answers: Vec<String>,
        previous: Option<Index>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answers,
            previous,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Ordered answer labels. A label may or may not resolve to a child
    /// decision; labels without one are terminal choices.
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn is_root(&self) -> bool {
        self.previous.is_none()
    }

    pub(crate) fn previous(&self) -> Option<Index> {
        self.previous
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub(crate) fn set_question(&mut self, question: String) {
        self.question = question;
    }

    pub(crate) fn answers_mut(&mut self) -> &mut Vec<String> {
        &mut self.answers
    }
}
