//! Ordered dialog history.
//!
//! [`DialogStore`] is append-only except for the last entry's answer, which
//! is settled once. It does not know about images or streams; those rules
//! live in the session layer.

use chrono::Utc;

use super::qna::{Answer, ImageRef, QnA};
use crate::error::DialogError;

/// Ordered sequence of [`QnA`] turns; insertion order is conversation order.
#[derive(Debug, Clone, Default)]
pub struct DialogStore {
    entries: Vec<QnA>,
}

impl DialogStore {
    /// Creates an empty dialog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn with a pending answer and returns its index.
    pub fn append(&mut self, question: String, image: Option<ImageRef>) -> usize {
        self.entries.push(QnA::new(question, image));
        self.entries.len() - 1
    }

    /// Writes `text` as the final answer of the last turn.
    ///
    /// # Errors
    ///
    /// Returns [`DialogError::Empty`] if there is no turn, or
    /// [`DialogError::AlreadySettled`] if the last turn is not pending.
    pub fn finalize(&mut self, text: String) -> Result<usize, DialogError> {
        self.settle(Answer::Final(text))
    }

    /// Marks the last turn as failed with the backend's message.
    ///
    /// # Errors
    ///
    /// Same as [`DialogStore::finalize`].
    pub fn fail(&mut self, message: String) -> Result<usize, DialogError> {
        self.settle(Answer::Failed(message))
    }

    fn settle(&mut self, answer: Answer) -> Result<usize, DialogError> {
        let index = self.entries.len().saturating_sub(1);
        let Some(last) = self.entries.last_mut() else {
            return Err(DialogError::Empty);
        };
        if !last.answer.is_pending() {
            return Err(DialogError::AlreadySettled { index });
        }
        last.answer = answer;
        last.answered_at = Some(Utc::now());
        Ok(index)
    }

    /// Removes every turn.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns all turns in order.
    #[must_use]
    pub fn entries(&self) -> &[QnA] {
        &self.entries
    }

    /// Returns the most recent turn.
    #[must_use]
    pub fn last(&self) -> Option<&QnA> {
        self.entries.last()
    }

    /// Returns `true` if the last turn is still waiting for its answer.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.last().is_some_and(|qna| qna.answer.is_pending())
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn append_returns_sequential_indices() {
        let mut dialog = DialogStore::new();
        assert_eq!(dialog.append("first".to_string(), Some(ImageRef::from("img"))), 0);
        assert_eq!(dialog.finalize("a".to_string()), Ok(0));
        assert_eq!(dialog.append("second".to_string(), None), 1);
        assert_eq!(dialog.len(), 2);
        assert!(dialog.has_pending());
    }

    #[test]
    fn finalize_writes_last_answer() {
        let mut dialog = DialogStore::new();
        dialog.append("q".to_string(), None);
        assert_eq!(dialog.finalize("Two people.".to_string()), Ok(0));

        let Some(last) = dialog.last() else {
            panic!("expected an entry");
        };
        assert_eq!(last.answer, Answer::Final("Two people.".to_string()));
        assert!(last.answered_at.is_some());
        assert!(!dialog.has_pending());
    }

    #[test]
    fn finalize_twice_is_reported() {
        let mut dialog = DialogStore::new();
        dialog.append("q".to_string(), None);
        assert!(dialog.finalize("one".to_string()).is_ok());
        assert_eq!(
            dialog.finalize("two".to_string()),
            Err(DialogError::AlreadySettled { index: 0 })
        );
        assert_eq!(dialog.last().and_then(|q| q.answer.text()), Some("one"));
    }

    #[test]
    fn finalize_empty_is_reported() {
        let mut dialog = DialogStore::new();
        assert_eq!(dialog.finalize("x".to_string()), Err(DialogError::Empty));
        assert_eq!(dialog.fail("x".to_string()), Err(DialogError::Empty));
    }

    #[test]
    fn fail_settles_pending_turn() {
        let mut dialog = DialogStore::new();
        dialog.append("q".to_string(), None);
        assert_eq!(dialog.fail("model crashed".to_string()), Ok(0));
        assert_eq!(
            dialog.last().map(|q| q.answer.clone()),
            Some(Answer::Failed("model crashed".to_string()))
        );
    }

    #[test]
    fn clear_empties() {
        let mut dialog = DialogStore::new();
        dialog.append("q".to_string(), None);
        dialog.clear();
        assert!(dialog.is_empty());
        assert!(!dialog.has_pending());
    }
}
