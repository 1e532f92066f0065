use std::collections::{HashMap, HashSet};

use crate::schemas::attempt::AnswerValue;

/// In-memory response state for one exam run: the answer per question plus
/// the marked-for-review set. Pure state, no I/O.
#[derive(Debug, Default, Clone)]
pub struct AnswerStore {
    answers: HashMap<String, AnswerValue>,
    review_marks: HashSet<String>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a response. Multi-select toggles the value inside the selection
    /// set; single-select replaces the stored value. The value is not checked
    /// against the question's options: an invalid key is kept and simply
    /// never matches during scoring.
    pub fn set_answer(&mut self, question_id: &str, value: impl Into<String>, multi_select: bool) {
        let value = value.into();

        if multi_select {
            let selection = match self.answers.remove(question_id) {
                Some(AnswerValue::Many(items)) => items,
                _ => Vec::new(),
            };

            let mut items = selection;
            if let Some(position) = items.iter().position(|item| *item == value) {
                items.remove(position);
            } else {
                items.push(value);
            }
            self.answers.insert(question_id.to_string(), AnswerValue::Many(items));
        } else {
            self.answers.insert(question_id.to_string(), AnswerValue::One(value));
        }
    }

    /// Put back a previously captured response as-is. Used when resuming a
    /// run and by tests.
    pub fn restore(&mut self, question_id: &str, value: AnswerValue) {
        self.answers.insert(question_id.to_string(), value);
    }

    /// Reset a response: multi-select selections become the empty set, single
    /// values are removed outright.
    pub fn clear(&mut self, question_id: &str) {
        match self.answers.get(question_id) {
            Some(AnswerValue::Many(_)) => {
                self.answers.insert(question_id.to_string(), AnswerValue::Many(Vec::new()));
            }
            _ => {
                self.answers.remove(question_id);
            }
        }
    }

    pub fn toggle_review(&mut self, question_id: &str) {
        if !self.review_marks.remove(question_id) {
            self.review_marks.insert(question_id.to_string());
        }
    }

    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.get(question_id).map(|value| !value.is_blank()).unwrap_or(false)
    }

    pub fn is_marked(&self, question_id: &str) -> bool {
        self.review_marks.contains(question_id)
    }

    /// Palette summary: how many questions carry a non-blank response.
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|value| !value.is_blank()).count()
    }

    pub fn marked_count(&self) -> usize {
        self.review_marks.len()
    }
}
