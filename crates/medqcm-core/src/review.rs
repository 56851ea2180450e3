//! Review card
//!
//! Presentation-independent interaction logic for a single question card.
//! Two modes:
//!
//! - **Immediate**: the Review tab. The first submitted answer locks the
//!   card and feedback shows right away. The explanation panel is
//!   user-toggled, collapsed by default, and auto-expanded when the locked
//!   answer was wrong.
//! - **Exam**: selection is delegated to the exam engine; the card holds
//!   the question but reveals no correctness until the caller enables
//!   feedback (Result phase only).

use std::collections::BTreeSet;

use crate::models::Question;

/// How a card treats selection and feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMode {
    Immediate,
    Exam,
}

/// Render class of one option row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionAppearance {
    /// Not selected, no feedback
    Neutral,
    /// Selected, feedback hidden
    Selected,
    /// Feedback: this option is correct
    Correct,
    /// Feedback: the user picked this option and it is wrong
    Incorrect,
    /// Feedback: neither correct nor picked
    Dimmed,
}

/// Compute the render class of an option.
///
/// While `show_feedback` is false only the neutral/selected distinction is
/// exposed, so an active exam session never leaks correctness.
pub fn option_appearance(
    question: &Question,
    selection: &BTreeSet<usize>,
    index: usize,
    show_feedback: bool,
) -> OptionAppearance {
    if !show_feedback {
        if selection.contains(&index) {
            OptionAppearance::Selected
        } else {
            OptionAppearance::Neutral
        }
    } else if question.correct.contains(&index) {
        OptionAppearance::Correct
    } else if selection.contains(&index) {
        OptionAppearance::Incorrect
    } else {
        OptionAppearance::Dimmed
    }
}

/// Interaction state of one question card.
#[derive(Debug, Clone)]
pub struct ReviewCard {
    question: Question,
    mode: ReviewMode,
    selection: BTreeSet<usize>,
    locked: bool,
    show_explanation: bool,
}

impl ReviewCard {
    /// An immediate-feedback card (Review tab)
    pub fn immediate(question: Question) -> Self {
        Self::new(question, ReviewMode::Immediate)
    }

    /// An exam-mode card; selection belongs to the exam engine
    pub fn exam(question: Question) -> Self {
        Self::new(question, ReviewMode::Exam)
    }

    fn new(question: Question, mode: ReviewMode) -> Self {
        Self {
            question,
            mode,
            selection: BTreeSet::new(),
            locked: false,
            show_explanation: false,
        }
    }

    /// The question this card shows
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// The current selection set
    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    /// Whether the card accepts no further selection changes
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether the explanation panel is open
    pub fn explanation_visible(&self) -> bool {
        self.show_explanation
    }

    /// Exact-match correctness of the current selection
    pub fn is_correct(&self) -> bool {
        self.question.grades_correct(&self.selection)
    }

    /// Handle an option pick.
    ///
    /// Immediate mode: single-answer questions lock on the first pick;
    /// multi-answer questions toggle membership and lock via [`submit`].
    /// Exam mode: toggles membership and returns the new selection set for
    /// the caller to forward to `ExamSession::record_answer`.
    ///
    /// [`submit`]: ReviewCard::submit
    pub fn select(&mut self, index: usize) -> Option<BTreeSet<usize>> {
        match self.mode {
            ReviewMode::Immediate => {
                if self.locked {
                    return None;
                }
                if self.question.correct.len() <= 1 {
                    self.selection = BTreeSet::from([index]);
                    self.lock();
                } else if !self.selection.remove(&index) {
                    self.selection.insert(index);
                }
                None
            }
            ReviewMode::Exam => {
                if self.locked {
                    return None;
                }
                if !self.selection.remove(&index) {
                    self.selection.insert(index);
                }
                Some(self.selection.clone())
            }
        }
    }

    /// Lock a multi-answer immediate card on its accumulated selection.
    /// No-op when nothing is selected or the card is already locked.
    pub fn submit(&mut self) {
        if self.mode == ReviewMode::Immediate && !self.locked && !self.selection.is_empty() {
            self.lock();
        }
    }

    fn lock(&mut self) {
        self.locked = true;
        if !self.is_correct() {
            self.show_explanation = true;
        }
    }

    /// Adopt a selection recorded elsewhere (exam mode, when navigating
    /// back to an already-answered question).
    pub fn sync_selection(&mut self, selection: &BTreeSet<usize>) {
        if self.mode == ReviewMode::Exam {
            self.selection = selection.clone();
        }
    }

    /// Toggle the explanation panel
    pub fn toggle_explanation(&mut self) {
        self.show_explanation = !self.show_explanation;
    }

    /// Whether feedback is visible. `exam_feedback` is the caller's flag,
    /// honored only in exam mode; immediate mode shows feedback once
    /// locked.
    pub fn feedback_visible(&self, exam_feedback: bool) -> bool {
        match self.mode {
            ReviewMode::Immediate => self.locked,
            ReviewMode::Exam => exam_feedback,
        }
    }

    /// Render class of one option, honoring the feedback rules of the mode
    pub fn appearance(&self, index: usize, exam_feedback: bool) -> OptionAppearance {
        option_appearance(
            &self.question,
            &self.selection,
            index,
            self.feedback_visible(exam_feedback),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single() -> Question {
        Question::single(
            "q1",
            "t",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            1,
        )
        .with_explanation("because")
    }

    fn multi() -> Question {
        Question::new("m1", "t", vec!["a".into(), "b".into(), "c".into()], [0, 2])
    }

    #[test]
    fn test_immediate_locks_on_first_selection() {
        let mut card = ReviewCard::immediate(single());
        card.select(1);
        assert!(card.is_locked());
        assert!(card.is_correct());
        // Explanation stays collapsed after a correct answer
        assert!(!card.explanation_visible());

        // Further picks are ignored
        card.select(0);
        assert_eq!(card.selection(), &BTreeSet::from([1]));
    }

    #[test]
    fn test_immediate_wrong_answer_expands_explanation() {
        let mut card = ReviewCard::immediate(single());
        card.select(3);
        assert!(card.is_locked());
        assert!(!card.is_correct());
        assert!(card.explanation_visible());
    }

    #[test]
    fn test_immediate_multi_answer_needs_submit() {
        let mut card = ReviewCard::immediate(multi());
        card.select(0);
        card.select(2);
        assert!(!card.is_locked());

        card.submit();
        assert!(card.is_locked());
        assert!(card.is_correct());
    }

    #[test]
    fn test_immediate_multi_answer_toggles() {
        let mut card = ReviewCard::immediate(multi());
        card.select(0);
        card.select(1);
        card.select(1);
        assert_eq!(card.selection(), &BTreeSet::from([0]));
    }

    #[test]
    fn test_submit_on_empty_selection_is_noop() {
        let mut card = ReviewCard::immediate(multi());
        card.submit();
        assert!(!card.is_locked());
    }

    #[test]
    fn test_exam_mode_returns_selection_for_engine() {
        let mut card = ReviewCard::exam(single());
        assert_eq!(card.select(2), Some(BTreeSet::from([2])));
        assert_eq!(card.select(0), Some(BTreeSet::from([0, 2])));
        assert_eq!(card.select(2), Some(BTreeSet::from([0])));
        assert!(!card.is_locked());
    }

    #[test]
    fn test_exam_mode_hides_feedback_until_enabled() {
        let mut card = ReviewCard::exam(single());
        card.select(3); // wrong pick

        // Active session: no correctness revealed
        assert!(!card.feedback_visible(false));
        assert_eq!(card.appearance(1, false), OptionAppearance::Neutral);
        assert_eq!(card.appearance(3, false), OptionAppearance::Selected);

        // Result phase: full feedback
        assert!(card.feedback_visible(true));
        assert_eq!(card.appearance(1, true), OptionAppearance::Correct);
        assert_eq!(card.appearance(3, true), OptionAppearance::Incorrect);
        assert_eq!(card.appearance(0, true), OptionAppearance::Dimmed);
    }

    #[test]
    fn test_exam_mode_sync_selection() {
        let mut card = ReviewCard::exam(single());
        card.sync_selection(&BTreeSet::from([1, 2]));
        assert_eq!(card.selection(), &BTreeSet::from([1, 2]));

        // Immediate cards ignore external selections
        let mut immediate = ReviewCard::immediate(single());
        immediate.sync_selection(&BTreeSet::from([1]));
        assert!(immediate.selection().is_empty());
    }

    #[test]
    fn test_toggle_explanation() {
        let mut card = ReviewCard::immediate(single());
        assert!(!card.explanation_visible());
        card.toggle_explanation();
        assert!(card.explanation_visible());
        card.toggle_explanation();
        assert!(!card.explanation_visible());
    }

    #[test]
    fn test_option_appearance_multi_answer_feedback() {
        let question = multi();
        let selection = BTreeSet::from([0, 1]);
        assert_eq!(
            option_appearance(&question, &selection, 0, true),
            OptionAppearance::Correct
        );
        assert_eq!(
            option_appearance(&question, &selection, 1, true),
            OptionAppearance::Incorrect
        );
        assert_eq!(
            option_appearance(&question, &selection, 2, true),
            OptionAppearance::Correct
        );
    }
}
