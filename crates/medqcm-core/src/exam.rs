//! Exam engine
//!
//! A linear, self-paced test session over a module's eligible questions:
//! `Intro → Active → Result`, with `Result → Intro` (retry) as the only way
//! back. The engine works on its own shuffled copy of the question list and
//! never touches the module's display order.

use std::collections::{BTreeSet, HashMap};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::models::Question;

/// Upper bound on the number of questions in one session.
pub const MAX_TEST_QUESTIONS: usize = 60;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started; the start affordance is shown (or disabled when no
    /// question is eligible)
    Intro,
    /// Test in progress
    Active,
    /// Test finished; score available
    Result,
}

/// Outcome of a single question at grading time.
///
/// Unanswered is reported separately from Incorrect in the breakdown, but
/// both count as not-correct in the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Unanswered,
}

/// Final score of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    /// Questions graded correct
    pub correct: usize,
    /// Questions in the session
    pub total: usize,
    /// `correct / total` as a rounded integer percentage
    pub percent: u32,
}

/// One exam session.
#[derive(Debug, Clone)]
pub struct ExamSession {
    phase: Phase,
    questions: Vec<Question>,
    current: usize,
    answers: HashMap<String, BTreeSet<usize>>,
}

impl Default for ExamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamSession {
    /// A fresh session in the Intro phase
    pub fn new() -> Self {
        Self {
            phase: Phase::Intro,
            questions: Vec::new(),
            current: 0,
            answers: HashMap::new(),
        }
    }

    /// The eligible subset of a question list (non-AI questions)
    pub fn eligible(questions: &[Question]) -> Vec<Question> {
        questions
            .iter()
            .filter(|q| q.is_exam_eligible())
            .cloned()
            .collect()
    }

    /// Whether a test can be started over this question list
    pub fn can_start(questions: &[Question]) -> bool {
        questions.iter().any(|q| q.is_exam_eligible())
    }

    /// Start a test with the default RNG
    pub fn start(&mut self, questions: &[Question]) -> bool {
        self.start_with_rng(questions, &mut rand::thread_rng())
    }

    /// Start a test: filter eligible questions, Fisher–Yates shuffle, cap
    /// at [`MAX_TEST_QUESTIONS`], reset answers and position.
    ///
    /// Returns `false` (and stays in Intro) when no question is eligible;
    /// the caller shows a disabled start affordance rather than an error.
    pub fn start_with_rng(&mut self, questions: &[Question], rng: &mut impl Rng) -> bool {
        let mut pool = Self::eligible(questions);
        if pool.is_empty() {
            return false;
        }

        pool.shuffle(rng);
        pool.truncate(MAX_TEST_QUESTIONS);
        debug!(count = pool.len(), "exam session started");

        self.questions = pool;
        self.answers.clear();
        self.current = 0;
        self.phase = Phase::Active;
        true
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Questions of this session, in test order
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// 0-based index of the question being shown
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question being shown, while Active
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == Phase::Active {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    /// The recorded answer set for a question id, if any
    pub fn answer_for(&self, question_id: &str) -> Option<&BTreeSet<usize>> {
        self.answers.get(question_id)
    }

    /// Overwrite the answer set for the current question.
    ///
    /// Option indices are trusted as-is; out-of-range selections simply
    /// grade as incorrect.
    pub fn record_answer(&mut self, selected: BTreeSet<usize>) {
        if self.phase != Phase::Active {
            return;
        }
        if let Some(question) = self.questions.get(self.current) {
            self.answers.insert(question.id.clone(), selected);
        }
    }

    /// Step back one question, clamped at the first. Answers are untouched.
    pub fn go_previous(&mut self) {
        if self.phase == Phase::Active {
            self.current = self.current.saturating_sub(1);
        }
    }

    /// Step forward one question; at the last question the session moves to
    /// Result. Advancing past an unanswered question is allowed - it will
    /// grade as incorrect.
    pub fn go_next(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
        } else {
            self.phase = Phase::Result;
            debug!(score = self.score().correct, "exam session finished");
        }
    }

    /// Grade one question of the session
    pub fn outcome(&self, question: &Question) -> Outcome {
        match self.answers.get(&question.id) {
            None => Outcome::Unanswered,
            Some(selected) if question.grades_correct(selected) => Outcome::Correct,
            Some(_) => Outcome::Incorrect,
        }
    }

    /// Compute the session score. Empty answer entries and unanswered
    /// questions both grade as not-correct.
    pub fn score(&self) -> Score {
        let total = self.questions.len();
        let correct = self
            .questions
            .iter()
            .filter(|q| self.outcome(q) == Outcome::Correct)
            .count();
        let percent = if total == 0 {
            0
        } else {
            ((correct as f64 / total as f64) * 100.0).round() as u32
        };
        Score {
            correct,
            total,
            percent,
        }
    }

    /// Discard all session state and return to Intro. The underlying
    /// question bank is never affected.
    pub fn retry(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Question;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn q(id: &str) -> Question {
        Question::single(id, "t", vec!["a".into(), "b".into()], 0)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_eligibility_filter() {
        let questions = vec![q("q1"), q("ai-2"), q("manual-3"), q("ai-9")];
        let eligible = ExamSession::eligible(&questions);
        let ids: Vec<_> = eligible.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "manual-3"]);
    }

    #[test]
    fn test_start_refused_without_eligible_questions() {
        let mut session = ExamSession::new();
        assert!(!ExamSession::can_start(&[q("ai-1"), q("ai-2")]));
        assert!(!session.start_with_rng(&[q("ai-1")], &mut rng()));
        assert_eq!(session.phase(), Phase::Intro);
    }

    #[test]
    fn test_start_truncates_to_sixty_unique() {
        let pool: Vec<Question> = (0..100).map(|i| q(&format!("q{}", i))).collect();
        let mut session = ExamSession::new();
        assert!(session.start_with_rng(&pool, &mut rng()));

        assert_eq!(session.questions().len(), MAX_TEST_QUESTIONS);

        let mut ids: Vec<_> = session.questions().iter().map(|q| q.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), MAX_TEST_QUESTIONS);
        // All drawn from the pool
        assert!(session
            .questions()
            .iter()
            .all(|tq| pool.iter().any(|p| p.id == tq.id)));
    }

    #[test]
    fn test_start_excludes_ai_questions_from_draw() {
        let mut pool: Vec<Question> = (0..10).map(|i| q(&format!("q{}", i))).collect();
        pool.push(q("ai-1"));
        pool.push(q("ai-2"));

        let mut session = ExamSession::new();
        session.start_with_rng(&pool, &mut rng());
        assert_eq!(session.questions().len(), 10);
        assert!(session.questions().iter().all(|q| q.is_exam_eligible()));
    }

    #[test]
    fn test_shuffle_does_not_mutate_input_order() {
        let pool: Vec<Question> = (0..30).map(|i| q(&format!("q{}", i))).collect();
        let before = pool.clone();
        let mut session = ExamSession::new();
        session.start_with_rng(&pool, &mut rng());
        assert_eq!(pool, before);
    }

    #[test]
    fn test_multi_answer_scoring_exactness() {
        let question = Question::new(
            "m1",
            "t",
            vec!["a".into(), "b".into(), "c".into()],
            [0, 2],
        );
        let mut session = ExamSession::new();
        session.start_with_rng(std::slice::from_ref(&question), &mut rng());

        session.record_answer(BTreeSet::from([0]));
        assert_eq!(session.outcome(&question), Outcome::Incorrect);

        session.record_answer(BTreeSet::from([0, 2]));
        assert_eq!(session.outcome(&question), Outcome::Correct);

        session.record_answer(BTreeSet::from([0, 1, 2]));
        assert_eq!(session.outcome(&question), Outcome::Incorrect);
    }

    #[test]
    fn test_unanswered_counts_wrong() {
        let pool = vec![q("q1"), q("q2")];
        let mut session = ExamSession::new();
        session.start_with_rng(&pool, &mut rng());

        // Answer only the first shown question, correctly
        session.record_answer(BTreeSet::from([0]));
        session.go_next();
        session.go_next();

        assert_eq!(session.phase(), Phase::Result);
        let score = session.score();
        assert_eq!(score.correct, 1);
        assert_eq!(score.total, 2);
        assert_eq!(score.percent, 50);

        let unanswered = &session.questions()[1];
        assert_eq!(session.outcome(unanswered), Outcome::Unanswered);
    }

    #[test]
    fn test_record_answer_overwrites() {
        let pool = vec![q("q1")];
        let mut session = ExamSession::new();
        session.start_with_rng(&pool, &mut rng());

        session.record_answer(BTreeSet::from([1]));
        session.record_answer(BTreeSet::from([0]));
        assert_eq!(session.answer_for("q1"), Some(&BTreeSet::from([0])));
    }

    #[test]
    fn test_navigation_bounds() {
        let pool = vec![q("q1"), q("q2"), q("q3")];
        let mut session = ExamSession::new();
        session.start_with_rng(&pool, &mut rng());

        session.go_previous();
        assert_eq!(session.current_index(), 0);

        session.go_next();
        session.go_next();
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.phase(), Phase::Active);

        session.go_next();
        assert_eq!(session.phase(), Phase::Result);
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn test_previous_keeps_answers() {
        let pool = vec![q("q1"), q("q2")];
        let mut session = ExamSession::new();
        session.start_with_rng(&pool, &mut rng());

        let first_id = session.current_question().unwrap().id.clone();
        session.record_answer(BTreeSet::from([0]));
        session.go_next();
        session.go_previous();
        assert_eq!(session.answer_for(&first_id), Some(&BTreeSet::from([0])));
    }

    #[test]
    fn test_percent_rounding() {
        let pool = vec![q("q1"), q("q2"), q("q3")];
        let mut session = ExamSession::new();
        session.start_with_rng(&pool, &mut rng());

        session.record_answer(BTreeSet::from([0]));
        session.go_next();
        session.go_next();
        session.go_next();

        // 1/3 rounds to 33
        assert_eq!(session.score().percent, 33);
    }

    #[test]
    fn test_retry_discards_session_state() {
        let pool = vec![q("q1")];
        let mut session = ExamSession::new();
        session.start_with_rng(&pool, &mut rng());
        session.record_answer(BTreeSet::from([0]));
        session.go_next();
        assert_eq!(session.phase(), Phase::Result);

        session.retry();
        assert_eq!(session.phase(), Phase::Intro);
        assert!(session.questions().is_empty());
        assert!(session.answer_for("q1").is_none());
    }
}
