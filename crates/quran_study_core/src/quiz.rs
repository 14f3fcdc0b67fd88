//! The chapter quiz: question → answer → feedback → next, until finished.

use crate::domain::QuizQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    /// Waiting for the generated questions.
    Loading,
    /// Generation produced no questions. Terminal.
    Failed,
    InProgress { index: usize, answered: bool },
    /// Terminal.
    Finished,
}

/// Result of selecting an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Correct,
    Wrong { correct_index: usize },
    /// Already answered, out of range, or not in progress.
    Ignored,
}

/// Result of the "next" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Finished { score: usize, total: usize },
    Ignored,
}

/// Read-only view for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSnapshot {
    pub phase: QuizPhase,
    pub question: Option<QuizQuestion>,
    pub selected_option: Option<usize>,
    pub score: usize,
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    phase: QuizPhase,
    selected_option: Option<usize>,
    score: usize,
    answered: usize,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::loading()
    }
}

impl QuizSession {
    pub fn loading() -> Self {
        Self {
            questions: Vec::new(),
            phase: QuizPhase::Loading,
            selected_option: None,
            score: 0,
            answered: 0,
        }
    }

    /// Hands over the generated questions. An empty list moves the session to `Failed`.
    /// Ignored unless the session is still loading.
    pub fn deliver(&mut self, questions: Vec<QuizQuestion>) -> QuizPhase {
        if self.phase != QuizPhase::Loading {
            return self.phase;
        }
        self.phase = if questions.is_empty() {
            QuizPhase::Failed
        } else {
            QuizPhase::InProgress { index: 0, answered: false }
        };
        self.questions = questions;
        self.phase
    }

    pub fn select(&mut self, option: usize) -> Selection {
        let QuizPhase::InProgress { index, answered: false } = self.phase else {
            return Selection::Ignored;
        };
        let question = &self.questions[index];
        if option >= question.options.len() {
            return Selection::Ignored;
        }

        self.selected_option = Some(option);
        self.answered += 1;
        self.phase = QuizPhase::InProgress { index, answered: true };

        if option == question.correct_index {
            self.score += 1;
            Selection::Correct
        } else {
            Selection::Wrong {
                correct_index: question.correct_index,
            }
        }
    }

    pub fn next(&mut self) -> Advance {
        let QuizPhase::InProgress { index, answered: true } = self.phase else {
            return Advance::Ignored;
        };
        self.selected_option = None;
        if index + 1 < self.questions.len() {
            self.phase = QuizPhase::InProgress {
                index: index + 1,
                answered: false,
            };
            Advance::Next { index: index + 1 }
        } else {
            self.phase = QuizPhase::Finished;
            Advance::Finished {
                score: self.score,
                total: self.questions.len(),
            }
        }
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn is_finished(&self) -> bool {
        self.phase == QuizPhase::Finished
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.phase {
            QuizPhase::InProgress { index, .. } => self.questions.get(index),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            phase: self.phase,
            question: self.current_question().cloned(),
            selected_option: self.selected_option,
            score: self.score,
            answered: self.answered,
            total: self.questions.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct_index: usize) -> QuizQuestion {
        QuizQuestion {
            question: "؟".into(),
            options: vec!["أ".into(), "ب".into(), "ج".into()],
            correct_index,
        }
    }

    fn three_questions() -> QuizSession {
        let mut quiz = QuizSession::loading();
        quiz.deliver(vec![question(0), question(1), question(2)]);
        quiz
    }

    #[test]
    fn all_correct_reaches_finished_with_full_score() {
        let mut quiz = three_questions();
        for i in 0..3 {
            assert_eq!(quiz.select(i), Selection::Correct);
            let advance = quiz.next();
            if i < 2 {
                assert_eq!(advance, Advance::Next { index: i + 1 });
            } else {
                assert_eq!(advance, Advance::Finished { score: 3, total: 3 });
            }
        }
        assert_eq!(quiz.score(), 3);
        assert!(quiz.is_finished());
    }

    #[test]
    fn second_selection_is_ignored() {
        let mut quiz = three_questions();
        assert_eq!(quiz.select(0), Selection::Correct);
        assert_eq!(quiz.select(2), Selection::Ignored);
        assert_eq!(quiz.score(), 1);
        assert_eq!(quiz.selected_option(), Some(0));

        let mut wrong_first = three_questions();
        assert_eq!(wrong_first.select(1), Selection::Wrong { correct_index: 0 });
        assert_eq!(wrong_first.select(0), Selection::Ignored);
        assert_eq!(wrong_first.score(), 0);
        assert_eq!(wrong_first.selected_option(), Some(1));
    }

    #[test]
    fn next_requires_an_answer() {
        let mut quiz = three_questions();
        assert_eq!(quiz.next(), Advance::Ignored);
        assert_eq!(quiz.phase(), QuizPhase::InProgress { index: 0, answered: false });
    }

    #[test]
    fn next_resets_selection() {
        let mut quiz = three_questions();
        quiz.select(1);
        quiz.next();
        assert_eq!(quiz.selected_option(), None);
        assert_eq!(quiz.phase(), QuizPhase::InProgress { index: 1, answered: false });
    }

    #[test]
    fn empty_delivery_fails_without_entering_progress() {
        let mut quiz = QuizSession::loading();
        assert_eq!(quiz.deliver(Vec::new()), QuizPhase::Failed);
        assert_eq!(quiz.select(0), Selection::Ignored);
        assert_eq!(quiz.next(), Advance::Ignored);
        assert!(quiz.current_question().is_none());
    }

    #[test]
    fn finished_is_terminal() {
        let mut quiz = QuizSession::loading();
        quiz.deliver(vec![question(1)]);
        quiz.select(0);
        assert_eq!(quiz.next(), Advance::Finished { score: 0, total: 1 });
        assert_eq!(quiz.select(1), Selection::Ignored);
        assert_eq!(quiz.next(), Advance::Ignored);
        assert_eq!(quiz.deliver(vec![question(0)]), QuizPhase::Finished);
        assert_eq!(quiz.score(), 0);
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut quiz = three_questions();
        assert_eq!(quiz.select(7), Selection::Ignored);
        assert_eq!(quiz.phase(), QuizPhase::InProgress { index: 0, answered: false });
    }

    #[test]
    fn score_never_exceeds_answered() {
        let mut quiz = three_questions();
        quiz.select(0);
        quiz.select(0);
        quiz.next();
        quiz.select(0);
        let snap = quiz.snapshot();
        assert!(snap.score <= snap.answered);
        assert_eq!((snap.score, snap.answered, snap.total), (1, 2, 3));
    }
}
