//! Quiz sessions: word selection, answering and scoring.

use crate::catalog::Catalog;
use crate::config::QuizConfig;
use crate::models::{MemoryCard, QuizPack, QuizResult, VocabularyItem};
use crate::quiz::{QuizGenerator, QuizQuestion};
use crate::scheduler::{is_due, rating_for_outcome, SrsAlgorithm};
use crate::store::ProgressStore;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Most recently added words always included in a review quiz.
pub const RECENT_WORDS: usize = 10;

/// Words for a review quiz: due cards (when enabled) followed by the most
/// recently added ones. Each word appears once; unknown ids are skipped.
pub fn gather_quiz_words(
    catalog: &Catalog,
    cards: &[MemoryCard],
    include_review: bool,
    now: DateTime<Utc>,
) -> Vec<VocabularyItem> {
    let mut recent: Vec<&MemoryCard> = cards.iter().collect();
    recent.sort_by(|a, b| b.date_added.cmp(&a.date_added));

    let due = cards.iter().filter(|c| include_review && is_due(c, now));
    let mut seen = HashSet::new();
    due.chain(recent.into_iter().take(RECENT_WORDS))
        .filter(|c| seen.insert(c.item_id.as_str()))
        .filter_map(|c| catalog.word(&c.item_id).cloned())
        .collect()
}

/// Questions in a pack quiz.
pub fn pack_question_count(catalog: &Catalog, pack: &QuizPack, cap: usize) -> usize {
    catalog.pack_words(pack).len().min(cap)
}

/// Build a review quiz over the learner's current words.
pub fn review_quiz<R: Rng>(
    catalog: &Catalog,
    cards: &[MemoryCard],
    config: &QuizConfig,
    rng: R,
    now: DateTime<Utc>,
) -> QuizSession {
    let words = gather_quiz_words(catalog, cards, config.include_review_words, now);
    let questions = QuizGenerator::with_rng(catalog, rng).generate(
        &words,
        &config.question_types,
        config.question_count,
    );
    QuizSession::new(questions)
}

/// Build a quiz over every word in a pack, up to the configured cap.
pub fn pack_quiz<R: Rng>(
    catalog: &Catalog,
    pack: &QuizPack,
    config: &QuizConfig,
    rng: R,
) -> QuizSession {
    let words = catalog.pack_words(pack);
    let count = pack_question_count(catalog, pack, config.pack_question_cap);
    let questions =
        QuizGenerator::with_rng(catalog, rng).generate(&words, &config.question_types, count);
    QuizSession::new(questions)
}

/// Result of answering the current question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub was_correct: bool,
    pub correct_index: usize,
    pub expected_answer: String,
    /// Updated card, if it could be stored.
    pub card: Option<MemoryCard>,
}

/// A running quiz.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current_index: usize,
    current_answered: bool,
    /// Correct answers.
    pub correct: usize,
    /// Incorrect answers.
    pub incorrect: usize,
    answered: Vec<VocabularyItem>,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            current_index: 0,
            current_answered: false,
            correct: 0,
            incorrect: 0,
            answered: Vec::new(),
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_index)
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.questions.len()
    }

    /// Answer the current question and record it.
    ///
    /// Returns `None` when there is no current question or it was already
    /// answered. Store failures are logged and the session continues.
    pub fn answer<S: ProgressStore + ?Sized>(
        &mut self,
        index: usize,
        scheduler: &dyn SrsAlgorithm,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Option<AnswerOutcome> {
        if self.current_answered {
            return None;
        }
        let question = self.questions.get(self.current_index)?;
        let was_correct = question.is_correct(index);
        let item = question.item.clone();
        let result = QuizResult::new(item.id.clone(), question.question_type(), was_correct, now);
        let outcome_base = (question.correct_index, question.expected_answer().to_string());

        self.current_answered = true;
        if was_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }

        if let Err(e) = store.insert_result(&result) {
            warn!(error = %e, item = %item.id, "Failed to record quiz result");
        }
        let card = record_review(scheduler, store, &item.id, was_correct, now);
        self.answered.push(item);

        let (correct_index, expected_answer) = outcome_base;
        Some(AnswerOutcome {
            was_correct,
            correct_index,
            expected_answer,
            card,
        })
    }

    /// Move to the next question. Returns whether one remains.
    pub fn next_question(&mut self) -> bool {
        if !self.is_complete() {
            self.current_index += 1;
            self.current_answered = false;
        }
        !self.is_complete()
    }

    /// Fraction of questions answered.
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.answered.len() as f64 / self.questions.len() as f64
    }

    /// Correct answers as a whole percentage of answered questions.
    pub fn score_percentage(&self) -> u32 {
        let total = self.correct + self.incorrect;
        if total == 0 {
            return 0;
        }
        ((self.correct as f64 / total as f64) * 100.0).round() as u32
    }

    /// Words answered so far, in order.
    pub fn answered_words(&self) -> &[VocabularyItem] {
        &self.answered
    }
}

/// Apply the outcome to the item's card, creating it on first sight.
fn record_review<S: ProgressStore + ?Sized>(
    scheduler: &dyn SrsAlgorithm,
    store: &mut S,
    item_id: &str,
    was_correct: bool,
    now: DateTime<Utc>,
) -> Option<MemoryCard> {
    let card = match store.fetch_card(item_id) {
        Ok(card) => card.unwrap_or_else(|| MemoryCard::new(item_id, now)),
        Err(e) => {
            warn!(error = %e, item = %item_id, "Failed to load card");
            return None;
        }
    };
    let updated = scheduler.review(&card, rating_for_outcome(was_correct), now);
    match store.upsert_card(&updated) {
        Ok(()) => {
            debug!(item = %item_id, due = ?updated.next_review, "Card updated");
            Some(updated)
        }
        Err(e) => {
            warn!(error = %e, item = %item_id, "Failed to save card");
            None
        }
    }
}
