//! Quiz generation.
//!
//! Words are shuffled and assigned question types cyclically in a stable
//! type order, so a mixed quiz covers each requested type in proportion.
//! The finished list is shuffled again before it is returned.

use crate::catalog::Catalog;
use crate::models::{QuestionType, VocabularyItem};
use rand::rngs::ThreadRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// Distractors shown alongside the correct option.
pub const DISTRACTOR_COUNT: usize = 3;
/// True/false option labels.
pub const AFFIRMATIVE: &str = "Āe";
pub const NEGATIVE: &str = "Kāo";

/// Type-specific question content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Target-language prompt; options are translations.
    DirectChoice { prompt: String },
    /// Translation prompt; options are target-language text.
    ReverseChoice { prompt: String },
    /// Is `shown_translation` the meaning of the word?
    TrueFalse {
        shown_translation: String,
        pairing_correct: bool,
    },
    /// Audio-only prompt; options are translations.
    ListenChoose { audio: String },
    /// Proverb with a blank; options are target-language text.
    ProverbCloze {
        proverb_id: String,
        blanked_text: String,
        full_text: String,
        prompt_audio: String,
        reveal_audio: String,
        subtitle: String,
    },
    /// Audio-only example sentence; options are target-language text.
    SentenceListening {
        audio: String,
        sentence: String,
        sentence_translation: Option<String>,
    },
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::DirectChoice { .. } => QuestionType::DirectChoice,
            Self::ReverseChoice { .. } => QuestionType::ReverseChoice,
            Self::TrueFalse { .. } => QuestionType::TrueFalse,
            Self::ListenChoose { .. } => QuestionType::ListenChoose,
            Self::ProverbCloze { .. } => QuestionType::ProverbCloze,
            Self::SentenceListening { .. } => QuestionType::SentenceListening,
        }
    }
}

/// A generated question. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub id: Uuid,
    /// Word being tested.
    pub item: VocabularyItem,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl QuizQuestion {
    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    /// Text shown before answering. Audio-only prompts show nothing.
    pub fn prompt_text(&self) -> Option<String> {
        match &self.kind {
            QuestionKind::DirectChoice { prompt } | QuestionKind::ReverseChoice { prompt } => {
                Some(prompt.clone())
            }
            QuestionKind::TrueFalse {
                shown_translation, ..
            } => Some(format!("{} = {}", self.item.text, shown_translation)),
            QuestionKind::ProverbCloze { blanked_text, .. } => Some(blanked_text.clone()),
            QuestionKind::ListenChoose { .. } | QuestionKind::SentenceListening { .. } => None,
        }
    }

    /// Audio played as the prompt.
    pub fn prompt_audio(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::ListenChoose { audio }
            | QuestionKind::SentenceListening { audio, .. } => Some(audio),
            QuestionKind::ProverbCloze { prompt_audio, .. } => Some(prompt_audio),
            _ => None,
        }
    }

    /// Text revealed once the question is answered.
    pub fn subtitle(&self) -> Option<String> {
        match &self.kind {
            QuestionKind::ProverbCloze { subtitle, .. } => Some(subtitle.clone()),
            QuestionKind::SentenceListening {
                sentence,
                sentence_translation,
                ..
            } => Some(match sentence_translation {
                Some(translation) => format!("{}\n{}", sentence, translation),
                None => sentence.clone(),
            }),
            _ => None,
        }
    }

    /// The option text that counts as correct.
    pub fn expected_answer(&self) -> &str {
        match &self.kind {
            QuestionKind::DirectChoice { .. } | QuestionKind::ListenChoose { .. } => {
                &self.item.translation
            }
            QuestionKind::ReverseChoice { .. }
            | QuestionKind::ProverbCloze { .. }
            | QuestionKind::SentenceListening { .. } => &self.item.text,
            QuestionKind::TrueFalse {
                pairing_correct, ..
            } => {
                if *pairing_correct {
                    AFFIRMATIVE
                } else {
                    NEGATIVE
                }
            }
        }
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

/// Builds quizzes from the catalog with an injectable random source.
pub struct QuizGenerator<'a, R = ThreadRng> {
    catalog: &'a Catalog,
    rng: R,
}

impl<'a> QuizGenerator<'a, ThreadRng> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self::with_rng(catalog, rand::rng())
    }
}

impl<'a, R: Rng> QuizGenerator<'a, R> {
    pub fn with_rng(catalog: &'a Catalog, rng: R) -> Self {
        Self { catalog, rng }
    }

    /// Types that can actually be asked for these words.
    pub fn feasible_types(
        &self,
        words: &[VocabularyItem],
        types: &[QuestionType],
    ) -> BTreeSet<QuestionType> {
        types
            .iter()
            .copied()
            .filter(|t| match t {
                QuestionType::ListenChoose => words.iter().any(VocabularyItem::has_audio),
                QuestionType::SentenceListening => {
                    words.iter().any(VocabularyItem::has_sentence_audio)
                }
                QuestionType::ProverbCloze => !self.catalog.proverbs().is_empty(),
                _ => true,
            })
            .collect()
    }

    /// Generate up to `min(count, words.len())` questions.
    pub fn generate(
        &mut self,
        words: &[VocabularyItem],
        types: &[QuestionType],
        count: usize,
    ) -> Vec<QuizQuestion> {
        if words.is_empty() || types.is_empty() {
            return Vec::new();
        }

        let sorted: Vec<QuestionType> = self.feasible_types(words, types).into_iter().collect();
        if sorted.is_empty() {
            debug!(requested = types.len(), "No feasible question types");
            return Vec::new();
        }

        let mut shuffled: Vec<&VocabularyItem> = words.iter().collect();
        shuffled.shuffle(&mut self.rng);

        let mut questions: Vec<QuizQuestion> = shuffled
            .into_iter()
            .take(count)
            .enumerate()
            .filter_map(|(i, word)| self.question(word, sorted[i % sorted.len()]))
            .collect();

        questions.shuffle(&mut self.rng);
        debug!(
            questions = questions.len(),
            types = ?sorted,
            "Quiz generated"
        );
        questions
    }

    /// Build one question. `None` means the word is skipped.
    pub fn question(
        &mut self,
        word: &VocabularyItem,
        question_type: QuestionType,
    ) -> Option<QuizQuestion> {
        match question_type {
            QuestionType::DirectChoice => Some(self.direct_choice(word)),
            QuestionType::ReverseChoice => Some(self.reverse_choice(word)),
            QuestionType::TrueFalse => Some(self.true_false(word)),
            QuestionType::ListenChoose => self.listen_choose(word),
            QuestionType::ProverbCloze => Some(self.proverb_cloze(word)),
            QuestionType::SentenceListening => Some(self.sentence_listening(word)),
        }
    }

    /// Shuffle the correct option in with distractors and locate it again.
    fn options(
        &mut self,
        word: &VocabularyItem,
        field: fn(&VocabularyItem) -> &str,
    ) -> (Vec<String>, usize) {
        let correct = field(word).to_string();
        let mut options: Vec<String> = self
            .catalog
            .distractors_by(word, DISTRACTOR_COUNT, field, &mut self.rng)
            .into_iter()
            .map(|d| field(d).to_string())
            .collect();
        options.push(correct.clone());
        options.shuffle(&mut self.rng);
        let index = options.iter().position(|o| *o == correct).unwrap_or(0);
        (options, index)
    }

    fn build(
        &mut self,
        word: &VocabularyItem,
        kind: QuestionKind,
        field: fn(&VocabularyItem) -> &str,
    ) -> QuizQuestion {
        let (options, correct_index) = self.options(word, field);
        QuizQuestion {
            id: Uuid::new_v4(),
            item: word.clone(),
            kind,
            options,
            correct_index,
        }
    }

    fn direct_choice(&mut self, word: &VocabularyItem) -> QuizQuestion {
        let kind = QuestionKind::DirectChoice {
            prompt: word.text.clone(),
        };
        self.build(word, kind, translation)
    }

    fn reverse_choice(&mut self, word: &VocabularyItem) -> QuizQuestion {
        let kind = QuestionKind::ReverseChoice {
            prompt: word.translation.clone(),
        };
        self.build(word, kind, native)
    }

    fn true_false(&mut self, word: &VocabularyItem) -> QuizQuestion {
        let mut pairing_correct = self.rng.random_bool(0.5);
        let shown_translation = if pairing_correct {
            word.translation.clone()
        } else {
            match self.catalog.distractors_by(word, 1, translation, &mut self.rng).first() {
                Some(d) => d.translation.clone(),
                // Every other word shares the translation.
                None => {
                    pairing_correct = true;
                    word.translation.clone()
                }
            }
        };

        QuizQuestion {
            id: Uuid::new_v4(),
            item: word.clone(),
            kind: QuestionKind::TrueFalse {
                shown_translation,
                pairing_correct,
            },
            options: vec![AFFIRMATIVE.to_string(), NEGATIVE.to_string()],
            correct_index: if pairing_correct { 0 } else { 1 },
        }
    }

    fn listen_choose(&mut self, word: &VocabularyItem) -> Option<QuizQuestion> {
        let audio = word.audio_file.clone()?;
        Some(self.build(word, QuestionKind::ListenChoose { audio }, translation))
    }

    fn proverb_cloze(&mut self, word: &VocabularyItem) -> QuizQuestion {
        let catalog = self.catalog;
        let proverb = match catalog.proverb_for_word(&word.id) {
            Some(p) => Some(p),
            None => catalog.proverbs().choose(&mut self.rng),
        };
        let target = proverb.and_then(|p| catalog.word(&p.target_word_id).map(|w| (p, w)));

        match target {
            Some((proverb, target)) => {
                let kind = QuestionKind::ProverbCloze {
                    proverb_id: proverb.id.clone(),
                    blanked_text: proverb.blanked_text.clone(),
                    full_text: proverb.text.clone(),
                    prompt_audio: proverb.blanked_audio_file(),
                    reveal_audio: proverb.full_audio_file(),
                    subtitle: proverb.translation.clone(),
                };
                self.build(target, kind, native)
            }
            None => {
                warn!(item = %word.id, "No usable proverb, falling back to direct choice");
                self.direct_choice(word)
            }
        }
    }

    fn sentence_listening(&mut self, word: &VocabularyItem) -> QuizQuestion {
        match (&word.sentence_audio_file, &word.example_sentence) {
            (Some(audio), Some(sentence)) => {
                let kind = QuestionKind::SentenceListening {
                    audio: audio.clone(),
                    sentence: sentence.clone(),
                    sentence_translation: word.example_translation.clone(),
                };
                self.build(word, kind, native)
            }
            _ => {
                debug!(item = %word.id, "No sentence audio, falling back to direct choice");
                self.direct_choice(word)
            }
        }
    }
}

fn native(item: &VocabularyItem) -> &str {
    &item.text
}

fn translation(item: &VocabularyItem) -> &str {
    &item.translation
}

/// Generate a quiz with a thread-local random source.
pub fn generate_quiz(
    catalog: &Catalog,
    words: &[VocabularyItem],
    types: &[QuestionType],
    count: usize,
) -> Vec<QuizQuestion> {
    QuizGenerator::new(catalog).generate(words, types, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{proverb, small_catalog, topic, word};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn seeded(catalog: &Catalog, seed: u64) -> QuizGenerator<'_, StdRng> {
        QuizGenerator::with_rng(catalog, StdRng::seed_from_u64(seed))
    }

    fn rich_catalog() -> Catalog {
        let mut words = Vec::new();
        for i in 0..12 {
            let topic = if i % 2 == 0 { "kai" } else { "tae" };
            let mut w = word(&format!("w{}", i), topic, (i % 3 + 1) as u8);
            if i % 3 == 0 {
                w = w.with_audio(format!("w{}.m4a", i));
            }
            if i % 4 == 0 {
                w = w.with_sentence(
                    format!("sentence {}", i),
                    format!("translation {}", i),
                    format!("s{}.m4a", i),
                );
            }
            words.push(w);
        }
        Catalog::new(
            words,
            vec![topic("kai", 0), topic("tae", 1)],
            Vec::new(),
            vec![proverb("p1", "w1"), proverb("p2", "w5")],
        )
    }

    #[test]
    fn test_empty_inputs() {
        let catalog = small_catalog();
        let mut generator = seeded(&catalog, 1);
        assert!(generator.generate(&[], &QuestionType::ALL, 5).is_empty());
        assert!(generator.generate(catalog.words(), &[], 5).is_empty());
    }

    #[test]
    fn test_infeasible_types_yield_nothing() {
        let catalog = small_catalog();
        let mut generator = seeded(&catalog, 1);
        let types = [
            QuestionType::ListenChoose,
            QuestionType::SentenceListening,
            QuestionType::ProverbCloze,
        ];
        assert!(generator.generate(catalog.words(), &types, 3).is_empty());
    }

    #[test]
    fn test_direct_choice_scenario() {
        let catalog = small_catalog();
        let mut generator = seeded(&catalog, 42);
        let questions = generator.generate(catalog.words(), &[QuestionType::DirectChoice], 3);
        assert_eq!(questions.len(), 3);

        let items: HashSet<&str> = questions.iter().map(|q| q.item.id.as_str()).collect();
        assert_eq!(items.len(), 3);
        for q in &questions {
            assert_eq!(q.options.len(), 3);
            assert_eq!(q.options[q.correct_index], q.item.translation);
            assert_eq!(q.prompt_text().as_deref(), Some(q.item.text.as_str()));
            let unique: HashSet<&String> = q.options.iter().collect();
            assert_eq!(unique.len(), q.options.len());
        }
    }

    #[test]
    fn test_four_options_with_enough_words() {
        let catalog = rich_catalog();
        let mut generator = seeded(&catalog, 3);
        let types = [QuestionType::DirectChoice, QuestionType::ReverseChoice];
        let questions = generator.generate(catalog.words(), &types, 8);
        assert_eq!(questions.len(), 8);
        for q in &questions {
            assert_eq!(q.options.len(), DISTRACTOR_COUNT + 1);
            assert_eq!(q.options[q.correct_index], q.expected_answer());
        }
        let reverse: Vec<_> = questions
            .iter()
            .filter(|q| q.question_type() == QuestionType::ReverseChoice)
            .collect();
        assert_eq!(reverse.len(), 4);
        assert!(reverse.iter().all(|q| q.options[q.correct_index] == q.item.text));
    }

    #[test]
    fn test_true_false() {
        let catalog = rich_catalog();
        let mut generator = seeded(&catalog, 9);
        let questions = generator.generate(catalog.words(), &[QuestionType::TrueFalse], 12);
        assert_eq!(questions.len(), 12);
        let mut saw = HashSet::new();
        for q in &questions {
            assert_eq!(q.options, vec![AFFIRMATIVE.to_string(), NEGATIVE.to_string()]);
            let QuestionKind::TrueFalse { shown_translation, pairing_correct } = &q.kind else {
                panic!("expected true/false question");
            };
            assert_eq!(*pairing_correct, *shown_translation == q.item.translation);
            assert_eq!(q.correct_index, if *pairing_correct { 0 } else { 1 });
            saw.insert(*pairing_correct);
        }
        assert_eq!(saw.len(), 2);
    }

    #[test]
    fn test_synonyms_never_duplicate_options() {
        let words = vec![
            VocabularyItem::new("nui", "nui", "big", "t", 1),
            VocabularyItem::new("rahi", "rahi", "big", "t", 1),
            word("c", "t", 1),
            word("d", "t", 1),
        ];
        let catalog = Catalog::new(words, Vec::new(), Vec::new(), Vec::new());
        let nui = catalog.word("nui").unwrap().clone();
        for seed in 0..50 {
            let mut generator = seeded(&catalog, seed);
            let q = generator.question(&nui, QuestionType::DirectChoice).unwrap();
            assert_eq!(q.options.len(), 3);
            assert_eq!(q.options.iter().filter(|o| *o == "big").count(), 1);
            assert_eq!(q.options[q.correct_index], "big");
        }
    }

    #[test]
    fn test_true_false_with_only_synonyms_shows_correct_pairing() {
        let words = vec![
            VocabularyItem::new("nui", "nui", "big", "t", 1),
            VocabularyItem::new("rahi", "rahi", "big", "t", 1),
        ];
        let catalog = Catalog::new(words, Vec::new(), Vec::new(), Vec::new());
        let nui = catalog.word("nui").unwrap().clone();
        for seed in 0..20 {
            let mut generator = seeded(&catalog, seed);
            let q = generator.question(&nui, QuestionType::TrueFalse).unwrap();
            assert!(matches!(q.kind, QuestionKind::TrueFalse { pairing_correct: true, .. }));
            assert_eq!(q.correct_index, 0);
        }
    }

    #[test]
    fn test_listen_choose_skips_words_without_audio() {
        let catalog = rich_catalog();
        let mut generator = seeded(&catalog, 5);
        let questions = generator.generate(catalog.words(), &[QuestionType::ListenChoose], 12);
        assert_eq!(questions.len(), 4);
        for q in &questions {
            assert!(q.prompt_text().is_none());
            assert_eq!(q.prompt_audio(), q.item.audio_file.as_deref());
            assert_eq!(q.options[q.correct_index], q.item.translation);
        }
    }

    #[test]
    fn test_sentence_listening_degrades_to_direct_choice() {
        let catalog = rich_catalog();
        let mut generator = seeded(&catalog, 11);
        let questions = generator.generate(catalog.words(), &[QuestionType::SentenceListening], 12);
        assert_eq!(questions.len(), 12);
        let listening: Vec<_> = questions
            .iter()
            .filter(|q| q.question_type() == QuestionType::SentenceListening)
            .collect();
        assert_eq!(listening.len(), 3);
        for q in &listening {
            assert_eq!(q.options[q.correct_index], q.item.text);
            assert!(q.prompt_text().is_none());
            assert!(q.subtitle().unwrap().contains("translation"));
        }
        assert!(questions
            .iter()
            .filter(|q| q.question_type() != QuestionType::SentenceListening)
            .all(|q| q.question_type() == QuestionType::DirectChoice));
    }

    #[test]
    fn test_proverb_cloze_targets_proverb_word() {
        let catalog = rich_catalog();
        let mut generator = seeded(&catalog, 13);
        let questions = generator.generate(catalog.words(), &[QuestionType::ProverbCloze], 6);
        assert_eq!(questions.len(), 6);
        for q in &questions {
            let QuestionKind::ProverbCloze {
                proverb_id,
                prompt_audio,
                reveal_audio,
                subtitle,
                ..
            } = &q.kind
            else {
                panic!("expected proverb question");
            };
            let proverb = catalog.proverbs().iter().find(|p| &p.id == proverb_id).unwrap();
            assert_eq!(q.item.id, proverb.target_word_id);
            assert_eq!(*prompt_audio, proverb.blanked_audio_file());
            assert_eq!(*reveal_audio, proverb.full_audio_file());
            assert_eq!(*subtitle, proverb.translation);
            assert_eq!(q.options[q.correct_index], q.item.text);
        }
    }

    #[test]
    fn test_proverb_for_assigned_word_is_used() {
        let catalog = rich_catalog();
        let mut generator = seeded(&catalog, 2);
        let w5 = catalog.word("w5").unwrap().clone();
        let q = generator.question(&w5, QuestionType::ProverbCloze).unwrap();
        assert_eq!(q.item.id, "w5");
        assert!(matches!(
            q.kind,
            QuestionKind::ProverbCloze { ref proverb_id, .. } if proverb_id == "p2"
        ));
    }

    #[test]
    fn test_proverb_with_unknown_target_degrades() {
        let catalog = Catalog::new(
            vec![word("a", "t", 1), word("b", "t", 1)],
            Vec::new(),
            Vec::new(),
            vec![proverb("p", "ghost")],
        );
        let mut generator = seeded(&catalog, 4);
        let questions = generator.generate(catalog.words(), &[QuestionType::ProverbCloze], 2);
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.question_type() == QuestionType::DirectChoice));
    }

    #[test]
    fn test_mixed_types_interleave() {
        let catalog = rich_catalog();
        let mut generator = seeded(&catalog, 21);
        let types = [
            QuestionType::TrueFalse,
            QuestionType::DirectChoice,
            QuestionType::ReverseChoice,
        ];
        let questions = generator.generate(catalog.words(), &types, 9);
        assert_eq!(questions.len(), 9);
        for t in types {
            assert_eq!(questions.iter().filter(|q| q.question_type() == t).count(), 3);
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let catalog = rich_catalog();
        let a = seeded(&catalog, 77).generate(catalog.words(), &QuestionType::ALL, 10);
        let b = seeded(&catalog, 77).generate(catalog.words(), &QuestionType::ALL, 10);
        let strip = |qs: &[QuizQuestion]| -> Vec<(String, Vec<String>, usize)> {
            qs.iter().map(|q| (q.item.id.clone(), q.options.clone(), q.correct_index)).collect()
        };
        assert_eq!(strip(&a), strip(&b));
    }

    fn arb_types() -> impl Strategy<Value = Vec<QuestionType>> {
        prop::sample::subsequence(QuestionType::ALL.to_vec(), 0..=6)
    }

    proptest! {
        #[test]
        fn prop_correct_index_points_at_expected_answer(
            seed in any::<u64>(),
            types in arb_types(),
            count in 0usize..20,
            take in 0usize..12,
        ) {
            let catalog = rich_catalog();
            let words = &catalog.words()[..take];
            let mut generator = seeded(&catalog, seed);
            let questions = generator.generate(words, &types, count);
            prop_assert!(questions.len() <= count.min(words.len()));
            for q in &questions {
                prop_assert!(q.correct_index < q.options.len());
                prop_assert_eq!(q.options[q.correct_index].as_str(), q.expected_answer());
            }
        }
    }
}
