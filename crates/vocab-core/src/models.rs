//! Data models for vocabulary learning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifiers for static content.
pub type ItemId = String;
pub type TopicId = String;
pub type ResultId = Uuid;

/// A vocabulary item from the static word list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    /// Unique identifier.
    pub id: ItemId,
    /// Target-language text.
    #[serde(alias = "teReo")]
    pub text: String,
    /// Primary translation.
    #[serde(alias = "english")]
    pub translation: String,
    /// Other accepted translations.
    #[serde(default)]
    pub alternative_translations: Vec<String>,
    /// Part of speech.
    #[serde(default)]
    pub part_of_speech: String,
    /// Example sentence in the target language.
    #[serde(default)]
    pub example_sentence: Option<String>,
    /// Translation of the example sentence.
    #[serde(default)]
    pub example_translation: Option<String>,
    /// Audio file for the word.
    #[serde(default, alias = "audioFileName")]
    pub audio_file: Option<String>,
    /// Audio file for the example sentence.
    #[serde(default, alias = "sentenceAudioFileName")]
    pub sentence_audio_file: Option<String>,
    /// Usage notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Plural form, where it differs.
    #[serde(default)]
    pub plural_form: Option<String>,
    /// Owning topic.
    pub topic: TopicId,
    /// Difficulty tier (1-3).
    pub difficulty: u8,
}

impl VocabularyItem {
    /// Create a minimal item.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        translation: impl Into<String>,
        topic: impl Into<String>,
        difficulty: u8,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            translation: translation.into(),
            alternative_translations: Vec::new(),
            part_of_speech: String::new(),
            example_sentence: None,
            example_translation: None,
            audio_file: None,
            sentence_audio_file: None,
            notes: None,
            plural_form: None,
            topic: topic.into(),
            difficulty,
        }
    }

    /// Set word audio.
    pub fn with_audio(mut self, file: impl Into<String>) -> Self {
        self.audio_file = Some(file.into());
        self
    }

    /// Set example sentence, its translation and its audio.
    pub fn with_sentence(
        mut self,
        sentence: impl Into<String>,
        translation: impl Into<String>,
        audio: impl Into<String>,
    ) -> Self {
        self.example_sentence = Some(sentence.into());
        self.example_translation = Some(translation.into());
        self.sentence_audio_file = Some(audio.into());
        self
    }

    /// Whether a listening question can be asked for this word.
    pub fn has_audio(&self) -> bool {
        self.audio_file.is_some()
    }

    /// Whether a sentence listening question can be asked for this word.
    pub fn has_sentence_audio(&self) -> bool {
        self.sentence_audio_file.is_some() && self.example_sentence.is_some()
    }
}

/// A topic grouping vocabulary items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    #[serde(alias = "teReo")]
    pub text: String,
    #[serde(alias = "english")]
    pub translation: String,
    #[serde(default)]
    pub icon_name: String,
    /// Colour hint for the front end.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// A proverb with one word blanked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proverb {
    pub id: String,
    /// Full proverb text.
    #[serde(alias = "teReo")]
    pub text: String,
    #[serde(alias = "english")]
    pub translation: String,
    /// Proverb text with the target word omitted.
    pub blanked_text: String,
    /// Vocabulary item that fills the blank.
    pub target_word_id: ItemId,
}

impl Proverb {
    /// Audio of the proverb with a pause in place of the target word.
    pub fn blanked_audio_file(&self) -> String {
        format!("{}-blanked.m4a", self.id)
    }

    /// Audio of the complete proverb.
    pub fn full_audio_file(&self) -> String {
        format!("{}.m4a", self.id)
    }
}

/// A curated quiz pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizPack {
    pub id: String,
    #[serde(alias = "teReo")]
    pub text: String,
    #[serde(alias = "english")]
    pub translation: String,
    pub category: String,
    #[serde(default, alias = "categoryTeReo")]
    pub category_text: String,
    #[serde(default, alias = "categoryEnglish")]
    pub category_translation: String,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default)]
    pub sort_order: i32,
    /// Ordered item ids.
    #[serde(default)]
    pub word_ids: Vec<ItemId>,
}

/// Card state in the learning process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    /// Never reviewed.
    #[default]
    New,
    /// In initial learning phase.
    Learning,
    /// In regular review.
    Review,
    /// Failed review, relearning.
    Relearning,
}

impl CardState {
    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Learning => "Learning",
            Self::Review => "Review",
            Self::Relearning => "Relearning",
        }
    }

    /// Storage tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Relearning => "relearning",
        }
    }

    /// Parse a storage tag. Unknown tags fall back to `New`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "learning" => Self::Learning,
            "review" => Self::Review,
            "relearning" => Self::Relearning,
            _ => Self::New,
        }
    }
}

/// Recall quality reported for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// Complete failure, need to see again soon.
    Again,
    /// Difficult recall.
    Hard,
    /// Normal recall.
    Good,
    /// Effortless recall.
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

    /// Rating derived from a binary quiz outcome.
    pub fn from_outcome(was_correct: bool) -> Self {
        if was_correct {
            Self::Good
        } else {
            Self::Again
        }
    }

    /// Rating from a 1-4 grade. Out-of-range grades are clamped.
    pub fn from_grade(grade: i64) -> Self {
        match grade {
            i64::MIN..=1 => Self::Again,
            2 => Self::Hard,
            3 => Self::Good,
            _ => Self::Easy,
        }
    }

    /// Numeric grade (1-4).
    pub fn grade(&self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Again => "Again",
            Self::Hard => "Hard",
            Self::Good => "Good",
            Self::Easy => "Easy",
        }
    }
}

/// Per-item memory state driving the review schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryCard {
    /// Vocabulary item this card tracks.
    pub item_id: ItemId,
    /// Memory stability in days.
    pub stability: f64,
    /// Intrinsic item difficulty.
    pub difficulty: f64,
    /// Days between the last two reviews.
    pub elapsed_days: u32,
    /// Interval chosen at the last review.
    pub scheduled_days: u32,
    /// Number of reviews.
    pub repetitions: u32,
    /// Number of lapses (failed reviews after graduating).
    pub lapses: u32,
    pub last_review: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    pub state: CardState,
    /// When the learner added the word.
    pub date_added: DateTime<Utc>,
}

/// Difficulty seed for cards that have never been reviewed.
pub const INITIAL_DIFFICULTY: f64 = 0.3;

impl MemoryCard {
    /// Create a fresh card for an item.
    pub fn new(item_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.into(),
            stability: 0.0,
            difficulty: INITIAL_DIFFICULTY,
            elapsed_days: 0,
            scheduled_days: 0,
            repetitions: 0,
            lapses: 0,
            last_review: None,
            next_review: None,
            state: CardState::New,
            date_added: now,
        }
    }

    /// Whether the card has been reviewed at least once.
    pub fn is_learned(&self) -> bool {
        self.repetitions > 0
    }
}

/// Question types offered by the quiz generator.
///
/// Declaration order is the stable ordering used when interleaving
/// types across a quiz.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Target-language prompt, pick the translation.
    DirectChoice,
    /// Translation prompt, pick the target-language text.
    ReverseChoice,
    /// Is the displayed pairing correct?
    TrueFalse,
    /// Hear the word, pick the translation.
    ListenChoose,
    /// Fill the blank in a proverb.
    ProverbCloze,
    /// Hear an example sentence, pick the word it uses.
    SentenceListening,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        Self::DirectChoice,
        Self::ReverseChoice,
        Self::TrueFalse,
        Self::ListenChoose,
        Self::ProverbCloze,
        Self::SentenceListening,
    ];

    /// Stable numeric code used in storage.
    pub fn code(&self) -> u8 {
        match self {
            Self::DirectChoice => 0,
            Self::ReverseChoice => 1,
            Self::TrueFalse => 2,
            Self::ListenChoose => 3,
            Self::ProverbCloze => 4,
            Self::SentenceListening => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| i64::from(t.code()) == code)
    }

    /// Snake-case tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectChoice => "direct_choice",
            Self::ReverseChoice => "reverse_choice",
            Self::TrueFalse => "true_false",
            Self::ListenChoose => "listen_choose",
            Self::ProverbCloze => "proverb_cloze",
            Self::SentenceListening => "sentence_listening",
        }
    }

    /// Display name in the target language.
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::DirectChoice => "Kōwhiri Maha",
            Self::ReverseChoice => "Kōwhiri Whakamuri",
            Self::TrueFalse => "Āe, Kāo",
            Self::ListenChoose => "Whakarongo, Kōwhiri",
            Self::ProverbCloze => "Whakataukī",
            Self::SentenceListening => "Whakarongo ki te Rerenga",
        }
    }

    /// Display name in English.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DirectChoice => "Multiple Choice",
            Self::ReverseChoice => "Reverse Choice",
            Self::TrueFalse => "True or False",
            Self::ListenChoose => "Listen & Choose",
            Self::ProverbCloze => "Proverb Cloze",
            Self::SentenceListening => "Sentence Listening",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown question type names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown question type: {0}")]
pub struct UnknownQuestionType(pub String);

impl FromStr for QuestionType {
    type Err = UnknownQuestionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownQuestionType(s.to_string()))
    }
}

/// An answered quiz question. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: ResultId,
    pub item_id: ItemId,
    pub quiz_type: QuestionType,
    pub was_correct: bool,
    pub timestamp: DateTime<Utc>,
}

impl QuizResult {
    /// Create a new result.
    pub fn new(
        item_id: impl Into<String>,
        quiz_type: QuestionType,
        was_correct: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id: item_id.into(),
            quiz_type,
            was_correct,
            timestamp,
        }
    }
}

/// Per-learner batch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerSettings {
    /// Words introduced per batch.
    pub words_per_batch: u32,
    /// Days before the next batch is introduced.
    pub batch_interval_days: u32,
    /// Whether due review words join quizzes.
    pub include_review_words: bool,
    /// When the current batch started.
    pub batch_started_at: DateTime<Utc>,
}

impl LearnerSettings {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            words_per_batch: 10,
            batch_interval_days: 7,
            include_review_words: true,
            batch_started_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_deserializes_original_keys() {
        let json = r#"{
            "id": "kuri",
            "teReo": "kurī",
            "english": "dog",
            "alternativeTranslations": ["hound"],
            "partOfSpeech": "noun",
            "audioFileName": "kuri.m4a",
            "topic": "kararehe",
            "difficulty": 1
        }"#;
        let item: VocabularyItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.text, "kurī");
        assert_eq!(item.translation, "dog");
        assert_eq!(item.audio_file.as_deref(), Some("kuri.m4a"));
        assert!(item.sentence_audio_file.is_none());
        assert!(item.has_audio());
        assert!(!item.has_sentence_audio());
    }

    #[test]
    fn test_rating_from_grade_clamps() {
        assert_eq!(Rating::from_grade(-4), Rating::Again);
        assert_eq!(Rating::from_grade(3), Rating::Good);
        assert_eq!(Rating::from_grade(99), Rating::Easy);
        assert_eq!(Rating::from_outcome(true), Rating::Good);
        assert_eq!(Rating::from_outcome(false), Rating::Again);
    }

    #[test]
    fn test_question_type_codes_and_names() {
        for t in QuestionType::ALL {
            assert_eq!(QuestionType::from_code(t.code() as i64), Some(t));
            assert_eq!(t.as_str().parse::<QuestionType>().unwrap(), t);
        }
        assert_eq!("listen-choose".parse::<QuestionType>().unwrap(), QuestionType::ListenChoose);
        assert!("essay".parse::<QuestionType>().is_err());
        assert!(QuestionType::DirectChoice < QuestionType::SentenceListening);
    }

    #[test]
    fn test_new_card() {
        let card = MemoryCard::new("kuri", Utc::now());
        assert_eq!(card.state, CardState::New);
        assert!(card.next_review.is_none());
        assert!(!card.is_learned());
    }

    #[test]
    fn test_proverb_audio_names() {
        let proverb = Proverb {
            id: "w1".into(),
            text: "Nāu te rourou".into(),
            translation: "With your food basket".into(),
            blanked_text: "Nāu te ___".into(),
            target_word_id: "rourou".into(),
        };
        assert_eq!(proverb.blanked_audio_file(), "w1-blanked.m4a");
        assert_eq!(proverb.full_audio_file(), "w1.m4a");
    }
}
