//! Static content catalog: words, topics, quiz packs and proverbs.

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Proverb, QuizPack, Topic, VocabularyItem};
use crate::text;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// File names expected inside a content directory.
pub const WORDS_FILE: &str = "words.json";
pub const TOPICS_FILE: &str = "topics.json";
pub const PACKS_FILE: &str = "packs.json";
pub const PROVERBS_FILE: &str = "proverbs.json";

/// Quiz packs sharing a category.
#[derive(Debug, Clone)]
pub struct PackCategory<'a> {
    pub category: &'a str,
    pub text: &'a str,
    pub translation: &'a str,
    /// Packs ordered by sort order.
    pub packs: Vec<&'a QuizPack>,
}

/// A reference problem found by [`Catalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// Word references a topic that does not exist.
    UnknownTopic { word_id: String, topic: String },
    /// Pack lists a word that does not exist.
    UnknownPackWord { pack_id: String, word_id: String },
    /// Proverb targets a word that does not exist.
    UnknownProverbTarget { proverb_id: String, word_id: String },
    /// The same word id appears more than once.
    DuplicateWord { word_id: String },
    /// Difficulty tier outside 1..=3.
    DifficultyOutOfRange { word_id: String, difficulty: u8 },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTopic { word_id, topic } => {
                write!(f, "word '{}' references unknown topic '{}'", word_id, topic)
            }
            Self::UnknownPackWord { pack_id, word_id } => {
                write!(f, "pack '{}' lists unknown word '{}'", pack_id, word_id)
            }
            Self::UnknownProverbTarget { proverb_id, word_id } => {
                write!(f, "proverb '{}' targets unknown word '{}'", proverb_id, word_id)
            }
            Self::DuplicateWord { word_id } => write!(f, "duplicate word id '{}'", word_id),
            Self::DifficultyOutOfRange { word_id, difficulty } => {
                write!(f, "word '{}' has difficulty {} (expected 1-3)", word_id, difficulty)
            }
        }
    }
}

/// Read-only content catalog. Built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    words: Vec<VocabularyItem>,
    topics: Vec<Topic>,
    packs: Vec<QuizPack>,
    proverbs: Vec<Proverb>,
    by_id: HashMap<String, usize>,
    by_topic: HashMap<String, Vec<usize>>,
    proverb_by_word: HashMap<String, usize>,
}

/// Parse one dataset as a JSON array of records.
pub fn parse_dataset<T: DeserializeOwned>(
    dataset: &'static str,
    json: &str,
) -> CatalogResult<Vec<T>> {
    serde_json::from_str(json).map_err(|source| CatalogError::Json { dataset, source })
}

/// Read and parse one dataset file.
pub fn read_dataset<T: DeserializeOwned>(
    path: &Path,
    dataset: &'static str,
) -> CatalogResult<Vec<T>> {
    let content = std::fs::read_to_string(path)?;
    parse_dataset(dataset, &content)
}

fn item_id(word: &VocabularyItem) -> &str {
    &word.id
}

/// Log a failed dataset and fall back to an empty list.
fn or_empty<T>(dataset: &'static str, result: CatalogResult<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, dataset, "Dataset failed to load, using empty list");
        Vec::new()
    })
}

impl Catalog {
    /// Build a catalog from already-parsed datasets.
    pub fn new(
        words: Vec<VocabularyItem>,
        mut topics: Vec<Topic>,
        packs: Vec<QuizPack>,
        proverbs: Vec<Proverb>,
    ) -> Self {
        topics.sort_by_key(|t| t.sort_order);

        let mut by_id = HashMap::new();
        let mut by_topic: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, word) in words.iter().enumerate() {
            by_id.entry(word.id.clone()).or_insert(idx);
            by_topic.entry(word.topic.clone()).or_default().push(idx);
        }

        let mut proverb_by_word = HashMap::new();
        for (idx, proverb) in proverbs.iter().enumerate() {
            proverb_by_word.entry(proverb.target_word_id.clone()).or_insert(idx);
        }

        debug!(
            words = words.len(),
            topics = topics.len(),
            packs = packs.len(),
            proverbs = proverbs.len(),
            "Catalog built"
        );

        Self {
            words,
            topics,
            packs,
            proverbs,
            by_id,
            by_topic,
            proverb_by_word,
        }
    }

    /// Deserialize the four datasets. A malformed dataset is replaced by an
    /// empty one; the others still load.
    pub fn from_json(words: &str, topics: &str, packs: &str, proverbs: &str) -> Self {
        Self::new(
            or_empty("words", parse_dataset("words", words)),
            or_empty("topics", parse_dataset("topics", topics)),
            or_empty("packs", parse_dataset("packs", packs)),
            or_empty("proverbs", parse_dataset("proverbs", proverbs)),
        )
    }

    /// Load the datasets from a content directory. Missing files yield
    /// empty datasets.
    pub fn load_dir(dir: &Path) -> Self {
        Self::new(
            or_empty("words", read_dataset(&dir.join(WORDS_FILE), "words")),
            or_empty("topics", read_dataset(&dir.join(TOPICS_FILE), "topics")),
            or_empty("packs", read_dataset(&dir.join(PACKS_FILE), "packs")),
            or_empty("proverbs", read_dataset(&dir.join(PROVERBS_FILE), "proverbs")),
        )
    }

    /// Whether no words are loaded.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[VocabularyItem] {
        &self.words
    }

    /// Topics ordered by sort order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn packs(&self) -> &[QuizPack] {
        &self.packs
    }

    pub fn proverbs(&self) -> &[Proverb] {
        &self.proverbs
    }

    pub fn word(&self, id: &str) -> Option<&VocabularyItem> {
        self.by_id.get(id).map(|&idx| &self.words[idx])
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn pack(&self, id: &str) -> Option<&QuizPack> {
        self.packs.iter().find(|p| p.id == id)
    }

    pub fn words_for_topic(&self, topic_id: &str) -> Vec<&VocabularyItem> {
        self.by_topic
            .get(topic_id)
            .map(|idxs| idxs.iter().map(|&i| &self.words[i]).collect())
            .unwrap_or_default()
    }

    pub fn word_count(&self, topic_id: &str) -> usize {
        self.by_topic.get(topic_id).map_or(0, Vec::len)
    }

    pub fn words_for_difficulty(&self, difficulty: u8) -> Vec<&VocabularyItem> {
        self.words.iter().filter(|w| w.difficulty == difficulty).collect()
    }

    /// First `limit` tier-1 words in catalog order.
    pub fn beginner_words(&self, limit: usize) -> Vec<&VocabularyItem> {
        self.words.iter().filter(|w| w.difficulty == 1).take(limit).collect()
    }

    /// Proverb whose blank is filled by the given word.
    pub fn proverb_for_word(&self, word_id: &str) -> Option<&Proverb> {
        self.proverb_by_word.get(word_id).map(|&idx| &self.proverbs[idx])
    }

    /// Resolve a pack's word ids, skipping unknown ids.
    pub fn pack_words(&self, pack: &QuizPack) -> Vec<VocabularyItem> {
        pack.word_ids
            .iter()
            .filter_map(|id| self.word(id).cloned())
            .collect()
    }

    /// Packs grouped by category. Packs within a category are ordered by
    /// sort order; categories by their first pack.
    pub fn pack_categories(&self) -> Vec<PackCategory<'_>> {
        let mut sorted: Vec<&QuizPack> = self.packs.iter().collect();
        sorted.sort_by_key(|p| p.sort_order);

        let mut categories: Vec<PackCategory<'_>> = Vec::new();
        for pack in sorted {
            match categories.iter_mut().find(|c| c.category == pack.category) {
                Some(category) => category.packs.push(pack),
                None => categories.push(PackCategory {
                    category: &pack.category,
                    text: &pack.category_text,
                    translation: &pack.category_translation,
                    packs: vec![pack],
                }),
            }
        }
        categories
    }

    /// Case-insensitive search over text and translations.
    ///
    /// A query typed without macrons ignores them; a query with macrons
    /// must match them.
    pub fn search(&self, query: &str) -> Vec<&VocabularyItem> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let keep_macrons = text::contains_macrons(query);
        let normalize = |s: &str| {
            if keep_macrons {
                s.to_lowercase()
            } else {
                text::fold(s)
            }
        };
        let needle = normalize(query);
        self.words
            .iter()
            .filter(|w| {
                normalize(&w.text).contains(&needle)
                    || w.translation.to_lowercase().contains(&needle)
                    || w.alternative_translations
                        .iter()
                        .any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Word whose text equals `query`, ignoring case and macrons.
    pub fn word_by_text(&self, query: &str) -> Option<&VocabularyItem> {
        let query = query.trim();
        self.words
            .iter()
            .find(|w| text::eq_ignoring_macrons(&w.text, query))
    }

    /// Sample up to `count` distractors for a word.
    ///
    /// Candidates sharing the word's topic or difficulty tier come first;
    /// the rest of the catalog tops up any shortfall. The word itself is
    /// never returned.
    pub fn distractors<R: Rng + ?Sized>(
        &self,
        word: &VocabularyItem,
        count: usize,
        rng: &mut R,
    ) -> Vec<&VocabularyItem> {
        self.distractors_by(word, count, item_id, rng)
    }

    /// Like [`distractors`](Self::distractors), but every returned word has a
    /// distinct `key`, none equal to the word's own.
    pub fn distractors_by<R: Rng + ?Sized>(
        &self,
        word: &VocabularyItem,
        count: usize,
        key: fn(&VocabularyItem) -> &str,
        rng: &mut R,
    ) -> Vec<&VocabularyItem> {
        let target = key(word);
        let (mut related, mut remaining): (Vec<&VocabularyItem>, Vec<&VocabularyItem>) = self
            .words
            .iter()
            .filter(|c| c.id != word.id && key(*c) != target)
            .partition(|c| c.topic == word.topic || c.difficulty == word.difficulty);
        related.shuffle(rng);
        remaining.shuffle(rng);

        let mut seen = HashSet::new();
        related
            .into_iter()
            .chain(remaining)
            .filter(|c| seen.insert(key(*c)))
            .take(count)
            .collect()
    }

    /// Check cross-references between datasets.
    pub fn validate(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        let topic_ids: HashSet<&str> = self.topics.iter().map(|t| t.id.as_str()).collect();

        let mut seen = HashSet::new();
        for word in &self.words {
            if !seen.insert(word.id.as_str()) {
                issues.push(IntegrityIssue::DuplicateWord {
                    word_id: word.id.clone(),
                });
            }
            if !topic_ids.contains(word.topic.as_str()) {
                issues.push(IntegrityIssue::UnknownTopic {
                    word_id: word.id.clone(),
                    topic: word.topic.clone(),
                });
            }
            if !(1..=3).contains(&word.difficulty) {
                issues.push(IntegrityIssue::DifficultyOutOfRange {
                    word_id: word.id.clone(),
                    difficulty: word.difficulty,
                });
            }
        }

        for pack in &self.packs {
            for word_id in &pack.word_ids {
                if !self.by_id.contains_key(word_id) {
                    issues.push(IntegrityIssue::UnknownPackWord {
                        pack_id: pack.id.clone(),
                        word_id: word_id.clone(),
                    });
                }
            }
        }

        for proverb in &self.proverbs {
            if !self.by_id.contains_key(&proverb.target_word_id) {
                issues.push(IntegrityIssue::UnknownProverbTarget {
                    proverb_id: proverb.id.clone(),
                    word_id: proverb.target_word_id.clone(),
                });
            }
        }

        if !issues.is_empty() {
            warn!(count = issues.len(), "Catalog integrity issues found");
        }
        issues
    }
}
