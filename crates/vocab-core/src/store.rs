//! Persistence collaborator for learner progress.

use crate::error::StoreResult;
use crate::models::{LearnerSettings, MemoryCard, QuizResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Key-value style storage for cards, results and settings.
///
/// Cards are keyed by item id; at most one card exists per item.
pub trait ProgressStore {
    fn fetch_cards(&self) -> StoreResult<Vec<MemoryCard>>;

    fn fetch_card(&self, item_id: &str) -> StoreResult<Option<MemoryCard>>;

    /// Insert or replace the card for its item.
    fn upsert_card(&mut self, card: &MemoryCard) -> StoreResult<()>;

    /// Remove a card. Returns whether one existed.
    fn delete_card(&mut self, item_id: &str) -> StoreResult<bool>;

    /// All results in timestamp order.
    fn fetch_results(&self) -> StoreResult<Vec<QuizResult>>;

    fn insert_result(&mut self, result: &QuizResult) -> StoreResult<()>;

    /// Get the learner settings, creating defaults on first use.
    fn settings(&mut self, now: DateTime<Utc>) -> StoreResult<LearnerSettings>;

    fn save_settings(&mut self, settings: &LearnerSettings) -> StoreResult<()>;

    fn contains_card(&self, item_id: &str) -> StoreResult<bool> {
        Ok(self.fetch_card(item_id)?.is_some())
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cards: HashMap<String, MemoryCard>,
    results: Vec<QuizResult>,
    settings: Option<LearnerSettings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn fetch_cards(&self) -> StoreResult<Vec<MemoryCard>> {
        let mut cards: Vec<MemoryCard> = self.cards.values().cloned().collect();
        cards.sort_by(|a, b| {
            a.date_added
                .cmp(&b.date_added)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        Ok(cards)
    }

    fn fetch_card(&self, item_id: &str) -> StoreResult<Option<MemoryCard>> {
        Ok(self.cards.get(item_id).cloned())
    }

    fn upsert_card(&mut self, card: &MemoryCard) -> StoreResult<()> {
        self.cards.insert(card.item_id.clone(), card.clone());
        Ok(())
    }

    fn delete_card(&mut self, item_id: &str) -> StoreResult<bool> {
        Ok(self.cards.remove(item_id).is_some())
    }

    fn fetch_results(&self) -> StoreResult<Vec<QuizResult>> {
        let mut results = self.results.clone();
        results.sort_by_key(|r| r.timestamp);
        Ok(results)
    }

    fn insert_result(&mut self, result: &QuizResult) -> StoreResult<()> {
        self.results.push(result.clone());
        Ok(())
    }

    fn settings(&mut self, now: DateTime<Utc>) -> StoreResult<LearnerSettings> {
        Ok(self
            .settings
            .get_or_insert_with(|| LearnerSettings::new(now))
            .clone())
    }

    fn save_settings(&mut self, settings: &LearnerSettings) -> StoreResult<()> {
        self.settings = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionType;

    #[test]
    fn test_card_crud() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let card = MemoryCard::new("kuri", now);
        store.upsert_card(&card).unwrap();
        store.upsert_card(&card).unwrap();
        assert_eq!(store.fetch_cards().unwrap().len(), 1);
        assert!(store.contains_card("kuri").unwrap());
        assert!(store.delete_card("kuri").unwrap());
        assert!(!store.delete_card("kuri").unwrap());
        assert!(store.fetch_card("kuri").unwrap().is_none());
    }

    #[test]
    fn test_settings_get_or_create() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let mut settings = store.settings(now).unwrap();
        assert_eq!(settings.words_per_batch, 10);
        settings.words_per_batch = 5;
        store.save_settings(&settings).unwrap();
        assert_eq!(store.settings(now).unwrap().words_per_batch, 5);
    }

    #[test]
    fn test_results_append() {
        let mut store = MemoryStore::new();
        let r = QuizResult::new("kuri", QuestionType::TrueFalse, true, Utc::now());
        store.insert_result(&r).unwrap();
        assert_eq!(store.fetch_results().unwrap(), vec![r]);
    }
}
