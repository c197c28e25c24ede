//! Batch rotation: which words the learner is currently studying.

use crate::catalog::Catalog;
use crate::config::BatchConfig;
use crate::error::StoreResult;
use crate::models::{LearnerSettings, MemoryCard, VocabularyItem};
use crate::store::ProgressStore;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

/// Add a word to the learner's active set. Returns false if it was
/// already there.
pub fn add_word<S: ProgressStore + ?Sized>(
    store: &mut S,
    item_id: &str,
    now: DateTime<Utc>,
) -> StoreResult<bool> {
    if store.contains_card(item_id)? {
        return Ok(false);
    }
    store.upsert_card(&MemoryCard::new(item_id, now))?;
    Ok(true)
}

/// Remove a word and its memory state.
pub fn remove_word<S: ProgressStore + ?Sized>(store: &mut S, item_id: &str) -> StoreResult<bool> {
    store.delete_card(item_id)
}

/// Copy batch configuration into the stored settings.
pub fn apply_config<S: ProgressStore + ?Sized>(
    store: &mut S,
    config: &BatchConfig,
    now: DateTime<Utc>,
) -> StoreResult<LearnerSettings> {
    let mut settings = store.settings(now)?;
    if settings.words_per_batch != config.words_per_batch
        || settings.batch_interval_days != config.batch_interval_days
    {
        settings.words_per_batch = config.words_per_batch;
        settings.batch_interval_days = config.batch_interval_days;
        store.save_settings(&settings)?;
    }
    Ok(settings)
}

/// Whether a new batch should be introduced.
pub fn batch_due(settings: &LearnerSettings, has_cards: bool, now: DateTime<Utc>) -> bool {
    let days = (now - settings.batch_started_at).num_days();
    !has_cards || days >= i64::from(settings.batch_interval_days)
}

/// Words not yet added, easiest tier first, catalog order within a tier.
pub fn next_batch<'a>(
    catalog: &'a Catalog,
    existing: &HashSet<String>,
    size: usize,
) -> Vec<&'a VocabularyItem> {
    let mut available: Vec<&VocabularyItem> = catalog
        .words()
        .iter()
        .filter(|w| !existing.contains(&w.id))
        .collect();
    available.sort_by_key(|w| w.difficulty);
    available.truncate(size);
    available
}

/// Rotate in a new batch if one is due, then return the most recently
/// added `words_per_batch` words.
pub fn load_current_batch<S: ProgressStore + ?Sized>(
    catalog: &Catalog,
    store: &mut S,
    now: DateTime<Utc>,
) -> StoreResult<Vec<VocabularyItem>> {
    let mut settings = store.settings(now)?;
    let cards = store.fetch_cards()?;
    let existing: HashSet<String> = cards.iter().map(|c| c.item_id.clone()).collect();
    let size = settings.words_per_batch as usize;

    if batch_due(&settings, !existing.is_empty(), now) {
        let batch = next_batch(catalog, &existing, size);
        info!(words = batch.len(), "Starting new batch");
        for word in batch {
            store.upsert_card(&MemoryCard::new(word.id.clone(), now))?;
        }
        settings.batch_started_at = now;
        store.save_settings(&settings)?;
    }

    let mut recent = store.fetch_cards()?;
    // Stable sort keeps insertion order among cards added together.
    recent.sort_by(|a, b| b.date_added.cmp(&a.date_added));
    let words: Vec<VocabularyItem> = recent
        .iter()
        .take(size)
        .filter_map(|c| catalog.word(&c.item_id).cloned())
        .collect();
    debug!(words = words.len(), "Current batch loaded");
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::word;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn catalog() -> Catalog {
        let words = vec![
            word("hard1", "t", 3),
            word("easy1", "t", 1),
            word("mid1", "t", 2),
            word("easy2", "t", 1),
            word("mid2", "t", 2),
        ];
        Catalog::new(words, Vec::new(), Vec::new(), Vec::new())
    }

    fn ids(words: &[VocabularyItem]) -> HashSet<&str> {
        words.iter().map(|w| w.id.as_str()).collect()
    }

    #[test]
    fn test_first_batch_prefers_easy_words() {
        let catalog = catalog();
        let mut store = MemoryStore::new();
        apply_config(&mut store, &BatchConfig { words_per_batch: 3, batch_interval_days: 7 }, now())
            .unwrap();

        let batch = load_current_batch(&catalog, &mut store, now()).unwrap();
        assert_eq!(ids(&batch), HashSet::from(["easy1", "easy2", "mid1"]));
        assert_eq!(store.fetch_cards().unwrap().len(), 3);
    }

    #[test]
    fn test_batch_rotates_after_interval() {
        let catalog = catalog();
        let mut store = MemoryStore::new();
        apply_config(&mut store, &BatchConfig { words_per_batch: 2, batch_interval_days: 7 }, now())
            .unwrap();

        let first = load_current_batch(&catalog, &mut store, now()).unwrap();
        assert_eq!(ids(&first), HashSet::from(["easy1", "easy2"]));

        let same = load_current_batch(&catalog, &mut store, now() + Duration::days(6)).unwrap();
        assert_eq!(ids(&same), ids(&first));

        let later = now() + Duration::days(7);
        let second = load_current_batch(&catalog, &mut store, later).unwrap();
        assert_eq!(ids(&second), HashSet::from(["mid1", "mid2"]));
        assert_eq!(store.fetch_cards().unwrap().len(), 4);
        assert_eq!(store.settings(later).unwrap().batch_started_at, later);
    }

    #[test]
    fn test_add_word_is_idempotent() {
        let mut store = MemoryStore::new();
        assert!(add_word(&mut store, "easy1", now()).unwrap());
        assert!(!add_word(&mut store, "easy1", now()).unwrap());
        assert!(remove_word(&mut store, "easy1").unwrap());
        assert!(store.fetch_cards().unwrap().is_empty());
    }

    #[test]
    fn test_exhausted_catalog() {
        let catalog = catalog();
        let existing: HashSet<String> = catalog.words().iter().map(|w| w.id.clone()).collect();
        assert!(next_batch(&catalog, &existing, 10).is_empty());
    }
}
