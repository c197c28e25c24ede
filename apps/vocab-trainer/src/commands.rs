//! Command handlers.

use crate::args::Cli;
use anyhow::{bail, Context};
use chrono::{Local, Offset, Utc};
use std::io::{self, BufRead, Write};
use tracing::warn;
use vocab_core::batch;
use vocab_core::session::{pack_quiz, review_quiz};
use vocab_core::{
    Catalog, Config, Fsrs, MemoryCard, ProgressStore, ProgressSummary, QuestionType, QuizQuestion,
    QuizSession, Rating, SqliteStore, SrsAlgorithm, VocabularyItem,
};

/// Loaded configuration, content and progress store.
pub struct Trainer {
    config: Config,
    catalog: Catalog,
    store: SqliteStore,
    scheduler: Fsrs,
}

impl Trainer {
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => Config::load(),
        };

        let content_dir = cli
            .content_dir
            .clone()
            .or_else(|| config.content_dir())
            .context("No content directory configured")?;
        let catalog = Catalog::load_dir(&content_dir);
        if catalog.is_empty() {
            warn!(dir = %content_dir.display(), "No vocabulary loaded");
        }

        let db_path = cli
            .database
            .clone()
            .or_else(|| config.db_path())
            .context("No data directory available")?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open {}", db_path.display()))?;
        let scheduler = Fsrs::new(config.to_fsrs_parameters());

        Ok(Self {
            config,
            catalog,
            store,
            scheduler,
        })
    }

    pub fn stats(&mut self) -> anyhow::Result<()> {
        let cards = self.store.fetch_cards()?;
        let results = self.store.fetch_results()?;
        let offset = Local::now().offset().fix();
        let summary = ProgressSummary::compute(&cards, &results, Utc::now(), offset);

        println!("Scheduler:      {}", self.scheduler.name());
        println!("Words learned:  {}", summary.words_learned);
        println!(
            "Accuracy:       {}% ({}/{})",
            summary.accuracy_percent(),
            summary.correct_attempts,
            summary.total_attempts
        );
        println!("Due now:        {}", summary.due_count);
        println!(
            "Streak:         {} days (best {})",
            summary.streak.current, summary.streak.best
        );
        if !summary.upcoming.is_empty() {
            println!("\nUpcoming reviews:");
            for day in &summary.upcoming {
                println!("  {}  {:>3} {}", day.date, day.count, "#".repeat(day.count.min(40)));
            }
        }
        Ok(())
    }

    pub fn due(&mut self) -> anyhow::Result<()> {
        let now = Utc::now();
        let cards = self.store.fetch_cards()?;
        let due: Vec<_> = cards.iter().filter(|c| vocab_core::is_due(c, now)).collect();
        if due.is_empty() {
            println!("Nothing due.");
            return Ok(());
        }
        for card in due {
            let Some(word) = self.catalog.word(&card.item_id) else {
                continue;
            };
            println!(
                "{:<24} {:<24} {:<10} recall {:>3.0}%",
                word.text,
                word.translation,
                card.state.name(),
                self.scheduler.retrievability(card, now) * 100.0
            );
        }
        Ok(())
    }

    pub fn quiz(
        &mut self,
        count: Option<usize>,
        types: Vec<QuestionType>,
        pack: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut quiz_config = self.config.quiz.clone();
        if let Some(count) = count {
            quiz_config.question_count = count;
        }
        if !types.is_empty() {
            quiz_config.question_types = types;
        }

        let now = Utc::now();
        let mut session = match pack {
            Some(id) => {
                let pack = self
                    .catalog
                    .pack(id)
                    .with_context(|| format!("Unknown pack '{}'", id))?;
                pack_quiz(&self.catalog, pack, &quiz_config, rand::rng())
            }
            None => {
                batch::apply_config(&mut self.store, &self.config.batch, now)?;
                batch::load_current_batch(&self.catalog, &mut self.store, now)?;
                let cards = self.store.fetch_cards()?;
                review_quiz(&self.catalog, &cards, &quiz_config, rand::rng(), now)
            }
        };

        if session.total_questions() == 0 {
            println!("No questions available.");
            return Ok(());
        }

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        while let Some(question) = session.current_question().cloned() {
            print_question(&session, &question);
            let Some(choice) = read_choice(&mut lines, question.options.len())? else {
                break;
            };
            let outcome = session.answer(choice, &self.scheduler, &mut self.store, Utc::now());
            if let Some(outcome) = outcome {
                if outcome.was_correct {
                    println!("Tika! Correct.");
                } else {
                    println!("Incorrect. Answer: {}", outcome.expected_answer);
                }
                if let Some(subtitle) = question.subtitle() {
                    println!("{}", subtitle);
                }
            }
            session.next_question();
        }

        println!(
            "\nScore: {}% ({} correct, {} incorrect)",
            session.score_percentage(),
            session.correct,
            session.incorrect
        );
        Ok(())
    }

    pub fn validate(&mut self) -> anyhow::Result<()> {
        let issues = self.catalog.validate();
        if issues.is_empty() {
            println!(
                "OK: {} words, {} topics, {} packs, {} proverbs",
                self.catalog.words().len(),
                self.catalog.topics().len(),
                self.catalog.packs().len(),
                self.catalog.proverbs().len()
            );
            return Ok(());
        }
        for issue in &issues {
            println!("{}", issue);
        }
        bail!("{} integrity issues found", issues.len())
    }

    pub fn batch(&mut self) -> anyhow::Result<()> {
        let now = Utc::now();
        batch::apply_config(&mut self.store, &self.config.batch, now)?;
        let words = batch::load_current_batch(&self.catalog, &mut self.store, now)?;
        let settings = self.store.settings(now)?;
        println!(
            "Batch started {} ({} words every {} days)",
            settings.batch_started_at.with_timezone(&Local).format("%Y-%m-%d"),
            settings.words_per_batch,
            settings.batch_interval_days
        );
        for word in words {
            println!("  {:<24} {}", word.text, word.translation);
        }
        Ok(())
    }

    pub fn add(&mut self, key: &str) -> anyhow::Result<()> {
        let word = lookup(&self.catalog, key)?;
        if batch::add_word(&mut self.store, &word.id, Utc::now())? {
            println!("Added {} ({})", word.text, word.translation);
        } else {
            println!("{} is already being learned", word.text);
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        let word = lookup(&self.catalog, key)?;
        if batch::remove_word(&mut self.store, &word.id)? {
            println!("Removed {}", word.text);
        } else {
            println!("{} is not being learned", word.text);
        }
        Ok(())
    }

    pub fn preview(&mut self, key: &str) -> anyhow::Result<()> {
        let word = lookup(&self.catalog, key)?;
        let now = Utc::now();
        let card = self
            .store
            .fetch_card(&word.id)?
            .unwrap_or_else(|| MemoryCard::new(word.id.clone(), now));
        let preview = self.scheduler.preview(&card, now);

        println!("{} ({}), {}", word.text, word.translation, card.state.name());
        for rating in Rating::ALL {
            let next = preview.get(rating);
            let due = next
                .next_review
                .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!("  {:<6} {:<10} {}", rating.name(), next.state.name(), due);
        }
        Ok(())
    }

    pub fn search(&mut self, query: &str) -> anyhow::Result<()> {
        for word in self.catalog.search(query) {
            println!("{:<16} {:<24} {}", word.id, word.text, word.translation);
        }
        Ok(())
    }
}

/// Find a word by id, falling back to its text.
fn lookup<'a>(catalog: &'a Catalog, key: &str) -> anyhow::Result<&'a VocabularyItem> {
    catalog
        .word(key)
        .or_else(|| catalog.word_by_text(key))
        .with_context(|| format!("Unknown word '{}'", key))
}

fn print_question(session: &QuizSession, question: &QuizQuestion) {
    println!(
        "\n[{}/{}] {}",
        session.current_index() + 1,
        session.total_questions(),
        question.question_type().native_name()
    );
    if let Some(audio) = question.prompt_audio() {
        println!("(audio: {})", audio);
    }
    if let Some(prompt) = question.prompt_text() {
        println!("{}", prompt);
    }
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }
}

/// Read a 1-based option number. `None` on quit or end of input.
fn read_choice(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    option_count: usize,
) -> io::Result<Option<usize>> {
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            return Ok(None);
        };
        let line = line?;
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match input.parse::<usize>() {
            Ok(n) if (1..=option_count).contains(&n) => return Ok(Some(n - 1)),
            _ => println!("Enter a number from 1 to {}, or q to quit", option_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(lines: &[&str]) -> impl Iterator<Item = io::Result<String>> {
        lines
            .iter()
            .map(|l| Ok(l.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_read_choice_retries_invalid_input() {
        let mut lines = input(&["", "9", "x", " 2 "]);
        assert_eq!(read_choice(&mut lines, 4).unwrap(), Some(1));
    }

    #[test]
    fn test_lookup_by_id_or_text() {
        let word = VocabularyItem::new("w1", "whānau", "family", "people", 1);
        let catalog = Catalog::new(vec![word], Vec::new(), Vec::new(), Vec::new());
        assert_eq!(lookup(&catalog, "w1").unwrap().id, "w1");
        assert_eq!(lookup(&catalog, "Whanau").unwrap().id, "w1");
        assert!(lookup(&catalog, "whenua").is_err());
    }

    #[test]
    fn test_read_choice_quit_and_eof() {
        assert_eq!(read_choice(&mut input(&["Q"]), 4).unwrap(), None);
        assert_eq!(read_choice(&mut input(&[]), 4).unwrap(), None);
    }
}
