//! Spaced repetition scheduling (FSRS-5).
//!
//! Each review maps `(card, rating, now)` to an updated card. The memory
//! model tracks stability (days until recall probability falls to 90%) and
//! difficulty (1-10); the next interval is derived from the requested
//! retention.

use crate::models::{CardState, MemoryCard, Rating};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Published FSRS-5 default weights.
pub const DEFAULT_WEIGHTS: [f64; 19] = [
    0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192, 1.01925,
    1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
];

const DECAY: f64 = -0.5;
/// Chosen so that retrievability is 0.9 when elapsed time equals stability.
const FACTOR: f64 = 19.0 / 81.0;
const S_MIN: f64 = 0.01;
const D_MIN: f64 = 1.0;
const D_MAX: f64 = 10.0;

/// Longest interval the scheduler produces, whatever the parameters say.
pub const MAX_INTERVAL_DAYS: u32 = 36500;

/// Short-term steps in minutes.
const NEW_AGAIN_STEP: i64 = 1;
const NEW_HARD_STEP: i64 = 5;
const NEW_GOOD_STEP: i64 = 10;
const LEARNING_AGAIN_STEP: i64 = 5;
const LEARNING_HARD_STEP: i64 = 10;
const RELEARN_STEP: i64 = 5;

/// Trait for spaced repetition algorithms.
pub trait SrsAlgorithm: Send + Sync {
    /// Algorithm name.
    fn name(&self) -> &str;

    /// Apply a review to a card.
    fn review(&self, card: &MemoryCard, rating: Rating, now: DateTime<Utc>) -> MemoryCard;

    /// Check if the card is due at `now`.
    fn is_due(&self, card: &MemoryCard, now: DateTime<Utc>) -> bool {
        is_due(card, now)
    }
}

/// A card with no scheduled review is always due.
pub fn is_due(card: &MemoryCard, now: DateTime<Utc>) -> bool {
    card.next_review.map_or(true, |due| due <= now)
}

/// Map a binary quiz outcome to a rating.
pub fn rating_for_outcome(was_correct: bool) -> Rating {
    Rating::from_outcome(was_correct)
}

/// Model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsrsParameters {
    pub weights: [f64; 19],
    /// Target probability of recall at the scheduled review.
    pub request_retention: f64,
    /// Longest interval in days.
    pub maximum_interval: u32,
    /// Use minute-scale learning and relearning steps. When off, every
    /// review schedules in whole days and cards go straight to review.
    pub enable_short_term: bool,
}

impl Default for FsrsParameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            request_retention: 0.9,
            maximum_interval: 36500,
            enable_short_term: true,
        }
    }
}

/// The four possible outcomes of reviewing a card.
#[derive(Debug, Clone)]
pub struct SchedulingPreview {
    pub again: MemoryCard,
    pub hard: MemoryCard,
    pub good: MemoryCard,
    pub easy: MemoryCard,
}

impl SchedulingPreview {
    pub fn get(&self, rating: Rating) -> &MemoryCard {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }

    pub fn into_card(self, rating: Rating) -> MemoryCard {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

/// FSRS-5 scheduler.
#[derive(Debug, Clone, Default)]
pub struct Fsrs {
    params: FsrsParameters,
}

impl SrsAlgorithm for Fsrs {
    fn name(&self) -> &str {
        "FSRS-5"
    }

    fn review(&self, card: &MemoryCard, rating: Rating, now: DateTime<Utc>) -> MemoryCard {
        let updated = self.preview(card, now).into_card(rating);
        debug!(
            item = %updated.item_id,
            rating = rating.name(),
            state = updated.state.name(),
            stability = updated.stability,
            scheduled_days = updated.scheduled_days,
            "Card reviewed"
        );
        updated
    }
}

impl Fsrs {
    pub fn new(mut params: FsrsParameters) -> Self {
        params.maximum_interval = params.maximum_interval.clamp(1, MAX_INTERVAL_DAYS);
        Self { params }
    }

    pub fn params(&self) -> &FsrsParameters {
        &self.params
    }

    fn w(&self, i: usize) -> f64 {
        self.params.weights[i]
    }

    /// Probability of recall after `elapsed_days` at the given stability.
    pub fn forgetting_curve(&self, elapsed_days: f64, stability: f64) -> f64 {
        (1.0 + FACTOR * elapsed_days / stability).powf(DECAY)
    }

    /// Current probability of recall. Zero for unreviewed cards.
    pub fn retrievability(&self, card: &MemoryCard, now: DateTime<Utc>) -> f64 {
        let card = sanitize(card);
        if card.state == CardState::New {
            return 0.0;
        }
        self.forgetting_curve(elapsed_days(&card, now) as f64, card.stability)
    }

    /// Interval in whole days for a stability, within `[1, maximum_interval]`.
    pub fn next_interval(&self, stability: f64) -> u32 {
        let retention = self.params.request_retention.clamp(0.01, 0.99);
        let raw = stability / FACTOR * (retention.powf(1.0 / DECAY) - 1.0);
        let max = self.params.maximum_interval.clamp(1, MAX_INTERVAL_DAYS);
        if !raw.is_finite() {
            return max;
        }
        (raw.round().max(1.0) as u32).min(max)
    }

    fn init_stability(&self, rating: Rating) -> f64 {
        self.w(rating.grade() as usize - 1).max(0.1)
    }

    fn init_difficulty(&self, rating: Rating) -> f64 {
        (self.w(4) - (self.w(5) * (rating.grade() as f64 - 1.0)).exp() + 1.0).clamp(D_MIN, D_MAX)
    }

    fn next_difficulty(&self, difficulty: f64, rating: Rating) -> f64 {
        let delta = -self.w(6) * (rating.grade() as f64 - 3.0);
        let damped = difficulty + delta * (10.0 - difficulty) / 9.0;
        let reverted = self.w(7) * self.init_difficulty(Rating::Easy) + (1.0 - self.w(7)) * damped;
        reverted.clamp(D_MIN, D_MAX)
    }

    fn next_recall_stability(&self, d: f64, s: f64, r: f64, rating: Rating) -> f64 {
        let hard_penalty = if rating == Rating::Hard { self.w(15) } else { 1.0 };
        let easy_bonus = if rating == Rating::Easy { self.w(16) } else { 1.0 };
        let growth = self.w(8).exp()
            * (11.0 - d)
            * s.powf(-self.w(9))
            * (((1.0 - r) * self.w(10)).exp() - 1.0)
            * hard_penalty
            * easy_bonus;
        (s * (1.0 + growth)).max(S_MIN)
    }

    fn next_forget_stability(&self, d: f64, s: f64, r: f64) -> f64 {
        let forgotten = self.w(11)
            * d.powf(-self.w(12))
            * ((s + 1.0).powf(self.w(13)) - 1.0)
            * ((1.0 - r) * self.w(14)).exp();
        let ceiling = s / (self.w(17) * self.w(18)).exp();
        forgotten.min(ceiling).max(S_MIN)
    }

    fn next_short_term_stability(&self, s: f64, rating: Rating) -> f64 {
        (s * (self.w(17) * (rating.grade() as f64 - 3.0 + self.w(18))).exp()).max(S_MIN)
    }

    /// Compute the card that would result from each rating.
    pub fn preview(&self, card: &MemoryCard, now: DateTime<Utc>) -> SchedulingPreview {
        let card = sanitize(card);
        let elapsed = elapsed_days(&card, now);

        let mut base = card.clone();
        base.elapsed_days = elapsed;
        base.last_review = Some(now);
        base.repetitions = card.repetitions.saturating_add(1);

        let (s, d) = (card.stability, card.difficulty);
        let next = |rating: Rating| -> MemoryCard {
            let mut c = base.clone();
            match card.state {
                CardState::New => {
                    c.stability = self.init_stability(rating);
                    c.difficulty = self.init_difficulty(rating);
                }
                CardState::Learning | CardState::Relearning if self.params.enable_short_term => {
                    c.stability = self.next_short_term_stability(s, rating);
                    c.difficulty = self.next_difficulty(d, rating);
                }
                _ => {
                    let r = self.forgetting_curve(elapsed as f64, s);
                    c.stability = match rating {
                        Rating::Again => self.next_forget_stability(d, s, r),
                        _ => self.next_recall_stability(d, s, r, rating),
                    };
                    c.difficulty = self.next_difficulty(d, rating);
                }
            }
            c
        };

        let mut preview = SchedulingPreview {
            again: next(Rating::Again),
            hard: next(Rating::Hard),
            good: next(Rating::Good),
            easy: next(Rating::Easy),
        };

        if self.params.enable_short_term {
            self.schedule_short_term(&mut preview, card.state, now);
        } else {
            self.schedule_long_term(&mut preview, card.state, now);
        }
        preview
    }

    fn schedule_short_term(&self, p: &mut SchedulingPreview, state: CardState, now: DateTime<Utc>) {
        match state {
            CardState::New => {
                step(&mut p.again, CardState::Learning, NEW_AGAIN_STEP, now);
                step(&mut p.hard, CardState::Learning, NEW_HARD_STEP, now);
                step(&mut p.good, CardState::Learning, NEW_GOOD_STEP, now);
                let easy = self.next_interval(p.easy.stability);
                graduate(&mut p.easy, easy, now);
            }
            CardState::Learning | CardState::Relearning => {
                step(&mut p.again, state, LEARNING_AGAIN_STEP, now);
                if state == CardState::Relearning {
                    p.again.lapses = p.again.lapses.saturating_add(1);
                }
                step(&mut p.hard, state, LEARNING_HARD_STEP, now);
                let good = self.next_interval(p.good.stability);
                let easy = self.next_interval(p.easy.stability).max(good + 1);
                graduate(&mut p.good, good, now);
                graduate(&mut p.easy, easy, now);
            }
            CardState::Review => {
                step(&mut p.again, CardState::Relearning, RELEARN_STEP, now);
                p.again.lapses = p.again.lapses.saturating_add(1);
                let (hard, good, easy) = self.ordered_intervals(p);
                graduate(&mut p.hard, hard, now);
                graduate(&mut p.good, good, now);
                graduate(&mut p.easy, easy, now);
            }
        }
    }

    fn schedule_long_term(&self, p: &mut SchedulingPreview, state: CardState, now: DateTime<Utc>) {
        let again = self
            .next_interval(p.again.stability)
            .min(self.next_interval(p.hard.stability));
        let hard_floor = again + 1;
        let (hard, good, easy) = self.ordered_intervals(p);
        let hard = hard.max(hard_floor);
        let good = good.max(hard + 1);
        let easy = easy.max(good + 1);

        graduate(&mut p.again, again, now);
        graduate(&mut p.hard, hard, now);
        graduate(&mut p.good, good, now);
        graduate(&mut p.easy, easy, now);
        if matches!(state, CardState::Review | CardState::Relearning) {
            p.again.lapses = p.again.lapses.saturating_add(1);
        }
    }

    /// Hard, good and easy intervals with hard <= good < easy.
    fn ordered_intervals(&self, p: &SchedulingPreview) -> (u32, u32, u32) {
        let hard = self
            .next_interval(p.hard.stability)
            .min(self.next_interval(p.good.stability));
        let good = self.next_interval(p.good.stability).max(hard + 1);
        let easy = self.next_interval(p.easy.stability).max(good + 1);
        (hard, good, easy)
    }
}

/// Keep the card in a short-term step.
fn step(card: &mut MemoryCard, state: CardState, minutes: i64, now: DateTime<Utc>) {
    card.state = state;
    card.scheduled_days = 0;
    card.next_review = Some(later(now, Duration::minutes(minutes)));
}

/// Move the card into review with an interval in days.
fn graduate(card: &mut MemoryCard, days: u32, now: DateTime<Utc>) {
    card.state = CardState::Review;
    card.scheduled_days = days;
    card.next_review = Some(later(now, Duration::days(i64::from(days))));
}

/// `now + delta`, saturating at the latest representable time.
fn later(now: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whole days since the last review, never negative.
fn elapsed_days(card: &MemoryCard, now: DateTime<Utc>) -> u32 {
    card.last_review
        .map(|last| (now - last).num_days().max(0))
        .map_or(0, |days| u32::try_from(days).unwrap_or(u32::MAX))
}

/// Reset invalid memory state so it cannot propagate.
///
/// A reviewed card whose stability or difficulty is not a usable number is
/// treated as new. Counters are kept.
fn sanitize(card: &MemoryCard) -> MemoryCard {
    let mut card = card.clone();
    if card.state == CardState::New {
        return card;
    }
    let usable = card.stability.is_finite() && card.stability > 0.0 && card.difficulty.is_finite();
    if usable {
        card.stability = card.stability.max(S_MIN);
        card.difficulty = card.difficulty.clamp(D_MIN, D_MAX);
    } else {
        debug!(item = %card.item_id, "Invalid memory state, treating card as new");
        card.state = CardState::New;
        card.stability = 0.0;
        card.difficulty = crate::models::INITIAL_DIFFICULTY;
    }
    card
}
