//! Learner statistics derived from cards and the quiz result log.

use crate::models::{MemoryCard, QuizResult};
use crate::scheduler::is_due;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Days covered by the upcoming-review histogram.
pub const UPCOMING_DAYS: i64 = 14;

/// Number of cards scheduled on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Streak information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakInfo {
    /// Consecutive active days ending today or yesterday.
    pub current: u32,
    /// Longest run of consecutive active days.
    pub best: u32,
    /// Most recent active day.
    pub last_date: Option<NaiveDate>,
}

/// Aggregated progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSummary {
    /// Items reviewed at least once.
    pub words_learned: usize,
    pub total_attempts: usize,
    pub correct_attempts: usize,
    /// Correct / total, 0 when there are no attempts.
    pub accuracy: f64,
    pub due_count: usize,
    pub streak: StreakInfo,
    pub upcoming: Vec<DayCount>,
}

impl ProgressSummary {
    /// Compute every statistic. Day boundaries follow `offset`.
    pub fn compute(
        cards: &[MemoryCard],
        results: &[QuizResult],
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Self {
        let today = local_day(now, offset);
        let correct_attempts = results.iter().filter(|r| r.was_correct).count();
        Self {
            words_learned: words_learned(cards),
            total_attempts: results.len(),
            correct_attempts,
            accuracy: accuracy(results),
            due_count: due_count(cards, now),
            streak: streak(results, today, offset),
            upcoming: upcoming_reviews(cards, today, offset),
        }
    }

    /// Accuracy as a whole percentage.
    pub fn accuracy_percent(&self) -> u32 {
        (self.accuracy * 100.0).round() as u32
    }
}

/// Calendar day of a timestamp at the given offset.
pub fn local_day(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

pub fn words_learned(cards: &[MemoryCard]) -> usize {
    cards.iter().filter(|c| c.is_learned()).count()
}

pub fn accuracy(results: &[QuizResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let correct = results.iter().filter(|r| r.was_correct).count();
    correct as f64 / results.len() as f64
}

pub fn due_count(cards: &[MemoryCard], now: DateTime<Utc>) -> usize {
    cards.iter().filter(|c| is_due(c, now)).count()
}

/// Cards per review day up to `today + 14`, ascending by day. Overdue
/// cards keep their original day.
pub fn upcoming_reviews(
    cards: &[MemoryCard],
    today: NaiveDate,
    offset: FixedOffset,
) -> Vec<DayCount> {
    let horizon = today + Duration::days(UPCOMING_DAYS);
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for due in cards.iter().filter_map(|c| c.next_review) {
        let day = local_day(due, offset);
        if day <= horizon {
            *by_day.entry(day).or_default() += 1;
        }
    }
    by_day
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect()
}

/// Current and best streak of days with at least one quiz attempt.
pub fn streak(results: &[QuizResult], today: NaiveDate, offset: FixedOffset) -> StreakInfo {
    let days: BTreeSet<NaiveDate> = results
        .iter()
        .map(|r| local_day(r.timestamp, offset))
        .collect();

    let Some(&most_recent) = days.iter().next_back() else {
        return StreakInfo::default();
    };

    // Calculate best streak
    let mut best = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for &day in &days {
        run = match previous {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }

    // Calculate current streak (from the most recent day backwards)
    let yesterday = today - Duration::days(1);
    let mut current = 0u32;
    if most_recent >= yesterday {
        let mut expected = most_recent;
        for &day in days.iter().rev() {
            if day != expected {
                break;
            }
            current += 1;
            match expected.pred_opt() {
                Some(p) => expected = p,
                None => break,
            }
        }
    }

    StreakInfo {
        current,
        best,
        last_date: Some(most_recent),
    }
}

/// Current streak only.
pub fn current_streak(results: &[QuizResult], today: NaiveDate, offset: FixedOffset) -> u32 {
    streak(results, today, offset).current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardState, QuestionType};
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 15, 0, 0).unwrap()
    }

    fn attempt(days_ago: i64, correct: bool) -> QuizResult {
        let at = now() - Duration::days(days_ago);
        QuizResult::new("kuri", QuestionType::DirectChoice, correct, at)
    }

    fn card(next_in_days: Option<i64>, repetitions: u32) -> MemoryCard {
        let mut c = MemoryCard::new("kuri", now() - Duration::days(30));
        c.repetitions = repetitions;
        c.next_review = next_in_days.map(|d| now() + Duration::days(d));
        if repetitions > 0 {
            c.state = CardState::Review;
        }
        c
    }

    #[test]
    fn test_streak_consecutive_days() {
        let results = vec![attempt(0, true), attempt(1, false), attempt(2, true), attempt(0, true)];
        assert_eq!(current_streak(&results, now().date_naive(), utc()), 3);
    }

    #[test]
    fn test_streak_gap_breaks() {
        let results = vec![attempt(0, true), attempt(3, true)];
        let info = streak(&results, now().date_naive(), utc());
        assert_eq!(info.current, 1);
        assert_eq!(info.best, 1);
    }

    #[test]
    fn test_streak_anchored_yesterday() {
        let results = vec![attempt(1, true), attempt(2, true)];
        assert_eq!(current_streak(&results, now().date_naive(), utc()), 2);
    }

    #[test]
    fn test_streak_lapsed() {
        let results = vec![attempt(2, true), attempt(3, true), attempt(4, true)];
        let info = streak(&results, now().date_naive(), utc());
        assert_eq!(info.current, 0);
        assert_eq!(info.best, 3);
        assert_eq!(current_streak(&[], now().date_naive(), utc()), 0);
    }

    #[test]
    fn test_day_boundary_follows_offset() {
        // 23:30 UTC on the 19th is the 20th in UTC+10.
        let late = Utc.with_ymd_and_hms(2026, 5, 19, 23, 30, 0).unwrap();
        let result = QuizResult::new("kuri", QuestionType::TrueFalse, true, late);
        let nz = FixedOffset::east_opt(10 * 3600).unwrap();
        assert_eq!(local_day(late, nz), NaiveDate::from_ymd_opt(2026, 5, 20).unwrap());
        let info = streak(&[result], NaiveDate::from_ymd_opt(2026, 5, 21).unwrap(), nz);
        assert_eq!(info.current, 1);
    }

    #[test]
    fn test_upcoming_histogram() {
        let cards = vec![
            card(Some(1), 1),
            card(Some(1), 2),
            card(Some(3), 1),
            card(Some(20), 4),
            card(Some(-2), 3),
            card(None, 0),
        ];
        let today = now().date_naive();
        let upcoming = upcoming_reviews(&cards, today, utc());
        let expected = vec![
            DayCount { date: today - Duration::days(2), count: 1 },
            DayCount { date: today + Duration::days(1), count: 2 },
            DayCount { date: today + Duration::days(3), count: 1 },
        ];
        assert_eq!(upcoming, expected);
    }

    #[test]
    fn test_summary() {
        let cards = vec![card(None, 0), card(Some(-1), 2), card(Some(5), 1)];
        let results = vec![attempt(0, true), attempt(0, true), attempt(1, false), attempt(1, true)];
        let summary = ProgressSummary::compute(&cards, &results, now(), utc());
        assert_eq!(summary.words_learned, 2);
        assert_eq!(summary.total_attempts, 4);
        assert_eq!(summary.correct_attempts, 3);
        assert!((summary.accuracy - 0.75).abs() < f64::EPSILON);
        assert_eq!(summary.accuracy_percent(), 75);
        assert_eq!(summary.due_count, 2);
        assert_eq!(summary.streak.current, 2);
        assert_eq!(summary.upcoming.len(), 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = ProgressSummary::compute(&[], &[], now(), utc());
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.streak, StreakInfo::default());
        assert!(summary.upcoming.is_empty());
    }
}
