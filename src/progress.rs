//! Resolve-history aggregation.
//!
//! Turns the raw [`ResolveAttempt`] rows of each problem into the derived
//! numbers shown to the user: attempt and solve counts, best/average solve
//! time, the first-vs-latest solve delta, and the review queue.
//!
//! Chronology is `(planned_date, created_at, id)` with a missing date sorting
//! before every real date. "First" and "latest" always mean first and last in
//! that ascending order.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Problem, ResolveAttempt, ResolveOutcome};

/// Chronological comparison of two attempts, oldest first.
pub fn chronological(a: &ResolveAttempt, b: &ResolveAttempt) -> Ordering {
    let date_a = a.planned_date.unwrap_or(NaiveDate::MIN);
    let date_b = b.planned_date.unwrap_or(NaiveDate::MIN);
    date_a
        .cmp(&date_b)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Attempts oldest first.
pub fn sort_ascending(attempts: &mut [ResolveAttempt]) {
    attempts.sort_by(chronological);
}

/// Attempts newest first, for "most recent activity" listings.
///
/// Computed with its own comparator rather than by reversing the ascending
/// list; both agree on every pair with distinct keys.
pub fn sort_descending(attempts: &mut [ResolveAttempt]) {
    attempts.sort_by(|a, b| chronological(b, a));
}

/// Direction of the first-vs-latest solve comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressClass {
    Baseline,
    Improved,
    Regressed,
    Steady,
}

/// Label describing how solve time moved between the first and latest solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLabel {
    pub label: String,
    pub class: ProgressClass,
    pub minutes_path: Option<String>,
}

impl ProgressLabel {
    /// Compare the first and latest solve of a problem solved `solved_count` times.
    ///
    /// Intermediate solves are ignored: a problem solved five times compares
    /// only its first against its fifth.
    pub fn compare(solved_count: usize, first: Option<i64>, latest: Option<i64>) -> Self {
        match (first, latest) {
            (Some(first), Some(latest)) if solved_count > 1 => {
                let delta = first - latest;
                let (label, class) = match delta.cmp(&0) {
                    Ordering::Greater => (format!("↓ {} min", delta), ProgressClass::Improved),
                    Ordering::Less => (format!("↑ {} min", delta.abs()), ProgressClass::Regressed),
                    Ordering::Equal => ("→ steady".to_string(), ProgressClass::Steady),
                };
                Self {
                    label,
                    class,
                    minutes_path: Some(format!("{} → {}", first, latest)),
                }
            }
            _ => Self {
                label: "Baseline".to_string(),
                class: ProgressClass::Baseline,
                minutes_path: first.map(|m| format!("{} min", m)),
            },
        }
    }
}

/// Everything derived from one problem's attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveStats {
    pub attempt_count: usize,
    pub solved_count: usize,
    pub planned_count: usize,
    /// Fields of the chronologically last attempt, whatever its outcome.
    pub latest_outcome: Option<ResolveOutcome>,
    pub latest_date: Option<NaiveDate>,
    pub latest_minutes: Option<i64>,
    pub best_minutes: Option<i64>,
    pub avg_minutes: Option<f64>,
    pub first_solved_date: Option<NaiveDate>,
    pub latest_solved_date: Option<NaiveDate>,
    pub latest_solved_minutes: Option<i64>,
    /// Present only when the problem was solved at least once.
    pub progress: Option<ProgressLabel>,
}

impl ResolveStats {
    pub fn from_attempts(attempts: &[ResolveAttempt]) -> Self {
        let mut ordered = attempts.to_vec();
        sort_ascending(&mut ordered);

        let solved: Vec<&ResolveAttempt> = ordered
            .iter()
            .filter(|a| a.outcome == ResolveOutcome::Solved)
            .collect();
        let planned_count = ordered
            .iter()
            .filter(|a| a.outcome == ResolveOutcome::Planned)
            .count();

        let solved_minutes: Vec<i64> = solved.iter().filter_map(|a| a.minutes_spent).collect();
        let best_minutes = solved_minutes.iter().min().copied();
        let avg_minutes = mean_one_decimal(&solved_minutes);

        let latest = ordered.last();
        let first_solved = solved.first();
        let latest_solved = solved.last();

        let progress = match (first_solved, latest_solved) {
            (Some(first), Some(last)) => Some(ProgressLabel::compare(
                solved.len(),
                first.minutes_spent,
                last.minutes_spent,
            )),
            _ => None,
        };

        Self {
            attempt_count: ordered.len(),
            solved_count: solved.len(),
            planned_count,
            latest_outcome: latest.map(|a| a.outcome),
            latest_date: latest.and_then(|a| a.planned_date),
            latest_minutes: latest.and_then(|a| a.minutes_spent),
            best_minutes,
            avg_minutes,
            first_solved_date: first_solved.and_then(|a| a.planned_date),
            latest_solved_date: latest_solved.and_then(|a| a.planned_date),
            latest_solved_minutes: latest_solved.and_then(|a| a.minutes_spent),
            progress,
        }
    }
}

fn mean_one_decimal(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Compact per-problem summary used by problem listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSummary {
    pub count: usize,
    pub planned: usize,
    pub solved_count: usize,
    pub last_outcome: Option<ResolveOutcome>,
    pub last_date: Option<NaiveDate>,
    pub last_minutes: Option<i64>,
}

impl ResolveSummary {
    pub fn from_attempts(attempts: &[ResolveAttempt]) -> Self {
        let mut recent_first = attempts.to_vec();
        sort_descending(&mut recent_first);
        let latest = recent_first.first();

        Self {
            count: recent_first.len(),
            planned: count_outcome(&recent_first, ResolveOutcome::Planned),
            solved_count: count_outcome(&recent_first, ResolveOutcome::Solved),
            last_outcome: latest.map(|a| a.outcome),
            last_date: latest.and_then(|a| a.planned_date),
            last_minutes: latest.and_then(|a| a.minutes_spent),
        }
    }
}

fn count_outcome(attempts: &[ResolveAttempt], outcome: ResolveOutcome) -> usize {
    attempts.iter().filter(|a| a.outcome == outcome).count()
}

/// One row of the resolve-history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub problem: Problem,
    pub attempts: usize,
    pub solved_count: usize,
    pub best_minutes: Option<i64>,
    pub avg_minutes: Option<f64>,
    /// Minutes of the latest solve.
    pub latest_minutes: Option<i64>,
    /// Date of the latest solve.
    pub latest_date: Option<NaiveDate>,
    /// Outcome of the latest attempt overall.
    pub latest_outcome: Option<ResolveOutcome>,
    pub progress_label: String,
    pub progress_class: ProgressClass,
    pub minutes_path: Option<String>,
    /// Date of the first solve.
    pub first_date: Option<NaiveDate>,
}

impl HistoryEntry {
    /// `None` when the problem has never been solved.
    pub fn build(problem: &Problem, attempts: &[ResolveAttempt]) -> Option<Self> {
        let stats = ResolveStats::from_attempts(attempts);
        let progress = stats.progress?;

        Some(Self {
            problem: problem.clone(),
            attempts: stats.attempt_count,
            solved_count: stats.solved_count,
            best_minutes: stats.best_minutes,
            avg_minutes: stats.avg_minutes,
            latest_minutes: stats.latest_solved_minutes,
            latest_date: stats.latest_solved_date,
            latest_outcome: stats.latest_outcome,
            progress_label: progress.label,
            progress_class: progress.class,
            minutes_path: progress.minutes_path,
            first_date: stats.first_solved_date,
        })
    }
}

/// History entries for every solved problem, latest solve first.
///
/// Ties on the latest solve date fall back to the higher problem id.
pub fn resolve_history(
    problems: &[Problem],
    attempts_by_problem: &HashMap<i64, Vec<ResolveAttempt>>,
) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = problems
        .iter()
        .filter_map(|p| {
            let attempts = attempts_by_problem.get(&p.id)?;
            HistoryEntry::build(p, attempts)
        })
        .collect();

    entries.sort_by(|a, b| {
        let key_a = (a.latest_date.unwrap_or(NaiveDate::MIN), a.problem.id);
        let key_b = (b.latest_date.unwrap_or(NaiveDate::MIN), b.problem.id);
        key_b.cmp(&key_a)
    });
    entries
}

/// Problems flagged for review, in the order of `problems`.
pub fn review_queue(problems: &[Problem]) -> Vec<Problem> {
    problems.iter().filter(|p| p.needs_review).cloned().collect()
}

/// Group attempts by owning problem, keeping the input order within each group.
pub fn group_by_problem(attempts: Vec<ResolveAttempt>) -> HashMap<i64, Vec<ResolveAttempt>> {
    let mut grouped: HashMap<i64, Vec<ResolveAttempt>> = HashMap::new();
    for attempt in attempts {
        grouped.entry(attempt.problem_id).or_default().push(attempt);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewPriority;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn attempt(
        id: i64,
        date: Option<NaiveDate>,
        minutes: Option<i64>,
        outcome: ResolveOutcome,
    ) -> ResolveAttempt {
        ResolveAttempt {
            id,
            problem_id: 1,
            planned_date: date,
            minutes_spent: minutes,
            outcome,
            notes: String::new(),
            created_at: at(id),
        }
    }

    fn solved(id: i64, d: u32, minutes: Option<i64>) -> ResolveAttempt {
        attempt(id, Some(day(d)), minutes, ResolveOutcome::Solved)
    }

    fn problem(id: i64, needs_review: bool) -> Problem {
        Problem {
            id,
            title: format!("Problem {}", id),
            source: "LeetCode".to_string(),
            link: String::new(),
            difficulty: String::new(),
            tags: String::new(),
            notes: String::new(),
            topic_id: None,
            first_logged_date: None,
            first_logged_minutes: 0,
            needs_review,
            review_priority: ReviewPriority::Normal,
            next_review_date: None,
            review_notes: String::new(),
            created_at: at(id),
        }
    }

    #[test]
    fn improvement_is_reported_as_down_arrow() {
        let stats = ResolveStats::from_attempts(&[solved(2, 5, Some(6)), solved(1, 1, Some(10))]);
        let progress = stats.progress.unwrap();
        assert_eq!(progress.label, "↓ 4 min");
        assert_eq!(progress.class, ProgressClass::Improved);
        assert_eq!(progress.minutes_path.as_deref(), Some("10 → 6"));
    }

    #[test]
    fn equal_times_are_steady() {
        let stats = ResolveStats::from_attempts(&[solved(1, 1, Some(5)), solved(2, 9, Some(5))]);
        let progress = stats.progress.unwrap();
        assert_eq!(progress.label, "→ steady");
        assert_eq!(progress.class, ProgressClass::Steady);
        assert_eq!(progress.minutes_path.as_deref(), Some("5 → 5"));
    }

    #[test]
    fn slower_latest_solve_is_a_regression() {
        let stats = ResolveStats::from_attempts(&[solved(1, 1, Some(4)), solved(2, 9, Some(9))]);
        let progress = stats.progress.unwrap();
        assert_eq!(progress.label, "↑ 5 min");
        assert_eq!(progress.class, ProgressClass::Regressed);
        assert_eq!(progress.minutes_path.as_deref(), Some("4 → 9"));
    }

    #[test]
    fn single_solve_is_baseline_with_minutes() {
        let stats = ResolveStats::from_attempts(&[solved(1, 3, Some(12))]);
        let progress = stats.progress.unwrap();
        assert_eq!(progress.label, "Baseline");
        assert_eq!(progress.minutes_path.as_deref(), Some("12 min"));
    }

    #[test]
    fn missing_minutes_on_either_endpoint_is_baseline() {
        let latest_missing =
            ResolveStats::from_attempts(&[solved(1, 1, Some(10)), solved(2, 5, None)]);
        let progress = latest_missing.progress.unwrap();
        assert_eq!(progress.label, "Baseline");
        assert_eq!(progress.minutes_path.as_deref(), Some("10 min"));

        let first_missing =
            ResolveStats::from_attempts(&[solved(1, 1, None), solved(2, 5, Some(7))]);
        let progress = first_missing.progress.unwrap();
        assert_eq!(progress.label, "Baseline");
        assert_eq!(progress.class, ProgressClass::Baseline);
        assert!(progress.minutes_path.is_none());
    }

    #[test]
    fn only_first_and_last_solve_are_compared() {
        let stats = ResolveStats::from_attempts(&[
            solved(1, 1, Some(20)),
            solved(2, 2, Some(3)),
            solved(3, 3, Some(40)),
            solved(4, 4, Some(15)),
        ]);
        assert_eq!(stats.progress.unwrap().label, "↓ 5 min");
        assert_eq!(stats.best_minutes, Some(3));
    }

    #[test]
    fn aggregates_skip_missing_minutes() {
        let stats = ResolveStats::from_attempts(&[
            solved(1, 1, Some(10)),
            solved(2, 2, None),
            solved(3, 3, Some(5)),
            attempt(4, Some(day(4)), Some(1), ResolveOutcome::NotSolved),
        ]);
        assert_eq!(stats.best_minutes, Some(5));
        assert_eq!(stats.avg_minutes, Some(7.5));
        assert_eq!(stats.solved_count, 3);
        assert_eq!(stats.attempt_count, 4);
    }

    #[test]
    fn solves_without_minutes_give_null_aggregates() {
        let stats = ResolveStats::from_attempts(&[solved(1, 1, None), solved(2, 2, None)]);
        assert_eq!(stats.best_minutes, None);
        assert_eq!(stats.avg_minutes, None);
        assert_eq!(stats.progress.unwrap().label, "Baseline");
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let stats = ResolveStats::from_attempts(&[
            solved(1, 1, Some(10)),
            solved(2, 2, Some(10)),
            solved(3, 3, Some(11)),
        ]);
        assert_eq!(stats.avg_minutes, Some(10.3));
    }

    #[test]
    fn unsolved_problem_has_no_progress() {
        let stats = ResolveStats::from_attempts(&[
            attempt(1, Some(day(1)), None, ResolveOutcome::Planned),
            attempt(2, Some(day(2)), Some(30), ResolveOutcome::NotSolved),
        ]);
        assert!(stats.progress.is_none());
        assert_eq!(stats.planned_count, 1);
        assert_eq!(stats.latest_outcome, Some(ResolveOutcome::NotSolved));
        assert_eq!(stats.latest_minutes, Some(30));
    }

    #[test]
    fn undated_attempts_sort_first() {
        let mut attempts = vec![
            solved(1, 2, Some(1)),
            attempt(2, None, Some(2), ResolveOutcome::Planned),
            solved(3, 1, Some(3)),
        ];
        sort_ascending(&mut attempts);
        let ids: Vec<i64> = attempts.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn same_day_attempts_order_by_creation_time() {
        let mut early = solved(9, 4, Some(1));
        early.created_at = at(1);
        let mut late = solved(3, 4, Some(2));
        late.created_at = at(50);

        let mut asc = vec![late.clone(), early.clone()];
        sort_ascending(&mut asc);
        assert_eq!(asc[0].id, 9);

        let mut desc = vec![early, late];
        sort_descending(&mut desc);
        assert_eq!(desc[0].id, 3);
    }

    #[test]
    fn descending_order_mirrors_ascending_order() {
        let attempts = vec![
            solved(1, 3, None),
            attempt(2, None, None, ResolveOutcome::Planned),
            solved(3, 1, None),
            solved(4, 3, None),
        ];
        let mut asc = attempts.clone();
        sort_ascending(&mut asc);
        let mut desc = attempts;
        sort_descending(&mut desc);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn summary_reports_most_recent_attempt() {
        let summary = ResolveSummary::from_attempts(&[
            solved(1, 1, Some(10)),
            attempt(2, Some(day(6)), None, ResolveOutcome::Planned),
            solved(3, 3, Some(8)),
        ]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.planned, 1);
        assert_eq!(summary.solved_count, 2);
        assert_eq!(summary.last_outcome, Some(ResolveOutcome::Planned));
        assert_eq!(summary.last_date, Some(day(6)));
        assert_eq!(summary.last_minutes, None);
    }

    #[test]
    fn history_entry_uses_latest_solve_and_latest_attempt() {
        let p = problem(1, false);
        let entry = HistoryEntry::build(
            &p,
            &[
                solved(1, 1, Some(10)),
                solved(2, 5, Some(6)),
                attempt(3, Some(day(8)), None, ResolveOutcome::Planned),
            ],
        )
        .unwrap();
        assert_eq!(entry.attempts, 3);
        assert_eq!(entry.latest_date, Some(day(5)));
        assert_eq!(entry.latest_minutes, Some(6));
        assert_eq!(entry.latest_outcome, Some(ResolveOutcome::Planned));
        assert_eq!(entry.first_date, Some(day(1)));
    }

    #[test]
    fn history_excludes_unsolved_and_sorts_latest_first() {
        let problems = vec![problem(1, false), problem(2, false), problem(3, false), problem(4, true)];
        let mut attempts = vec![solved(10, 3, Some(5)), solved(11, 7, Some(4))];
        attempts[1].problem_id = 2;
        let mut tie = solved(12, 7, Some(9));
        tie.problem_id = 3;
        attempts.push(tie);
        let mut planned = attempt(13, Some(day(9)), None, ResolveOutcome::Planned);
        planned.problem_id = 4;
        attempts.push(planned);

        let history = resolve_history(&problems, &group_by_problem(attempts));
        let ids: Vec<i64> = history.iter().map(|e| e.problem.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn review_queue_keeps_listing_order() {
        let problems = vec![problem(5, true), problem(4, false), problem(3, true)];
        let queue: Vec<i64> = review_queue(&problems).iter().map(|p| p.id).collect();
        assert_eq!(queue, vec![5, 3]);
    }
}
