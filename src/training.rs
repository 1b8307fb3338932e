// 🏋️ Training Aggregators
// Per-day session volume for the progress chart, and the
// personal-record table for the member dashboard.

use crate::catalog::{GENERIC_EXERCISE, PR_TABLE_CAP, VOLUME_DAY_CAP};
use crate::db::{SessionEntry, SessionLog};
use crate::progress::TrailingWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// SESSION VOLUME
// ============================================================================

/// One bar of the volume chart: all sessions of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolume {
    pub day: NaiveDate,
    /// Σ sets × reps × weight over every entry that day; missing weight counts as 0
    pub volume: f64,
    /// Number of sessions logged that day
    pub sessions: usize,
}

fn entry_volume(entry: &SessionEntry) -> f64 {
    entry.sets_completed as f64 * entry.reps_completed as f64 * entry.weight_kg.unwrap_or(0.0)
}

/// Group windowed sessions by calendar day and sum their volume.
///
/// Output is ordered ascending by day and capped to the most recent
/// 90 grouped days; older groups are silently dropped, not an error.
pub fn daily_volume(
    sessions: &[SessionLog],
    window: TrailingWindow,
    today: NaiveDate,
) -> Vec<DailyVolume> {
    let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for session in sessions {
        let day = session.day();
        if !window.contains(day, today) {
            continue;
        }

        let volume: f64 = session.entries.iter().map(entry_volume).sum();
        let slot = by_day.entry(day).or_insert((0.0, 0));
        slot.0 += volume;
        slot.1 += 1;
    }

    let mut groups: Vec<DailyVolume> = by_day
        .into_iter()
        .map(|(day, (volume, sessions))| DailyVolume {
            day,
            volume,
            sessions,
        })
        .collect();

    if groups.len() > VOLUME_DAY_CAP {
        groups.drain(..groups.len() - VOLUME_DAY_CAP);
    }

    groups
}

// ============================================================================
// PERSONAL RECORDS
// ============================================================================

/// Per-exercise bests for the PR table. The two bests are tracked
/// independently: the heaviest entry and the highest-rep entry can be
/// different sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub exercise: String,
    pub best_weight: f64,
    pub best_weight_reps: u32,
    pub best_reps: u32,
    pub best_reps_weight: f64,
}

impl ExerciseRecord {
    fn from_entry(exercise: String, entry: &SessionEntry) -> Self {
        let weight = entry.weight_kg.unwrap_or(0.0);
        ExerciseRecord {
            exercise,
            best_weight: weight,
            best_weight_reps: entry.reps_completed,
            best_reps: entry.reps_completed,
            best_reps_weight: weight,
        }
    }

    /// Fold one more entry into the record. On an exact tie the higher
    /// secondary metric wins; encounter order never decides.
    fn absorb(&mut self, entry: &SessionEntry) {
        let weight = entry.weight_kg.unwrap_or(0.0);
        let reps = entry.reps_completed;

        if weight > self.best_weight || (weight == self.best_weight && reps > self.best_weight_reps)
        {
            self.best_weight = weight;
            self.best_weight_reps = reps;
        }

        if reps > self.best_reps || (reps == self.best_reps && weight > self.best_reps_weight) {
            self.best_reps = reps;
            self.best_reps_weight = weight;
        }
    }
}

fn normalize_exercise_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        GENERIC_EXERCISE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the PR leaderboard from windowed sessions: flatten entries,
/// group by exercise name, track both bests, sort descending by best
/// weight, truncate to the top 12.
pub fn personal_records(
    sessions: &[SessionLog],
    window: TrailingWindow,
    today: NaiveDate,
) -> Vec<ExerciseRecord> {
    let mut by_exercise: HashMap<String, ExerciseRecord> = HashMap::new();

    for session in sessions {
        if !window.contains(session.day(), today) {
            continue;
        }

        for entry in &session.entries {
            let name = normalize_exercise_name(&entry.exercise_name);
            match by_exercise.get_mut(&name) {
                Some(record) => record.absorb(entry),
                None => {
                    by_exercise.insert(name.clone(), ExerciseRecord::from_entry(name, entry));
                }
            }
        }
    }

    let mut records: Vec<ExerciseRecord> = by_exercise.into_values().collect();

    // Heaviest lifts first; name as the stable secondary key
    records.sort_by(|a, b| {
        b.best_weight
            .partial_cmp(&a.best_weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.exercise.cmp(&b.exercise))
    });
    records.truncate(PR_TABLE_CAP);

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::parse_timestamp;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn entry(name: &str, sets: u32, reps: u32, weight: Option<f64>) -> SessionEntry {
        SessionEntry {
            exercise_name: name.to_string(),
            sets_completed: sets,
            reps_completed: reps,
            weight_kg: weight,
        }
    }

    fn session(performed_at: &str, entries: Vec<SessionEntry>) -> SessionLog {
        SessionLog {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: "m-1".to_string(),
            performed_at: parse_timestamp(performed_at).unwrap(),
            entries,
        }
    }

    #[test]
    fn test_daily_volume_sums_entries() {
        let sessions = vec![
            session(
                "2024-01-05T07:00:00Z",
                vec![
                    entry("Squat", 5, 5, Some(100.0)),   // 2500
                    entry("Bench", 3, 10, Some(60.0)),   // 1800
                ],
            ),
            session(
                "2024-01-05T18:00:00Z",
                vec![entry("Deadlift", 2, 5, Some(140.0))], // 1400
            ),
            session("2024-01-06T07:00:00Z", vec![entry("Row", 4, 8, Some(50.0))]),
        ];

        let groups = daily_volume(&sessions, TrailingWindow::last_month(), day("2024-01-10"));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].day, day("2024-01-05"));
        assert_eq!(groups[0].volume, 5700.0);
        assert_eq!(groups[0].sessions, 2);
        assert_eq!(groups[1].day, day("2024-01-06"));
        assert_eq!(groups[1].sessions, 1);
    }

    #[test]
    fn test_same_day_grouping_ignores_time_of_day() {
        let sessions = vec![
            session("2024-01-05T00:10:00Z", vec![entry("Squat", 1, 1, Some(10.0))]),
            session("2024-01-05T23:50:00Z", vec![entry("Squat", 1, 1, Some(10.0))]),
        ];

        let groups = daily_volume(&sessions, TrailingWindow::last_month(), day("2024-01-10"));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sessions, 2);
        assert_eq!(groups[0].volume, 20.0);
    }

    #[test]
    fn test_missing_weight_counts_as_zero_volume() {
        let sessions = vec![session(
            "2024-01-05T07:00:00Z",
            vec![
                entry("Plank", 3, 1, None),          // bodyweight: 0 volume
                entry("Squat", 2, 5, Some(80.0)),    // 800
            ],
        )];

        let groups = daily_volume(&sessions, TrailingWindow::last_month(), day("2024-01-10"));
        assert_eq!(groups[0].volume, 800.0);
    }

    #[test]
    fn test_volume_cap_drops_oldest_groups() {
        let start = day("2023-06-01");
        let sessions: Vec<SessionLog> = (0..100)
            .map(|i| {
                let d = start + chrono::Duration::days(i);
                session(
                    &format!("{}T08:00:00Z", d.format("%Y-%m-%d")),
                    vec![entry("Squat", 1, 1, Some(1.0))],
                )
            })
            .collect();

        let today = start + chrono::Duration::days(99);
        let groups = daily_volume(&sessions, TrailingWindow::new(365), today);

        assert_eq!(groups.len(), VOLUME_DAY_CAP);
        // The oldest 10 grouped days are silently dropped
        assert_eq!(groups[0].day, start + chrono::Duration::days(10));
        assert_eq!(groups.last().unwrap().day, today);
    }

    #[test]
    fn test_pr_worked_example() {
        // Same weight, more reps: the 8-rep set owns the weight PR
        let sessions = vec![session(
            "2024-01-05T07:00:00Z",
            vec![
                entry("Squat", 1, 5, Some(100.0)),
                entry("Squat", 1, 8, Some(100.0)),
            ],
        )];

        let records = personal_records(&sessions, TrailingWindow::last_month(), day("2024-01-10"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].best_weight, 100.0);
        assert_eq!(records[0].best_weight_reps, 8);
    }

    #[test]
    fn test_pr_tie_breaks_ignore_encounter_order() {
        // Higher secondary metric arrives first; the later equal-primary
        // entry must not displace it
        let sessions = vec![session(
            "2024-01-05T07:00:00Z",
            vec![
                entry("Bench", 1, 8, Some(100.0)),
                entry("Bench", 1, 5, Some(100.0)),
                entry("Bench", 1, 12, Some(40.0)),
                entry("Bench", 1, 12, Some(60.0)),
            ],
        )];

        let records = personal_records(&sessions, TrailingWindow::last_month(), day("2024-01-10"));
        let bench = &records[0];

        assert_eq!(bench.best_weight, 100.0);
        assert_eq!(bench.best_weight_reps, 8);
        assert_eq!(bench.best_reps, 12);
        assert_eq!(bench.best_reps_weight, 60.0);
    }

    #[test]
    fn test_pr_bests_tracked_independently() {
        let sessions = vec![session(
            "2024-01-05T07:00:00Z",
            vec![
                entry("Deadlift", 1, 3, Some(180.0)),
                entry("Deadlift", 1, 15, Some(90.0)),
            ],
        )];

        let records = personal_records(&sessions, TrailingWindow::last_month(), day("2024-01-10"));
        let dl = &records[0];

        assert_eq!(dl.best_weight, 180.0);
        assert_eq!(dl.best_weight_reps, 3);
        assert_eq!(dl.best_reps, 15);
        assert_eq!(dl.best_reps_weight, 90.0);
    }

    #[test]
    fn test_blank_exercise_name_gets_placeholder() {
        let sessions = vec![session(
            "2024-01-05T07:00:00Z",
            vec![
                entry("  ", 1, 10, Some(20.0)),
                entry("", 1, 12, Some(20.0)),
                entry(" Squat ", 1, 5, Some(100.0)),
            ],
        )];

        let records = personal_records(&sessions, TrailingWindow::last_month(), day("2024-01-10"));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].exercise, "Squat");
        // Both unnamed entries merged under the placeholder
        assert_eq!(records[1].exercise, GENERIC_EXERCISE);
        assert_eq!(records[1].best_reps, 12);
    }

    #[test]
    fn test_pr_table_sorted_and_truncated() {
        let entries: Vec<SessionEntry> = (0..20)
            .map(|i| entry(&format!("Exercise {:02}", i), 1, 5, Some(10.0 * i as f64)))
            .collect();
        let sessions = vec![session("2024-01-05T07:00:00Z", entries)];

        let records = personal_records(&sessions, TrailingWindow::last_month(), day("2024-01-10"));

        assert_eq!(records.len(), PR_TABLE_CAP);
        assert_eq!(records[0].best_weight, 190.0);
        for pair in records.windows(2) {
            assert!(pair[0].best_weight >= pair[1].best_weight);
        }
    }

    #[test]
    fn test_window_excludes_old_sessions() {
        let sessions = vec![
            session("2023-11-01T07:00:00Z", vec![entry("Squat", 1, 5, Some(200.0))]),
            session("2024-01-05T07:00:00Z", vec![entry("Squat", 1, 5, Some(100.0))]),
        ];

        let records = personal_records(&sessions, TrailingWindow::last_month(), day("2024-01-10"));
        // The 200 kg lift is outside the trailing month
        assert_eq!(records[0].best_weight, 100.0);
    }
}
