// 📈 Metric Time-Series Builder
// Turns sparse biometric logs into the chart series of the member
// progress page: one point per log that carries the chosen metric,
// with the change against the previous charted point.

use crate::db::BiometricLog;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// TRAILING WINDOW
// ============================================================================

/// Fixed-length lookback of N days ending at a caller-supplied `today`.
/// The dashboard presets are 7 / 30 / 90.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingWindow {
    pub days: u32,
}

impl TrailingWindow {
    pub fn new(days: u32) -> Self {
        TrailingWindow { days }
    }

    pub fn last_week() -> Self {
        TrailingWindow { days: 7 }
    }

    pub fn last_month() -> Self {
        TrailingWindow { days: 30 }
    }

    pub fn last_quarter() -> Self {
        TrailingWindow { days: 90 }
    }

    /// First date inside the window. A 7-day window ending today
    /// covers today and the 6 days before it.
    pub fn start_date(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.days.saturating_sub(1) as i64)
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date >= self.start_date(today) && date <= today
    }
}

// ============================================================================
// METRIC SELECTION
// ============================================================================

/// Which optional field of a biometric log feeds the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    WeightKg,
    BodyFatPct,
    MuscleMassKg,
}

impl MetricKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::WeightKg => "weight_kg",
            MetricKey::BodyFatPct => "body_fat_pct",
            MetricKey::MuscleMassKg => "muscle_mass_kg",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "weight_kg" => Some(MetricKey::WeightKg),
            "body_fat_pct" => Some(MetricKey::BodyFatPct),
            "muscle_mass_kg" => Some(MetricKey::MuscleMassKg),
            _ => None,
        }
    }

    /// The metric's value on a log, if the member recorded it that day.
    pub fn extract(&self, log: &BiometricLog) -> Option<f64> {
        match self {
            MetricKey::WeightKg => log.weight_kg,
            MetricKey::BodyFatPct => log.body_fat_pct,
            MetricKey::MuscleMassKg => log.muscle_mass_kg,
        }
    }
}

// ============================================================================
// SERIES
// ============================================================================

/// One charted point. `delta` is against the previous point in the
/// filtered series, not the calendar-adjacent day; the first point
/// has no delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub delta: Option<f64>,
}

/// Build the ordered series for one metric inside the trailing window.
///
/// Logs missing the metric are dropped, never coerced to zero, so the
/// series length is at most the number of logs that carry the metric.
/// Recomputed from scratch on every window or data change; nothing is
/// cached between calls.
pub fn build_series(
    logs: &[BiometricLog],
    key: MetricKey,
    window: TrailingWindow,
    today: NaiveDate,
) -> Vec<MetricPoint> {
    let mut dated: Vec<(NaiveDate, f64)> = logs
        .iter()
        .filter(|log| window.contains(log.date, today))
        .filter_map(|log| key.extract(log).map(|value| (log.date, value)))
        .collect();

    dated.sort_by_key(|(date, _)| *date);

    let mut series = Vec::with_capacity(dated.len());
    let mut previous: Option<f64> = None;

    for (date, value) in dated {
        series.push(MetricPoint {
            date,
            value,
            delta: previous.map(|prev| value - prev),
        });
        previous = Some(value);
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn log(date: &str, weight: Option<f64>, body_fat: Option<f64>) -> BiometricLog {
        BiometricLog {
            member_id: "m-1".to_string(),
            date: day(date),
            weight_kg: weight,
            height_cm: None,
            body_fat_pct: body_fat,
            muscle_mass_kg: None,
        }
    }

    #[test]
    fn test_series_worked_example() {
        // Two weigh-ins a week apart: 80 then 78, delta -2
        let logs = vec![
            log("2024-01-01", Some(80.0), None),
            log("2024-01-08", Some(78.0), None),
        ];

        let series = build_series(
            &logs,
            MetricKey::WeightKg,
            TrailingWindow::last_month(),
            day("2024-01-10"),
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value, 80.0);
        assert_eq!(series[0].delta, None);
        assert_eq!(series[1].value, 78.0);
        assert_eq!(series[1].delta, Some(-2.0));
    }

    #[test]
    fn test_absent_metric_dropped_not_zeroed() {
        let logs = vec![
            log("2024-01-01", Some(80.0), Some(20.0)),
            log("2024-01-03", None, Some(19.5)),
            log("2024-01-05", Some(79.0), None),
        ];

        let weight = build_series(
            &logs,
            MetricKey::WeightKg,
            TrailingWindow::last_month(),
            day("2024-01-06"),
        );
        assert_eq!(weight.len(), 2);
        // Delta bridges over the log that skipped the weigh-in
        assert_eq!(weight[1].delta, Some(-1.0));

        let body_fat = build_series(
            &logs,
            MetricKey::BodyFatPct,
            TrailingWindow::last_month(),
            day("2024-01-06"),
        );
        assert_eq!(body_fat.len(), 2);
        assert_eq!(body_fat[1].delta, Some(-0.5));
    }

    #[test]
    fn test_unsorted_input_sorted_by_date() {
        let logs = vec![
            log("2024-01-09", Some(77.0), None),
            log("2024-01-01", Some(80.0), None),
            log("2024-01-05", Some(78.5), None),
        ];

        let series = build_series(
            &logs,
            MetricKey::WeightKg,
            TrailingWindow::last_month(),
            day("2024-01-10"),
        );

        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![day("2024-01-01"), day("2024-01-05"), day("2024-01-09")]
        );
        assert_eq!(series[1].delta, Some(-1.5));
        assert_eq!(series[2].delta, Some(-1.5));
    }

    #[test]
    fn test_delta_chain_property() {
        let logs = vec![
            log("2024-01-01", Some(80.0), None),
            log("2024-01-02", Some(81.2), None),
            log("2024-01-04", Some(79.9), None),
            log("2024-01-07", Some(80.4), None),
        ];

        let series = build_series(
            &logs,
            MetricKey::WeightKg,
            TrailingWindow::last_month(),
            day("2024-01-08"),
        );

        assert_eq!(series[0].delta, None);
        for i in 1..series.len() {
            assert_eq!(
                series[i].delta,
                Some(series[i].value - series[i - 1].value)
            );
        }
    }

    #[test]
    fn test_trailing_window_excludes_older_points() {
        let logs = vec![
            log("2024-01-01", Some(82.0), None),
            log("2024-01-20", Some(80.0), None),
            log("2024-01-26", Some(79.0), None),
        ];

        // 7-day window ending 2024-01-26 starts at 2024-01-20
        let series = build_series(
            &logs,
            MetricKey::WeightKg,
            TrailingWindow::last_week(),
            day("2024-01-26"),
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, day("2024-01-20"));
        // First surviving point loses its delta even though an older log exists
        assert_eq!(series[0].delta, None);
    }

    #[test]
    fn test_window_start_date() {
        let today = day("2024-03-10");
        assert_eq!(
            TrailingWindow::last_week().start_date(today),
            day("2024-03-04")
        );
        assert_eq!(TrailingWindow::new(1).start_date(today), today);
    }

    #[test]
    fn test_empty_and_metricless_inputs() {
        let empty = build_series(
            &[],
            MetricKey::MuscleMassKg,
            TrailingWindow::last_quarter(),
            day("2024-01-01"),
        );
        assert!(empty.is_empty());

        let metricless = vec![log("2024-01-01", None, None)];
        let series = build_series(
            &metricless,
            MetricKey::MuscleMassKg,
            TrailingWindow::last_quarter(),
            day("2024-01-02"),
        );
        assert!(series.is_empty());
    }
}
