use std::collections::HashSet;

use crate::error::AggregateError;
use crate::models::{GradeEntry, OverallAverage, PerformanceTier, SubjectAverage};

pub const EXCELLENT_THRESHOLD: f64 = 4.0;
pub const ACCEPTABLE_THRESHOLD: f64 = 3.5;

fn matching<'a>(
    entries: &'a [GradeEntry],
    subject: &'a str,
    period: i32,
) -> impl Iterator<Item = &'a GradeEntry> + 'a {
    entries
        .iter()
        .filter(move |entry| entry.subject == subject && entry.period == period)
}

/// Weighted mean of a subject's scores within one period, or 0.0 when the
/// subject has no entries there. Weights are scaled by the largest one so
/// the sums stay finite.
pub fn subject_average(entries: &[GradeEntry], subject: &str, period: i32) -> f64 {
    let max_weight = matching(entries, subject, period)
        .map(|entry| entry.weight)
        .fold(0.0, f64::max);
    if max_weight == 0.0 {
        return 0.0;
    }

    let (weighted, total_weight) = matching(entries, subject, period)
        .fold((0.0, 0.0), |(weighted, total), entry| {
            let weight = entry.weight / max_weight;
            (weighted + entry.score * weight, total + weight)
        });

    weighted / total_weight
}

/// Subject names in the order they first appear.
pub fn distinct_subjects(entries: &[GradeEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut subjects = Vec::new();

    for entry in entries {
        if seen.insert(entry.subject.as_str()) {
            subjects.push(entry.subject.clone());
        }
    }

    subjects
}

/// Unweighted mean of every subject's average in `period`. Subjects known
/// to the dataset but empty in this period count as zero; a period with no
/// entries at all is `InvalidInput`.
pub fn overall_average(entries: &[GradeEntry], period: i32) -> Result<f64, AggregateError> {
    if !entries.iter().any(|entry| entry.period == period) {
        return Err(AggregateError::InvalidInput { period });
    }
    let subjects = distinct_subjects(entries);

    let total: f64 = subjects
        .iter()
        .map(|subject| subject_average(entries, subject, period))
        .sum();

    Ok(total / subjects.len() as f64)
}

pub fn classify(average: f64) -> PerformanceTier {
    if average >= EXCELLENT_THRESHOLD {
        PerformanceTier::Excellent
    } else if average >= ACCEPTABLE_THRESHOLD {
        PerformanceTier::Acceptable
    } else {
        PerformanceTier::NeedsImprovement
    }
}

pub fn subject_summaries(entries: &[GradeEntry], period: i32) -> Vec<SubjectAverage> {
    distinct_subjects(entries)
        .into_iter()
        .map(|subject| {
            let entry_count = matching(entries, &subject, period).count();
            let average = subject_average(entries, &subject, period);
            SubjectAverage {
                subject,
                period,
                average,
                entry_count,
            }
        })
        .collect()
}

pub fn overall_summary(
    entries: &[GradeEntry],
    period: i32,
) -> Result<OverallAverage, AggregateError> {
    let average = overall_average(entries, period)?;
    Ok(OverallAverage {
        period,
        average,
        subject_count: distinct_subjects(entries).len(),
    })
}

pub fn entries_for<'a>(
    entries: &'a [GradeEntry],
    subject: &'a str,
    period: i32,
) -> Vec<&'a GradeEntry> {
    matching(entries, subject, period).collect()
}

/// Entries of a period, newest first. Entries sharing a date keep their
/// input order.
pub fn chronological(entries: &[GradeEntry], period: i32) -> Vec<&GradeEntry> {
    let mut values: Vec<&GradeEntry> = entries
        .iter()
        .filter(|entry| entry.period == period)
        .collect();
    values.sort_by(|a, b| b.date.cmp(&a.date));
    values
}

pub fn needs_reinforcement(average: f64) -> bool {
    average < EXCELLENT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssessmentType;
    use chrono::NaiveDate;

    fn sample_entry(subject: &str, period: i32, score: f64, weight: f64) -> GradeEntry {
        GradeEntry {
            id: format!("{subject}-{period}-{score}"),
            subject: subject.to_string(),
            assessment_type: AssessmentType::Exam,
            title: "assessment".to_string(),
            score,
            date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            period,
            weight,
        }
    }

    fn dated(subject: &str, day: u32) -> GradeEntry {
        let mut entry = sample_entry(subject, 4, 4.0, 10.0);
        entry.id = format!("{subject}-{day}");
        entry.date = NaiveDate::from_ymd_opt(2024, 11, day).unwrap();
        entry
    }

    fn math_period_four() -> Vec<GradeEntry> {
        vec![
            sample_entry("Math", 4, 4.5, 30.0),
            sample_entry("Math", 4, 4.2, 20.0),
            sample_entry("Math", 4, 4.8, 10.0),
        ]
    }

    #[test]
    fn weighted_mean_normalizes_weights() {
        let entries = math_period_four();
        let average = subject_average(&entries, "Math", 4);
        assert!((average - 4.45).abs() < 1e-9);
    }

    #[test]
    fn subject_average_is_zero_without_matches() {
        let entries = math_period_four();
        assert_eq!(subject_average(&entries, "Math", 3), 0.0);
        assert_eq!(subject_average(&entries, "math", 4), 0.0);
        assert_eq!(subject_average(&[], "Math", 4), 0.0);
    }

    #[test]
    fn subject_average_stays_within_score_bounds() {
        let entries = vec![
            sample_entry("Science", 2, 2.5, 5.0),
            sample_entry("Science", 2, 4.9, 70.0),
            sample_entry("Science", 2, 3.1, 0.5),
        ];
        let average = subject_average(&entries, "Science", 2);
        assert!((2.5..=4.9).contains(&average));
    }

    #[test]
    fn subject_average_ignores_entry_order() {
        let entries = vec![
            sample_entry("Science", 2, 2.5, 5.0),
            sample_entry("Science", 2, 4.9, 70.0),
            sample_entry("Science", 2, 3.1, 12.0),
        ];
        let mut reversed = entries.clone();
        reversed.reverse();
        let forward = subject_average(&entries, "Science", 2);
        let backward = subject_average(&reversed, "Science", 2);
        assert!((forward - backward).abs() < 1e-12);
    }

    #[test]
    fn distinct_subjects_keep_first_seen_order() {
        let entries = vec![
            sample_entry("Spanish", 4, 4.0, 10.0),
            sample_entry("Math", 4, 4.0, 10.0),
            sample_entry("Spanish", 3, 4.0, 10.0),
            sample_entry("Art", 3, 4.0, 10.0),
        ];
        assert_eq!(distinct_subjects(&entries), vec!["Spanish", "Math", "Art"]);
    }

    #[test]
    fn overall_average_is_unweighted_across_subjects() {
        let mut entries = math_period_four();
        entries.push(sample_entry("Spanish", 4, 4.0, 35.0));

        let overall = overall_average(&entries, 4).unwrap();
        assert!((overall - 4.225).abs() < 1e-9);
        assert_eq!(classify(overall), PerformanceTier::Excellent);
    }

    #[test]
    fn subjects_missing_from_period_count_as_zero() {
        let mut entries = math_period_four();
        entries.push(sample_entry("Art", 3, 5.0, 10.0));

        assert_eq!(subject_average(&entries, "Art", 4), 0.0);
        let overall = overall_average(&entries, 4).unwrap();
        assert!((overall - 4.45 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn overall_average_rejects_empty_dataset() {
        assert_eq!(
            overall_average(&[], 4),
            Err(AggregateError::InvalidInput { period: 4 })
        );
    }

    #[test]
    fn overall_average_rejects_period_without_entries() {
        let mut entries = math_period_four();
        entries.push(sample_entry("Art", 3, 5.0, 10.0));

        assert_eq!(
            overall_average(&entries, 1),
            Err(AggregateError::InvalidInput { period: 1 })
        );
        assert!(overall_summary(&entries, 1).is_err());
        assert!(overall_average(&entries, 3).is_ok());
    }

    #[test]
    fn huge_weights_stay_within_score_bounds() {
        let entries = vec![
            sample_entry("Math", 4, 4.5, 1e308),
            sample_entry("Math", 4, 4.2, 1e308),
            sample_entry("Math", 4, 4.8, 5e307),
        ];
        let average = subject_average(&entries, "Math", 4);
        assert!(average.is_finite());
        assert!((4.2..=4.8).contains(&average));
        assert!((average - (4.5 * 2.0 + 4.2 * 2.0 + 4.8) / 5.0).abs() < 1e-9);
    }

    #[test]
    fn classify_boundaries_round_up() {
        assert_eq!(classify(4.0), PerformanceTier::Excellent);
        assert_eq!(classify(3.999), PerformanceTier::Acceptable);
        assert_eq!(classify(3.5), PerformanceTier::Acceptable);
        assert_eq!(classify(3.499), PerformanceTier::NeedsImprovement);
    }

    #[test]
    fn summaries_report_period_entry_counts() {
        let mut entries = math_period_four();
        entries.push(sample_entry("Art", 3, 5.0, 10.0));

        let summaries = subject_summaries(&entries, 4);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].subject, "Math");
        assert_eq!(summaries[0].entry_count, 3);
        assert_eq!(summaries[1].subject, "Art");
        assert_eq!(summaries[1].entry_count, 0);
        assert_eq!(summaries[1].average, 0.0);

        let overall = overall_summary(&entries, 4).unwrap();
        assert_eq!(overall.subject_count, 2);
    }

    #[test]
    fn chronological_orders_newest_first() {
        let entries = vec![dated("Math", 3), dated("Spanish", 9), dated("Art", 3)];
        let ordered: Vec<&str> = chronological(&entries, 4)
            .iter()
            .map(|entry| entry.id.as_str())
            .collect();
        assert_eq!(ordered, vec!["Spanish-9", "Math-3", "Art-3"]);
        assert!(chronological(&entries, 1).is_empty());
    }

    #[test]
    fn drill_down_filters_subject_and_period() {
        let mut entries = math_period_four();
        entries.push(sample_entry("Math", 3, 3.9, 40.0));
        assert_eq!(entries_for(&entries, "Math", 4).len(), 3);
        assert_eq!(entries_for(&entries, "Math", 3).len(), 1);
    }

    #[test]
    fn reinforcement_below_excellent() {
        assert!(needs_reinforcement(3.99));
        assert!(!needs_reinforcement(4.0));
    }
}
