use std::fmt::Write;

use crate::alerts::{self, AlertInbox};
use crate::error::AggregateError;
use crate::grades;
use crate::models::{GradeEntry, Student, MAX_SCORE};

const RECENT_LIMIT: usize = 10;

pub fn build_report(student: &Student, period: i32, entries: &[GradeEntry]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Grade Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}), period {}",
        student.full_name, student.grade_level, period
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall Average");

    let overall = match grades::overall_average(entries, period) {
        Ok(average) => {
            let _ = writeln!(
                output,
                "{:.2} / {:.1} ({})",
                average,
                MAX_SCORE,
                grades::classify(average)
            );
            Some(average)
        }
        Err(AggregateError::InvalidInput { .. }) => {
            let _ = writeln!(output, "No grades recorded for period {}.", period);
            None
        }
    };

    let summaries = grades::subject_summaries(entries, period);
    let _ = writeln!(output);
    let _ = writeln!(output, "## By Subject");

    if summaries.is_empty() {
        let _ = writeln!(output, "No subjects recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {:.2} across {} assessments ({})",
                summary.subject,
                summary.average,
                summary.entry_count,
                grades::classify(summary.average)
            );
        }
    }

    if overall.is_some_and(grades::needs_reinforcement) {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Recommendations");
        let _ = writeln!(
            output,
            "Reinforce study in the lowest-scoring subjects. Set aside more practice time and bring questions to the teachers."
        );
    }

    let recent = grades::chronological(entries, period);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Assessments");

    if recent.is_empty() {
        let _ = writeln!(output, "No assessments recorded for this period.");
    } else {
        for entry in recent.iter().take(RECENT_LIMIT) {
            let _ = writeln!(
                output,
                "- {} {} ({}): {} scored {:.1}, weight {}%",
                entry.date,
                entry.subject,
                entry.assessment_type,
                entry.title,
                entry.score,
                entry.weight
            );
        }
    }

    let inbox = AlertInbox::new(alerts::performance_alerts(entries, period));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Alerts ({} unread)", inbox.unread_count());

    if inbox.unread_count() == 0 {
        let _ = writeln!(output, "No academic alerts for this period.");
    } else {
        for alert in inbox.unread() {
            let _ = writeln!(
                output,
                "- [{}] {}: {}",
                alert.priority.label(),
                alert.title,
                alert.description
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{demo_entries, demo_student};

    #[test]
    fn demo_report_lists_every_section() {
        let entries = demo_entries().unwrap();
        let report = build_report(&demo_student(), 4, &entries);

        assert!(report.starts_with("# Grade Report"));
        assert!(report.contains("Ana González (5th Grade A), period 4"));
        assert!(report.contains("- Mathematics: 4.45 across 3 assessments (Excellent)"));
        assert!(report.contains("## Recent Assessments"));
        assert!(report.contains("2024-11-10 Mathematics (exam): Chapter 5 exam scored 4.5"));
        assert!(!report.contains("Term exam"));
    }

    #[test]
    fn empty_dataset_reports_no_data() {
        let report = build_report(&demo_student(), 4, &[]);
        assert!(report.contains("No grades recorded for period 4."));
        assert!(report.contains("No subjects recorded."));
        assert!(!report.contains("## Recommendations"));
        assert!(report.contains("## Alerts (0 unread)"));
    }

    #[test]
    fn period_without_grades_reports_no_data() {
        let entries = demo_entries().unwrap();
        let report = build_report(&demo_student(), 1, &entries);

        assert!(report.contains("No grades recorded for period 1."));
        assert!(!report.contains("## Recommendations"));
        assert!(report.contains("No assessments recorded for this period."));
    }

    #[test]
    fn earlier_period_recommends_reinforcement() {
        let entries = demo_entries().unwrap();
        let report = build_report(&demo_student(), 3, &entries);

        assert!(report.contains("- Spanish: 0.00 across 0 assessments (Needs improvement)"));
        assert!(report.contains("## Recommendations"));
        assert!(report.contains("## Alerts (1 unread)"));
        assert!(report.contains("[important] Mathematics average needs attention"));
    }
}
