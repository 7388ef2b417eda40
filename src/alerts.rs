use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::grades;
use crate::models::{GradeEntry, PerformanceTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertPriority {
    Urgent,
    Important,
    Info,
}

impl AlertPriority {
    pub fn label(&self) -> &'static str {
        match self {
            AlertPriority::Urgent => "urgent",
            AlertPriority::Important => "important",
            AlertPriority::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertCategory {
    Academic,
    Administrative,
    Event,
    Message,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub priority: AlertPriority,
    pub category: AlertCategory,
    pub title: String,
    pub description: String,
    pub raised_on: NaiveDate,
    pub read: bool,
}

/// Raises an academic alert for each subject graded in `period` whose
/// average falls below the excellent tier.
pub fn performance_alerts(entries: &[GradeEntry], period: i32) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for summary in grades::subject_summaries(entries, period) {
        let Some(raised_on) = grades::entries_for(entries, &summary.subject, period)
            .iter()
            .map(|entry| entry.date)
            .max()
        else {
            continue;
        };

        let (priority, title) = match grades::classify(summary.average) {
            PerformanceTier::Excellent => continue,
            PerformanceTier::Acceptable => (
                AlertPriority::Important,
                format!("{} average needs attention", summary.subject),
            ),
            PerformanceTier::NeedsImprovement => (
                AlertPriority::Urgent,
                format!("Low performance in {}", summary.subject),
            ),
        };

        alerts.push(Alert {
            id: Uuid::new_v4(),
            priority,
            category: AlertCategory::Academic,
            title,
            description: format!(
                "Weighted average {:.2} across {} assessments in period {}. Review the topics with the student.",
                summary.average, summary.entry_count, period
            ),
            raised_on,
            read: false,
        });
    }

    alerts
}

#[derive(Debug, Clone, Default)]
pub struct AlertInbox {
    alerts: Vec<Alert>,
}

impl AlertInbox {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn unread_count(&self) -> usize {
        self.alerts.iter().filter(|alert| !alert.read).count()
    }

    pub fn unread(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|alert| !alert.read).collect()
    }

    pub fn in_category(&self, category: AlertCategory) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|alert| alert.category == category)
            .collect()
    }

    /// Returns false when no alert carries `id`.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.alerts.iter_mut().find(|alert| alert.id == id) {
            Some(alert) => {
                alert.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for alert in self.alerts.iter_mut() {
            alert.read = true;
        }
    }
}
