//! Core types for the todo API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Task priority level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Parse a priority string. Anything outside the three enumerated
    /// levels is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Ordering rank: high sorts first.
    pub fn rank(&self) -> i32 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// A task record.
///
/// `done` lives in the database as an integer flag; `due_date` as an ISO
/// YYYY-MM-DD string. Both are converted at the row boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub done: bool,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub priority: Priority,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
}

/// Validated fields for creating or replacing a task.
///
/// `priority: None` means "default to medium" on create and "keep the
/// stored value" on update; every other field is replace semantics.
#[derive(Debug, Clone, Default)]
pub struct TaskFields {
    pub title: String,
    pub done: bool,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

/// A registered user account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// Public view of a user (no credential material).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Aggregate statistics over the visible task collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub overdue: i64,
    pub high_priority_pending: i64,
    /// Percentage of tasks completed, rounded to two decimals. Zero when
    /// there are no tasks.
    pub completion_rate: f64,
    pub by_category: HashMap<String, i64>,
    /// Counts keyed by the priority values present in the collection.
    pub by_priority: HashMap<String, i64>,
}

/// Composite dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub priorities: PendingByPriority,
    pub categories: CategoryBreakdown,
    pub timeline: Timeline,
    pub insights: Insights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub completion_rate: f64,
}

/// Pending-task counts per priority level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingByPriority {
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

/// A category with its task count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Up to three categories by descending task count.
    pub top: Vec<CategoryCount>,
    pub overdue_by_category: HashMap<String, i64>,
}

/// Activity counts over a seven-day window on each side of now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub due_next_7_days: i64,
    pub completed_last_7_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insights {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_used_category: Option<String>,
    /// True when any category has overdue tasks.
    pub needs_attention: bool,
    /// "high" while high-priority tasks are pending, otherwise "medium".
    pub suggested_focus: String,
}
