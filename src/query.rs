//! Typed construction of task list queries.
//!
//! The list endpoint's filter/sort/pagination parameters are parsed into
//! a [`TaskQuery`] at the HTTP boundary and rendered into SQL here.
//! Filter values only ever reach the database as bound parameters; the
//! ORDER BY clause comes from a fixed whitelist.

use crate::types::Priority;
use chrono::{Days, NaiveDate};

/// Record selector from the `filter_by` parameter. The variants are
/// mutually exclusive; at most one is active per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    /// Due before today and not done.
    Overdue,
    /// Due exactly today.
    DueToday,
    /// Due within the next seven days, inclusive on both ends.
    DueThisWeek,
    Completed,
    Pending,
    /// Shortcut for an exact priority match.
    Priority(Priority),
}

impl TaskFilter {
    /// Parse a `filter_by` value. Unrecognized values yield `None` and
    /// the parameter is ignored.
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "overdue" => Some(TaskFilter::Overdue),
            "today" => Some(TaskFilter::DueToday),
            "week" => Some(TaskFilter::DueThisWeek),
            "completed" => Some(TaskFilter::Completed),
            "pending" => Some(TaskFilter::Pending),
            other => Priority::parse(other).map(TaskFilter::Priority),
        }
    }
}

/// Result ordering from the `sort_by` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSort {
    /// Due date ascending, undated tasks last, newest id first on ties.
    Date,
    /// Category alphabetically, uncategorized last, then due date.
    Category,
    /// Priority rank (high first), then due date.
    #[default]
    Priority,
    /// Newest tasks first.
    Created,
}

impl TaskSort {
    /// Parse a `sort_by` value. Unrecognized values yield `None` and the
    /// caller falls back to the default priority ordering.
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "date" => Some(TaskSort::Date),
            "category" => Some(TaskSort::Category),
            "priority" => Some(TaskSort::Priority),
            "created" => Some(TaskSort::Created),
            _ => None,
        }
    }

    /// Whitelisted ORDER BY clause for this ordering.
    ///
    /// SQLite sorts NULL before everything, so the nulls-last orderings
    /// lead with an `IS NULL` key. Final `id` keys make ties stable.
    pub fn order_clause(&self) -> &'static str {
        match self {
            TaskSort::Date => "due_date IS NULL, due_date ASC, id DESC",
            TaskSort::Category => "category IS NULL, category ASC, due_date ASC, id ASC",
            TaskSort::Priority => {
                "CASE priority WHEN 'high' THEN 1 WHEN 'medium' THEN 2 WHEN 'low' THEN 3 ELSE 4 END, \
                 due_date ASC, id ASC"
            }
            TaskSort::Created => "id DESC",
        }
    }
}

/// A fully parsed task list query.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub filter: Option<TaskFilter>,
    /// Exact-match category predicate, AND-composed with `filter`.
    pub category: Option<String>,
    /// Exact-match priority predicate, AND-composed with `filter`.
    pub priority: Option<Priority>,
    pub sort: TaskSort,
    /// Page size. Pagination only applies when this is set; an offset
    /// without a limit has no effect.
    pub limit: Option<i64>,
    pub offset: i64,
}

impl TaskQuery {
    /// Render the WHERE conditions for this query, evaluated against the
    /// given "today". Clauses and parameters are returned in lockstep.
    pub fn conditions(&self, today: NaiveDate) -> (Vec<String>, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(filter) = self.filter {
            match filter {
                TaskFilter::Overdue => {
                    clauses.push("due_date < ? AND done = 0".to_string());
                    params.push(Box::new(today.to_string()));
                }
                TaskFilter::DueToday => {
                    clauses.push("due_date = ?".to_string());
                    params.push(Box::new(today.to_string()));
                }
                TaskFilter::DueThisWeek => {
                    clauses.push("due_date >= ? AND due_date <= ?".to_string());
                    params.push(Box::new(today.to_string()));
                    params.push(Box::new((today + Days::new(7)).to_string()));
                }
                TaskFilter::Completed => {
                    clauses.push("done = 1".to_string());
                }
                TaskFilter::Pending => {
                    clauses.push("done = 0".to_string());
                }
                TaskFilter::Priority(p) => {
                    clauses.push("priority = ?".to_string());
                    params.push(Box::new(p.as_str()));
                }
            }
        }

        if let Some(category) = &self.category {
            clauses.push("category = ?".to_string());
            params.push(Box::new(category.clone()));
        }

        if let Some(priority) = self.priority {
            clauses.push("priority = ?".to_string());
            params.push(Box::new(priority.as_str()));
        }

        (clauses, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn filter_param_parses_known_values() {
        assert_eq!(TaskFilter::from_param("overdue"), Some(TaskFilter::Overdue));
        assert_eq!(TaskFilter::from_param("today"), Some(TaskFilter::DueToday));
        assert_eq!(TaskFilter::from_param("week"), Some(TaskFilter::DueThisWeek));
        assert_eq!(
            TaskFilter::from_param("completed"),
            Some(TaskFilter::Completed)
        );
        assert_eq!(TaskFilter::from_param("pending"), Some(TaskFilter::Pending));
        assert_eq!(
            TaskFilter::from_param("high"),
            Some(TaskFilter::Priority(Priority::High))
        );
        assert_eq!(
            TaskFilter::from_param("low"),
            Some(TaskFilter::Priority(Priority::Low))
        );
    }

    #[test]
    fn unknown_filter_param_is_ignored() {
        assert_eq!(TaskFilter::from_param("urgent"), None);
        assert_eq!(TaskFilter::from_param(""), None);
        assert_eq!(TaskFilter::from_param("OVERDUE"), None);
    }

    #[test]
    fn unknown_sort_param_is_ignored() {
        assert_eq!(TaskSort::from_param("date"), Some(TaskSort::Date));
        assert_eq!(TaskSort::from_param("alphabetical"), None);
        assert_eq!(
            TaskSort::from_param("bogus").unwrap_or_default(),
            TaskSort::Priority
        );
    }

    #[test]
    fn default_sort_is_priority() {
        assert_eq!(TaskQuery::default().sort, TaskSort::Priority);
    }

    #[test]
    fn week_filter_binds_inclusive_bounds() {
        let query = TaskQuery {
            filter: Some(TaskFilter::DueThisWeek),
            ..Default::default()
        };
        let (clauses, params) = query.conditions(day(2026, 3, 10));
        assert_eq!(clauses, vec!["due_date >= ? AND due_date <= ?"]);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn predicates_compose_with_and() {
        let query = TaskQuery {
            filter: Some(TaskFilter::Pending),
            category: Some("Work".to_string()),
            priority: Some(Priority::High),
            ..Default::default()
        };
        let (clauses, params) = query.conditions(day(2026, 3, 10));
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0], "done = 0");
        assert_eq!(clauses[1], "category = ?");
        assert_eq!(clauses[2], "priority = ?");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_query_renders_no_conditions() {
        let (clauses, params) = TaskQuery::default().conditions(day(2026, 3, 10));
        assert!(clauses.is_empty());
        assert!(params.is_empty());
    }
}
