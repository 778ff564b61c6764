//! Integration tests for aggregate statistics and the dashboard.

use chrono::Days;
use todo_api::db::{Database, today};
use todo_api::types::{Priority, TaskFields};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn seed(
    db: &Database,
    title: &str,
    offset_days: Option<i64>,
    category: Option<&str>,
    priority: Option<Priority>,
    done: bool,
) -> i64 {
    seed_for(db, title, offset_days, category, priority, done, None)
}

fn seed_for(
    db: &Database,
    title: &str,
    offset_days: Option<i64>,
    category: Option<&str>,
    priority: Option<Priority>,
    done: bool,
    owner: Option<i64>,
) -> i64 {
    let due_date = offset_days.map(|offset| {
        if offset >= 0 {
            today() + Days::new(offset as u64)
        } else {
            today() - Days::new((-offset) as u64)
        }
    });
    db.create_task(
        TaskFields {
            title: title.to_string(),
            done,
            due_date,
            category: category.map(str::to_string),
            priority,
        },
        owner,
    )
    .expect("Failed to create task")
    .id
}

mod stats_tests {
    use super::*;

    #[test]
    fn empty_collection_is_all_zeroes() {
        let db = setup_db();
        let stats = db.get_stats(None).expect("Failed to get stats");

        assert_eq!(stats.total, 0);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.overdue, 0);
        assert_eq!(stats.high_priority_pending, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert!(stats.by_category.is_empty());
        assert!(stats.by_priority.is_empty());
    }

    #[test]
    fn priority_breakdown_omits_unobserved_levels() {
        let db = setup_db();
        seed(&db, "only one", None, None, None, false);

        let stats = db.get_stats(None).expect("Failed to get stats");
        assert_eq!(stats.by_priority.len(), 1);
        assert_eq!(stats.by_priority["medium"], 1);
        assert!(!stats.by_priority.contains_key("high"));
        assert!(!stats.by_priority.contains_key("low"));
    }

    #[test]
    fn totals_split_into_completed_and_pending() {
        let db = setup_db();
        seed(&db, "a", None, None, None, true);
        seed(&db, "b", None, None, None, false);
        seed(&db, "c", None, None, None, false);

        let stats = db.get_stats(None).expect("Failed to get stats");
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.completion_rate, 33.33);
    }

    #[test]
    fn overdue_counts_only_pending_past_due() {
        let db = setup_db();
        seed(&db, "late", Some(-3), None, None, false);
        seed(&db, "late but done", Some(-3), None, None, true);
        seed(&db, "due today", Some(0), None, None, false);
        seed(&db, "undated", None, None, None, false);

        let stats = db.get_stats(None).expect("Failed to get stats");
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn high_priority_pending_excludes_completed() {
        let db = setup_db();
        seed(&db, "hot", None, None, Some(Priority::High), false);
        seed(&db, "hot done", None, None, Some(Priority::High), true);
        seed(&db, "mild", None, None, None, false);

        let stats = db.get_stats(None).expect("Failed to get stats");
        assert_eq!(stats.high_priority_pending, 1);
    }

    #[test]
    fn categories_group_with_counts() {
        let db = setup_db();
        seed(&db, "a", None, Some("Work"), None, false);
        seed(&db, "b", None, Some("Work"), None, true);
        seed(&db, "c", None, Some("Home"), None, false);
        seed(&db, "d", None, None, None, false);

        let stats = db.get_stats(None).expect("Failed to get stats");
        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.by_category["Work"], 2);
        assert_eq!(stats.by_category["Home"], 1);
    }

    #[test]
    fn priority_breakdown_counts_all_tasks() {
        let db = setup_db();
        seed(&db, "a", None, None, Some(Priority::High), false);
        seed(&db, "b", None, None, Some(Priority::High), true);
        seed(&db, "c", None, None, Some(Priority::Low), false);
        seed(&db, "d", None, None, None, false);

        let stats = db.get_stats(None).expect("Failed to get stats");
        assert_eq!(stats.by_priority["high"], 2);
        assert_eq!(stats.by_priority["medium"], 1);
        assert_eq!(stats.by_priority["low"], 1);
    }

    #[test]
    fn stats_are_scoped_to_the_owner() {
        let db = setup_db();
        let user = db
            .create_user("ana", "hash")
            .expect("Failed to create user")
            .expect("Username was free");

        seed_for(&db, "mine", None, None, None, false, Some(user.id));
        seed_for(&db, "mine too", None, None, None, true, Some(user.id));
        seed(&db, "anonymous", None, None, None, false);

        let theirs = db.get_stats(Some(user.id)).expect("Failed to get stats");
        assert_eq!(theirs.total, 2);
        assert_eq!(theirs.completed, 1);

        let anon = db.get_stats(None).expect("Failed to get stats");
        assert_eq!(anon.total, 1);
        assert_eq!(anon.completed, 0);
    }
}

mod dashboard_tests {
    use super::*;

    #[test]
    fn summary_matches_the_collection() {
        let db = setup_db();
        seed(&db, "a", None, None, None, true);
        seed(&db, "b", None, None, None, false);

        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(dash.summary.total, 2);
        assert_eq!(dash.summary.completed, 1);
        assert_eq!(dash.summary.pending, 1);
        assert_eq!(dash.summary.completion_rate, 50.0);
    }

    #[test]
    fn priorities_count_only_pending_tasks() {
        let db = setup_db();
        seed(&db, "a", None, None, Some(Priority::High), false);
        seed(&db, "b", None, None, Some(Priority::High), true);
        seed(&db, "c", None, None, None, false);
        seed(&db, "d", None, None, Some(Priority::Low), false);

        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(dash.priorities.high, 1);
        assert_eq!(dash.priorities.medium, 1);
        assert_eq!(dash.priorities.low, 1);
    }

    #[test]
    fn top_categories_are_capped_at_three() {
        let db = setup_db();
        for _ in 0..3 {
            seed(&db, "w", None, Some("Work"), None, false);
        }
        for _ in 0..2 {
            seed(&db, "h", None, Some("Home"), None, false);
        }
        seed(&db, "e", None, Some("Errands"), None, false);
        seed(&db, "g", None, Some("Garden"), None, false);

        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        let names: Vec<&str> = dash.categories.top.iter().map(|c| c.name.as_str()).collect();
        // Errands and Garden tie at one task each; the alphabetical
        // tie-break keeps Errands.
        assert_eq!(names, vec!["Work", "Home", "Errands"]);
        assert_eq!(dash.categories.top[0].count, 3);
    }

    #[test]
    fn most_used_category_is_the_top_entry() {
        let db = setup_db();
        seed(&db, "a", None, Some("Work"), None, false);
        seed(&db, "b", None, Some("Work"), None, false);
        seed(&db, "c", None, Some("Home"), None, false);

        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(dash.insights.most_used_category.as_deref(), Some("Work"));
    }

    #[test]
    fn most_used_category_is_absent_without_categories() {
        let db = setup_db();
        seed(&db, "uncategorized", None, None, None, false);

        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert!(dash.insights.most_used_category.is_none());
        assert!(dash.categories.top.is_empty());
    }

    #[test]
    fn overdue_by_category_drives_needs_attention() {
        let db = setup_db();
        seed(&db, "fine", Some(3), Some("Work"), None, false);

        let calm = db.get_dashboard(None).expect("Failed to get dashboard");
        assert!(calm.categories.overdue_by_category.is_empty());
        assert!(!calm.insights.needs_attention);

        seed(&db, "late", Some(-1), Some("Work"), None, false);
        seed(&db, "late too", Some(-2), Some("Work"), None, false);

        let alarmed = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(alarmed.categories.overdue_by_category["Work"], 2);
        assert!(alarmed.insights.needs_attention);
    }

    #[test]
    fn suggested_focus_follows_pending_high_priority() {
        let db = setup_db();
        seed(&db, "calm", None, None, None, false);

        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(dash.insights.suggested_focus, "medium");

        let urgent = seed(&db, "urgent", None, None, Some(Priority::High), false);
        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(dash.insights.suggested_focus, "high");

        db.update_task(
            urgent,
            TaskFields {
                title: "urgent".to_string(),
                done: true,
                due_date: None,
                category: None,
                priority: Some(Priority::High),
            },
            None,
        )
        .expect("Failed to update task");
        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(dash.insights.suggested_focus, "medium");
    }

    #[test]
    fn due_next_7_days_is_an_inclusive_window() {
        let db = setup_db();
        seed(&db, "yesterday", Some(-1), None, None, false);
        seed(&db, "today", Some(0), None, None, false);
        seed(&db, "day seven", Some(7), None, None, false);
        seed(&db, "day eight", Some(8), None, None, false);
        seed(&db, "undated", None, None, None, false);

        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(dash.timeline.due_next_7_days, 2);
    }

    #[test]
    fn completed_last_7_days_counts_recent_completions() {
        let db = setup_db();
        seed(&db, "fresh and done", None, None, None, true);
        seed(&db, "fresh but open", None, None, None, false);

        let dash = db.get_dashboard(None).expect("Failed to get dashboard");
        assert_eq!(dash.timeline.completed_last_7_days, 1);
    }

    #[test]
    fn dashboard_is_scoped_to_the_owner() {
        let db = setup_db();
        let user = db
            .create_user("ben", "hash")
            .expect("Failed to create user")
            .expect("Username was free");

        seed_for(&db, "mine", None, Some("Work"), None, false, Some(user.id));
        seed(&db, "anonymous", None, Some("Home"), None, false);

        let dash = db
            .get_dashboard(Some(user.id))
            .expect("Failed to get dashboard");
        assert_eq!(dash.summary.total, 1);
        assert_eq!(dash.insights.most_used_category.as_deref(), Some("Work"));
    }
}
