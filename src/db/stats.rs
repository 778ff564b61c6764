//! Aggregation queries for statistics and the dashboard.

use super::{now_ms, today, Database};
use crate::types::{
    CategoryBreakdown, CategoryCount, Dashboard, DashboardSummary, Insights, PendingByPriority,
    Stats, Timeline,
};
use anyhow::Result;
use rusqlite::{params, Connection};
use std::collections::HashMap;

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Round a percentage to two decimals; zero when there is nothing to
/// measure.
fn completion_rate(completed: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

fn count_where(conn: &Connection, sql: &str, owner: Option<i64>) -> Result<i64> {
    let count: i64 = conn.query_row(sql, params![owner], |row| row.get(0))?;
    Ok(count)
}

impl Database {
    /// Aggregate statistics over the caller's visible tasks.
    pub fn get_stats(&self, owner: Option<i64>) -> Result<Stats> {
        self.with_conn(|conn| {
            let today = today().to_string();

            let total = count_where(
                conn,
                "SELECT COUNT(*) FROM tasks WHERE owner_id IS ?1",
                owner,
            )?;

            let completed = count_where(
                conn,
                "SELECT COUNT(*) FROM tasks WHERE done = 1 AND owner_id IS ?1",
                owner,
            )?;

            let overdue: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks
                 WHERE due_date < ?1 AND done = 0 AND owner_id IS ?2",
                params![today, owner],
                |row| row.get(0),
            )?;

            let high_priority_pending = count_where(
                conn,
                "SELECT COUNT(*) FROM tasks
                 WHERE priority = 'high' AND done = 0 AND owner_id IS ?1",
                owner,
            )?;

            let mut by_category: HashMap<String, i64> = HashMap::new();
            let mut stmt = conn.prepare(
                "SELECT category, COUNT(*) as cnt FROM tasks
                 WHERE category IS NOT NULL AND owner_id IS ?1
                 GROUP BY category",
            )?;
            let rows = stmt.query_map(params![owner], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows.flatten() {
                by_category.insert(row.0, row.1);
            }

            let mut by_priority: HashMap<String, i64> = HashMap::new();
            let mut stmt = conn.prepare(
                "SELECT priority, COUNT(*) as cnt FROM tasks
                 WHERE owner_id IS ?1
                 GROUP BY priority",
            )?;
            let rows = stmt.query_map(params![owner], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows.flatten() {
                by_priority.insert(row.0, row.1);
            }

            Ok(Stats {
                total,
                completed,
                pending: total - completed,
                overdue,
                high_priority_pending,
                completion_rate: completion_rate(completed, total),
                by_category,
                by_priority,
            })
        })
    }

    /// Composite dashboard over the caller's visible tasks.
    pub fn get_dashboard(&self, owner: Option<i64>) -> Result<Dashboard> {
        self.with_conn(|conn| {
            let today = today();
            let today_str = today.to_string();
            let week_end = (today + chrono::Days::new(7)).to_string();

            let total = count_where(
                conn,
                "SELECT COUNT(*) FROM tasks WHERE owner_id IS ?1",
                owner,
            )?;
            let completed = count_where(
                conn,
                "SELECT COUNT(*) FROM tasks WHERE done = 1 AND owner_id IS ?1",
                owner,
            )?;

            let summary = DashboardSummary {
                total,
                completed,
                pending: total - completed,
                completion_rate: completion_rate(completed, total),
            };

            let mut pending = PendingByPriority {
                high: 0,
                medium: 0,
                low: 0,
            };
            let mut stmt = conn.prepare(
                "SELECT priority, COUNT(*) as cnt FROM tasks
                 WHERE done = 0 AND owner_id IS ?1
                 GROUP BY priority",
            )?;
            let rows = stmt.query_map(params![owner], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for (level, count) in rows.flatten() {
                match level.as_str() {
                    "high" => pending.high = count,
                    "medium" => pending.medium = count,
                    "low" => pending.low = count,
                    _ => {}
                }
            }

            // Top categories by task count; alphabetical on ties so the
            // cut at three is deterministic.
            let mut stmt = conn.prepare(
                "SELECT category, COUNT(*) as cnt FROM tasks
                 WHERE category IS NOT NULL AND owner_id IS ?1
                 GROUP BY category
                 ORDER BY cnt DESC, category ASC
                 LIMIT 3",
            )?;
            let top: Vec<CategoryCount> = stmt
                .query_map(params![owner], |row| {
                    Ok(CategoryCount {
                        name: row.get(0)?,
                        count: row.get(1)?,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            let mut overdue_by_category: HashMap<String, i64> = HashMap::new();
            let mut stmt = conn.prepare(
                "SELECT category, COUNT(*) as cnt FROM tasks
                 WHERE category IS NOT NULL AND due_date < ?1 AND done = 0 AND owner_id IS ?2
                 GROUP BY category",
            )?;
            let rows = stmt.query_map(params![today_str, owner], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows.flatten() {
                overdue_by_category.insert(row.0, row.1);
            }

            let due_next_7_days: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks
                 WHERE due_date >= ?1 AND due_date <= ?2 AND owner_id IS ?3",
                params![today_str, week_end, owner],
                |row| row.get(0),
            )?;

            // created_at is the only timestamp carried, so the trailing
            // window counts completed tasks created in the last week.
            let cutoff = now_ms() - WEEK_MS;
            let completed_last_7_days: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks
                 WHERE done = 1 AND created_at >= ?1 AND owner_id IS ?2",
                params![cutoff, owner],
                |row| row.get(0),
            )?;

            let insights = Insights {
                most_used_category: top.first().map(|c| c.name.clone()),
                needs_attention: !overdue_by_category.is_empty(),
                suggested_focus: if pending.high > 0 {
                    "high".to_string()
                } else {
                    "medium".to_string()
                },
            };

            Ok(Dashboard {
                summary,
                priorities: pending,
                categories: CategoryBreakdown {
                    top,
                    overdue_by_category,
                },
                timeline: Timeline {
                    due_next_7_days,
                    completed_last_7_days,
                },
                insights,
            })
        })
    }
}
