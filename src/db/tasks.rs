//! Task CRUD, listing, and search.
//!
//! Every operation is scoped to a caller: authenticated callers see only
//! rows they own, anonymous callers see only ownerless rows. The scope
//! is expressed with SQLite's `IS` operator so a NULL owner binds the
//! same way as a concrete id.

use super::{now_ms, today, Database};
use crate::query::TaskQuery;
use crate::types::{Priority, Task, TaskFields};
use anyhow::Result;
use rusqlite::{params, Row};

/// Column list shared by every task SELECT.
const TASK_COLUMNS: &str = "id, title, done, due_date, category, priority, created_at, owner_id";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let id: i64 = row.get("id")?;
    let title: String = row.get("title")?;
    let done: bool = row.get("done")?;
    let due_date: Option<String> = row.get("due_date")?;
    let category: Option<String> = row.get("category")?;
    let priority: String = row.get("priority")?;
    let created_at: i64 = row.get("created_at")?;
    let owner_id: Option<i64> = row.get("owner_id")?;

    Ok(Task {
        id,
        title,
        done,
        due_date: due_date
            .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        category,
        priority: Priority::parse(&priority).unwrap_or_default(),
        created_at,
        owner_id,
    })
}

/// Escape LIKE wildcards in user-supplied search text.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

impl Database {
    /// Insert a new task and return the stored record.
    ///
    /// Ids are allocated by AUTOINCREMENT, so they only ever grow and a
    /// deleted task's id is never reused.
    pub fn create_task(&self, fields: TaskFields, owner: Option<i64>) -> Result<Task> {
        self.with_conn(|conn| {
            let created_at = now_ms();
            let priority = fields.priority.unwrap_or_default();

            conn.execute(
                "INSERT INTO tasks (title, done, due_date, category, priority, created_at, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    fields.title,
                    fields.done,
                    fields.due_date.map(|d| d.to_string()),
                    fields.category,
                    priority.as_str(),
                    created_at,
                    owner,
                ],
            )?;

            Ok(Task {
                id: conn.last_insert_rowid(),
                title: fields.title,
                done: fields.done,
                due_date: fields.due_date,
                category: fields.category,
                priority,
                created_at,
                owner_id: owner,
            })
        })
    }

    /// Fetch a single task by id within the caller's scope.
    pub fn get_task(&self, id: i64, owner: Option<i64>) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let sql =
                format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND owner_id IS ?2");
            let mut stmt = conn.prepare(&sql)?;

            match stmt.query_row(params![id, owner], parse_task_row) {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Replace a task's fields in one statement and return the stored
    /// record. Returns `None` when the id does not exist in the caller's
    /// scope.
    ///
    /// An omitted priority keeps the stored value (COALESCE); title,
    /// done, due_date, and category are always replaced, so omitting
    /// due_date or category clears them.
    pub fn update_task(
        &self,
        id: i64,
        fields: TaskFields,
        owner: Option<i64>,
    ) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE tasks
                 SET title = ?1, done = ?2, due_date = ?3, category = ?4,
                     priority = COALESCE(?5, priority)
                 WHERE id = ?6 AND owner_id IS ?7",
                params![
                    fields.title,
                    fields.done,
                    fields.due_date.map(|d| d.to_string()),
                    fields.category,
                    fields.priority.map(|p| p.as_str()),
                    id,
                    owner,
                ],
            )?;

            if updated == 0 {
                return Ok(None);
            }

            let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let task = stmt.query_row(params![id], parse_task_row)?;
            Ok(Some(task))
        })
    }

    /// Delete a task. Returns false when the id does not exist in the
    /// caller's scope.
    pub fn delete_task(&self, id: i64, owner: Option<i64>) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM tasks WHERE id = ?1 AND owner_id IS ?2",
                params![id, owner],
            )?;
            Ok(deleted > 0)
        })
    }

    /// List tasks matching a [`TaskQuery`] within the caller's scope.
    pub fn list_tasks(&self, query: &TaskQuery, owner: Option<i64>) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut sql =
                format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id IS ?");
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            params_vec.push(Box::new(owner));

            let (clauses, clause_params) = query.conditions(today());
            for clause in &clauses {
                sql.push_str(" AND ");
                sql.push_str(clause);
            }
            params_vec.extend(clause_params);

            sql.push_str(" ORDER BY ");
            sql.push_str(query.sort.order_clause());

            // Pagination only applies when a limit is present; an offset
            // alone has no effect.
            if let Some(limit) = query.limit {
                sql.push_str(" LIMIT ? OFFSET ?");
                params_vec.push(Box::new(limit));
                params_vec.push(Box::new(query.offset));
            }

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(tasks)
        })
    }

    /// Case-insensitive substring search over title and/or category.
    ///
    /// With both fields disabled there is nothing to match, so the
    /// result is empty rather than the whole collection.
    pub fn search_tasks(
        &self,
        needle: &str,
        in_title: bool,
        in_category: bool,
        limit: Option<i64>,
        offset: i64,
        owner: Option<i64>,
    ) -> Result<Vec<Task>> {
        let mut field_clauses: Vec<&str> = Vec::new();
        if in_title {
            field_clauses.push("title LIKE ?1 ESCAPE '\\'");
        }
        if in_category {
            field_clauses.push("category LIKE ?1 ESCAPE '\\'");
        }
        if field_clauses.is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(|conn| {
            let mut sql = format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE ({}) AND owner_id IS ?2 ORDER BY id ASC",
                field_clauses.join(" OR ")
            );

            let pattern = format!("%{}%", escape_like(needle));
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            params_vec.push(Box::new(pattern));
            params_vec.push(Box::new(owner));

            if let Some(limit) = limit {
                sql.push_str(" LIMIT ?3 OFFSET ?4");
                params_vec.push(Box::new(limit));
                params_vec.push(Box::new(offset));
            }

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(tasks)
        })
    }

    /// Distinct non-null categories in the caller's scope, sorted
    /// alphabetically.
    pub fn distinct_categories(&self, owner: Option<i64>) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT category FROM tasks
                 WHERE category IS NOT NULL AND owner_id IS ?1
                 ORDER BY category ASC",
            )?;

            let categories = stmt
                .query_map(params![owner], |row| row.get(0))?
                .filter_map(|r| r.ok())
                .collect();

            Ok(categories)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn task_columns_match_parse_order() {
        // parse_task_row reads by name, so the list just has to cover
        // every struct field.
        for col in [
            "id",
            "title",
            "done",
            "due_date",
            "category",
            "priority",
            "created_at",
            "owner_id",
        ] {
            assert!(TASK_COLUMNS.contains(col), "missing column {col}");
        }
    }
}
