//! User accounts and bearer tokens.

use super::{now_ms, Database};
use crate::types::User;
use anyhow::Result;
use rusqlite::{params, Row};

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// Insert a new user. Returns `None` when the username is already
    /// taken; the UNIQUE constraint does the check so there is no window
    /// between lookup and insert.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let created_at = now_ms();
            let inserted = conn.execute(
                "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
                params![username, password_hash, created_at],
            );

            match inserted {
                Ok(_) => Ok(Some(User {
                    id: conn.last_insert_rowid(),
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at,
                })),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
            )?;

            match stmt.query_row(params![username], parse_user_row) {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Record a freshly minted token digest for a user.
    pub fn insert_auth_token(&self, token_hash: &str, user_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO auth_tokens (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token_hash, user_id, now_ms()],
            )?;
            Ok(())
        })
    }

    /// Resolve a token digest to its user. Unknown digests are `None`.
    pub fn get_user_for_token(&self, token_hash: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.password_hash, u.created_at
                 FROM auth_tokens t
                 JOIN users u ON u.id = t.user_id
                 WHERE t.token_hash = ?1",
            )?;

            match stmt.query_row(params![token_hash], parse_user_row) {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }
}
