use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::User;

const USER_COLUMNS: &str = "id, email, password_hash, name, is_admin";

pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
        params![email],
        User::from_row,
    )
    .optional()
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        User::from_row,
    )
    .optional()
}

pub fn email_exists(conn: &Connection, email: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

/// Insert a user. The first account ever created is the administrator.
pub fn insert(
    conn: &Connection,
    email: &str,
    password_hash: &str,
    name: &str,
) -> rusqlite::Result<User> {
    let is_admin = count(conn)? == 0;
    conn.execute(
        "INSERT INTO users (email, password_hash, name, is_admin) VALUES (?1, ?2, ?3, ?4)",
        params![email, password_hash, name, is_admin],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        name: name.to_string(),
        is_admin,
    })
}
