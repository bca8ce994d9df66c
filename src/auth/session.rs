use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::MAX_SESSION_HOURS;
use crate::extractors::CurrentUser;

/// Create a new session for a user. Returns the session token.
///
/// Takes a connection rather than the pool so registration can open the
/// session inside the same transaction that inserts the user.
pub fn create_session(conn: &Connection, user_id: i64, hours: u64) -> Result<String, rusqlite::Error> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours.min(MAX_SESSION_HOURS))],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> Result<(), rusqlite::Error> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Look up the user behind an unexpired session. A token that is unknown,
/// expired, or issued to a different user resolves to `None`.
pub fn resolve(
    conn: &Connection,
    user_id: i64,
    token: &str,
) -> Result<Option<CurrentUser>, rusqlite::Error> {
    conn.query_row(
        "SELECT u.id, u.email, u.name, u.is_admin, s.token FROM sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token = ?1 AND s.user_id = ?2 AND s.expires_at > datetime('now')",
        params![token, user_id],
        |row| {
            Ok(CurrentUser {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                is_admin: row.get(3)?,
                session_token: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Remove expired sessions. Returns how many were deleted.
pub fn purge_expired(conn: &Connection) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
