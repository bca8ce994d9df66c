pub mod comments;
pub mod models;
pub mod posts;
pub mod users;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../migrations/001_initial.sql"),
)];

/// Per-connection settings. Foreign keys are off by default in SQLite and the
/// pragma only applies to the connection that runs it.
fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);
    let pool = Pool::builder().max_size(8).build(manager)?;

    // journal_mode is persistent on the file, once is enough
    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;

    Ok(pool)
}

/// In-memory pool for tests. A single connection, since every in-memory
/// connection is its own database.
pub fn memory_pool() -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(init_connection);
    let pool = Pool::builder().max_size(1).build(manager)?;
    Ok(pool)
}

/// Accepts `sqlite://path`, `sqlite:path` or a bare path.
pub fn path_from_url(url: &str) -> PathBuf {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(path)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;
    apply_migrations(&conn)?;
    tracing::info!("Database migrations complete");
    Ok(())
}

pub fn apply_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> DbPool {
        let pool = memory_pool().unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    #[test]
    fn create_pool_creates_db_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("sub/dir/test.db");
        let pool = create_pool(&db_path).unwrap();
        assert!(db_path.exists());
        // Verify we can get a connection
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn every_pooled_connection_enforces_foreign_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = create_pool(&tmp.path().join("fk.db")).unwrap();
        let c1 = pool.get().unwrap();
        let c2 = pool.get().unwrap();
        for conn in [&c1, &c2] {
            let on: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(on, 1);
        }
    }

    #[test]
    fn migrations_create_expected_tables() {
        let pool = test_pool();
        let conn = pool.get().unwrap();

        let tables: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .filter_map(|r| r.ok())
                .collect()
        };
        for table in ["users", "blog_posts", "comments", "sessions", "schema_version"] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let pool = test_pool();
        run_migrations(&pool).unwrap(); // Should not error on second run

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn foreign_keys_enforced() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        // A comment on a post that does not exist must be rejected
        let result = conn.execute(
            "INSERT INTO comments (text, author_id, post_id) VALUES (?1, ?2, ?3)",
            params!["hello", 99, 99],
        );
        assert!(result.is_err());
    }

    #[test]
    fn email_and_title_are_unique() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (email, password_hash, name) VALUES ('a@x.com', 'h', 'A')",
            [],
        )
        .unwrap();
        assert!(conn
            .execute(
                "INSERT INTO users (email, password_hash, name) VALUES ('a@x.com', 'h', 'B')",
                [],
            )
            .is_err());

        let insert_post = "INSERT INTO blog_posts (author_id, title, subtitle, date, body, img_url) \
                           VALUES (1, 'Same', 's', 'd', 'b', 'i')";
        conn.execute(insert_post, []).unwrap();
        assert!(conn.execute(insert_post, []).is_err());
    }

    #[test]
    fn path_from_url_strips_scheme() {
        assert_eq!(path_from_url("sqlite://blog.db"), PathBuf::from("blog.db"));
        assert_eq!(
            path_from_url("sqlite:///var/lib/blog.db"),
            PathBuf::from("/var/lib/blog.db")
        );
        assert_eq!(path_from_url("sqlite:blog.db"), PathBuf::from("blog.db"));
        assert_eq!(path_from_url("/tmp/blog.db"), PathBuf::from("/tmp/blog.db"));
    }
}
