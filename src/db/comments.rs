use rusqlite::{params, Connection};

use crate::db::models::Comment;

pub fn insert(conn: &Connection, post_id: i64, author_id: i64, text: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO comments (text, author_id, post_id) VALUES (?1, ?2, ?3)",
        params![text, author_id, post_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Comments on a post, oldest first, with author names.
pub fn for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.post_id, c.author_id, u.name AS author_name, c.text \
         FROM comments c JOIN users u ON u.id = c.author_id \
         WHERE c.post_id = ?1 ORDER BY c.id ASC",
    )?;
    let comments = stmt
        .query_map(params![post_id], Comment::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PostContent;
    use crate::db::{self, posts, users};

    #[test]
    fn comments_come_back_oldest_first_with_author_names() {
        let conn = Connection::open_in_memory().unwrap();
        db::apply_migrations(&conn).unwrap();
        let admin = users::insert(&conn, "admin@x.com", "h", "Admin").unwrap();
        let reader = users::insert(&conn, "r@x.com", "h", "Reader").unwrap();
        let post_id = posts::insert(
            &conn,
            admin.id,
            &PostContent {
                title: "T".into(),
                ..Default::default()
            },
            "d",
        )
        .unwrap();

        insert(&conn, post_id, reader.id, "first").unwrap();
        insert(&conn, post_id, admin.id, "second").unwrap();

        let comments = for_post(&conn, post_id).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "first");
        assert_eq!(comments[0].author_name, "Reader");
        assert_eq!(comments[1].author_name, "Admin");
        assert!(comments.iter().all(|c| c.post_id == post_id));
    }
}
