use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Post, PostContent};

const POST_SELECT: &str = "SELECT p.id, p.author_id, u.name AS author_name, p.title, p.subtitle, \
                           p.date, p.body, p.img_url \
                           FROM blog_posts p JOIN users u ON u.id = p.author_id";

/// All posts in insertion order.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Post>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY p.id ASC", POST_SELECT))?;
    let posts = stmt
        .query_map([], Post::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("{} WHERE p.id = ?1", POST_SELECT),
        params![id],
        Post::from_row,
    )
    .optional()
}

/// Whether another post already uses `title`. `excluding` skips the post being edited.
pub fn title_taken(conn: &Connection, title: &str, excluding: Option<i64>) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM blog_posts WHERE title = ?1 AND (?2 IS NULL OR id != ?2)",
        params![title, excluding],
        |row| row.get(0),
    )
}

pub fn insert(
    conn: &Connection,
    author_id: i64,
    content: &PostContent,
    date: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO blog_posts (author_id, title, subtitle, date, body, img_url) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            author_id,
            content.title,
            content.subtitle,
            date,
            content.body,
            content.img_url
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite the editable fields. Author and date are left as they were.
/// Returns false when no post has this id.
pub fn update(conn: &Connection, id: i64, content: &PostContent) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE blog_posts SET title = ?1, subtitle = ?2, body = ?3, img_url = ?4 WHERE id = ?5",
        params![
            content.title,
            content.subtitle,
            content.body,
            content.img_url,
            id
        ],
    )?;
    Ok(changed > 0)
}

/// Delete a post together with its comments. Returns false when no post has this id.
pub fn delete(conn: &mut Connection, id: i64) -> rusqlite::Result<bool> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM comments WHERE post_id = ?1", params![id])?;
    let deleted = tx.execute("DELETE FROM blog_posts WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, comments, users};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::apply_migrations(&conn).unwrap();
        users::insert(&conn, "admin@x.com", "h", "Admin").unwrap();
        conn
    }

    fn content(title: &str) -> PostContent {
        PostContent {
            title: title.to_string(),
            subtitle: "Sub".to_string(),
            body: "<p>Body</p>".to_string(),
            img_url: "https://example.com/a.jpg".to_string(),
        }
    }

    #[test]
    fn list_returns_posts_in_insertion_order_with_author() {
        let conn = test_conn();
        insert(&conn, 1, &content("First"), "January 01, 2024").unwrap();
        insert(&conn, 1, &content("Second"), "January 02, 2024").unwrap();

        let posts = list(&conn).unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second"]);
        assert_eq!(posts[0].author_name, "Admin");
    }

    #[test]
    fn find_missing_post_is_none() {
        let conn = test_conn();
        assert!(find(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn update_keeps_author_and_date() {
        let conn = test_conn();
        let id = insert(&conn, 1, &content("Old"), "January 01, 2024").unwrap();

        let new = PostContent {
            title: "New".into(),
            subtitle: "New sub".into(),
            body: "New body".into(),
            img_url: "https://example.com/b.jpg".into(),
        };
        assert!(update(&conn, id, &new).unwrap());

        let post = find(&conn, id).unwrap().unwrap();
        assert_eq!(post.title, "New");
        assert_eq!(post.subtitle, "New sub");
        assert_eq!(post.body, "New body");
        assert_eq!(post.img_url, "https://example.com/b.jpg");
        assert_eq!(post.author_id, 1);
        assert_eq!(post.date, "January 01, 2024");

        assert!(!update(&conn, 999, &new).unwrap());
    }

    #[test]
    fn title_taken_ignores_the_post_being_edited() {
        let conn = test_conn();
        let id = insert(&conn, 1, &content("Taken"), "d").unwrap();
        assert!(title_taken(&conn, "Taken", None).unwrap());
        assert!(!title_taken(&conn, "Taken", Some(id)).unwrap());
        assert!(!title_taken(&conn, "Free", None).unwrap());
    }

    #[test]
    fn delete_cascades_to_comments() {
        let mut conn = test_conn();
        let keep = insert(&conn, 1, &content("Keep"), "d").unwrap();
        let doomed = insert(&conn, 1, &content("Doomed"), "d").unwrap();
        comments::insert(&conn, doomed, 1, "bye").unwrap();
        comments::insert(&conn, keep, 1, "stay").unwrap();

        assert!(delete(&mut conn, doomed).unwrap());
        assert!(find(&conn, doomed).unwrap().is_none());
        assert!(comments::for_post(&conn, doomed).unwrap().is_empty());
        assert_eq!(comments::for_post(&conn, keep).unwrap().len(), 1);

        assert!(!delete(&mut conn, doomed).unwrap());
    }
}
