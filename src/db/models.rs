use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_admin: bool,
}

impl User {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            name: row.get("name")?,
            is_admin: row.get("is_admin")?,
        })
    }
}

/// A post joined with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: String,
    pub img_url: String,
}

impl Post {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            author_id: row.get("author_id")?,
            author_name: row.get("author_name")?,
            title: row.get("title")?,
            subtitle: row.get("subtitle")?,
            date: row.get("date")?,
            body: row.get("body")?,
            img_url: row.get("img_url")?,
        })
    }
}

/// The author-editable fields of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostContent {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub text: String,
}

impl Comment {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            post_id: row.get("post_id")?,
            author_id: row.get("author_id")?,
            author_name: row.get("author_name")?,
            text: row.get("text")?,
        })
    }
}
