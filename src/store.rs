//! Document store over SQLite.
//!
//! A photo is kept as one `photos` row plus its `comments` and `likes` rows;
//! the functions here hand out and accept whole [`PhotoDocument`]s so callers
//! never deal with the split. Author, owner and liker ids are soft references
//! and are not checked on write.
//!
//! Every write that touches more than one table runs in a single transaction.

use std::collections::HashMap;

use futures_util::future::try_join3;
use sqlx::{Pool, Sqlite};
use time::OffsetDateTime;

use crate::model::{
    Comment, CommentId, Counts, NewUser, PhotoDocument, PhotoId, PhotoRow, PublicUser, SchemaInfo,
    User, UserId,
};

pub type Db = Pool<Sqlite>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRemoval {
    Removed,
    PhotoNotFound,
    CommentNotFound,
}

/// SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|x| x.code())
        .map(|code| code == "2067" || code == "1555")
        .unwrap_or(false)
}

// ---- users ----

pub async fn list_users(sql: &Db) -> Result<Vec<PublicUser>, sqlx::Error> {
    sqlx::query_as::<_, PublicUser>("SELECT id, first_name, last_name FROM users ORDER BY id")
        .fetch_all(sql)
        .await
}

pub async fn find_user(sql: &Db, id: UserId) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(sql)
        .await
}

pub async fn find_user_by_login(sql: &Db, login_name: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE login_name = ?")
        .bind(login_name)
        .fetch_optional(sql)
        .await
}

pub async fn find_public_user(sql: &Db, id: UserId) -> Result<Option<PublicUser>, sqlx::Error> {
    sqlx::query_as::<_, PublicUser>("SELECT id, first_name, last_name FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(sql)
        .await
}

/// `password` must already be hashed.
pub async fn insert_user(sql: &Db, user: &NewUser, password: &str) -> Result<UserId, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (login_name, password, first_name, last_name, location, description, occupation) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.login_name)
    .bind(password)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.location)
    .bind(&user.description)
    .bind(&user.occupation)
    .execute(sql)
    .await?;

    Ok(UserId(result.last_insert_rowid()))
}

/// Removes the user, their photos (with everything attached), their comments
/// and likes on other photos, and their sessions.
///
/// Returns the file names of the removed photos, or `None` if the user did not exist.
pub async fn delete_user(sql: &Db, id: UserId) -> Result<Option<Vec<String>>, sqlx::Error> {
    let mut tx = sql.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;

    if exists.is_none() {
        return Ok(None);
    }

    let files: Vec<String> = sqlx::query_scalar("SELECT file_name FROM photos WHERE user_id = ?")
        .bind(id)
        .fetch_all(&mut tx)
        .await?;

    let statements = [
        "DELETE FROM comments WHERE photo_id IN (SELECT id FROM photos WHERE user_id = ?)",
        "DELETE FROM likes WHERE photo_id IN (SELECT id FROM photos WHERE user_id = ?)",
        "DELETE FROM comments WHERE user_id = ?",
        "DELETE FROM likes WHERE user_id = ?",
        "DELETE FROM photos WHERE user_id = ?",
        "DELETE FROM sessions WHERE user_id = ?",
        "DELETE FROM users WHERE id = ?",
    ];

    for statement in statements {
        sqlx::query(statement).bind(id).execute(&mut tx).await?;
    }

    tx.commit().await?;

    Ok(Some(files))
}

// ---- sessions ----

pub async fn create_session(
    sql: &Db,
    user: UserId,
    token: &str,
    created: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO sessions (user_id, token, created) VALUES (?, ?, ?)")
        .bind(user)
        .bind(token)
        .bind(created)
        .execute(sql)
        .await?;

    Ok(())
}

/// The user behind `token`, if the session was created after `not_before` (unix seconds).
pub async fn session_user(
    sql: &Db,
    token: &str,
    not_before: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT a.* FROM users a, sessions b WHERE b.token = ? AND b.created > ? AND a.id = b.user_id",
    )
    .bind(token)
    .bind(not_before)
    .fetch_optional(sql)
    .await
}

pub async fn delete_session(sql: &Db, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(sql)
        .await?;

    Ok(())
}

// ---- photos ----

fn assemble(
    rows: Vec<PhotoRow>,
    comments: Vec<Comment>,
    likes: Vec<(PhotoId, UserId)>,
) -> Vec<PhotoDocument> {
    let mut comments_by_photo: HashMap<PhotoId, Vec<Comment>> = HashMap::new();
    for comment in comments {
        comments_by_photo.entry(comment.photo_id).or_default().push(comment);
    }

    let mut likes_by_photo: HashMap<PhotoId, Vec<UserId>> = HashMap::new();
    for (photo, user) in likes {
        likes_by_photo.entry(photo).or_default().push(user);
    }

    rows.into_iter()
        .map(|row| {
            let comments = comments_by_photo.remove(&row.id).unwrap_or_default();
            let likes = likes_by_photo.remove(&row.id).unwrap_or_default();
            PhotoDocument::new(row, comments, likes)
        })
        .collect()
}

/// All photos owned by `user`, in upload (id) order.
pub async fn photos_of_user(sql: &Db, user: UserId) -> Result<Vec<PhotoDocument>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PhotoRow>(
        "SELECT id, user_id, file_name, mime, date_time FROM photos WHERE user_id = ? ORDER BY id",
    )
    .bind(user)
    .fetch_all(sql)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let comments = sqlx::query_as::<_, Comment>(
        "SELECT c.id, c.photo_id, c.user_id, c.comment, c.date_time FROM comments c JOIN photos p ON p.id = c.photo_id WHERE p.user_id = ? ORDER BY c.id",
    )
    .bind(user)
    .fetch_all(sql)
    .await?;

    let likes = sqlx::query_as::<_, (PhotoId, UserId)>(
        "SELECT l.photo_id, l.user_id FROM likes l JOIN photos p ON p.id = l.photo_id WHERE p.user_id = ? ORDER BY l.rowid",
    )
    .bind(user)
    .fetch_all(sql)
    .await?;

    Ok(assemble(rows, comments, likes))
}

pub async fn find_photo(sql: &Db, id: PhotoId) -> Result<Option<PhotoDocument>, sqlx::Error> {
    let row = sqlx::query_as::<_, PhotoRow>(
        "SELECT id, user_id, file_name, mime, date_time FROM photos WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(sql)
    .await?;

    let row = match row {
        Some(x) => x,
        None => return Ok(None),
    };

    let comments = sqlx::query_as::<_, Comment>(
        "SELECT id, photo_id, user_id, comment, date_time FROM comments WHERE photo_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(sql)
    .await?;

    let likes = sqlx::query_as::<_, (PhotoId, UserId)>(
        "SELECT photo_id, user_id FROM likes WHERE photo_id = ? ORDER BY rowid",
    )
    .bind(id)
    .fetch_all(sql)
    .await?;

    Ok(assemble(vec![row], comments, likes).pop())
}

pub async fn find_photo_by_file(sql: &Db, file_name: &str) -> Result<Option<PhotoRow>, sqlx::Error> {
    sqlx::query_as::<_, PhotoRow>(
        "SELECT id, user_id, file_name, mime, date_time FROM photos WHERE file_name = ?",
    )
    .bind(file_name)
    .fetch_optional(sql)
    .await
}

pub async fn insert_photo(
    sql: &Db,
    owner: UserId,
    file_name: &str,
    mime: &str,
    date_time: OffsetDateTime,
) -> Result<PhotoDocument, sqlx::Error> {
    let result =
        sqlx::query("INSERT INTO photos (user_id, file_name, mime, date_time) VALUES (?, ?, ?, ?)")
            .bind(owner)
            .bind(file_name)
            .bind(mime)
            .bind(date_time)
            .execute(sql)
            .await?;

    let row = PhotoRow {
        id: PhotoId(result.last_insert_rowid()),
        user_id: owner,
        file_name: file_name.to_owned(),
        mime: mime.to_owned(),
        date_time,
    };

    Ok(PhotoDocument::new(row, Vec::new(), Vec::new()))
}

/// Appends a comment and returns the updated photo, or `None` if the photo does not exist.
pub async fn add_comment(
    sql: &Db,
    photo: PhotoId,
    author: UserId,
    text: &str,
    date_time: OffsetDateTime,
) -> Result<Option<PhotoDocument>, sqlx::Error> {
    let mut tx = sql.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM photos WHERE id = ?")
        .bind(photo)
        .fetch_optional(&mut tx)
        .await?;

    if exists.is_none() {
        return Ok(None);
    }

    sqlx::query("INSERT INTO comments (photo_id, user_id, comment, date_time) VALUES (?, ?, ?, ?)")
        .bind(photo)
        .bind(author)
        .bind(text)
        .bind(date_time)
        .execute(&mut tx)
        .await?;

    tx.commit().await?;

    find_photo(sql, photo).await
}

pub async fn delete_comment(
    sql: &Db,
    photo: PhotoId,
    comment: CommentId,
) -> Result<CommentRemoval, sqlx::Error> {
    let mut tx = sql.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM photos WHERE id = ?")
        .bind(photo)
        .fetch_optional(&mut tx)
        .await?;

    if exists.is_none() {
        return Ok(CommentRemoval::PhotoNotFound);
    }

    let result = sqlx::query("DELETE FROM comments WHERE id = ? AND photo_id = ?")
        .bind(comment)
        .bind(photo)
        .execute(&mut tx)
        .await?;

    tx.commit().await?;

    if result.rows_affected() == 0 {
        Ok(CommentRemoval::CommentNotFound)
    } else {
        Ok(CommentRemoval::Removed)
    }
}

/// Returns the removed photo's file name, or `None` if it did not exist.
pub async fn delete_photo(sql: &Db, photo: PhotoId) -> Result<Option<String>, sqlx::Error> {
    let mut tx = sql.begin().await?;

    let file: Option<String> = sqlx::query_scalar("SELECT file_name FROM photos WHERE id = ?")
        .bind(photo)
        .fetch_optional(&mut tx)
        .await?;

    if file.is_none() {
        return Ok(None);
    }

    for statement in [
        "DELETE FROM comments WHERE photo_id = ?",
        "DELETE FROM likes WHERE photo_id = ?",
        "DELETE FROM photos WHERE id = ?",
    ] {
        sqlx::query(statement).bind(photo).execute(&mut tx).await?;
    }

    tx.commit().await?;

    Ok(file)
}

/// Adds `user` to the photo's like set if absent, removes it if present.
/// `None` if the photo does not exist.
pub async fn toggle_like(
    sql: &Db,
    photo: PhotoId,
    user: UserId,
) -> Result<Option<LikeState>, sqlx::Error> {
    let mut tx = sql.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM photos WHERE id = ?")
        .bind(photo)
        .fetch_optional(&mut tx)
        .await?;

    if exists.is_none() {
        return Ok(None);
    }

    let removed = sqlx::query("DELETE FROM likes WHERE photo_id = ? AND user_id = ?")
        .bind(photo)
        .bind(user)
        .execute(&mut tx)
        .await?;

    let state = if removed.rows_affected() > 0 {
        LikeState::Unliked
    } else {
        sqlx::query("INSERT INTO likes (photo_id, user_id) VALUES (?, ?)")
            .bind(photo)
            .bind(user)
            .execute(&mut tx)
            .await?;

        LikeState::Liked
    };

    tx.commit().await?;

    Ok(Some(state))
}

// ---- schema info ----

pub async fn schema_info(sql: &Db) -> Result<Option<SchemaInfo>, sqlx::Error> {
    sqlx::query_as::<_, SchemaInfo>("SELECT id, version, load_date_time FROM schema_info ORDER BY id LIMIT 1")
        .fetch_optional(sql)
        .await
}

pub async fn counts(sql: &Db) -> Result<Counts, sqlx::Error> {
    let (user, photo, schema_info) = try_join3(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(sql),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photos").fetch_one(sql),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM schema_info").fetch_one(sql),
    )
    .await?;

    Ok(Counts {
        user,
        photo,
        schema_info,
    })
}
