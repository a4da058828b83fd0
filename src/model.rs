use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::util;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(UserId);
id_type!(PhotoId);
id_type!(CommentId);

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub login_name: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub description: String,
    pub occupation: String,
}

/// How a user appears from another entity's point of view (comment author, liker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

/// Everything about a user except the password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: UserId,
    pub login_name: String,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub description: String,
    pub occupation: String,
}

impl From<User> for UserDetail {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login_name: user.login_name,
            first_name: user.first_name,
            last_name: user.last_name,
            location: user.location,
            description: user.description,
            occupation: user.occupation,
        }
    }
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PhotoRow {
    pub id: PhotoId,
    pub user_id: UserId,
    pub file_name: String,
    pub mime: String,
    pub date_time: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: CommentId,
    #[serde(skip)]
    pub photo_id: PhotoId,
    pub user_id: UserId,
    pub comment: String,
    #[serde(serialize_with = "util::human_time")]
    pub date_time: OffsetDateTime,
}

/// A photo as stored: its row plus the embedded comments and like set.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoDocument {
    pub id: PhotoId,
    pub user_id: UserId,
    pub file_name: String,
    #[serde(serialize_with = "util::human_time")]
    pub date_time: OffsetDateTime,
    pub comments: Vec<Comment>,
    pub likes: Vec<UserId>,
}

impl PhotoDocument {
    pub fn new(row: PhotoRow, comments: Vec<Comment>, likes: Vec<UserId>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            file_name: row.file_name,
            date_time: row.date_time,
            comments,
            likes,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SchemaInfo {
    pub id: i64,
    pub version: i64,
    pub load_date_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub user: i64,
    pub photo: i64,
    #[serde(rename = "schemaInfo")]
    pub schema_info: i64,
}

/// Fields accepted by registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub login_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub occupation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
