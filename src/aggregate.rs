//! The "photos of user" view.
//!
//! Fetched [`PhotoDocument`]s are sorted (most liked first, newest breaks
//! ties) and turned into [`PhotoView`]s whose comment authors and likers are
//! public user views. Lookups run in two phases: every comment author across
//! every photo, then every liker. Each phase dispatches all of its lookups at
//! once and waits for all of them, so one failed lookup never cancels its
//! siblings. A failed phase fails the whole view; the like phase never starts
//! if the comment phase failed.
//!
//! A reference to a user that no longer exists is not an error. It shows up
//! as [`UserRef::Dangling`].

use std::future::Future;

use futures_util::future::join_all;
use log::{debug, error, warn};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    model::{CommentId, PhotoDocument, PhotoId, PublicUser, UserId},
    util,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Resolved(PublicUser),
    Dangling { id: UserId },
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: CommentId,
    pub comment: String,
    #[serde(serialize_with = "util::human_time")]
    pub date_time: OffsetDateTime,
    pub user: UserRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhotoView {
    pub id: PhotoId,
    pub user_id: UserId,
    pub file_name: String,
    #[serde(serialize_with = "util::human_time")]
    pub date_time: OffsetDateTime,
    pub comments: Vec<CommentView>,
    pub likes: Vec<UserRef>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregateError {
    #[error("error processing comments ({failed} lookups failed)")]
    Comments { failed: usize },

    #[error("error processing likes ({failed} lookups failed)")]
    Likes { failed: usize },
}

/// Most liked first, then most recent. Stable for equal keys.
pub fn sort_photos(photos: &mut [PhotoDocument]) {
    photos.sort_by(|a, b| {
        b.likes
            .len()
            .cmp(&a.likes.len())
            .then_with(|| b.date_time.cmp(&a.date_time))
    });
}

/// Resolves every id, in order. `Err` carries the number of failed lookups.
async fn resolve_all<F, Fut, E>(
    ids: Vec<UserId>,
    lookup: &F,
    what: &str,
) -> Result<Vec<UserRef>, usize>
where
    F: Fn(UserId) -> Fut,
    Fut: Future<Output = Result<Option<PublicUser>, E>>,
    E: std::fmt::Debug,
{
    let results = join_all(ids.into_iter().map(|id| async move { (id, lookup(id).await) })).await;

    let mut failed = 0;
    let mut refs = Vec::with_capacity(results.len());

    for (id, result) in results {
        match result {
            Ok(Some(user)) => refs.push(UserRef::Resolved(user)),
            Ok(None) => {
                warn!("user {id} not found for {what}");
                refs.push(UserRef::Dangling { id });
            }
            Err(x) => {
                error!("error fetching user {id} for {what}: {x:?}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        Err(failed)
    } else {
        Ok(refs)
    }
}

/// Builds the annotated, sorted view of `photos`. `lookup` resolves one user id.
pub async fn annotate<F, Fut, E>(
    mut photos: Vec<PhotoDocument>,
    lookup: F,
) -> Result<Vec<PhotoView>, AggregateError>
where
    F: Fn(UserId) -> Fut,
    Fut: Future<Output = Result<Option<PublicUser>, E>>,
    E: std::fmt::Debug,
{
    sort_photos(&mut photos);

    let authors = photos
        .iter()
        .flat_map(|photo| photo.comments.iter().map(|comment| comment.user_id))
        .collect();

    let authors = resolve_all(authors, &lookup, "comment")
        .await
        .map_err(|failed| AggregateError::Comments { failed })?;

    debug!("resolved {} comment authors", authors.len());

    let likers = photos
        .iter()
        .flat_map(|photo| photo.likes.iter().copied())
        .collect();

    let likers = resolve_all(likers, &lookup, "like")
        .await
        .map_err(|failed| AggregateError::Likes { failed })?;

    debug!("resolved {} likers", likers.len());

    let mut authors = authors.into_iter();
    let mut likers = likers.into_iter();

    Ok(photos
        .into_iter()
        .map(|photo| {
            let comments = photo
                .comments
                .into_iter()
                .zip(authors.by_ref())
                .map(|(comment, user)| CommentView {
                    id: comment.id,
                    comment: comment.comment,
                    date_time: comment.date_time,
                    user,
                })
                .collect();

            let likes = likers.by_ref().take(photo.likes.len()).collect();

            PhotoView {
                id: photo.id,
                user_id: photo.user_id,
                file_name: photo.file_name,
                date_time: photo.date_time,
                comments,
                likes,
            }
        })
        .collect())
}
