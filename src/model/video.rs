use serde::{Deserialize, Serialize};
use snafu::{ensure, Location, OptionExt as _, ResultExt as _, Snafu};

use crate::database::{Database, DatabaseError, EmptyResponseSnafu, EntityId, QuerySnafu, Table};
use crate::model::Timestamp;
use crate::sequence::{self, SequenceError};

/// Comments are opaque to the backend: whatever value the caller posts is
/// appended verbatim and preserved in insertion order.
pub type Comment = serde_json::Value;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum VideoError {
    #[snafu(display("video `{id}` does not exist"))]
    VideoNotFound {
        id: i64,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not allocate a video id: {source}"))]
    AllocateVideoId {
        source: SequenceError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("video storage operation failed: {source}"))]
    VideoStorage {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("comment was not appended to video `{id}`"))]
    CommentNotAppended {
        id: i64,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: EntityId<Video>,
    pub title: String,
    pub description: String,
    pub credits: String,
    pub publish_date: Timestamp,
    pub is_public: bool,
    pub likes: i64,
    pub user: i64,
    pub comments: Vec<Comment>,
}

impl Table for Video {
    fn table() -> &'static str {
        "videos"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub credits: String,
    pub publish_date: Timestamp,
    pub is_public: bool,
    pub likes: i64,
    pub user: i64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Partial update; only the provided fields are merged into the record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
}

impl NewVideo {
    /// Boundary validation, applied before the payload reaches storage.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description is required".to_string());
        }
        if self.credits.trim().is_empty() {
            return Err("credits is required".to_string());
        }
        if self.likes < 0 {
            return Err("likes must not be negative".to_string());
        }

        Ok(())
    }
}

impl VideoPatch {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.likes, Some(likes) if likes < 0) {
            return Err("likes must not be negative".to_string());
        }

        Ok(())
    }
}

impl Video {
    /// Inserts a new video under a freshly allocated identifier. A failed
    /// allocation aborts the creation.
    #[tracing::instrument(skip(db))]
    pub async fn create(payload: NewVideo, db: &Database) -> Result<Video, VideoError> {
        let id = sequence::next_id("video", db)
            .await
            .context(AllocateVideoIdSnafu)?;

        let created: Option<Video> = db
            .create((Video::table(), id))
            .content(&payload)
            .await
            .context(QuerySnafu)
            .context(VideoStorageSnafu)?;

        let video = created
            .context(EmptyResponseSnafu)
            .context(VideoStorageSnafu)?;

        tracing::info!(%video.id, "created video");
        Ok(video)
    }

    pub async fn list(db: &Database) -> crate::database::Result<Vec<Video>> {
        db.select(Video::table()).await.context(QuerySnafu)
    }

    pub async fn find(id: i64, db: &Database) -> crate::database::Result<Option<Video>> {
        db.select((Video::table(), id)).await.context(QuerySnafu)
    }

    /// Merges the patch into the record. `None` means no such id, which is a
    /// normal outcome rather than an error.
    pub async fn update(
        id: i64,
        patch: VideoPatch,
        db: &Database,
    ) -> crate::database::Result<Option<Video>> {
        db.sql("UPDATE videos MERGE $patch WHERE id = type::thing('videos', $id) RETURN AFTER")
            .bind(("patch", patch))
            .bind(("id", id))
            .fetch_first()
            .await
    }

    pub async fn remove(id: i64, db: &Database) -> crate::database::Result<Option<Video>> {
        db.delete((Video::table(), id)).await.context(QuerySnafu)
    }

    pub async fn by_visibility(
        is_public: bool,
        db: &Database,
    ) -> crate::database::Result<Vec<Video>> {
        db.sql("SELECT * FROM videos WHERE isPublic = $is_public")
            .bind(("is_public", is_public))
            .fetch_first()
            .await
    }

    /// The five most liked videos, most liked first. Ties fall back to storage order.
    pub async fn top_by_likes(db: &Database) -> crate::database::Result<Vec<Video>> {
        db.sql("SELECT * FROM videos ORDER BY likes DESC LIMIT 5")
            .fetch_first()
            .await
    }

    pub async fn by_user(user: i64, db: &Database) -> crate::database::Result<Vec<Video>> {
        db.sql("SELECT * FROM videos WHERE `user` = $user")
            .bind(("user", user))
            .fetch_first()
            .await
    }

    /// Increments the like counter in a single atomic statement. The `WHERE`
    /// form never creates a record, so a missing id reports [VideoError::VideoNotFound];
    /// success means the statement returned the updated document.
    #[tracing::instrument(skip(db))]
    pub async fn like(id: i64, db: &Database) -> Result<Video, VideoError> {
        let updated: Option<Video> = db
            .sql("UPDATE videos SET likes += 1 WHERE id = type::thing('videos', $id) RETURN AFTER")
            .bind(("id", id))
            .fetch_first()
            .await
            .context(VideoStorageSnafu)?;

        updated.context(VideoNotFoundSnafu { id })
    }

    /// Appends an opaque comment value to the video's comment sequence.
    ///
    /// The append itself is a single `array::append` statement, so concurrent
    /// appends cannot lose each other's writes. The write acknowledgement alone
    /// is not treated as proof of the mutation: success is decided by re-reading
    /// the record and observing that the sequence grew.
    #[tracing::instrument(skip(db))]
    pub async fn add_comment(
        id: i64,
        comment: Comment,
        db: &Database,
    ) -> Result<Video, VideoError> {
        let before = Video::find(id, db)
            .await
            .context(VideoStorageSnafu)?
            .context(VideoNotFoundSnafu { id })?;

        let _: Option<Video> = db
            .sql("UPDATE videos SET comments = array::append(comments, $comment) WHERE id = type::thing('videos', $id) RETURN AFTER")
            .bind(("comment", comment))
            .bind(("id", id))
            .fetch_first()
            .await
            .context(VideoStorageSnafu)?;

        let after = Video::find(id, db)
            .await
            .context(VideoStorageSnafu)?
            .context(VideoNotFoundSnafu { id })?;

        ensure!(
            after.comments.len() > before.comments.len(),
            CommentNotAppendedSnafu { id }
        );

        Ok(after)
    }
}
