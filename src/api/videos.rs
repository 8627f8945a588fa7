use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use derive_new::new;
use serde::Serialize;
use snafu::ResultExt as _;

use crate::auth::Claims;
use crate::model::{Comment, NewVideo, Video, VideoPatch};

use super::error::{Notice, Payload, StorageSnafu, VideoOpSnafu};
use super::state::App;
use super::{ApiError, Result};

#[derive(Debug, Serialize, new)]
pub struct VideoListing {
    status: u16,
    videos: Vec<Video>,
}

#[derive(Debug, Serialize, new)]
pub struct VideoReply {
    status: u16,
    video: Video,
}

#[derive(Debug, Serialize, new)]
pub struct VideoCreated {
    status: u16,
    #[serde(rename = "newVideo")]
    new_video: Video,
}

pub async fn list(State(app): State<App>) -> Result<Json<VideoListing>> {
    let videos = Video::list(&app.database).await.context(StorageSnafu)?;
    Ok(Json(VideoListing::new(200, videos)))
}

pub async fn find(State(app): State<App>, Path(id): Path<i64>) -> Result<Json<VideoReply>> {
    Video::find(id, &app.database)
        .await
        .context(StorageSnafu)?
        .map(|video| Json(VideoReply::new(200, video)))
        .ok_or_else(|| ApiError::not_found("Video not found"))
}

pub async fn create(
    State(app): State<App>,
    _claims: Claims,
    Payload(payload): Payload<NewVideo>,
) -> Result<(StatusCode, Json<VideoCreated>)> {
    payload.validate().map_err(ApiError::validation)?;

    let video = Video::create(payload, &app.database)
        .await
        .context(VideoOpSnafu)?;

    Ok((StatusCode::CREATED, Json(VideoCreated::new(201, video))))
}

pub async fn update(
    State(app): State<App>,
    _claims: Claims,
    Path(id): Path<i64>,
    Payload(patch): Payload<VideoPatch>,
) -> Result<Json<Notice>> {
    patch.validate().map_err(ApiError::validation)?;

    Video::update(id, patch, &app.database)
        .await
        .context(StorageSnafu)?
        .map(|_| Json(Notice::new(200, "Video updated successfully".to_string())))
        .ok_or_else(|| ApiError::not_found("Video not found or nothing changed"))
}

pub async fn remove(
    State(app): State<App>,
    _claims: Claims,
    Path(id): Path<i64>,
) -> Result<Json<Notice>> {
    Video::remove(id, &app.database)
        .await
        .context(StorageSnafu)?
        .map(|_| Json(Notice::new(200, "Video deleted successfully".to_string())))
        .ok_or_else(|| ApiError::not_found("Video not found"))
}

pub async fn by_visibility(
    State(app): State<App>,
    Path(visibility): Path<String>,
) -> Result<Json<VideoListing>> {
    let is_public = visibility == "public";

    let videos = Video::by_visibility(is_public, &app.database)
        .await
        .context(StorageSnafu)?;

    Ok(Json(VideoListing::new(200, videos)))
}

pub async fn top_by_likes(State(app): State<App>) -> Result<Json<VideoListing>> {
    let videos = Video::top_by_likes(&app.database)
        .await
        .context(StorageSnafu)?;

    Ok(Json(VideoListing::new(200, videos)))
}

pub async fn by_user(State(app): State<App>, Path(user): Path<i64>) -> Result<Json<VideoListing>> {
    let videos = Video::by_user(user, &app.database)
        .await
        .context(StorageSnafu)?;

    Ok(Json(VideoListing::new(200, videos)))
}

pub async fn add_comment(
    State(app): State<App>,
    Path(id): Path<i64>,
    Payload(comment): Payload<Comment>,
) -> Result<Json<Notice>> {
    Video::add_comment(id, comment, &app.database)
        .await
        .context(VideoOpSnafu)?;

    Ok(Json(Notice::new(
        200,
        "Comment added successfully".to_string(),
    )))
}

pub async fn like(State(app): State<App>, Path(id): Path<i64>) -> Result<Json<Notice>> {
    Video::like(id, &app.database)
        .await
        .context(VideoOpSnafu)?;

    Ok(Json(Notice::new(200, "Like added successfully".to_string())))
}
