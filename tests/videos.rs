use serde_json::json;

use tanuki::model::{now, NewVideo, Video, VideoError, VideoPatch};

mod common;

fn payload(title: &str, likes: i64, user: i64, is_public: bool) -> NewVideo {
    NewVideo {
        title: title.to_string(),
        description: "a description".to_string(),
        credits: "studio crew".to_string(),
        publish_date: now(),
        is_public,
        likes,
        user,
        comments: Vec::new(),
    }
}

#[tokio::test]
async fn creation_allocates_increasing_ids() {
    let db = common::database().await;

    let first = Video::create(payload("First", 0, 1, true), &db)
        .await
        .unwrap();
    let second = Video::create(payload("Second", 0, 1, false), &db)
        .await
        .unwrap();

    assert_eq!(first.id.value(), 1);
    assert_eq!(second.id.value(), 2);
    assert_eq!(first.title, "First");
    assert!(first.comments.is_empty());
}

#[tokio::test]
async fn find_reports_absence_as_none() {
    let db = common::database().await;

    let video = Video::create(payload("First", 0, 1, true), &db)
        .await
        .unwrap();

    assert_eq!(Video::find(video.id.value(), &db).await.unwrap(), Some(video));
    assert_eq!(Video::find(999, &db).await.unwrap(), None);
}

#[tokio::test]
async fn update_merges_only_the_given_fields() {
    let db = common::database().await;

    let video = Video::create(payload("First", 3, 1, true), &db)
        .await
        .unwrap();

    let patch = VideoPatch {
        title: Some("Renamed".to_string()),
        ..VideoPatch::default()
    };

    let updated = Video::update(video.id.value(), patch, &db)
        .await
        .unwrap()
        .expect("record exists");

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.likes, 3, "untouched fields must survive");
}

#[tokio::test]
async fn mutations_on_missing_ids_are_not_errors() {
    let db = common::database().await;

    let updated = Video::update(999, VideoPatch::default(), &db).await.unwrap();
    assert_eq!(updated, None);

    let removed = Video::remove(999, &db).await.unwrap();
    assert_eq!(removed, None);
}

#[tokio::test]
async fn likes_increase_by_exactly_one_per_call() {
    let db = common::database().await;

    let video = Video::create(payload("First", 0, 1, true), &db)
        .await
        .unwrap();

    let liked = Video::like(video.id.value(), &db).await.unwrap();
    assert_eq!(liked.likes, 1);

    let liked = Video::like(video.id.value(), &db).await.unwrap();
    assert_eq!(liked.likes, 2);
}

#[tokio::test]
async fn liking_a_missing_video_reports_not_found() {
    let db = common::database().await;

    let result = Video::like(999, &db).await;
    assert!(matches!(result, Err(VideoError::VideoNotFound { .. })));

    // the failed like must not have created a record
    assert_eq!(Video::find(999, &db).await.unwrap(), None);
}

#[tokio::test]
async fn comments_append_in_order_and_grow_by_one() {
    let db = common::database().await;

    let video = Video::create(payload("First", 0, 1, true), &db)
        .await
        .unwrap();

    let after = Video::add_comment(video.id.value(), json!("first comment"), &db)
        .await
        .unwrap();
    assert_eq!(after.comments, vec![json!("first comment")]);

    let after = Video::add_comment(
        video.id.value(),
        json!({"author": 2, "text": "second"}),
        &db,
    )
    .await
    .unwrap();

    assert_eq!(
        after.comments,
        vec![json!("first comment"), json!({"author": 2, "text": "second"})],
        "insertion order must be preserved"
    );
}

#[tokio::test]
async fn commenting_on_a_missing_video_reports_not_found() {
    let db = common::database().await;

    let result = Video::add_comment(999, json!("hello"), &db).await;
    assert!(matches!(result, Err(VideoError::VideoNotFound { .. })));
}

#[tokio::test]
async fn top_by_likes_returns_at_most_five_sorted_descending() {
    let db = common::database().await;

    for likes in 0..6 {
        Video::create(payload(&format!("Video {likes}"), likes, 1, true), &db)
            .await
            .unwrap();
    }

    let top = Video::top_by_likes(&db).await.unwrap();

    assert_eq!(top.len(), 5);
    assert_eq!(top[0].likes, 5);
    assert!(
        top.windows(2).all(|pair| pair[0].likes >= pair[1].likes),
        "results must be ordered by likes descending"
    );
    assert!(
        top.iter().all(|video| video.likes > 0),
        "the least liked video must have been cut off"
    );
}

#[tokio::test]
async fn visibility_listing_filters_by_flag() {
    let db = common::database().await;

    Video::create(payload("Public", 0, 1, true), &db).await.unwrap();
    Video::create(payload("Private", 0, 1, false), &db)
        .await
        .unwrap();

    let public = Video::by_visibility(true, &db).await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].title, "Public");

    let private = Video::by_visibility(false, &db).await.unwrap();
    assert_eq!(private.len(), 1);
    assert_eq!(private[0].title, "Private");
}

#[tokio::test]
async fn user_listing_filters_by_owner() {
    let db = common::database().await;

    Video::create(payload("Mine", 0, 7, true), &db).await.unwrap();
    Video::create(payload("Theirs", 0, 8, true), &db)
        .await
        .unwrap();

    let mine = Video::by_user(7, &db).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].title, "Mine");

    let nobody = Video::by_user(999, &db).await.unwrap();
    assert!(nobody.is_empty());
}

#[tokio::test]
async fn like_and_comment_walkthrough() {
    let db = common::database().await;

    let video = Video::create(payload("A", 0, 1, true), &db).await.unwrap();
    assert_eq!(video.id.value(), 1);

    let liked = Video::like(1, &db).await.unwrap();
    assert_eq!(liked.likes, 1);

    let commented = Video::add_comment(1, json!("hi"), &db).await.unwrap();
    assert_eq!(commented.comments, vec![json!("hi")]);

    let top = Video::top_by_likes(&db).await.unwrap();
    assert!(top.iter().any(|video| video.id.value() == 1));
}

#[test]
fn creation_payloads_are_validated_at_the_boundary() {
    assert!(payload("First", 0, 1, true).validate().is_ok());

    let untitled = payload("", 0, 1, true);
    assert!(untitled.validate().is_err());

    let negative = payload("First", -1, 1, true);
    assert!(negative.validate().is_err());

    let patch = VideoPatch {
        likes: Some(-5),
        ..VideoPatch::default()
    };
    assert!(patch.validate().is_err());
}
