use std::collections::HashSet;

use tanuki::sequence;

mod common;

#[tokio::test]
async fn identifiers_start_at_one_and_strictly_increase() {
    let db = common::database().await;

    assert_eq!(sequence::next_id("user", &db).await.unwrap(), 1);
    assert_eq!(sequence::next_id("user", &db).await.unwrap(), 2);
    assert_eq!(sequence::next_id("user", &db).await.unwrap(), 3);
}

#[tokio::test]
async fn keys_allocate_independently() {
    let db = common::database().await;

    assert_eq!(sequence::next_id("user", &db).await.unwrap(), 1);
    assert_eq!(sequence::next_id("user", &db).await.unwrap(), 2);

    assert_eq!(
        sequence::next_id("video", &db).await.unwrap(),
        1,
        "a fresh key must start its own sequence"
    );
}

#[tokio::test]
async fn concurrent_allocations_yield_distinct_contiguous_values() {
    let db = common::database().await;

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { sequence::next_id("video", &db).await.unwrap() })
        })
        .collect();

    let mut allocated = Vec::new();
    for task in tasks {
        allocated.push(task.await.unwrap());
    }

    let unique: HashSet<i64> = allocated.iter().copied().collect();
    assert_eq!(unique.len(), allocated.len(), "no identifier may repeat");

    let expected: HashSet<i64> = (1..=16).collect();
    assert_eq!(unique, expected, "allocations must form a contiguous range");
}
