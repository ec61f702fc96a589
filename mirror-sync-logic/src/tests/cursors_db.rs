use pretty_assertions::assert_eq;

use crate::{repository::cursors, tests::init_db};

#[tokio::test]
async fn unknown_topic_starts_at_zero() {
    let db = init_db("cursors_db_default").await;

    assert_eq!(cursors::get(&db.client(), "0.0.100").await.unwrap(), 0);
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let db = init_db("cursors_db_set_get").await;

    cursors::set(&db.client(), "0.0.100", 8).await.unwrap();
    assert_eq!(cursors::get(&db.client(), "0.0.100").await.unwrap(), 8);

    cursors::set(&db.client(), "0.0.100", 15).await.unwrap();
    assert_eq!(cursors::get(&db.client(), "0.0.100").await.unwrap(), 15);
}

#[tokio::test]
async fn lower_value_is_rejected() {
    let db = init_db("cursors_db_monotonic").await;

    cursors::set(&db.client(), "0.0.100", 20).await.unwrap();
    cursors::set(&db.client(), "0.0.100", 5).await.unwrap();

    assert_eq!(cursors::get(&db.client(), "0.0.100").await.unwrap(), 20);
}

#[tokio::test]
async fn topics_are_independent() {
    let db = init_db("cursors_db_independent").await;

    cursors::set(&db.client(), "0.0.100", 3).await.unwrap();
    cursors::set(&db.client(), "0.0.200", 9).await.unwrap();

    assert_eq!(cursors::get(&db.client(), "0.0.100").await.unwrap(), 3);
    assert_eq!(cursors::get(&db.client(), "0.0.200").await.unwrap(), 9);
}
