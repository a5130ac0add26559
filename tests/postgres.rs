mod common;

use std::time::Duration;

use common::category;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue::Set, ConnectOptions, Database, DatabaseConnection, DbBackend, QueryOrder,
    Statement,
};
use tokio::sync::{Mutex, MutexGuard};
use tree_editor::{parse_tree, TreeEditorError, TreeEditorRepository};

// Every test truncates the same table.
static TABLE: Mutex<()> = Mutex::const_new(());

#[tokio::test]
async fn save_tree_moves_a_subtree() -> Result<(), Box<dyn std::error::Error>> {
    let _table = lock_table().await;
    let Some(db) = setup_database().await? else {
        return Ok(());
    };
    reset_tables(&db).await?;
    seed(&db).await?;

    let repo = TreeEditorRepository::<category::Model>::new();

    // Poetry (3) moves under Fiction (2).
    let updates =
        parse_tree::<i32>("[[1, null, 1, 6, 0, 1], [1, 1, 2, 5, 1, 2], [1, 2, 3, 4, 2, 3]]")?;
    let outcome = repo.save_tree(&db, &updates).await?;
    assert_eq!(outcome.updated, 3);

    let poetry = category::Entity::find_by_id(3)
        .one(&db)
        .await?
        .expect("poetry exists");
    assert_eq!(poetry.parent_id, Some(2));
    assert_eq!((poetry.lft, poetry.rght, poetry.level), (3, 4, 2));

    let order: Vec<String> = repo
        .nodes(&db)
        .await?
        .into_iter()
        .map(|node| node.name)
        .collect();
    assert_eq!(order, vec!["Books", "Fiction", "Poetry"]);

    Ok(())
}

#[tokio::test]
async fn delete_item_removes_the_row() -> Result<(), Box<dyn std::error::Error>> {
    let _table = lock_table().await;
    let Some(db) = setup_database().await? else {
        return Ok(());
    };
    reset_tables(&db).await?;
    seed(&db).await?;

    let repo = TreeEditorRepository::<category::Model>::new();
    let deleted = repo.delete_item(&db, "3").await?;
    assert_eq!(deleted.name, "Poetry");

    let remaining = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(&db)
        .await?;
    let ids: Vec<i32> = remaining.into_iter().map(|node| node.id).collect();
    assert_eq!(ids, vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn failed_save_does_not_hold_the_lock() -> Result<(), Box<dyn std::error::Error>> {
    let _table = lock_table().await;
    let Some(first) = single_connection_pool().await? else {
        return Ok(());
    };
    let Some(second) = single_connection_pool().await? else {
        return Ok(());
    };
    reset_tables(&first).await?;
    seed(&first).await?;

    let repo = TreeEditorRepository::<category::Model>::new();

    // Parent 999 does not exist, so the foreign key aborts the transaction.
    let broken = parse_tree::<i32>("[[1, null, 1, 4, 0, 1], [1, 999, 2, 3, 1, 2]]")?;
    let err = repo
        .save_tree(&first, &broken)
        .await
        .expect_err("foreign key violation");
    assert!(matches!(err, TreeEditorError::Database(_)));

    let held = second
        .query_one(Statement::from_string(
            DbBackend::Postgres,
            "SELECT count(*) AS held FROM pg_locks WHERE locktype = 'advisory' AND granted",
        ))
        .await?
        .expect("count row")
        .try_get::<i64>("", "held")?;
    assert_eq!(held, 0);

    let updates =
        parse_tree::<i32>("[[1, null, 1, 6, 0, 1], [1, 1, 2, 5, 1, 2], [1, 2, 3, 4, 2, 3]]")?;
    let outcome = tokio::time::timeout(Duration::from_secs(5), repo.save_tree(&second, &updates))
        .await
        .expect("second save is not blocked")?;
    assert_eq!(outcome.updated, 3);

    // The first pool's only connection is still usable.
    let books = category::Entity::find_by_id(1)
        .one(&first)
        .await?
        .expect("books exists");
    assert_eq!(books.rght, 6);

    Ok(())
}

async fn lock_table() -> MutexGuard<'static, ()> {
    TABLE.lock().await
}

fn database_url() -> Option<String> {
    std::env::var("TREE_EDITOR_TEST_DATABASE_URL").ok()
}

async fn setup_database() -> Result<Option<DatabaseConnection>, sea_orm::DbErr> {
    let Some(url) = database_url() else {
        return Ok(None);
    };
    Database::connect(url).await.map(Some)
}

async fn single_connection_pool() -> Result<Option<DatabaseConnection>, sea_orm::DbErr> {
    let Some(url) = database_url() else {
        return Ok(None);
    };
    let mut options = ConnectOptions::new(url);
    options.max_connections(1).min_connections(1);
    Database::connect(options).await.map(Some)
}

async fn reset_tables(db: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    db.execute(Statement::from_string(
        DbBackend::Postgres,
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id SERIAL PRIMARY KEY,
            parent_id INTEGER REFERENCES categories(id) ON DELETE CASCADE,
            tree_id INTEGER NOT NULL,
            lft INTEGER NOT NULL,
            rght INTEGER NOT NULL,
            level INTEGER NOT NULL,
            name TEXT NOT NULL,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            status TEXT NOT NULL DEFAULT 'p',
            published_on DATE,
            price NUMERIC(12, 2) NOT NULL DEFAULT 0
        );
        "#,
    ))
    .await?;

    db.execute(Statement::from_string(
        DbBackend::Postgres,
        "ALTER TABLE categories ADD COLUMN IF NOT EXISTS price NUMERIC(12, 2) NOT NULL DEFAULT 0;",
    ))
    .await?;

    db.execute(Statement::from_string(
        DbBackend::Postgres,
        "TRUNCATE TABLE categories RESTART IDENTITY CASCADE;",
    ))
    .await?;

    Ok(())
}

async fn seed(db: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    let rows = [
        (None, 1, 6, 0, "Books"),
        (Some(1), 2, 3, 1, "Fiction"),
        (Some(1), 4, 5, 1, "Poetry"),
    ];

    for (parent_id, lft, rght, level, name) in rows {
        category::ActiveModel {
            parent_id: Set(parent_id),
            tree_id: Set(1),
            lft: Set(lft),
            rght: Set(rght),
            level: Set(level),
            name: Set(name.to_string()),
            active: Set(true),
            status: Set("p".to_string()),
            published_on: Set(None),
            price: Set(Decimal::new(1999, 2)),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
