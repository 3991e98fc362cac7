mod helpers;

use docstore::{
    DatabaseErrorKind, Filter, JsonDocument, QueryOptions, RecordKey, SortOption, StoreError,
};
use serde_json::json;

use helpers::database::{setup_test_db, sqlite_repository, teardown_test_db};
use helpers::{priced, product, Product};

async fn seeded() -> (sqlx::SqlitePool, docstore::Repository<Product>) {
    let pool = setup_test_db().await;
    let repo = sqlite_repository(&pool, "products");
    repo.save_all(&[
        priced("1", "apple", 30),
        priced("2", "banana", 10),
        priced("3", "cherry", 20),
        priced("4", "apple", 40),
    ])
    .await
    .expect("failed to seed products");
    (pool, repo)
}

#[tokio::test]
async fn test_save_and_find_by_id() {
    let pool = setup_test_db().await;
    let repo = sqlite_repository::<Product>(&pool, "products");

    repo.save(&product("123", "sdsdsds")).await.expect("failed to save");

    let found = repo.find_by_id(&RecordKey::new("123")).await.unwrap();
    assert_eq!(found, Some(product("123", "sdsdsds")));
    assert_eq!(repo.find_by_id(&RecordKey::new("404")).await.unwrap(), None);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_save_duplicate_is_store_write_error() {
    let pool = setup_test_db().await;
    let repo = sqlite_repository::<Product>(&pool, "products");

    repo.save(&product("1", "a")).await.unwrap();
    let err = repo.save(&product("1", "b")).await.unwrap_err();

    assert_eq!(err.operation, "save");
    assert!(matches!(err.kind(), DatabaseErrorKind::Store(StoreError::Write(_))));
    assert!(err.is_duplicate_key());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_find_with_filter_sort_and_paging() {
    let (pool, repo) = seeded().await;

    let apples = repo
        .find(&Filter::all().eq("name", "apple"), &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(apples.len(), 2);

    let by_price = repo
        .find(
            &Filter::all(),
            &QueryOptions::default()
                .sort_by(SortOption::desc("price"))
                .offset(1)
                .limit(2),
        )
        .await
        .unwrap();
    let ids: Vec<_> = by_price.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);

    let page = repo
        .find_paginated(
            &Filter::all().eq("name", "apple"),
            &QueryOptions::default().limit(1),
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 2);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_find_one_and_find_by_ids() {
    let (pool, repo) = seeded().await;

    let first = repo.find_one(&Filter::all().eq("price", 20)).await.unwrap();
    assert_eq!(first.map(|p| p.id), Some("3".to_string()));
    assert!(repo.find_one(&Filter::all().eq("price", 99)).await.unwrap().is_none());

    let mut found = repo
        .find_by_ids(&[RecordKey::new("2"), RecordKey::new("4"), RecordKey::new("9")])
        .await
        .unwrap();
    found.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(found, vec![priced("2", "banana", 10), priced("4", "apple", 40)]);
    assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());

    assert_eq!(repo.find_all().await.unwrap().len(), 4);
    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_projection_returns_listed_fields() {
    let pool = setup_test_db().await;
    let repo = sqlite_repository::<JsonDocument>(&pool, "docs");
    let doc = JsonDocument::try_from(json!({"_id": "1", "name": "a", "secret": "x"})).unwrap();
    repo.save(&doc).await.unwrap();

    let projected = repo
        .find(&Filter::all(), &QueryOptions::default().project(["name"]))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&projected[0]).unwrap(),
        json!({"_id": "1", "name": "a"})
    );

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_projection_decodes_into_typed_record() {
    let (pool, repo) = seeded().await;

    let found = repo
        .find(&Filter::by_key("3"), &QueryOptions::default().project(["name"]))
        .await
        .unwrap();
    assert_eq!(found, vec![product("3", "cherry")]);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_distinct_values() {
    let (pool, repo) = seeded().await;

    let mut names = repo.distinct("name", &Filter::all()).await.unwrap();
    names.sort_by_key(ToString::to_string);
    assert_eq!(names, vec![json!("apple"), json!("banana"), json!("cherry")]);
    assert!(repo.distinct(" ", &Filter::all()).await.unwrap_err().is_invalid_argument());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_update_and_not_found() {
    let (pool, repo) = seeded().await;

    repo.update(&RecordKey::new("2"), &priced("2", "banana", 15))
        .await
        .unwrap();
    let updated = repo.find_by_id(&RecordKey::new("2")).await.unwrap().unwrap();
    assert_eq!(updated.price, 15);

    let err = repo
        .update(&RecordKey::new("404"), &product("404", "ghost"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.operation, "update");

    let err = repo
        .update_by_filter(&Filter::all().eq("name", "durian"), &product("5", "durian"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_upsert_inserts_then_updates() {
    let pool = setup_test_db().await;
    let repo = sqlite_repository::<Product>(&pool, "products");
    let filter = Filter::by_key("9");

    assert!(repo.upsert(&filter, &priced("9", "fig", 1)).await.unwrap());
    assert!(!repo.upsert(&filter, &priced("9", "fig", 2)).await.unwrap());

    let stored = repo.find_by_id(&RecordKey::new("9")).await.unwrap().unwrap();
    assert_eq!(stored.price, 2);
    assert_eq!(repo.count().await.unwrap(), 1);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_delete_operations() {
    let (pool, repo) = seeded().await;

    repo.delete(&RecordKey::new("1")).await.unwrap();
    assert!(repo.delete(&RecordKey::new("1")).await.unwrap_err().is_not_found());

    assert_eq!(
        repo.delete_by_filter(&Filter::all().eq("name", "apple")).await.unwrap(),
        1
    );
    assert_eq!(repo.delete_all().await.unwrap(), 2);
    assert_eq!(repo.count().await.unwrap(), 0);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_count_and_exists() {
    let (pool, repo) = seeded().await;

    assert_eq!(repo.count().await.unwrap(), 4);
    assert_eq!(
        repo.count_by_filter(&Filter::all().eq("name", "apple")).await.unwrap(),
        2
    );
    assert!(repo.exists_by_id(&RecordKey::new("3")).await.unwrap());
    assert!(!repo.exists_by_id(&RecordKey::new("33")).await.unwrap());
    assert!(repo.exists_by_filter(&Filter::all().eq("price", 40)).await.unwrap());

    let err = repo.exists_by_filter(&Filter::all()).await.unwrap_err();
    assert!(err.is_invalid_argument());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let pool = setup_test_db().await;
    let products = sqlite_repository::<Product>(&pool, "products");
    let archive = sqlite_repository::<Product>(&pool, "archive");

    products.save(&product("1", "a")).await.unwrap();
    archive.save(&product("1", "a")).await.unwrap();

    assert_eq!(products.count().await.unwrap(), 1);
    assert_eq!(archive.count().await.unwrap(), 1);
    archive.delete_all().await.unwrap();
    assert_eq!(products.count().await.unwrap(), 1);

    teardown_test_db(pool).await;
}
