//! PostgreSQL store tests.
//!
//! Ignored by default. Run with
//! `GUESTBOOK_TEST_DATABASE_URL=postgres://... cargo test --test postgres_store -- --ignored`
//! against a disposable database; the bundled migrations are applied on
//! connect.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use std::str::FromStr;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use guestbook_gateway::config::{DatabaseConfig, StoreBackend};
use guestbook_gateway::domain::{EntryClock, EntryId, GuestbookEntry};
use guestbook_gateway::error::StoreError;
use guestbook_gateway::persistence::{EntryStore, PostgresEntryStore};

fn database_url() -> String {
    std::env::var("GUESTBOOK_TEST_DATABASE_URL")
        .expect("GUESTBOOK_TEST_DATABASE_URL must point at a disposable database")
}

async fn connect() -> PostgresEntryStore {
    let config = DatabaseConfig {
        url: database_url(),
        max_connections: 4,
        min_connections: 1,
        connect_timeout: Duration::from_secs(5),
        run_migrations: true,
    };
    PostgresEntryStore::connect(&config)
        .await
        .expect("connect to test database")
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn save_and_read_back() {
    let store = connect().await;
    assert_eq!(store.backend(), StoreBackend::Postgres);

    let clock = EntryClock::new();
    let entry = GuestbookEntry::new("Ada", "stored in postgres", &clock);
    let saved = store.save(entry.clone()).await.unwrap();
    assert_eq!(saved, entry);

    let found = store.find_by_id(entry.id()).await.unwrap();
    assert_eq!(found, Some(entry.clone()));

    let all = store.find_all().await.unwrap();
    assert!(all.contains(&entry));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn unknown_id_is_none() {
    let store = connect().await;
    let found = store.find_by_id(&EntryId::generate()).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn id_with_nul_byte_is_none() {
    let store = connect().await;
    let found = store.find_by_id(&EntryId::from_string("abc\0def")).await;
    assert!(matches!(found, Ok(None)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn duplicate_id_conflicts() {
    let store = connect().await;
    let entry = GuestbookEntry::new("Ada", "once", &EntryClock::new());
    store.save(entry.clone()).await.unwrap();

    let again = store.save(entry).await;
    assert!(matches!(again, Err(StoreError::Conflict(_))));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn find_all_orders_by_created_at_then_id() {
    let store = connect().await;
    let run = EntryId::generate();
    let id = |suffix: &str| EntryId::from_string(format!("{run}-{suffix}"));

    let earlier = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 1).unwrap();

    // Inserted out of order on purpose.
    for (suffix, at) in [("b", later), ("z", earlier), ("a", later)] {
        let entry =
            GuestbookEntry::from_parts(id(suffix), "n".to_string(), "m".to_string(), at);
        store.save(entry).await.unwrap();
    }

    let ours: Vec<String> = store
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.id().as_str().starts_with(run.as_str()))
        .map(|e| e.id().to_string())
        .collect();
    assert_eq!(
        ours,
        vec![id("z").to_string(), id("a").to_string(), id("b").to_string()]
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn missing_table_is_schema_missing() {
    // A search path with no entries table.
    let schema = format!("gb_empty_{}", EntryId::generate().as_str().replace('-', ""));
    let options = PgConnectOptions::from_str(&database_url())
        .unwrap()
        .options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    let store = PostgresEntryStore::new(pool);
    let result = store.ensure_schema().await;
    assert!(matches!(result, Err(StoreError::SchemaMissing(_))));
}
