//! Integration tests against a real MySQL database.
//!
//! These tests require a reachable database configured through the usual
//! `DB_*` (or `MYSQL*`) environment variables and `SCHOOL_LOCATOR_IT=1`.
//! Run with: cargo test --test integration -- --ignored
//!
//! Note: rows are written with unique names, so the tests can share a
//! database with other data.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use school_locator::config::Config;
use school_locator::error::StoreError;
use school_locator::geo::Coordinates;
use school_locator::schools::rank_by_distance;
use school_locator::store::{MySqlSchoolStore, SchoolStore};
use school_locator::validation::NewSchool;

/// Get a store from environment.
async fn test_store() -> Option<MySqlSchoolStore> {
    if std::env::var("SCHOOL_LOCATOR_IT").ok().as_deref() != Some("1") {
        return None;
    }

    let config = Config::load().ok()?;
    let store = MySqlSchoolStore::connect_lazy(&config);
    school_locator::store::initialize_with_retry(&store, 3, Duration::from_secs(1))
        .await
        .ok()?;
    Some(store)
}

fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{prefix}-{nanos}")
}

fn new_school(name: &str, latitude: f64, longitude: f64) -> NewSchool {
    NewSchool {
        name: name.to_string(),
        address: format!("{name} address"),
        location: Coordinates::new(latitude, longitude),
    }
}

/// Test that an inserted school is listed with identical fields.
#[tokio::test]
#[ignore = "requires MySQL"]
async fn test_insert_then_list() {
    let store = match test_store().await {
        Some(s) => s,
        None => {
            println!("Skipping: SCHOOL_LOCATOR_IT not set or database unreachable");
            return;
        }
    };

    let school = new_school(&unique("it-roundtrip"), 12.34, -56.78);
    let id = store.insert_school(&school).await.expect("insert failed");

    let rows = store.list_schools().await.expect("list failed");
    let row = rows.iter().find(|r| r.id == id).expect("inserted row missing");

    assert_eq!(row.name, school.name);
    assert_eq!(row.address, school.address);
    assert_eq!(row.latitude, 12.34);
    assert_eq!(row.longitude, -56.78);

    store.close().await;
}

/// Test that the unique index rejects a second identical school.
#[tokio::test]
#[ignore = "requires MySQL"]
async fn test_unique_index_rejects_duplicate() {
    let store = match test_store().await {
        Some(s) => s,
        None => {
            println!("Skipping: SCHOOL_LOCATOR_IT not set or database unreachable");
            return;
        }
    };

    let school = new_school(&unique("it-duplicate"), 1.0, 1.0);
    assert!(!store
        .duplicate_exists(&school.name, &school.address)
        .await
        .unwrap());

    store.insert_school(&school).await.expect("first insert failed");
    assert!(store
        .duplicate_exists(&school.name, &school.address)
        .await
        .unwrap());

    let second = store.insert_school(&school).await;
    assert!(
        matches!(second, Err(StoreError::Duplicate)),
        "expected duplicate, got {:?}",
        second
    );

    store.close().await;
}

/// Test that listing preserves insertion order so ranking ties are stable.
#[tokio::test]
#[ignore = "requires MySQL"]
async fn test_listing_ranks_by_distance() {
    let store = match test_store().await {
        Some(s) => s,
        None => {
            println!("Skipping: SCHOOL_LOCATOR_IT not set or database unreachable");
            return;
        }
    };

    let prefix = unique("it-rank");
    for (suffix, lat, lon) in [("far", 60.0, 60.0), ("near", 0.0, 0.1), ("mid", 5.0, 5.0)] {
        store
            .insert_school(&new_school(&format!("{prefix}-{suffix}"), lat, lon))
            .await
            .expect("insert failed");
    }

    let rows: Vec<_> = store
        .list_schools()
        .await
        .expect("list failed")
        .into_iter()
        .filter(|r| r.name.starts_with(&prefix))
        .collect();

    let ranked = rank_by_distance(Coordinates::new(0.0, 0.0), rows);
    let names: Vec<_> = ranked.iter().map(|r| r.school.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            format!("{prefix}-near"),
            format!("{prefix}-mid"),
            format!("{prefix}-far"),
        ]
    );

    store.close().await;
}

/// Test that duplicate detection matches exact strings, as the in-memory
/// store does: names differing only in case are distinct schools.
#[tokio::test]
#[ignore = "requires MySQL"]
async fn test_duplicate_check_is_case_sensitive() {
    let store = match test_store().await {
        Some(s) => s,
        None => {
            println!("Skipping: SCHOOL_LOCATOR_IT not set or database unreachable");
            return;
        }
    };

    let lower = new_school(&unique("it-case"), 2.0, 2.0);
    let upper = NewSchool {
        name: lower.name.to_uppercase(),
        ..lower.clone()
    };

    store.insert_school(&lower).await.expect("first insert failed");
    assert!(!store
        .duplicate_exists(&upper.name, &upper.address)
        .await
        .unwrap());
    store
        .insert_school(&upper)
        .await
        .expect("case-differing insert failed");

    store.close().await;
}
