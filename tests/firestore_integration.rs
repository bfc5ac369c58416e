// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage integration tests.
//!
//! The emulator tests require the Firestore emulator to be running
//! (set FIRESTORE_EMULATOR_HOST). The same scenarios run against the
//! in-memory store unconditionally.

use chrono::{TimeZone, Utc};
use vanlang_budget::db::{collections, FirestoreDb};
use vanlang_budget::models::{Budget, Role, User};

mod common;
use common::{test_db, test_db_offline};

/// Unique suffix for test isolation against a shared emulator.
fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

fn test_user(id: &str, email: &str) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone_number: None,
        role: Role::User,
        is_email_verified: false,
        active: true,
        language: Default::default(),
        settings: Default::default(),
        password_changed_at: None,
        password_reset_digest: None,
        password_reset_expires: None,
        created_at: now,
        updated_at: now,
    }
}

fn test_budget(id: &str, user_id: &str, category: &str) -> Budget {
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    Budget {
        id: id.to_string(),
        user_id: user_id.to_string(),
        category: category.to_string(),
        amount: 1_000_000.0,
        month: 3,
        year: 2026,
        created_at: created,
        updated_at: created,
    }
}

async fn user_round_trip(db: &FirestoreDb) {
    let id = unique_id("user");
    let email = format!("{}@example.com", id);

    assert!(db.get_user(&id).await.unwrap().is_none());

    let mut user = test_user(&id, &email);
    db.upsert_user(&user).await.unwrap();

    let fetched = db.get_user(&id).await.unwrap().expect("user stored");
    assert_eq!(fetched.email, email);
    assert!(fetched.active);

    let by_email = db
        .find_user_by_email(&email.to_uppercase())
        .await
        .unwrap()
        .expect("lookup is case-insensitive");
    assert_eq!(by_email.id, id);

    user.role = Role::Admin;
    db.upsert_user(&user).await.unwrap();
    assert_eq!(db.get_user(&id).await.unwrap().unwrap().role, Role::Admin);

    db.delete(collections::USERS, &id).await.unwrap();
    assert!(db.get_user(&id).await.unwrap().is_none());
}

async fn documents_by_owner(db: &FirestoreDb) {
    let owner = unique_id("owner");
    let other = unique_id("other");
    let ids = [unique_id("b"), unique_id("b"), unique_id("b")];

    db.set(collections::BUDGETS, &ids[0], &test_budget(&ids[0], &owner, "Food"))
        .await
        .unwrap();
    db.set(collections::BUDGETS, &ids[1], &test_budget(&ids[1], &owner, "Rent"))
        .await
        .unwrap();
    db.set(collections::BUDGETS, &ids[2], &test_budget(&ids[2], &other, "Food"))
        .await
        .unwrap();

    let mut mine: Vec<Budget> = db
        .list_by_field(collections::BUDGETS, "user_id", &owner)
        .await
        .unwrap();
    mine.sort_by(|a, b| a.category.cmp(&b.category));
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].category, "Food");
    assert_eq!(mine[1].category, "Rent");

    let removed = db
        .delete_many(collections::BUDGETS, &ids[..2])
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let mine: Vec<Budget> = db
        .list_by_field(collections::BUDGETS, "user_id", &owner)
        .await
        .unwrap();
    assert!(mine.is_empty());

    let theirs: Option<Budget> = db.get(collections::BUDGETS, &ids[2]).await.unwrap();
    assert_eq!(theirs.unwrap().user_id, other);
    db.delete(collections::BUDGETS, &ids[2]).await.unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// EMULATOR
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_emulator_user_round_trip() {
    require_emulator!();
    user_round_trip(&test_db().await).await;
}

#[tokio::test]
async fn test_emulator_documents_by_owner() {
    require_emulator!();
    documents_by_owner(&test_db().await).await;
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY AND OFFLINE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_memory_user_round_trip() {
    user_round_trip(&FirestoreDb::new_in_memory()).await;
}

#[tokio::test]
async fn test_memory_documents_by_owner() {
    documents_by_owner(&FirestoreDb::new_in_memory()).await;
}

#[tokio::test]
async fn test_offline_store_fails_every_call() {
    let db = test_db_offline();
    assert!(db.get_user("anyone").await.is_err());
    assert!(db
        .upsert_user(&test_user("u1", "u1@example.com"))
        .await
        .is_err());
    let listed: Result<Vec<Budget>, _> = db.list_all(collections::BUDGETS).await;
    assert!(listed.is_err());
}
