//! Integration tests for the MySQL repositories.
//!
//! These tests run against a real MySQL database using testcontainers and
//! are ignored by default. Run with `cargo test -- --ignored` when Docker is
//! available.

mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::TestDatabase;
use orgdesk_core::{
    ListParams, ListQuery, NewAccessToken, NewCatalogEntry, NewRole, NewUser, OrgdeskError, PagingPolicy,
    RoleId, UserSort,
};
use orgdesk_repository::{
    AccessTokenRepository, DivisionRepository, PositionRepository, RoleRepository, UserRepository,
};

fn new_user(employee_id: &str, email: &str) -> NewUser {
    NewUser {
        employee_id: employee_id.to_string(),
        name: format!("User {employee_id}"),
        email: email.to_string(),
        password_hash: "hashed_password_123".to_string(),
        phone: None,
        address: None,
        birthdate: None,
        join_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        profile_image: None,
        division_id: None,
        position_id: None,
        is_manager: false,
        manager_id: None,
        is_active: true,
        created_by: "system".to_string(),
    }
}

fn new_role(name: &str, level: i32) -> NewRole {
    NewRole {
        name: name.to_string(),
        level,
        is_active: true,
        created_by: "system".to_string(),
    }
}

fn entry(code: &str, name: &str) -> NewCatalogEntry {
    NewCatalogEntry {
        code: code.to_string(),
        name: name.to_string(),
        is_active: true,
        created_by: "system".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_user_insert_with_roles_and_find() {
    let db = TestDatabase::new().await;
    let users = db.users();
    let roles = db.roles();

    let admin = roles.insert(&new_role("Admin", 100)).await.unwrap();
    let staff = roles.insert(&new_role("Staff", 10)).await.unwrap();

    let user = users
        .insert(&new_user("EMP001", "Ada@Example.com"), &[admin.id, staff.id])
        .await
        .expect("Failed to insert user");
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.created_by.as_deref(), Some("system"));
    assert_eq!(user.updated_by.as_deref(), Some("system"));

    let found = users
        .find_by_email("ADA@example.com")
        .await
        .unwrap()
        .expect("User not found");
    assert_eq!(found.id, user.id);

    let links = users.role_links(&[user.id]).await.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(roles.count_users(admin.id).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_user_unique_violation_becomes_field_error() {
    let db = TestDatabase::new().await;
    let users = db.users();

    users.insert(&new_user("EMP001", "a@example.com"), &[]).await.unwrap();
    let err = users
        .insert(&new_user("EMP002", "a@example.com"), &[])
        .await
        .unwrap_err();

    match err {
        OrgdeskError::Validation(errors) => assert!(errors.contains_key("u_email")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_user_update_syncs_roles() {
    let db = TestDatabase::new().await;
    let users = db.users();
    let roles = db.roles();

    let a = roles.insert(&new_role("A", 1)).await.unwrap();
    let b = roles.insert(&new_role("B", 2)).await.unwrap();
    let c = roles.insert(&new_role("C", 3)).await.unwrap();

    let mut user = users.insert(&new_user("EMP001", "a@example.com"), &[a.id, b.id]).await.unwrap();
    user.name = "Renamed".to_string();
    user.updated_by = Some("7".to_string());

    let updated = users.update(&user, Some(&[b.id, c.id])).await.unwrap();
    assert_eq!(updated.name, "Renamed");

    let mut linked: Vec<RoleId> = users
        .role_links(&[user.id])
        .await
        .unwrap()
        .into_iter()
        .map(|(_, role)| role)
        .collect();
    linked.sort();
    assert_eq!(linked, vec![b.id, c.id]);

    assert!(users.delete(user.id).await.unwrap());
    assert_eq!(roles.count_users(b.id).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_self_managed_user_is_not_its_own_subordinate() {
    let db = TestDatabase::new().await;
    let users = db.users();

    let mut lead = users.insert(&new_user("EMP001", "lead@example.com"), &[]).await.unwrap();
    lead.manager_id = Some(lead.id);
    users.update(&lead, None).await.unwrap();

    let mut report = users.insert(&new_user("EMP002", "report@example.com"), &[]).await.unwrap();
    report.manager_id = Some(lead.id);
    users.update(&report, None).await.unwrap();
    assert_eq!(users.count_subordinates(lead.id).await.unwrap(), 1);

    report.manager_id = None;
    users.update(&report, None).await.unwrap();
    assert_eq!(users.count_subordinates(lead.id).await.unwrap(), 0);
    assert!(users.delete(lead.id).await.unwrap());
    assert!(users.find_by_id(lead.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_user_list_search_sort_and_paginate() {
    let db = TestDatabase::new().await;
    let users = db.users();

    for i in 1..=12 {
        users
            .insert(&new_user(&format!("EMP{i:03}"), &format!("user{i}@example.com")), &[])
            .await
            .unwrap();
    }

    let params = ListParams {
        page: Some("2".to_string()),
        per_page: Some("5".to_string()),
        sort_by: Some("u_employee_id".to_string()),
        sort_order: Some("desc".to_string()),
        search: None,
    };
    let page = users
        .find_all(&ListQuery::<UserSort>::from_params(&params, PagingPolicy::default()))
        .await
        .unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.data[0].employee_id, "EMP007");

    let params = ListParams {
        search: Some("user1".to_string()),
        ..ListParams::default()
    };
    let page = users
        .find_all(&ListQuery::<UserSort>::from_params(&params, PagingPolicy::default()))
        .await
        .unwrap();
    // user1, user10, user11, user12
    assert_eq!(page.total, 4);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_catalog_counts() {
    let db = TestDatabase::new().await;
    let users = db.users();
    let divisions = db.divisions();
    let positions = db.positions();

    let it = divisions.insert(&entry("IT", "Technology")).await.unwrap();
    divisions.insert(&entry("HR", "People")).await.unwrap();
    let dev = positions.insert(&entry("DEV", "Developer")).await.unwrap();

    let mut user = new_user("EMP001", "a@example.com");
    user.division_id = Some(it.id);
    user.position_id = Some(dev.id);
    users.insert(&user, &[]).await.unwrap();

    assert_eq!(divisions.count_users(it.id).await.unwrap(), 1);
    assert_eq!(positions.count_users(dev.id).await.unwrap(), 1);

    let counts = divisions.user_counts().await.unwrap();
    assert_eq!(counts.len(), 2);
    assert!(counts.iter().any(|c| c.name == "People" && c.count == 0));

    let err = divisions.insert(&entry("IT", "Duplicate")).await.unwrap_err();
    assert!(err.field_errors().is_some_and(|e| e.contains_key("div_code")));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_access_tokens() {
    let db = TestDatabase::new().await;
    let users = db.users();
    let tokens = db.tokens();

    let user = users.insert(&new_user("EMP001", "a@example.com"), &[]).await.unwrap();
    let token = tokens
        .insert(&NewAccessToken {
            user_id: user.id,
            name: "auth_token".to_string(),
            token_hash: "f".repeat(64),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
        .await
        .unwrap();

    let found = tokens.find_by_hash(&"f".repeat(64)).await.unwrap().expect("token");
    assert_eq!(found.id, token.id);
    assert!(found.last_used_at.is_none());

    tokens.touch(token.id, Utc::now()).await.unwrap();
    let touched = tokens.find_by_id(token.id).await.unwrap().expect("token");
    assert!(touched.last_used_at.is_some());

    assert_eq!(tokens.delete_for_user(user.id).await.unwrap(), 1);
    assert!(tokens.find_by_id(token.id).await.unwrap().is_none());
}
