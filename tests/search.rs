mod common;

use common::*;
use evotrack::error::AppError;
use evotrack::search::{search_org_users, SearchFilterSpec, UserSearchRequest};

fn spec_from(body: serde_json::Value) -> SearchFilterSpec {
    serde_json::from_value::<UserSearchRequest>(body)
        .expect("request body should deserialize")
        .compose()
        .expect("filters should compose")
}

/// Org with 5 members: owner/active, admin/active, 2x employee/active,
/// 1x employee/pending_activation. Users are backdated so the listing
/// order is deterministic (owner newest, pending employee oldest).
fn seed_scenario_org(conn: &rusqlite::Connection) -> (Organization, Vec<User>) {
    let org = create_test_org(conn, "Scenario Org");
    let mut users = Vec::new();

    let members = [
        ("owner@test.com", Role::Owner, UserStatus::Active),
        ("admin@test.com", Role::Admin, UserStatus::Active),
        ("emp1@test.com", Role::Employee, UserStatus::Active),
        ("emp2@test.com", Role::Employee, UserStatus::Active),
        ("emp3@test.com", Role::Employee, UserStatus::PendingActivation),
    ];

    for (i, (email, role, status)) in members.iter().enumerate() {
        let (user, _, _) = create_test_member(conn, &org.id, email, *role);
        queries::set_user_status(conn, &user.id, *status).unwrap();
        backdate_user(conn, &user.id, past_timestamp((i + 1) as i64));
        users.push(queries::get_user_by_id(conn, &user.id).unwrap().unwrap());
    }

    (org, users)
}

// ------------------------------------------------------------------------
// Statistics
// ------------------------------------------------------------------------

#[test]
fn stats_are_computed_over_the_filtered_set() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);

    let spec = spec_from(serde_json::json!({ "status": ["active"] }));
    let result = search_org_users(&conn, &org.id, &users[0].id, &spec).unwrap();

    assert_eq!(result.stats.total_users, 4);
    assert_eq!(result.stats.by_status.active, 4);
    assert_eq!(result.stats.by_status.pending_activation, 0);
    assert_eq!(result.stats.by_role.owner, 1);
    assert_eq!(result.stats.by_role.admin, 1);
    assert_eq!(result.stats.by_role.manager, 0);
    assert_eq!(result.stats.by_role.employee, 2);
    assert_eq!(result.data.len(), 4);
}

#[test]
fn stats_totals_match_both_groupings() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);

    for body in [
        serde_json::json!({}),
        serde_json::json!({ "status": ["active", "pending_activation"] }),
        serde_json::json!({ "role": ["employee"] }),
        serde_json::json!({ "role": ["owner", "admin"], "status": ["active"] }),
    ] {
        let spec = spec_from(body);
        let result = search_org_users(&conn, &org.id, &users[0].id, &spec).unwrap();
        let stats = &result.stats;
        let by_status_sum =
            stats.by_status.active + stats.by_status.pending_activation + stats.by_status.inactive;
        let by_role_sum = stats.by_role.owner
            + stats.by_role.admin
            + stats.by_role.manager
            + stats.by_role.employee;
        assert_eq!(stats.total_users, by_status_sum);
        assert_eq!(stats.total_users, by_role_sum);
        assert_eq!(stats.active_users, stats.by_status.active);
        assert_eq!(stats.inactive_users, stats.by_status.inactive);
    }
}

#[test]
fn legacy_member_rows_fold_into_employee_bucket() {
    let conn = setup_test_db();
    let org = create_test_org(&conn, "Org");
    let (owner, _, _) = create_test_member(&conn, &org.id, "owner@test.com", Role::Owner);

    let (legacy_user, _) = create_test_user(&conn, "legacy@test.com", "Legacy User");
    queries::set_user_status(&conn, &legacy_user.id, UserStatus::Active).unwrap();
    insert_legacy_member_row(&conn, &org.id, &legacy_user.id);

    // Role filter on the canonical name matches the aliased row
    let spec = spec_from(serde_json::json!({ "role": ["employee"] }));
    let result = search_org_users(&conn, &org.id, &owner.id, &spec).unwrap();
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].id, legacy_user.id);
    assert_eq!(result.data[0].role, Role::Employee);

    // The alias never becomes an aggregation key
    assert_eq!(result.stats.by_role.employee, 1);
    assert_eq!(result.stats.total_users, 1);
}

// ------------------------------------------------------------------------
// Pagination
// ------------------------------------------------------------------------

#[test]
fn pages_chain_through_next_cursor() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);
    let requester = &users[0].id;

    // Page 1
    let spec = spec_from(serde_json::json!({ "limit": 2 }));
    let page1 = search_org_users(&conn, &org.id, requester, &spec).unwrap();
    assert_eq!(page1.data.len(), 2);
    assert!(page1.pagination.has_more);
    let cursor1 = page1.pagination.next_cursor.clone().expect("cursor after page 1");

    // Page 2
    let spec = spec_from(serde_json::json!({
        "limit": 2,
        "nextCursor": serde_json::to_value(&cursor1).unwrap()
    }));
    let page2 = search_org_users(&conn, &org.id, requester, &spec).unwrap();
    assert_eq!(page2.data.len(), 2);
    assert!(page2.pagination.has_more);
    let cursor2 = page2.pagination.next_cursor.clone().expect("cursor after page 2");

    // Page 3 - the last row
    let spec = spec_from(serde_json::json!({
        "limit": 2,
        "nextCursor": serde_json::to_value(&cursor2).unwrap()
    }));
    let page3 = search_org_users(&conn, &org.id, requester, &spec).unwrap();
    assert_eq!(page3.data.len(), 1);
    assert!(!page3.pagination.has_more);
    assert!(page3.pagination.next_cursor.is_none());

    // Concatenated pages cover every row exactly once
    let mut seen: Vec<String> = page1
        .data
        .iter()
        .chain(page2.data.iter())
        .chain(page3.data.iter())
        .map(|u| u.id.clone())
        .collect();
    assert_eq!(seen.len(), 5);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 5, "no row may appear on two pages");
}

#[test]
fn identical_timestamps_paginate_without_duplicates() {
    let conn = setup_test_db();
    let org = create_test_org(&conn, "Tie Org");
    let ts = past_timestamp(10);

    let mut all_ids = Vec::new();
    for i in 0..5 {
        let (user, _, _) =
            create_test_member(&conn, &org.id, &format!("tie{}@test.com", i), Role::Employee);
        backdate_user(&conn, &user.id, ts);
        all_ids.push(user.id);
    }
    let requester = all_ids[0].clone();

    let mut seen = Vec::new();
    let mut cursor: Option<serde_json::Value> = None;
    loop {
        let mut body = serde_json::json!({ "limit": 2 });
        if let Some(c) = &cursor {
            body["nextCursor"] = c.clone();
        }
        let page = search_org_users(&conn, &org.id, &requester, &spec_from(body)).unwrap();
        seen.extend(page.data.iter().map(|u| u.id.clone()));
        match page.pagination.next_cursor {
            Some(c) => cursor = Some(serde_json::to_value(&c).unwrap()),
            None => break,
        }
    }

    assert_eq!(seen.len(), 5);
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5, "tie-broken ordering must be a total order");
}

#[test]
fn items_and_stats_come_from_the_same_snapshot() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);

    // Unpaged search: the listing and the grouped counts are produced by
    // two queries inside one read transaction, so they must describe the
    // exact same set of rows.
    let spec = spec_from(serde_json::json!({ "limit": 100 }));
    let result = search_org_users(&conn, &org.id, &users[0].id, &spec).unwrap();

    assert_eq!(result.data.len() as i64, result.stats.total_users);
    let active_rows = result
        .data
        .iter()
        .filter(|u| u.status == UserStatus::Active)
        .count() as i64;
    assert_eq!(active_rows, result.stats.by_status.active);
    let employee_rows = result
        .data
        .iter()
        .filter(|u| u.role == Role::Employee)
        .count() as i64;
    assert_eq!(employee_rows, result.stats.by_role.employee);
}

#[test]
fn first_page_is_stable_across_repeated_calls() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);

    let first = search_org_users(&conn, &org.id, &users[0].id, &spec_from(serde_json::json!({})))
        .unwrap();
    let second = search_org_users(&conn, &org.id, &users[0].id, &spec_from(serde_json::json!({})))
        .unwrap();

    let ids = |r: &evotrack::search::UserSearchResponse| {
        r.data.iter().map(|u| u.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

// ------------------------------------------------------------------------
// Filter semantics
// ------------------------------------------------------------------------

#[test]
fn values_within_a_dimension_or_combine() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);

    let spec = spec_from(serde_json::json!({ "role": ["owner", "admin"] }));
    let result = search_org_users(&conn, &org.id, &users[0].id, &spec).unwrap();

    assert_eq!(result.data.len(), 2);
    for row in &result.data {
        assert!(matches!(row.role, Role::Owner | Role::Admin));
    }
}

#[test]
fn dimensions_and_combine() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);

    let spec = spec_from(serde_json::json!({
        "role": ["employee"],
        "status": ["active"]
    }));
    let result = search_org_users(&conn, &org.id, &users[0].id, &spec).unwrap();

    assert_eq!(result.data.len(), 2);
    for row in &result.data {
        assert_eq!(row.role, Role::Employee);
        assert_eq!(row.status, UserStatus::Active);
    }
}

#[test]
fn free_text_matches_name_or_email() {
    let conn = setup_test_db();
    let org = create_test_org(&conn, "Org");
    let (owner, _, _) = create_test_member(&conn, &org.id, "owner@test.com", Role::Owner);
    create_test_member(&conn, &org.id, "jane.doe@corp.com", Role::Employee);

    let spec = spec_from(serde_json::json!({ "search": "jane" }));
    let result = search_org_users(&conn, &org.id, &owner.id, &spec).unwrap();
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].email, "jane.doe@corp.com");

    // Name match via the generated "Test <email>" fixture name
    let spec = spec_from(serde_json::json!({ "search": "Test owner" }));
    let result = search_org_users(&conn, &org.id, &owner.id, &spec).unwrap();
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].id, owner.id);
}

#[test]
fn date_range_bounds_the_listing() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);

    // Users are backdated 1..=5 days ago; keep those from the last 3 days.
    let from = evotrack::util::to_rfc3339(past_timestamp(3) - 10);
    let spec = spec_from(serde_json::json!({ "createdFrom": from }));
    let result = search_org_users(&conn, &org.id, &users[0].id, &spec).unwrap();
    assert_eq!(result.data.len(), 3);
    assert_eq!(result.stats.total_users, 3);
}

#[test]
fn is_active_filters_membership_liveness_independently_of_status() {
    let conn = setup_test_db();
    let org = create_test_org(&conn, "Org");
    let (owner, _, _) = create_test_member(&conn, &org.id, "owner@test.com", Role::Owner);
    let (_, membership, _) = create_test_member(&conn, &org.id, "gone@test.com", Role::Employee);
    queries::deactivate_membership(&conn, &membership.id).unwrap();

    let spec = spec_from(serde_json::json!({ "isActive": true }));
    let result = search_org_users(&conn, &org.id, &owner.id, &spec).unwrap();
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].id, owner.id);

    let spec = spec_from(serde_json::json!({ "isActive": false }));
    let result = search_org_users(&conn, &org.id, &owner.id, &spec).unwrap();
    assert_eq!(result.data.len(), 1);
    assert!(!result.data[0].is_active);
    // Deactivating the membership did not change the user's status
    assert_eq!(result.data[0].status, UserStatus::Active);
}

// ------------------------------------------------------------------------
// Redaction
// ------------------------------------------------------------------------

#[test]
fn employee_sees_only_their_own_email_in_full() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);
    let employee = &users[2];

    let result =
        search_org_users(&conn, &org.id, &employee.id, &spec_from(serde_json::json!({}))).unwrap();

    assert!(!result.meta.can_see_emails);
    assert_eq!(result.meta.user_role, Role::Employee);
    for row in &result.data {
        if row.id == employee.id {
            assert_eq!(row.email, employee.email);
        } else {
            assert!(row.email.contains("***"), "expected redaction: {}", row.email);
        }
    }
}

#[test]
fn admin_and_owner_see_all_emails() {
    let conn = setup_test_db();
    let (org, users) = seed_scenario_org(&conn);

    for requester in [&users[0], &users[1]] {
        let result =
            search_org_users(&conn, &org.id, &requester.id, &spec_from(serde_json::json!({})))
                .unwrap();
        assert!(result.meta.can_see_emails);
        for row in &result.data {
            assert!(!row.email.contains("***"));
        }
    }
}

// ------------------------------------------------------------------------
// Failure modes
// ------------------------------------------------------------------------

#[test]
fn non_member_requester_is_forbidden_with_no_partial_results() {
    let conn = setup_test_db();
    let (org, _) = seed_scenario_org(&conn);
    let (outsider, _) = create_test_user(&conn, "outsider@test.com", "Outsider");

    let result = search_org_users(&conn, &org.id, &outsider.id, &spec_from(serde_json::json!({})));
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[test]
fn tampered_cursor_never_falls_back_to_page_one() {
    let conn = setup_test_db();
    let (_, _) = seed_scenario_org(&conn);

    let composed = serde_json::from_value::<UserSearchRequest>(serde_json::json!({
        "nextCursor": {"id": "u1", "ts": "tampered"}
    }))
    .unwrap()
    .compose();

    // Composition fails outright, so no query ever runs
    assert!(matches!(composed, Err(AppError::InvalidCursor(_))));
}
