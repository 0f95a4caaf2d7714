//! API integration tests for the hub server
//!
//! These drive the assembled router end to end:
//! - Authentication and the response envelope
//! - The propose / accept / reject workflow over HTTP
//! - Explore, trending and related listings

use axum::http::{header, StatusCode};
use serde_json::json;
use sqlx::PgPool;

mod helpers;

use helpers::{data_id, TestApp};

fn dataset_body(title: &str, tags: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": format!("{} description", title),
        "tags": tags,
        "data_category": "sales",
        "dataset_doi": format!("10.1234/hub.{}", title.to_lowercase().replace(' ', "-")),
        "files": [{ "filename": "games.csv" }],
    })
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_health_and_stats(pool: PgPool) {
    let app = TestApp::new(pool).await;

    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    let stats = app.get("/stats", None).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["success"], true);
    assert_eq!(stats.body["data"]["communities"], 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_authenticated_routes_require_principal(pool: PgPool) {
    let app = TestApp::new(pool).await;

    let response = app
        .post("/api/v1/communities", None, json!({ "name": "Indie", "description": "d" }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"]["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_proposal_workflow_over_http(pool: PgPool) {
    let app = TestApp::new(pool).await;
    let owner = app.insert_user("owner@example.com").await;
    let curator = app.insert_user("curator@example.com").await;

    let dataset = app
        .post("/api/v1/datasets", Some(owner), dataset_body("Steam sales", "indie"))
        .await;
    assert_eq!(dataset.status, StatusCode::CREATED);
    let dataset_id = data_id(&dataset);

    let community = app
        .post(
            "/api/v1/communities",
            Some(curator),
            json!({ "name": "Indie", "description": "Small studios" }),
        )
        .await;
    assert_eq!(community.status, StatusCode::CREATED);
    let community_id = data_id(&community);

    let propose = json!({ "dataset_id": dataset_id, "community_id": community_id });

    // Only the owner may propose.
    let forbidden = app.post("/api/v1/communities/propose", Some(curator), propose.clone()).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let submitted = app.post("/api/v1/communities/propose", Some(owner), propose.clone()).await;
    assert_eq!(submitted.status, StatusCode::CREATED);
    assert_eq!(submitted.body["data"]["kind"], "submitted");
    let proposal_id = submitted.body["data"]["proposal"]["id"].as_str().unwrap().to_string();

    let duplicate = app.post("/api/v1/communities/propose", Some(owner), propose.clone()).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["error"]["details"]["kind"], "duplicate_pending");

    let listed = app
        .get(
            &format!("/api/v1/communities/{}/proposals?status=pending", community_id),
            Some(curator),
        )
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(listed.body["data"][0]["proposer_email"], "owner@example.com");

    let accept_uri = format!(
        "/api/v1/communities/{}/proposals/{}/accept",
        community_id, proposal_id
    );
    let not_responsible = app.post(&accept_uri, Some(owner), json!({})).await;
    assert_eq!(not_responsible.status, StatusCode::FORBIDDEN);

    let accepted = app.post(&accept_uri, Some(curator), json!({})).await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["data"]["message"], "Proposal accepted.");

    let again = app.post("/api/v1/communities/propose", Some(owner), propose).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"]["details"]["kind"], "already_in_community");

    let detail = app.get(&format!("/api/v1/datasets/{}", dataset_id), None).await;
    assert_eq!(detail.body["data"]["community"]["name"], "Indie");

    let view = app
        .get(&format!("/api/v1/communities/{}", community_id), Some(curator))
        .await;
    assert_eq!(view.body["data"]["accepted_proposals"].as_array().map(Vec::len), Some(1));
    let anonymous = app.get(&format!("/api/v1/communities/{}", community_id), None).await;
    assert!(anonymous.body["data"].get("accepted_proposals").is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_proposal_under_other_community_is_not_found(pool: PgPool) {
    let app = TestApp::new(pool).await;
    let owner = app.insert_user("owner@example.com").await;
    let curator = app.insert_user("curator@example.com").await;

    let dataset_id = data_id(
        &app.post("/api/v1/datasets", Some(owner), dataset_body("Reviews", "rpg"))
            .await,
    );
    let first = data_id(
        &app.post(
            "/api/v1/communities",
            Some(curator),
            json!({ "name": "First", "description": "d" }),
        )
        .await,
    );
    let second = data_id(
        &app.post(
            "/api/v1/communities",
            Some(curator),
            json!({ "name": "Second", "description": "d" }),
        )
        .await,
    );

    let submitted = app
        .post(
            "/api/v1/communities/propose",
            Some(owner),
            json!({ "dataset_id": dataset_id, "community_id": first }),
        )
        .await;
    let proposal_id = submitted.body["data"]["proposal"]["id"].as_str().unwrap().to_string();

    let response = app
        .post(
            &format!("/api/v1/communities/{}/proposals/{}/reject", second, proposal_id),
            Some(curator),
            json!({}),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_discovery_endpoints(pool: PgPool) {
    let app = TestApp::new(pool).await;
    let owner = app.insert_user("owner@example.com").await;

    let viewed = data_id(
        &app.post("/api/v1/datasets", Some(owner), dataset_body("Steam sales", "indie, rpg"))
            .await,
    );
    let other = data_id(
        &app.post("/api/v1/datasets", Some(owner), dataset_body("Console sales", "rpg"))
            .await,
    );

    let detail = app.get(&format!("/api/v1/datasets/{}", viewed), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    let cookie = detail
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("view_cookie="));

    let explore = app.get("/api/v1/explore?tags=indie&sorting=oldest", None).await;
    assert_eq!(explore.status, StatusCode::OK);
    let titles: Vec<&str> = explore.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Steam sales"]);
    assert_eq!(explore.body["meta"]["limit"], 50);

    let posted = app
        .post("/api/v1/explore", None, json!({ "tags": ["indie", "rpg"] }))
        .await;
    assert_eq!(posted.body["data"].as_array().map(Vec::len), Some(2));

    let trending = app.get("/api/v1/trending?by=views&period=week", None).await;
    assert_eq!(trending.status, StatusCode::OK);
    assert_eq!(trending.body["data"]["items"][0]["title"], "Steam sales");
    assert_eq!(trending.body["data"]["items"][0]["metric"], 1);

    let unknown = app.get("/api/v1/trending?by=stars", None).await;
    assert_eq!(unknown.body["data"]["items"], json!([]));

    let related = app.get(&format!("/api/v1/datasets/{}/related", viewed), None).await;
    assert_eq!(related.status, StatusCode::OK);
    assert_eq!(related.body["data"][0]["id"], other.to_string());
}
