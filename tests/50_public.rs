mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

fn seeded_profile(first_name: &str, featured: bool, updated_at: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "user_id": Uuid::new_v4(),
        "first_name": first_name,
        "last_name": "",
        "bio": "",
        "avatar_url": null,
        "is_featured": featured,
        "updated_at": updated_at
    })
}

#[tokio::test]
async fn featured_is_capped_at_the_five_most_recent() {
    let app = common::test_app();

    let mut rows = Vec::new();
    for day in 1..=6 {
        rows.push(seeded_profile(
            &format!("featured-{}", day),
            true,
            &format!("2025-01-0{}T00:00:00Z", day),
        ));
    }
    rows.push(seeded_profile("plain", false, "2025-01-09T00:00:00Z"));
    app.store.insert_raw("profiles", rows).await;

    let (status, body) =
        common::request(&app.router, "GET", "/public/portfolios", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let featured = body["data"]["featured"].as_array().unwrap();
    assert_eq!(featured.len(), 5);
    // Most recent first; the oldest featured profile fell off.
    assert_eq!(featured[0]["first_name"], json!("featured-6"));
    assert!(featured.iter().all(|p| p["first_name"] != json!("featured-1")));

    // The roster includes everyone, featured or not.
    assert_eq!(body["data"]["list"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn unknown_portfolio_id_is_a_clean_404() {
    let app = common::test_app();

    let (status, body) = common::request(
        &app.router,
        "GET",
        &format!("/public/portfolios/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!(true));
    // No partial aggregate leaks alongside the error.
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn public_portfolio_aggregates_with_non_decreasing_order() {
    let app = common::test_app();
    let (token, _) = common::register(&app.router, "ada@example.test").await;

    for (company, order) in [("B", 7), ("A", 2)] {
        common::request(
            &app.router,
            "POST",
            "/me/experiences",
            Some(&token),
            Some(json!({ "company": company, "title": "Engineer", "order_index": order })),
        )
        .await;
    }
    for (title, order) in [("Zenith", 5), ("Atlas", 1)] {
        common::request(
            &app.router,
            "POST",
            "/me/projects",
            Some(&token),
            Some(json!({
                "title": title,
                "order_index": order,
                "parts": [{ "title": "intro" }]
            })),
        )
        .await;
    }

    let (_, me) = common::request(&app.router, "GET", "/me/portfolio", Some(&token), None).await;
    let profile_id = me["data"]["profile"]["id"].as_str().unwrap().to_string();

    let (status, body) = common::request(
        &app.router,
        "GET",
        &format!("/public/portfolios/{}", profile_id),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let experience_orders: Vec<i64> = body["data"]["experiences"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["order_index"].as_i64().unwrap())
        .collect();
    assert!(experience_orders.windows(2).all(|w| w[0] <= w[1]));

    let project_orders: Vec<i64> = body["data"]["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["order_index"].as_i64().unwrap())
        .collect();
    assert!(project_orders.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(body["data"]["projects"][0]["title"], json!("Atlas"));
    assert_eq!(body["data"]["projects"][0]["parts"].as_array().unwrap().len(), 1);
}
