mod common;

use anyhow::Result;
use aws_sdk_dynamodb::types::AttributeValue;
use lambda_http::{self, Body};
use serde_json::json;

use common::{body_as_string, session_cookie, setup_environment};

fn get_request(path: &str) -> lambda_http::Request {
    lambda_http::http::Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::Empty)
        .expect("get request")
}

fn json_request(
    method: &str,
    path: &str,
    payload: &serde_json::Value,
    cookie: Option<&str>,
) -> lambda_http::Request {
    let mut builder = lambda_http::http::Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder
        .body(Body::Text(payload.to_string()))
        .expect("json request")
}

async fn response_json(
    ctx: std::sync::Arc<
        movie_reviews_api::AppContext<
            movie_reviews_api::store::DynamoReviewStore,
            movie_reviews_api::auth::JwtVerifier,
        >,
    >,
    request: lambda_http::Request,
) -> Result<(u16, serde_json::Value)> {
    let response = movie_reviews_api::handle_request(ctx, request)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let status = response.status().as_u16();
    let body = body_as_string(response.body());
    let value = if body.is_empty() {
        json!({})
    } else {
        serde_json::from_str(&body)?
    };
    Ok((status, value))
}

#[tokio::test]
async fn review_crud_and_query_flow() -> Result<()> {
    let Some(setup) = setup_environment().await else {
        return Ok(());
    };
    let ctx = setup.ctx.clone();
    let cookie = session_cookie();

    let review = json!({
        "MovieId": 848400,
        "ReviewerName": "alice",
        "ReviewDate": "2024-03-01",
        "Rating": 5,
        "Content": "A solid first watch."
    });
    let (status, body) = response_json(
        ctx.clone(),
        json_request("POST", "/movies/reviews", &review, Some(&cookie)),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["MovieId"], 848400);

    let (status, body) =
        response_json(ctx.clone(), get_request("/movies/848400/reviews")).await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["ReviewerName"], "alice");

    let (status, body) =
        response_json(ctx.clone(), get_request("/movies/848400/reviews/alice")).await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["Rating"], 5);

    // Cross-movie lookup goes through the reviewer index.
    let (status, body) =
        response_json(ctx.clone(), get_request("/movies/reviews/alice")).await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let patch = json!({ "Rating": 9 });
    let (status, body) = response_json(
        ctx.clone(),
        json_request("PUT", "/movies/848400/reviews/alice", &patch, Some(&cookie)),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["Rating"], 9);
    assert_eq!(body["data"]["Content"], "A solid first watch.");

    let (status, _) = response_json(
        ctx.clone(),
        json_request(
            "PUT",
            "/movies/848400/reviews/nobody",
            &patch,
            Some(&cookie),
        ),
    )
    .await?;
    assert_eq!(status, 404);

    let (status, body) =
        response_json(ctx.clone(), get_request("/movies/848400/reviews/nobody")).await?;
    assert_eq!(status, 404);
    assert_eq!(
        body["Message"],
        "No reviews found. Verify movie Id and reviewer name and try again."
    );

    // Re-creating the same (movie, reviewer) pair overwrites rather than
    // appending; exactly one record must remain.
    let replacement = json!({
        "MovieId": 848400,
        "ReviewerName": "alice",
        "ReviewDate": "2024-03-02",
        "Rating": 3,
        "Content": "Weaker on rewatch."
    });
    let (status, _) = response_json(
        ctx.clone(),
        json_request("POST", "/movies/reviews", &replacement, Some(&cookie)),
    )
    .await?;
    assert_eq!(status, 200);

    let query_resp = setup
        .client
        .query()
        .table_name(&setup.table)
        .key_condition_expression("MovieId = :m AND ReviewerName = :r")
        .expression_attribute_values(":m", AttributeValue::N("848400".into()))
        .expression_attribute_values(":r", AttributeValue::S("alice".into()))
        .send()
        .await?;
    assert_eq!(query_resp.count(), 1);
    let content = query_resp.items()[0]
        .get("Content")
        .and_then(|attr| attr.as_s().ok())
        .expect("content attribute");
    assert_eq!(content, "Weaker on rewatch.");

    Ok(())
}

#[tokio::test]
async fn validation_failures_use_the_observed_contract() -> Result<()> {
    let Some(setup) = setup_environment().await else {
        return Ok(());
    };
    let ctx = setup.ctx.clone();

    let (status, body) =
        response_json(ctx.clone(), get_request("/movies/not-a-number/reviews")).await?;
    assert_eq!(status, 404);
    assert_eq!(body["Message"], "Missing movie Id");

    let cookie = session_cookie();
    let mismatched = json!({ "MovieId": 999, "Rating": 2 });
    let (status, _) = response_json(
        ctx,
        json_request(
            "PUT",
            "/movies/848400/reviews/alice",
            &mismatched,
            Some(&cookie),
        ),
    )
    .await?;
    assert_eq!(status, 404);

    Ok(())
}
