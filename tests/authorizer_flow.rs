mod common;

use anyhow::Result;
use lambda_http::{self, Body};
use movie_reviews_api::auth::issue_session_token;
use serde_json::json;

use common::{body_as_string, session_cookie, setup_environment, SESSION_SECRET};

fn post_review(cookie: Option<&str>) -> lambda_http::Request {
    let payload = json!({
        "MovieId": 572900,
        "ReviewerName": "bob",
        "ReviewDate": "2024-04-01",
        "Rating": 6,
        "Content": "Fine."
    });
    let mut builder = lambda_http::http::Request::builder()
        .method("POST")
        .uri("/movies/reviews")
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder
        .body(Body::Text(payload.to_string()))
        .expect("post request")
}

#[tokio::test]
async fn mutating_requests_require_a_valid_session_cookie() -> Result<()> {
    let Some(setup) = setup_environment().await else {
        return Ok(());
    };
    let ctx = setup.ctx.clone();

    let no_cookie = movie_reviews_api::handle_request(ctx.clone(), post_review(None))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(no_cookie.status(), 401);
    let body: serde_json::Value = serde_json::from_str(&body_as_string(no_cookie.body()))?;
    assert_eq!(body["Message"], "Unauthorized");

    let garbage =
        movie_reviews_api::handle_request(ctx.clone(), post_review(Some("token=not-a-jwt")))
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(garbage.status(), 401);

    // 120s in the past clears the verifier's default expiry leeway.
    let expired_token = issue_session_token(SESSION_SECRET, "bob", None, -120)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let expired_cookie = format!("token={expired_token}");
    let expired =
        movie_reviews_api::handle_request(ctx.clone(), post_review(Some(&expired_cookie)))
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(expired.status(), 401);

    // None of the denied requests may have reached the table.
    let scan = setup.client.scan().table_name(&setup.table).send().await?;
    assert_eq!(scan.count(), 0);

    let allowed = movie_reviews_api::handle_request(ctx, post_review(Some(&session_cookie())))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(allowed.status(), 200);

    let scan = setup.client.scan().table_name(&setup.table).send().await?;
    assert_eq!(scan.count(), 1);

    Ok(())
}
