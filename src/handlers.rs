use std::sync::Arc;

use lambda_http::{
    http::{header::COOKIE, Method},
    Body, Error as LambdaError, Request, RequestPayloadExt, Response,
};
use tracing::{info, warn};

use crate::{
    auth::{AuthDecision, Principal, TokenVerifier},
    context::AppContext,
    request, response,
    review::{NewReviewPayload, UpdateReviewPayload},
    store::ReviewStore,
};

/// Top-level request dispatcher used by the Lambda runtime.
pub async fn handle_request<S, V>(
    ctx: Arc<AppContext<S, V>>,
    event: Request,
) -> Result<Response<Body>, LambdaError>
where
    S: ReviewStore,
    V: TokenVerifier,
{
    let path = event.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let response = match (event.method().clone(), segments.as_slice()) {
        (Method::POST, ["movies", "reviews"]) => create_review(ctx.as_ref(), &event).await,
        (Method::GET, ["movies", "reviews", reviewer_name]) => {
            reviews_by_reviewer(ctx.as_ref(), reviewer_name).await
        }
        (Method::GET, ["movies", movie_id, "reviews"]) => {
            reviews_by_movie(ctx.as_ref(), movie_id).await
        }
        (Method::GET, ["movies", movie_id, "reviews", reviewer_name]) => {
            reviews_by_movie_and_reviewer(ctx.as_ref(), movie_id, reviewer_name).await
        }
        (Method::PUT, ["movies", movie_id, "reviews", reviewer_name]) => {
            update_review(ctx.as_ref(), movie_id, reviewer_name, &event).await
        }
        _ => response::unsupported_route(),
    };
    Ok(response)
}

async fn reviews_by_movie<S: ReviewStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    raw_movie_id: &str,
) -> Response<Body> {
    let request = match request::movie_reviews(Some(raw_movie_id)) {
        Ok(request) => request,
        Err(err) => return response::from_error(&err),
    };

    match ctx.store().reviews_by_movie(request.movie_id).await {
        Ok(reviews) if reviews.is_empty() => {
            response::no_reviews("No reviews found. Verify movie Id and try again.")
        }
        Ok(reviews) => response::data(reviews),
        Err(err) => response::from_error(&err),
    }
}

async fn reviews_by_movie_and_reviewer<S: ReviewStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    raw_movie_id: &str,
    raw_reviewer_name: &str,
) -> Response<Body> {
    let request =
        match request::movie_reviewer_reviews(Some(raw_movie_id), Some(raw_reviewer_name)) {
            Ok(request) => request,
            Err(err) => return response::from_error(&err),
        };

    match ctx
        .store()
        .reviews_by_movie_and_reviewer(request.movie_id, &request.reviewer_name)
        .await
    {
        Ok(reviews) if reviews.is_empty() => response::no_reviews(
            "No reviews found. Verify movie Id and reviewer name and try again.",
        ),
        Ok(reviews) => {
            if reviews.len() > 1 {
                // One review per (movie, reviewer) pair; more means the
                // uniqueness invariant was violated out-of-band.
                warn!(
                    movie_id = request.movie_id,
                    reviewer = %request.reviewer_name,
                    matches = reviews.len(),
                    "multiple reviews found for one composite key"
                );
            }
            response::data(reviews)
        }
        Err(err) => response::from_error(&err),
    }
}

async fn reviews_by_reviewer<S: ReviewStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    raw_reviewer_name: &str,
) -> Response<Body> {
    let request = match request::reviewer_reviews(Some(raw_reviewer_name)) {
        Ok(request) => request,
        Err(err) => return response::from_error(&err),
    };

    match ctx.store().reviews_by_reviewer(&request.reviewer_name).await {
        Ok(reviews) if reviews.is_empty() => {
            response::no_reviews("No reviews found. Verify reviewer name and try again.")
        }
        Ok(reviews) => response::data(reviews),
        Err(err) => response::from_error(&err),
    }
}

async fn create_review<S: ReviewStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    event: &Request,
) -> Response<Body> {
    let payload = event.payload::<NewReviewPayload>().unwrap_or_else(|e| {
        warn!("failed to parse review payload: {e:?}");
        None
    });
    let request = match request::create_review(payload) {
        Ok(request) => request,
        Err(err) => return response::from_error(&err),
    };

    let principal = match authorize(ctx, event) {
        Some(principal) => principal,
        None => return response::unauthorized(),
    };

    info!(
        principal = %principal.sub,
        movie_id = request.review.movie_id,
        reviewer = %request.review.reviewer_name,
        "writing review"
    );
    match ctx.store().put_review(request.review).await {
        Ok(review) => response::data(review),
        Err(err) => response::from_error(&err),
    }
}

async fn update_review<S: ReviewStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    raw_movie_id: &str,
    raw_reviewer_name: &str,
    event: &Request,
) -> Response<Body> {
    let payload = event.payload::<UpdateReviewPayload>().unwrap_or_else(|e| {
        warn!("failed to parse review update payload: {e:?}");
        None
    });
    let request = match request::update_review(
        Some(raw_movie_id),
        Some(raw_reviewer_name),
        payload,
    ) {
        Ok(request) => request,
        Err(err) => return response::from_error(&err),
    };

    let principal = match authorize(ctx, event) {
        Some(principal) => principal,
        None => return response::unauthorized(),
    };

    info!(
        principal = %principal.sub,
        movie_id = request.movie_id,
        reviewer = %request.reviewer_name,
        "updating review"
    );
    match ctx
        .store()
        .update_review(request.movie_id, &request.reviewer_name, request.patch)
        .await
    {
        Ok(review) => response::data(review),
        Err(err) => response::from_error(&err),
    }
}

/// Run the session authorizer against the request's `Cookie` header.
fn authorize<S: ReviewStore, V: TokenVerifier>(
    ctx: &AppContext<S, V>,
    event: &Request,
) -> Option<Principal> {
    let cookie_header = event
        .headers()
        .get(COOKIE)
        .and_then(|value| value.to_str().ok());
    match ctx.authorizer().authorize(cookie_header) {
        AuthDecision::Allow(principal) => Some(principal),
        AuthDecision::Deny => None,
    }
}
