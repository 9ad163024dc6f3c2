//! Parsing boundary between loosely-typed request input and the handlers.
//!
//! Path parameters arrive as raw strings and bodies as JSON; nothing past
//! this module sees untyped input. Every function here is a pure function of
//! its arguments and fails with `AppError::Validation`.

use crate::{
    error::AppError,
    review::{NewReviewPayload, ReviewPatch, ReviewRecord, UpdateReviewPayload},
};

/// Typed request for the reviews-by-movie route.
#[derive(Debug, PartialEq)]
pub struct MovieReviewsRequest {
    pub movie_id: i64,
}

/// Typed request for the reviews-by-movie-and-reviewer route.
#[derive(Debug, PartialEq)]
pub struct MovieReviewerRequest {
    pub movie_id: i64,
    pub reviewer_name: String,
}

/// Typed request for the cross-movie reviews-by-reviewer route.
#[derive(Debug, PartialEq)]
pub struct ReviewerReviewsRequest {
    pub reviewer_name: String,
}

/// Typed request for review creation.
#[derive(Debug, PartialEq)]
pub struct CreateReviewRequest {
    pub review: ReviewRecord,
}

/// Typed request for review updates: the key from the path plus the patch.
#[derive(Debug, PartialEq)]
pub struct UpdateReviewRequest {
    pub movie_id: i64,
    pub reviewer_name: String,
    pub patch: ReviewPatch,
}

pub fn movie_reviews(raw_movie_id: Option<&str>) -> Result<MovieReviewsRequest, AppError> {
    let movie_id = parse_movie_id(raw_movie_id, "Missing movie Id")?;
    Ok(MovieReviewsRequest { movie_id })
}

pub fn movie_reviewer_reviews(
    raw_movie_id: Option<&str>,
    raw_reviewer_name: Option<&str>,
) -> Result<MovieReviewerRequest, AppError> {
    let movie_id = parse_movie_id(raw_movie_id, "Missing movie Id or reviewer name")?;
    let reviewer_name =
        parse_reviewer_name(raw_reviewer_name, "Missing movie Id or reviewer name")?;
    Ok(MovieReviewerRequest {
        movie_id,
        reviewer_name,
    })
}

pub fn reviewer_reviews(
    raw_reviewer_name: Option<&str>,
) -> Result<ReviewerReviewsRequest, AppError> {
    let reviewer_name = parse_reviewer_name(raw_reviewer_name, "Missing reviewer name")?;
    Ok(ReviewerReviewsRequest { reviewer_name })
}

pub fn create_review(payload: Option<NewReviewPayload>) -> Result<CreateReviewRequest, AppError> {
    let payload = payload.ok_or_else(|| {
        AppError::Validation("Invalid review payload. All review fields are required.".into())
    })?;
    if payload.reviewer_name.trim().is_empty() {
        return Err(AppError::Validation("Reviewer name must not be empty".into()));
    }
    Ok(CreateReviewRequest {
        review: ReviewRecord::new(payload),
    })
}

pub fn update_review(
    raw_movie_id: Option<&str>,
    raw_reviewer_name: Option<&str>,
    payload: Option<UpdateReviewPayload>,
) -> Result<UpdateReviewRequest, AppError> {
    let movie_id = parse_movie_id(raw_movie_id, "Missing movie Id or reviewer name")?;
    let reviewer_name =
        parse_reviewer_name(raw_reviewer_name, "Missing movie Id or reviewer name")?;
    let payload = payload
        .ok_or_else(|| AppError::Validation("Invalid review update payload".into()))?;

    // Key fields in the body are optional, but when present they must agree
    // with the path; the key of an existing review is immutable.
    if payload.movie_id.is_some_and(|id| id != movie_id) {
        return Err(AppError::Validation(
            "Movie Id in body does not match path".into(),
        ));
    }
    if payload
        .reviewer_name
        .as_deref()
        .is_some_and(|name| name != reviewer_name)
    {
        return Err(AppError::Validation(
            "Reviewer name in body does not match path".into(),
        ));
    }

    let patch = ReviewPatch {
        rating: payload.rating,
        content: payload.content,
    };
    if patch.rating.is_none() && patch.content.is_none() {
        return Err(AppError::Validation(
            "No updatable review fields provided".into(),
        ));
    }
    Ok(UpdateReviewRequest {
        movie_id,
        reviewer_name,
        patch,
    })
}

fn parse_movie_id(raw: Option<&str>, message: &str) -> Result<i64, AppError> {
    raw.and_then(|value| value.parse::<i64>().ok())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

fn parse_reviewer_name(raw: Option<&str>, message: &str) -> Result<String, AppError> {
    match raw {
        Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
        _ => Err(AppError::Validation(message.to_string())),
    }
}
