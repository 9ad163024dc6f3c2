//! Review store access layer.
//!
//! Handlers talk to a [`ReviewStore`] rather than the SDK client so the
//! request pipeline can be exercised against a test double. The production
//! implementation is [`DynamoReviewStore`], one instance per process.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    types::{AttributeValue, ReturnValue},
    Client,
};
use tracing::debug;

use crate::{
    error::AppError,
    review::{review_key, ReviewPatch, ReviewRecord},
};

/// Global secondary index serving the cross-movie by-reviewer access path.
pub const REVIEWER_NAME_INDEX: &str = "ReviewerNameIndex";

/// Storage operations behind the review endpoints.
///
/// Implementations must be thread-safe; one instance is shared across
/// concurrent invocations.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// All reviews sharing the movie partition key.
    async fn reviews_by_movie(&self, movie_id: i64) -> Result<Vec<ReviewRecord>, AppError>;

    /// Reviews for one movie narrowed to one reviewer. The uniqueness
    /// invariant implies at most one entry, but the access pattern is a
    /// partition query plus an equality filter, so a list comes back.
    async fn reviews_by_movie_and_reviewer(
        &self,
        movie_id: i64,
        reviewer_name: &str,
    ) -> Result<Vec<ReviewRecord>, AppError>;

    /// All reviews by one reviewer regardless of movie.
    async fn reviews_by_reviewer(
        &self,
        reviewer_name: &str,
    ) -> Result<Vec<ReviewRecord>, AppError>;

    /// Unconditional upsert; a later write for the same key overwrites.
    async fn put_review(&self, review: ReviewRecord) -> Result<ReviewRecord, AppError>;

    /// Patch an existing review, leaving absent fields untouched. Fails with
    /// `NotFound` when no record exists at the key.
    async fn update_review(
        &self,
        movie_id: i64,
        reviewer_name: &str,
        patch: ReviewPatch,
    ) -> Result<ReviewRecord, AppError>;
}

/// DynamoDB-backed review store.
pub struct DynamoReviewStore {
    client: Client,
    table_name: String,
}

impl DynamoReviewStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Name of the reviews table this store operates on.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn query_pages(
        &self,
        index_name: Option<&str>,
        key_condition: &str,
        filter_expression: Option<&str>,
        values: HashMap<String, AttributeValue>,
    ) -> Result<Vec<ReviewRecord>, AppError> {
        let mut records = Vec::new();
        let mut last_evaluated_key = None;
        loop {
            let mut query = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression(key_condition)
                .set_expression_attribute_values(Some(values.clone()));
            if let Some(index) = index_name {
                query = query.index_name(index);
            }
            if let Some(filter) = filter_expression {
                query = query.filter_expression(filter);
            }
            if let Some(key) = last_evaluated_key {
                query = query.set_exclusive_start_key(Some(key));
            }

            let response = query
                .send()
                .await
                .map_err(|e| AppError::Store(e.to_string()))?;
            for item in response.items.unwrap_or_default() {
                records.push(ReviewRecord::from_item(item)?);
            }

            last_evaluated_key = response.last_evaluated_key;
            if last_evaluated_key.is_none() {
                break;
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl ReviewStore for DynamoReviewStore {
    async fn reviews_by_movie(&self, movie_id: i64) -> Result<Vec<ReviewRecord>, AppError> {
        let values = HashMap::from([(
            ":m".to_string(),
            AttributeValue::N(movie_id.to_string()),
        )]);
        self.query_pages(None, "MovieId = :m", None, values).await
    }

    async fn reviews_by_movie_and_reviewer(
        &self,
        movie_id: i64,
        reviewer_name: &str,
    ) -> Result<Vec<ReviewRecord>, AppError> {
        let values = HashMap::from([
            (":m".to_string(), AttributeValue::N(movie_id.to_string())),
            (
                ":rN".to_string(),
                AttributeValue::S(reviewer_name.to_string()),
            ),
        ]);
        self.query_pages(None, "MovieId = :m", Some("ReviewerName = :rN"), values)
            .await
    }

    async fn reviews_by_reviewer(
        &self,
        reviewer_name: &str,
    ) -> Result<Vec<ReviewRecord>, AppError> {
        let values = HashMap::from([(
            ":rN".to_string(),
            AttributeValue::S(reviewer_name.to_string()),
        )]);
        self.query_pages(
            Some(REVIEWER_NAME_INDEX),
            "ReviewerName = :rN",
            None,
            values,
        )
        .await
    }

    async fn put_review(&self, review: ReviewRecord) -> Result<ReviewRecord, AppError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(review.clone().into_item()))
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;
        debug!(
            movie_id = review.movie_id,
            reviewer = %review.reviewer_name,
            "review written to '{}'",
            self.table_name
        );
        Ok(review)
    }

    async fn update_review(
        &self,
        movie_id: i64,
        reviewer_name: &str,
        patch: ReviewPatch,
    ) -> Result<ReviewRecord, AppError> {
        let (update_expression, names, values) = patch_update_expression(&patch);

        let response = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(review_key(movie_id, reviewer_name)))
            .update_expression(update_expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .condition_expression("attribute_exists(MovieId)")
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    AppError::NotFound(format!(
                        "no review for movie {movie_id} by `{reviewer_name}`"
                    ))
                } else {
                    AppError::Store(service_error.to_string())
                }
            })?;

        let attributes = response
            .attributes
            .ok_or_else(|| AppError::Store("update returned no attributes".into()))?;
        ReviewRecord::from_item(attributes)
    }
}

/// Build the SET expression for the patch fields present. Attribute-name
/// placeholders keep the expression clear of DynamoDB's reserved words.
fn patch_update_expression(
    patch: &ReviewPatch,
) -> (
    String,
    HashMap<String, String>,
    HashMap<String, AttributeValue>,
) {
    let mut assignments = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    if let Some(rating) = patch.rating {
        assignments.push("#rating = :rating");
        names.insert("#rating".to_string(), "Rating".to_string());
        values.insert(":rating".to_string(), AttributeValue::N(rating.to_string()));
    }
    if let Some(content) = &patch.content {
        assignments.push("#content = :content");
        names.insert("#content".to_string(), "Content".to_string());
        values.insert(":content".to_string(), AttributeValue::S(content.clone()));
    }

    (format!("SET {}", assignments.join(", ")), names, values)
}
