use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Incoming payload for review creation requests. Every field is required;
/// a body missing any of them is rejected at the parsing boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReviewPayload {
    #[serde(rename = "MovieId")]
    pub movie_id: i64,
    #[serde(rename = "ReviewerName")]
    pub reviewer_name: String,
    #[serde(rename = "ReviewDate")]
    pub review_date: NaiveDate,
    #[serde(rename = "Rating")]
    pub rating: i32,
    #[serde(rename = "Content")]
    pub content: String,
}

/// Incoming payload for review update requests. Key fields are accepted but
/// must match the path; only `Rating` and `Content` can change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReviewPayload {
    #[serde(rename = "MovieId")]
    pub movie_id: Option<i64>,
    #[serde(rename = "ReviewerName")]
    pub reviewer_name: Option<String>,
    #[serde(rename = "Rating")]
    pub rating: Option<i32>,
    #[serde(rename = "Content")]
    pub content: Option<String>,
}

/// Patch applied to an existing review. At least one field is present once
/// validation has run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub rating: Option<i32>,
    pub content: Option<String>,
}

/// Representation of a review persisted in DynamoDB. Attribute and JSON
/// field names are PascalCase, matching the table's wire format.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReviewRecord {
    #[serde(rename = "MovieId")]
    pub movie_id: i64,
    #[serde(rename = "ReviewerName")]
    pub reviewer_name: String,
    #[serde(rename = "ReviewDate")]
    pub review_date: NaiveDate,
    #[serde(rename = "Rating")]
    pub rating: i32,
    #[serde(rename = "Content")]
    pub content: String,
}

impl ReviewRecord {
    /// Build a record from a validated creation payload.
    pub fn new(payload: NewReviewPayload) -> Self {
        Self {
            movie_id: payload.movie_id,
            reviewer_name: payload.reviewer_name,
            review_date: payload.review_date,
            rating: payload.rating,
            content: payload.content,
        }
    }

    /// Convert the record into a DynamoDB attribute map.
    pub fn into_item(self) -> HashMap<String, AttributeValue> {
        let mut map = HashMap::new();
        map.insert("MovieId".into(), AttributeValue::N(self.movie_id.to_string()));
        map.insert("ReviewerName".into(), AttributeValue::S(self.reviewer_name));
        map.insert(
            "ReviewDate".into(),
            AttributeValue::S(self.review_date.to_string()),
        );
        map.insert("Rating".into(), AttributeValue::N(self.rating.to_string()));
        map.insert("Content".into(), AttributeValue::S(self.content));
        map
    }

    /// Rehydrate a record from a DynamoDB attribute map.
    pub fn from_item(item: HashMap<String, AttributeValue>) -> Result<Self, AppError> {
        let get_str = |key: &str| -> Result<String, AppError> {
            item.get(key)
                .and_then(|v| v.as_s().ok())
                .map(|s| s.to_string())
                .ok_or_else(|| AppError::Store(format!("missing attribute `{key}`")))
        };
        let get_num = |key: &str| -> Result<String, AppError> {
            item.get(key)
                .and_then(|v| v.as_n().ok())
                .map(|n| n.to_string())
                .ok_or_else(|| AppError::Store(format!("missing attribute `{key}`")))
        };
        let movie_id = get_num("MovieId")?
            .parse::<i64>()
            .map_err(|_| AppError::Store("invalid MovieId attribute".into()))?;
        let rating = get_num("Rating")?
            .parse::<i32>()
            .map_err(|_| AppError::Store("invalid Rating attribute".into()))?;
        let review_date = get_str("ReviewDate")?
            .parse::<NaiveDate>()
            .map_err(|_| AppError::Store("invalid ReviewDate attribute".into()))?;
        Ok(Self {
            movie_id,
            reviewer_name: get_str("ReviewerName")?,
            review_date,
            rating,
            content: get_str("Content")?,
        })
    }

    /// Composite key identifying this review in the table.
    pub fn key(&self) -> HashMap<String, AttributeValue> {
        review_key(self.movie_id, &self.reviewer_name)
    }
}

/// Attribute map for the composite (MovieId, ReviewerName) primary key.
pub fn review_key(movie_id: i64, reviewer_name: &str) -> HashMap<String, AttributeValue> {
    let mut key = HashMap::new();
    key.insert("MovieId".into(), AttributeValue::N(movie_id.to_string()));
    key.insert(
        "ReviewerName".into(),
        AttributeValue::S(reviewer_name.to_string()),
    );
    key
}
