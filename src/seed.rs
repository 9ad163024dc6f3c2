//! Starter reviews written into a freshly bootstrapped local table, mirroring
//! the seed data the deployed stack loads at creation time.

use aws_sdk_dynamodb::Client;
use chrono::NaiveDate;
use tracing::info;

use crate::review::ReviewRecord;

/// The reviews a fresh table starts with.
pub fn starter_reviews() -> Vec<ReviewRecord> {
    vec![
        ReviewRecord {
            movie_id: 848326,
            reviewer_name: "msbreviews".into(),
            review_date: seed_date(2023, 12, 24),
            rating: 7,
            content: "A good attempt at a space opera on a budget. Everything \
                      blends together after the spider boss fight, but it is a \
                      pleasant enough way to spend an evening."
                .into(),
        },
        ReviewRecord {
            movie_id: 572802,
            reviewer_name: "justhappytobehere".into(),
            review_date: seed_date(2024, 1, 26),
            rating: 4,
            content: "Not clear who this movie was made for. Struts around with \
                      great confidence while having very little to say."
                .into(),
        },
        ReviewRecord {
            movie_id: 695721,
            reviewer_name: "austinmgray".into(),
            review_date: seed_date(2023, 11, 25),
            rating: 8,
            content: "One of the best installments in the series. The darkest \
                      and most political entry; the third act could have been \
                      more fleshed out, but excellent casting and music."
                .into(),
        },
    ]
}

/// Write the starter reviews into the table.
pub async fn seed_reviews(client: &Client, table: &str) -> Result<(), aws_sdk_dynamodb::Error> {
    let reviews = starter_reviews();
    let count = reviews.len();
    for review in reviews {
        client
            .put_item()
            .table_name(table)
            .set_item(Some(review.into_item()))
            .send()
            .await?;
    }
    info!(%table, count, "seeded starter reviews");
    Ok(())
}

fn seed_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("static seed date")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_reviews_have_distinct_keys() {
        let reviews = starter_reviews();
        assert_eq!(reviews.len(), 3);
        let mut keys: Vec<_> = reviews
            .iter()
            .map(|r| (r.movie_id, r.reviewer_name.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }
}
