//! Local table bootstrap.
//!
//! Deployed environments get the reviews table from infrastructure; when
//! running against DynamoDB-local the binary provisions it on startup.

use aws_sdk_dynamodb::{
    types::{
        AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
        Projection, ProjectionType, ScalarAttributeType, TableStatus,
    },
    Client,
};
use tokio::time::{sleep, Duration};

use crate::store::REVIEWER_NAME_INDEX;

/// Create the reviews table if it is missing. Returns `true` when the table
/// was created by this call, so the caller knows a fresh table needs seeding.
pub async fn ensure_reviews_table(
    client: &Client,
    table: &str,
) -> Result<bool, aws_sdk_dynamodb::Error> {
    if table_exists(client, table).await? {
        return Ok(false);
    }

    client
        .create_table()
        .table_name(table)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("MovieId")
                .attribute_type(ScalarAttributeType::N)
                .build()
                .expect("static MovieId definition"),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("ReviewerName")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .expect("static ReviewerName definition"),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("MovieId")
                .key_type(KeyType::Hash)
                .build()
                .expect("static MovieId key"),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("ReviewerName")
                .key_type(KeyType::Range)
                .build()
                .expect("static ReviewerName key"),
        )
        .global_secondary_indexes(
            GlobalSecondaryIndex::builder()
                .index_name(REVIEWER_NAME_INDEX)
                .key_schema(
                    KeySchemaElement::builder()
                        .attribute_name("ReviewerName")
                        .key_type(KeyType::Hash)
                        .build()
                        .expect("ReviewerName index key"),
                )
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .build()
                .expect("ReviewerNameIndex definition"),
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await?;

    wait_for_active(client, table).await?;
    Ok(true)
}

async fn table_exists(client: &Client, table: &str) -> Result<bool, aws_sdk_dynamodb::Error> {
    let mut last_evaluated = None;
    loop {
        let mut req = client.list_tables();
        if let Some(ref start) = last_evaluated {
            req = req.exclusive_start_table_name(start);
        }
        let resp = req.send().await?;
        if resp
            .table_names
            .as_ref()
            .unwrap_or(&vec![])
            .iter()
            .any(|name| name == table)
        {
            return Ok(true);
        }
        if let Some(next) = resp.last_evaluated_table_name {
            last_evaluated = Some(next);
        } else {
            break;
        }
    }
    Ok(false)
}

async fn wait_for_active(client: &Client, table: &str) -> Result<(), aws_sdk_dynamodb::Error> {
    for _ in 0..20 {
        let resp = client.describe_table().table_name(table).send().await?;
        if resp
            .table
            .and_then(|t| t.table_status)
            .map_or(false, |status| status == TableStatus::Active)
        {
            return Ok(());
        }
        sleep(Duration::from_millis(200)).await;
    }
    Ok(())
}
