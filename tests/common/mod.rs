use std::{env, sync::Arc, time::Duration};

use anyhow::Result;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::{config::Region, Client, Config};
use lambda_http::Body;
use movie_reviews_api::{
    auth::{issue_session_token, JwtVerifier, SessionAuthorizer, SESSION_TOKEN_TTL_SECONDS},
    bootstrap::ensure_reviews_table,
    store::DynamoReviewStore,
    AppContext,
};
use uuid::Uuid;

pub const SESSION_SECRET: &str = "integration-secret";

pub fn body_as_string(body: &Body) -> String {
    match body {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => String::new(),
    }
}

/// Cookie carrying a session token the test context will accept.
#[allow(dead_code)]
pub fn session_cookie() -> String {
    let token = issue_session_token(
        SESSION_SECRET,
        "integration-user",
        Some("integration-user"),
        SESSION_TOKEN_TTL_SECONDS,
    )
    .expect("session token");
    format!("token={token}")
}

#[allow(dead_code)]
pub struct TestSetup {
    pub ctx: Arc<AppContext<DynamoReviewStore, JwtVerifier>>,
    pub client: Client,
    pub table: String,
    _guard: TableGuard,
}

struct TableGuard {
    client: Client,
    table: String,
}

impl TableGuard {
    async fn new(client: Client, table: String) -> Result<Self> {
        ensure_reviews_table(&client, &table).await?;
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(Self { client, table })
    }
}

impl Drop for TableGuard {
    fn drop(&mut self) {
        let client = self.client.clone();
        let table = self.table.clone();
        tokio::spawn(async move {
            let _ = client.delete_table().table_name(&table).send().await;
        });
    }
}

pub async fn setup_environment() -> Option<TestSetup> {
    let endpoint =
        env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    env::set_var(
        "AWS_ALLOW_HTTP",
        env::var("AWS_ALLOW_HTTP").unwrap_or_else(|_| "true".into()),
    );
    env::set_var(
        "AWS_SDK_LOAD_CONFIG",
        env::var("AWS_SDK_LOAD_CONFIG").unwrap_or_else(|_| "1".into()),
    );

    let region = Region::new(env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()));
    let config = Config::builder()
        .endpoint_url(endpoint)
        .region(region)
        .credentials_provider(Credentials::for_tests())
        .behavior_version_latest()
        .build();
    let client = Client::from_conf(config);

    if client.list_tables().send().await.is_err() {
        eprintln!("skipping integration test: DynamoDB not reachable");
        return None;
    }

    let table = format!("Reviews_IntegrationTest_{}", Uuid::new_v4().simple());
    let guard = TableGuard::new(client.clone(), table.clone()).await.ok()?;

    let store = DynamoReviewStore::new(client.clone(), table.clone());
    let authorizer = SessionAuthorizer::new(JwtVerifier::new(SESSION_SECRET));
    let ctx = Arc::new(AppContext::new(store, authorizer));

    Some(TestSetup {
        ctx,
        client,
        table,
        _guard: guard,
    })
}
