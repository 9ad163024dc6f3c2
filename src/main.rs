//! Lambda entrypoint.
//!
//! The binary initialises logging, discovers which environment it is running
//! in, bootstraps the reviews table locally, resolves the session secret from
//! SSM, and then hands execution to `lambda_http`. Each invocation reuses the
//! `AppContext` so the SDK client and configuration are cached across
//! requests.

use std::{sync::Arc, time::Duration};

use aws_sdk_dynamodb::Client;
use lambda_http::{run, service_fn, Error as LambdaError};
use movie_reviews_api::{
    auth::{JwtVerifier, SessionAuthorizer},
    bootstrap::ensure_reviews_table,
    handle_request,
    runtime_env::DeploymentEnv,
    seed::seed_reviews,
    store::DynamoReviewStore,
    AppContext,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .json()
        .with_current_span(false)
        .init();

    let environment = DeploymentEnv::detect();
    let table_name =
        std::env::var("TABLE_NAME").unwrap_or_else(|_| environment.table_name());
    info!(
        environment = environment.name(),
        %table_name,
        resolution = %environment.source(),
        "initialising Lambda runtime"
    );

    let secret_parameter = std::env::var("SESSION_SECRET_PARAMETER")
        .map_err(|_| LambdaError::from("missing SESSION_SECRET_PARAMETER env var"))?;

    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = Client::new(&config);

    let bootstrap_tables = std::env::var("BOOTSTRAP_DYNAMODB_TABLES")
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            _ => false,
        })
        .unwrap_or_else(|_| environment.name().eq_ignore_ascii_case("Local"));

    if bootstrap_tables {
        let created = ensure_reviews_table(&client, &table_name)
            .await
            .map_err(|e| LambdaError::from(format!("failed to ensure reviews table: {e}")))?;
        if created {
            seed_reviews(&client, &table_name)
                .await
                .map_err(|e| LambdaError::from(format!("failed to seed reviews table: {e}")))?;
        }
    } else {
        info!(
            environment = environment.name(),
            "skipping DynamoDB table bootstrap"
        );
    }

    let ssm = aws_sdk_ssm::Client::new(&config);
    let session_secret = match ssm
        .get_parameter()
        .name(&secret_parameter)
        .with_decryption(true)
        .send()
        .await
    {
        Ok(resp) => resp
            .parameter
            .and_then(|p| p.value)
            .ok_or_else(|| LambdaError::from("session secret parameter missing value"))?,
        Err(err) => {
            warn!(
                "failed to fetch session secret from SSM ({}); falling back to SESSION_SECRET env var",
                err
            );
            std::env::var("SESSION_SECRET").map_err(|_| {
                LambdaError::from(
                    "missing SESSION_SECRET env var fallback after SSM lookup failure",
                )
            })?
        }
    };

    let store = DynamoReviewStore::new(client, table_name);
    // Authorizer result caching is wired but disabled: a zero window means
    // every mutating request re-verifies its token.
    let authorizer =
        SessionAuthorizer::with_cache_ttl(JwtVerifier::new(session_secret), Duration::ZERO);
    let ctx = Arc::new(AppContext::new(store, authorizer));

    run(service_fn(move |event| {
        let ctx = ctx.clone();
        async move { handle_request(ctx, event).await }
    }))
    .await
}
