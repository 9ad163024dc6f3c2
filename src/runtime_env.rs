use std::{borrow::Cow, env, fmt};

const ENVIRONMENT_NAME_ENV: &str = "ENVIRONMENT_NAME";
const DEFAULT_REMOTE_ENVIRONMENT: &str = "Prod";
const DEFAULT_LOCAL_ENVIRONMENT: &str = "Local";

#[derive(Debug, Clone, Copy)]
pub enum ResolutionSource {
    ExplicitVar,
    LocalTooling,
    AwsRuntime,
    DefaultLocal,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSource::ExplicitVar => write!(f, "explicit ENVIRONMENT_NAME"),
            ResolutionSource::LocalTooling => write!(f, "local tooling auto-detect"),
            ResolutionSource::AwsRuntime => write!(f, "AWS runtime auto-detect"),
            ResolutionSource::DefaultLocal => write!(f, "fallback to Local"),
        }
    }
}

/// Encapsulates the deployment environment (Prod, Staging, Local, ...).
///
/// The detection order is:
///  1. Explicit `ENVIRONMENT_NAME` (set via deploy config, CI, or CLI)
///  2. Local tooling hints (`cargo lambda watch`, SAM local, LocalStack)
///  3. AWS Lambda runtime heuristics
///  4. Default to `Local`
pub struct DeploymentEnv {
    name: Cow<'static, str>,
    source: ResolutionSource,
}

impl DeploymentEnv {
    pub fn detect() -> Self {
        if let Some(explicit) = Self::explicit_override() {
            return explicit;
        }
        if Self::running_locally() {
            return Self::local(ResolutionSource::LocalTooling);
        }
        if Self::running_on_aws() {
            return Self::remote(ResolutionSource::AwsRuntime);
        }
        Self::local(ResolutionSource::DefaultLocal)
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Reviews table for this environment, unless `TABLE_NAME` overrides it.
    pub fn table_name(&self) -> String {
        format!("Reviews_{}", self.name())
    }

    pub fn source(&self) -> ResolutionSource {
        self.source
    }

    fn explicit_override() -> Option<Self> {
        env::var(ENVIRONMENT_NAME_ENV).ok().and_then(|raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Self {
                    name: Cow::Owned(trimmed.to_owned()),
                    source: ResolutionSource::ExplicitVar,
                })
            }
        })
    }

    fn running_locally() -> bool {
        env::var_os("AWS_SAM_LOCAL").is_some()
            || env::var_os("CARGO_LAMBDA_HTTP_PORT").is_some()
            || env::var_os("LOCALSTACK_HOSTNAME").is_some()
    }

    fn running_on_aws() -> bool {
        env::var_os("AWS_EXECUTION_ENV").is_some()
            || env::var_os("AWS_REGION").is_some()
            || env::var_os("AWS_LAMBDA_FUNCTION_NAME").is_some()
            || env::var_os("LAMBDA_TASK_ROOT").is_some()
    }

    fn remote(source: ResolutionSource) -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_REMOTE_ENVIRONMENT),
            source,
        }
    }

    fn local(source: ResolutionSource) -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_LOCAL_ENVIRONMENT),
            source,
        }
    }
}
