use async_trait::async_trait;

use crate::error::GraphError;

/// Supplies the bearer token attached to every outbound request.
///
/// Token acquisition and refresh live outside this crate; deployments
/// inject an implementation wired to their identity provider.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, GraphError>;
}

/// Fixed token taken from configuration or the environment.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn from_env(var: &str) -> anyhow::Result<Self> {
        let token = std::env::var(var).map_err(|_| anyhow::anyhow!("{} must be set", var))?;
        if token.is_empty() {
            anyhow::bail!("{} must not be empty", var);
        }
        Ok(Self(token))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, GraphError> {
        Ok(self.0.clone())
    }
}
