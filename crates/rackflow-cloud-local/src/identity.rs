//! Local caller identity

use async_trait::async_trait;
use rackflow_cloud::{IdentityService, Result};

const LOCAL_USER: &str = "rackflow";

/// Reports a fixed `arn:local:iam::{account}:user/{user}` identity
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    account_id: String,
    user: String,
}

impl LocalIdentity {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            user: LOCAL_USER.to_string(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn arn(&self) -> String {
        format!("arn:local:iam::{}:user/{}", self.account_id, self.user)
    }
}

#[async_trait]
impl IdentityService for LocalIdentity {
    async fn caller_arn(&self) -> Result<String> {
        Ok(self.arn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackflow_cloud::repository::parse_account_id;

    #[tokio::test]
    async fn test_arn_has_account_field() {
        let identity = LocalIdentity::new("123456789012").with_user("alice");
        let arn = identity.caller_arn().await.unwrap();
        assert_eq!(arn, "arn:local:iam::123456789012:user/alice");
        assert_eq!(parse_account_id(&arn).unwrap(), "123456789012");
    }
}
