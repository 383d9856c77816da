use std::collections::HashSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::{BoxError, StartupError};

/// Key prefix under which plugin registrations are stored.
pub const PLUGIN_PREFIX: &str = "PLUGIN#";

/// A plugin registration. Only the principals matter to this crate.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PluginRecord {
    pub plugin_id: String,
    #[serde(default)]
    pub client_principals: Vec<String>,
}

/// Lists plugin registrations stored under a key prefix.
#[async_trait]
pub trait PluginSource: Send + Sync {
    async fn list_plugins(&self, prefix: &str) -> Result<Vec<PluginRecord>, BoxError>;
}

/// Allowlist of infrastructure-signed callers. Built once at startup and only
/// read afterwards, so it is shared as a plain `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct PrincipalRegistry {
    allowed: HashSet<String>,
}

impl PrincipalRegistry {
    pub fn from_principals<I, S>(principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: principals.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads every plugin's client principals. Any failure is fatal to the caller.
    pub async fn load(source: &dyn PluginSource) -> Result<Self, StartupError> {
        let plugins = source
            .list_plugins(PLUGIN_PREFIX)
            .await
            .map_err(StartupError::RegistryLoad)?;
        let registry = Self::from_principals(
            plugins.into_iter().flat_map(|p| p.client_principals.into_iter()),
        );
        tracing::info!("Loaded {} allowed principals", registry.len());
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Whether `principal` may use the signed path. Assumed-role session ARNs match
    /// the role they were assumed from.
    pub fn is_allowed(&self, principal: &str) -> bool {
        if principal.is_empty() {
            return false;
        }
        self.allowed.contains(normalize_arn(principal).as_str())
    }
}

/// `arn:aws:sts::<acct>:assumed-role/<role path>/<session>` becomes
/// `arn:aws:iam::<acct>:role/<role path>`. Anything else is returned as-is.
pub fn normalize_arn(arn: &str) -> String {
    if !arn.contains(":assumed-role/") {
        return arn.to_string();
    }
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    if parts.len() < 6 {
        return arn.to_string();
    }
    let account_id = parts[4];
    let resource: Vec<&str> = parts[5].split('/').collect();
    if resource.len() < 3 {
        return arn.to_string();
    }
    let role = resource[1..resource.len() - 1].join("/");
    format!("arn:aws:iam::{}:role/{}", account_id, role)
}
