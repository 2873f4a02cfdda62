use anyhow::Result;
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::slack::SlackClient;
use crate::store::CredentialStore;

/// Shared handles every broker component is built from.
#[derive(Clone)]
pub struct BrokerContext {
    pub store: Arc<dyn CredentialStore>,
    pub slack: Arc<SlackClient>,
    pub settings: BrokerSettings,
}

#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Remediation link shown when a workspace has no stored token.
    pub auth_url: String,
    /// Offset used for every rendered date and time.
    pub utc_offset: FixedOffset,
}

impl BrokerSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            auth_url: config.auth_url(),
            utc_offset: config.utc_offset()?,
        })
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            auth_url: format!("http://localhost:3000{}", crate::config::LOGIN_PATH),
            utc_offset: Utc.fix(),
        }
    }
}

impl BrokerContext {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        slack: Arc<SlackClient>,
        settings: BrokerSettings,
    ) -> Self {
        Self {
            store,
            slack,
            settings,
        }
    }
}
