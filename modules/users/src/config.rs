use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the users module (`modules.users` in the app config)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersConfig {
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    #[serde(default = "default_max_email_length")]
    pub max_email_length: usize,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            max_name_length: default_max_name_length(),
            max_email_length: default_max_email_length(),
        }
    }
}

impl From<&UsersConfig> for ServiceConfig {
    fn from(cfg: &UsersConfig) -> Self {
        Self {
            max_name_length: cfg.max_name_length,
            max_email_length: cfg.max_email_length,
        }
    }
}

fn default_max_name_length() -> usize {
    100
}

fn default_max_email_length() -> usize {
    254
}
