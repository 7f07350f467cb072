use serde::Deserialize;

use crate::utils;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// How many streams a single hoster may contribute to one bundle.
    pub max_streams_per_provider: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_streams_per_provider: 3,
            connect_timeout_secs: 5,
            read_timeout_secs: 30,
            user_agent: utils::get_user_agent().to_owned(),
        }
    }
}
