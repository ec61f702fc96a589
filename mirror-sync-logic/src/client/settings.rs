use std::time;

use serde::Deserialize;
use serde_with::serde_as;

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorNodeSettings {
    pub url: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub retry_delay: time::Duration,
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub request_timeout: time::Duration,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> time::Duration {
    time::Duration::from_secs(1)
}

fn default_request_timeout() -> time::Duration {
    time::Duration::from_secs(30)
}

impl Default for MirrorNodeSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:5551".to_string(),
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
            request_timeout: default_request_timeout(),
        }
    }
}
