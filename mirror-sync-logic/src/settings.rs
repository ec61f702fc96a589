use std::time;

use serde::Deserialize;
use serde_with::serde_as;

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSettings {
    /// Mirror node topics to tail, e.g. `["0.0.48792325"]`
    pub topics: Vec<String>,
    #[serde(default = "default_polling_interval")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub polling_interval: time::Duration,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_start_on_launch")]
    pub start_on_launch: bool,
}

fn default_polling_interval() -> time::Duration {
    time::Duration::from_secs(30)
}

fn default_page_size() -> u32 {
    100
}

fn default_start_on_launch() -> bool {
    true
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            topics: vec![],
            polling_interval: default_polling_interval(),
            page_size: default_page_size(),
            start_on_launch: default_start_on_launch(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdempotencySettings {
    #[serde(default = "default_ttl")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub ttl: time::Duration,
    #[serde(default = "default_min_key_length")]
    pub min_key_length: usize,
    #[serde(default = "default_sweep_interval")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub sweep_interval: time::Duration,
}

fn default_ttl() -> time::Duration {
    time::Duration::from_secs(24 * 60 * 60)
}

fn default_min_key_length() -> usize {
    16
}

fn default_sweep_interval() -> time::Duration {
    time::Duration::from_secs(60 * 60)
}

impl Default for IdempotencySettings {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            min_key_length: default_min_key_length(),
            sweep_interval: default_sweep_interval(),
        }
    }
}
