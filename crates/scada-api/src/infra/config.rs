use std::collections::HashMap;

use nest_mediator::BroadcastBroker;

const PREFIX: &str = "SCADA_";

pub const LOGGING_LEVEL: &str = "SCADA_LOGGING_LEVEL";
pub const LOGGING_SERIALIZE: &str = "SCADA_LOGGING_SERIALIZE";
pub const BROKER_CAPACITY: &str = "SCADA_BROKER_CAPACITY";
pub const CONSUMER_CONCURRENCY: &str = "SCADA_CONSUMER_CONCURRENCY";

const DEFAULT_LOGGING_LEVEL: &str = "scada_api=debug,nest_mediator=debug";
const DEFAULT_CONSUMER_CONCURRENCY: usize = 30;

/// Snapshot of the `SCADA_`-prefixed environment.
#[non_exhaustive]
pub struct Config {
    kv: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let kv = std::env::vars()
            .filter(|(k, _)| k.starts_with(PREFIX))
            .collect();

        Self { kv }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_map(kv: HashMap<String, String>) -> Self {
        Self { kv }
    }

    pub fn optional(&self, key: &str) -> Option<&str> {
        self.kv.get(key).map(|v| v.as_str())
    }

    pub fn logging_level(&self) -> &str {
        self.optional(LOGGING_LEVEL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_LOGGING_LEVEL)
    }

    pub fn logging_serialize(&self) -> bool {
        self.optional(LOGGING_SERIALIZE)
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
    }

    pub fn broker_capacity(&self) -> anyhow::Result<usize> {
        self.parsed(BROKER_CAPACITY, BroadcastBroker::DEFAULT_CAPACITY)
    }

    pub fn consumer_concurrency(&self) -> anyhow::Result<usize> {
        self.parsed(CONSUMER_CONCURRENCY, DEFAULT_CONSUMER_CONCURRENCY)
    }

    fn parsed(&self, key: &str, default: usize) -> anyhow::Result<usize> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => Err(anyhow::anyhow!("config key '{key}' must be greater than 0")),
                Ok(value) => Ok(value),
                Err(e) => Err(anyhow::anyhow!("config key '{key}' is not a number: {e}")),
            },
        }
    }
}
