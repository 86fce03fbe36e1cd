use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Context};

pub struct Config {
    pub application_id: u64,
    pub token: String,
    pub database_url: String,
    pub shards: u64,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> anyhow::Result<Self> {
        Ok(Self {
            application_id: parse(&lookup, "EVENTQUIZ_APPL", None)?,
            token: required(&lookup, "EVENTQUIZ_TOKEN")?,
            database_url: required(&lookup, "EVENTQUIZ_DATABASE_URL")?,
            shards: parse(&lookup, "EVENTQUIZ_SHARDS", Some(1))?,
            db_max_connections: parse(&lookup, "EVENTQUIZ_DB_MAX_CONNECTIONS", Some(5))?,
        })
    }
}

fn required<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> anyhow::Result<String> {
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(anyhow!("expected {}", key)),
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: Option<T>) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match (lookup(key), default) {
        (None, Some(default)) => Ok(default),
        (None, None) => Err(anyhow!("expected {}", key)),
        (Some(v), _) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("{} is invalid", key)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_required_values_and_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("EVENTQUIZ_APPL", "1234"),
            ("EVENTQUIZ_TOKEN", "secret"),
            ("EVENTQUIZ_DATABASE_URL", "postgres://localhost/eventquiz"),
        ])).unwrap();

        assert_eq!(config.application_id, 1234);
        assert_eq!(config.token, "secret");
        assert_eq!(config.database_url, "postgres://localhost/eventquiz");
        assert_eq!(config.shards, 1);
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn overrides_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("EVENTQUIZ_APPL", "1"),
            ("EVENTQUIZ_TOKEN", "t"),
            ("EVENTQUIZ_DATABASE_URL", "postgres://db"),
            ("EVENTQUIZ_SHARDS", "2"),
            ("EVENTQUIZ_DB_MAX_CONNECTIONS", " 12 "),
        ])).unwrap();

        assert_eq!(config.shards, 2);
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = Config::from_lookup(lookup(&[
            ("EVENTQUIZ_APPL", "1"),
            ("EVENTQUIZ_DATABASE_URL", "postgres://db"),
        ])).err().unwrap();

        assert_eq!(err.to_string(), "expected EVENTQUIZ_TOKEN");
    }

    #[test]
    fn malformed_application_id_names_the_variable() {
        let err = Config::from_lookup(lookup(&[
            ("EVENTQUIZ_APPL", "not-a-number"),
            ("EVENTQUIZ_TOKEN", "t"),
            ("EVENTQUIZ_DATABASE_URL", "postgres://db"),
        ])).err().unwrap();

        assert_eq!(err.to_string(), "EVENTQUIZ_APPL is invalid");
    }
}
