//! Declarative client configuration.
//!
//! Mirrors the builder surface in a shape that can live in a TOML or
//! JSON config file: default headers, throttle settings, and the header
//! keys used to extract quota information from responses.

use std::collections::HashMap;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::client::ClientBuilder;
use crate::quota::QuotaKeys;
use crate::ratelimit::RateLimit;

/// Serde-ready counterpart of [`ClientBuilder`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Headers sent with every request
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_headers")]
    #[serde(serialize_with = "serialize_headers")]
    pub headers: HeaderMap,

    /// Throttle settings; absent means no client-side throttling
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,

    /// Header names carrying quota information
    #[serde(default)]
    pub quota_keys: QuotaKeys,
}

impl ClientConfig {
    /// Turn the configuration into a pre-populated [`ClientBuilder`]
    #[must_use]
    pub fn into_builder(self) -> ClientBuilder {
        ClientBuilder::builder()
            .custom_headers(self.headers)
            .rate_limit(self.rate_limit)
            .quota_keys(self.quota_keys)
            .build()
    }
}

/// Custom deserializer for headers from the config file format
fn deserialize_headers<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let map = HashMap::<String, String>::deserialize(deserializer)?;
    let mut header_map = HeaderMap::new();

    for (name, value) in map {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| serde::de::Error::custom(format!("Invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(&value).map_err(|e| {
            serde::de::Error::custom(format!("Invalid header value '{value}': {e}"))
        })?;
        header_map.insert(header_name, header_value);
    }

    Ok(header_map)
}

/// Custom serializer for headers to the config file format
fn serialize_headers<S>(headers: &HeaderMap, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let map: HashMap<String, String> = headers
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("").to_string()))
        .collect();
    map.serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_config_from_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            rate_limit = { max_calls = 10, period = "30s" }

            [headers]
            Authorization = "Bearer token123"

            [quota_keys]
            call_limit_remaining = "x-ratelimit-remaining"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.rate_limit,
            Some(RateLimit::new(10, Duration::from_secs(30)))
        );
        assert!(config.headers.contains_key("authorization"));
        assert_eq!(
            config.quota_keys.call_limit_remaining.as_deref(),
            Some("x-ratelimit-remaining")
        );
        assert_eq!(config.quota_keys.call_count, None);
    }

    #[test]
    fn test_config_round_trip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());
        let config = ClientConfig {
            headers,
            rate_limit: Some(RateLimit::new(3, Duration::from_millis(500))),
            quota_keys: QuotaKeys {
                call_count: Some("x-count".into()),
                call_count_limit: Some("x-limit".into()),
                call_limit_remaining: None,
            },
        };

        let toml = toml::to_string(&config).unwrap();
        let deserialized: ClientConfig = toml::from_str(&toml).unwrap();

        assert_eq!(deserialized.rate_limit, config.rate_limit);
        assert_eq!(deserialized.quota_keys, config.quota_keys);
        assert_eq!(deserialized.headers.len(), 1);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = toml::from_str::<ClientConfig>("retries = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builds_a_client() {
        let config: ClientConfig = toml::from_str(
            r#"
            rate_limit = { max_calls = 2, period = "1s" }
            "#,
        )
        .unwrap();
        assert!(config.into_builder().client().is_ok());
    }
}
