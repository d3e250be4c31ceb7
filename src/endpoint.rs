//! Remote Endpoint Validation
//!
//! Turns a raw connection definition into a validated, ready-to-call
//! endpoint descriptor: environment references resolved, URL normalized,
//! headers checked, timeout defaulted. Validation never touches the network.

use crate::config::FetchConfig;
use crate::definition::ConnectionDef;
use crate::error::MetadataError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::time::Duration;
use url::Url;

static HEADER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("header name pattern"));

/// Resolved, ready-to-call descriptor for a remote endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEndpoint {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub forward_client_headers: bool,
}

/// Endpoint info in serializable form (safe to expose in catalog state)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSchemaInfo {
    pub url: String,
    pub header_names: Vec<String>,
    pub timeout_seconds: u64,
    pub forward_client_headers: bool,
}

impl From<&ValidatedEndpoint> for RemoteSchemaInfo {
    fn from(endpoint: &ValidatedEndpoint) -> Self {
        Self {
            url: endpoint.url.to_string(),
            // header values may carry credentials, only names are exposed
            header_names: endpoint.headers.iter().map(|(n, _)| n.clone()).collect(),
            timeout_seconds: endpoint.timeout.as_secs(),
            forward_client_headers: endpoint.forward_client_headers,
        }
    }
}

/// Validate a connection definition against the current environment
pub fn validate(
    definition: &ConnectionDef,
    defaults: &FetchConfig,
) -> Result<ValidatedEndpoint, MetadataError> {
    let raw_url = match (&definition.url, &definition.url_from_env) {
        (Some(url), None) => url.clone(),
        (None, Some(var)) => std::env::var(var).map_err(|_| {
            MetadataError::Validation(format!("environment variable {} is not set", var))
        })?,
        (Some(_), Some(_)) => {
            return Err(MetadataError::Validation(
                "url and urlFromEnv are mutually exclusive".to_string(),
            ))
        }
        (None, None) => {
            return Err(MetadataError::Validation(
                "one of url or urlFromEnv is required".to_string(),
            ))
        }
    };

    let url = Url::parse(&raw_url)
        .map_err(|e| MetadataError::Validation(format!("invalid url {}: {}", raw_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(MetadataError::Validation(format!(
            "unsupported url scheme {} (use http or https)",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(MetadataError::Validation(format!(
            "url {} has no host",
            raw_url
        )));
    }

    let mut headers = Vec::with_capacity(definition.headers.len());
    for header in &definition.headers {
        if !HEADER_NAME_RE.is_match(&header.name) {
            return Err(MetadataError::Validation(format!(
                "invalid header name: {:?}",
                header.name
            )));
        }
        let value = match (&header.value, &header.value_from_env) {
            (Some(value), None) => value.clone(),
            (None, Some(var)) => std::env::var(var).map_err(|_| {
                MetadataError::Validation(format!(
                    "environment variable {} for header {} is not set",
                    var, header.name
                ))
            })?,
            _ => {
                return Err(MetadataError::Validation(format!(
                    "header {} needs exactly one of value or valueFromEnv",
                    header.name
                )))
            }
        };
        headers.push((header.name.clone(), value));
    }

    let timeout = Duration::from_secs(
        definition
            .timeout_seconds
            .unwrap_or(defaults.timeout_seconds),
    );

    Ok(ValidatedEndpoint {
        url,
        headers,
        timeout,
        forward_client_headers: definition.forward_client_headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::HeaderSpec;

    fn defaults() -> FetchConfig {
        FetchConfig::default()
    }

    #[test]
    fn test_validate_plain_url() {
        let def = ConnectionDef::from_url("https://countries.example.com/graphql");
        let endpoint = validate(&def, &defaults()).unwrap();

        assert_eq!(endpoint.url.as_str(), "https://countries.example.com/graphql");
        assert_eq!(endpoint.timeout, Duration::from_secs(60));
        assert!(endpoint.headers.is_empty());
    }

    #[test]
    fn test_validate_resolves_url_from_env() {
        std::env::set_var("TEST_SCHEMAGATE_REMOTE_URL", "http://internal:4000/graphql");
        let def = ConnectionDef {
            url: None,
            url_from_env: Some("TEST_SCHEMAGATE_REMOTE_URL".to_string()),
            headers: vec![],
            timeout_seconds: None,
            forward_client_headers: false,
        };

        let endpoint = validate(&def, &defaults()).unwrap();
        assert_eq!(endpoint.url.as_str(), "http://internal:4000/graphql");
    }

    #[test]
    fn test_validate_rejects_missing_env_var() {
        let def = ConnectionDef {
            url: None,
            url_from_env: Some("TEST_SCHEMAGATE_UNSET_VAR".to_string()),
            headers: vec![],
            timeout_seconds: None,
            forward_client_headers: false,
        };
        let err = validate(&def, &defaults()).unwrap_err();
        assert!(err.to_string().contains("TEST_SCHEMAGATE_UNSET_VAR"));
    }

    #[test]
    fn test_validate_rejects_both_url_fields() {
        let mut def = ConnectionDef::from_url("https://a.example.com");
        def.url_from_env = Some("SOME_VAR".to_string());
        assert!(validate(&def, &defaults()).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let def = ConnectionDef::from_url("ftp://files.example.com/schema");
        let err = validate(&def, &defaults()).unwrap_err();
        assert!(err.to_string().contains("unsupported url scheme"));
    }

    #[test]
    fn test_validate_rejects_malformed_url() {
        let def = ConnectionDef::from_url("not a url at all");
        assert!(validate(&def, &defaults()).is_err());
    }

    #[test]
    fn test_validate_header_rules() {
        let mut def = ConnectionDef::from_url("https://a.example.com/graphql");
        def.headers.push(HeaderSpec {
            name: "Authorization".to_string(),
            value: Some("Bearer token".to_string()),
            value_from_env: None,
        });
        let endpoint = validate(&def, &defaults()).unwrap();
        assert_eq!(
            endpoint.headers,
            vec![("Authorization".to_string(), "Bearer token".to_string())]
        );

        def.headers.push(HeaderSpec {
            name: "bad header name".to_string(),
            value: Some("x".to_string()),
            value_from_env: None,
        });
        let err = validate(&def, &defaults()).unwrap_err();
        assert!(err.to_string().contains("invalid header name"));
    }

    #[test]
    fn test_explicit_timeout_wins_over_default() {
        let mut def = ConnectionDef::from_url("https://a.example.com/graphql");
        def.timeout_seconds = Some(5);
        let endpoint = validate(&def, &defaults()).unwrap();
        assert_eq!(endpoint.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_info_hides_header_values() {
        let mut def = ConnectionDef::from_url("https://a.example.com/graphql");
        def.headers.push(HeaderSpec {
            name: "X-Api-Key".to_string(),
            value: Some("secret".to_string()),
            value_from_env: None,
        });
        let endpoint = validate(&def, &defaults()).unwrap();
        let info = RemoteSchemaInfo::from(&endpoint);

        assert_eq!(info.header_names, vec!["X-Api-Key"]);
        assert!(!serde_json::to_string(&info).unwrap().contains("secret"));
    }
}
