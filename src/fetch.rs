//! Remote Schema Fetcher
//!
//! Fetches introspection from a remote endpoint over HTTP, and stitches
//! previously stored payloads back into a usable result without a network
//! round-trip. The fetcher is a trait so the resolver can run against a mock
//! in tests.

use crate::config::Settings;
use crate::endpoint::{RemoteSchemaInfo, ValidatedEndpoint};
use crate::error::MetadataError;
use crate::introspection::{parse_introspection, IntrospectionResult, RawIntrospectionPayload};
use async_trait::async_trait;
use tracing::debug;

/// The standard introspection query sent to every remote service
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      kind
      name
      description
      fields(includeDeprecated: true) {
        name
        description
        type { ...TypeRef }
      }
      enumValues(includeDeprecated: true) { name }
    }
  }
}
fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType { kind name ofType { kind name ofType { kind name } } }
        }
      }
    }
  }
}
"#;

/// Performs introspection against a validated endpoint
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Run the introspection query and return the parsed result together
    /// with the exact response bytes
    async fn introspect(
        &self,
        endpoint: &ValidatedEndpoint,
    ) -> Result<(IntrospectionResult, RawIntrospectionPayload), MetadataError>;
}

/// HTTP fetcher backed by a shared client
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.fetch.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn introspect(
        &self,
        endpoint: &ValidatedEndpoint,
    ) -> Result<(IntrospectionResult, RawIntrospectionPayload), MetadataError> {
        let body = serde_json::json!({ "query": INTROSPECTION_QUERY });

        let mut request = self
            .client
            .post(endpoint.url.clone())
            .timeout(endpoint.timeout)
            .json(&body);
        for (name, value) in &endpoint.headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?.to_vec();

        if !status.is_success() {
            return Err(MetadataError::Fetch(format!(
                "{} returned {}: {}",
                endpoint.url,
                status,
                preview(&bytes)
            )));
        }

        let raw = RawIntrospectionPayload::new(bytes);
        let introspection = parse_introspection(raw.as_bytes())?;
        debug!(
            url = %endpoint.url,
            types = introspection.types.len(),
            bytes = raw.len(),
            "fetched remote introspection"
        );
        Ok((introspection, raw))
    }
}

/// Reconstruct introspection from stored bytes, no network round-trip
pub fn stitch(
    raw: &RawIntrospectionPayload,
    endpoint: &ValidatedEndpoint,
) -> Result<(IntrospectionResult, RemoteSchemaInfo), MetadataError> {
    let introspection = parse_introspection(raw.as_bytes())
        .map_err(|e| MetadataError::Stitch(e.to_string()))?;
    debug!(
        url = %endpoint.url,
        types = introspection.types.len(),
        "stitched stored introspection"
    );
    Ok((introspection, RemoteSchemaInfo::from(endpoint)))
}

fn preview(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut preview: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        preview.push('…');
    }
    preview
}
