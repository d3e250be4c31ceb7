//! Remote Schema Catalog Definitions
//!
//! Declarative inputs to the resolution engine: what the operator registered,
//! before any validation or network activity. All of these are immutable
//! inputs sourced from the catalog being built.

use crate::introspection::RawIntrospectionPayload;
use crate::permissions::PermissionDocument;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Declarative definition of one remote schema registered with the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSchemaDef {
    /// Unique key of this remote schema within the catalog
    pub name: String,
    pub definition: ConnectionDef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionSpec>,
    #[serde(default)]
    pub relationships: Vec<TypeRelationshipSpec>,
}

/// Connection definition for a remote endpoint
///
/// Exactly one of `url` / `url_from_env` must be set; the same rule applies
/// to each header's `value` / `value_from_env`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_from_env: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub forward_client_headers: bool,
}

impl ConnectionDef {
    /// Plain static-url definition, the common case
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            url_from_env: None,
            headers: Vec::new(),
            timeout_seconds: None,
            forward_client_headers: false,
        }
    }
}

/// A header sent with every introspection and proxied request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_from_env: Option<String>,
}

/// Per-role permission declared on a remote schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSpec {
    pub role: String,
    pub definition: PermissionDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Field-level links from one of this schema's types to other data sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRelationshipSpec {
    pub type_name: String,
    pub relationships: Vec<RelationshipDef>,
}

/// One declared relationship; resolution against the target source happens
/// in a later build stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDef {
    pub name: String,
    pub target_source: String,
    #[serde(default)]
    pub field_mapping: BTreeMap<String, String>,
}

/// Per-entity version tokens driving cache reuse
///
/// A token changes whenever the entity's defining input changes upstream.
/// An entity with no token is never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvalidationKeys(HashMap<String, String>);

impl InvalidationKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, token: impl Into<String>) {
        self.0.insert(name.into(), token.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw introspection bytes persisted from previous runs, keyed by schema name
pub type StoredIntrospection = HashMap<String, RawIntrospectionPayload>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_def_from_url() {
        let def = ConnectionDef::from_url("https://countries.example.com/graphql");
        assert_eq!(
            def.url.as_deref(),
            Some("https://countries.example.com/graphql")
        );
        assert!(def.url_from_env.is_none());
        assert!(!def.forward_client_headers);
    }

    #[test]
    fn test_invalidation_keys_lookup() {
        let mut keys = InvalidationKeys::new();
        keys.insert("countries", "v42");

        assert_eq!(keys.get("countries"), Some("v42"));
        assert_eq!(keys.get("weather"), None);
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_definition_round_trips_through_json() {
        let def = RemoteSchemaDef {
            name: "countries".to_string(),
            definition: ConnectionDef::from_url("https://countries.example.com/graphql"),
            comment: Some("public countries API".to_string()),
            permissions: vec![],
            relationships: vec![TypeRelationshipSpec {
                type_name: "Country".to_string(),
                relationships: vec![RelationshipDef {
                    name: "cities".to_string(),
                    target_source: "geo_db".to_string(),
                    field_mapping: BTreeMap::from([("code".to_string(), "country_code".to_string())]),
                }],
            }],
        };

        let json = serde_json::to_string(&def).unwrap();
        let back: RemoteSchemaDef = serde_json::from_str(&json).unwrap();
        assert_eq!(def, back);
    }
}
