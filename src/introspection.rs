//! Schema Introspection Module
//!
//! Parsed representation of a remote service's exposed schema, and the
//! wire-format decoding of a standard GraphQL introspection response.
//! An `IntrospectionResult` is produced either by fetching over the network
//! or by stitching previously stored bytes; both paths go through
//! [`parse_introspection`], so the two are observably equivalent.

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Exact bytes returned by (or stored for) a remote service
///
/// Retained for passthrough execution and for future stitching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIntrospectionPayload(Vec<u8>);

impl RawIntrospectionPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Content checksum, stable across processes
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        format!("{:x}", hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parsed, structured representation of a remote service's schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionResult {
    pub query_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<String>,
    pub types: Vec<TypeDefinition>,
}

impl IntrospectionResult {
    /// Look up a type by name
    pub fn type_def(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.iter().find(|t| t.name == name)
    }
}

/// One named type exposed by the remote schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub enum_values: Vec<String>,
}

impl TypeDefinition {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// GraphQL type kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    InputObject,
}

/// One field of an object, interface or input type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    /// Rendered type reference, e.g. `[Country!]!`
    pub type_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parse a standard introspection response body
///
/// Accepts the `{"data": {"__schema": ...}}` envelope a GraphQL endpoint
/// returns for the introspection query. GraphQL-level errors in the envelope
/// make the payload unusable and are reported as such.
pub fn parse_introspection(raw: &[u8]) -> Result<IntrospectionResult, MetadataError> {
    let envelope: wire::Envelope = serde_json::from_slice(raw)?;

    if !envelope.errors.is_empty() {
        let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
        return Err(MetadataError::Introspection(format!(
            "response carries errors: {}",
            messages.join("; ")
        )));
    }

    let schema = envelope
        .data
        .ok_or_else(|| MetadataError::Introspection("response has no data".to_string()))?
        .schema;

    let mut types = Vec::with_capacity(schema.types.len());
    for wire_type in schema.types {
        let Some(name) = wire_type.name else {
            continue; // unnamed types cannot be referenced
        };
        let kind = parse_kind(&wire_type.kind, &name)?;

        let fields = wire_type
            .fields
            .unwrap_or_default()
            .into_iter()
            .map(|f| FieldDefinition {
                name: f.name,
                type_ref: render_type_ref(&f.field_type),
                description: f.description,
            })
            .collect();

        let enum_values = wire_type
            .enum_values
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.name)
            .collect();

        types.push(TypeDefinition {
            name,
            kind,
            description: wire_type.description,
            fields,
            enum_values,
        });
    }

    Ok(IntrospectionResult {
        query_type: schema.query_type.name,
        mutation_type: schema.mutation_type.map(|t| t.name),
        subscription_type: schema.subscription_type.map(|t| t.name),
        types,
    })
}

fn parse_kind(kind: &str, type_name: &str) -> Result<TypeKind, MetadataError> {
    match kind {
        "OBJECT" => Ok(TypeKind::Object),
        "INTERFACE" => Ok(TypeKind::Interface),
        "UNION" => Ok(TypeKind::Union),
        "ENUM" => Ok(TypeKind::Enum),
        "SCALAR" => Ok(TypeKind::Scalar),
        "INPUT_OBJECT" => Ok(TypeKind::InputObject),
        other => Err(MetadataError::Introspection(format!(
            "type {} has unsupported kind {}",
            type_name, other
        ))),
    }
}

/// Render a nested `{kind, name, ofType}` reference into SDL notation
fn render_type_ref(type_ref: &wire::WireTypeRef) -> String {
    match type_ref.kind.as_str() {
        "NON_NULL" => match &type_ref.of_type {
            Some(inner) => format!("{}!", render_type_ref(inner)),
            None => String::new(),
        },
        "LIST" => match &type_ref.of_type {
            Some(inner) => format!("[{}]", render_type_ref(inner)),
            None => String::new(),
        },
        _ => type_ref.name.clone().unwrap_or_default(),
    }
}

/// Wire mirror of the introspection response shape
mod wire {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Envelope {
        pub data: Option<Data>,
        #[serde(default)]
        pub errors: Vec<WireError>,
    }

    #[derive(Debug, Deserialize)]
    pub struct WireError {
        pub message: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Data {
        #[serde(rename = "__schema")]
        pub schema: WireSchema,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WireSchema {
        pub query_type: NamedTypeRef,
        pub mutation_type: Option<NamedTypeRef>,
        pub subscription_type: Option<NamedTypeRef>,
        pub types: Vec<WireType>,
    }

    #[derive(Debug, Deserialize)]
    pub struct NamedTypeRef {
        pub name: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WireType {
        pub kind: String,
        pub name: Option<String>,
        pub description: Option<String>,
        pub fields: Option<Vec<WireField>>,
        pub enum_values: Option<Vec<WireEnumValue>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct WireField {
        pub name: String,
        pub description: Option<String>,
        #[serde(rename = "type")]
        pub field_type: WireTypeRef,
    }

    #[derive(Debug, Deserialize)]
    pub struct WireEnumValue {
        pub name: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WireTypeRef {
        pub kind: String,
        pub name: Option<String>,
        pub of_type: Option<Box<WireTypeRef>>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_payload() -> Vec<u8> {
        serde_json::json!({
            "data": {
                "__schema": {
                    "queryType": { "name": "Query" },
                    "mutationType": null,
                    "subscriptionType": null,
                    "types": [
                        {
                            "kind": "OBJECT",
                            "name": "Query",
                            "description": null,
                            "fields": [
                                {
                                    "name": "countries",
                                    "description": "All countries",
                                    "type": {
                                        "kind": "NON_NULL",
                                        "name": null,
                                        "ofType": {
                                            "kind": "LIST",
                                            "name": null,
                                            "ofType": {
                                                "kind": "NON_NULL",
                                                "name": null,
                                                "ofType": { "kind": "OBJECT", "name": "Country" }
                                            }
                                        }
                                    }
                                }
                            ],
                            "enumValues": null
                        },
                        {
                            "kind": "OBJECT",
                            "name": "Country",
                            "description": null,
                            "fields": [
                                {
                                    "name": "code",
                                    "description": null,
                                    "type": { "kind": "SCALAR", "name": "ID" }
                                },
                                {
                                    "name": "name",
                                    "description": null,
                                    "type": { "kind": "SCALAR", "name": "String" }
                                }
                            ],
                            "enumValues": null
                        },
                        {
                            "kind": "ENUM",
                            "name": "Continent",
                            "description": null,
                            "fields": null,
                            "enumValues": [ { "name": "AFRICA" }, { "name": "EUROPE" } ]
                        }
                    ]
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_parse_sample_introspection() {
        let result = parse_introspection(&sample_payload()).unwrap();

        assert_eq!(result.query_type, "Query");
        assert_eq!(result.mutation_type, None);
        assert_eq!(result.types.len(), 3);

        let query = result.type_def("Query").unwrap();
        assert_eq!(query.kind, TypeKind::Object);
        assert_eq!(query.field("countries").unwrap().type_ref, "[Country!]!");

        let continent = result.type_def("Continent").unwrap();
        assert_eq!(continent.enum_values, vec!["AFRICA", "EUROPE"]);
    }

    #[test]
    fn test_parse_rejects_missing_data() {
        let err = parse_introspection(br#"{"data": null}"#).unwrap_err();
        assert!(err.to_string().contains("no data"));
    }

    #[test]
    fn test_parse_rejects_graphql_errors() {
        let payload = br#"{"data": null, "errors": [{"message": "introspection is disabled"}]}"#;
        let err = parse_introspection(payload).unwrap_err();
        assert!(err.to_string().contains("introspection is disabled"));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let payload = serde_json::json!({
            "data": {
                "__schema": {
                    "queryType": { "name": "Query" },
                    "types": [ { "kind": "FANCY", "name": "Weird" } ]
                }
            }
        })
        .to_string();
        let err = parse_introspection(payload.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unsupported kind FANCY"));
    }

    #[test]
    fn test_checksum_consistency() {
        let raw = RawIntrospectionPayload::new(sample_payload());
        assert_eq!(raw.checksum(), raw.checksum());
        assert_ne!(
            raw.checksum(),
            RawIntrospectionPayload::new(b"{}".to_vec()).checksum()
        );
    }
}
