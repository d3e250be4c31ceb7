//! Resolved Remote Schema Context
//!
//! The runtime unit produced for one successfully resolved remote schema.
//! Created once per resolution, immutable thereafter; a rebuild supersedes
//! it rather than mutating it.

use crate::definition::{RelationshipDef, TypeRelationshipSpec};
use crate::endpoint::RemoteSchemaInfo;
use crate::introspection::{IntrospectionResult, RawIntrospectionPayload};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fully resolved runtime unit for one remote schema
#[derive(Debug, Clone)]
pub struct RemoteSchemaContext {
    pub name: String,
    /// Base introspection, as fetched or stitched
    pub introspection: IntrospectionResult,
    pub info: RemoteSchemaInfo,
    /// Exact payload bytes, kept for passthrough and future stitching
    pub raw: RawIntrospectionPayload,
    /// Role → role-scoped introspection; roles with no access are absent
    pub permissions: HashMap<String, IntrospectionResult>,
    pub relationships: Vec<PartiallyResolvedRelationship>,
}

impl RemoteSchemaContext {
    /// The introspection a given role is allowed to see, if any
    pub fn scoped_introspection(&self, role: &str) -> Option<&IntrospectionResult> {
        self.permissions.get(role)
    }
}

/// Relationship declarations carried through unresolved
///
/// Cross-source link resolution happens in a later build stage; this stage
/// only pairs each type with its declared links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartiallyResolvedRelationship {
    pub type_name: String,
    pub relationships: Vec<RelationshipDef>,
}

impl From<&TypeRelationshipSpec> for PartiallyResolvedRelationship {
    fn from(spec: &TypeRelationshipSpec) -> Self {
        Self {
            type_name: spec.type_name.clone(),
            relationships: spec.relationships.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_relationship_spec_carries_over() {
        let spec = TypeRelationshipSpec {
            type_name: "Country".to_string(),
            relationships: vec![RelationshipDef {
                name: "cities".to_string(),
                target_source: "geo_db".to_string(),
                field_mapping: BTreeMap::from([("code".to_string(), "country_code".to_string())]),
            }],
        };

        let partial = PartiallyResolvedRelationship::from(&spec);
        assert_eq!(partial.type_name, "Country");
        assert_eq!(partial.relationships, spec.relationships);
    }
}
