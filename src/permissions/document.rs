//! Permission documents
//!
//! A permission document lists the types, and optionally the fields, of the
//! upstream schema a role may see. Applying one intersects the base
//! introspection; names that do not exist upstream are resolution errors,
//! since the document would otherwise promise capabilities the remote
//! service cannot serve.

use crate::error::MetadataError;
use crate::introspection::{IntrospectionResult, TypeDefinition};
use serde::{Deserialize, Serialize};

/// Access-control document declared for one (role, remote schema) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDocument {
    pub allowed_types: Vec<TypeExposure>,
}

impl PermissionDocument {
    /// Expose the listed types with all of their fields
    pub fn allow_types<I, S>(type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_types: type_names
                .into_iter()
                .map(|name| TypeExposure {
                    type_name: name.into(),
                    fields: None,
                })
                .collect(),
        }
    }
}

/// One exposed type, optionally restricted to a field subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeExposure {
    pub type_name: String,
    /// `None` exposes every field of the type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl PermissionDocument {
    /// Derive the role-scoped introspection from the base schema
    ///
    /// The query root must be exposed; mutation and subscription roots are
    /// carried only when their types are exposed too.
    pub fn apply(&self, base: &IntrospectionResult) -> Result<IntrospectionResult, MetadataError> {
        let mut types = Vec::with_capacity(self.allowed_types.len());
        for exposure in &self.allowed_types {
            let base_type = base.type_def(&exposure.type_name).ok_or_else(|| {
                MetadataError::Permission(format!(
                    "type {} is not defined in the upstream schema",
                    exposure.type_name
                ))
            })?;

            types.push(match &exposure.fields {
                None => base_type.clone(),
                Some(field_names) => {
                    let mut fields = Vec::with_capacity(field_names.len());
                    for name in field_names {
                        let field = base_type.field(name).ok_or_else(|| {
                            MetadataError::Permission(format!(
                                "field {} is not defined on type {}",
                                name, exposure.type_name
                            ))
                        })?;
                        fields.push(field.clone());
                    }
                    TypeDefinition {
                        fields,
                        ..base_type.clone()
                    }
                }
            });
        }

        let exposed = |name: &str| types.iter().any(|t| t.name == name);
        if !exposed(&base.query_type) {
            return Err(MetadataError::Permission(format!(
                "query root type {} must be exposed",
                base.query_type
            )));
        }

        Ok(IntrospectionResult {
            query_type: base.query_type.clone(),
            mutation_type: base
                .mutation_type
                .clone()
                .filter(|name| exposed(name)),
            subscription_type: base
                .subscription_type
                .clone()
                .filter(|name| exposed(name)),
            types,
        })
    }
}
