//! Role-hierarchy permission merge
//!
//! Computes, for every role, the effective view of one remote schema:
//! explicit permissions win, inherited roles merge their parents'
//! already-accumulated values, and roles that end up with no access are
//! omitted from the output. The walk requires parents before children; a
//! missing parent is a caller contract violation and aborts the batch.

use crate::definition::PermissionSpec;
use crate::error::MetadataError;
use crate::introspection::IntrospectionResult;
use crate::permissions::algebra::{merge, PermissionValue};
use crate::resolve::recorder::{DependencyKey, MetadataObjectId, ResolveLog};
use crate::roles::OrderedRoles;
use std::collections::HashMap;
use tracing::debug;

/// Resolve the role → scoped-introspection map for one remote schema
pub fn resolve_role_permissions(
    schema_name: &str,
    base: &IntrospectionResult,
    ordered_roles: &OrderedRoles,
    specs: &[PermissionSpec],
    log: &mut ResolveLog,
) -> Result<HashMap<String, IntrospectionResult>, MetadataError> {
    // Explicit permissions first. Every declared permission depends on the
    // base introspection, whether it resolves or not.
    let mut explicit: HashMap<&str, PermissionValue> = HashMap::with_capacity(specs.len());
    for spec in specs {
        let object = MetadataObjectId::RemoteSchemaPermission {
            schema: schema_name.to_string(),
            role: spec.role.clone(),
        };
        log.register_dependency(
            object.clone(),
            DependencyKey::Introspection {
                schema: schema_name.to_string(),
            },
        );

        let derived = spec.definition.apply(base).map_err(|e| {
            MetadataError::Permission(format!(
                "in remote schema permission for role {}: {}",
                spec.role, e
            ))
        });
        // a failed document resolves to no access; children inherit nothing
        let value = match log.try_record(object, derived) {
            Some(scoped) => PermissionValue::Defined(scoped),
            None => PermissionValue::Undefined,
        };
        explicit.insert(spec.role.as_str(), value);
    }

    // Hierarchy walk, parents before children.
    let mut accumulated: HashMap<String, PermissionValue> = HashMap::new();
    for role in ordered_roles.iter() {
        let value = if let Some(value) = explicit.get(role.role_name.as_str()) {
            value.clone()
        } else if role.parent_roles.is_empty() {
            PermissionValue::Undefined
        } else {
            let mut parents = Vec::with_capacity(role.parent_roles.len());
            for parent in &role.parent_roles {
                let inherited = accumulated.get(parent).ok_or_else(|| {
                    MetadataError::RoleOrdering(format!(
                        "bad ordering of roles, could not find the permission of role: {}",
                        parent
                    ))
                })?;
                parents.push(inherited.clone());
            }
            merge(parents)
        };
        accumulated.insert(role.role_name.clone(), value);
    }

    // Translate the tri-state into the output map.
    let mut resolved = HashMap::new();
    for (role, value) in accumulated {
        match value {
            PermissionValue::Defined(scoped) => {
                resolved.insert(role, scoped);
            }
            PermissionValue::Undefined => {}
            PermissionValue::Inconsistent => {
                log.record_inconsistency(
                    MetadataObjectId::RemoteSchemaPermission {
                        schema: schema_name.to_string(),
                        role: role.clone(),
                    },
                    format!(
                        "in remote schema permission for role {}: parent roles define conflicting permissions",
                        role
                    ),
                );
            }
        }
    }

    debug!(
        schema = schema_name,
        roles = resolved.len(),
        "resolved remote schema permissions"
    );
    Ok(resolved)
}
