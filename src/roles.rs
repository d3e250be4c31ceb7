//! Role Hierarchy
//!
//! Roles with parent sets, presented in an order where every parent precedes
//! its children. The permission merge trusts that ordering; building it from
//! an unordered set is a topological sort in which a cycle or an unknown
//! parent is a fatal error, never silently defaulted.

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One role and the roles it inherits from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_name: String,
    #[serde(default)]
    pub parent_roles: BTreeSet<String>,
}

impl Role {
    /// A root role with no parents
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            role_name: name.into(),
            parent_roles: BTreeSet::new(),
        }
    }

    pub fn with_parents<I, S>(name: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role_name: name.into(),
            parent_roles: parents.into_iter().map(Into::into).collect(),
        }
    }
}

/// Role set ordered so that every parent precedes its children
#[derive(Debug, Clone, Default)]
pub struct OrderedRoles(Vec<Role>);

impl OrderedRoles {
    /// Trust the caller's ordering
    ///
    /// Violations are not checked here; they surface during the permission
    /// merge as a fatal ordering error.
    pub fn from_sorted(roles: Vec<Role>) -> Self {
        Self(roles)
    }

    /// Order an arbitrary role set topologically over the parent relation
    pub fn sort(roles: Vec<Role>) -> Result<Self, MetadataError> {
        let mut by_name: HashMap<String, Role> = HashMap::with_capacity(roles.len());
        for role in roles {
            if by_name.insert(role.role_name.clone(), role.clone()).is_some() {
                return Err(MetadataError::RoleOrdering(format!(
                    "duplicate role: {}",
                    role.role_name
                )));
            }
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        // BTreeMap so ties break lexicographically and the order is stable
        let mut unresolved_parents: BTreeMap<String, usize> = BTreeMap::new();
        for role in by_name.values() {
            unresolved_parents.insert(role.role_name.clone(), role.parent_roles.len());
            for parent in &role.parent_roles {
                if !by_name.contains_key(parent) {
                    return Err(MetadataError::RoleOrdering(format!(
                        "unknown parent role {} referenced by role {}",
                        parent, role.role_name
                    )));
                }
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(role.role_name.clone());
            }
        }

        let mut ready: BTreeSet<String> = unresolved_parents
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(name, _)| name.clone())
            .collect();
        let mut ordered = Vec::with_capacity(by_name.len());

        while let Some(name) = ready.iter().next().cloned() {
            ready.remove(&name);
            unresolved_parents.remove(&name);
            for child in children.remove(&name).unwrap_or_default() {
                let remaining = unresolved_parents
                    .get_mut(&child)
                    .ok_or_else(|| MetadataError::RoleOrdering(format!(
                        "role {} ordered twice",
                        child
                    )))?;
                *remaining -= 1;
                if *remaining == 0 {
                    ready.insert(child);
                }
            }
            if let Some(role) = by_name.remove(&name) {
                ordered.push(role);
            }
        }

        if let Some((stuck, _)) = unresolved_parents.iter().next() {
            return Err(MetadataError::RoleOrdering(format!(
                "role hierarchy contains a cycle involving role: {}",
                stuck
            )));
        }

        Ok(Self(ordered))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Role> {
        self.0.iter()
    }

    pub fn roles(&self) -> &[Role] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable byte serialization of the role set, used as a cache
    /// fingerprint input
    pub fn fingerprint_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for role in &self.0 {
            bytes.extend_from_slice(role.role_name.as_bytes());
            bytes.push(b'(');
            for parent in &role.parent_roles {
                bytes.extend_from_slice(parent.as_bytes());
                bytes.push(b',');
            }
            bytes.push(b')');
        }
        bytes
    }
}
