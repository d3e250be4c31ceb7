//! Consistency Recorder
//!
//! Side channels for batch resolution. A failed entity becomes a recorded
//! inconsistency instead of aborting its siblings, and every resolved entity
//! registers the upstream keys it depends on so the cache substrate can
//! invalidate it later. Parallel resolution units each own a log; logs are
//! merged single-writer after the units complete.

use crate::error::MetadataError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Identity of one metadata entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum MetadataObjectId {
    RemoteSchema { name: String },
    RemoteSchemaPermission { schema: String, role: String },
}

impl fmt::Display for MetadataObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataObjectId::RemoteSchema { name } => write!(f, "remote_schema {}", name),
            MetadataObjectId::RemoteSchemaPermission { schema, role } => {
                write!(f, "remote_schema_permission {}.{}", schema, role)
            }
        }
    }
}

/// A recorded, non-fatal failure to resolve one entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inconsistency {
    pub object: MetadataObjectId,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// Upstream key a resolved entity depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DependencyKey {
    /// The entity's own version token; a change forces recomputation
    InvalidationKey { schema: String },
    /// Another entity's base introspection
    Introspection { schema: String },
}

/// Dependency edge fed to the incremental cache substrate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub object: MetadataObjectId,
    pub depends_on: DependencyKey,
}

/// Append-only side log for one resolution unit
#[derive(Debug, Clone, Default)]
pub struct ResolveLog {
    inconsistencies: Vec<Inconsistency>,
    dependencies: Vec<DependencyEdge>,
}

impl ResolveLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-fatal failure against one entity
    pub fn record_inconsistency(&mut self, object: MetadataObjectId, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(object = %object, %reason, "recorded metadata inconsistency");
        self.inconsistencies.push(Inconsistency {
            object,
            reason,
            recorded_at: Utc::now(),
        });
    }

    /// Register that `object` must be recomputed when `depends_on` changes
    pub fn register_dependency(&mut self, object: MetadataObjectId, depends_on: DependencyKey) {
        self.dependencies.push(DependencyEdge { object, depends_on });
    }

    /// Pass a success through untouched; record a failure and yield nothing
    pub fn try_record<T>(
        &mut self,
        object: MetadataObjectId,
        result: Result<T, MetadataError>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.record_inconsistency(object, err.to_string());
                None
            }
        }
    }

    /// Fold another unit's log into this one
    pub fn merge(&mut self, other: ResolveLog) {
        self.inconsistencies.extend(other.inconsistencies);
        self.dependencies.extend(other.dependencies);
    }

    pub fn inconsistencies(&self) -> &[Inconsistency] {
        &self.inconsistencies
    }

    pub fn dependencies(&self) -> &[DependencyEdge] {
        &self.dependencies
    }

    pub fn into_parts(self) -> (Vec<Inconsistency>, Vec<DependencyEdge>) {
        (self.inconsistencies, self.dependencies)
    }
}
