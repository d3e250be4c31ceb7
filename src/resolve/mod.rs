//! Catalog Resolution Module
//!
//! Turns the remote schema catalog into runtime contexts: per entity,
//! validate → (fetch | stitch) → permissions → assemble, under the build
//! cache, with per-entity failure isolation.

pub mod context;
pub mod recorder;
pub mod resolver;

pub use context::{PartiallyResolvedRelationship, RemoteSchemaContext};
pub use recorder::{DependencyEdge, DependencyKey, Inconsistency, MetadataObjectId, ResolveLog};
pub use resolver::{ResolvedCatalog, SchemaResolver};
