//! schemagate - remote schema resolution engine
//!
//! Turns a declarative catalog of remote GraphQL endpoints into runtime
//! schema contexts: per entity, validate the connection, fetch a fresh
//! introspection (or stitch a stored one), derive role-scoped permission
//! views, and assemble the result — incrementally, so unchanged entities
//! skip the work entirely.
//!
//! - Partial failure is the norm: a broken entity becomes a recorded
//!   inconsistency while its siblings resolve.
//! - Reuse is fingerprint-driven: an entity recomputes only when its
//!   invalidation token or the role hierarchy changes.
//! - The network sits behind [`fetch::RemoteFetcher`], so the whole engine
//!   runs against mocks in tests.

pub mod cache;
pub mod config;
pub mod definition;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod introspection;
pub mod permissions;
pub mod resolve;
pub mod roles;
pub mod telemetry;

pub use config::Settings;
pub use definition::{ConnectionDef, InvalidationKeys, RemoteSchemaDef, StoredIntrospection};
pub use error::{MetadataError, MetadataResult};
pub use fetch::{HttpFetcher, RemoteFetcher};
pub use resolve::{RemoteSchemaContext, ResolvedCatalog, SchemaResolver};
pub use roles::{OrderedRoles, Role};
